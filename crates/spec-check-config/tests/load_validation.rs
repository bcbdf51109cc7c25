//! Config load validation tests for spec-check-config.
// crates/spec-check-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, limits).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use spec_check_config::ConfigError;
use spec_check_config::SpecCheckConfig;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<SpecCheckConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(SpecCheckConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        SpecCheckConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(SpecCheckConfig::load(Some(&path)), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'#'; 1_048_577])?;
    assert_invalid(SpecCheckConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(SpecCheckConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_unknown_fields() -> TestResult {
    let file = write_config(b"[check]\nnum_test = 10\n")?;
    assert_invalid(SpecCheckConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_rejects_zero_trials() -> TestResult {
    let file = write_config(b"[check]\nnum_tests = 0\n")?;
    assert_invalid(SpecCheckConfig::load(Some(file.path())), "check.num_tests must be between")
}

#[test]
fn load_rejects_excess_parallelism() -> TestResult {
    let file = write_config(b"[check]\nparallelism = 1000\n")?;
    assert_invalid(SpecCheckConfig::load(Some(file.path())), "check.parallelism must be at most")
}

#[test]
fn load_rejects_malformed_seed() -> TestResult {
    let file = write_config(b"[check]\nseed = \"abc\"\n")?;
    assert_invalid(SpecCheckConfig::load(Some(file.path())), "check.seed invalid")
}

#[test]
fn load_rejects_unqualified_stub_unit() -> TestResult {
    let file = write_config(b"[instrument]\nstub = [\"inc\"]\n")?;
    assert_invalid(SpecCheckConfig::load(Some(file.path())), "must be a namespace/name unit")
}

#[test]
fn load_rejects_file_sink_without_path() -> TestResult {
    let file = write_config(b"[audit]\nsink = \"file\"\n")?;
    assert_invalid(SpecCheckConfig::load(Some(file.path())), "audit.path is required")
}

#[test]
fn load_rejects_path_for_stderr_sink() -> TestResult {
    let file = write_config(b"[audit]\nsink = \"stderr\"\npath = \"events.log\"\n")?;
    assert_invalid(SpecCheckConfig::load(Some(file.path())), "only valid for file sink")
}
