// crates/spec-check-core/src/runtime/stack.rs
// ============================================================================
// Module: Stack Attribution
// Description: Caller attribution for live contract failures.
// Purpose: Find the nearest frame that belongs to genuine caller code.
// Dependencies: crate::core, crate::interfaces, std::backtrace
// ============================================================================

//! ## Overview
//! Raw frames are demangled into `namespace/name` units (with an optional
//! closure annotation). Frames from the language runtime cannot be mapped and
//! are dropped. The leading run of frames from this crate (the checking proxy
//! and binding plumbing) is then skipped so the first remaining frame is the
//! code that made the failing call.
//!
//! Attribution is best effort: without debug info there may be no frames at
//! all, in which case callers simply omit the annotation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::backtrace::Backtrace;

use crate::core::Frame;
use crate::core::RawFrame;
use crate::core::UnitName;
use crate::interfaces::FrameSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Crate root whose frames are treated as checking plumbing.
const PLUMBING_ROOT: &str = env!("CARGO_CRATE_NAME");

/// Crate roots belonging to the language runtime and test harness.
const RUNTIME_ROOTS: &[&str] =
    &["std", "core", "alloc", "backtrace", "backtrace_rs", "test", "panic_unwind", "unwind"];

// ============================================================================
// SECTION: Frame Sources
// ============================================================================

/// Frame source backed by [`std::backtrace::Backtrace`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceFrameSource;

impl FrameSource for BacktraceFrameSource {
    fn capture(&self) -> Vec<RawFrame> {
        parse_backtrace(&Backtrace::force_capture().to_string())
    }
}

/// Frame source that never captures anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFrameSource;

impl FrameSource for NoFrameSource {
    fn capture(&self) -> Vec<RawFrame> {
        Vec::new()
    }
}

/// Frame source that replays a fixed stack.
#[derive(Debug, Default, Clone)]
pub struct FixedFrameSource {
    /// Frames returned on every capture.
    frames: Vec<RawFrame>,
}

impl FixedFrameSource {
    /// Creates a source that always returns `frames`.
    #[must_use]
    pub const fn new(frames: Vec<RawFrame>) -> Self {
        Self {
            frames,
        }
    }
}

impl FrameSource for FixedFrameSource {
    fn capture(&self) -> Vec<RawFrame> {
        self.frames.clone()
    }
}

// ============================================================================
// SECTION: Attribution
// ============================================================================

/// Interprets raw frames, dropping frames that map to no unit.
#[must_use]
pub fn interpret_frames(raw: &[RawFrame]) -> Vec<Frame> {
    raw.iter()
        .filter_map(|frame| {
            let (unit, local_fn) = demunge(&frame.symbol)?;
            Some(Frame {
                unit,
                local_fn,
                file: frame.file.clone(),
                line: frame.line,
            })
        })
        .collect()
}

/// Interprets raw frames and skips the leading run of plumbing frames.
#[must_use]
pub fn caller_frames(raw: &[RawFrame]) -> Vec<Frame> {
    interpret_frames(raw).into_iter().skip_while(is_plumbing).collect()
}

/// Returns the nearest genuine caller frame, if any.
#[must_use]
pub fn nearest_caller(raw: &[RawFrame]) -> Option<Frame> {
    interpret_frames(raw).into_iter().find(|frame| !is_plumbing(frame))
}

/// Returns true for frames that execute inside this crate.
fn is_plumbing(frame: &Frame) -> bool {
    frame
        .unit
        .namespace()
        .and_then(|namespace| namespace.split('.').next())
        .is_some_and(|root| root == PLUMBING_ROOT)
}

// ============================================================================
// SECTION: Demangling
// ============================================================================

/// Maps a symbol path onto its unit and optional closure annotation.
///
/// Returns `None` for runtime frames and for symbols whose path does not
/// reduce to plain identifiers (fn-pointer or slice self types, for example).
#[must_use]
pub fn demunge(symbol: &str) -> Option<(UnitName, Option<String>)> {
    let path = strip_generics(strip_hash(symbol.trim()));
    let mut segments: Vec<&str> =
        path.split("::").filter(|segment| !segment.is_empty()).collect();
    let mut local_fn = None;
    while let Some(last) = segments.last() {
        if !last.starts_with('{') {
            break;
        }
        if local_fn.is_none() {
            local_fn = Some(local_fn_kind(last));
        }
        segments.pop();
    }
    segments.retain(|segment| !segment.starts_with('{'));
    if segments.len() < 2 || !segments.iter().all(|segment| is_identifier(segment)) {
        return None;
    }
    let root = segments[0];
    if RUNTIME_ROOTS.contains(&root)
        || root.starts_with("__")
        || segments.iter().any(|segment| segment.starts_with("__rust"))
    {
        return None;
    }
    let name = segments.pop()?;
    Some((UnitName::qualified(&segments.join("."), name), local_fn))
}

/// Kind of a compiler-generated segment: `{{closure}}`, `{closure#0}` and
/// `{shim:vtable#0}` become `closure`, `closure` and `shim`.
fn local_fn_kind(segment: &str) -> String {
    let inner = segment.trim_matches(|c| c == '{' || c == '}');
    inner.split(['#', ':']).next().unwrap_or(inner).to_string()
}

/// Returns true for a plain Rust identifier.
fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next().is_some_and(|first| first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Removes a trailing `::h<16 hex>` disambiguator.
fn strip_hash(symbol: &str) -> &str {
    if let Some((head, tail)) = symbol.rsplit_once("::")
        && tail.len() == 17
        && tail.starts_with('h')
        && tail[1 ..].chars().all(|c| c.is_ascii_hexdigit())
    {
        return head;
    }
    symbol
}

/// Drops generic arguments and resolves `<T as Trait>` / `<impl Trait for T>` prefixes.
fn strip_generics(symbol: &str) -> String {
    let mut rest = symbol;
    let mut out = String::with_capacity(symbol.len());
    if rest.starts_with('<')
        && let Some(end) = matching_angle(rest)
    {
        let inner = &rest[1 .. end];
        let self_type = inner
            .strip_prefix("impl ")
            .map_or_else(
                || inner.split(" as ").next().unwrap_or(inner),
                |body| body.rsplit(" for ").next().unwrap_or(body),
            )
            .trim_start_matches('&')
            .trim_start_matches("mut ")
            .trim_start_matches("dyn ");
        out.push_str(self_type);
        rest = &rest[end + 1 ..];
    }
    let mut depth = 0usize;
    let mut prev = None;
    for c in rest.chars() {
        match c {
            '<' => depth += 1,
            '>' if prev != Some('-') => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
        prev = Some(c);
    }
    if out.contains('<') { strip_generics(&out) } else { out }
}

/// Returns the index of the `>` closing the `<` at position zero.
fn matching_angle(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut prev = None;
    for (index, c) in text.char_indices() {
        let arrow = prev == Some('-');
        prev = Some(c);
        match c {
            '<' => depth += 1,
            '>' if !arrow => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

// ============================================================================
// SECTION: Backtrace Parsing
// ============================================================================

/// Parses the display form of a [`Backtrace`] into raw frames.
#[must_use]
pub fn parse_backtrace(text: &str) -> Vec<RawFrame> {
    let mut frames: Vec<RawFrame> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                let mut parts = location.rsplitn(3, ':');
                let _column = parts.next();
                let line_no = parts.next().and_then(|value| value.parse::<u32>().ok());
                if let (Some(line_no), Some(file)) = (line_no, parts.next()) {
                    frame.file = Some(file.to_string());
                    frame.line = Some(line_no);
                }
            }
            continue;
        }
        if let Some((index, symbol)) = trimmed.split_once(": ")
            && !index.is_empty()
            && index.chars().all(|c| c.is_ascii_digit())
        {
            frames.push(RawFrame::new(symbol.trim()));
        }
    }
    frames
}

// ============================================================================
// SECTION: Tests
// ============================================================================
