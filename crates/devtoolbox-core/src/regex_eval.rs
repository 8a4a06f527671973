//! Regex match evaluation and highlighting.
//!
//! A pattern and a JS-style flag set are compiled with the `regex` crate and
//! run against an input string. The result lists every match (or only the
//! first one without the `g` flag) with UTF-16 offsets, plus the input
//! partitioned into plain and matched segments for highlighting.
//!
//! # Scan Algorithm
//!
//! 1. Search from the current position.
//! 2. Record the match.
//! 3. Continue from the match end. A zero-length match advances the
//!    position by one character so the scan always terminates.
//!
//! The whole report is recomputed on every call; nothing is cached.

use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RegexCompileError;

/// Upper bound on matches collected by a single evaluation.
pub const MAX_MATCHES: usize = 10_000;

/// JS-style regex flags. `u` is accepted and ignored: the engine is always
/// Unicode-aware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegexFlags {
    pub global: bool,
    pub case_insensitive: bool,
    pub multiline: bool,
    pub dot_all: bool,
}

impl FromStr for RegexFlags {
    type Err = RegexCompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = RegexFlags::default();
        for c in s.chars() {
            match c {
                'g' => flags.global = true,
                'i' => flags.case_insensitive = true,
                'm' => flags.multiline = true,
                's' => flags.dot_all = true,
                'u' => {}
                other => {
                    return Err(RegexCompileError {
                        message: format!("unsupported flag '{}'", other),
                    })
                }
            }
        }
        Ok(flags)
    }
}

impl fmt::Display for RegexFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, c) in [
            (self.global, 'g'),
            (self.case_insensitive, 'i'),
            (self.multiline, 'm'),
            (self.dot_all, 's'),
        ] {
            if on {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

/// One match. Offsets are UTF-16 code units, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Capture groups 1..n; `None` when a group did not participate.
    pub groups: Vec<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Plain,
    Matched,
}

/// A run of the input text for highlight rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSegment {
    pub kind: SegmentKind,
    pub text: String,
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub matches: Vec<MatchRecord>,
    pub segments: Vec<HighlightSegment>,
    /// Set when the scan stopped at [`MAX_MATCHES`].
    pub truncated: bool,
}

/// Compile `pattern` with the engine options implied by `flags`.
pub fn compile(pattern: &str, flags: RegexFlags) -> Result<Regex, RegexCompileError> {
    RegexBuilder::new(pattern)
        .case_insensitive(flags.case_insensitive)
        .multi_line(flags.multiline)
        .dot_matches_new_line(flags.dot_all)
        .build()
        .map_err(|e| RegexCompileError {
            message: e.to_string(),
        })
}

/// Run `pattern` over `input` and report matches and highlight segments.
///
/// An empty pattern or empty input yields an empty match list, not an error.
pub fn evaluate(
    pattern: &str,
    flags: RegexFlags,
    input: &str,
) -> Result<Evaluation, RegexCompileError> {
    if pattern.is_empty() || input.is_empty() {
        return Ok(Evaluation {
            segments: plain_segment(input),
            ..Default::default()
        });
    }

    let re = compile(pattern, flags)?;
    let mut cursor = Utf16Cursor::default();
    let mut matches = Vec::new();
    let mut segments = Vec::new();
    let mut last_end = 0;

    let truncated = scan(&re, input, flags.global, |caps| {
        let Some(m) = caps.get(0) else {
            return;
        };
        if m.start() > last_end {
            segments.push(HighlightSegment {
                kind: SegmentKind::Plain,
                text: input[last_end..m.start()].to_string(),
            });
        }
        if !m.is_empty() {
            segments.push(HighlightSegment {
                kind: SegmentKind::Matched,
                text: m.as_str().to_string(),
            });
        }
        last_end = last_end.max(m.end());

        let start = cursor.advance(input, m.start());
        let end = cursor.advance(input, m.end());
        matches.push(MatchRecord {
            start,
            end,
            text: m.as_str().to_string(),
            groups: caps
                .iter()
                .skip(1)
                .map(|g| g.map(|g| g.as_str().to_string()))
                .collect(),
        });
    });

    if last_end < input.len() {
        segments.push(HighlightSegment {
            kind: SegmentKind::Plain,
            text: input[last_end..].to_string(),
        });
    }

    Ok(Evaluation {
        matches,
        segments,
        truncated,
    })
}

/// Preview of replacing matches with `replacement`.
///
/// `$1`, `$name`, and `${name}` expand to capture groups. Without the `g`
/// flag only the first match is replaced.
pub fn replace(
    pattern: &str,
    flags: RegexFlags,
    input: &str,
    replacement: &str,
) -> Result<String, RegexCompileError> {
    if pattern.is_empty() || input.is_empty() {
        return Ok(input.to_string());
    }

    let re = compile(pattern, flags)?;
    let mut out = String::with_capacity(input.len());
    let mut last_end = 0;

    scan(&re, input, flags.global, |caps| {
        let Some(m) = caps.get(0) else {
            return;
        };
        out.push_str(&input[last_end..m.start()]);
        caps.expand(replacement, &mut out);
        last_end = m.end();
    });
    out.push_str(&input[last_end..]);

    Ok(out)
}

/// Drive `re` over `input`, calling `on_match` for each match in order.
/// Returns true if the scan stopped at [`MAX_MATCHES`].
fn scan<F>(re: &Regex, input: &str, global: bool, mut on_match: F) -> bool
where
    F: FnMut(&Captures<'_>),
{
    let mut pos = 0;
    let mut found = 0;

    while pos <= input.len() {
        let Some(caps) = re.captures_at(input, pos) else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };
        on_match(&caps);
        found += 1;

        if !global {
            break;
        }
        if found >= MAX_MATCHES {
            return true;
        }

        pos = if m.is_empty() {
            next_char_boundary(input, m.end())
        } else {
            m.end()
        };
    }

    false
}

/// Byte index one character past `i`, or `len + 1` at the end of input.
fn next_char_boundary(input: &str, i: usize) -> usize {
    match input[i..].chars().next() {
        Some(c) => i + c.len_utf8(),
        None => input.len() + 1,
    }
}

fn plain_segment(input: &str) -> Vec<HighlightSegment> {
    if input.is_empty() {
        Vec::new()
    } else {
        vec![HighlightSegment {
            kind: SegmentKind::Plain,
            text: input.to_string(),
        }]
    }
}

/// Converts monotonically increasing byte offsets to UTF-16 offsets.
#[derive(Default)]
struct Utf16Cursor {
    byte: usize,
    utf16: usize,
}

impl Utf16Cursor {
    fn advance(&mut self, input: &str, byte: usize) -> usize {
        if byte >= self.byte {
            self.utf16 += input[self.byte..byte].encode_utf16().count();
        } else {
            self.utf16 -= input[byte..self.byte].encode_utf16().count();
        }
        self.byte = byte;
        self.utf16
    }
}
