//! @acp:module "Comment Blocks"
//! @acp:summary "Collects the documentation comment run above an anchor line"
//! @acp:domain cli
//! @acp:layer service

use std::collections::VecDeque;

use crate::config::BlankLinePolicy;

/// Rich documentation marker (`--- text`)
pub const RICH_MARKER: &str = "---";

/// Plain single-line comment marker (`-- text`)
pub const PLAIN_MARKER: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Rich,
    Plain,
    Blank,
    Code,
}

fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with(RICH_MARKER) {
        LineKind::Rich
    } else if trimmed.starts_with(PLAIN_MARKER) {
        LineKind::Plain
    } else {
        LineKind::Code
    }
}

/// @acp:summary "Extract the comment block immediately above `anchor`"
///
/// Walks backwards from `anchor - 1`. Rich (`---`) lines are always kept;
/// plain (`--`) lines are kept only if the same run also holds at least one
/// rich line. The run stops at the first code line, and at the first blank
/// line under [`BlankLinePolicy::Terminate`].
///
/// Returned lines have their marker stripped and are in top-to-bottom order.
pub fn extract_comment_block(lines: &[&str], anchor: usize, policy: BlankLinePolicy) -> Vec<String> {
    let anchor = anchor.min(lines.len());

    // First pass: find where the run ends and whether it is worth reading
    let mut start = anchor;
    let mut has_rich = false;
    for idx in (0..anchor).rev() {
        match classify(lines[idx]) {
            LineKind::Rich => has_rich = true,
            LineKind::Plain => {}
            LineKind::Blank => {
                if policy == BlankLinePolicy::Terminate {
                    break;
                }
            }
            LineKind::Code => break,
        }
        start = idx;
    }

    if !has_rich {
        return Vec::new();
    }

    let mut block = VecDeque::new();
    for idx in (start..anchor).rev() {
        let trimmed = lines[idx].trim();
        match classify(trimmed) {
            LineKind::Rich => block.push_front(strip_marker(trimmed, RICH_MARKER)),
            LineKind::Plain => block.push_front(strip_marker(trimmed, PLAIN_MARKER)),
            LineKind::Blank | LineKind::Code => {}
        }
    }

    block.into_iter().collect()
}

fn strip_marker(line: &str, marker: &str) -> String {
    line.strip_prefix(marker).unwrap_or(line).trim().to_string()
}

/// A long bracket left open at the end of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LongBracket {
    /// `--[==[ ... ]==]`, dropped
    Comment(usize),
    /// `[==[ ... ]==]`, kept verbatim
    String(usize),
}

/// @acp:summary "Code view of each line with every comment removed"
///
/// Line comments are cut at the first `--` outside a string literal.
/// Block comments (`--[[ ... ]]`, any level) are removed across lines and
/// leave a single space where they sat inside a line. Long strings are kept
/// and never searched for comment markers. The result has one entry per
/// input line, so indexes stay aligned.
pub fn strip_comments(lines: &[&str]) -> Vec<String> {
    let mut open = None;
    lines.iter().map(|line| strip_line(line, &mut open)).collect()
}

/// One line with its trailing comment removed, string-literal aware
pub fn strip_line_comment(line: &str) -> String {
    strip_line(line, &mut None)
}

fn strip_line(line: &str, open: &mut Option<LongBracket>) -> String {
    let bytes = line.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(bracket) = *open {
            let (level, keep) = match bracket {
                LongBracket::Comment(level) => (level, false),
                LongBracket::String(level) => (level, true),
            };
            let end = find_long_close(&bytes[i..], level).map(|offset| i + offset);
            let stop = end.unwrap_or(bytes.len());
            if keep {
                out.extend_from_slice(&bytes[i..stop]);
            } else {
                out.push(b' ');
            }
            if end.is_some() {
                *open = None;
            }
            i = stop;
            continue;
        }

        let b = bytes[i];
        if let Some(q) = quote {
            out.push(b);
            if b == b'\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1]);
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' | b'\'' => {
                quote = Some(b);
                out.push(b);
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => match long_open_level(&bytes[i + 2..]) {
                Some(level) => {
                    *open = Some(LongBracket::Comment(level));
                    i += 2 + level + 2;
                }
                None => break,
            },
            b'[' => match long_open_level(&bytes[i..]) {
                Some(level) => {
                    *open = Some(LongBracket::String(level));
                    out.extend_from_slice(&bytes[i..i + level + 2]);
                    i += level + 2;
                }
                None => {
                    out.push(b);
                    i += 1;
                }
            },
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Level of a `[`, `=`*level, `[` opener at the start of `bytes`
fn long_open_level(bytes: &[u8]) -> Option<usize> {
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let level = bytes[1..].iter().take_while(|&&b| b == b'=').count();
    (bytes.get(1 + level) == Some(&b'[')).then_some(level)
}

/// Offset just past the `]`, `=`*level, `]` closer
fn find_long_close(bytes: &[u8], level: usize) -> Option<usize> {
    let mut close = Vec::with_capacity(level + 2);
    close.push(b']');
    close.extend(std::iter::repeat(b'=').take(level));
    close.push(b']');
    bytes
        .windows(close.len())
        .position(|w| w == close.as_slice())
        .map(|pos| pos + close.len())
}
