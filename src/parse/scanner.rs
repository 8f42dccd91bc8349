//! @acp:module "Declaration Scanner"
//! @acp:summary "Locates exports and state assignments in Lua source text"
//! @acp:domain cli
//! @acp:layer service
//!
//! Line-oriented and regex-based: there is no syntax tree and no scope
//! analysis. Every search is bounded by the configured windows. A line
//! that does not match cleanly is skipped rather than reported.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{BlankLinePolicy, ScanConfig};
use crate::model::{ExportRecord, Param, Side, SourceLocation, StateRecord, StateScope};

use super::comments::{extract_comment_block, strip_comments};
use super::infer::infer_value_type;
use super::tags::{parse_doc_tags, DocTags};

/// Cheap pre-filter for lines that may open an export call
static EXPORT_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bexports\s*\(").unwrap());

/// Matches: exports('Name', <rest>), anchored at a pre-filter hit
/// Groups: 1/2=identifier (double/single quoted), 3=second argument onwards
static EXPORT_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^exports\s*\(\s*(?:"([^"]+)"|'([^']+)')\s*,\s*(.*)$"#).unwrap()
});

/// Inline callable literal at the start of the second argument
static INLINE_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^function\s*\(([^)]*)\)").unwrap());

/// Bare reference to a named declaration
static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][\w.:]*)").unwrap());

/// Parameter list of the first function header in a text window
static SIGNATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfunction\b[^(]*\(([^)]*)\)").unwrap());

/// Matches the head of: GlobalState.key = | GlobalState['key'] =
/// Groups: 1=dotted key, 2/3=bracketed key; the value follows the match
static GLOBAL_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[^\w.])GlobalState\s*(?:\.\s*([A-Za-z_]\w*)|\[\s*(?:"([^"]+)"|'([^']+)')\s*\])\s*="#,
    )
    .unwrap()
});

/// Matches the head of: Player(<expr>).state:set(
static SERVER_STATE_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bPlayer\s*\((?:[^()]|\([^()]*\))*\)\s*\.\s*state\s*:\s*set\s*\(").unwrap()
});

/// Matches the head of: LocalPlayer.state:set(
static CLIENT_STATE_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bLocalPlayer\s*\.\s*state\s*:\s*set\s*\(").unwrap()
});

/// Matches the head of: Player(<expr>).state.key = (always replicated)
static SERVER_STATE_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bPlayer\s*\((?:[^()]|\([^()]*\))*\)\s*\.\s*state\s*\.\s*([A-Za-z_]\w*)\s*=").unwrap()
});

/// Matches the head of: LocalPlayer.state.key = (always replicated)
static CLIENT_STATE_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bLocalPlayer\s*\.\s*state\s*\.\s*([A-Za-z_]\w*)\s*=").unwrap()
});

/// @acp:summary "Records extracted from one file"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub side: Side,
    pub exports: Vec<ExportRecord>,
    pub global_states: Vec<StateRecord>,
    pub entity_states: Vec<StateRecord>,
}

impl ScanResult {
    /// Per-entity records observed through one accessor
    pub fn entity_states_in(&self, scope: StateScope) -> impl Iterator<Item = &StateRecord> {
        self.entity_states.iter().filter(move |s| s.scope == scope)
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty() && self.global_states.is_empty() && self.entity_states.is_empty()
    }
}

/// How the second argument of an export call was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExportTarget {
    /// `function(...)` literal; anchor stays on the call line
    Inline { params: Vec<String> },
    /// Named declaration found at `line`
    Declaration { line: usize, params: Vec<String> },
    /// Reference with no declaration in range, or an unrecognized argument
    Unresolved,
}

/// @acp:summary "Pure, per-file declaration scanner"
#[derive(Debug, Clone)]
pub struct Scanner {
    reference_window: usize,
    lookahead_lines: usize,
    blank_lines: BlankLinePolicy,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            reference_window: config.reference_window,
            lookahead_lines: config.lookahead_lines,
            blank_lines: config.blank_lines,
        }
    }

    /// @acp:summary "Scan file content for all three record kinds"
    pub fn scan(&self, content: &str, path: &str) -> ScanResult {
        let lines: Vec<&str> = content.lines().collect();
        self.scan_lines(&lines, path)
    }

    pub fn scan_lines(&self, lines: &[&str], path: &str) -> ScanResult {
        let code = strip_comments(lines);
        let code: Vec<&str> = code.iter().map(String::as_str).collect();
        ScanResult {
            side: Side::from_path(path),
            exports: self.collect_exports(lines, &code, path),
            global_states: self.collect_global_states(&code, path),
            entity_states: self.collect_entity_states(&code, path),
        }
    }

    // ========================================================================
    // Exports
    // ========================================================================

    /// @acp:summary "Find every exports(...) call and build its declaration record"
    pub fn scan_exports(&self, lines: &[&str], path: &str) -> Vec<ExportRecord> {
        let code = strip_comments(lines);
        let code: Vec<&str> = code.iter().map(String::as_str).collect();
        self.collect_exports(lines, &code, path)
    }

    /// Matching runs on `code`; documentation is read from `lines`
    fn collect_exports(&self, lines: &[&str], code: &[&str], path: &str) -> Vec<ExportRecord> {
        let mut records = Vec::new();

        for (idx, line) in code.iter().enumerate() {
            if !EXPORT_START.is_match(line) {
                continue;
            }

            // The window starts with the trimmed line, so offsets line up.
            // Only calls opening on this line count; later lines get their own turn.
            let window = self.forward_window(code, idx);
            let starts: Vec<usize> = EXPORT_START
                .find_iter(line.trim())
                .map(|m| m.start())
                .collect();

            for start in starts {
                let Some(cap) = EXPORT_CALL.captures(&window[start..]) else {
                    continue;
                };
                let Some(identifier) = cap.get(1).or_else(|| cap.get(2)) else {
                    continue;
                };
                let argument = cap.get(3).map(|m| m.as_str().trim()).unwrap_or("");
                records.push(self.build_export(lines, code, idx, identifier.as_str(), argument, path));
            }
        }

        records
    }

    fn build_export(
        &self,
        lines: &[&str],
        code: &[&str],
        idx: usize,
        identifier: &str,
        argument: &str,
        path: &str,
    ) -> ExportRecord {
        let (anchor, signature) = match self.resolve_target(code, idx, argument) {
            ExportTarget::Inline { params } => (idx, params),
            ExportTarget::Declaration { line, params } => (line, params),
            ExportTarget::Unresolved => {
                tracing::debug!(
                    "{}:{} export '{}' has no resolvable signature",
                    path,
                    idx + 1,
                    identifier
                );
                (idx, Vec::new())
            }
        };

        let comments = extract_comment_block(lines, anchor, self.blank_lines);
        let tags = parse_doc_tags(&comments);
        let params = merge_params(&signature, &tags);

        ExportRecord {
            identifier: identifier.to_string(),
            side: Side::from_path(path),
            params,
            returns: tags.returns,
            description: tags.description,
            deprecated: tags.deprecated,
            location: SourceLocation {
                file: path.to_string(),
                line: anchor + 1,
            },
        }
    }

    fn resolve_target(&self, lines: &[&str], export_idx: usize, argument: &str) -> ExportTarget {
        let literal = argument
            .strip_prefix("function")
            .is_some_and(|rest| !rest.starts_with(|c: char| c == '_' || c.is_ascii_alphanumeric()));
        if literal {
            return match INLINE_FUNCTION.captures(argument) {
                Some(cap) => ExportTarget::Inline {
                    params: parse_param_list(&cap[1]),
                },
                None => ExportTarget::Inline { params: Vec::new() },
            };
        }

        match REFERENCE.captures(argument) {
            Some(cap) => self
                .find_declaration(lines, export_idx, &cap[1])
                .unwrap_or(ExportTarget::Unresolved),
            None => ExportTarget::Unresolved,
        }
    }

    /// Bounded backward search for the named declaration header.
    ///
    /// `lines` is the comment-free view, so commented-out headers are empty.
    fn find_declaration(&self, lines: &[&str], before: usize, name: &str) -> Option<ExportTarget> {
        let name = regex::escape(name);
        let header = Regex::new(&format!(
            r"^\s*(?:local\s+)?(?:function\s+{name}\s*\(|{name}\s*=\s*function\s*\()"
        ))
        .ok()?;

        let floor = before.saturating_sub(self.reference_window);
        (floor..before)
            .rev()
            .find(|&idx| header.is_match(lines[idx]))
            .map(|idx| {
                let window = self.forward_window(lines, idx);
                let params = SIGNATURE
                    .captures(&window)
                    .map(|cap| parse_param_list(&cap[1]))
                    .unwrap_or_default();
                ExportTarget::Declaration { line: idx, params }
            })
    }

    /// The line at `idx` plus the look-ahead lines, joined with spaces
    fn forward_window(&self, lines: &[&str], idx: usize) -> String {
        let end = (idx + self.lookahead_lines + 1).min(lines.len());
        lines[idx..end]
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    // ========================================================================
    // State
    // ========================================================================

    /// @acp:summary "Find GlobalState assignments"
    pub fn scan_global_states(&self, lines: &[&str], path: &str) -> Vec<StateRecord> {
        let code = strip_comments(lines);
        let code: Vec<&str> = code.iter().map(String::as_str).collect();
        self.collect_global_states(&code, path)
    }

    fn collect_global_states(&self, code: &[&str], path: &str) -> Vec<StateRecord> {
        let side = Side::from_path(path);
        let mut records = Vec::new();

        for (idx, line) in code.iter().enumerate() {
            for cap in GLOBAL_ASSIGN.captures_iter(line) {
                let Some(key) = cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)) else {
                    continue;
                };
                let Some(value) = assigned_value(line, cap.get(0).map_or(0, |m| m.end())) else {
                    continue;
                };

                records.push(StateRecord {
                    name: key.as_str().to_string(),
                    value_type: infer_value_type(value),
                    scope: StateScope::Global,
                    replicated: false,
                    side,
                    location: SourceLocation {
                        file: path.to_string(),
                        line: idx + 1,
                    },
                });
            }
        }

        records
    }

    /// @acp:summary "Find per-player state bag writes from either accessor"
    pub fn scan_entity_states(&self, lines: &[&str], path: &str) -> Vec<StateRecord> {
        let code = strip_comments(lines);
        let code: Vec<&str> = code.iter().map(String::as_str).collect();
        self.collect_entity_states(&code, path)
    }

    fn collect_entity_states(&self, code: &[&str], path: &str) -> Vec<StateRecord> {
        let side = Side::from_path(path);
        let mut records = Vec::new();

        let accessors = [
            (&*SERVER_STATE_SET, &*SERVER_STATE_ASSIGN, StateScope::EntityServer),
            (&*CLIENT_STATE_SET, &*CLIENT_STATE_ASSIGN, StateScope::EntityClient),
        ];

        for (idx, line) in code.iter().enumerate() {
            let location = SourceLocation {
                file: path.to_string(),
                line: idx + 1,
            };

            for (setter, assign, scope) in &accessors {
                // Writes in line order, whichever form they take
                let mut observed: Vec<(usize, String, &str, bool)> = Vec::new();

                for m in setter.find_iter(line) {
                    if let Some((name, value, replicated)) = parse_setter_args(&line[m.end()..]) {
                        observed.push((m.start(), name, value, replicated));
                    }
                }
                for cap in assign.captures_iter(line) {
                    let Some(head) = cap.get(0) else {
                        continue;
                    };
                    if let Some(value) = assigned_value(line, head.end()) {
                        observed.push((head.start(), cap[1].to_string(), value, true));
                    }
                }
                observed.sort_by_key(|(start, ..)| *start);

                for (_, name, value, replicated) in observed {
                    records.push(StateRecord {
                        name,
                        value_type: infer_value_type(value),
                        scope: *scope,
                        replicated,
                        side,
                        location: location.clone(),
                    });
                }
            }
        }

        records
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Merge signature parameters with documented ones by name.
///
/// Signature order wins; documentation fills in type and description.
/// Documented names the signature lacks are appended in tag order.
fn merge_params(signature: &[String], tags: &DocTags) -> Vec<Param> {
    let mut used = vec![false; tags.params.len()];
    let mut merged = Vec::with_capacity(signature.len().max(tags.params.len()));

    for name in signature {
        let found = tags
            .params
            .iter()
            .enumerate()
            .position(|(i, p)| !used[i] && &p.name == name);
        match found {
            Some(i) => {
                used[i] = true;
                merged.push(tags.params[i].clone());
            }
            None => merged.push(Param::untyped(name.clone())),
        }
    }

    for (param, was_used) in tags.params.iter().zip(used) {
        if !was_used {
            merged.push(param.clone());
        }
    }

    merged
}

/// Split a Lua parameter list, keeping only plausible names and varargs
fn parse_param_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| *p == "..." || is_identifier(p))
        .map(str::to_string)
        .collect()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Split call arguments at top-level commas, stopping at the closing paren
fn split_call_args(text: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut arg_start = 0;
    let mut end = text.len();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '{' | '[' => depth += 1,
            ')' if depth == 0 => {
                end = i;
                break;
            }
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(text[arg_start..i].trim());
                arg_start = i + 1;
            }
            _ => {}
        }
    }

    let last = text[arg_start..end].trim();
    if !last.is_empty() {
        args.push(last);
    }
    args
}

/// (key, value, replicated) from `:set(` arguments; key must be a literal
fn parse_setter_args(text: &str) -> Option<(String, &str, bool)> {
    let args = split_call_args(text);
    let key = unquote(args.first()?)?;
    let value = *args.get(1).filter(|v| !v.is_empty())?;
    let replicated = args.get(2).is_some_and(|flag| *flag == "true");
    Some((key, value, replicated))
}

/// Value of an assignment whose `=` ends at `eq_end`; `None` for `==`
fn assigned_value(line: &str, eq_end: usize) -> Option<&str> {
    let rest = &line[eq_end..];
    if rest.starts_with('=') {
        return None;
    }
    let value = value_expression(rest);
    (!value.is_empty()).then_some(value)
}

/// Leading expression of `text`, cut where the statement ends.
///
/// A statement ends at a top-level `;`, or where whitespace separates a
/// finished operand from a word that is not `and`/`or` (`1 end`,
/// `true GlobalState.b = 2`).
fn value_expression(text: &str) -> &str {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => return text[..i].trim_end(),
            b if b.is_ascii_whitespace() && depth == 0 => {
                let before = text[..i].trim_end();
                let after = text[i..].trim_start();
                let last_word = before
                    .rsplit(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
                    .next()
                    .unwrap_or("");
                let operand_done = !matches!(last_word, "and" | "or" | "not")
                    && before.bytes().last().is_some_and(|c| {
                        c.is_ascii_alphanumeric() || matches!(c, b'_' | b')' | b']' | b'}' | b'"' | b'\'')
                    });
                let next_word = after
                    .split(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
                    .next()
                    .unwrap_or("");
                let starts_word = after.starts_with(|c: char| c == '_' || c.is_ascii_alphabetic());
                if operand_done && starts_word && !matches!(next_word, "and" | "or") {
                    return before;
                }
            }
            _ => {}
        }
        i += 1;
    }

    text.trim_end()
}

fn unquote(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && matches!(bytes[0], b'"' | b'\'') && bytes[bytes.len() - 1] == bytes[0] {
        Some(s[1..s.len() - 1].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueType;

    fn scanner() -> Scanner {
        Scanner::default()
    }

    #[test]
    fn test_reference_export_with_docs() {
        let src = "--- Adds a job.\n--- @param name string Job name\n--- @return boolean ok\nfunction AddJob(name) end\nexports('AddJob', AddJob)";
        let result = scanner().scan(src, "server.lua");

        assert_eq!(result.exports.len(), 1);
        let export = &result.exports[0];
        assert_eq!(export.identifier, "AddJob");
        assert_eq!(export.side, Side::Server);
        assert_eq!(export.description, "Adds a job.");
        assert_eq!(export.params.len(), 1);
        assert_eq!(export.params[0].r#type, "string");
        assert_eq!(export.returns[0].description, "ok");
        assert_eq!(export.location.line, 4);
    }

    #[test]
    fn test_inline_export_docs_above_call() {
        let src = "--- Greets\n--- @param who string\nexports(\"Greet\", function(who, times)\n  print(who)\nend)";
        let result = scanner().scan(src, "client/main.lua");
        let export = &result.exports[0];
        assert_eq!(export.side, Side::Client);
        assert_eq!(export.description, "Greets");
        assert_eq!(export.params[0].r#type, "string");
        assert_eq!(export.params[1], Param::untyped("times"));
        assert_eq!(export.location.line, 3);
    }

    #[test]
    fn test_inline_signature_split_across_lines() {
        let src = "exports('Split',\n  function(a,\n    b)\n  end)";
        let result = scanner().scan(src, "shared.lua");
        let names: Vec<_> = result.exports[0].params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_local_and_assigned_declarations() {
        let src = "local function Hidden(x) end\nexports('Hidden', Hidden)\nLater = function(y, z) end\nexports('Later', Later)";
        let result = scanner().scan(src, "server/api.lua");
        assert_eq!(result.exports[0].params[0].name, "x");
        assert_eq!(result.exports[1].params.len(), 2);
    }

    #[test]
    fn test_commented_out_header_skipped() {
        let src = "function Thing(real) end\n-- function Thing(old) end\nexports('Thing', Thing)";
        let result = scanner().scan(src, "server.lua");
        assert_eq!(result.exports[0].params[0].name, "real");
        assert_eq!(result.exports[0].location.line, 1);
    }

    #[test]
    fn test_unresolved_reference_has_no_params() {
        let src = "exports('Missing', Missing)";
        let result = scanner().scan(src, "server.lua");
        assert_eq!(result.exports.len(), 1);
        assert!(result.exports[0].params.is_empty());
    }

    #[test]
    fn test_reference_window_is_bounded() {
        let mut src = String::from("function Far(a) end\n");
        for _ in 0..10 {
            src.push_str("local filler = true\n");
        }
        src.push_str("exports('Far', Far)");

        let config = ScanConfig {
            reference_window: 5,
            ..ScanConfig::default()
        };
        let result = Scanner::new(&config).scan(&src, "server.lua");
        assert!(result.exports[0].params.is_empty());

        let result = scanner().scan(&src, "server.lua");
        assert_eq!(result.exports[0].params.len(), 1);
    }

    #[test]
    fn test_tags_without_signature_param_are_appended() {
        let src = "--- @param first string\n--- @param ... any\nfunction Vararg(first, ...) end\nexports('Vararg', Vararg)\n--- @param extra number\nfunction Short() end\nexports('Short', Short)";
        let result = scanner().scan(src, "server.lua");
        assert_eq!(result.exports[0].params.len(), 2);
        assert_eq!(result.exports[0].params[1].name, "...");
        assert_eq!(result.exports[1].params.len(), 1);
        assert_eq!(result.exports[1].params[0].r#type, "number");
    }

    #[test]
    fn test_two_exports_on_one_line() {
        let src = "exports('A', A) exports('B', function(x) end)";
        let result = scanner().scan(src, "server.lua");
        let ids: Vec<_> = result.exports.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(result.exports[1].params[0].name, "x");
    }

    #[test]
    fn test_later_export_not_claimed_by_earlier_line() {
        let src = "exports(\nexports('x', function(a) end)";
        let result = scanner().scan(src, "server.lua");
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].location.line, 2);
    }

    #[test]
    fn test_commented_export_ignored() {
        let src = "-- exports('Old', Old)\nexports('New', function() end)";
        let result = scanner().scan(src, "server.lua");
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].identifier, "New");
    }

    #[test]
    fn test_global_state_assignments() {
        let src = "GlobalState.weather = 'sunny'\nGlobalState['time'] = 12 -- hour\nif GlobalState.weather == 'rain' then end\n-- GlobalState.old = true";
        let result = scanner().scan(src, "server/sync.lua");
        assert_eq!(result.global_states.len(), 2);
        assert_eq!(result.global_states[0].name, "weather");
        assert_eq!(result.global_states[0].value_type, ValueType::String);
        assert_eq!(result.global_states[1].name, "time");
        assert_eq!(result.global_states[1].value_type, ValueType::Number);
    }

    #[test]
    fn test_entity_state_setters() {
        let src = "Player(source).state:set('job', { name = 'police', grade = 1 }, true)\nLocalPlayer.state:set(\"busy\", false)\nPlayer(src).state:set(key, 1, true)";
        let result = scanner().scan(src, "shared/state.lua");
        assert_eq!(result.entity_states.len(), 2);

        let job = &result.entity_states[0];
        assert_eq!(job.name, "job");
        assert_eq!(job.scope, StateScope::EntityServer);
        assert_eq!(job.value_type, ValueType::Table);
        assert!(job.replicated);

        let busy = &result.entity_states[1];
        assert_eq!(busy.scope, StateScope::EntityClient);
        assert_eq!(busy.value_type, ValueType::Boolean);
        assert!(!busy.replicated);
    }

    #[test]
    fn test_entity_state_assignment_form() {
        let src = "Player(tonumber(src)).state.onDuty = true\nLocalPlayer.state.hud = 'minimal'";
        let result = scanner().scan(src, "server.lua");
        assert_eq!(result.entity_states_in(StateScope::EntityServer).count(), 1);
        let hud = result.entity_states_in(StateScope::EntityClient).next().unwrap();
        assert_eq!(hud.name, "hud");
        assert!(hud.replicated);
    }

    #[test]
    fn test_trailing_comment_hides_export() {
        let result = scanner().scan("exports('A', A) -- exports('B', B)", "server.lua");
        let ids: Vec<_> = result.exports.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["A"]);
    }

    #[test]
    fn test_trailing_comment_hides_global_state() {
        let result = scanner().scan("local a = 1 -- GlobalState.x = true", "server.lua");
        assert!(result.global_states.is_empty());
    }

    #[test]
    fn test_trailing_comment_hides_entity_state() {
        let src = "local a = 1 -- LocalPlayer.state:set('k', 1)
local b = 2 -- Player(src).state.k = 1";
        let result = scanner().scan(src, "client.lua");
        assert!(result.entity_states.is_empty());
    }

    #[test]
    fn test_comment_marker_inside_string_kept() {
        let result = scanner().scan("GlobalState.motd = 'a -- b' -- note", "server.lua");
        assert_eq!(result.global_states.len(), 1);
        assert_eq!(result.global_states[0].value_type, ValueType::String);
    }

    #[test]
    fn test_block_comment_disables_code() {
        let src = "--[[\nexports('Old', function() end)\nGlobalState.old = 1\n]]\nexports('New', function() end)";
        let result = scanner().scan(src, "server.lua");
        let ids: Vec<_> = result.exports.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["New"]);
        assert!(result.global_states.is_empty());
    }

    #[test]
    fn test_reference_not_resolved_inside_block_comment() {
        let src = "function Api(real) end\n--[[\nfunction Api(old) end\n]]\nexports('Api', Api)";
        let result = scanner().scan(src, "server.lua");
        assert_eq!(result.exports[0].params[0].name, "real");
    }

    #[test]
    fn test_assigned_value_stops_at_statement_end() {
        let src = "GlobalState.n = 0;\nif r then GlobalState.count = 1 end\nGlobalState.a = 'x' GlobalState.b = true\nGlobalState.c = x and not y";
        let result = scanner().scan(src, "server.lua");
        let globals: Vec<_> = result
            .global_states
            .iter()
            .map(|s| (s.name.as_str(), s.value_type))
            .collect();
        assert_eq!(
            globals,
            vec![
                ("n", ValueType::Number),
                ("count", ValueType::Number),
                ("a", ValueType::String),
                ("b", ValueType::Boolean),
                ("c", ValueType::Any),
            ]
        );
    }

    #[test]
    fn test_assignment_form_value_stops_at_statement_end() {
        let src = "if x then LocalPlayer.state.busy = false end";
        let result = scanner().scan(src, "client.lua");
        assert_eq!(result.entity_states[0].value_type, ValueType::Boolean);
    }

    #[test]
    fn test_several_setters_on_one_line() {
        let src = "Player(a).state:set('x', 1, true) Player(a).state:set('y', 'v', true) Player(a).state.z = {}";
        let result = scanner().scan(src, "server.lua");
        let keys: Vec<_> = result
            .entity_states
            .iter()
            .map(|s| (s.name.as_str(), s.value_type))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("x", ValueType::Number),
                ("y", ValueType::String),
                ("z", ValueType::Table),
            ]
        );
    }

    #[test]
    fn test_split_call_args_respects_nesting() {
        let args = split_call_args("'k', fn(a, b), { 1, 2 }, true) trailing");
        assert_eq!(args, vec!["'k'", "fn(a, b)", "{ 1, 2 }", "true"]);

        let args = split_call_args("\"a,b\", 'it\\'s')");
        assert_eq!(args, vec!["\"a,b\"", "'it\\'s'"]);
    }

    #[test]
    fn test_malformed_lines_do_not_panic() {
        let src = "exports(\nexports('x'\nGlobalState. = \nPlayer(.state:set(\nLocalPlayer.state:set()";
        let result = scanner().scan(src, "client.lua");
        assert!(result.global_states.is_empty());
        assert!(result.entity_states.is_empty());
    }
}
