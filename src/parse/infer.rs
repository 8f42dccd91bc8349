//! @acp:module "Type Inference"
//! @acp:summary "Classifies a literal value expression into a semantic type"
//! @acp:domain cli
//! @acp:layer service

use std::sync::LazyLock;

use regex::Regex;

use crate::model::ValueType;

use super::comments::strip_line_comment;

/// Signed decimal: 42, -3, +1.5, .25, 10.
static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)$").unwrap());

/// @acp:summary "Infer the type of a value expression"
///
/// Heuristic only: strips a trailing `--` comment, then checks booleans,
/// `nil`, quoted strings, numbers and table constructors in that order.
/// Anything else is `any`.
pub fn infer_value_type(expr: &str) -> ValueType {
    let code = strip_line_comment(expr);
    let value = code.trim();

    match value {
        "true" | "false" => return ValueType::Boolean,
        "nil" => return ValueType::Nil,
        _ => {}
    }

    if is_quoted(value) {
        ValueType::String
    } else if NUMBER_PATTERN.is_match(value) {
        ValueType::Number
    } else if value.starts_with('{') {
        ValueType::Table
    } else {
        ValueType::Any
    }
}

fn is_quoted(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 2
        && matches!(bytes[0], b'"' | b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
}
