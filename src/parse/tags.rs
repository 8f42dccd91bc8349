//! @acp:module "Doc Tags"
//! @acp:summary "Splits a comment block into description and @param/@return/@deprecated tags"
//! @acp:domain cli
//! @acp:layer service

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Param, ReturnValue};

/// Matches: @param name[?] type [description]
/// Groups: 1=name, 2=optional marker, 3=type, 4=description
static PARAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@param\s+(\.\.\.|[A-Za-z_]\w*)(\?)?\s+(\S+)(?:\s+(.*))?$").unwrap()
});

/// Matches: @return type [description]
static RETURN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@return\s+(\S+)(?:\s+(.*))?$").unwrap());

/// Matches: @deprecated [note]
static DEPRECATED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@deprecated(?:\s+(.*))?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Param,
    Return,
    Deprecated,
}

/// Recognize the tag keyword alone; the full pattern may still fail
fn tag_kind(line: &str) -> Option<TagKind> {
    let keyword = line
        .strip_prefix('@')?
        .split(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("");
    match keyword {
        "param" => Some(TagKind::Param),
        "return" => Some(TagKind::Return),
        "deprecated" => Some(TagKind::Deprecated),
        _ => None,
    }
}

/// @acp:summary "Parsed documentation for one anchor"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTags {
    pub description: String,
    pub params: Vec<Param>,
    pub returns: Vec<ReturnValue>,
    pub deprecated: Option<String>,
}

impl DocTags {
    /// Look up a documented parameter by bare name
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// @acp:summary "Parse the tag micro-language out of ordered comment lines"
///
/// Lines before the first recognized tag make up the description. Once a
/// tag has been seen, plain lines are ignored. Tag lines that fail to parse
/// are dropped without affecting the rest of the block.
pub fn parse_doc_tags<S: AsRef<str>>(lines: &[S]) -> DocTags {
    let mut tags = DocTags::default();
    let mut description: Vec<&str> = Vec::new();
    let mut in_tags = false;

    for line in lines {
        let line = line.as_ref().trim();

        let Some(kind) = tag_kind(line) else {
            if !in_tags {
                description.push(line);
            }
            continue;
        };
        in_tags = true;

        match kind {
            TagKind::Param => {
                if let Some(cap) = PARAM_PATTERN.captures(line) {
                    tags.params.push(Param {
                        name: cap[1].to_string(),
                        r#type: cap[3].to_string(),
                        description: trimmed_group(&cap, 4),
                        optional: cap.get(2).is_some(),
                    });
                }
            }
            TagKind::Return => {
                if let Some(cap) = RETURN_PATTERN.captures(line) {
                    tags.returns.push(ReturnValue {
                        r#type: cap[1].to_string(),
                        description: trimmed_group(&cap, 2),
                    });
                }
            }
            TagKind::Deprecated => {
                if let Some(cap) = DEPRECATED_PATTERN.captures(line) {
                    tags.deprecated = Some(trimmed_group(&cap, 1));
                }
            }
        }
    }

    tags.description = description.join("\n").trim().to_string();
    tags
}

fn trimmed_group(cap: &regex::Captures<'_>, idx: usize) -> String {
    cap.get(idx)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
