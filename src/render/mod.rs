//! @acp:module "Renderer"
//! @acp:summary "Turns a snapshot into LuaLS ---@meta declaration files"
//! @acp:domain cli
//! @acp:layer output
//!
//! Views are prepared in Rust (one pre-formatted annotation line per entry);
//! templates only lay them out.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use handlebars::Handlebars;
use serde::Serialize;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::index::{EntityState, MergedState, Snapshot};
use crate::model::{ExportRecord, Side};

const UNIT_TEMPLATE: &str = r#"---@meta
-- {{header}}

---@class {{class}}
local {{var}} = {}

{{#each exports}}
{{#each annotations}}
{{this}}
{{/each}}
function {{owner}}:{{name}}({{args}}) end

{{/each}}
"#;

const EXPORTS_INDEX_TEMPLATE: &str = r#"---@meta
-- {{header}}

---@class CfxExports
{{#each fields}}
{{this}}
{{/each}}
exports = {}
"#;

const STATE_TEMPLATE: &str = r#"---@meta
-- {{header}}

---@class GlobalStateBag
{{#each globals}}
{{this}}
{{/each}}
GlobalState = {}

---@class PlayerStateBag
{{#each entities}}
{{this}}
{{/each}}
"#;

/// File holding the `exports` table declaration
pub const EXPORTS_INDEX_FILE: &str = "_exports.lua";

/// File holding the state bag declarations
pub const STATE_FILE: &str = "_state.lua";

/// @acp:summary "One generated file, path relative to the output directory"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Serialize)]
struct ExportView {
    owner: String,
    name: String,
    args: String,
    annotations: Vec<String>,
}

#[derive(Serialize)]
struct UnitView<'a> {
    header: &'a str,
    class: String,
    var: String,
    exports: Vec<ExportView>,
}

#[derive(Serialize)]
struct FieldsView<'a> {
    header: &'a str,
    fields: Vec<String>,
}

#[derive(Serialize)]
struct StateView<'a> {
    header: &'a str,
    globals: Vec<String>,
    entities: Vec<String>,
}

/// @acp:summary "Handlebars-backed declaration renderer"
pub struct Renderer {
    registry: Handlebars<'static>,
    timestamp: bool,
}

impl Renderer {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_template_string("unit", UNIT_TEMPLATE)?;
        registry.register_template_string("exports", EXPORTS_INDEX_TEMPLATE)?;
        registry.register_template_string("state", STATE_TEMPLATE)?;
        Ok(Self {
            registry,
            timestamp: config.timestamp,
        })
    }

    fn header(&self) -> String {
        let mut header = format!("Generated by fxstubs {}", crate::VERSION);
        if self.timestamp {
            header.push_str(&format!(" on {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")));
        }
        header.push_str(". Do not edit.");
        header
    }

    /// @acp:summary "Render every file for a snapshot"
    pub fn render_all(&self, snapshot: &Snapshot) -> Result<Vec<RenderedFile>> {
        let mut files = Vec::new();

        for (unit, exports) in &snapshot.exports {
            for (side, records) in exports.sides() {
                files.push(RenderedFile {
                    path: Path::new(&file_stem(unit)).join(format!("{}.lua", side)),
                    content: self.render_unit(unit, side, records)?,
                });
            }
        }

        if !snapshot.exports.is_empty() {
            let units: Vec<&str> = snapshot.exports.keys().map(String::as_str).collect();
            files.push(RenderedFile {
                path: PathBuf::from(EXPORTS_INDEX_FILE),
                content: self.render_exports_index(&units)?,
            });
        }

        if !snapshot.global_states.is_empty() || !snapshot.entity_states.is_empty() {
            files.push(RenderedFile {
                path: PathBuf::from(STATE_FILE),
                content: self.render_state(&snapshot.global_states, &snapshot.entity_states)?,
            });
        }

        Ok(files)
    }

    /// @acp:summary "Render the exports of one unit and side"
    ///
    /// Records must already be sorted by identifier. A repeated identifier
    /// keeps only its last occurrence.
    pub fn render_unit(&self, unit: &str, side: Side, records: &[ExportRecord]) -> Result<String> {
        let var = format!("{}_{}", lua_var(unit), side);

        let mut last_index: HashMap<&str, usize> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            last_index.insert(record.identifier.as_str(), idx);
        }

        let exports = records
            .iter()
            .enumerate()
            .filter(|(idx, record)| last_index.get(record.identifier.as_str()) == Some(idx))
            .map(|(_, record)| ExportView {
                owner: var.clone(),
                name: record.identifier.clone(),
                args: record
                    .params
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                annotations: export_annotations(record),
            })
            .collect();

        let header = self.header();
        let view = UnitView {
            header: &header,
            class: export_class(unit),
            var,
            exports,
        };
        Ok(self.registry.render("unit", &view)?)
    }

    pub fn render_exports_index(&self, units: &[&str]) -> Result<String> {
        let header = self.header();
        let view = FieldsView {
            header: &header,
            fields: units
                .iter()
                .map(|unit| format!("---@field {} {}", field_name(unit), export_class(unit)))
                .collect(),
        };
        Ok(self.registry.render("exports", &view)?)
    }

    pub fn render_state(&self, globals: &[MergedState], entities: &[EntityState]) -> Result<String> {
        let header = self.header();
        let view = StateView {
            header: &header,
            globals: globals
                .iter()
                .map(|s| {
                    format!(
                        "---@field {} {} Set by: {}",
                        field_name(&s.name),
                        s.value_type,
                        s.owning_units.join(", ")
                    )
                })
                .collect(),
            entities: entities
                .iter()
                .map(|s| {
                    format!(
                        "---@field {} {} Replication: {}; set by: {}",
                        field_name(&s.name),
                        s.value_type,
                        s.replication,
                        s.owning_units.join(", ")
                    )
                })
                .collect(),
        };
        Ok(self.registry.render("state", &view)?)
    }
}

/// @acp:summary "Write rendered files below `out_dir`, creating directories"
pub fn write_files(out_dir: &Path, files: &[RenderedFile]) -> Result<()> {
    for file in files {
        let path = out_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &file.content)?;
    }
    Ok(())
}

fn export_annotations(record: &ExportRecord) -> Vec<String> {
    let mut lines: Vec<String> = record
        .description
        .lines()
        .map(|line| format!("--- {}", line).trim_end().to_string())
        .collect();

    if let Some(note) = &record.deprecated {
        lines.push(format!("---@deprecated {}", note).trim_end().to_string());
    }

    for param in &record.params {
        let optional = if param.optional { "?" } else { "" };
        lines.push(
            format!(
                "---@param {}{} {} {}",
                param.name, optional, param.r#type, param.description
            )
            .trim_end()
            .to_string(),
        );
    }

    for ret in &record.returns {
        lines.push(
            format!("---@return {} {}", ret.r#type, ret.description)
                .trim_end()
                .to_string(),
        );
    }

    lines
}

fn export_class(unit: &str) -> String {
    format!("exports.{}", unit)
}

/// Identifier-safe variable name for a unit
fn lua_var(unit: &str) -> String {
    let mut var: String = unit
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if var.starts_with(|c: char| c.is_ascii_digit()) {
        var.insert(0, '_');
    }
    var
}

/// Field name, bracket-quoted when it is not a plain identifier
fn field_name(name: &str) -> String {
    let plain = name.starts_with(|c: char| c == '_' || c.is_ascii_alphabetic())
        && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric());
    if plain {
        name.to_string()
    } else {
        format!("[\"{}\"]", name)
    }
}

/// Unit names become directory names, so path separators are replaced
fn file_stem(unit: &str) -> String {
    unit.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Param, ReturnValue, SourceLocation};

    fn renderer() -> Renderer {
        Renderer::new(&RenderConfig { timestamp: false }).unwrap()
    }

    fn record(identifier: &str, file: &str) -> ExportRecord {
        ExportRecord {
            identifier: identifier.to_string(),
            side: Side::Server,
            params: vec![Param {
                name: "name".to_string(),
                r#type: "string".to_string(),
                description: "Job name".to_string(),
                optional: false,
            }],
            returns: vec![ReturnValue {
                r#type: "boolean".to_string(),
                description: String::new(),
            }],
            description: format!("From {}", file),
            deprecated: None,
            location: SourceLocation {
                file: file.to_string(),
                line: 1,
            },
        }
    }

    #[test]
    fn test_render_unit_annotations() {
        let out = renderer()
            .render_unit("jobs", Side::Server, &[record("AddJob", "a.lua")])
            .unwrap();
        assert!(out.starts_with("---@meta\n"));
        assert!(out.contains("---@class exports.jobs"));
        assert!(out.contains("--- From a.lua"));
        assert!(out.contains("---@param name string Job name"));
        assert!(out.contains("---@return boolean\n"));
        assert!(out.contains("function jobs_server:AddJob(name) end"));
        assert!(!out.contains(" on 20"));
    }

    #[test]
    fn test_duplicate_identifier_last_wins() {
        let out = renderer()
            .render_unit(
                "jobs",
                Side::Server,
                &[record("AddJob", "a.lua"), record("AddJob", "b.lua")],
            )
            .unwrap();
        assert_eq!(out.matches("function jobs_server:AddJob").count(), 1);
        assert!(out.contains("From b.lua"));
        assert!(!out.contains("From a.lua"));
    }

    #[test]
    fn test_field_names_and_vars() {
        assert_eq!(field_name("job"), "job");
        assert_eq!(field_name("my-key"), "[\"my-key\"]");
        assert_eq!(lua_var("qb-core"), "qb_core");
        assert_eq!(lua_var("3dme"), "_3dme");
    }

    #[test]
    fn test_exports_index() {
        let out = renderer().render_exports_index(&["jobs", "qb-core"]).unwrap();
        assert!(out.contains("---@field jobs exports.jobs"));
        assert!(out.contains("---@field [\"qb-core\"] exports.qb-core"));
        assert!(out.contains("exports = {}"));
    }
}
