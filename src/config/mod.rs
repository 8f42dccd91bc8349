//! @acp:module "Configuration"
//! @acp:summary "Project configuration loading and defaults"
//! @acp:domain cli
//! @acp:layer config

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = ".fxstubs.json";

/// @acp:summary "Main fxstubs configuration structure"
/// @acp:lock normal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File patterns to include (glob syntax, relative to the scan root)
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// File patterns to exclude (glob syntax, relative to the scan root)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// File names that mark a directory as a unit (resource) root
    #[serde(default = "default_manifests")]
    pub manifests: Vec<String>,

    /// Directory that receives generated declaration files
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Scanner tuning
    #[serde(default)]
    pub scan: ScanConfig,

    /// Output rendering options
    #[serde(default)]
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            manifests: default_manifests(),
            output: default_output(),
            scan: ScanConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Config {
    /// @acp:summary "Load config from a JSON file"
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the config at `path` when it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

fn default_include() -> Vec<String> {
    vec!["**/*.lua".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec![
        // Package managers
        "**/node_modules/**".to_string(),
        // Streamed assets never carry scripts worth scanning
        "**/stream/**".to_string(),
        // VCS
        "**/.git/**".to_string(),
        // IDE
        "**/.vscode/**".to_string(),
    ]
}

fn default_manifests() -> Vec<String> {
    vec!["fxmanifest.lua".to_string(), "__resource.lua".to_string()]
}

fn default_output() -> PathBuf {
    PathBuf::from("types")
}

/// @acp:summary "How blank lines inside a comment run are treated"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankLinePolicy {
    /// A blank line ends the comment block
    #[default]
    Terminate,
    /// Blank lines are passed over and the block continues above them
    Skip,
}

/// @acp:summary "Scanner search windows and comment policy"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Lines searched backwards for the declaration behind a bare export reference
    #[serde(default = "default_reference_window")]
    pub reference_window: usize,

    /// Lines searched forwards to reassemble a call or signature split across lines
    #[serde(default = "default_lookahead_lines")]
    pub lookahead_lines: usize,

    #[serde(default)]
    pub blank_lines: BlankLinePolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            reference_window: default_reference_window(),
            lookahead_lines: default_lookahead_lines(),
            blank_lines: BlankLinePolicy::default(),
        }
    }
}

fn default_reference_window() -> usize {
    500
}

fn default_lookahead_lines() -> usize {
    4
}

/// @acp:summary "Rendering options"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Stamp generated files with the generation time
    #[serde(default = "default_true")]
    pub timestamp: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { timestamp: true }
    }
}

fn default_true() -> bool {
    true
}
