//! @acp:module "Model Types"
//! @acp:summary "Declaration and state records (serializable snapshot building blocks)"
//! @acp:domain cli
//! @acp:layer model
//!
//! Records are created once per anchor in one file and never mutated
//! afterwards; merging happens in [`crate::index::aggregate`].

use serde::{Deserialize, Serialize};

/// Fallback type name used whenever nothing better is known
pub const ANY_TYPE: &str = "any";

// ============================================================================
// Side
// ============================================================================

/// @acp:summary "Execution context of a source file"
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Client,
    Server,
    #[default]
    Shared,
}

impl Side {
    /// Classify a file path by case-insensitive substring test.
    ///
    /// `client` wins over `server`, which wins over `shared`; paths naming
    /// none of them are shared.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_lowercase();
        if lower.contains("client") {
            Side::Client
        } else if lower.contains("server") {
            Side::Server
        } else {
            Side::Shared
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Client => "client",
            Side::Server => "server",
            Side::Shared => "shared",
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(Side::Client),
            "server" => Ok(Side::Server),
            "shared" => Ok(Side::Shared),
            _ => Err(format!("Unknown side: {}", s)),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Value types
// ============================================================================

/// @acp:summary "Semantic type inferred from a literal value"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Nil,
    String,
    Number,
    Table,
    #[default]
    Any,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Nil => "nil",
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Table => "table",
            ValueType::Any => ANY_TYPE,
        }
    }

    /// Combine two observations of the same key.
    ///
    /// Disagreement widens to `Any`, and `Any` absorbs everything, so the
    /// result never narrows again and does not depend on arrival order.
    pub fn widen(self, other: ValueType) -> ValueType {
        if self == other {
            self
        } else {
            ValueType::Any
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// Where a record was observed (1-indexed line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
}

/// @acp:summary "One parameter of an exported callable"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub r#type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
}

impl Param {
    /// Parameter known only from the signature
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: ANY_TYPE.to_string(),
            description: String::new(),
            optional: false,
        }
    }
}

/// @acp:summary "One documented return value (position is identity)"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnValue {
    pub r#type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// @acp:summary "One observed callable export"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub identifier: String,
    pub side: Side,
    pub params: Vec<Param>,
    pub returns: Vec<ReturnValue>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    pub location: SourceLocation,
}

// ============================================================================
// State
// ============================================================================

/// @acp:summary "Where a shared mutable key lives"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateScope {
    Global,
    EntityServer,
    EntityClient,
}

impl StateScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateScope::Global => "global",
            StateScope::EntityServer => "entity-server",
            StateScope::EntityClient => "entity-client",
        }
    }

    pub fn is_entity(&self) -> bool {
        !matches!(self, StateScope::Global)
    }
}

impl std::fmt::Display for StateScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @acp:summary "One observed assignment to a shared key"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub name: String,
    pub value_type: ValueType,
    pub scope: StateScope,
    /// Only meaningful for entity scopes
    #[serde(default, skip_serializing_if = "is_false")]
    pub replicated: bool,
    pub side: Side,
    pub location: SourceLocation,
}

/// @acp:summary "Resolved propagation of a per-entity key"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Replication {
    ServerOnly,
    ClientOnly,
    ToClient,
    ToServer,
    Bidirectional,
}

impl Replication {
    /// Resolve from the folded replication flag of each side.
    ///
    /// `None` means the side never observed the key. Observation on both
    /// sides is bidirectional whatever the flags say.
    pub fn resolve(server: Option<bool>, client: Option<bool>) -> Option<Replication> {
        match (server, client) {
            (Some(_), Some(_)) => Some(Replication::Bidirectional),
            (Some(false), None) => Some(Replication::ServerOnly),
            (Some(true), None) => Some(Replication::ToClient),
            (None, Some(false)) => Some(Replication::ClientOnly),
            (None, Some(true)) => Some(Replication::ToServer),
            (None, None) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Replication::ServerOnly => "server-only",
            Replication::ClientOnly => "client-only",
            Replication::ToClient => "to-client",
            Replication::ToServer => "to-server",
            Replication::Bidirectional => "bidirectional",
        }
    }
}

impl std::fmt::Display for Replication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}
