//! @acp:module "Unit Resolution"
//! @acp:summary "Maps a source file to the resource (unit) that owns it"
//! @acp:domain cli
//! @acp:layer service

use std::path::{Path, PathBuf};

/// @acp:summary "An owning unit: name plus the directory holding its manifest"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: String,
    pub root: PathBuf,
}

impl Unit {
    /// Path of `file` relative to the unit root, `/`-separated
    pub fn relative_path(&self, file: &Path) -> String {
        file.strip_prefix(&self.root)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// @acp:summary "Injected file-to-unit mapping"
pub trait UnitResolver: Send + Sync {
    fn resolve(&self, file: &Path) -> Option<Unit>;
}

impl<F> UnitResolver for F
where
    F: Fn(&Path) -> Option<Unit> + Send + Sync,
{
    fn resolve(&self, file: &Path) -> Option<Unit> {
        self(file)
    }
}

/// @acp:summary "Nearest ancestor directory holding a manifest file"
///
/// The search never climbs above `root`.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    root: PathBuf,
    manifests: Vec<String>,
}

impl ManifestResolver {
    pub fn new(root: impl Into<PathBuf>, manifests: Vec<String>) -> Self {
        Self {
            root: root.into(),
            manifests,
        }
    }

    fn is_unit_dir(&self, dir: &Path) -> bool {
        self.manifests.iter().any(|m| dir.join(m).is_file())
    }
}

impl UnitResolver for ManifestResolver {
    fn resolve(&self, file: &Path) -> Option<Unit> {
        let mut dir = file.parent();
        while let Some(current) = dir {
            if self.is_unit_dir(current) {
                // "." has no file name of its own
                let name = current
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .or_else(|| {
                        let absolute = current.canonicalize().ok()?;
                        absolute.file_name().map(|n| n.to_string_lossy().to_string())
                    })?;
                return Some(Unit {
                    name,
                    root: current.to_path_buf(),
                });
            }
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            dir = current.parent();
        }
        None
    }
}
