//! Indexer integration tests
//!
//! Builds small resource trees on disk and runs the full walk, scan,
//! aggregate and render pipeline over them.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use fxstubs::index::{scan_file, Count};
use fxstubs::render::{write_files, EXPORTS_INDEX_FILE, STATE_FILE};
use fxstubs::{
    Config, FxError, Indexer, RenderConfig, Renderer, Replication, Scanner, Side, Unit, ValueType,
};

const JOBS_SERVER: &str = r#"GlobalState.jobsOnline = 0

--- Adds a job.
--- @param name string Job name
--- @param grade? number
--- @return boolean ok
local function AddJob(name, grade)
    Player(source).state:set('onDuty', true, true)
    return true
end

exports('AddJob', AddJob)
"#;

const JOBS_CLIENT: &str = r#"LocalPlayer.state:set('onDuty', false)

exports('OpenMenu', function(id)
end)
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Two resources plus a stray file that belongs to neither
fn resource_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "[core]/jobs/fxmanifest.lua", "fx_version 'cerulean'\ngame 'gta5'\n");
    write(root, "[core]/jobs/server/main.lua", JOBS_SERVER);
    write(root, "[core]/jobs/client/main.lua", JOBS_CLIENT);
    write(root, "[core]/jobs/shared/config.lua", "GlobalState.jobsOnline = 'none'\n");
    write(root, "hud/__resource.lua", "resource_manifest_version 'x'\n");
    write(root, "hud/main.lua", "exports('Show', function() end)\n");
    write(root, "hud/stream/props.lua", "exports('Hidden', function() end)\n");
    write(root, "loose/stray.lua", "GlobalState.stray = 1\n");

    dir
}

fn untimed_renderer() -> Renderer {
    Renderer::new(&RenderConfig { timestamp: false }).unwrap()
}

// =============================================================================
// Indexing
// =============================================================================

mod index_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_resource_tree() {
        let dir = resource_tree();
        let report = Indexer::new(Config::default())
            .unwrap()
            .index(dir.path())
            .unwrap();

        // Six files inside units (manifests included), one stray
        assert_eq!(report.files_scanned, 6);
        assert_eq!(report.files_skipped, 1);
        assert!(report.errors.is_empty());

        let snapshot = &report.snapshot;
        let units: Vec<_> = snapshot.exports.keys().map(String::as_str).collect();
        assert_eq!(units, vec!["hud", "jobs"]);

        let jobs = &snapshot.exports["jobs"];
        assert_eq!(jobs.side(Side::Server)[0].identifier, "AddJob");
        assert_eq!(jobs.side(Side::Client)[0].identifier, "OpenMenu");
        assert!(jobs.side(Side::Shared).is_empty());
        assert_eq!(snapshot.exports["hud"].side(Side::Shared)[0].identifier, "Show");

        let add_job = &jobs.side(Side::Server)[0];
        assert_eq!(add_job.description, "Adds a job.");
        assert_eq!(add_job.params.len(), 2);
        assert!(add_job.params[1].optional);
        assert_eq!(add_job.location.file, "server/main.lua");

        assert_eq!(snapshot.global_states.len(), 1);
        assert_eq!(snapshot.global_states[0].name, "jobsOnline");
        assert_eq!(snapshot.global_states[0].value_type, ValueType::Any);
        assert_eq!(snapshot.global_states[0].owning_units, vec!["jobs"]);

        assert_eq!(snapshot.entity_states.len(), 1);
        assert_eq!(snapshot.entity_states[0].name, "onDuty");
        assert_eq!(snapshot.entity_states[0].value_type, ValueType::Boolean);
        assert_eq!(snapshot.entity_states[0].replication, Replication::Bidirectional);

        assert_eq!(snapshot.summary.exports, Count { observed: 3, unique: 3 });
        assert_eq!(snapshot.summary.global_states, Count { observed: 2, unique: 1 });
        assert_eq!(snapshot.summary.entity_states, Count { observed: 2, unique: 1 });
    }

    #[test]
    fn test_index_is_repeatable() {
        let dir = resource_tree();
        let indexer = Indexer::new(Config::default()).unwrap();
        let first = indexer.index(dir.path()).unwrap();
        let second = indexer.index(dir.path()).unwrap();
        assert_eq!(first.snapshot, second.snapshot);
    }

    #[test]
    fn test_index_with_closure_resolver() {
        let dir = resource_tree();
        let root = dir.path().to_path_buf();

        // Every file belongs to one unit rooted at the tree root
        let resolver = move |_: &Path| -> Option<Unit> {
            Some(Unit {
                name: "monolith".to_string(),
                root: root.clone(),
            })
        };

        let report = Indexer::new(Config::default())
            .unwrap()
            .index_with_resolver(dir.path(), &resolver, &ProgressBar::hidden())
            .unwrap();

        assert_eq!(report.files_scanned, 7);
        assert_eq!(report.files_skipped, 0);

        let units: Vec<_> = report.snapshot.exports.keys().map(String::as_str).collect();
        assert_eq!(units, vec!["monolith"]);
        assert_eq!(report.snapshot.global_states.len(), 2);
    }

    #[test]
    fn test_index_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = Indexer::new(Config::default())
            .unwrap()
            .index(dir.path().join("absent"));
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_file_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let unit = Unit {
            name: "ghost".to_string(),
            root: dir.path().to_path_buf(),
        };
        let result = scan_file(&Scanner::default(), &dir.path().join("gone.lua"), &unit);
        assert!(matches!(result, Err(FxError::Read { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_reported_and_run_continues() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "res/fxmanifest.lua", "");
        write(dir.path(), "res/server/ok.lua", "GlobalState.ready = true\n");
        write(dir.path(), "res/server/locked.lua", "GlobalState.hidden = 1\n");

        let locked = dir.path().join("res/server/locked.lua");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&locked).is_ok() {
            // Permission bits do not bind this user (root)
            return;
        }

        let unit_root = dir.path().join("res");
        let resolver = move |_: &Path| -> Option<Unit> {
            Some(Unit {
                name: "res".to_string(),
                root: unit_root.clone(),
            })
        };
        let report = Indexer::new(Config::default())
            .unwrap()
            .index_with_resolver(dir.path(), &resolver, &ProgressBar::hidden())
            .unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, locked);
        assert!(report.errors[0].message.contains("Failed to read"));
        assert_eq!(report.files_scanned, 2);

        let names: Vec<_> = report
            .snapshot
            .global_states
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["ready"]);
    }

    #[test]
    fn test_non_utf8_file_is_still_scanned() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "res/fxmanifest.lua", "");
        fs::write(
            dir.path().join("res/main.lua"),
            b"-- caf\xe9\nGlobalState.ready = true\n",
        )
        .unwrap();

        let report = Indexer::new(Config::default())
            .unwrap()
            .index(dir.path())
            .unwrap();
        assert_eq!(report.snapshot.global_states[0].name, "ready");
        assert_eq!(report.snapshot.global_states[0].value_type, ValueType::Boolean);
    }
}

// =============================================================================
// Rendering
// =============================================================================

mod render_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_resource_tree() {
        let dir = resource_tree();
        let report = Indexer::new(Config::default())
            .unwrap()
            .index(dir.path())
            .unwrap();

        let files = untimed_renderer().render_all(&report.snapshot).unwrap();
        let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("hud/shared.lua"),
                PathBuf::from("jobs/client.lua"),
                PathBuf::from("jobs/server.lua"),
                PathBuf::from(EXPORTS_INDEX_FILE),
                PathBuf::from(STATE_FILE),
            ]
        );

        let server = &files[2].content;
        assert!(server.starts_with("---@meta"));
        assert!(server.contains("---@class exports.jobs"));
        assert!(server.contains("--- Adds a job."));
        assert!(server.contains("---@param name string Job name"));
        assert!(server.contains("---@param grade? number"));
        assert!(server.contains("---@return boolean ok"));
        assert!(server.contains("function jobs_server:AddJob(name, grade) end"));

        let index = &files[3].content;
        assert!(index.contains("---@field hud exports.hud"));
        assert!(index.contains("---@field jobs exports.jobs"));

        let state = &files[4].content;
        assert!(state.contains("---@field jobsOnline any Set by: jobs"));
        assert!(state.contains("---@field onDuty boolean Replication: bidirectional"));
    }

    #[test]
    fn test_write_files_creates_unit_directories() {
        let dir = resource_tree();
        let out = tempfile::tempdir().unwrap();

        let report = Indexer::new(Config::default())
            .unwrap()
            .index(dir.path())
            .unwrap();
        let files = untimed_renderer().render_all(&report.snapshot).unwrap();
        write_files(out.path(), &files).unwrap();

        assert!(out.path().join("jobs/server.lua").is_file());
        assert!(out.path().join("hud/shared.lua").is_file());
        assert!(out.path().join(STATE_FILE).is_file());

        let written = fs::read_to_string(out.path().join("jobs/client.lua")).unwrap();
        assert_eq!(written, files[1].content);
    }

    #[test]
    fn test_empty_tree_renders_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "empty/fxmanifest.lua", "fx_version 'cerulean'\n");

        let report = Indexer::new(Config::default())
            .unwrap()
            .index(dir.path())
            .unwrap();
        assert_eq!(report.files_scanned, 1);
        assert!(untimed_renderer().render_all(&report.snapshot).unwrap().is_empty());
    }
}
