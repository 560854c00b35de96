use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::tempdir;
use tessel_doctor::DoctorError;
use tessel_doctor::apply::{ApplyArgs, run_apply};
use tessel_doctor::cli::{Cli, Commands, run};
use tessel_doctor::migrate::MigrateArgs;
use tessel_doctor::normalize::NormalizeArgs;
use tessel_doctor::validate::ValidateArgs;
use tessel_layout::{
    Direction, GridConfig, GridState, GridTimeline, add_view_to_grid, leaf_count, leaves,
    serialize_grid_to_value,
};

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).expect("render")).expect("write");
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("parse")
}

fn two_leaf_grid() -> GridState {
    add_view_to_grid(&GridState::new("a"), "b", &[], Direction::Right, None)
}

fn cli(command: Commands) -> Cli {
    Cli {
        config: None,
        verbose: 0,
        command,
    }
}

#[test]
fn validate_reports_ok_for_clean_grid() {
    let dir = tempdir().expect("tempdir");
    let grid_path = dir.path().join("grid.json");
    let report_path = dir.path().join("report.json");
    write_json(
        &grid_path,
        &serialize_grid_to_value(&two_leaf_grid()).expect("serialize"),
    );

    run(cli(Commands::Validate(ValidateArgs {
        grid: grid_path,
        known: vec!["a".into(), "b".into()],
        output: Some(report_path.clone()),
    })))
    .expect("clean grid validates");

    let report = read_json(&report_path);
    assert_eq!(report["status"], "ok");
    assert_eq!(report["leaf_count"], 2);
    assert_eq!(report["issues"], json!([]));
}

#[test]
fn validate_rejects_unknown_group_with_decode_exit_code() {
    let dir = tempdir().expect("tempdir");
    let grid_path = dir.path().join("grid.json");
    write_json(
        &grid_path,
        &serialize_grid_to_value(&two_leaf_grid()).expect("serialize"),
    );

    let error = run(cli(Commands::Validate(ValidateArgs {
        grid: grid_path,
        known: vec!["a".into()],
        output: Some(dir.path().join("report.json")),
    })))
    .expect_err("stale group id");

    assert!(matches!(error, DoctorError::Decode(_)));
    assert_eq!(error.exit_code(), 3);
}

#[test]
fn apply_skips_rejected_operations_and_records_timeline() {
    let dir = tempdir().expect("tempdir");
    let grid_path = dir.path().join("grid.json");
    let ops_path = dir.path().join("ops.json");
    let out_path = dir.path().join("out.json");
    let timeline_path = dir.path().join("timeline.json");
    write_json(
        &grid_path,
        &serialize_grid_to_value(&GridState::new("a")).expect("serialize"),
    );
    write_json(
        &ops_path,
        &json!([
            {"op": "add_view", "group_id": "b", "location": [], "direction": "right"},
            {"op": "remove_view", "location": [7]},
            {"op": "add_view", "group_id": "c", "location": [1], "direction": "down"},
            {"op": "normalize"}
        ]),
    );

    let stats = run_apply(
        ApplyArgs {
            grid: grid_path,
            ops: ops_path,
            output: Some(out_path.clone()),
            timeline: Some(timeline_path.clone()),
        },
        &GridConfig::default(),
    )
    .expect("apply runs");
    assert_eq!(stats.applied, 3);
    assert_eq!(stats.rejected, 1);

    let result = tessel_layout::deserialize_grid(&read_json(&out_path), None).expect("valid");
    let ids: Vec<String> = leaves(&result)
        .into_iter()
        .map(|(_, leaf)| leaf.group_id.clone())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let timeline: GridTimeline =
        serde_json::from_value(read_json(&timeline_path)).expect("timeline parses");
    assert_eq!(timeline.entries.len(), 3);
    assert_eq!(timeline.replay().expect("replay"), result);
}

#[test]
fn migrate_writes_grid_from_legacy_document() {
    let dir = tempdir().expect("tempdir");
    let legacy_path = dir.path().join("legacy.json");
    let out_path = dir.path().join("grid.json");
    write_json(
        &legacy_path,
        &json!({
            "panels": [{"id": "p1"}, {"id": "p2"}, {"id": "p3"}],
            "layout": {"direction": "vertical", "sizes": [50.0, 25.0, 25.0]}
        }),
    );

    run(cli(Commands::Migrate(MigrateArgs {
        legacy: legacy_path,
        output: Some(out_path.clone()),
    })))
    .expect("migrate");

    let grid = tessel_layout::deserialize_grid(&read_json(&out_path), None).expect("valid");
    assert_eq!(leaf_count(&grid), 3);
    let sizes: Vec<f64> = leaves(&grid).into_iter().map(|(_, leaf)| leaf.size).collect();
    assert_eq!(sizes, vec![50.0, 25.0, 25.0]);
}

#[test]
fn migrate_rejects_empty_panel_id() {
    let dir = tempdir().expect("tempdir");
    let legacy_path = dir.path().join("legacy.json");
    write_json(
        &legacy_path,
        &json!({"panels": [{"id": ""}], "layout": {"direction": "single"}}),
    );

    let error = run(cli(Commands::Migrate(MigrateArgs {
        legacy: legacy_path,
        output: Some(dir.path().join("grid.json")),
    })))
    .expect_err("empty id");
    assert!(matches!(error, DoctorError::InvalidArgument { .. }));
    assert_eq!(error.exit_code(), 1);
}

#[test]
fn normalize_rewrites_degenerate_branch() {
    let dir = tempdir().expect("tempdir");
    let grid_path = dir.path().join("grid.json");
    let out_path = dir.path().join("normalized.json");
    write_json(
        &grid_path,
        &json!({
            "root": {
                "type": "branch",
                "size": 100.0,
                "data": [
                    {
                        "type": "branch",
                        "size": 100.0,
                        "data": [
                            {"type": "leaf", "data": {"groupId": "a"}, "size": 100.0}
                        ]
                    }
                ]
            },
            "orientation": "horizontal",
            "width": 800.0,
            "height": 600.0
        }),
    );

    run(cli(Commands::Normalize(NormalizeArgs {
        grid: grid_path,
        output: Some(out_path.clone()),
    })))
    .expect("normalize");

    let grid = tessel_layout::deserialize_grid(&read_json(&out_path), None).expect("valid");
    assert!(grid.invariant_report().is_clean());
    assert_eq!(leaf_count(&grid), 1);
}
