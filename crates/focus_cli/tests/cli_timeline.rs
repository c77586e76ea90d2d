use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("live-focus-{nanos}-{file_name}"))
}

fn slot(id: u32, start: i32, duration: i32, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "start_time_minutes": start,
        "duration_minutes": duration,
        "status": status,
    })
}

fn write_store(path: &Path) {
    let content = serde_json::json!({
        "schema_version": 1,
        "tasks": [{
            "id": "task-1",
            "title": "deep work",
            "logical_date": "2024-03-02",
            "created_at": "2024-03-02T07:00:00Z",
            "stages": [
                slot(1, 15, 60, "upcoming"),
                slot(2, 1410, 30, "upcoming"),
                { "id": 3, "status": "upcoming" },
                slot(4, 540, 120, "process"),
                slot(5, 600, 30, "upcoming")
            ]
        }]
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn focus(store_path: &Path, args: &[&str], now: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_focus_cli"))
        .args(args)
        .env("FOCUS_STORE_PATH", store_path)
        .env("FOCUS_CONFIG_PATH", temp_path("missing-config.json"))
        .env("FOCUS_NOW", now)
        .env("FOCUS_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run focus_cli")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("json output")
}

#[test]
fn timeline_json_packs_lanes_in_display_order() {
    let store_path = temp_path("cli-timeline.json");
    write_store(&store_path);

    let output = focus(
        &store_path,
        &["--json", "timeline", "--date", "2024-03-02"],
        "2024-03-02 11:30",
    );

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let day = stdout_json(&output);
    assert_eq!(day["logical_date"], "2024-03-02");
    assert_eq!(day["now_display"], 330);

    let task = &day["tasks"][0];
    let entries: Vec<(u64, u64, u64)> = task["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| {
            (
                entry["stage_id"].as_u64().unwrap(),
                entry["display_start"].as_u64().unwrap(),
                entry["lane"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(entries, vec![(4, 180, 0), (5, 240, 1), (2, 1050, 1), (1, 1095, 1)]);
    assert_eq!(task["untimed"], serde_json::json!([3]));
    assert_eq!(task["lane_count"], 2);
}

#[test]
fn timeline_plain_renders_table() {
    let store_path = temp_path("cli-timeline-plain.json");
    write_store(&store_path);

    let output = focus(&store_path, &["timeline"], "2024-03-03 01:00");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Logical day 2024-03-02 (starts 06:00)"));
    assert!(stdout.contains("Now: 01:00"));
    assert!(stdout.contains("deep work (task-1) - 2 lanes"));
    assert!(stdout.contains("23:30"));
    assert!(stdout.contains("Unscheduled stages: 3"));
}

#[test]
fn timeline_rejects_bad_date() {
    let store_path = temp_path("cli-timeline-bad.json");
    let output = focus(&store_path, &["timeline", "--date", "soon"], "2024-03-02 11:30");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_input"));
}

#[test]
fn due_lists_actionable_stages() {
    let store_path = temp_path("cli-due.json");
    write_store(&store_path);

    let output = focus(&store_path, &["--json", "due"], "2024-03-02 11:30");
    let plain = focus(&store_path, &["due"], "2024-03-02 08:00");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let due = stdout_json(&output);
    let summary: Vec<(u64, String)> = due
        .as_array()
        .unwrap()
        .iter()
        .map(|item| {
            (
                item["stage_id"].as_u64().unwrap(),
                item["action"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![(4, "finish".to_string()), (5, "start".to_string())]
    );

    assert!(String::from_utf8_lossy(&plain.stdout).contains("Nothing due."));
}

#[test]
fn notify_reports_due_stages() {
    let store_path = temp_path("cli-notify.json");
    write_store(&store_path);

    let output = focus(&store_path, &["notify"], "2024-03-02 11:30");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Notified: deep work (task-1) stage 4 - finish"));
    assert!(stdout.contains("Notified: deep work (task-1) stage 5 - start"));
}

#[test]
fn watch_stops_after_requested_ticks() {
    let store_path = temp_path("cli-watch.json");
    write_store(&store_path);

    let output = focus(
        &store_path,
        &["--json", "watch", "--ticks", "2", "--interval-secs", "0"],
        "2024-03-02 11:30",
    );

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let days: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(days.len(), 2);
    assert!(days.iter().all(|day| day["logical_date"] == "2024-03-02"));
}
