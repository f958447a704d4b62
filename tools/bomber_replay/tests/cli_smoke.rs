use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn encoded(fields: Value) -> Value {
    let Value::Object(fields) = fields else {
        panic!("record must be an object");
    };
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key, Value::String(value.to_string())))
            .collect(),
    )
}

fn scene(board: Value) -> Value {
    json!({
        "board": board,
        "agents": [
            {"agent_id": 0, "position": [0, 0], "ammo": 1, "is_alive": true, "blast_strength": 2, "can_kick": false}
        ],
        "bombs": [],
        "items": [],
        "flames": []
    })
}

/// A two-snapshot game plus a shell "simulator" that always prints `next`.
fn write_game(dir: &Path, recorded_next: Value, simulated_next: Value) {
    let mut first = scene(json!([[0, 0], [0, 0]]));
    first["step_count"] = json!(0);
    let mut second = scene(recorded_next);
    second["step_count"] = json!(1);
    second["intended_actions"] = json!([5]);
    let game = json!({"state": [encoded(first), encoded(second)]});
    fs::write(dir.join("game.json"), game.to_string()).expect("game");

    fs::write(dir.join("next.json"), scene(simulated_next).to_string()).expect("next");
    fs::write(
        dir.join("step.sh"),
        "cat > /dev/null\ncat \"$(dirname \"$0\")/next.json\"\n",
    )
    .expect("script");
}

fn replay_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("bomber-replay");
    cmd.current_dir(dir)
        .arg("--gamefile")
        .arg("game.json")
        .arg("--simulator")
        .arg("sh")
        .arg("--simulator-arg")
        .arg(dir.join("step.sh"))
        .arg("--log-file")
        .arg(dir.join("logs/run.jsonl"));
    cmd
}

#[test]
fn help_lists_replay_flags() {
    let mut cmd = cargo_bin_cmd!("bomber-replay");
    cmd.arg("--help");
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");

    for flag in ["--gamefile", "--noverify", "--verbose", "--render", "--compare"] {
        assert!(stdout.contains(flag), "missing {flag} in help");
    }
}

#[test]
fn missing_gamefile_flag_exits_nonzero() {
    let mut cmd = cargo_bin_cmd!("bomber-replay");
    let out = cmd.assert().failure();
    let stderr = String::from_utf8(out.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("--gamefile"));
}

#[test]
fn unreadable_recording_exits_nonzero() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut cmd = cargo_bin_cmd!("bomber-replay");
    cmd.current_dir(temp.path())
        .arg("--gamefile")
        .arg("missing.json")
        .arg("--log-file")
        .arg(temp.path().join("run.jsonl"));
    cmd.assert().failure();
}

#[cfg(unix)]
#[test]
fn shell_simulator_reproduces_the_recording() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_game(temp.path(), json!([[0, 3], [0, 0]]), json!([[0, 3], [0, 0]]));

    let mut cmd = replay_cmd(temp.path());
    cmd.arg("--report-json").arg("report.json");
    cmd.assert().success();

    let report: Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("report.json")).expect("report"))
            .expect("json");
    assert_eq!(report["outcome"], json!("verified"));
    assert!(temp.path().join("logs/run.jsonl").exists());
}

#[cfg(unix)]
#[test]
fn shell_simulator_divergence_exits_one_with_failed_step() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_game(temp.path(), json!([[0, 3], [0, 0]]), json!([[0, 0], [0, 0]]));

    let out = replay_cmd(temp.path()).assert().code(1);
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("failed at step: 0"));
}
