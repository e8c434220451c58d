use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::process::Command;
use tempfile::TempDir;

fn gallery() -> Command {
    let mut cmd = Command::cargo_bin("scene-gallery").expect("binary exists");
    cmd.arg("--headless");
    cmd
}

fn write_model(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("wedge.obj");
    std::fs::write(
        &path,
        "o wedge\nv 0 0 0\nv 2 0 0\nv 0 1 0\nv 0 0 1\nf 1 3 2\nf 1 2 4\nf 1 4 3\nf 2 3 4\n",
    )
    .expect("write model");
    path
}

#[test]
fn list_prints_the_menu() {
    let mut cmd = Command::cargo_bin("scene-gallery").expect("binary exists");
    cmd.arg("--list");
    cmd.assert()
        .success()
        .stdout(contains("1 transfer"))
        .stdout(contains("3 lerp"))
        .stdout(contains("5 loader"));
}

#[test]
fn cannon_ball_comes_to_rest_on_the_floor() {
    let mut cmd = gallery();
    cmd.args(["--demo", "cannon", "--frames", "600"]);
    cmd.assert()
        .success()
        .stdout(contains("Demo: cannon (600 frames)"))
        .stdout(
            predicates::str::is_match(r" - ball pos=\(-?0\.00, 0\.50, -?0\.00\)")
                .expect("valid regex"),
        )
        .stdout(contains("color=#00ff00"));
}

#[test]
fn transfer_moves_when_toggled() {
    let mut cmd = gallery();
    cmd.args(["--press", "m", "--frames", "10"]);
    cmd.assert()
        .success()
        .stdout(contains(" - sphere pos=(1.00, 1.00, 1.00)"))
        .stdout(contains("move on"));
}

#[test]
fn lerp_reports_scroll_progress_as_json() {
    let mut cmd = gallery();
    cmd.args(["--demo", "lerp", "--seed", "7", "--scroll", "0.25", "--json"]);
    cmd.assert()
        .success()
        .stdout(contains("\"demo\": \"lerp\""))
        .stdout(contains("\"points\": 500"))
        .stdout(contains("scroll 25.00% (outward)"));
}

#[test]
fn loader_applies_the_light_slider() {
    let dir = TempDir::new().expect("temp dir");
    let model = write_model(&dir);
    let mut cmd = gallery();
    cmd.args(["--demo", "loader", "--light-x", "-2500", "--frames", "1", "--model"])
        .arg(&model);
    cmd.assert()
        .success()
        .stdout(contains("1 parts, 4 triangles"))
        .stdout(contains("light x -2500"))
        .stdout(contains(" - wedge pos="));
}

#[test]
fn missing_model_keeps_running() {
    let dir = TempDir::new().expect("temp dir");
    let mut cmd = gallery();
    cmd.env("RUST_LOG", "error")
        .args(["--demo", "loader", "--model"])
        .arg(dir.path().join("absent.gltf"));
    cmd.assert()
        .success()
        .stdout(contains("Status: failed: "))
        .stderr(contains("error loading model"));
}

#[test]
fn digit_keys_switch_demos() {
    let mut cmd = gallery();
    cmd.args(["--press", "4", "--frames", "1"]);
    cmd.assert()
        .success()
        .stdout(contains("Demo: raycaster"))
        .stdout(contains(" - red pos=(-1.00, 0.50, 0.00)"))
        .stdout(contains(" - sphere").not());
}

#[test]
fn unknown_arguments_fail() {
    let mut cmd = Command::cargo_bin("scene-gallery").expect("binary exists");
    cmd.arg("--bogus");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"));
}

#[test]
fn unknown_demo_fails() {
    let mut cmd = gallery();
    cmd.args(["--demo", "menu"]);
    cmd.assert().failure().stderr(contains("unknown demo: menu"));
}
