//! Offline checks of the command line surface

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn chub(settings: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("chub").unwrap();
    cmd.env_remove("CHUB_API_URL")
        .env_remove("CHUB_AVATAR_URL")
        .env_remove("RUST_LOG")
        .arg("--settings")
        .arg(settings.path().join("settings.toml"));
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    let stdout = stdout_of(chub(&dir).arg("--help"));
    for command in ["search", "download", "query", "browse", "config"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_query_prints_request_url() {
    let dir = TempDir::new().unwrap();
    let stdout = stdout_of(chub(&dir).args([
        "query", "elf", "--tags", "fantasy", "--page", "2", "--sort", "rating",
    ]));
    assert_eq!(
        stdout.trim(),
        "https://api.chub.ai/api/characters/search?search=elf&first=30&page=2&sort=rating&asc=false&include_forks=true&nsfw=false&tags=fantasy"
    );
}

#[test]
fn test_query_applies_overrides() {
    let dir = TempDir::new().unwrap();
    let stdout = stdout_of(chub(&dir).args(["--count", "5", "--nsfw", "query"]));
    assert!(stdout.contains("first=5&"));
    assert!(stdout.contains("nsfw=true"));
    assert!(!stdout.contains("search="));
    assert!(!stdout.contains("tags="));
}

#[test]
fn test_query_empty_sort_falls_back() {
    let dir = TempDir::new().unwrap();
    let stdout = stdout_of(chub(&dir).args(["query", "--sort", ""]));
    assert!(stdout.contains("&sort=download_count&"));
}

#[test]
fn test_query_reads_settings_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.toml"), "find_count = 12\nnsfw = true\n").unwrap();
    let stdout = stdout_of(chub(&dir).args(["query", "--exclude", "gore, ,horror"]));
    assert!(stdout.contains("first=12&"));
    assert!(stdout.contains("nsfw=true"));
    assert!(stdout.contains("exclude_tags=gore%2Chorror"));
}

#[test]
fn test_config_shows_effective_values() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.toml"), "find_count = 12\n").unwrap();
    let stdout = stdout_of(chub(&dir).arg("config"));
    assert!(stdout.contains("find_count = 12"));
    assert!(stdout.contains("nsfw       = false"));
    assert!(stdout.contains("host_url   = http://127.0.0.1:8000"));
}

#[test]
fn test_config_save_writes_file() {
    let dir = TempDir::new().unwrap();
    stdout_of(chub(&dir).args(["--host", "http://localhost:9000", "config", "--save"]));
    let saved = fs::read_to_string(dir.path().join("settings.toml")).unwrap();
    assert!(saved.contains("host_url = \"http://localhost:9000\""));
    assert!(saved.contains("find_count = 30"));
}

#[test]
fn test_invalid_settings_report_error_chain() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.toml"), "find_count = \"many\"\n").unwrap();
    let output = chub(&dir).arg("query").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("Failed to load settings"));
}
