use std::path::Path;
use std::process::{Command, Output};

fn fragref_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fragref"));
    cmd.current_dir(dir);
    cmd.env_remove("FRAGREF_LOG");
    cmd
}

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new("tests/fixtures").join(name)
}

fn run(dir: &Path, args: &[&str]) -> Output {
    fragref_cmd(dir).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Copy a fixture into a temp dir so commands that edit the snapshot don't
/// touch the checked-in files.
fn scratch_copy(name: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in std::fs::read_dir(fixture(name)).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

#[test]
fn walk_lists_records_depth_first() {
    let output = run(&fixture("basic"), &["walk", "home"]);
    assert!(output.status.success(), "walk failed: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "home.hero  home -> hero\n\
         hero.name  hero -> name-formal\n\
         home.pitch  home -> pitch-short\n"
    );
}

#[test]
fn walk_with_preset_shows_override() {
    let output = run(&fixture("basic"), &["walk", "home", "--preset", "casual"]);
    assert!(output.status.success(), "walk failed: {}", stderr(&output));
    assert!(stdout(&output).contains("hero.name  hero -> name-formal (override: name-casual)\n"));
}

#[test]
fn walk_json_output() {
    let output = run(&fixture("basic"), &["walk", "home", "--format", "json"]);
    assert!(output.status.success(), "walk failed: {}", stderr(&output));
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    let [hero, name, pitch] = records.as_slice() else {
        panic!("expected three records, got {records:?}");
    };
    assert_eq!(hero["namespaced_key"], "home.hero");
    assert_eq!(pitch["original_target_document_title"], "Short pitch");
    assert!(name.get("override_target_document_id").is_none());
}

#[test]
fn render_composes_text() {
    let output = run(&fixture("basic"), &["render", "home"]);
    assert!(output.status.success(), "render failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "Welcome, valued customer!\nBuilt to last.\n");

    let output = run(&fixture("basic"), &["render", "home", "--preset", "casual"]);
    assert_eq!(stdout(&output), "Welcome, friend!\nBuilt to last.\n");
}

#[test]
fn check_clean_snapshot_passes() {
    let output = run(&fixture("basic"), &["check"]);
    assert!(output.status.success(), "check failed: {}", stdout(&output));
    assert_eq!(stdout(&output), "All placeholders resolve (1 roots)\n");
}

#[test]
fn check_reports_findings_and_exits_one() {
    let output = run(&fixture("broken"), &["check"]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("CYCLE     loop-b: `back` leads back to `loop-a`"), "{out}");
    assert!(out.contains("UNMAPPED  page: `ghost` is not mapped"), "{out}");
    assert!(out.contains("MISSING   page: `gone` points at `nowhere`"), "{out}");
    assert!(out.contains("3 findings across 1 roots"), "{out}");
}

#[test]
fn check_covers_cycles_with_no_root() {
    let output = run(&fixture("cycle"), &["check"]);
    assert_eq!(output.status.code(), Some(1), "{}", stdout(&output));
    let out = stdout(&output);
    assert!(out.contains("CYCLE     outro: `intro` leads back to `intro`"), "{out}");
    assert!(out.contains("UNMAPPED  intro: `ghost` is not mapped"), "{out}");
    assert!(out.contains("2 findings across 1 roots"), "{out}");
}

#[test]
fn check_json_output() {
    let output = run(&fixture("cycle"), &["check", "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["roots"], serde_json::json!(["intro"]));
    let kinds: Vec<&str> = report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["kind"].as_str())
        .collect();
    assert_eq!(kinds, ["cycle", "unmapped"]);

    let output = run(&fixture("basic"), &["check", "--format", "json"]);
    assert!(output.status.success(), "check failed: {}", stderr(&output));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report, serde_json::json!({ "findings": [], "roots": ["home"] }));
}

#[test]
fn render_leaves_cycle_and_unresolved_placeholders() {
    let output = run(&fixture("broken"), &["render", "page"]);
    assert!(output.status.success(), "render failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "a(b({{back}})) {{ghost}} {{gone}}\n");
}

#[test]
fn resolve_single_placeholder() {
    let output = run(&fixture("basic"), &["resolve", "hero", "name", "--preset", "casual"]);
    assert!(output.status.success(), "resolve failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "name-casual\tCasual name\n");

    let output = run(&fixture("basic"), &["resolve", "hero", "nope"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn scan_lists_spans_and_mappings() {
    let output = run(&fixture("basic"), &["scan", "home"]);
    assert!(output.status.success(), "scan failed: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "0..8  {{hero}}  -> hero\n\
         9..18  {{pitch}}  -> group:pitches:short\n"
    );
}

#[test]
fn scan_keeps_target_encoding() {
    let output = run(&fixture("cycle"), &["scan", "intro"]);
    assert!(output.status.success(), "scan failed: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "0..9  {{outro}}  -> outro\n\
         10..21  {{tagline}}  -> group:taglines:\n\
         22..31  {{ghost}}  unmapped\n"
    );
}

#[test]
fn allocate_avoids_existing_keys() {
    let output = run(&fixture("basic"), &["allocate", "My Cool Doc!"]);
    assert_eq!(stdout(&output), "my_cool_doc\n");

    let output = run(&fixture("basic"), &["allocate", "Hero", "--in", "home"]);
    assert_eq!(stdout(&output), "hero_1\n");
}

#[test]
fn complete_suggests_keys() {
    // Offset 13 sits inside `{{name}}` in "Welcome, {{name}}!".
    let output = run(&fixture("basic"), &["complete", "hero", "13"]);
    assert!(output.status.success(), "complete failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("existing  name  (Formal name)\n"), "{out}");
    assert!(out.contains("new       casual_name  -> name-casual (Casual name)\n"), "{out}");

    let output = run(&fixture("basic"), &["complete", "hero", "3"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn preset_list_shows_scope() {
    let output = run(&fixture("basic"), &["preset", "list"]);
    assert_eq!(stdout(&output), "casual  1 overrides\n");

    let output = run(&fixture("basic"), &["preset", "list", "casual"]);
    assert_eq!(stdout(&output), "hero.name = name-casual  (in hero)\n");
}

#[test]
fn preset_set_then_clear_round_trip() {
    let dir = scratch_copy("basic");

    let set = run(dir.path(), &["preset", "set", "launch", "home.pitch", "pitch-long"]);
    assert!(set.status.success(), "set failed: {}", stderr(&set));
    let render = run(dir.path(), &["render", "home", "--preset", "launch"]);
    assert_eq!(stdout(&render), "Welcome, valued customer!\nWe build things that last.\n");

    let written = std::fs::read_to_string(dir.path().join("fragments.toml")).unwrap();
    assert!(written.starts_with("# Launch site fragments."), "{written}");

    let clear = run(dir.path(), &["preset", "clear", "launch", "home.pitch"]);
    assert!(clear.status.success(), "clear failed: {}", stderr(&clear));
    let render = run(dir.path(), &["render", "home", "--preset", "launch"]);
    assert_eq!(stdout(&render), "Welcome, valued customer!\nBuilt to last.\n");

    let again = run(dir.path(), &["preset", "clear", "launch", "home.pitch"]);
    assert_eq!(again.status.code(), Some(3));
    assert!(stderr(&again).contains("Unknown Override"));
}

#[test]
fn preset_set_rejects_unknown_document() {
    let dir = scratch_copy("basic");
    let before = std::fs::read_to_string(dir.path().join("fragments.toml")).unwrap();
    let output = run(dir.path(), &["preset", "set", "launch", "hero", "ghost"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Unknown Document"));
    let after = std::fs::read_to_string(dir.path().join("fragments.toml")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn errors_render_as_markdown_with_exit_three() {
    let output = run(&fixture("basic"), &["walk", "home", "--preset", "nope"]);
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("# Error: Unknown Preset"), "{err}");
    assert!(err.contains("fragref preset list"), "{err}");

    let output = run(&fixture("basic"), &["--snapshot", "missing.toml", "walk", "home"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("# Error: Snapshot Not Found"));

    let output = run(&fixture("basic"), &["walk", "nowhere"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("# Error: Unknown Document"));
}

#[test]
fn json_snapshot_is_read_only() {
    let output = run(&fixture("broken"), &["preset", "set", "p", "a", "loop-b"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("# Error: Unsupported Format"));
}
