use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn desk_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_desk"))
}

/// Temp workspace with a config using the given vector backend and a
/// couple of documents under `files/`.
fn setup_test_env(vector_backend: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("runbook.md"),
        "Alpha systems are patched weekly. Use ticket ABC-123 for escalations.",
    )
    .unwrap();
    fs::write(
        files_dir.join("billing.txt"),
        "Invoices are issued on the first business day of each month.",
    )
    .unwrap();
    fs::write(
        files_dir.join("pages.json"),
        r#"[{"url": "https://wiki.example/alpha", "title": "Alpha FAQ", "text": "Alpha owners rotate monthly."}]"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[chunking]
chunk_tokens = 128
chunk_overlap = 16

[retrieval]
top_k = 4

[vector]
backend = "{}"
path = "{}/data/vectors.sqlite"

[graph]
backend = "memory"

[embedding]
provider = "stub"
dims = 64
"#,
        vector_backend,
        root.display()
    );

    let config_path = config_dir.join("desk.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_desk(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = desk_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("TOP_K")
        .env_remove("CHUNK_TOKENS")
        .env_remove("CHUNK_OVERLAP")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run desk binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, stdout))
}

#[test]
fn test_health_memory() {
    let (_tmp, config) = setup_test_env("memory");
    let (stdout, stderr, ok) = run_desk(&config, &["health"]);
    assert!(ok, "health failed: {}", stderr);

    let report = json(&stdout);
    assert_eq!(report["ok"], true);
    assert_eq!(report["vector"]["backend"], "memory");
    assert_eq!(report["graph"]["backend"], "memory");
    assert_eq!(report["embedder"], "hash-stub");
    assert_eq!(report["vectors"], 0);
}

#[test]
fn test_ask_with_preloaded_files() {
    let (tmp, config) = setup_test_env("memory");
    let runbook = tmp.path().join("files/runbook.md");
    let billing = tmp.path().join("files/billing.txt");

    let (stdout, stderr, ok) = run_desk(
        &config,
        &[
            "ask",
            "Where do Alpha escalations go?",
            "--ingest",
            runbook.to_str().unwrap(),
            "--ingest",
            billing.to_str().unwrap(),
        ],
    );
    assert!(ok, "ask failed: {}", stderr);

    let response = json(&stdout);
    assert_eq!(response["plan"]["mode"], "HYBRID");
    assert_eq!(response["plan"]["top_k"], 4);
    let citations = response["citations"].as_array().unwrap();
    assert_eq!(citations.len(), 1);
    assert_eq!(citations[0]["title"], "runbook.md");
}

#[test]
fn test_plan_top_k_override() {
    let (_tmp, config) = setup_test_env("memory");
    let (stdout, stderr, ok) = run_desk(&config, &["plan", "Explain Widget Alpha", "--top-k", "2"]);
    assert!(ok, "plan failed: {}", stderr);

    let plan = json(&stdout);
    assert_eq!(plan["mode"], "VECTOR");
    assert_eq!(plan["top_k"], 2);
    assert_eq!(plan["reasons"][0], "No relevant entities detected");
}

#[test]
fn test_sqlite_vectors_persist_across_runs() {
    let (tmp, config) = setup_test_env("sqlite");
    let runbook = tmp.path().join("files/runbook.md");

    let (stdout, stderr, ok) = run_desk(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Vector index ready"));
    assert!(tmp.path().join("data/vectors.sqlite").exists());

    let (stdout, stderr, ok) = run_desk(
        &config,
        &["ingest", runbook.to_str().unwrap(), "--title", "Ops Runbook"],
    );
    assert!(ok, "ingest failed: {}", stderr);
    let report = json(&stdout);
    assert_eq!(report["chunks"], 1);
    assert_eq!(report["vectors"], 1);

    // new process: vectors persisted, in-memory graph is empty
    let (stdout, stderr, ok) = run_desk(&config, &["ask", "Where do Alpha escalations go?"]);
    assert!(ok, "ask failed: {}", stderr);
    let response = json(&stdout);
    assert_eq!(response["plan"]["mode"], "VECTOR");
    let citations = response["citations"].as_array().unwrap();
    assert_eq!(citations.len(), 1);
    assert_eq!(citations[0]["title"], "Ops Runbook");

    let (stdout, _, ok) = run_desk(&config, &["health"]);
    assert!(ok);
    assert_eq!(json(&stdout)["vectors"], 1);
}

#[test]
fn test_ingest_pages_command() {
    let (tmp, config) = setup_test_env("memory");
    let pages = tmp.path().join("files/pages.json");

    let (stdout, stderr, ok) = run_desk(&config, &["ingest-pages", pages.to_str().unwrap()]);
    assert!(ok, "ingest-pages failed: {}", stderr);
    let report = json(&stdout);
    assert_eq!(report["pages"], 1);
    assert_eq!(report["skipped"], 0);
    assert_eq!(report["chunks"], 1);
}

#[test]
fn test_ingest_missing_file_fails() {
    let (tmp, config) = setup_test_env("memory");
    let missing = tmp.path().join("files/nope.md");
    let (_, stderr, ok) = run_desk(&config, &["ingest", missing.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("Failed to read"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_backend_is_rejected() {
    let (tmp, _) = setup_test_env("memory");
    let config = tmp.path().join("config/bad.toml");
    fs::write(&config, "[vector]\nbackend = \"redis\"\n").unwrap();

    let (_, stderr, ok) = run_desk(&config, &["health"]);
    assert!(!ok);
    assert!(stderr.contains("Unknown vector backend"), "stderr: {}", stderr);
}
