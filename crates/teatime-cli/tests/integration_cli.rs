use anyhow::Result;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const CORPUS: &str = "\
date,rank,topic
2024-01-01,1,Budget
2024-04-08,1,Eclipse
2024-04-09,1,Eclipse
2024-04-09,2,#EclipseDay
";

fn teatime(data_dir: &Path, args: &[&str]) -> Result<Output> {
    let out = Command::new(env!("CARGO_BIN_EXE_teatime"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env("TEATIME_LOG", "warn")
        .output()?;
    Ok(out)
}

fn data_dir() -> Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("trends_min_us.csv"), CORPUS)?;
    Ok(dir)
}

/// Integration test: keyword search through the binary with JSON output.
///
/// No snapshot exists, so results come from the keyword path and carry the
/// clamped window and per-topic timelines.
#[test]
fn search_json_without_snapshot() -> Result<()> {
    let dir = data_dir()?;
    let out = teatime(
        dir.path(),
        &["search", "eclipse", "-k", "5", "--start", "2024-04-09T08:00:00Z", "--json"],
    )?;
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let v: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(v["mode"], "lexical");
    assert_eq!(v["window"]["start"], "2024-04-09");
    assert_eq!(v["window"]["end"], "2024-04-09");
    let topics: Vec<&str> = v["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["topic"].as_str().unwrap())
        .collect();
    assert_eq!(topics, vec!["#EclipseDay", "Eclipse"]);
    assert_eq!(v["ingredients"][1]["days_seen"], 2);
    Ok(())
}

/// Integration test: index -> info -> dense search via an embedding file.
#[test]
fn index_then_dense_search() -> Result<()> {
    let dir = data_dir()?;
    let out = teatime(dir.path(), &["index", "--dim", "16"])?;
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.path().join("topic_embeddings.npy").exists());
    assert!(dir.path().join("topic_index.json").exists());

    let out = teatime(dir.path(), &["info", "--json"])?;
    let info: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(info["has_embeddings"], true);
    assert_eq!(info["embedding_count"], 3);
    assert_eq!(info["topics"], 3);

    let query = dir.path().join("query.json");
    fs::write(&query, serde_json::to_string(&vec![0.25_f32; 16])?)?;
    let out = teatime(
        dir.path(),
        &["search", "no keyword hits here", "--embedding", query.to_str().unwrap(), "--json"],
    )?;
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(v["mode"], "dense");
    assert_eq!(v["ingredients"].as_array().unwrap().len(), 3);
    Ok(())
}

#[test]
fn timeline_of_unknown_topic_is_empty() -> Result<()> {
    let dir = data_dir()?;
    let out = teatime(dir.path(), &["timeline", "Nobody", "--json"])?;
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(v["days_seen"], 0);
    assert!(v["first_seen"].is_null());
    Ok(())
}

#[test]
fn bad_date_and_missing_corpus_fail() -> Result<()> {
    let dir = data_dir()?;
    let out = teatime(dir.path(), &["search", "eclipse", "--end", "yesterday"])?;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("--end"));

    let empty = tempfile::tempdir()?;
    let out = teatime(empty.path(), &["info"])?;
    assert!(!out.status.success());
    Ok(())
}
