use std::fs;
use std::process::Command;

use tempfile::TempDir;

const INPUT: &str = "gene\ts1\ts2\ts3\n\
g0\t0.0\t1.0\t0.1\n\
g1\t9.0\t-4.0\t9.5\n\
g2\t0.1\t1.1\t0.0\n\
g3\t8.5\t-4.2\t9.0\n";

fn run(dir: &TempDir, extra: &[&str]) -> std::process::Output {
    let input = dir.path().join("in.tsv");
    fs::write(&input, INPUT).unwrap();
    Command::new(env!("CARGO_BIN_EXE_dendrolook"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.tsv"))
        .arg("-v")
        .arg("0")
        .args(extra)
        .output()
        .expect("Failed to run dendrolook")
}

#[test]
fn writes_reordered_matrix_with_similar_rows_together() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &[]);
    assert!(output.status.success(), "{:?}", output);

    let text = fs::read_to_string(dir.path().join("out.tsv")).unwrap();
    let names: Vec<&str> = text
        .lines()
        .skip(1)
        .map(|l| l.split('\t').next().unwrap())
        .collect();
    assert_eq!(names.len(), 4);
    let pos = |n: &str| names.iter().position(|&x| x == n).unwrap();
    assert_eq!(pos("g0").abs_diff(pos("g2")), 1);
    assert_eq!(pos("g1").abs_diff(pos("g3")), 1);
    assert!(text.starts_with("name\t"));
}

#[test]
fn writes_json_plot_and_cluster_table() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("result.json");
    let plot = dir.path().join("plot.svg");
    let output = run(
        &dir,
        &[
            "-l",
            "complete",
            "-c",
            "2.0",
            "-j",
            json.to_str().unwrap(),
            "-p",
            plot.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{:?}", output);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(report["config"]["linkage"], "complete");
    assert_eq!(report["rows"]["order"].as_array().unwrap().len(), 4);
    assert_eq!(report["rows"]["merges"].as_array().unwrap().len(), 3);
    assert_eq!(report["columns"]["names"][0], "s1");

    assert!(fs::read_to_string(&plot).unwrap().contains("<line"));

    let clusters = fs::read_to_string(dir.path().join("out.clusters.tsv")).unwrap();
    let labels: Vec<&str> = clusters
        .lines()
        .skip(1)
        .map(|l| l.split('\t').nth(1).unwrap())
        .collect();
    assert_eq!(labels.len(), 4);
    let mut distinct = labels.clone();
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct, vec!["0", "1"]);
}

#[test]
fn rows_only_keeps_column_order() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["-R", "-d", "correlation"]);
    assert!(output.status.success(), "{:?}", output);
    let text = fs::read_to_string(dir.path().join("out.tsv")).unwrap();
    assert!(text.starts_with("name\ts1\ts2\ts3\n"));
}

#[test]
fn bad_input_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.tsv");
    fs::write(&input, "x\ta\tb\nr0\t1\tnope\n").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_dendrolook"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.tsv"))
        .output()
        .expect("Failed to run dendrolook");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(!dir.path().join("out.tsv").exists());
}
