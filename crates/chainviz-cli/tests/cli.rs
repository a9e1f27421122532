use assert_cmd::Command;
use predicates::prelude::*;

const GENESIS_HASH: &str = "988c37d9df7b23e7462ca89ec726f16480efc0f7d7d42e17c0a4adc3b334b96b";

fn chainviz() -> Command {
    Command::cargo_bin("chainviz").expect("binary builds")
}

#[test]
fn genesis_prints_fixed_block() {
    chainviz()
        .arg("genesis")
        .assert()
        .success()
        .stdout(predicate::str::contains(GENESIS_HASH))
        .stdout(predicate::str::contains(r#""data":"Genesis Block""#));
}

#[test]
fn hash_matches_genesis_fields() {
    chainviz()
        .args(["hash", "--data", "Genesis Block"])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{GENESIS_HASH}\n")));
}

#[test]
fn mined_chain_validates() {
    let out = chainviz()
        .args(["mine", "--difficulty", "1", "--data", "Alice pays Bob 10", "--auto", "2"])
        .output()
        .expect("run mine");
    assert!(out.status.success());

    let value: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(value["chain"]["blocks"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["reports"].as_array().map(Vec::len), Some(3));

    let chain = serde_json::to_string(&value["chain"]).expect("json");
    chainviz()
        .arg("validate")
        .write_stdin(chain)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""valid":true"#));
}

#[test]
fn validate_accepts_bare_block_array() {
    chainviz()
        .arg("validate")
        .write_stdin("[]")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""length":0"#));
}

#[test]
fn tamper_reports_hash_mismatch() {
    chainviz()
        .args(["tamper", "--index", "2", "--data", "forged"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""valid":false"#))
        .stdout(predicate::str::contains(r#"{"index":2,"issues":["HASH_MISMATCH"]}"#));
}

#[test]
fn tamper_requires_a_field() {
    chainviz()
        .args(["tamper", "--index", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to overwrite"));
}

#[test]
fn auto_mine_count_is_bounded() {
    chainviz()
        .args(["mine", "--difficulty", "1", "--auto", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("auto-mine count 11 is out of range"));
}

#[test]
fn difficulty_above_digest_width_is_rejected() {
    chainviz()
        .args(["mine", "--difficulty", "65"])
        .assert()
        .failure();
}
