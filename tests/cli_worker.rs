//! The `sharecard worker` JSON-lines loop
#![cfg(feature = "http")]

use std::io::Write;
use std::process::{Command, Stdio};

#[test]
fn worker_answers_each_job_line_in_order() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_sharecard"))
        .arg("worker")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn worker");

    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, r#"{{"id":1,"payload":{{"type":"poster"}}}}"#).unwrap();
        writeln!(stdin).unwrap();
        writeln!(stdin, "not json").unwrap();
        writeln!(stdin, r#"{{"id":"b","payload":{{"profile":{{}}}}}}"#).unwrap();
    }

    let output = child.wait_with_output().expect("worker exit");
    assert!(output.status.success());

    let replies: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[0]["error"], "Unknown card type: poster");
    assert_eq!(replies[1]["id"], "b");
    assert!(replies[1]["error"].as_str().unwrap().starts_with("Invalid payload"));
}
