use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_feesd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn feesd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn records_of(result: &serde_json::Value) -> Vec<serde_json::Value> {
    result
        .get("records")
        .and_then(|v| v.as_array())
        .cloned()
        .expect("records array")
}

#[test]
fn submit_creates_then_appends_by_roll_number() {
    let workspace = temp_dir("feesd-submit");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "fees.submit",
        json!({
            "form": {
                "rollNumber": "R1",
                "name": "Asha",
                "amount": "400",
                "totalFee": "1000",
                "date": "2024-06-01",
                "status": "Paid"
            }
        }),
    );
    assert_eq!(first["outcome"], json!("created"));
    assert_eq!(first["paymentCount"], json!(1));
    let rows = first["table"]["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["paid"], json!("₹ 400.00"));
    assert_eq!(rows[0]["balance"], json!("₹ 600.00"));
    assert_eq!(rows[0]["balanceTone"], json!("warning"));

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "fees.submit",
        json!({
            "form": {
                "rollNumber": "R1",
                "name": "Asha",
                "amount": "300",
                "totalFee": "",
                "date": "2024-07-01",
                "status": "Pending"
            }
        }),
    );
    assert_eq!(second["outcome"], json!("appended"));
    assert_eq!(second["recordId"], first["recordId"]);
    assert_eq!(second["paymentCount"], json!(2));
    assert_ne!(second["paymentId"], first["paymentId"]);

    let listed = request_ok(&mut stdin, &mut reader, "4", "fees.list", json!({}));
    let records = records_of(&listed);
    assert_eq!(records.len(), 1);
    let asha = &records[0];
    assert_eq!(asha["amount"], json!(700.0));
    assert_eq!(asha["totalFee"], json!(1000.0));
    assert_eq!(asha["date"], json!("2024-07-01"));
    assert_eq!(asha["status"], json!("Pending"));
    assert_eq!(asha["payments"].as_array().map(|p| p.len()), Some(2));

    // A blank roll number never merges, even for an existing name.
    let third = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "fees.submit",
        json!({
            "form": {
                "rollNumber": "  ",
                "name": "Asha",
                "amount": 50,
                "date": "2024-07-02",
                "status": "Paid"
            },
            "filter": { "name": "", "status": "Paid" }
        }),
    );
    assert_eq!(third["outcome"], json!("created"));
    // The returned table honours the passed-in filter.
    let rows = third["table"]["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["rollNumber"], json!("-"));
    assert_eq!(rows[0]["seq"], json!(1));

    let listed = request_ok(&mut stdin, &mut reader, "6", "fees.list", json!({}));
    assert_eq!(records_of(&listed).len(), 2);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn non_numeric_amounts_never_block_submission() {
    let workspace = temp_dir("feesd-submit-coerce");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "fees.submit",
        json!({
            "form": {
                "rollNumber": "R9",
                "name": "",
                "amount": "lots",
                "totalFee": "unknown",
                "date": "",
                "status": "Pending"
            }
        }),
    );
    assert_eq!(res["outcome"], json!("created"));
    let row = &res["table"]["rows"][0];
    assert_eq!(row["paid"], json!("₹ 0.00"));
    assert_eq!(row["totalFee"], json!("-"));
    assert_eq!(row["date"], json!("-"));
    // Pending with no total fee owes the paid amount, here zero.
    assert_eq!(row["balance"], json!("₹ 0.00"));
    assert_eq!(row["balanceTone"], json!("success"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn records_survive_a_restart() {
    let workspace = temp_dir("feesd-submit-restart");

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "fees.submit",
            json!({
                "form": {
                    "rollNumber": "R5",
                    "name": "Farah",
                    "amount": "150",
                    "totalFee": "600",
                    "date": "2024-09-01",
                    "status": "Paid"
                }
            }),
        );
        drop(stdin);
        let _ = child.wait();
    }

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "2", "fees.list", json!({}));
    let records = records_of(&listed);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["rollNumber"], json!("R5"));
    assert_eq!(records[0]["totalFee"], json!(600.0));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
