use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
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
    let exe = env!("CARGO_BIN_EXE_portald");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn portald");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
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
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

/// Stub serving one canned response for POST /api/contact, counting the
/// requests it sees.
fn spawn_contact_stub(status: u16, body: String) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub api");
    let addr = listener.local_addr().expect("stub addr");
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = Arc::clone(&hits);
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            hits_in.fetch_add(1, Ordering::SeqCst);
            let body = body.clone();
            std::thread::spawn(move || serve_one(stream, status, &body));
        }
    });
    (format!("http://{addr}/api"), hits)
}

fn serve_one(mut stream: TcpStream, status: u16, payload: &str) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() {
            return;
        }
        let line = line.trim_end().to_ascii_lowercase();
        if line.is_empty() {
            break;
        }
        if let Some(v) = line.strip_prefix("content-length:") {
            content_length = v.trim().parse().unwrap_or(0);
        }
    }
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        let _ = reader.read_exact(&mut body);
    }

    let reason = match status {
        200 => "OK",
        500 => "Internal Server Error",
        _ => "Error",
    };
    let _ = write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let _ = stream.flush();
}

fn select_profile(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    profile: &PathBuf,
    api_base: &str,
) {
    let selected = request(
        stdin,
        reader,
        "select",
        "profile.select",
        json!({ "path": profile.to_string_lossy(), "apiBase": api_base }),
    );
    assert_eq!(selected["ok"], json!(true));
}

#[test]
fn accepted_submission_resets_the_form() {
    let (base, hits) = spawn_contact_stub(200, json!({ "message": "queued" }).to_string());
    let profile = temp_dir("portald-contact-ok");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_profile(&mut stdin, &mut reader, &profile, &base);

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "contact.submit",
        json!({ "name": "A", "email": "a@b.com", "subject": "S", "message": "M" }),
    );
    assert_eq!(resp["ok"], json!(true));
    assert_eq!(resp["result"]["resetForm"], json!(true));
    assert!(resp["result"]["message"]
        .as_str()
        .expect("message")
        .contains("sent successfully"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(profile);
}

#[test]
fn server_error_surfaces_exact_message_and_keeps_form() {
    let (base, _hits) = spawn_contact_stub(500, json!({ "message": "Too many requests" }).to_string());
    let profile = temp_dir("portald-contact-err");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_profile(&mut stdin, &mut reader, &profile, &base);

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "contact.submit",
        json!({ "name": "A", "email": "a@b.com", "subject": "S", "message": "M" }),
    );
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("http_error"));
    assert_eq!(resp["error"]["message"], json!("Too many requests"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(profile);
}

#[test]
fn blank_field_issues_no_network_request() {
    let (base, hits) = spawn_contact_stub(200, json!({ "message": "queued" }).to_string());
    let profile = temp_dir("portald-contact-blank");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_profile(&mut stdin, &mut reader, &profile, &base);

    for (id, params) in [
        ("1", json!({ "email": "a@b.com", "subject": "S", "message": "M" })),
        ("2", json!({ "name": "A", "email": "", "subject": "S", "message": "M" })),
        ("3", json!({ "name": "A", "email": "a@b.com", "subject": " ", "message": "M" })),
        ("4", json!({ "name": "A", "email": "a@b.com", "subject": "S" })),
    ] {
        let resp = request(&mut stdin, &mut reader, id, "contact.submit", params);
        assert_eq!(resp["ok"], json!(false));
        assert_eq!(resp["error"]["code"], json!("validation"));
    }

    // Email without an @ is also stopped before the wire.
    let resp = request(
        &mut stdin,
        &mut reader,
        "5",
        "contact.submit",
        json!({ "name": "A", "email": "nope", "subject": "S", "message": "M" }),
    );
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["message"], json!("Please enter a valid email address."));

    assert_eq!(hits.load(Ordering::SeqCst), 0);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(profile);
}
