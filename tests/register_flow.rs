use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
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

type Routes = Vec<(&'static str, &'static str, u16, String)>;

fn spawn_stub_api(routes: Routes) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub api");
    let addr = listener.local_addr().expect("stub addr");
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let routes = routes.clone();
            std::thread::spawn(move || serve_one(stream, &routes));
        }
    });
    format!("http://{addr}/api")
}

fn serve_one(mut stream: TcpStream, routes: &Routes) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("").to_string();
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

    let path = target.split('?').next().unwrap_or("").to_string();
    let (status, payload) = routes
        .iter()
        .find(|(m, p, _, _)| *m == method && *p == path)
        .map(|(_, _, s, b)| (*s, b.clone()))
        .unwrap_or((404, String::from("{\"message\":\"not found\"}")));
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
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

fn registration_params() -> serde_json::Value {
    json!({
        "studentId": "S-2001",
        "firstName": "Ada",
        "lastName": "Obi",
        "email": "ada@school.edu",
        "age": "19",
        "phone": "0800-000",
        "password": "Str0ng!pass",
        "confirmPassword": "Str0ng!pass",
        "privacyAccepted": true
    })
}

#[test]
fn successful_registration_prefills_login_once() {
    let base = spawn_stub_api(vec![(
        "POST",
        "/api/students/register",
        200,
        json!({ "message": "created" }).to_string(),
    )]);
    let profile = temp_dir("portald-register-ok");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_profile(&mut stdin, &mut reader, &profile, &base);

    let registered = request(
        &mut stdin,
        &mut reader,
        "1",
        "register.student",
        registration_params(),
    );
    assert_eq!(registered["ok"], json!(true));
    assert_eq!(registered["result"]["redirect"]["url"], json!("login.html"));

    // The login page consumes the marker exactly once.
    let prefill = request(&mut stdin, &mut reader, "2", "register.prefill", json!({}));
    assert_eq!(prefill["result"]["email"], json!("ada@school.edu"));
    let prefill = request(&mut stdin, &mut reader, "3", "register.prefill", json!({}));
    assert_eq!(prefill["result"]["email"], json!(null));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(profile);
}

#[test]
fn rejected_registration_surfaces_server_message() {
    let base = spawn_stub_api(vec![(
        "POST",
        "/api/students/register",
        400,
        json!({ "message": "Student ID already registered" }).to_string(),
    )]);
    let profile = temp_dir("portald-register-dup");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_profile(&mut stdin, &mut reader, &profile, &base);

    let registered = request(
        &mut stdin,
        &mut reader,
        "1",
        "register.student",
        registration_params(),
    );
    assert_eq!(registered["ok"], json!(false));
    assert_eq!(registered["error"]["code"], json!("http_error"));
    assert_eq!(
        registered["error"]["message"],
        json!("Student ID already registered")
    );
    // No prefill marker was left behind.
    let prefill = request(&mut stdin, &mut reader, "2", "register.prefill", json!({}));
    assert_eq!(prefill["result"]["email"], json!(null));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(profile);
}

#[test]
fn validation_gates_run_before_any_request() {
    // No stub at all: a request would fail loudly as a network error.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    let base = format!("http://{addr}/api");

    let profile = temp_dir("portald-register-gates");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_profile(&mut stdin, &mut reader, &profile, &base);

    let mut weak = registration_params();
    weak["password"] = json!("weakpass");
    weak["confirmPassword"] = json!("weakpass");
    let resp = request(&mut stdin, &mut reader, "1", "register.student", weak);
    assert_eq!(resp["error"]["code"], json!("validation"));
    assert_eq!(
        resp["error"]["message"],
        json!("Please create a stronger password that meets all requirements.")
    );

    let mut mismatch = registration_params();
    mismatch["confirmPassword"] = json!("Str0ng!pass2");
    let resp = request(&mut stdin, &mut reader, "2", "register.student", mismatch);
    assert_eq!(
        resp["error"]["message"],
        json!("Passwords do not match. Please try again.")
    );

    let mut unchecked = registration_params();
    unchecked["privacyAccepted"] = json!(false);
    let resp = request(&mut stdin, &mut reader, "3", "register.student", unchecked);
    assert_eq!(
        resp["error"]["message"],
        json!("You must accept the privacy policy to register.")
    );

    let mut bad_age = registration_params();
    bad_age["age"] = json!("400");
    let resp = request(&mut stdin, &mut reader, "4", "register.student", bad_age);
    assert_eq!(resp["error"]["message"], json!("Please enter a valid age"));

    let mut no_id = registration_params();
    no_id["studentId"] = json!("   ");
    let resp = request(&mut stdin, &mut reader, "5", "register.student", no_id);
    assert_eq!(
        resp["error"]["message"],
        json!("Student ID is required to register.")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(profile);
}

#[test]
fn recovery_flow_round_trip() {
    let base = spawn_stub_api(vec![
        (
            "POST",
            "/api/students/forget-password",
            200,
            json!({ "message": "sent" }).to_string(),
        ),
        (
            "POST",
            "/api/students/verify-otp",
            200,
            json!({ "studentId": "stu-77" }).to_string(),
        ),
        (
            "PUT",
            "/api/students/reset-password/stu-77",
            200,
            json!({ "message": "reset" }).to_string(),
        ),
    ]);
    let profile = temp_dir("portald-recovery");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_profile(&mut stdin, &mut reader, &profile, &base);

    let sent = request(
        &mut stdin,
        &mut reader,
        "1",
        "register.requestOtp",
        json!({ "email": "ada@school.edu" }),
    );
    assert_eq!(sent["ok"], json!(true));
    assert!(sent["result"]["message"]
        .as_str()
        .expect("message")
        .contains("OTP sent"));

    let verified = request(
        &mut stdin,
        &mut reader,
        "2",
        "register.verifyOtp",
        json!({ "otp": "123456" }),
    );
    assert_eq!(verified["ok"], json!(true));

    let reset = request(
        &mut stdin,
        &mut reader,
        "3",
        "register.resetPassword",
        json!({ "password": "NewPass1!", "confirmPassword": "NewPass1!" }),
    );
    assert_eq!(reset["ok"], json!(true));
    assert_eq!(reset["result"]["redirect"]["url"], json!("login.html"));

    // The reset id was consumed: a second attempt is rejected up front.
    let again = request(
        &mut stdin,
        &mut reader,
        "4",
        "register.resetPassword",
        json!({ "password": "NewPass1!", "confirmPassword": "NewPass1!" }),
    );
    assert_eq!(again["ok"], json!(false));
    assert_eq!(
        again["error"]["message"],
        json!("Password reset session expired. Please start over.")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(profile);
}
