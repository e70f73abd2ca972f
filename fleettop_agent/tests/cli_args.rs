//! fleettop_agent binary: help, port flags and the served API.
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command};
use std::time::{Duration, Instant};

struct Agent(Child);

impl Drop for Agent {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn start(args: &[&str]) -> Agent {
    let child = Command::new(env!("CARGO_BIN_EXE_fleettop_agent"))
        .args(args)
        .env("FLEETTOP_AGENT_GPU", "0")
        .env("FLEETTOP_MACHINE_NAME", "test-host")
        .spawn()
        .expect("spawn agent");
    Agent(child)
}

// Minimal HTTP/1.1 GET; returns (status line, body)
fn get(port: u16, path: &str) -> (String, String) {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut stream = loop {
        match TcpStream::connect(("127.0.0.1", port)) {
            Ok(s) => break s,
            Err(_) if Instant::now() < deadline => std::thread::sleep(Duration::from_millis(50)),
            Err(e) => panic!("agent never came up: {e}"),
        }
    };
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n"
    )
    .unwrap();
    let mut resp = String::new();
    stream.read_to_string(&mut resp).unwrap();
    let status = resp.lines().next().unwrap_or_default().to_string();
    let body = resp
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

#[test]
fn test_help_mentions_port_flags() {
    let out = assert_cmd::Command::cargo_bin("fleettop_agent")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
    let text = String::from_utf8_lossy(&out.get_output().stdout).to_string();
    assert!(text.contains("--port") && text.contains("-p"), "{text}");
}

#[test]
fn test_serves_summary_on_long_port_flag() {
    let port = free_port();
    let _agent = start(&["--port", &port.to_string()]);
    let (status, body) = get(port, "/api/get_summary");
    assert!(status.contains("200"), "{status}");
    let v: serde_json::Value = serde_json::from_str(&body).expect("json body");
    let s = &v["servers"][0];
    assert_eq!(s["machine_name"], "test-host");
    assert_eq!(s["server_type"], "CPU");
    assert_eq!(s["network_status"], "online");
    assert!(s["top_processes"].as_array().unwrap().len() <= 5);
}

#[test]
fn test_history_endpoints_on_short_port_flag() {
    let port = free_port();
    let _agent = start(&["-p", &port.to_string()]);
    let (status, body) = get(port, "/api/get_event_data?server_name=test-host");
    assert!(status.contains("200"), "{status}");
    assert_eq!(body.trim(), "[]");

    let (status, _) = get(port, "/api/get_availability_data");
    assert!(status.contains("400"), "{status}");
}
