use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use uuid::Uuid;

struct Server {
    child: Child,
    url: String,
    root: PathBuf,
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral port should bind");
    listener
        .local_addr()
        .expect("listener should have an address")
        .port()
}

fn roster(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_roster"));
    cmd.current_dir(root)
        .env_remove("ROSTER_CONFIG")
        .env_remove("ROSTER_SERVER_URL")
        .env_remove("ROSTER_BIND")
        .env_remove("ROSTER_POLL_INTERVAL_MS")
        .env_remove("RUST_LOG");
    cmd
}

fn start_server() -> Server {
    let root = unique_workspace("roster-http");
    let port = free_port();
    let child = roster(&root)
        .env("DB_PATH", root.join("db/roster.sqlite"))
        .args(["serve", "--bind", &format!("127.0.0.1:{port}")])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("server should start");
    let server = Server {
        child,
        url: format!("http://127.0.0.1:{port}"),
        root,
    };

    let deadline = Instant::now() + Duration::from_secs(15);
    while Instant::now() < deadline {
        if ureq::get(&format!("{}/persons", server.url)).call().is_ok() {
            return server;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    panic!("server did not come up at {}", server.url);
}

fn list(server: &Server) -> Vec<Value> {
    let body = ureq::get(&format!("{}/persons", server.url))
        .call()
        .expect("list should succeed")
        .into_string()
        .expect("body should be text");
    serde_json::from_str(&body).expect("list should be a json array")
}

fn send(method: &str, url: &str, body: Option<Value>) -> (u16, Value) {
    let request = ureq::request(method, url);
    let result = match body {
        Some(body) => request
            .set("Content-Type", "application/json")
            .send_string(&body.to_string()),
        None => request.call(),
    };
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(err) => panic!("transport failure: {err}"),
    };
    let status = response.status();
    let mut text = String::new();
    response
        .into_reader()
        .read_to_string(&mut text)
        .expect("body should be readable");
    let value = serde_json::from_str(&text).expect("body should be json");
    (status, value)
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn crud_endpoints_follow_status_contract() {
    let server = start_server();
    let persons_url = format!("{}/persons", server.url);

    let seeded = list(&server);
    assert_eq!(seeded.len(), 3);
    assert_eq!(seeded[0]["name"], "Bjarne Bogen");

    let (status, body) = send(
        "POST",
        &persons_url,
        Some(json!({"name": "B", "age": 30, "residence": "Y"})),
    );
    assert_eq!(status, 201);
    assert_eq!(body, json!({"status": "OK", "message": "created"}));

    let after_create = list(&server);
    assert_eq!(after_create.len(), 4);
    let created = &after_create[3];
    assert!(created["id"].is_i64());
    assert_eq!(created["residence"], "Y");

    let id = created["id"].as_i64().expect("id should be numeric");
    let (status, body) = send(
        "PUT",
        &persons_url,
        Some(json!({"id": id, "name": "B", "age": 31, "residence": "Y"})),
    );
    assert_eq!(status, 200);
    assert_eq!(body["message"], "updated");

    let (status, body) = send(
        "PUT",
        &persons_url,
        Some(json!({"id": 999_999, "name": "ghost", "age": null, "residence": null})),
    );
    assert_eq!(status, 404);
    assert_eq!(body["status"], "NotFound");

    let (status, body) = send("POST", &persons_url, Some(json!({"age": "thirty"})));
    assert_eq!(status, 400);
    assert_eq!(body["status"], "InvalidPayload");

    let (status, _) = send("DELETE", &format!("{persons_url}/{id}"), None);
    assert_eq!(status, 200);
    let (status, body) = send("DELETE", &format!("{persons_url}/{id}"), None);
    assert_eq!(status, 404);
    assert!(body["message"].as_str().is_some());

    assert_eq!(list(&server), seeded);
}

#[test]
fn ls_prints_rows_as_json() {
    let server = start_server();
    let output = roster(&server.root)
        .args(["ls", "--json", "--server-url", &server.url])
        .output()
        .expect("ls should run");
    assert_success(&output);
    let rows: Vec<Value> =
        serde_json::from_slice(&output.stdout).expect("ls --json should print json");
    assert_eq!(rows.len(), 3);
}

#[test]
fn ls_against_missing_server_fails_cleanly() {
    let root = unique_workspace("roster-ls-down");
    let output = roster(&root)
        .args([
            "ls",
            "--server-url",
            &format!("http://127.0.0.1:{}", free_port()),
        ])
        .output()
        .expect("ls should run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn dashboard_session_saves_edits_through_the_api() {
    let server = start_server();
    let mut child = roster(&server.root)
        .args(["dash", "--server-url", &server.url])
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("dash should start");

    {
        let mut stdin = child.stdin.take().expect("stdin should be piped");
        stdin
            .write_all(
                b"set 1 age 49\nrm 3\nadd\nset 3 name Nora Nes\nset 3 age 33\nsave\nquit\n",
            )
            .expect("commands should be writable");
    }
    let output = child.wait_with_output().expect("dash should exit");
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("data loaded"), "stdout:\n{stdout}");
    assert!(stdout.contains("changes saved"), "stdout:\n{stdout}");

    let rows = list(&server);
    let names = rows
        .iter()
        .map(|row| row["name"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Bjarne Bogen", "Ella Evensen", "Nora Nes"]);
    assert_eq!(rows[0]["age"], 49);
    assert_eq!(rows[2]["age"], 33);
    assert_eq!(rows[2]["residence"], Value::Null);
}

#[test]
fn overlapping_requests_are_all_served() {
    let server = start_server();
    let persons_url = format!("{}/persons", server.url);

    let clients = (0..8)
        .map(|client| {
            let persons_url = persons_url.clone();
            std::thread::spawn(move || {
                (0..25)
                    .map(|round| {
                        if (client + round) % 2 == 0 {
                            send("GET", &persons_url, None).0
                        } else {
                            let body = json!({
                                "name": format!("c{client}-{round}"),
                                "age": round,
                                "residence": null,
                            });
                            send("POST", &persons_url, Some(body)).0
                        }
                    })
                    .collect::<Vec<u16>>()
            })
        })
        .collect::<Vec<_>>();

    let statuses = clients
        .into_iter()
        .flat_map(|client| client.join().expect("client thread should not panic"))
        .collect::<Vec<_>>();
    let failed = statuses
        .iter()
        .filter(|status| !(200..300).contains(*status))
        .collect::<Vec<_>>();
    assert!(failed.is_empty(), "non-success statuses: {failed:?}");

    let creates = (0..8)
        .flat_map(|client| (0..25).map(move |round| (client + round) % 2))
        .filter(|parity| *parity == 1)
        .count();
    assert_eq!(list(&server).len(), 3 + creates);
}
