//! End-to-end tests: a real server on a loopback port, driven by raw
//! `TcpStream` clients the way a terminal user would drive it.

use std::net::SocketAddr;
use std::time::Duration;

use educ2::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

// =========================================================================
// Helpers
// =========================================================================

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const PROMPT: &str = "[EDU-C2]> ";

async fn start_server(tick: Duration) -> SocketAddr {
    let server = Educ2Server::builder()
        .bind("127.0.0.1:0")
        .sim_config(SimConfig {
            tick_interval: tick,
        })
        .build(StaticCredentialStore::default())
        .await
        .expect("server should bind");
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

struct Client {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let mut client = Self {
            stream: TcpStream::connect(addr).await.unwrap(),
            buf: Vec::new(),
        };
        client.expect("login: ").await;
        client
    }

    async fn login(addr: SocketAddr, username: &str, password: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.send(username).await;
        client.expect("password: ").await;
        client.send(password).await;
        client.expect(PROMPT).await;
        client
    }

    async fn send(&mut self, line: &str) {
        self.stream
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .unwrap();
    }

    /// Reads until `needle` has arrived and returns everything up to and
    /// including it. Later bytes stay buffered for the next call.
    async fn expect(&mut self, needle: &str) -> String {
        let needle = needle.as_bytes();
        loop {
            if let Some(pos) = self
                .buf
                .windows(needle.len())
                .position(|w| w == needle)
            {
                let rest = self.buf.split_off(pos + needle.len());
                let taken = std::mem::replace(&mut self.buf, rest);
                return String::from_utf8(taken).unwrap();
            }

            let mut chunk = [0u8; 4096];
            let n = timeout(READ_TIMEOUT, self.stream.read(&mut chunk))
                .await
                .unwrap_or_else(|_| {
                    panic!(
                        "timed out waiting for {:?}; got {:?}",
                        String::from_utf8_lossy(needle),
                        String::from_utf8_lossy(&self.buf)
                    )
                })
                .unwrap();
            assert!(n > 0, "connection closed before {:?}", String::from_utf8_lossy(needle));
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Reads until the server closes the connection.
    async fn read_to_close(mut self) -> String {
        let mut rest = Vec::new();
        timeout(READ_TIMEOUT, self.stream.read_to_end(&mut rest))
            .await
            .expect("server should close the connection")
            .unwrap();
        self.buf.extend_from_slice(&rest);
        String::from_utf8(self.buf).unwrap()
    }

    /// Runs a command and returns its reply, prompt included.
    async fn run(&mut self, line: &str) -> String {
        self.send(line).await;
        self.expect(PROMPT).await
    }
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_connect_shows_banner_then_login_prompt() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client {
        stream: TcpStream::connect(addr).await.unwrap(),
        buf: Vec::new(),
    };

    let greeting = client.expect("login: ").await;

    assert!(greeting.contains("EDUCATIONAL C2 SIMULATOR"));
    assert!(greeting.contains("No actual attacks are performed."));
    assert!(greeting.ends_with("\r\n\r\nlogin: "));
}

#[tokio::test]
async fn test_login_wrong_password_reprompts_login() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client::connect(addr).await;

    client.send("admin").await;
    client.expect("password: ").await;
    client.send("wrong").await;
    let reply = client.expect("login: ").await;
    assert!(reply.contains("Authentication failed"));

    client.send("user1").await;
    client.expect("password: ").await;
    client.send("pass1").await;
    let welcome = client.expect(PROMPT).await;
    assert!(welcome.contains("Welcome user1!"));
}

#[tokio::test]
async fn test_login_admin_then_myinfo_shows_role() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    let info = client.run("myinfo").await;

    assert!(info.contains("Username: admin"));
    assert!(info.contains("Role: admin"));
    assert!(info.contains("Session: 127.0.0.1"));
    assert!(info.contains("Authenticated: true"));
}

// =========================================================================
// Commands
// =========================================================================

#[tokio::test]
async fn test_unknown_command_reply() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    let reply = client.run("foobar").await;

    assert_eq!(reply, "Unknown command: foobar\r\n\r\n[EDU-C2]> ");
}

#[tokio::test]
async fn test_blank_line_gets_prompt_only() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    assert_eq!(client.run("").await, "\r\n[EDU-C2]> ");
}

#[tokio::test]
async fn test_commands_are_case_insensitive() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    assert!(client.run("HeLp").await.contains("Available Commands:"));
    assert!(client.run("METHODS").await.contains("Simulated Attack Methods:"));
}

#[tokio::test]
async fn test_stats_counts_live_sessions() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut first = Client::login(addr, "admin", "admin").await;
    let _second = Client::login(addr, "user1", "pass1").await;
    // Connected but never logged in still counts.
    let _third = Client::connect(addr).await;

    let stats = first.run("stats").await;

    assert!(stats.contains("Active Sessions: 3"), "{stats}");
    assert!(stats.contains("Total Users: 2"));
}

#[tokio::test]
async fn test_disconnect_removes_session_from_stats() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut observer = Client::login(addr, "admin", "admin").await;
    let leaver = Client::login(addr, "user1", "pass1").await;
    assert!(observer.run("stats").await.contains("Active Sessions: 2"));

    drop(leaver);

    // Removal happens on the server side after it notices the close.
    let mut removed = false;
    for _ in 0..100 {
        if observer.run("stats").await.contains("Active Sessions: 1") {
            removed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(removed);
}

#[tokio::test]
async fn test_exit_and_quit_close_without_prompt() {
    let addr = start_server(Duration::from_millis(10)).await;

    for word in ["exit", "quit"] {
        let mut client = Client::login(addr, "admin", "admin").await;
        client.send(word).await;

        let tail = client.read_to_close().await;

        assert_eq!(tail, "Goodbye!\r\n", "{word}");
    }
}

// =========================================================================
// attack
// =========================================================================

#[tokio::test]
async fn test_attack_runs_to_completion() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    client.send("attack udp 1.2.3.4 80 60").await;
    let out = client.expect("0 real packets were sent\r\n").await;

    assert!(out.contains("Starting udp attack on 1.2.3.4:80 for 60 seconds"));
    assert_eq!(count(&out, "Progress: "), 10);
    assert!(out.contains("Progress: 100% - Sending fake udp packets..."));
    assert!(out.contains("Attack completed (simulated)"));
    // The prompt follows the start block, ahead of the first progress line.
    let prompt = out.find(PROMPT).unwrap();
    assert!(out.find("Starting").unwrap() < prompt);
    assert!(prompt < out.find("Progress: 10%").unwrap());
}

#[tokio::test]
async fn test_attack_with_missing_args_shows_usage() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    let reply = client.run("attack udp 1.2.3.4").await;
    assert!(reply.starts_with("Usage: attack <method> <target> <port> <duration>\r\n"));

    // Nothing was started: a later command sees no progress output.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let reply = client.run("clear").await;
    assert!(!reply.contains("[SIMULATION]"));
}

#[tokio::test]
async fn test_second_attack_while_running_is_rejected() {
    let addr = start_server(Duration::from_millis(200)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    client.run("attack udp 1.2.3.4 80 60").await;
    let reply = client.run("attack tcp 5.6.7.8 443 10").await;

    assert!(reply.contains("An attack is already running"), "{reply}");
    assert!(!reply.contains("Starting tcp"));
}

#[tokio::test]
async fn test_sessions_run_attacks_independently() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut alice = Client::login(addr, "admin", "admin").await;
    let mut bob = Client::login(addr, "user1", "pass1").await;

    alice.send("attack udp 1.2.3.4 80 60").await;
    bob.send("attack http 5.6.7.8 8080 5").await;

    let a = alice.expect("0 real packets were sent\r\n").await;
    let b = bob.expect("0 real packets were sent\r\n").await;

    assert_eq!(count(&a, "fake udp packets"), 10);
    assert_eq!(count(&a, "fake http packets"), 0);
    assert_eq!(count(&b, "fake http packets"), 10);
    assert_eq!(count(&b, "fake udp packets"), 0);
}

#[tokio::test]
async fn test_exit_during_attack_stops_output() {
    let addr = start_server(Duration::from_millis(50)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    client.run("attack ldap 1.2.3.4 389 60").await;
    client.expect("Progress: 10%").await;
    client.send("exit").await;

    let tail = client.read_to_close().await;

    assert!(tail.ends_with("Goodbye!\r\n"), "{tail}");
    assert!(!tail.contains("Attack completed"));
}

#[tokio::test]
async fn test_attack_with_free_form_duration_starts() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    client.send("attack udp 1.2.3.4 80 soon").await;
    let out = client.expect("0 real packets were sent\r\n").await;

    assert!(out.contains("Starting udp attack on 1.2.3.4:80 for soon seconds"));
    assert!(!out.contains("Usage: attack"));
    assert_eq!(count(&out, "Progress: "), 10);
}

#[tokio::test]
async fn test_disconnect_during_attack_frees_session() {
    let addr = start_server(Duration::from_millis(50)).await;
    let mut observer = Client::login(addr, "user1", "pass1").await;
    let mut leaver = Client::login(addr, "admin", "admin").await;

    leaver.run("attack udp 1.2.3.4 80 60").await;
    leaver.expect("Progress: 10%").await;
    drop(leaver);

    let mut removed = false;
    for _ in 0..100 {
        if observer.run("stats").await.contains("Active Sessions: 1") {
            removed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(removed);
}

#[tokio::test]
async fn test_overlong_line_closes_connection() {
    let addr = start_server(Duration::from_millis(10)).await;
    let mut client = Client::login(addr, "admin", "admin").await;

    let flood = "a".repeat(educ2_transport::MAX_LINE_LENGTH + 1);
    client
        .stream
        .write_all(flood.as_bytes())
        .await
        .unwrap();

    let tail = client.read_to_close().await;
    assert!(!tail.contains("Unknown command"));
}
