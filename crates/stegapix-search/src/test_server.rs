// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-shot HTTP/1.1 server on loopback for client tests.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use reqwest::blocking::Client;

/// Answers a single request with a fixed response and hands back the
/// request head it received.
pub struct CannedServer {
    pub url: String,
    head: mpsc::Receiver<String>,
    handle: Option<JoinHandle<()>>,
}

impl CannedServer {
    /// `status` is the status line tail, e.g. `"200 OK"`.
    pub fn start(status: &str, content_type: &str, body: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let (tx, head) = mpsc::channel();
        let response_head = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).expect("read request");
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&received).into_owned());
            stream.write_all(response_head.as_bytes()).expect("write head");
            stream.write_all(&body).expect("write body");
        });

        Self {
            url: format!("http://{addr}"),
            head,
            handle: Some(handle),
        }
    }

    /// The request head the server saw.
    pub fn request_head(mut self) -> String {
        let head = self
            .head
            .recv_timeout(Duration::from_secs(5))
            .expect("request received");
        if let Some(handle) = self.handle.take() {
            handle.join().expect("server thread");
        }
        head
    }
}

/// A client that talks to loopback directly, whatever proxy variables say.
pub fn direct_client() -> Client {
    Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client")
}
