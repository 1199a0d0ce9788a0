//! Tiny local HTTP peers for exercising the real clients.

use std::net::SocketAddr;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};
use url::Url;

pub(crate) fn json_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}

fn base_url(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{}/", addr)).expect("local address is a valid URL")
}

/// Answers a single request with `response` and yields the request head
/// (request line and headers) it received.
pub(crate) async fn one_shot(response: String) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = base_url(listener.local_addr().expect("local addr"));

    let task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");

        let mut received = Vec::new();
        let mut buf = [0; 1024];
        let head_end = loop {
            if let Some(i) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                break i;
            }
            let n = stream.read(&mut buf).await.expect("read");
            assert!(n > 0, "connection closed before the request head ended");
            received.extend_from_slice(&buf[..n]);
        };
        let head = String::from_utf8_lossy(&received[..head_end]).into_owned();

        // Drain the body so closing the socket does not reset the reply
        let body_len = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let mut remaining = (head_end + 4 + body_len).saturating_sub(received.len());
        while remaining > 0 {
            let n = stream.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            remaining = remaining.saturating_sub(n);
        }

        stream
            .write_all(response.as_bytes())
            .await
            .expect("write");
        stream.shutdown().await.ok();

        head
    });

    (url, task)
}

/// Accepts connections and never answers.
pub(crate) async fn silent() -> (Url, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = base_url(listener.local_addr().expect("local addr"));

    let task = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    (url, task)
}

/// An address nothing listens on.
pub(crate) async fn closed() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = base_url(listener.local_addr().expect("local addr"));
    drop(listener);
    url
}
