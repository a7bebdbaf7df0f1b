#![allow(dead_code)]

use std::path::Path;

use chatwatch::client::config::ClientConfig;
use chatwatch::config::CommonConfig;
use chatwatch::transport::TransportKind;
use chatwatch::types::token::TokenStrategy;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Answer the next HTTP requests on `listener` in order, one canned response per
/// connection. The handle yields the raw requests received.
pub fn serve_http(
    listener: TcpListener,
    responses: Vec<(&'static str, &'static str)>,
) -> JoinHandle<(TcpListener, Vec<String>)> {
    tokio::spawn(async move {
        let mut requests = Vec::with_capacity(responses.len());
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(read_http_request(&mut socket).await);
            let resp = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(resp.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
        (listener, requests)
    })
}

pub async fn read_http_request(socket: &mut TcpStream) -> String {
    let mut buf = vec![0; 8192];
    let mut request = Vec::new();
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        request.extend_from_slice(&buf[..n]);
        if n == 0 || request_complete(&request) {
            break;
        }
    }
    String::from_utf8(request).unwrap()
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(split) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..split]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    request.len() >= split + 4 + content_length
}

pub fn client_config(
    server: String,
    strategy: TokenStrategy,
    transport: TransportKind,
    token_path: &Path,
) -> ClientConfig {
    let mut cfg = <ClientConfig as CommonConfig>::default();
    cfg.server = server;
    cfg.strategy = strategy;
    cfg.identifier_kind = Some(strategy.default_identifier_kind());
    cfg.transport = transport;
    cfg.identifier = String::from("alice");
    cfg.password = String::from("pw");
    cfg.token_path = format!("{}", token_path.display());
    cfg.connect_timeout_secs = 5;
    cfg
}
