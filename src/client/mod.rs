pub mod config;
pub mod factory;
pub mod token;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use log::debug;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::types::token::{
    Credentials, IdentifierKind, IssuedTokens, SingleToken, TokenPair, TokenStrategy,
};

use config::ClientConfig;

/// Error types that can occur during authentication requests
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Server error: code {code}, {message}")]
    Server { code: u16, message: String },

    #[error("Server returned invalid json: {0:?}")]
    InvalidJson(String),
}

impl RequestError {
    /// The server rejected the presented credential.
    pub fn is_unauthorized(&self) -> bool {
        let unauthorized = StatusCode::UNAUTHORIZED.as_u16();
        matches!(self, RequestError::Server { code, .. } if *code == unauthorized)
    }
}

/// The authentication endpoints the token manager talks to.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<IssuedTokens, RequestError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RequestError>;

    async fn logout(&self, refresh_token: &str) -> Result<(), RequestError>;
}

/// REST client of the authentication service.
#[derive(Debug, Clone)]
pub struct AuthClient {
    url: String,
    client: reqwest::Client,

    strategy: TokenStrategy,
    identifier_kind: IdentifierKind,

    login_path: String,
    refresh_path: String,
    logout_path: String,
}

impl AuthClient {
    pub fn new(cfg: &ClientConfig) -> Self {
        Self {
            url: cfg.server.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            strategy: cfg.strategy,
            identifier_kind: cfg.identifier_kind(),
            login_path: cfg.login_path.clone(),
            refresh_path: cfg.refresh_path.clone(),
            logout_path: cfg.logout_path.clone(),
        }
    }

    async fn do_request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> Result<T, RequestError> {
        let data = self.do_request(path, query, body).await?;
        match serde_json::from_str(&data) {
            Ok(data) => Ok(data),
            Err(_) => Err(RequestError::InvalidJson(data)),
        }
    }

    /// Send a POST request and return the response body of a 2xx response. Any other status
    /// becomes [`RequestError::Server`] carrying the body as-is.
    async fn do_request(
        &self,
        path: &str,
        query: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> Result<String, RequestError> {
        let url = format!("{}/{}", self.url, path);
        let mut req = self.client.request(Method::POST, &url);

        if let Some(query) = query {
            req = req.query(&[query]);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        req = req.header("Accept", "application/json");

        let req = match req.build() {
            Ok(req) => req,
            Err(e) => return Err(RequestError::Client(format!("build request failed: {e:#}"))),
        };

        debug!("POST {}", req.url().path());
        let resp = self.client.execute(req).await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!("Response status {status}");

        if !status.is_success() {
            return Err(RequestError::Server {
                code: status.as_u16(),
                message: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn login(&self, credentials: &Credentials) -> Result<IssuedTokens, RequestError> {
        let body = credentials.login_body(self.identifier_kind);
        let tokens = match self.strategy {
            TokenStrategy::Single => {
                let token: SingleToken = self
                    .do_request_json(&self.login_path, None, Some(body))
                    .await?;
                IssuedTokens::Single(token)
            }
            TokenStrategy::Pair => {
                let pair: TokenPair = self
                    .do_request_json(&self.login_path, None, Some(body))
                    .await?;
                IssuedTokens::Pair(pair)
            }
        };
        Ok(tokens)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RequestError> {
        self.do_request_json(
            &self.refresh_path,
            Some(("refresh_token", refresh_token)),
            None,
        )
        .await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), RequestError> {
        self.do_request(
            &self.logout_path,
            Some(("refresh_token", refresh_token)),
            None,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use crate::config::CommonConfig;

    use super::*;

    /// Serve one canned HTTP response and hand back the raw request that was received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0; 8192];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            let resp = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(resp.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8(request).unwrap()
        });
        (format!("http://{addr}"), handle)
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

    fn test_client(server: String, strategy: TokenStrategy) -> AuthClient {
        let mut cfg = <ClientConfig as CommonConfig>::default();
        cfg.server = server;
        cfg.strategy = strategy;
        cfg.identifier_kind = Some(strategy.default_identifier_kind());
        AuthClient::new(&cfg)
    }

    #[tokio::test]
    async fn test_login_pair() {
        let (server, handle) = serve_once(
            "201 Created",
            r#"{"access_token":"a1","refresh_token":"r1"}"#,
        )
        .await;
        let client = test_client(server, TokenStrategy::Pair);

        let tokens = client
            .login(&Credentials::new("alice", "pw"))
            .await
            .unwrap();
        assert_eq!(
            tokens,
            IssuedTokens::Pair(TokenPair {
                access_token: String::from("a1"),
                refresh_token: String::from("r1"),
            })
        );

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /auth/login "));
        assert!(request.contains(r#""username":"alice""#));
        assert!(request.contains(r#""password":"pw""#));
    }

    #[tokio::test]
    async fn test_login_single() {
        let (server, handle) = serve_once("200 OK", r#"{"jwt-token":"jwt1"}"#).await;
        let client = test_client(server, TokenStrategy::Single);

        let tokens = client
            .login(&Credentials::new("a@b.c", "pw"))
            .await
            .unwrap();
        assert_eq!(tokens.into_bearer(), "jwt1");

        let request = handle.await.unwrap();
        assert!(request.contains(r#""email":"a@b.c""#));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let (server, _handle) =
            serve_once("400 Bad Request", r#"{"message":"bad credentials"}"#).await;
        let client = test_client(server, TokenStrategy::Pair);

        let err = client
            .login(&Credentials::new("alice", "wrong"))
            .await
            .unwrap_err();
        match err {
            RequestError::Server { code, message } => {
                assert_eq!(code, 400);
                assert_eq!(message, r#"{"message":"bad credentials"}"#);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refresh_query() {
        let (server, handle) = serve_once(
            "201 Created",
            r#"{"access_token":"a2","refresh_token":"r2"}"#,
        )
        .await;
        let client = test_client(server, TokenStrategy::Pair);

        let pair = client.refresh("r1").await.unwrap();
        assert_eq!(pair.access_token, "a2");
        assert_eq!(pair.refresh_token, "r2");

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /auth/refresh-token?refresh_token=r1 "));
    }

    #[tokio::test]
    async fn test_refresh_unauthorized() {
        let (server, _handle) = serve_once("401 Unauthorized", "").await;
        let client = test_client(server, TokenStrategy::Pair);

        let err = client.refresh("expired").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_refresh_invalid_body() {
        let (server, _handle) = serve_once("200 OK", "<html>oops</html>").await;
        let client = test_client(server, TokenStrategy::Pair);

        let err = client.refresh("r1").await.unwrap_err();
        assert!(matches!(err, RequestError::InvalidJson(_)));
        assert!(!err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_logout() {
        let (server, handle) = serve_once("200 OK", "").await;
        let client = test_client(server, TokenStrategy::Pair);

        client.logout("r9").await.unwrap();
        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /auth/logout?refresh_token=r9 "));
    }
}
