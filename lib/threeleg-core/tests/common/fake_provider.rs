use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use super::{CLIENT_ID, CLIENT_SECRET};

pub type TokenForm = HashMap<String, String>;

/// Token endpoint double.
///
/// - `authorization_code`: any code not starting with `bad` is accepted and
///   yields `AT-<code>` / `RT-<code>`
/// - `refresh_token`: `R1` yields `NEW` / `R2`, `R-no-rotation` yields `NEW`
///   without refresh token
#[derive(Debug)]
pub struct FakeProvider {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<TokenForm>>>,
    server: JoinHandle<()>,
}

impl FakeProvider {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind fake provider")?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));

        let router = Router::new()
            .route("/token", post(token))
            .with_state(Arc::clone(&requests));
        let server = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router).await {
                panic!("fake provider stopped: {error:?}");
            }
        });
        info!(%addr, "fake provider started");

        Ok(Self {
            addr,
            requests,
            server,
        })
    }

    pub fn authorization_uri(&self) -> String {
        format!("http://{}/authorize", self.addr)
    }

    pub fn token_uri(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn requests(&self) -> Vec<TokenForm> {
        self.requests.lock().expect("not poisoned").clone()
    }
}

impl Drop for FakeProvider {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn token(
    State(requests): State<Arc<Mutex<Vec<TokenForm>>>>,
    Form(form): Form<TokenForm>,
) -> (StatusCode, Json<Value>) {
    requests.lock().expect("not poisoned").push(form.clone());

    let field = |name: &str| form.get(name).map_or("", String::as_str);
    if field("client_id") != CLIENT_ID || field("client_secret") != CLIENT_SECRET {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_client" })),
        );
    }

    match (field("grant_type"), field("code"), field("refresh_token")) {
        ("authorization_code", code, _) if !code.is_empty() && !code.starts_with("bad") => (
            StatusCode::OK,
            Json(json!({
                "access_token": format!("AT-{code}"),
                "refresh_token": format!("RT-{code}"),
                "token_type": "Bearer",
                "expires_in": 3600
            })),
        ),
        ("refresh_token", _, "R1") => (
            StatusCode::OK,
            Json(json!({ "access_token": "NEW", "refresh_token": "R2" })),
        ),
        ("refresh_token", _, "R-no-rotation") => {
            (StatusCode::OK, Json(json!({ "access_token": "NEW" })))
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "unknown code or refresh token"
            })),
        ),
    }
}
