//! Exposes an in-process mock of the hashstore service for use in integration tests.
//!
//! ```
//! use axum::http::StatusCode;
//! use hashstore_test::server::MockServer;
//!
//! #[tokio::main]
//! async fn main() {
//!    let server = MockServer::new(|path| match path {
//!        "/meta/index.parquet" => StatusCode::NOT_FOUND,
//!        _ => StatusCode::OK,
//!    })
//!    .await;
//!    let host = server.host();
//!    // point the load test at `host`...
//! }
//! ```

use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};

type Responder = dyn Fn(&str) -> StatusCode + Send + Sync;

#[derive(Clone)]
struct MockState {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<String>>>,
}

async fn respond(State(state): State<MockState>, uri: Uri) -> StatusCode {
    let path = uri.path().to_owned();
    let status = (state.responder)(&path);
    state.requests.lock().unwrap().push(path);
    status
}

/// An in-process HTTP server answering every `GET` with a scripted status code and an empty body.
///
/// It listens on a random available port on localhost and records the path of every request it
/// receives, exactly as sent by the client.
#[derive(Debug)]
pub struct MockServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    /// Starts a server answering each request with the status `responder` returns for its path.
    pub async fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> StatusCode + Send + Sync + 'static,
    {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            responder: Arc::new(responder),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().fallback(respond).with_state(state);

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            handle,
            socket,
            requests,
        }
    }

    /// Starts a server answering every request with `status`.
    pub async fn with_status(status: StatusCode) -> Self {
        Self::new(move |_| status).await
    }

    /// Returns the base URL of this server.
    ///
    /// This URL uses `localhost` as hostname.
    pub fn host(&self) -> String {
        format!("http://localhost:{}", self.socket.port())
    }

    /// The paths of all requests received so far, in order of arrival.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
