//! ============================================================================
//! Auth Server - Local HTTP surface for the OAuth redirect dance
//! ============================================================================
//! Routes:
//!   GET /          302 to the provider authorization URL
//!   GET /callback  200 credential bundle JSON | 400 | 403
//!   anything else  404
//!
//! One accept loop; each request runs to completion before the next.
//! Async provider calls are driven through a tokio runtime handle.
//! ============================================================================

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tiny_http::{Header, Request, Response, Server};
use tokio::runtime::Handle;
use tracing::{error, info};

use crate::auth::{AuthFlow, CallbackParams};

/// Transport-independent response produced by the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpReply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![(
                "Content-Type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
            body: body.to_string(),
        }
    }

    fn json(body: String) -> Self {
        Self {
            status: 200,
            headers: vec![(
                "Content-Type".to_string(),
                "application/json; charset=utf-8".to_string(),
            )],
            body,
        }
    }

    fn redirect(location: String) -> Self {
        Self {
            status: 302,
            headers: vec![("Location".to_string(), location)],
            body: String::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Dispatch one request to the auth flow
pub async fn route(flow: &AuthFlow, method: &str, url: &str, cookie: Option<&str>) -> HttpReply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let session_id = flow.sessions().session_from_cookie_header(cookie);

    match (method, path) {
        ("GET", "/") => {
            let redirect = flow.start(session_id);
            let mut reply = HttpReply::redirect(redirect.location);
            if redirect.new_session {
                reply.headers.push((
                    "Set-Cookie".to_string(),
                    flow.sessions().set_cookie_header(&redirect.session_id),
                ));
            }
            reply
        }
        ("GET", "/callback") => {
            let params = CallbackParams::from_query(query);
            match flow.complete(session_id.as_deref(), &params).await {
                Ok(bundle) => match serde_json::to_string(&bundle) {
                    Ok(body) => HttpReply::json(body),
                    Err(e) => {
                        error!("Failed to serialize credential bundle: {}", e);
                        HttpReply::text(500, "Internal server error")
                    }
                },
                Err(e) => {
                    info!("Callback rejected: {}", e);
                    HttpReply::text(e.status_code(), e.response_body())
                }
            }
        }
        _ => HttpReply::text(404, "Not Found"),
    }
}

/// Stops a running [`AuthServer`] from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown_flag: Arc<AtomicBool>,
    server: Arc<Server>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        self.server.unblock();
    }
}

pub struct AuthServer {
    server: Arc<Server>,
    flow: Arc<AuthFlow>,
    shutdown_flag: Arc<AtomicBool>,
}

impl AuthServer {
    /// Bind the listener, e.g. `127.0.0.1:3000`
    pub fn bind(addr: &str, flow: AuthFlow) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| anyhow!("Failed to start server on {}: {}", addr, e))?;

        Ok(Self {
            server: Arc::new(server),
            flow: Arc::new(flow),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Port actually bound (useful when binding port 0)
    pub fn local_port(&self) -> Option<u16> {
        self.server.server_addr().to_ip().map(|addr| addr.port())
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown_flag: self.shutdown_flag.clone(),
            server: self.server.clone(),
        }
    }

    /// Run the accept loop until shut down. Blocks the calling thread, which
    /// must not be a runtime worker.
    pub fn serve(self, runtime: Handle) -> Result<()> {
        for request in self.server.incoming_requests() {
            if self.shutdown_flag.load(Ordering::SeqCst) {
                break;
            }
            if let Err(e) = self.handle_request(request, &runtime) {
                error!("Error handling request: {}", e);
            }
        }

        info!("Auth server stopped");
        Ok(())
    }

    fn handle_request(&self, request: Request, runtime: &Handle) -> Result<()> {
        let method = request.method().as_str().to_string();
        let url = request.url().to_string();
        let cookie = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Cookie"))
            .map(|h| h.value.as_str().to_string());

        let reply = runtime.block_on(route(&self.flow, &method, &url, cookie.as_deref()));

        let path = url.split('?').next().unwrap_or_default();
        info!("{} {} -> {}", method, path, reply.status);

        let mut response = Response::from_string(reply.body).with_status_code(reply.status);
        for (name, value) in &reply.headers {
            let header = Header::from_bytes(name.as_bytes(), value.as_bytes())
                .map_err(|_| anyhow!("Invalid header {}", name))?;
            response.add_header(header);
        }

        request
            .respond(response)
            .map_err(|e| anyhow!("Failed to send response: {}", e))
    }
}
