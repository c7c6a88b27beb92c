//! Local callback listener for browser-based provider sign-in.

use crate::{SessionError, SessionResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// Default sign-in timeout in seconds.
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 180;

/// Query parameters delivered on the sign-in redirect.
#[derive(Debug, Clone)]
pub struct CallbackHit {
    pub params: HashMap<String, String>,
}

impl CallbackHit {
    /// Read a single parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Local HTTP listener that waits for a provider's sign-in redirect.
pub struct CallbackServer {
    port: u16,
    timeout_secs: u64,
}

impl CallbackServer {
    /// Create a new callback server.
    pub fn new(port: u16, timeout_secs: u64) -> Self {
        Self { port, timeout_secs }
    }

    /// Get the redirect URI registered with the provider.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/callback", self.port)
    }

    /// Start the listener and wait for the sign-in redirect.
    ///
    /// The caller is responsible for opening the browser to the provider's
    /// authorize URL. Returns `SessionError::Timeout` when no redirect
    /// arrives within the configured window.
    pub async fn wait_for_redirect(&self) -> SessionResult<CallbackHit> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| SessionError::Config(format!("failed to bind to {}: {}", addr, e)))?;

        info!(port = self.port, "sign-in callback listener ready");

        let (tx, rx) = oneshot::channel::<CallbackHit>();
        let tx = Arc::new(tokio::sync::Mutex::new(Some(tx)));

        let server_handle = tokio::spawn({
            let tx = tx.clone();
            async move {
                loop {
                    match listener.accept().await {
                        Ok((mut socket, _)) => {
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(&mut socket, tx).await {
                                    error!("error handling callback connection: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("accept error: {}", e);
                            break;
                        }
                    }
                }
            }
        });

        let timeout = tokio::time::Duration::from_secs(self.timeout_secs);
        let result = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(hit)) => Ok(hit),
            Ok(Err(_)) => Err(SessionError::Config(
                "callback channel closed unexpectedly".to_string(),
            )),
            Err(_) => Err(SessionError::Timeout),
        };

        server_handle.abort();

        result
    }
}

/// Handle an incoming HTTP connection.
async fn handle_connection(
    socket: &mut tokio::net::TcpStream,
    tx: Arc<tokio::sync::Mutex<Option<oneshot::Sender<CallbackHit>>>>,
) -> SessionResult<()> {
    let (reader, mut writer) = socket.split();
    let mut reader = BufReader::new(reader);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    debug!(request = %request_line.trim(), "callback request");

    // Parse the request line: GET /callback?... HTTP/1.1
    if !request_line.starts_with("GET ") {
        send_response(&mut writer, 405, "Method Not Allowed", "Method Not Allowed").await?;
        return Ok(());
    }

    let path_end = request_line.find(" HTTP/").unwrap_or(request_line.len());
    let path = &request_line[4..path_end];

    if !path.starts_with("/callback") {
        send_response(&mut writer, 404, "Not Found", "Not Found").await?;
        return Ok(());
    }

    let query = match path.find('?') {
        Some(idx) => &path[idx + 1..],
        None => "",
    };

    let params = parse_query(query);
    let failed = params.contains_key("error");

    let body = if failed {
        error_page(params.get("error").map(String::as_str).unwrap_or("unknown"))
    } else {
        success_page()
    };
    send_response(&mut writer, 200, "OK", &body).await?;

    if let Some(tx) = tx.lock().await.take() {
        let _ = tx.send(CallbackHit { params });
    }

    Ok(())
}

/// Parse a URL query string into a parameter map.
fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Send an HTTP response.
async fn send_response(
    writer: &mut tokio::net::tcp::WriteHalf<'_>,
    status_code: u16,
    status_text: &str,
    body: &str,
) -> SessionResult<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_code,
        status_text,
        body.len(),
        body
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Generate success page HTML.
fn success_page() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>keepin - Sign-in Complete</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px;">
<h1>Sign-in complete</h1>
<p>You can close this window and return to the app.</p>
<script>setTimeout(() => window.close(), 2000);</script>
</body>
</html>"#
        .to_string()
}

/// Generate error page HTML.
fn error_page(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>keepin - Sign-in Failed</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px;">
<h1>Sign-in failed</h1>
<p>Error: {}</p>
<p>You can close this window and try again.</p>
</body>
</html>"#,
        error
    )
}
