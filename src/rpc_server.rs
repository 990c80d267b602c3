//! Hideout host bridge: JSON-RPC over stdin/stdout for the rendering UI.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"nav.go", "params":{"input":"example.com"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"tab.loaded", ...} / {"event":"tab.failed", ...}
//!
//! Logs go to stderr; stdout carries only protocol lines.

use std::time::Instant;

use hideout::app::Browser;
use hideout::rpc_handler::{handle_method, load_event_json};
use hideout::services::config_loader::ConfigLoader;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`info` when unset).
const LOG_ENV: &str = "HIDEOUT_LOG";

/// Simple rate limiter: max requests per one-second window.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

async fn send(stdout: &mut Stdout, message: &Value) -> io::Result<()> {
    stdout.write_all(message.to_string().as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let loader = ConfigLoader::new(std::env::args().nth(1));
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            error!(path = %loader.get_config_path(), error = %e, "Failed to load config");
            std::process::exit(1);
        }
    };

    let mut browser = match Browser::from_config(&config) {
        Ok(browser) => browser,
        Err(e) => {
            error!(error = %e, "Failed to initialize Hideout");
            std::process::exit(1);
        }
    };
    browser.reload_all();

    if let Err(e) = serve(&mut browser).await {
        error!(error = %e, "Host bridge I/O failed");
    }

    browser.shutdown().await;
}

async fn serve(browser: &mut Browser) -> io::Result<()> {
    let mut stdout = io::stdout();
    send(&mut stdout, &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")})).await?;
    info!("Host bridge ready");

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, shutting down");
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }

                let req: Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        send(&mut stdout, &json!({"id": null, "error": format!("parse error: {}", e)})).await?;
                        continue;
                    }
                };
                let id = req.get("id").cloned().unwrap_or(Value::Null);

                if !rate_limiter.check() {
                    warn!("Request rate limit exceeded");
                    send(&mut stdout, &json!({"id": id, "error": "rate limit exceeded"})).await?;
                    continue;
                }

                let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                let params = req.get("params").cloned().unwrap_or(json!({}));

                let response = match handle_method(browser, method, &params) {
                    Ok(val) => json!({"id": id, "result": val}),
                    Err(err) => json!({"id": id, "error": err}),
                };
                send(&mut stdout, &response).await?;
            }
            Some(event) = browser.next_completion() => {
                if let Some(message) = load_event_json(browser, &event) {
                    send(&mut stdout, &message).await?;
                }
            }
        }
    }
}
