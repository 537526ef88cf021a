//! Driver bridge - talks to a browser driver subprocess over JSON lines

use crate::core::locator::StructuralQuery;
use crate::session::{
    protocol::{Envelope, Request, Response},
    BridgeConfig, ElementHandle, PageSession, SemanticResolver, SessionError, Verdict,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

struct BridgeIo {
    child: Child,
    reader: BufReader<ChildStdout>,
    writer: BufWriter<ChildStdin>,
}

/// Page session and semantic resolver backed by one driver process
///
/// Requests are serialized: one exchange is in flight at a time. Responses
/// whose id does not match the pending request (left over from an exchange
/// that was abandoned on timeout) are skipped.
pub struct DriverBridge {
    config: BridgeConfig,
    io: Mutex<BridgeIo>,
    seq: AtomicU64,
}

impl std::fmt::Debug for DriverBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverBridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DriverBridge {
    /// Spawn the driver process
    pub fn spawn(config: BridgeConfig) -> Result<Self, SessionError> {
        debug!("Spawning driver: {} {:?}", config.command, config.args);

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SessionError::Spawn {
                command: config.command.clone(),
                message: e.to_string(),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| SessionError::Spawn {
            command: config.command.clone(),
            message: "failed to get driver stdin".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| SessionError::Spawn {
            command: config.command.clone(),
            message: "failed to get driver stdout".to_string(),
        })?;

        Ok(Self {
            config,
            io: Mutex::new(BridgeIo {
                child,
                reader: BufReader::new(stdout),
                writer: BufWriter::new(stdin),
            }),
            seq: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Send a request and wait for its result
    ///
    /// `extra` extends the configured request timeout for operations that
    /// wait on the page themselves.
    async fn request(&self, request: Request, extra: Option<Duration>) -> Result<Value, SessionError> {
        let id = self.seq.fetch_add(1, Ordering::SeqCst);
        let line = serde_json::to_string(&Envelope {
            id,
            request: &request,
        })?;
        let limit = self.config.request_timeout + extra.unwrap_or_default();

        debug!("driver >>> {}", line);

        let mut io = self.io.lock().await;
        let response = timeout(limit, exchange(&mut io, id, &line))
            .await
            .map_err(|_| SessionError::Timeout(limit.as_millis() as u64))??;

        if response.ok {
            Ok(response.result)
        } else {
            let message = response
                .error
                .unwrap_or_else(|| format!("{} failed", request.op()));
            Err(SessionError::Driver(message))
        }
    }

    async fn request_as<T: DeserializeOwned>(
        &self,
        request: Request,
        extra: Option<Duration>,
    ) -> Result<T, SessionError> {
        let op = request.op();
        let value = self.request(request, extra).await?;
        serde_json::from_value(value)
            .map_err(|e| SessionError::Protocol(format!("unexpected {} result: {}", op, e)))
    }

    /// Ask the driver to shut down, then make sure the process is gone
    pub async fn close(&self) -> Result<(), SessionError> {
        let _ = timeout(Duration::from_secs(1), self.request(Request::Close, None)).await;

        let mut io = self.io.lock().await;
        if io.child.try_wait()?.is_none() {
            io.child.kill().await?;
        }
        Ok(())
    }
}

async fn exchange(io: &mut BridgeIo, id: u64, line: &str) -> Result<Response, SessionError> {
    io.writer.write_all(line.as_bytes()).await?;
    io.writer.write_all(b"\n").await?;
    io.writer.flush().await?;

    let mut buf = String::new();
    loop {
        buf.clear();
        if io.reader.read_line(&mut buf).await? == 0 {
            return Err(SessionError::Closed);
        }

        let text = buf.trim();
        if text.is_empty() {
            continue;
        }
        debug!("driver <<< {}", text);

        // Drivers may print their own progress lines on stdout
        let Ok(value) = serde_json::from_str::<Value>(text) else {
            warn!("Ignoring non-JSON driver output: {}", text);
            continue;
        };
        let response: Response = serde_json::from_value(value)
            .map_err(|e| SessionError::Protocol(format!("invalid response line: {}", e)))?;
        if response.id == id {
            return Ok(response);
        }
        warn!("Skipping stale driver response {} (waiting for {})", response.id, id);
    }
}

#[async_trait]
impl PageSession for DriverBridge {
    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        self.request(Request::Goto { url: url.to_string() }, None)
            .await
            .map(|_| ())
    }

    async fn find(&self, query: &StructuralQuery) -> Result<Option<ElementHandle>, SessionError> {
        self.request_as(Request::Find { query: query.into() }, None)
            .await
    }

    async fn is_visible(&self, element: &ElementHandle) -> Result<bool, SessionError> {
        self.request_as(
            Request::IsVisible {
                element: element.0.clone(),
            },
            None,
        )
        .await
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), SessionError> {
        self.request(
            Request::Click {
                element: element.0.clone(),
            },
            None,
        )
        .await
        .map(|_| ())
    }

    async fn set_value(&self, element: &ElementHandle, value: &str) -> Result<(), SessionError> {
        self.request(
            Request::SetValue {
                element: element.0.clone(),
                value: value.to_string(),
            },
            None,
        )
        .await
        .map(|_| ())
    }

    async fn wait_for_network_idle(&self, quiet: Duration) -> Result<(), SessionError> {
        // The caller bounds the overall wait
        self.request(
            Request::WaitForNetworkIdle {
                quiet_ms: quiet.as_millis() as u64,
            },
            Some(Duration::from_secs(3600)),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl SemanticResolver for DriverBridge {
    async fn locate(&self, description: &str) -> Result<Option<ElementHandle>, SessionError> {
        self.request_as(
            Request::Locate {
                description: description.to_string(),
            },
            None,
        )
        .await
    }

    async fn assert(&self, condition: &str) -> Result<Verdict, SessionError> {
        self.request_as(
            Request::Assert {
                condition: condition.to_string(),
            },
            None,
        )
        .await
    }

    async fn wait_for(&self, condition: &str, wait: Duration) -> Result<bool, SessionError> {
        self.request_as(
            Request::WaitFor {
                condition: condition.to_string(),
                timeout_ms: wait.as_millis() as u64,
            },
            Some(wait),
        )
        .await
    }
}
