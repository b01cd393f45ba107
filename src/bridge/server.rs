//! The bridge server: lifecycle, authentication gate, dispatch and the
//! cooperative tick loop.
//!
//! The server never owns a thread. [`BridgeServer::start`] binds a
//! non-blocking listener; the host application (or [`BridgeServer::run`],
//! the bundled driver) then calls [`BridgeServer::tick`] at a short fixed
//! interval from the one thread that owns the scene graph. A tick either
//! does nothing or services exactly one connection start-to-finish, which
//! bounds the bridge to one in-flight request by construction — no locking,
//! no internal concurrency.
//!
//! A consequence accepted by this design: a slow tool call (heavy geometry
//! scan, large export, long-running script) blocks the host for its full
//! duration. There is no timeout and no cancellation once a handler starts.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::bridge::connection::Connection;
use crate::bridge::protocol::{
    parse_request, JsonRpcError, JsonRpcResponse, Request, ToolCallParams, ToolCallResult,
};
use crate::config::Config;
use crate::host::Host;
use crate::tools;

/// The bridge protocol server.
///
/// Owns its listener socket and configuration; there is no ambient or
/// static state. Dropping the server (or calling [`BridgeServer::stop`])
/// releases the port.
pub struct BridgeServer<H: Host> {
    /// Bridge configuration.
    config: Config,
    /// The host application facade.
    host: H,
    /// The listening socket while the server is running.
    listener: Option<TcpListener>,
}

impl<H: Host> BridgeServer<H> {
    /// Creates a stopped server over the given host facade.
    #[must_use]
    pub fn new(config: Config, host: H) -> Self {
        Self {
            config,
            host,
            listener: None,
        }
    }

    /// Returns a mutable handle to the host facade.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Returns `true` while the listener is bound.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    /// Returns the bound listener address while the server is running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Binds the listening socket. No-op if the server is already running.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound or switched to
    /// non-blocking mode. A bind failure is fatal: the server stays
    /// stopped and nothing is retried.
    pub fn start(&mut self) -> io::Result<()> {
        if self.listener.is_some() {
            debug!("bridge server already running");
            return Ok(());
        }

        let endpoint = format!(
            "{}:{}",
            self.config.network.bind_address, self.config.network.port
        );
        let listener = TcpListener::bind(&endpoint)?;
        listener.set_nonblocking(true)?;

        info!(
            address = %endpoint,
            auth = self.config.auth.effective_secret().is_some(),
            "bridge server listening"
        );
        self.listener = Some(listener);
        Ok(())
    }

    /// Closes the listening socket, releasing the port. No-op if stopped.
    pub fn stop(&mut self) {
        if self.listener.take().is_some() {
            info!("bridge server stopped");
        }
    }

    /// One cooperative unit of work: polls the listener and, if a
    /// connection is pending, services it fully before returning.
    ///
    /// Would-block conditions are expected and silently ignored; any other
    /// accept error is logged and the loop continues on the next tick.
    /// Additional pending connections wait for subsequent ticks.
    pub fn tick(&mut self) {
        let Some(listener) = &self.listener else {
            return;
        };

        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted connection");
                self.handle_connection(stream);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => {
                warn!(error = %e, "accept failed");
            }
        }
    }

    /// Services one connection: authenticate, read one request line,
    /// dispatch, write the response, close.
    ///
    /// Every fault is isolated to this connection; nothing propagates to
    /// the tick loop.
    fn handle_connection(&mut self, stream: TcpStream) {
        let read_timeout = Duration::from_millis(self.config.network.read_timeout_ms);
        let mut conn = match Connection::new(stream, read_timeout) {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "failed to prepare connection");
                return;
            }
        };

        if let Some(secret) = self.config.auth.effective_secret() {
            if !Self::authenticate(&mut conn, secret) {
                debug!("rejecting unauthenticated connection");
                if !self.config.auth.silent_rejection {
                    let _ = conn.write_error(&JsonRpcError::authentication_failed());
                }
                return;
            }
        }

        let line = match conn.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("connection closed before a request line arrived");
                return;
            }
            Err(e) => {
                warn!(error = %e, "failed to read request line");
                return;
            }
        };

        let outcome = self.handle_line(&line);
        let written = match &outcome {
            Ok(response) => conn.write_response(response),
            Err(error) => conn.write_error(error),
        };
        if let Err(e) = written {
            warn!(error = %e, "failed to write response");
        }
    }

    /// Reads and checks the authentication line. Any failure — missing
    /// line, malformed JSON, mismatched secret — rejects the connection.
    fn authenticate(conn: &mut Connection, secret: &str) -> bool {
        let Ok(Some(line)) = conn.read_line() else {
            return false;
        };
        let Ok(value) = serde_json::from_str::<Value>(&line) else {
            return false;
        };
        value.get("secret").and_then(Value::as_str) == Some(secret)
    }

    /// Parses and dispatches one request line.
    fn handle_line(&mut self, line: &str) -> Result<JsonRpcResponse, JsonRpcError> {
        let request = parse_request(line)?;
        self.handle_request(request)
    }

    /// Dispatches a parsed request by method.
    fn handle_request(&mut self, request: Request) -> Result<JsonRpcResponse, JsonRpcError> {
        match request.method.as_str() {
            "ping" => Ok(JsonRpcResponse::success(
                request.id,
                json!({"status": "ok"}),
            )),
            "tools/call" => self.handle_tools_call(request),
            other => Err(JsonRpcError::method_not_found(request.id, other)),
        }
    }

    /// Handles a `tools/call` request.
    ///
    /// Everything below the method dispatch is an application concern:
    /// malformed params, unknown tool names and handler failures all
    /// surface as `isError` tool results inside a success envelope.
    fn handle_tools_call(&mut self, request: Request) -> Result<JsonRpcResponse, JsonRpcError> {
        let result = match request.params {
            None => ToolCallResult::error("Missing tool call params"),
            Some(params) => match serde_json::from_value::<ToolCallParams>(params) {
                Ok(params) => tools::dispatch(
                    &mut self.host,
                    &self.config.export,
                    &params.name,
                    &params.arguments,
                ),
                Err(e) => ToolCallResult::error(format!("Invalid tool call params: {e}")),
            },
        };

        let result_value = serde_json::to_value(&result).map_err(|e| {
            warn!(error = %e, "failed to serialise tool call result");
            JsonRpcError::internal_error(
                request.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(request.id, result_value))
    }

    /// Runs the bundled tick driver: start, poll on a fixed interval,
    /// stop on shutdown signal.
    ///
    /// Hosts with their own periodic task mechanism should call
    /// [`BridgeServer::tick`] directly instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or signal handlers
    /// cannot be installed.
    pub async fn run(&mut self) -> io::Result<()> {
        self.start()?;
        let result = self.run_with_shutdown().await;
        self.stop();
        result
    }

    /// Drives ticks until a shutdown signal arrives.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.network.tick_interval_ms));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
    }

    /// Drives ticks until a shutdown signal arrives.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.network.tick_interval_ms));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
    }
}
