//! TCP control plane server.
//!
//! Accepts control connections, greets each with `HELLO`, and runs one
//! [`Session`] per connection. `start` spawns an [`Emitter`] streaming points
//! to the data plane endpoint; `stop` cancels every emitter of the session.

use crate::config::Config;
use crate::emitter::Emitter;
use crate::error::{Error, Result};
use crate::net::resolve;
use crate::protocol::{Command, Response, SessionState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Longest control line accepted, newline included
const MAX_LINE_LENGTH: usize = 1024;

/// Server instance
pub struct Server {
    config: Config,
    shutdown: CancellationToken,
    connection_limit: Arc<Semaphore>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        let connection_limit = Arc::new(Semaphore::new(config.max_connections));
        Server {
            config,
            shutdown: CancellationToken::new(),
            connection_limit,
        }
    }

    /// Token that stops the accept loop and every emitter when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind the control endpoint and serve until shutdown
    pub async fn run(&self) -> Result<()> {
        let addr = resolve(&self.config.control_addr).await?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind {
                addr: self.config.control_addr.clone(),
                source,
            })?;
        info!(address = %addr, "Server listening");
        self.serve(listener).await
    }

    /// Accept connections on `listener` until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            // Wait for a connection slot
            let permit = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                permit = self.connection_limit.clone().acquire_owned() => permit?,
            };

            let (stream, peer) = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = listener.accept() => accepted?,
            };
            info!(peer = %peer, "New TCP connection, saying hello");

            let session = Session::new(
                self.config.data_addr.clone(),
                self.config.tick,
                self.shutdown.child_token(),
            );
            tokio::spawn(async move {
                if let Err(e) = session.serve(stream).await {
                    warn!(peer = %peer, error = %e, "Session ended with error");
                }
                drop(permit);
            });
        }

        info!("Server shutting down");
        Ok(())
    }
}

/// One control connection's state.
///
/// The session owns a cancellation token per emitter it spawned. Tokens are
/// never removed; `stop` cancels all of them and a repeated `stop` is a no-op.
pub struct Session {
    state: SessionState,
    emitters: Vec<CancellationToken>,
    data_addr: String,
    tick: Duration,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(data_addr: String, tick: Duration, cancel: CancellationToken) -> Self {
        Session {
            state: SessionState::Greeted,
            emitters: Vec::new(),
            data_addr,
            tick,
            cancel,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Emitters spawned by this session and not yet cancelled
    pub fn active_emitters(&self) -> usize {
        self.emitters.iter().filter(|t| !t.is_cancelled()).count()
    }

    /// Greet the peer, then run commands until `bye` or a channel failure.
    ///
    /// A read or write failure, or EOF, ends the session and cancels its
    /// emitters. `bye` ends it without touching them.
    pub async fn serve(mut self, stream: TcpStream) -> Result<()> {
        let result = self.command_loop(stream).await;
        debug!(state = ?self.state(), emitters = self.emitters.len(), "Session ended");
        if !self.state.is_closed() {
            debug!("Control channel lost, cancelling emitters");
            self.cancel.cancel();
        }
        result
    }

    async fn command_loop(&mut self, stream: TcpStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = Vec::with_capacity(MAX_LINE_LENGTH);

        writer.write_all(Response::hello()).await?;

        loop {
            line.clear();

            let mut limited = (&mut reader).take(MAX_LINE_LENGTH as u64);
            let n = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                n = limited.read_until(b'\n', &mut line) => n?,
            };
            if n == 0 {
                debug!("Connection closed by client");
                return Ok(());
            }
            if n == MAX_LINE_LENGTH && line.last() != Some(&b'\n') {
                return Err(Error::LineTooLong(MAX_LINE_LENGTH));
            }

            // Invalid UTF-8 is not fatal; it parses as an unknown command.
            let command = Command::parse(&String::from_utf8_lossy(&line));
            debug!(?command, state = ?self.state, "Processing command");

            match &command {
                Command::Start => {
                    self.start().await?;
                    writer.write_all(Response::ok()).await?;
                }
                Command::Stop => {
                    self.stop();
                    writer.write_all(Response::ok()).await?;
                }
                Command::Bye => {
                    info!("Acknowledging goodbye");
                    writer.write_all(Response::ok()).await?;
                    writer.shutdown().await?;
                }
                Command::Unknown(cmd) => {
                    writer.write_all(&Response::unknown(cmd)).await?;
                }
            }

            self.state = self.state.next(&command);
            if self.state.is_closed() {
                return Ok(());
            }
        }
    }

    /// Open a sender to the data endpoint and spawn an emitter on it.
    async fn start(&mut self) -> Result<()> {
        let dest = resolve(&self.data_addr).await?;
        let emitter = Emitter::open(dest, self.tick).await?;
        let token = self.cancel.child_token();
        self.emitters.push(token.clone());

        info!(dest = %dest, emitters = self.emitters.len(), "Starting point transmission via UDP");
        tokio::spawn(run_emitter(emitter, dest, token));
        Ok(())
    }

    /// Cancel every emitter spawned so far.
    fn stop(&mut self) {
        info!(active = self.active_emitters(), "Stopping point transmission");
        for token in &self.emitters {
            token.cancel();
        }
    }
}

async fn run_emitter(emitter: Emitter, dest: SocketAddr, cancel: CancellationToken) {
    if let Err(e) = emitter.run(cancel).await {
        error!(dest = %dest, error = %e, "Emitter failed");
    }
}
