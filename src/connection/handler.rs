//! Connection Handler Module
//!
//! This module handles individual client sessions.
//! Each session gets its own handler that runs in a loop,
//! reading command lines and sending replies.
//!
//! ## Session Lifecycle
//!
//! ```text
//! 1. Client connects (TCP) or the console starts (stdin/stdout)
//!        │
//!        ▼
//! 2. ConnectionHandler created, optional greeting sent
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  read bytes ─> split line    │
//!    │  parse ─> execute ─> reply   │
//!    │  [optional prompt]           │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. `exit`, disconnect or error
//! ```
//!
//! ## Buffer Management
//!
//! Incoming data accumulates in a BytesMut buffer. TCP is a stream protocol,
//! so one read may hold half a line or several lines; complete lines are
//! split off the front as they arrive.

use crate::commands::CommandHandler;
use crate::protocol::{next_line, parse_command, ParseError, Reply};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Maximum length of a single command line (64 KB)
const MAX_LINE_SIZE: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Greeting sent to every TCP client
pub const TCP_GREETING: &str = "Welcome to Key-Value Store Server\nType 'exit' to disconnect\n";

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client session over any byte stream.
pub struct ConnectionHandler<S> {
    /// The stream for this session
    stream: BufWriter<S>,

    /// Peer description (for logging)
    peer: String,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Per-session command execution
    command_handler: CommandHandler,

    /// Sent once when the session starts
    greeting: Option<String>,

    /// Sent before every command is read
    prompt: Option<String>,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The byte stream for this session
    /// * `peer` - Who is on the other end (for logging)
    /// * `command_handler` - The command handler for executing commands
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        peer: impl Into<String>,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            peer: peer.into(),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            greeting: None,
            prompt: None,
            stats,
        }
    }

    /// Sends `greeting` when the session starts.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Sends `prompt` before reading each command.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Runs the session until the client exits or disconnects.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.peer, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.peer, "Client disconnected gracefully"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    debug!(client = %self.peer, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.peer, "Connection reset by client")
                }
                _ => warn!(client = %self.peer, error = %e, "Connection error"),
            },
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        if let Some(greeting) = self.greeting.take() {
            self.send(greeting.as_bytes()).await?;
        }
        self.send_prompt().await?;

        loop {
            while let Some(line) = next_line(&mut self.buffer) {
                let line = String::from_utf8_lossy(&line);
                trace!(client = %self.peer, line = %line, "Received line");

                let reply = match parse_command(&line) {
                    Ok(command) => {
                        let reply = self.command_handler.execute(command);
                        self.stats.command_processed();
                        reply
                    }
                    Err(ParseError::Empty) => {
                        self.send_prompt().await?;
                        continue;
                    }
                    Err(e) => {
                        debug!(client = %self.peer, error = %e, "Rejected command");
                        Reply::error(e)
                    }
                };

                self.send(&reply.serialize()).await?;
                if reply.is_bye() {
                    return Ok(());
                }
                self.send_prompt().await?;
            }

            // Need more data - read from the stream
            self.read_more_data().await?;
        }
    }

    /// Reads more data from the stream into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        // A full buffer with no newline in it is a line that is too long
        if self.buffer.len() >= MAX_LINE_SIZE {
            error!(
                client = %self.peer,
                size = self.buffer.len(),
                "Line size limit exceeded"
            );
            return Err(ConnectionError::LineTooLong);
        }

        // Ensure we have some capacity
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                // Partial line in buffer
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.peer, bytes = n, "Read data");

        Ok(())
    }

    async fn send_prompt(&mut self) -> Result<(), ConnectionError> {
        match self.prompt.take() {
            Some(prompt) => {
                let result = self.send(prompt.as_bytes()).await;
                self.prompt = Some(prompt);
                result
            }
            None => Ok(()),
        }
    }

    /// Writes bytes to the client and flushes.
    async fn send(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(client = %self.peer, bytes = bytes.len(), "Sent reply");
        Ok(())
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial line)
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// A line exceeded the size limit
    #[error("Line size limit exceeded")]
    LineTooLong,
}

/// Handles a TCP client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// with the standard greeting and runs it to completion.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr.to_string(), command_handler, stats)
        .with_greeting(TCP_GREETING);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
