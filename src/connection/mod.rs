//! Session Handling
//!
//! A session is one client talking to the catalog: a TCP connection, or the
//! interactive console on stdin/stdout. Both run the same
//! [`ConnectionHandler`], which is generic over the byte stream.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────┐
//! │     TCP Listener     │        │   Console (stdin)    │
//! │     (main.rs)        │        │   (console.rs)       │
//! └──────────┬───────────┘        └──────────┬───────────┘
//!            │ accept() + spawn              │ join(stdin, stdout)
//!            ▼                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler<S>                        │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read line   │───>│ Parse       │───>│ Execute cmd │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      ┌─────────────┐        │
//! │                                      │ Send reply  │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use tidekv::connection::{handle_connection, ConnectionStats};
//! use tidekv::commands::CommandHandler;
//! use tidekv::storage::Catalog;
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(Catalog::default());
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! let handler = CommandHandler::new(Arc::clone(&catalog));
//! tokio::spawn(handle_connection(stream, addr, handler, stats));
//! ```

pub mod console;
pub mod handler;

// Re-export commonly used types
pub use console::run_console;
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
