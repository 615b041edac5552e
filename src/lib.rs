//! # TideKV - An In-Memory, Multi-Database Key-Value Store
//!
//! TideKV keeps named databases in memory. Each database maps string keys to
//! opaque byte values, and any key may carry a time-to-live. A background
//! reclaimer per database removes keys whose TTL has run out.
//!
//! ## Features
//!
//! - **Multiple Databases**: A catalog of independent, named databases
//! - **TTL Support**: Per-key expiry, listed soonest-first, reclaimed in the background
//! - **Line Protocol**: One plain-text command per line over TCP or a local console
//! - **Async I/O**: Built on Tokio, one task per client session
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              TideKV                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ or Console  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │   Line      │    │                 Catalog                      │   │
//! │  │   Parser    │    │  ┌──────────────┐  ┌──────────────┐          │   │
//! │  │             │    │  │ Database     │  │ Database     │   ...    │   │
//! │  └─────────────┘    │  │ DataStore    │  │ DataStore    │          │   │
//! │                     │  │ TtlIndex     │  │ TtlIndex     │          │   │
//! │                     │  │ ExpiryList   │  │ ExpiryList   │          │   │
//! │                     │  │ Reclaimer    │  │ Reclaimer    │          │   │
//! │                     │  └──────────────┘  └──────────────┘          │   │
//! │                     └──────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use tidekv::commands::CommandHandler;
//! use tidekv::connection::{handle_connection, ConnectionStats};
//! use tidekv::storage::Catalog;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let catalog = Arc::new(Catalog::default());
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(Arc::clone(&catalog));
//!         let stats = Arc::clone(&stats);
//!
//!         tokio::spawn(handle_connection(stream, addr, handler, stats));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! ### Database Commands
//! - `use <db>` - select a database, creating it if needed
//! - `showdbs` / `curdb` / `dropdb <db>`
//!
//! ### Key Commands
//! - `put <key> <value>` / `get <key>` / `delete <key>`
//! - `keys` / `getall`
//!
//! ### TTL Commands
//! - `setttl <key> <seconds>` / `getttl <key>`
//! - `upttl <key> <seconds>` / `rmttl <key>`
//! - `list` - keys with a TTL, soonest expiry first
//!
//! ### Session
//! - `exit`
//!
//! ## Module Overview
//!
//! - [`protocol`]: line parser and reply types
//! - [`storage`]: databases, TTL bookkeeping and the catalog
//! - [`commands`]: per-session command execution
//! - [`connection`]: TCP and console sessions
//! - [`config`]: server settings
//!
//! ## Design Highlights
//!
//! ### Lock Ordering
//!
//! Each database guards its TTL bookkeeping with one lock and its values with
//! another. Every operation that needs both takes the TTL lock first, so a
//! sweep and a client write can never deadlock.
//!
//! ### Active Expiry Only
//!
//! Expired keys stay readable until the next sweep removes them. Sweeps walk
//! the expiry list from the front and stop at the first key still alive, so
//! a sweep costs time proportional to what it removes.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, run_console, ConnectionStats};
pub use protocol::{parse_command, Command, ParseError, Reply};
pub use storage::{Catalog, Database, ReclaimerConfig, StorageError};

/// The default port TideKV listens on
pub const DEFAULT_PORT: u16 = 8080;

/// The default host TideKV binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of TideKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
