//! Command Handler Module
//!
//! This module implements the command processing layer for TideKV.
//! It receives parsed commands, executes them against the catalog and the
//! selected database, and returns replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Line Parser    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module, one per session)
//! │                 │
//! │  - Select db    │
//! │  - Dispatch     │
//! │  - Format reply │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Catalog/Database│  (storage module)
//! └─────────────────┘
//! ```

pub mod handler;

// Re-export the main command handler
pub use handler::CommandHandler;
