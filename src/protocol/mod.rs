//! Text Protocol Implementation
//!
//! Clients speak a line-oriented text protocol: one command per line,
//! whitespace-separated tokens, one plain-text reply per command.
//!
//! ## Modules
//!
//! - `parser`: line framing and the command parser
//! - `types`: the `Reply` enum and its wire format
//!
//! ## Example
//!
//! ```
//! use tidekv::protocol::{parse_command, Command, Reply};
//!
//! // Parsing incoming data
//! let cmd = parse_command("get name").unwrap();
//! assert_eq!(cmd, Command::Get { key: "name".into() });
//!
//! // Creating responses
//! let reply = Reply::text("Value for 'name': Ada");
//! assert_eq!(reply.serialize(), b"Value for 'name': Ada\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{next_line, parse_command, Command, ParseError, ParseResult};
pub use types::Reply;
