//! Reply Types
//!
//! Every command produces exactly one [`Reply`]. Replies are plain text: one
//! line for simple answers, a header followed by one `- item` line per entry
//! for listings. Each reply ends with a newline so a client can read it with
//! a line reader.
//!
//! ## Examples
//!
//! ```text
//! Value for 'name' set to: Ada
//! Error: key not found: ghost
//! Keys in database:
//! - name
//! - city
//! ```

use std::fmt;

/// Line terminator used on the wire
pub const NEWLINE: &[u8] = b"\n";

/// A response to a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// One line of text.
    Text(String),

    /// A failed command. Rendered with an `Error: ` prefix.
    Error(String),

    /// A header line followed by one line per item.
    /// An empty list renders as `empty` alone.
    Listing {
        header: String,
        items: Vec<String>,
        empty: String,
    },

    /// Sent in answer to `exit`; the session ends after it.
    Bye,
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }

    /// Creates an error reply from anything displayable.
    pub fn error(e: impl fmt::Display) -> Self {
        Reply::Error(e.to_string())
    }

    pub fn listing(
        header: impl Into<String>,
        items: Vec<String>,
        empty: impl Into<String>,
    ) -> Self {
        Reply::Listing {
            header: header.into(),
            items,
            empty: empty.into(),
        }
    }

    /// Serializes the reply to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Text(s) => {
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(NEWLINE);
            }
            Reply::Error(s) => {
                buf.extend_from_slice(b"Error: ");
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(NEWLINE);
            }
            Reply::Listing {
                header,
                items,
                empty,
            } => {
                if items.is_empty() {
                    buf.extend_from_slice(empty.as_bytes());
                    buf.extend_from_slice(NEWLINE);
                    return;
                }
                buf.extend_from_slice(header.as_bytes());
                buf.extend_from_slice(NEWLINE);
                for item in items {
                    buf.extend_from_slice(b"- ");
                    buf.extend_from_slice(item.as_bytes());
                    buf.extend_from_slice(NEWLINE);
                }
            }
            Reply::Bye => {
                buf.extend_from_slice(b"Goodbye!");
                buf.extend_from_slice(NEWLINE);
            }
        }
    }

    /// Returns true if this reply reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Returns true if the session should end after this reply.
    pub fn is_bye(&self) -> bool {
        matches!(self, Reply::Bye)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.serialize();
        let text = String::from_utf8_lossy(&bytes);
        f.write_str(text.trim_end_matches('\n'))
    }
}
