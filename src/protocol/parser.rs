//! Line Command Parser
//!
//! Turns one line of client input into a typed [`Command`].
//!
//! ## Grammar
//!
//! ```text
//! line    = keyword *( 1*WSP argument ) [ "\r" ] "\n"
//! keyword = case-insensitive command name
//! argument = case-sensitive token without whitespace
//! ```
//!
//! Arity and TTL arguments are checked here, so the storage core only ever
//! receives well-formed requests. A TTL must be a positive whole number of
//! seconds no larger than [`MAX_TTL`].
//!
//! Framing is separate from parsing: [`next_line`] pulls complete lines out
//! of a connection buffer, and [`parse_command`] parses each one. A bad line
//! is answered with an error and the session carries on.

use crate::storage::MAX_TTL;
use bytes::{Bytes, BytesMut};
use thiserror::Error;

/// Errors that can occur while parsing a command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line held nothing but whitespace
    #[error("empty input")]
    Empty,

    /// The keyword is not a known command
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Right command, wrong number of arguments
    #[error("invalid input. Usage: {usage}")]
    WrongArity { usage: &'static str },

    /// The TTL argument is not a positive integer
    #[error("invalid TTL '{value}'. Usage: {usage}")]
    InvalidTtl { value: String, usage: &'static str },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `use <db>`
    Use { db: String },
    /// `showdbs`
    ShowDbs,
    /// `curdb`
    CurrentDb,
    /// `dropdb <db>`
    DropDb { db: String },
    /// `keys`
    Keys,
    /// `put <key> <value>`
    Put { key: String, value: Bytes },
    /// `get <key>`
    Get { key: String },
    /// `getall`
    GetAll,
    /// `delete <key>`
    Delete { key: String },
    /// `setttl <key> <seconds>`
    SetTtl { key: String, seconds: u64 },
    /// `getttl <key>`
    GetTtl { key: String },
    /// `rmttl <key>`
    RemoveTtl { key: String },
    /// `upttl <key> <seconds>`
    UpdateTtl { key: String, seconds: u64 },
    /// `list`
    List,
    /// `exit`
    Exit,
}

impl Command {
    /// The command's keyword, as typed by clients.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Use { .. } => "use",
            Command::ShowDbs => "showdbs",
            Command::CurrentDb => "curdb",
            Command::DropDb { .. } => "dropdb",
            Command::Keys => "keys",
            Command::Put { .. } => "put",
            Command::Get { .. } => "get",
            Command::GetAll => "getall",
            Command::Delete { .. } => "delete",
            Command::SetTtl { .. } => "setttl",
            Command::GetTtl { .. } => "getttl",
            Command::RemoveTtl { .. } => "rmttl",
            Command::UpdateTtl { .. } => "upttl",
            Command::List => "list",
            Command::Exit => "exit",
        }
    }

    /// Returns true for commands that operate on the selected database.
    pub fn needs_database(&self) -> bool {
        !matches!(
            self,
            Command::Use { .. }
                | Command::ShowDbs
                | Command::CurrentDb
                | Command::DropDb { .. }
                | Command::Exit
        )
    }
}

/// Parses one line of input into a [`Command`].
///
/// # Example
///
/// ```
/// use tidekv::protocol::{parse_command, Command};
///
/// let cmd = parse_command("SETTTL session 30").unwrap();
/// assert_eq!(cmd, Command::SetTtl { key: "session".into(), seconds: 30 });
/// ```
pub fn parse_command(line: &str) -> ParseResult<Command> {
    let mut parts = line.split_whitespace();
    let keyword = parts.next().ok_or(ParseError::Empty)?.to_lowercase();
    let args: Vec<&str> = parts.collect();

    let command = match keyword.as_str() {
        "use" => {
            let [db] = expect_args::<1>(&args, "use <db>")?;
            Command::Use { db: db.to_string() }
        }
        "showdbs" => {
            let [] = expect_args::<0>(&args, "showdbs")?;
            Command::ShowDbs
        }
        "curdb" => {
            let [] = expect_args::<0>(&args, "curdb")?;
            Command::CurrentDb
        }
        "dropdb" => {
            let [db] = expect_args::<1>(&args, "dropdb <db>")?;
            Command::DropDb { db: db.to_string() }
        }
        "keys" => {
            let [] = expect_args::<0>(&args, "keys")?;
            Command::Keys
        }
        "put" => {
            let [key, value] = expect_args::<2>(&args, "put <key> <value>")?;
            Command::Put {
                key: key.to_string(),
                value: Bytes::copy_from_slice(value.as_bytes()),
            }
        }
        "get" => {
            let [key] = expect_args::<1>(&args, "get <key>")?;
            Command::Get { key: key.to_string() }
        }
        "getall" => {
            let [] = expect_args::<0>(&args, "getall")?;
            Command::GetAll
        }
        "delete" => {
            let [key] = expect_args::<1>(&args, "delete <key>")?;
            Command::Delete { key: key.to_string() }
        }
        "setttl" => {
            const USAGE: &str = "setttl <key> <ttl>";
            let [key, ttl] = expect_args::<2>(&args, USAGE)?;
            Command::SetTtl {
                key: key.to_string(),
                seconds: parse_ttl(ttl, USAGE)?,
            }
        }
        "getttl" => {
            let [key] = expect_args::<1>(&args, "getttl <key>")?;
            Command::GetTtl { key: key.to_string() }
        }
        "rmttl" => {
            let [key] = expect_args::<1>(&args, "rmttl <key>")?;
            Command::RemoveTtl { key: key.to_string() }
        }
        "upttl" => {
            const USAGE: &str = "upttl <key> <ttl>";
            let [key, ttl] = expect_args::<2>(&args, USAGE)?;
            Command::UpdateTtl {
                key: key.to_string(),
                seconds: parse_ttl(ttl, USAGE)?,
            }
        }
        "list" => {
            let [] = expect_args::<0>(&args, "list")?;
            Command::List
        }
        "exit" => {
            let [] = expect_args::<0>(&args, "exit")?;
            Command::Exit
        }
        _ => return Err(ParseError::UnknownCommand(keyword)),
    };

    Ok(command)
}

/// Checks that exactly `N` arguments follow the keyword.
fn expect_args<'a, const N: usize>(
    args: &[&'a str],
    usage: &'static str,
) -> ParseResult<[&'a str; N]> {
    <[&'a str; N]>::try_from(args).map_err(|_| ParseError::WrongArity { usage })
}

fn parse_ttl(value: &str, usage: &'static str) -> ParseResult<u64> {
    match value.parse::<u64>() {
        Ok(seconds) if seconds > 0 && seconds <= MAX_TTL.as_secs() => Ok(seconds),
        _ => Err(ParseError::InvalidTtl {
            value: value.to_string(),
            usage,
        }),
    }
}

/// Splits the next complete line off the front of `buf`.
///
/// Returns `None` until a `\n` arrives. The terminator, and a `\r` before it,
/// are stripped from the returned line.
pub fn next_line(buf: &mut BytesMut) -> Option<Bytes> {
    let end = buf.iter().position(|&b| b == b'\n')?;
    let mut line = buf.split_to(end + 1);
    line.truncate(end);
    if line.last() == Some(&b'\r') {
        line.truncate(end - 1);
    }
    Some(line.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_command() {
        let cases = [
            ("use app", Command::Use { db: "app".into() }),
            ("showdbs", Command::ShowDbs),
            ("curdb", Command::CurrentDb),
            ("dropdb app", Command::DropDb { db: "app".into() }),
            ("keys", Command::Keys),
            (
                "put k v",
                Command::Put {
                    key: "k".into(),
                    value: Bytes::from("v"),
                },
            ),
            ("get k", Command::Get { key: "k".into() }),
            ("getall", Command::GetAll),
            ("delete k", Command::Delete { key: "k".into() }),
            (
                "setttl k 5",
                Command::SetTtl {
                    key: "k".into(),
                    seconds: 5,
                },
            ),
            ("getttl k", Command::GetTtl { key: "k".into() }),
            ("rmttl k", Command::RemoveTtl { key: "k".into() }),
            (
                "upttl k 9",
                Command::UpdateTtl {
                    key: "k".into(),
                    seconds: 9,
                },
            ),
            ("list", Command::List),
            ("exit", Command::Exit),
        ];

        for (line, expected) in cases {
            assert_eq!(parse_command(line).unwrap(), expected, "line: {}", line);
        }
    }

    #[test]
    fn test_keyword_is_case_insensitive_arguments_are_not() {
        let cmd = parse_command("PuT MyKey MyValue").unwrap();
        assert_eq!(
            cmd,
            Command::Put {
                key: "MyKey".into(),
                value: Bytes::from("MyValue"),
            }
        );
        assert_eq!(
            parse_command("USE Prod").unwrap(),
            Command::Use { db: "Prod".into() }
        );
    }

    #[test]
    fn test_extra_whitespace_is_ignored() {
        assert_eq!(
            parse_command("  get   k  ").unwrap(),
            Command::Get { key: "k".into() }
        );
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(
            parse_command("put k"),
            Err(ParseError::WrongArity {
                usage: "put <key> <value>"
            })
        );
        assert_eq!(
            parse_command("keys extra"),
            Err(ParseError::WrongArity { usage: "keys" })
        );
        assert!(parse_command("use").is_err());
        assert!(parse_command("get a b").is_err());
    }

    #[test]
    fn test_invalid_ttl() {
        for bad in ["abc", "0", "-5", "1.5"] {
            let line = format!("setttl k {}", bad);
            assert!(
                matches!(parse_command(&line), Err(ParseError::InvalidTtl { .. })),
                "accepted ttl {}",
                bad
            );
        }
        assert!(matches!(
            parse_command("upttl k never"),
            Err(ParseError::InvalidTtl { usage: "upttl <key> <ttl>", .. })
        ));
    }

    #[test]
    fn test_ttl_upper_bound() {
        let max = MAX_TTL.as_secs();
        assert_eq!(
            parse_command(&format!("setttl k {}", max)),
            Ok(Command::SetTtl {
                key: "k".into(),
                seconds: max
            })
        );

        for line in [
            format!("setttl k {}", max + 1),
            format!("setttl k {}", u64::MAX),
            format!("upttl k {}", u64::MAX),
            "setttl k 99999999999999999999999".to_string(),
        ] {
            assert!(
                matches!(parse_command(&line), Err(ParseError::InvalidTtl { .. })),
                "accepted {}",
                line
            );
        }
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(
            parse_command("flushall"),
            Err(ParseError::UnknownCommand("flushall".into()))
        );
        assert_eq!(parse_command("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_needs_database() {
        assert!(!parse_command("use x").unwrap().needs_database());
        assert!(!parse_command("showdbs").unwrap().needs_database());
        assert!(parse_command("keys").unwrap().needs_database());
        assert!(parse_command("get k").unwrap().needs_database());
    }

    #[test]
    fn test_next_line_framing() {
        let mut buf = BytesMut::from(&b"get a\r\nput b c\nkeys"[..]);

        assert_eq!(next_line(&mut buf), Some(Bytes::from("get a")));
        assert_eq!(next_line(&mut buf), Some(Bytes::from("put b c")));
        assert_eq!(next_line(&mut buf), None);
        assert_eq!(&buf[..], b"keys");

        buf.extend_from_slice(b"\n");
        assert_eq!(next_line(&mut buf), Some(Bytes::from("keys")));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_next_line_empty_line() {
        let mut buf = BytesMut::from(&b"\r\n"[..]);
        assert_eq!(next_line(&mut buf), Some(Bytes::new()));
    }
}
