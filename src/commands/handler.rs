//! Command Handler
//!
//! Executes parsed commands for one client session.
//!
//! ## Session State
//!
//! Each connection gets its own `CommandHandler`. The only state it keeps is
//! the name of the currently selected database; the catalog itself is shared.
//! A database selected here can be dropped by another session at any time,
//! so the handler looks it up again on every command.
//!
//! ## Supported Commands
//!
//! ### Catalog Commands
//! - `use <db>` - Select a database, creating it if needed
//! - `showdbs` - List databases
//! - `curdb` - Show the selected database
//! - `dropdb <db>` - Drop a database
//!
//! ### Key Commands
//! - `keys` - List keys
//! - `put <key> <value>` - Store a value
//! - `get <key>` - Fetch a value
//! - `getall` - Fetch every key and value
//! - `delete <key>` - Delete a key
//!
//! ### TTL Commands
//! - `setttl <key> <seconds>` - Attach a TTL to an existing key
//! - `getttl <key>` - Remaining seconds before expiry
//! - `rmttl <key>` - Remove a key's TTL
//! - `upttl <key> <seconds>` - Move an existing TTL
//! - `list` - Keys with a TTL, soonest expiry first

use crate::protocol::{Command, Reply};
use crate::storage::{Catalog, Database, StorageError};
use bytes::Bytes;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

const NO_DATABASE_SELECTED: &str =
    "No database selected. Use 'use <db>' to select or create a database.";

/// Executes commands on behalf of a single client session.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// The shared database directory
    catalog: Arc<Catalog>,
    /// Database chosen with `use`, if any
    current: Option<String>,
}

impl CommandHandler {
    /// Creates a new command handler with no database selected.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            current: None,
        }
    }

    /// Name of the selected database.
    pub fn current_database(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Executes a command and returns the reply to send back.
    pub fn execute(&mut self, command: Command) -> Reply {
        trace!(command = command.name(), db = ?self.current, "Executing command");

        match command {
            Command::Use { db } => self.cmd_use(db),
            Command::ShowDbs => self.cmd_showdbs(),
            Command::CurrentDb => self.cmd_curdb(),
            Command::DropDb { db } => self.cmd_dropdb(&db),
            Command::Exit => Reply::Bye,
            command => match self.selected() {
                Ok(db) => self.dispatch(&db, command),
                Err(reply) => reply,
            },
        }
    }

    /// Resolves the selected database through the catalog.
    fn selected(&self) -> Result<Arc<Database>, Reply> {
        let name = self
            .current
            .as_deref()
            .ok_or_else(|| Reply::error(NO_DATABASE_SELECTED))?;
        self.catalog.get(name).map_err(Reply::error)
    }

    /// Dispatches a database command to its handler.
    fn dispatch(&self, db: &Database, command: Command) -> Reply {
        match command {
            Command::Keys => self.cmd_keys(db),
            Command::Put { key, value } => self.cmd_put(db, key, value),
            Command::Get { key } => self.cmd_get(db, &key),
            Command::GetAll => self.cmd_getall(db),
            Command::Delete { key } => self.cmd_delete(db, &key),
            Command::SetTtl { key, seconds } => self.cmd_setttl(db, &key, seconds),
            Command::GetTtl { key } => self.cmd_getttl(db, &key),
            Command::RemoveTtl { key } => self.cmd_rmttl(db, &key),
            Command::UpdateTtl { key, seconds } => self.cmd_upttl(db, &key, seconds),
            Command::List => self.cmd_list(db),
            other => Reply::error(format!("'{}' is not a database command", other.name())),
        }
    }

    // ========================================================================
    // Catalog Commands
    // ========================================================================

    /// use <db>
    fn cmd_use(&mut self, name: String) -> Reply {
        let (_, created) = self.catalog.use_or_create(&name);
        let reply = if created {
            Reply::text(format!("Database not found. Created new database: {}", name))
        } else {
            Reply::text(format!("Using database: {}", name))
        };
        self.current = Some(name);
        reply
    }

    /// showdbs
    fn cmd_showdbs(&self) -> Reply {
        Reply::listing(
            "Available databases:",
            self.catalog.list(),
            "No databases found.",
        )
    }

    /// curdb
    fn cmd_curdb(&self) -> Reply {
        match &self.current {
            Some(name) => Reply::text(format!("Current database: {}", name)),
            None => Reply::text("No database selected. Use 'use <db>' to select a database."),
        }
    }

    /// dropdb <db>
    fn cmd_dropdb(&mut self, name: &str) -> Reply {
        if let Err(e) = self.catalog.drop_database(name) {
            return Reply::error(e);
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        Reply::text(format!("Database dropped: {}", name))
    }

    // ========================================================================
    // Key Commands
    // ========================================================================

    /// keys
    fn cmd_keys(&self, db: &Database) -> Reply {
        let mut keys = db.keys();
        keys.sort();
        Reply::listing("Keys in database:", keys, "No keys found in database.")
    }

    /// put <key> <value>
    fn cmd_put(&self, db: &Database, key: String, value: Bytes) -> Reply {
        let reply = format!("Value for '{}' set to: {}", key, display(&value));
        db.put(key, value);
        Reply::text(reply)
    }

    /// get <key>
    fn cmd_get(&self, db: &Database, key: &str) -> Reply {
        match db.get(key) {
            Ok(value) => Reply::text(format!("Value for '{}': {}", key, display(&value))),
            Err(e) => Reply::error(e),
        }
    }

    /// getall
    fn cmd_getall(&self, db: &Database) -> Reply {
        let mut entries: Vec<_> = db.get_all().into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Reply::listing(
            "Entries in database:",
            entries
                .iter()
                .map(|(key, value)| format!("{}: {}", key, display(value)))
                .collect(),
            "No entries found in database.",
        )
    }

    /// delete <key>
    fn cmd_delete(&self, db: &Database, key: &str) -> Reply {
        match db.delete(key) {
            Ok(()) => Reply::text(format!("Deleted key: {}", key)),
            Err(e) => Reply::error(e),
        }
    }

    // ========================================================================
    // TTL Commands
    // ========================================================================

    /// setttl <key> <seconds>
    fn cmd_setttl(&self, db: &Database, key: &str, seconds: u64) -> Reply {
        match db.set_ttl(key, Duration::from_secs(seconds)) {
            Ok(()) => Reply::text(format!("TTL for '{}' set to: {} seconds", key, seconds)),
            Err(e) => Reply::error(e),
        }
    }

    /// getttl <key>
    fn cmd_getttl(&self, db: &Database, key: &str) -> Reply {
        match db.get_ttl(key) {
            Ok(remaining) => Reply::text(format!(
                "TTL for '{}': {} seconds",
                key,
                whole_seconds(remaining)
            )),
            Err(e) => Reply::error(e),
        }
    }

    /// rmttl <key>
    fn cmd_rmttl(&self, db: &Database, key: &str) -> Reply {
        db.remove_ttl(key);
        Reply::text(format!("TTL removed for key: {}", key))
    }

    /// upttl <key> <seconds>
    fn cmd_upttl(&self, db: &Database, key: &str, seconds: u64) -> Reply {
        match db.update_ttl(key, Duration::from_secs(seconds)) {
            Ok(()) => Reply::text(format!("TTL updated for key: {} to {}", key, seconds)),
            Err(StorageError::KeyNotFound(_)) => {
                Reply::error(format!("no TTL set for key: {}", key))
            }
            Err(e) => Reply::error(e),
        }
    }

    /// list
    fn cmd_list(&self, db: &Database) -> Reply {
        Reply::listing(
            "Entries with TTL (soonest first):",
            db.list_with_ttl()
                .iter()
                .map(|(key, value)| format!("{}: {}", key, display(value)))
                .collect(),
            "No entries found in database.",
        )
    }
}

/// Renders a stored value for a text reply.
fn display(value: &Bytes) -> Cow<'_, str> {
    String::from_utf8_lossy(value)
}

/// Remaining time rounded up to whole seconds, so a fresh 5s TTL reads as 5.
fn whole_seconds(remaining: Duration) -> u64 {
    remaining
        .as_secs()
        .saturating_add(u64::from(remaining.subsec_nanos() > 0))
}
