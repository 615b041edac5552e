//! Interactive console session on stdin/stdout.

use super::handler::{ConnectionError, ConnectionHandler, ConnectionStats};
use crate::commands::CommandHandler;
use crate::storage::Catalog;
use std::sync::Arc;

const PROMPT: &str = "> ";

const BANNER: &str = "TideKV interactive console\nType 'exit' to quit\n";

/// Runs one session against the local terminal until `exit` or end of input.
pub async fn run_console(
    catalog: Arc<Catalog>,
    stats: Arc<ConnectionStats>,
) -> Result<(), ConnectionError> {
    let stdio = tokio::io::join(tokio::io::stdin(), tokio::io::stdout());

    let result = ConnectionHandler::new(stdio, "console", CommandHandler::new(catalog), stats)
        .with_greeting(BANNER)
        .with_prompt(PROMPT)
        .run()
        .await;

    match result {
        // Ctrl+D on an empty line
        Err(ConnectionError::ClientDisconnected) => Ok(()),
        other => other,
    }
}
