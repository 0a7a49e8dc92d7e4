//! Stdin input utilities.

use std::io::{self, IsTerminal, Read};

/// Read a whole document from stdin.
///
/// Refuses to block on an interactive terminal: the document must be piped in.
pub fn read_stdin_document() -> Result<String, String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err("no document on stdin (pipe a file in, or pass a path)".to_string());
    }
    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .map_err(|e| format!("reading stdin: {}", e))?;
    Ok(buffer)
}
