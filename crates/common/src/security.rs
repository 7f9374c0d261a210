//! Input validation for values that end up in file paths.

use crate::{Result, SwitchboardError};

/// Longest session id accepted.
const MAX_SESSION_ID_LENGTH: usize = 128;

/// Validate a session id before it is used as a file name.
///
/// - Rejects empty ids and ids longer than 128 characters
/// - Rejects `..` and any character outside `[A-Za-z0-9_.-]`
pub fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        return Err(SwitchboardError::Config("Session id must not be empty".into()));
    }

    if session_id.len() > MAX_SESSION_ID_LENGTH {
        return Err(SwitchboardError::Config(format!(
            "Session id exceeds maximum length of {} characters",
            MAX_SESSION_ID_LENGTH
        )));
    }

    if session_id.contains("..") {
        return Err(SwitchboardError::Config(format!(
            "Session id '{}' contains '..' which is not allowed",
            session_id
        )));
    }

    if let Some(bad) = session_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(SwitchboardError::Config(format!(
            "Session id '{}' contains invalid character {:?}",
            session_id, bad
        )));
    }

    Ok(())
}
