/// Result alias that carries the custom [`AutopauseError`] type.
pub type Result<T> = std::result::Result<T, AutopauseError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum AutopauseError {
    /// Free-form failure that does not warrant its own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON in the ignore-list store or the config file.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// The managed player rejected or never received a command.
    #[error(transparent)]
    Control(#[from] ControlError),
}

impl AutopauseError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for AutopauseError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for AutopauseError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

/// Failure to dispatch a command to the managed player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// The scripting host could not be launched at all.
    #[error("failed to launch `{program}`: {reason}")]
    Spawn { program: String, reason: String },
    /// The script ran but reported a failure.
    #[error("`{command}` exited with status {status}: {stderr}")]
    Script {
        command: String,
        status: i32,
        stderr: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_errors_convert_transparently() {
        let err: AutopauseError = ControlError::Script {
            command: "pause".into(),
            status: 1,
            stderr: "Spotify got an error".into(),
        }
        .into();

        let text = err.to_string();
        assert!(text.contains("pause"));
        assert!(text.contains("Spotify got an error"));
    }
}
