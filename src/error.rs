//! Error types for ipsetctl.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::binary::IpsetVersion;

/// The ipset command an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Flush,
    Add,
    Del,
    Test,
    List,
    Names,
    Destroy,
    Swap,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Flush => "flush",
            Operation::Add => "add",
            Operation::Del => "del",
            Operation::Test => "test",
            Operation::List => "list",
            Operation::Names => "list names",
            Operation::Destroy => "destroy",
            Operation::Swap => "swap",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an ipset invocation did not succeed.
#[derive(Error, Debug)]
pub enum ProcessFailure {
    #[error("failed to spawn: {0}")]
    Spawn(#[from] io::Error),

    #[error("exit status {}", exit_code_text(.code))]
    Exit { code: Option<i32> },
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "unknown (signal)".to_string(),
    }
}

fn trimmed(output: &str) -> &str {
    output.trim_end()
}

#[derive(Error, Debug)]
pub enum IpsetError {
    #[error("ipset utility not found in PATH")]
    ExecutableNotFound,

    #[error("ipset utility version {found} is not supported, requiring version >= {minimum}")]
    UnsupportedVersion {
        found: IpsetVersion,
        minimum: IpsetVersion,
    },

    #[error("could not determine ipset version: {0}")]
    VersionIndeterminate(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `output` holds the combined output exactly as captured; only the
    /// message trims trailing whitespace.
    #[error("ipset {operation} {target} failed: {failure} ({})", trimmed(.output))]
    CommandFailed {
        operation: Operation,
        target: String,
        #[source]
        failure: ProcessFailure,
        output: String,
    },
}

impl IpsetError {
    pub(crate) fn command_failed(
        operation: Operation,
        target: impl Into<String>,
        failure: ProcessFailure,
        output: impl Into<String>,
    ) -> Self {
        IpsetError::CommandFailed {
            operation,
            target: target.into(),
            failure,
            output: output.into(),
        }
    }

    /// Captured ipset output, if this error came from a command.
    pub fn output(&self) -> Option<&str> {
        match self {
            IpsetError::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IpsetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_embeds_output() {
        let err = IpsetError::command_failed(
            Operation::Add,
            "blocklist 10.0.0.1",
            ProcessFailure::Exit { code: Some(1) },
            "ipset v7.15: The set with the given name does not exist\n",
        );
        let msg = err.to_string();
        assert_eq!(
            msg,
            "ipset add blocklist 10.0.0.1 failed: exit status 1 \
             (ipset v7.15: The set with the given name does not exist)"
        );
        assert_eq!(
            err.output(),
            Some("ipset v7.15: The set with the given name does not exist\n")
        );
    }

    #[test]
    fn test_command_failed_keeps_output_verbatim() {
        let raw = "Warning: 10.0.0.1 is in set blocklist.\nipset v7.15: Kernel error received\n\n";
        let err = IpsetError::command_failed(
            Operation::Test,
            "blocklist 10.0.0.1",
            ProcessFailure::Exit { code: Some(1) },
            raw,
        );
        assert_eq!(err.output(), Some(raw));
        assert!(err.to_string().ends_with("Kernel error received)"));
    }

    #[test]
    fn test_spawn_failure_message() {
        let err = IpsetError::command_failed(
            Operation::Names,
            "all sets",
            ProcessFailure::Spawn(io::Error::new(io::ErrorKind::NotFound, "no such file")),
            "",
        );
        assert!(err.to_string().contains("failed to spawn: no such file"));
    }

    #[test]
    fn test_exit_without_code() {
        let failure = ProcessFailure::Exit { code: None };
        assert_eq!(failure.to_string(), "exit status unknown (signal)");
    }

    #[test]
    fn test_unsupported_version_message() {
        let err = IpsetError::UnsupportedVersion {
            found: IpsetVersion::new(5, 9, 0),
            minimum: IpsetVersion::MINIMUM,
        };
        assert_eq!(
            err.to_string(),
            "ipset utility version 5.9.0 is not supported, requiring version >= 6.0.0"
        );
        assert!(err.output().is_none());
    }
}
