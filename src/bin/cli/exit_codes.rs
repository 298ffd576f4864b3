//! Exit codes for the CLI tool.

use jarmod::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Nothing in the archive matched the requested modifications
pub const NO_CHANGES: i32 = 1;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// An entry could not be parsed
pub const BAD_ARCHIVE: i32 = 3;
/// A modification asked for something unrepresentable
pub const UNSUPPORTED: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    NoChanges,
    FatalError,
    BadArchive,
    Unsupported,
    IoError,
    UserInterrupt,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::NoChanges => NO_CHANGES,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::Unsupported => UNSUPPORTED,
            Self::IoError => IO_ERROR,
            Self::UserInterrupt => USER_INTERRUPT,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a jarmod error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error.root_cause() {
        Error::Cancelled => ExitCode::UserInterrupt,
        Error::Io(_) | Error::ArchiveReplaceFailed { .. } => ExitCode::IoError,
        Error::Zip(_) => ExitCode::BadArchive,
        e if e.is_corruption() => ExitCode::BadArchive,
        e if e.is_unsupported() => ExitCode::Unsupported,
        Error::InvalidRegex { .. } | Error::NoSuchRenameTarget { .. } => ExitCode::BadArgs,
        _ => ExitCode::FatalError,
    }
}
