use std::fmt;
use std::io;

use typebus_frame::FrameError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::PermissionDenied => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let code = match err {
        FrameError::InvalidPrefix { .. }
        | FrameError::InvalidPostfix { .. }
        | FrameError::UnknownTypeId(_)
        | FrameError::PayloadSizeMismatch { .. }
        | FrameError::HeaderRejected { .. }
        | FrameError::SyncLost => DATA_INVALID,
        FrameError::RegistryFull { .. }
        | FrameError::RegistrationAfterStart
        | FrameError::ResyncUnsupported
        | FrameError::PayloadTooLarge { .. } => USAGE,
        FrameError::Io(_) | FrameError::SinkClosed | FrameError::Bus(_) => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}
