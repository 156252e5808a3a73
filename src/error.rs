use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("username '{0}' is already registered")]
    DuplicateUser(String),

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification callers map onto their own responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    StoreFailure,
}

impl TaskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) | Self::DuplicateUser(_) => ErrorKind::InvalidInput,
            Self::Locked(_) | Self::Io(_) | Self::Json(_) => ErrorKind::StoreFailure,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::TaskNotFound(_) => "task_not_found",
            Self::UserNotFound(_) => "user_not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::DuplicateUser(_) => "duplicate_user",
            Self::Locked(_) => "locked",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }

    /// Process exit code used by the binary.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::NotFound => 2,
            ErrorKind::InvalidInput => 3,
            ErrorKind::StoreFailure => 4,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
