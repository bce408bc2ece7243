//! Error types for ldapgate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Input Errors
    #[error("Username cannot be null or empty.")]
    InvalidUsername,

    // Lookup Errors
    #[error("Username cannot be found in the directory.")]
    UserNotFound,

    /// Fault raised by the directory client. The text is the client's own message.
    #[error("{0}")]
    Directory(String),

    #[error("Cannot infer the SSL context related to the service.")]
    ServiceIdentityMissing,

    // Configuration Errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Internal Errors
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Wrap any directory client failure, keeping its message verbatim.
    pub fn directory(err: impl std::fmt::Display) -> Self {
        Error::Directory(err.to_string())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidUsername => "InvalidInput",
            Error::UserNotFound => "NameNotFound",
            Error::Directory(_) => "DirectoryFault",
            Error::ServiceIdentityMissing => "ServiceIdentityMissing",
            Error::InvalidArgument(_) => "InvalidConfiguration",
            Error::InternalError(_) => "InternalError",
            Error::Io(_) => "InternalError",
            Error::Other(_) => "InternalError",
        }
    }
}
