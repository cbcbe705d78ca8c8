use thiserror::Error;

/// Errors reported synchronously by [`ExpiringCache`](crate::cache::ExpiringCache).
///
/// Missing and expired keys are not errors; reads return `None` for those.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors raised while decoding RESP frames.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("not a known frame type: {0:?}")]
    UnknownType(char),

    #[error("invalid integer {0:?}")]
    InvalidInteger(String),

    #[error("invalid length {0}")]
    InvalidLength(i64),

    #[error("bulk string not terminated by CRLF")]
    MissingTerminator,

    #[error("line longer than {0} bytes")]
    LineTooLong(usize),

    #[error("arrays nested deeper than {0} levels")]
    TooDeep(usize),

    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Errors raised while turning a frame into a command.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("expected an array of bulk strings")]
    UnexpectedFormat,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    #[error("syntax error")]
    Syntax,

    #[error("value is not an integer or out of range")]
    NotAnInteger,

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Errors raised while building a [`Config`](crate::config::Config).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("default TTL must be greater than zero")]
    ZeroDefaultTtl,

    #[error("sweep interval must be greater than zero")]
    ZeroSweepInterval,
}
