use core::fmt;

/// Category of an exchange failure.
///
/// The numeric value is the code carried by a `Status` frame, `0` being
/// reserved for success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// The connection or the logical stream is gone.
    Unavailable = 1,
    /// The call ran past its deadline.
    DeadlineExceeded = 2,
    /// The caller gave up on the call.
    Cancelled = 3,
    /// A peer broke the exchange rules (send after close, read after end, bad frame).
    ProtocolViolation = 4,
    /// The handler failed.
    Internal = 5,
}

impl ErrorKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Unavailable),
            2 => Some(Self::DeadlineExceeded),
            3 => Some(Self::Cancelled),
            4 => Some(Self::ProtocolViolation),
            5 => Some(Self::Internal),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unavailable => write!(f, "Unavailable"),
            ErrorKind::DeadlineExceeded => write!(f, "Deadline exceeded"),
            ErrorKind::Cancelled => write!(f, "Cancelled"),
            ErrorKind::ProtocolViolation => write!(f, "Protocol violation"),
            ErrorKind::Internal => write!(f, "Internal error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    detail: String,
}

impl Error {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Error {
            kind,
            detail: detail.into(),
        }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, detail)
    }

    pub fn deadline_exceeded() -> Self {
        Self::new(ErrorKind::DeadlineExceeded, "call deadline elapsed")
    }

    pub fn cancelled(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, detail)
    }

    pub fn protocol(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProtocolViolation, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, detail)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.detail)
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        match err.kind() {
            std::io::ErrorKind::TimedOut => Error::new(ErrorKind::DeadlineExceeded, err.to_string()),
            // A half-close in the middle of a frame.
            std::io::ErrorKind::UnexpectedEof => Error::protocol("stream closed inside a frame"),
            _ => Error::unavailable(err.to_string()),
        }
    }
}

impl From<yamux::ConnectionError> for Error {
    fn from(err: yamux::ConnectionError) -> Error {
        Error::unavailable(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Error {
        Error::deadline_exceeded()
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        for kind in [
            ErrorKind::Unavailable,
            ErrorKind::DeadlineExceeded,
            ErrorKind::Cancelled,
            ErrorKind::ProtocolViolation,
            ErrorKind::Internal,
        ] {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code(0), None);
        assert_eq!(ErrorKind::from_code(42), None);
    }

    #[test]
    fn test_io_error_mapping() {
        let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        assert_eq!(Error::from(eof).kind(), ErrorKind::ProtocolViolation);

        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        assert_eq!(Error::from(reset).kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_display() {
        assert_eq!(Error::internal("boom").to_string(), "Internal error: boom");
        assert_eq!(
            Error::new(ErrorKind::Cancelled, "").to_string(),
            "Cancelled"
        );
    }
}
