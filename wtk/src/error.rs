//! Wtk error handling.

use std::fmt;

/// A specialized [`Result`] type for windowing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for all the window and context operations.
#[derive(Debug, Clone)]
pub struct Error {
    /// The raw code of the underlying error.
    raw_code: Option<i64>,

    /// The raw message from the os in case it could be obtained.
    raw_os_message: Option<String>,

    /// The simplified error kind to handle matching.
    kind: ErrorKind,
}

impl Error {
    #[allow(dead_code)]
    pub(crate) fn new(
        raw_code: Option<i64>,
        raw_os_message: Option<String>,
        kind: ErrorKind,
    ) -> Self {
        Self { raw_code, raw_os_message, kind }
    }

    /// Build an error from the calling thread's last OS error.
    #[allow(dead_code)]
    pub(crate) fn last_os_error(kind: ErrorKind) -> Self {
        let err = std::io::Error::last_os_error();
        Self::new(err.raw_os_error().map(i64::from), Some(err.to_string()), kind)
    }

    /// Helper to check that error is [`ErrorKind::NotSupported`].
    #[inline]
    pub fn not_supported(&self) -> bool {
        matches!(&self.kind, ErrorKind::NotSupported(_))
    }

    /// Whether the error happened while bootstrapping the native backend,
    /// rather than while building a particular window.
    #[inline]
    pub fn is_bootstrap_failure(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NotFound | ErrorKind::InitializationFailed | ErrorKind::NotSupported(_)
        )
    }

    /// The underlying error kind.
    #[inline]
    pub fn error_kind(&self) -> ErrorKind {
        self.kind
    }

    /// The underlying raw code in case it's present.
    #[inline]
    pub fn raw_code(&self) -> Option<i64> {
        self.raw_code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw_code) = self.raw_code {
            write!(f, "[{raw_code:x}] ")?;
        }

        let msg = if let Some(raw_os_message) = self.raw_os_message.as_ref() {
            raw_os_message
        } else {
            self.kind.as_str()
        };

        write!(f, "{msg}")
    }
}

impl std::error::Error for Error {}

/// Build an error with just a kind.
impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { raw_code: None, raw_os_message: None, kind }
    }
}

/// A list specifying general categories of native windowing errors.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// The native display, library or a required symbol in it wasn't found.
    NotFound,

    /// Failed to bootstrap the native backend.
    InitializationFailed,

    /// Can't access a requested resource.
    ///
    /// For example when the context can't be made current.
    BadAccess,

    /// No pixel format or framebuffer config matched the request.
    BadConfig,

    /// The context couldn't be created or is no longer valid.
    BadContext,

    /// The display connection is no longer valid.
    BadDisplay,

    /// The native window couldn't be created or is invalid.
    BadNativeWindow,

    /// The drawing surface of the window is invalid.
    BadSurface,

    /// The operation is not supported by the platform.
    NotSupported(&'static str),

    /// The misc error that can't be classified occurred.
    Misc,
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match *self {
            NotFound => "not found",
            InitializationFailed => "initialization failed",
            BadAccess => "access to the resource failed",
            BadConfig => "no matching pixel format or framebuffer config",
            BadContext => "argument does not name a valid context",
            BadDisplay => "argument does not name a valid display",
            BadNativeWindow => "argument does not refer to a valid native window",
            BadSurface => "argument does not name a valid surface",
            NotSupported(reason) => reason,
            Misc => "misc platform error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_os_message() {
        let err = Error::new(Some(0x1f), Some("BadMatch".into()), ErrorKind::BadContext);
        assert_eq!(err.to_string(), "[1f] BadMatch");

        let err: Error = ErrorKind::BadConfig.into();
        assert_eq!(err.to_string(), ErrorKind::BadConfig.as_str());
    }

    #[test]
    fn bootstrap_kinds() {
        assert!(Error::from(ErrorKind::NotFound).is_bootstrap_failure());
        assert!(Error::from(ErrorKind::NotSupported("no glx")).is_bootstrap_failure());
        assert!(!Error::from(ErrorKind::BadNativeWindow).is_bootstrap_failure());
    }
}
