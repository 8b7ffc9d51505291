use std::error::Error;
use std::fmt;
use std::io;

/// Enumeration of all possible errors that can occur in the media gate
#[derive(Debug)]
pub enum MediaGateError {
    Access(AccessError),
    Store(StoreError),
    Stream(StreamError),
    Mp4(Mp4Error),
    Other(io::Error),
}

/// File selection and permission errors
#[derive(Debug)]
pub enum AccessError {
    /// The user dismissed the interactive selection without picking a file
    NoFileSelected,
    /// The host denied or could not grant permission for a capability
    PermissionUnavailable { message: String },
}

/// Persistent capability store errors.
///
/// Indicates an unavailable or broken backing store, which is distinct from a
/// routine cache miss.
#[derive(Debug)]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct StreamError {
    pub message: String,
}

impl StreamError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// MP4 container specific errors
#[derive(Debug)]
pub enum Mp4Error {
    /// Input was exhausted before enough structure was parsed to describe it
    NotAContainer,
    /// The codec stores its parameter sets externally but no description box was found
    MissingCodecDescription { codec: String },
    /// Generic MP4 error with a descriptive message
    Error { message: String },
}

impl fmt::Display for MediaGateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaGateError::Access(err) => write!(f, "Access error: {}", err),
            MediaGateError::Store(err) => write!(f, "Store error: {}", err),
            MediaGateError::Stream(err) => write!(f, "Stream error: {}", err),
            MediaGateError::Mp4(err) => write!(f, "MP4 error: {}", err),
            MediaGateError::Other(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::NoFileSelected => write!(f, "No file selected"),
            AccessError::PermissionUnavailable { message } => {
                write!(f, "Permission unavailable: {}", message)
            }
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for Mp4Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mp4Error::NotAContainer => write!(f, "Not an MP4 container"),
            Mp4Error::MissingCodecDescription { codec } => {
                write!(f, "Cannot find codec description for {}", codec)
            }
            Mp4Error::Error { message } => write!(f, "{}", message),
        }
    }
}

impl Error for MediaGateError {}
impl Error for AccessError {}
impl Error for StoreError {}
impl Error for StreamError {}
impl Error for Mp4Error {}

// Conversion implementations
impl From<io::Error> for MediaGateError {
    fn from(err: io::Error) -> Self {
        MediaGateError::Other(err)
    }
}

impl From<AccessError> for MediaGateError {
    fn from(err: AccessError) -> Self {
        MediaGateError::Access(err)
    }
}

impl From<StoreError> for MediaGateError {
    fn from(err: StoreError) -> Self {
        MediaGateError::Store(err)
    }
}

impl From<StreamError> for MediaGateError {
    fn from(err: StreamError) -> Self {
        MediaGateError::Stream(err)
    }
}

impl From<Mp4Error> for MediaGateError {
    fn from(err: Mp4Error) -> Self {
        MediaGateError::Mp4(err)
    }
}

// Conversion to io::Error for embedders that speak io::Result
impl From<MediaGateError> for io::Error {
    fn from(err: MediaGateError) -> Self {
        io::Error::other(err)
    }
}

impl MediaGateError {
    /// True when the error is the user dismissing the file selection dialog.
    pub fn is_no_file_selected(&self) -> bool {
        matches!(self, MediaGateError::Access(AccessError::NoFileSelected))
    }

    /// True when the error indicates input that is not an MP4 container.
    pub fn is_not_a_container(&self) -> bool {
        matches!(self, MediaGateError::Mp4(Mp4Error::NotAContainer))
    }
}

// Type alias for Result with MediaGateError
pub type MediaGateResult<T> = Result<T, MediaGateError>;
