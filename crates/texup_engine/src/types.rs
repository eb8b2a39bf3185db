use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Upload attempt a command or event belongs to.
pub type Generation = u64;

/// File content handed to the conversion service.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    /// Event type; `message` when the server did not name one.
    pub event: String,
    pub data: String,
    /// Last event id seen on the stream, if any.
    pub id: Option<String>,
    /// Reconnection delay announced by the server, in milliseconds.
    pub retry: Option<u64>,
}

impl ServerEvent {
    pub const END: &'static str = "end";

    pub fn is_end(&self) -> bool {
        self.event == Self::END
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Uploaded {
        generation: Generation,
        result: Result<String, ClientError>,
    },
    Submitted {
        generation: Generation,
        result: Result<(), ClientError>,
    },
    PollTick {
        generation: Generation,
    },
    Status {
        generation: Generation,
        task: String,
        result: Result<String, ClientError>,
    },
    Downloaded {
        generation: Generation,
        result: Result<PathBuf, ClientError>,
    },
    Stream {
        generation: Generation,
        event: ServerEvent,
    },
    /// The stream finished: `Ok` carries the `end` event.
    StreamClosed {
        generation: Generation,
        result: Result<ServerEvent, ClientError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ClientError {}

/// Short, user-presentable failure category. `Display` never includes raw error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    InvalidRequest,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::TooLarge { max_bytes, actual } => match actual {
                Some(actual) => write!(f, "response too large ({actual} > {max_bytes} bytes)"),
                None => write!(f, "response too large (max {max_bytes} bytes)"),
            },
            FailureKind::Io => write!(f, "could not save file"),
        }
    }
}
