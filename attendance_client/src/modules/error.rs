use std::fmt;

// Cause reported by the positioning service when it cannot produce a fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationErrorKind {
    // The host refused access to the positioning service
    PermissionDenied,
    // No signal, service disabled or no usable fix reported
    PositionUnavailable,
    // The host gave up waiting for a fix
    Timeout,
}

impl fmt::Display for LocationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationErrorKind::PermissionDenied => write!(f, "permission denied"),
            LocationErrorKind::PositionUnavailable => write!(f, "position unavailable"),
            LocationErrorKind::Timeout => write!(f, "timeout"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationError {
    pub kind: LocationErrorKind,
    pub detail: String,
}

impl LocationError {
    pub fn new(kind: LocationErrorKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into() }
    }
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for LocationError {}

// Camera errors, raised either while opening the feed or while encoding a frame
#[derive(Debug, Clone, PartialEq)]
pub enum MediaError {
    // The host has no camera capability at all
    NoCamera(String),
    // The camera exists but access was refused
    AccessDenied(String),
    // The offscreen buffer could not be encoded
    EncodingError(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::NoCamera(err) => write!(f, "No camera available: {}", err),
            MediaError::AccessDenied(err) => write!(f, "Camera access denied: {}", err),
            MediaError::EncodingError(err) => write!(f, "Frame encoding error: {}", err),
        }
    }
}

impl std::error::Error for MediaError {}

// Network exchange errors. Anything here means no usable reply was obtained
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    // Request could not be built or sent, or no response arrived
    RequestError(String),
    // Error for JSON serialization of the request body
    JsonSerializationError(String),
    // Error for JSON deserialization of the reply body
    JsonDeserializationError(String),
    // Reply was JSON but did not have the expected shape
    MalformedReply(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::RequestError(err) => write!(f, "Request error: {}", err),
            TransportError::JsonSerializationError(err) => write!(f, "JSON serialization error: {}", err),
            TransportError::JsonDeserializationError(err) => write!(f, "JSON deserialization error: {}", err),
            TransportError::MalformedReply(err) => write!(f, "Malformed reply: {}", err),
        }
    }
}

impl std::error::Error for TransportError {}

// Every way a submission attempt can end short of a recorded attendance.
// Each variant is turned into exactly one notifier presentation by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionError {
    // No course selected, nothing was attempted
    ValidationWarning(String),
    // Camera could not be opened, or a frame could not be encoded
    MediaUnavailable(MediaError),
    // Positioning service failed, no request was sent
    LocationUnavailable(LocationError),
    // Request sent but no usable reply
    TransportFailure(TransportError),
    // Server answered with "error" or an unrecognized status
    ServerRejected(String),
    // Server answered with "warning"
    ServerWarning(String),
    // Another attempt was still running and overlapping attempts are refused
    AttemptInFlight,
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::ValidationWarning(err) => write!(f, "Validation warning: {}", err),
            SubmissionError::MediaUnavailable(err) => write!(f, "Media unavailable: {}", err),
            SubmissionError::LocationUnavailable(err) => write!(f, "Location unavailable: {}", err),
            SubmissionError::TransportFailure(err) => write!(f, "Transport failure: {}", err),
            SubmissionError::ServerRejected(msg) => write!(f, "Server rejected: {}", msg),
            SubmissionError::ServerWarning(msg) => write!(f, "Server warning: {}", msg),
            SubmissionError::AttemptInFlight => write!(f, "Another submission attempt is in flight"),
        }
    }
}

impl std::error::Error for SubmissionError {}

// Configuration loading errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    ReadError(String),
    ParseError(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadError(err) => write!(f, "Config read error: {}", err),
            ConfigError::ParseError(err) => write!(f, "Config parse error: {}", err),
            ConfigError::InvalidValue(err) => write!(f, "Invalid config value: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}
