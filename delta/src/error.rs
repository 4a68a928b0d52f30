//! Error type shared by every delta operation.
//!
//! [`DeltaError`] is either a single classified failure carrying its callsite, an optional
//! detail string, an optional source error and a captured backtrace, or an aggregate of several
//! failures collected from concurrent workers.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use delta_config::shared::ValidationError;

/// Result alias used across the crate.
pub type DeltaResult<T> = Result<T, DeltaError>;

#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Error returned by sources, mergers, the prefix tree builder and the work queues.
#[derive(Debug, Clone)]
pub struct DeltaError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    /// Failures collected from several workers of one run.
    Many {
        errors: Vec<DeltaError>,
        location: &'static Location<'static>,
    },
}

/// Classification of a [`DeltaError`].
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Validation & Configuration Errors
    ValidationError,
    ConfigError,
    InvalidPageSize,
    InvalidPrefixNode,

    // Backend Errors
    SourceQueryFailed,
    SourceIoError,
    InvalidContinuationToken,
    InvalidData,
    MissingKeyField,

    // Serialization Errors
    SerializationError,
    DeserializationError,

    // State Errors
    InvalidState,
    QueueClosed,
    OperationCanceled,
    WorkerPanic,

    IoError,
    Unknown,
}

impl DeltaError {
    /// Returns the kind of this error, or of the first aggregated error.
    pub fn kind(&self) -> ErrorKind {
        match &self.repr {
            ErrorRepr::Single(payload) => payload.kind,
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(DeltaError::kind)
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns every kind contained in this error, flattening aggregates.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match &self.repr {
            ErrorRepr::Single(payload) => vec![payload.kind],
            ErrorRepr::Many { errors, .. } => errors.iter().flat_map(DeltaError::kinds).collect(),
        }
    }

    /// Returns the static description, or `None` for aggregates.
    pub fn description(&self) -> Option<&str> {
        match &self.repr {
            ErrorRepr::Single(payload) => Some(payload.description.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the dynamic detail, searching aggregated errors in order.
    pub fn detail(&self) -> Option<&str> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload.detail.as_deref(),
            ErrorRepr::Many { errors, .. } => errors.iter().find_map(DeltaError::detail),
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match &self.repr {
            ErrorRepr::Single(payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the location where the error was created.
    pub fn location(&self) -> &'static Location<'static> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches the error that caused this one. Ignored on aggregates.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        DeltaError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for DeltaError {
    /// Errors compare by kind, aggregates element-wise.
    fn eq(&self, other: &DeltaError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for DeltaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write_indented(f, "Detail:", detail)?;
                }

                let backtrace = payload.backtrace.to_string();
                if !backtrace.trim().is_empty() {
                    write_indented(f, "Backtrace:", &backtrace)?;
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                write!(
                    f,
                    "[Many] {} errors aggregated @ {}:{}:{}",
                    errors.len(),
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    write!(f, "\n  {}. {}", index + 1, lines.next().unwrap_or_default())?;
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

fn write_indented(f: &mut fmt::Formatter<'_>, header: &str, body: &str) -> fmt::Result {
    if body.trim().is_empty() {
        return write!(f, "\n  {header} <empty>");
    }

    write!(f, "\n  {header}")?;
    for line in body.lines() {
        write!(f, "\n    {line}")?;
    }

    Ok(())
}

impl error::Error for DeltaError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

impl From<(ErrorKind, &'static str)> for DeltaError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> DeltaError {
        DeltaError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

impl<D> From<(ErrorKind, &'static str, D)> for DeltaError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> DeltaError {
        DeltaError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates errors; a single error is returned unwrapped.
impl<E> From<Vec<E>> for DeltaError
where
    E: Into<DeltaError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> DeltaError {
        let location = Location::caller();
        let errors: Vec<DeltaError> = errors.into_iter().map(Into::into).collect();

        let errors = match <[DeltaError; 1]>::try_from(errors) {
            Ok([error]) => return error,
            Err(errors) => errors,
        };

        DeltaError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

impl From<std::io::Error> for DeltaError {
    #[track_caller]
    fn from(err: std::io::Error) -> DeltaError {
        let detail = err.to_string();
        DeltaError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Maps syntax and data failures to [`ErrorKind::DeserializationError`].
impl From<serde_json::Error> for DeltaError {
    #[track_caller]
    fn from(err: serde_json::Error) -> DeltaError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        DeltaError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Panicked tasks map to [`ErrorKind::WorkerPanic`], aborted ones to
/// [`ErrorKind::OperationCanceled`].
impl From<tokio::task::JoinError> for DeltaError {
    #[track_caller]
    fn from(err: tokio::task::JoinError) -> DeltaError {
        let (kind, description) = if err.is_panic() {
            (ErrorKind::WorkerPanic, "A worker panicked")
        } else {
            (ErrorKind::OperationCanceled, "A worker was cancelled")
        };

        let detail = err.to_string();
        DeltaError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

impl From<ValidationError> for DeltaError {
    #[track_caller]
    fn from(err: ValidationError) -> DeltaError {
        let kind = match err {
            ValidationError::PageSizeOutOfRange { .. } => ErrorKind::InvalidPageSize,
            ValidationError::WorkerCountZero(_) => ErrorKind::ValidationError,
        };

        let detail = err.to_string();
        DeltaError::from_components(
            kind,
            Cow::Borrowed("Invalid configuration"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
