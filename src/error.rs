//! Error types.
//!
//! Two layers. [`Error`] surfaces infrastructure failures: reading the
//! settings file, binding a port, accepting a connection. [`ServeError`] is
//! the per-request failure a handler returns; the dispatcher turns every
//! variant into a response, so none of them ever reaches hyper.

use crate::storage::StorageError;

/// The error type returned by slate's fallible setup operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid bind address `{0}`")]
    Addr(String),
}

/// Why a request could not be served normally.
///
/// | Variant        | Status | Body                               |
/// |----------------|--------|------------------------------------|
/// | `NotFound`     | 404    | rendered `404.html`, access-logged |
/// | `Missing`      | 404    | minimal HTML                       |
/// | `AuthRequired` | 401    | challenge                          |
/// | `Storage`      | 500    | minimal HTML                       |
/// | `EmptyPayload` | 500    | rendered `admin-save-error.html`   |
/// | `BadRequest`   | 400    | minimal HTML                       |
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// Unmapped route or a missing post, asset or page.
    #[error("not found")]
    NotFound,

    /// An admin lookup failed; carries the message shown to the operator.
    #[error("{0}")]
    Missing(&'static str),

    #[error("authentication required")]
    AuthRequired,

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },

    /// A save arrived with no content.
    #[error("empty payload for `{path}`")]
    EmptyPayload { path: String },

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ServeError {
    pub(crate) fn storage(context: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Storage { context, source }
    }
}
