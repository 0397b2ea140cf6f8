//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The router keeps handlers of *different* types in one
//! `HashMap<Method, Tree>`, so each one is hidden behind a trait object:
//!
//! ```text
//! fn archive(site: &Site, req: &Request) -> Outcome<Response> { … }  ← you write this
//!        ↓ router.on(Method::Get, "/archive", archive)
//! archive.into_boxed_handler()                   ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(archive))                   ← stored as BoxedHandler
//!        ↓
//! handler.call(site, req)  at request time       ← one vtable dispatch
//! ```
//!
//! Handlers are synchronous. Storage access blocks, so the server runs the
//! whole dispatch on tokio's blocking pool rather than on a reactor thread.

use std::sync::Arc;

use crate::error::ServeError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::site::Site;

/// What a handler returns.
pub type Outcome<R = Response> = Result<R, ServeError>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, site: &Site, req: &Request) -> Outcome;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any function or closure of the shape
///
/// ```text
/// fn name(site: &Site, req: &Request) -> Result<impl IntoResponse, ServeError>
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, R> private::Sealed for F
where
    F: Fn(&Site, &Request) -> Outcome<R> + Send + Sync + 'static,
    R: IntoResponse,
{
}

impl<F, R> Handler for F
where
    F: Fn(&Site, &Request) -> Outcome<R> + Send + Sync + 'static,
    R: IntoResponse,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(&Site, &Request) -> Outcome<R>,
    R: IntoResponse,
{
    fn call(&self, site: &Site, req: &Request) -> Outcome {
        (self.0)(site, req).map(IntoResponse::into_response)
    }
}
