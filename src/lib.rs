//! # slate
//!
//! A small blog server whose only database is a directory.
//!
//! ```text
//! site/
//! ├── config/routes.txt      /posts/hello|hello.md|Hello, world
//! ├── config/redirects.txt   /old-hello|/posts/hello
//! ├── posts/hello.md
//! ├── static/style.css
//! ├── templates/home.html    {{HEADER}} … {{POSTS}} {{PAGINATION}} … {{FOOTER}}
//! └── logs/access.log
//! ```
//!
//! ## Request flow
//!
//! Fixed routes come first: `/` and `/page?p=N` (paged listing), `/archive`
//! (every post) and, when a password is configured, `/admin/*` behind Basic
//! auth. Everything else is resolved against the reloadable tables in
//! this order: redirects, `/static/` files, post mappings, not-found.
//!
//! Handlers are plain synchronous functions. Storage access blocks and runs
//! to completion; the hyper server moves each dispatch onto tokio's blocking
//! pool. The route tables are swapped atomically on reload, so a request
//! always sees one consistent snapshot.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use slate::{site, Server, Settings, Site};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), slate::Error> {
//!     let settings = Settings::default();
//!     let router = site::app(&settings);
//!     let server = Server::bind(&settings.bind)?;
//!     server.serve(Site::open(settings), router).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod access_log;
pub mod auth;
pub mod catalog;
pub mod multipart;
pub mod pagination;
pub mod preview;
pub mod settings;
pub mod site;
pub mod storage;
pub mod template;

pub use error::{Error, ServeError};
pub use handler::{Handler, Outcome};
pub use method::Method;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use settings::Settings;
pub use site::Site;
pub use status::Status;
