//! The content site: shared state, table-driven dispatch and error pages.
//!
//! A request that no fixed route claims goes through [`Site::dispatch`],
//! which tries, in order, and stops at the first hit:
//!
//! 1. the redirect table (exact path) → `302` to the target
//! 2. the static namespace (`/static/…`) → the file, or not-found
//! 3. the post table (exact path) → the rendered post, or not-found
//! 4. not-found
//!
//! A redirect therefore shadows a static file or post with the same path.

mod admin;
mod public;

use std::sync::Arc;

use tracing::error;

use crate::access_log::{AccessLog, Clock, SystemClock};
use crate::auth::{self, REALM};
use crate::catalog::{CatalogStore, LoadReport};
use crate::error::ServeError;
use crate::handler::Outcome;
use crate::method::Method;
use crate::pagination::PAGE_PATH;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::settings::Settings;
use crate::status::Status;
use crate::storage::{DiskStorage, Storage};
use crate::template::{escape, Templates, Vars};

pub use public::{ARCHIVE_PATH, STATIC_PREFIX};

/// Everything a handler can reach.
pub struct Site {
    settings: Settings,
    storage: Arc<dyn Storage>,
    catalog: CatalogStore,
    templates: Templates,
    log: AccessLog,
}

impl Site {
    /// Builds the site over `storage` and loads the route tables.
    pub fn new(settings: Settings, storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        let log = if settings.log.enabled {
            AccessLog::new(Arc::clone(&storage), clock, settings.log.max_size)
        } else {
            AccessLog::disabled(Arc::clone(&storage), clock)
        };
        let site = Self {
            templates: Templates::new(Arc::clone(&storage)),
            catalog: CatalogStore::new(),
            settings,
            storage,
            log,
        };
        site.reload();
        site
    }

    /// A site over the settings' root directory, using the host clock.
    pub fn open(settings: Settings) -> Self {
        let storage = Arc::new(DiskStorage::new(settings.root.clone()));
        Self::new(settings, storage, Arc::new(SystemClock::new()))
    }

    pub fn settings(&self) -> &Settings { &self.settings }
    pub fn storage(&self) -> &dyn Storage { self.storage.as_ref() }
    pub fn catalog(&self) -> &CatalogStore { &self.catalog }
    pub fn templates(&self) -> &Templates { &self.templates }
    pub fn access_log(&self) -> &AccessLog { &self.log }

    /// Swaps in freshly loaded route tables.
    pub fn reload(&self) -> LoadReport {
        self.catalog.reload(self.storage.as_ref())
    }

    /// Whether `req` carries the configured admin credentials.
    pub fn authorized(&self, req: &Request) -> bool {
        let admin = &self.settings.admin;
        self.settings.admin_enabled()
            && auth::verify(req.header_value("authorization"), &admin.user, &admin.password)
    }

    /// Resolves a request against the redirect, static and post tables.
    pub fn dispatch(&self, req: &Request) -> Outcome {
        if !req.method().is_read() {
            return Err(ServeError::NotFound);
        }
        let catalog = self.catalog.snapshot();
        let path = req.path();

        if let Some(target) = catalog.redirect(path) {
            return Ok(Response::redirect(target));
        }
        if path.starts_with(STATIC_PREFIX) {
            return public::serve_static(self, req);
        }
        if let Some(post) = catalog.post(path) {
            return public::serve_post(self, req, post);
        }
        Err(ServeError::NotFound)
    }

    /// Turns a failed outcome into the response the client sees.
    pub fn reject(&self, req: &Request, err: ServeError) -> Response {
        match err {
            ServeError::NotFound => self.not_found(req),
            ServeError::Missing(message) => Response::builder()
                .status(Status::NotFound)
                .html(format!("<h1>{message}</h1>")),
            ServeError::AuthRequired => auth::challenge(REALM),
            ServeError::Storage { context, source } => {
                error!(path = req.path(), error = %source, "{context}");
                Response::builder()
                    .status(Status::InternalServerError)
                    .html(format!("<h1>Error: {context}</h1>"))
            }
            ServeError::EmptyPayload { path } => {
                let body = self.templates.render(
                    "admin-save-error.html",
                    &Vars::new().set("FILE_PATH", escape(&path)),
                );
                Response::builder().status(Status::InternalServerError).html(body)
            }
            ServeError::BadRequest(message) => Response::builder()
                .status(Status::BadRequest)
                .html(format!("<h1>Bad Request</h1><p>{}</p>", escape(&message))),
        }
    }

    /// The rendered `404.html`, access-logged.
    fn not_found(&self, req: &Request) -> Response {
        self.log.record(req, Status::NotFound);
        let body = self.templates.render("404.html", &Vars::new().set("TITLE", "Page Not Found"));
        Response::builder().status(Status::NotFound).html(body)
    }
}

/// The fixed routes: listing, archive and, when configured, the admin panel.
pub fn app(settings: &Settings) -> Router {
    let mut router = Router::new();
    for method in [Method::Get, Method::Head] {
        router = router
            .on(method, "/", public::home)
            .on(method, PAGE_PATH, public::page)
            .on(method, ARCHIVE_PATH, public::archive);
    }
    if settings.admin_enabled() {
        router = admin::mount(router);
    }
    router
}
