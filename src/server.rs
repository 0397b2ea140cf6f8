//! HTTP server and graceful shutdown.
//!
//! hyper owns the wire. Each request body is buffered (up to
//! `max_body_bytes`), turned into a [`Request`], and handed to the router on
//! tokio's blocking pool, because every handler reads and writes the content
//! directory synchronously and runs to completion.
//!
//! On SIGTERM or Ctrl-C the server stops accepting, lets in-flight
//! connections finish, and returns from [`Server::serve`].

use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::site::Site;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

/// What every connection task shares.
struct App {
    site: Site,
    router: Router,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use slate::Server;
    /// let server = Server::bind("0.0.0.0:8080").unwrap();
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr.parse().map_err(|_| Error::Addr(addr.to_owned()))?;
        Ok(Self { addr })
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, site: Site, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let app = Arc::new(App { site, router });

        info!(addr = %self.addr, "slate listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req, remote_addr).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("slate stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Buffers one request and produces one response. Every failure is turned
/// into a status code here, so hyper never sees an error.
async fn dispatch<B>(
    app: Arc<App>,
    req: hyper::Request<B>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = req.into_parts();

    let Ok(method) = parts.method.as_str().parse::<Method>() else {
        warn!(peer = %remote_addr, method = %parts.method, "unsupported method");
        return Ok(Response::status(Status::MethodNotAllowed).into_inner());
    };

    let limit = app.site.settings().max_body_bytes;
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!(peer = %remote_addr, limit, "request body too large");
            return Ok(Response::status(Status::ContentTooLarge).into_inner());
        }
        Err(e) => {
            warn!(peer = %remote_addr, "could not read request body: {e}");
            return Ok(Response::status(Status::BadRequest).into_inner());
        }
    };

    let uri = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let mut request = Request::new(method, uri).body(body).remote(remote_addr);
    request.headers = parts.headers.iter()
        .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
        .collect();

    let response = tokio::task::spawn_blocking(move || app.router.handle(&app.site, request))
        .await
        .unwrap_or_else(|e| {
            error!(peer = %remote_addr, "handler failed: {e}");
            Response::status(Status::InternalServerError)
        });

    debug!(peer = %remote_addr, %method, status = response.status_code().code(), "request served");
    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C only on Windows).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Outcome;
    use crate::site::tests::{site, site_with};

    const PEER: &str = "127.0.0.1:40000";

    fn app(site: Site) -> Arc<App> {
        let router = crate::site::app(site.settings()).on(Method::Get, "/boom", boom);
        Arc::new(App { site, router })
    }

    fn boom(_: &Site, _: &Request) -> Outcome {
        panic!("handler bug")
    }

    async fn send(app: Arc<App>, method: &str, uri: &str, body: &'static str) -> http::Response<Full<Bytes>> {
        let req = http::Request::builder()
            .method(method)
            .uri(uri)
            .header("user-agent", "test-client")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap();
        dispatch(app, req, PEER.parse().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn serves_through_the_router() {
        let (_dir, site) = site();
        let res = send(app(site), "GET", "/posts/two", "").await;
        assert_eq!(res.status(), http::StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("Second body."));
    }

    #[tokio::test]
    async fn peer_and_headers_reach_the_access_log() {
        let (_dir, site) = site();
        let app = app(site);
        send(Arc::clone(&app), "GET", "/posts/two", "").await;
        let lines = crate::site::tests::log_lines(&app.site);
        assert_eq!(lines, ["[2026-01-02 03:04:05] 127.0.0.1 - GET /posts/two - 200 - \"test-client\""]);
    }

    #[tokio::test]
    async fn unknown_method_is_refused() {
        let (_dir, site) = site();
        let res = send(app(site), "BREW", "/", "").await;
        assert_eq!(res.status(), http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let (_dir, site) = site_with(|s| s.max_body_bytes = 4);
        let app = app(site);
        let res = send(Arc::clone(&app), "POST", "/admin/save", "file=/posts/two.md&content=x").await;
        assert_eq!(res.status().as_u16(), 413);

        let res = send(app, "POST", "/nowhere", "abcd").await;
        assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn panicking_handler_becomes_500() {
        let (_dir, site) = site();
        let res = send(app(site), "GET", "/boom", "").await;
        assert_eq!(res.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bind_rejects_bad_addresses() {
        assert!(Server::bind("127.0.0.1:8080").is_ok());
        assert!(matches!(Server::bind("localhost"), Err(Error::Addr(_))));
    }
}
