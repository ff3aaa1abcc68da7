//! HTTP/1 serving on Hyper and Tokio.
//!
//! Each accepted connection gets its own task. The request body is buffered
//! before the handler chain runs; the chain itself is synchronous, so it
//! runs on the blocking pool to keep slow handlers off the reactor.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use gantry_core::Response;

use crate::app::App;
use crate::config::{parse_addr, ServerConfig, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, Shutdown};

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS);

impl App {
    /// Binds `addr` and serves until Ctrl-C or `SIGTERM`.
    pub async fn serve(self, addr: &str) -> Result<(), ServerError> {
        let listener = bind(addr).await?;
        let shutdown = Shutdown::on_os_signal();
        self.serve_inner(listener, shutdown, DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Serves on the address from `config` until Ctrl-C or `SIGTERM`, then
    /// waits up to its shutdown timeout for open connections.
    pub async fn serve_config(self, config: &ServerConfig) -> Result<(), ServerError> {
        let listener = bind(config.http_addr()).await?;
        self.serve_inner(listener, Shutdown::on_os_signal(), config.shutdown_timeout())
            .await
    }

    /// Serves connections from `listener` until `signal` completes, then
    /// waits for open connections to finish.
    ///
    /// ```rust,no_run
    /// use gantry_server::Engine;
    /// use tokio::net::TcpListener;
    ///
    /// # async fn run() -> Result<(), gantry_server::ServerError> {
    /// let listener = TcpListener::bind("127.0.0.1:0").await?;
    /// let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    /// let server = tokio::spawn(
    ///     Engine::with_defaults()
    ///         .into_app()
    ///         .serve_with_shutdown(listener, async { let _ = rx.await; }),
    /// );
    /// tx.send(()).ok();
    /// server.await.ok();
    /// # Ok(())
    /// # }
    /// ```
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            signal.await;
            trigger.trigger();
        });
        self.serve_inner(listener, shutdown, DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    async fn serve_inner(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
        drain_timeout: Duration,
    ) -> Result<(), ServerError> {
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, routes = self.route_count(), "listening");

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let app = self.clone();
                        let guard = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(app, stream, remote, shutdown).await {
                                tracing::debug!(client = %remote, error = %e, "connection error");
                            }
                            drop(guard);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.wait() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        tracing::info!(
            active = tracker.active(),
            timeout_ms = u64::try_from(drain_timeout.as_millis()).unwrap_or(u64::MAX),
            "waiting for connections to close"
        );
        tokio::select! {
            () = tracker.drained() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(drain_timeout) => {
                tracing::warn!(active = tracker.active(), "shutdown timeout reached");
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    let addr = parse_addr(addr)?;
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

async fn serve_connection(
    app: App,
    stream: TcpStream,
    remote: SocketAddr,
    shutdown: Shutdown,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let app = app.clone();
        async move { Ok::<_, Infallible>(handle_request(app, req, remote).await) }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.wait() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

async fn handle_request(app: App, req: Request<Incoming>, remote: SocketAddr) -> Response {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(client = %remote, error = %e, "failed to read request body");
            return plain(StatusCode::BAD_REQUEST, "400 bad request");
        }
    };

    let request = Request::from_parts(parts, body);
    match tokio::task::spawn_blocking(move || app.dispatch_from(request, Some(remote))).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(client = %remote, error = %e, "dispatch task failed");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "500 internal server error")
        }
    }
}

fn plain(status: StatusCode, text: &'static str) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from_static(text.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
