use crate::tcp;
use hyper::body::{Body, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub header_read_timeout: Duration,
    pub graceful_shutdown_timeout: Duration,
}

/// Serves connections from `listener` until `shutdown` resolves,
/// then waits up to the graceful shutdown timeout for open connections to finish.
pub async fn run_simple_server<S, F, B>(
    mut listener: TcpListener,
    state: S,
    handle_req: F,
    config: ServerConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<(), io::Error>
where
    S: Send + Sync + 'static,
    F: for<'s> ServiceFn<'s, Request<Incoming>, S, Response<B>> + Copy + Send + 'static,
    B: Body + Send + 'static,
    <B as Body>::Data: Send,
    <B as Body>::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let state = Arc::new(state);

    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(config.header_read_timeout);

    let graceful = GracefulShutdown::new();
    let mut shutdown = pin!(shutdown);

    loop {
        let tcp = tokio::select! {
            tcp = tcp::accept(&mut listener) => tcp?,
            () = &mut shutdown => break,
        };
        let io = TokioIo::new(tcp);

        let state = Arc::clone(&state);
        let serve = service_fn(move |req| {
            let state = Arc::clone(&state);
            async move { Ok::<_, Infallible>(handle_req(req, &state).await) }
        });

        let conn = graceful.watch(builder.serve_connection_with_upgrades(io, serve).into_owned());
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                log::error!("Error serving connection: {}", e);
            }
        });
    }

    drop(listener);
    log::info!("Stopped accepting connections, draining open ones");

    tokio::select! {
        () = graceful.shutdown() => log::info!("All connections closed"),
        () = sleep(config.graceful_shutdown_timeout) => {
            log::warn!(
                "Connections still open after {}, exiting anyway",
                humantime::format_duration(config.graceful_shutdown_timeout)
            );
        }
    }

    Ok(())
}

// Work around the lack of HKT bounds.
// Because the future will borrow from the state argument, we need to write bounds like this:
// ```
// where
//     F: for<'s> FnOnce(Request<Body>, &'s S) -> Fut<'s>
//     Fut<'s>: Future<Output = Result<Response<B>, E>> + 's
// ```
// Which can't currently be done. Instead, factor both bounds out to a dedicated trait,
// which is implemented for all matching functions.
pub trait ServiceFn<'s, T, S, R>
where
    Self: FnOnce(T, &'s S) -> Self::Fut,
    Self::Fut: Future<Output = R> + Send + 's,
    S: 's,
{
    type Fut;
}

impl<'s, T, S, R, F, Fut> ServiceFn<'s, T, S, R> for F
where
    F: FnOnce(T, &'s S) -> Fut,
    Fut: Future<Output = R> + Send + 's,
    S: 's,
{
    type Fut = Fut;
}
