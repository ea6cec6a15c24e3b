use std::{convert::Infallible, time::Duration};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, body::Incoming, service::service_fn};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::{conn::auto::Builder as HyperBuilder, graceful::GracefulShutdown},
};
use tokio::{net::TcpListener, signal, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    cli::CommandArguments,
    error::{ServiceError, ServiceResult},
    metadata::{PKG_NAME, PKG_VERSION},
    routes::route,
};

/// Runtime settings for [`serve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Applies to request headers and to buffering the `/chat` body.
    pub read_timeout: Duration,
    /// How long in-flight connections may drain after shutdown starts.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&CommandArguments> for ServerConfig {
    fn from(args: &CommandArguments) -> Self {
        Self {
            read_timeout: Duration::from_secs(args.read_timeout_secs),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
        }
    }
}

/// Bind the configured address and serve until SIGINT or SIGTERM.
pub async fn start_server(args: CommandArguments) -> ServiceResult<()> {
    args.validate()?;
    let addr = args.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServiceError::Bind { addr, source })?;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });

    serve(listener, ServerConfig::from(&args), shutdown).await
}

/// Accept connections on `listener` until `shutdown` is cancelled, then drain.
pub async fn serve(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> ServiceResult<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!("Starting {PKG_NAME} v{PKG_VERSION} on {local_addr}");

    let mut builder = HyperBuilder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(config.read_timeout);

    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!("Accept error: {err}");
                        continue;
                    }
                };

                let read_timeout = config.read_timeout;
                let service = service_fn(move |request| handle(request, read_timeout));
                let conn = builder.serve_connection(TokioIo::new(stream), service);
                let conn = graceful.watch(conn.into_owned());
                tokio::spawn(async move {
                    if let Err(err) = conn.await {
                        tracing::debug!("Connection error from {peer}: {err}");
                    }
                });
            }
            _ = shutdown.cancelled() => {
                tracing::info!("Shutdown signal received, stopping server...");
                break;
            }
        }
    }

    drop(listener);

    tokio::select! {
        _ = graceful.shutdown() => {
            tracing::info!("All connections closed");
        }
        _ = tokio::time::sleep(config.shutdown_timeout) => {
            tracing::warn!(
                "Timed out after {:?} waiting for connections to close",
                config.shutdown_timeout
            );
        }
    }

    Ok(())
}

async fn handle(
    request: Request<Incoming>,
    read_timeout: Duration,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let reply = route(request, read_timeout).await;

    tracing::info!(
        %method,
        %path,
        status = reply.status.as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    Ok(reply.into_response())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
