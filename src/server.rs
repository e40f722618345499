//! HTTP server exposing `/info` and `/hello`.

use crate::consumer::ConsumerService;
use crate::error::{ConsumerError, Result};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Route a request to the consumer and render the outcome.
pub async fn dispatch(consumer: &ConsumerService, method: &Method, path: &str) -> Response<Full<Bytes>> {
    let result = match path {
        "/info" | "/hello" if *method != Method::GET => {
            Err(ConsumerError::MethodNotAllowed(method.to_string()))
        }
        "/info" => consumer
            .info()
            .await
            .map(|body| (body, "text/html; charset=utf-8")),
        "/hello" => consumer
            .hello()
            .await
            .map(|body| (body, "text/plain; charset=utf-8")),
        other => Err(ConsumerError::RouteNotFound(other.to_string())),
    };

    match result {
        Ok((body, content_type)) => build_response(StatusCode::OK, content_type, body.into()),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &ConsumerError) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
        "error": err.to_string(),
        "status": status.as_u16(),
    });
    build_response(status, "application/json", body.to_string().into())
}

fn build_response(status: StatusCode, content_type: &str, body: Bytes) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(body))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

async fn handle(
    req: Request<Incoming>,
    consumer: Arc<ConsumerService>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = dispatch(&consumer, &method, &path).await;

    let status = response.status().as_u16();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    if status >= 500 {
        warn!(%method, %path, status, elapsed_ms, "Request failed");
    } else {
        info!(%method, %path, status, elapsed_ms, "Request handled");
    }

    Ok(response)
}

/// Accept connections on `listener` until `shutdown` resolves.
///
/// Each connection is served on its own task; in-flight connections are left
/// to finish after the accept loop stops.
pub async fn serve<F>(listener: TcpListener, consumer: Arc<ConsumerService>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    info!(
        %addr,
        target_service = %consumer.target().service_name,
        "Courier listening"
    );

    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        };

        let io = TokioIo::new(stream);
        let consumer = consumer.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle(req, consumer.clone()));

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!(%peer, error = %err, "Error serving connection");
            }
        });
    }
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn listen<F>(addr: SocketAddr, consumer: Arc<ConsumerService>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let listener = TcpListener::bind(addr).await?;
    serve(listener, consumer, shutdown).await
}
