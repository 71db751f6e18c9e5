//! HTTP surface over the person store.
//!
//! | Method | Path            | Success |
//! |--------|-----------------|---------|
//! | GET    | `/persons`      | 200, array of persons |
//! | POST   | `/persons`      | 201, `{status: "OK", message: "created"}` |
//! | PUT    | `/persons`      | 200, `{status: "OK", message: "updated"}` |
//! | DELETE | `/persons/{id}` | 200, `{status: "OK", message: "deleted"}` |
//!
//! Failures always answer with `{status: <kind>, message: <text>}`.

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get};
use axum::Router;
use tokio::net::TcpListener;
use tracing::Instrument;
use uuid::Uuid;

use crate::store::Store;

mod error;
mod handlers;

pub use error::{ApiError, StatusBody};

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Store,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/persons",
            get(handlers::list_persons)
                .post(handlers::create_person)
                .put(handlers::update_person),
        )
        .route("/persons/:id", delete(handlers::delete_person))
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

/// Binds `bind`, then serves until ctrl-c.
pub async fn serve(store: Store, bind: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        db = %store.path().display(),
        "serving persons api"
    );
    axum::serve(listener, router(AppState { store }))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn trace_request(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %Uuid::now_v7(),
    );
    async move {
        let response = next.run(request).await;
        tracing::info!(status = response.status().as_u16(), "handled");
        response
    }
    .instrument(span)
    .await
}
