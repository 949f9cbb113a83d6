//! Process-liveness HTTP endpoint.
//!
//! The hosting platform probes the process over HTTP and recycles it when
//! nothing answers, so every request gets a `200 OK` regardless of method or
//! path.  Nothing else is served: the relay has no user-facing surface.

use axum::http::StatusCode;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

async fn keepalive() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

pub fn build_router() -> Router {
    Router::new()
        .fallback(keepalive)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router();

    info!(addr = %addr, "Starting liveness endpoint");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_any_path_answers_ok() {
        for uri in ["/", "/health", "/anything/at/all"] {
            let response = build_router()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_any_method_answers_ok() {
        let response = build_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/probe")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
