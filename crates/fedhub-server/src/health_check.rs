//! 健康检查模块
//!
//! 提供 Kubernetes 探针使用的存活和就绪接口。

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

/// 健康检查路由
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/livez", get(plain_ok))
        .route("/readyz", get(plain_ok))
        .route("/actuator/health/liveness", get(status_up))
        .route("/actuator/health/readiness", get(status_up))
}

async fn plain_ok() -> &'static str {
    "ok"
}

async fn status_up() -> Json<Value> {
    Json(json!({"status": "UP"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_probes() {
        for path in ["/livez", "/readyz", "/actuator/health/liveness"] {
            let response = routes::<()>()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", path);
        }

        let response = routes::<()>()
            .oneshot(
                Request::get("/actuator/health/readiness")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(body.as_ref(), br#"{"status":"UP"}"#);
    }
}
