use std::sync::Arc;

use axum::{
    Extension, Router,
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    collector::Collector,
    config::{HTTP_HOST, HTTP_PORT},
    errors::{self, Errors},
    os::handle_shutdown,
};

pub fn router(collector: Arc<Collector>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/v1/system/info", get(get_static_info))
        .route("/api/v1/system/live", get(get_live_status))
        .layer(Extension(collector))
}

pub async fn run_server(collector: Arc<Collector>) -> errors::Result<()> {
    let app = router(collector);

    let addr = format!("{}:{}", *HTTP_HOST, *HTTP_PORT);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Errors::ServerBindError(format!("Failed to bind {}: {}", addr, e)))?;

    log::info!("HTTP Server is running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(handle_shutdown())
        .await
        .map_err(|e| Errors::ServerError(e.to_string()))?;

    Ok(())
}

async fn root() -> &'static str {
    "OK"
}

fn build_response(status: StatusCode, content_type: &str, body: String) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap_or_else(|error| {
            log::error!("Error building response: {}", error);
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}

fn error_response(error: Errors) -> Response {
    log::error!("Error serving request: {}", error);
    build_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "text/plain; charset=utf-8",
        error.to_string(),
    )
}

fn json_response<T: serde::Serialize>(value: errors::Result<T>) -> Response {
    let body = value.and_then(|value| {
        serde_json::to_string(&value).map_err(|e| Errors::SerializeError(e.to_string()))
    });

    match body {
        Ok(body) => build_response(StatusCode::OK, "application/json", body),
        Err(error) => error_response(error),
    }
}

// Collection reads /proc and sysinfo synchronously, so it runs off the async workers.
async fn collect<T, F>(collector: Arc<Collector>, read: F) -> errors::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Collector) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || read(&collector))
        .await
        .map_err(|e| Errors::TaskJoinError(e.to_string()))
}

async fn get_static_info(Extension(collector): Extension<Arc<Collector>>) -> impl IntoResponse {
    let info = collect(collector, Collector::static_info).await;

    json_response(info)
}

async fn get_live_status(Extension(collector): Extension<Arc<Collector>>) -> impl IntoResponse {
    let status = collect(collector, Collector::live_status).await;

    json_response(status)
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, path::PathBuf, time::Instant};

    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::collector::model::{LiveStatusResponse, StaticInfoResponse};

    fn test_router(disk_paths: Vec<PathBuf>) -> Router {
        router(Arc::new(Collector::new(disk_paths)))
    }

    async fn send_get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn parse_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap_or_else(|e| panic!("Expected valid JSON body: {e}"))
    }

    fn assert_json_content_type(response: &Response) {
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        assert!(
            content_type.starts_with("application/json"),
            "Expected application/json content-type, got: {content_type}"
        );
    }

    #[tokio::test]
    async fn test_root() {
        let response = send_get(test_router(vec![PathBuf::from("/")]), "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_static_info_schema() {
        let response = send_get(test_router(vec![PathBuf::from("/")]), "/api/v1/system/info").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_json_content_type(&response);

        let json = parse_json(response).await;
        for field in ["os", "hostname", "distribution"] {
            assert!(json["system_info"][field].is_string(), "missing system_info.{field}: {json}");
        }
        assert!(json["hardware_info"]["cpu_model"].is_string());
        assert!(json["hardware_info"]["cpu_cores"].is_u64());
        assert!(json["hardware_info"]["total_memory_gb"].is_f64());
        assert!(json["hardware_info"]["total_disk_gb"].is_f64());
        assert!(json["hardware_info"]["disk_partitions"].is_array());

        let info: StaticInfoResponse = serde_json::from_value(json).unwrap();
        for partition in info.hardware_info.disk_partitions {
            assert!((0.0..=100.0).contains(&partition.percent));
        }
    }

    #[tokio::test]
    async fn test_static_info_missing_disk_path() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(vec![dir.path().join("gone")]);

        let response = send_get(app, "/api/v1/system/info").await;

        assert_eq!(response.status(), StatusCode::OK);
        let info: StaticInfoResponse = serde_json::from_value(parse_json(response).await).unwrap();
        assert!(info.hardware_info.disk_partitions.is_empty());
        assert_eq!(info.hardware_info.total_disk_gb, 0.0);
    }

    #[tokio::test]
    async fn test_live_status_schema() {
        let response = send_get(test_router(vec![PathBuf::from("/")]), "/api/v1/system/live").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_json_content_type(&response);

        let json = parse_json(response).await;
        for field in ["one_min", "five_min", "fifteen_min"] {
            assert!(json["load_average"][field].is_f64(), "missing load_average.{field}: {json}");
        }
        assert!(json["network_io"]["bytes_sent_total"].is_u64());
        assert!(json["network_io"]["bytes_recv_total"].is_u64());
        assert!(json["uptime"].is_string());

        let status: LiveStatusResponse = serde_json::from_value(json).unwrap();
        for percent in [status.cpu_percent, status.memory_percent, status.disk_percent] {
            assert!((0.0..=100.0).contains(&percent), "out of range: {percent}");
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = send_get(test_router(vec![PathBuf::from("/")]), "/api/v1/system/other").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_json_response_serialize_failure() {
        // serde_json only accepts string-like map keys.
        let mut unsupported = BTreeMap::new();
        unsupported.insert(vec![1u8, 2], 3u8);

        let response = json_response(Ok(unsupported));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/plain"));
    }

    #[tokio::test]
    async fn test_json_response_join_failure() {
        let joined = tokio::task::spawn_blocking(|| -> u8 { panic!("collection failed") })
            .await
            .map_err(|e| Errors::TaskJoinError(e.to_string()));

        let response = json_response(joined);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_live_status_concurrent_requests() {
        let app = test_router(vec![PathBuf::from("/")]);
        let started = Instant::now();

        let requests: Vec<_> = (0..8)
            .map(|_| {
                let app = app.clone();
                tokio::spawn(async move { send_get(app, "/api/v1/system/live").await.status() })
            })
            .collect();

        for request in requests {
            assert_eq!(request.await.unwrap(), StatusCode::OK);
        }

        // Requests share the CPU sampling wait instead of queueing behind each other.
        assert!(
            started.elapsed() < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL * 4,
            "took {:?}",
            started.elapsed()
        );
    }
}
