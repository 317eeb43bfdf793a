use axum::{handler::HandlerWithoutStateExt, routing::get, Router};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::*;
use super::openapi::ApiDoc;

/// Create the application router
///
/// Fixed pages come from `public_dir`; any other path is looked up in
/// `public_dir` as a static asset and answers a JSON 404 if absent.
pub fn create_router(state: AppState, public_dir: &Path) -> Router {
    let static_assets =
        ServeDir::new(public_dir).not_found_service(not_found.into_service());

    Router::new()
        // Swagger UI for the JSON endpoints
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Data and status endpoints
        .route("/stocks.json", get(get_stocks_json))
        .route("/market-cap-status", get(get_market_cap_status))
        .with_state(state)
        .route("/health", get(health_check))
        .route("/favicon.ico", get(favicon))
        // HTML pages
        .route_service("/", ServeFile::new(public_dir.join("index.html")))
        .route_service("/flash-quiz", ServeFile::new(public_dir.join("flash-quiz.html")))
        .route_service(
            "/sp500-explorer",
            ServeFile::new(public_dir.join("sp500-explorer.html")),
        )
        .fallback_service(static_assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RefreshConfig;
    use crate::jobs::MarketCapRefresher;
    use crate::models::StockRecord;
    use crate::provider::testing::StaticProvider;
    use crate::provider::QuoteProvider;
    use crate::store::StockStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    struct TestApp {
        _dir: TempDir,
        stocks_path: std::path::PathBuf,
        router: Router,
    }

    fn test_app() -> TestApp {
        let dir = tempdir().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir(&public).unwrap();
        std::fs::write(public.join("index.html"), "<h1>index</h1>").unwrap();
        std::fs::write(public.join("flash-quiz.html"), "<h1>quiz</h1>").unwrap();
        std::fs::write(public.join("sp500-explorer.html"), "<h1>explorer</h1>").unwrap();
        std::fs::write(public.join("app.js"), "console.log(1);").unwrap();

        let stocks_path = dir.path().join("stocks.json");
        let refresher = Arc::new(MarketCapRefresher::new(
            Arc::new(StockStore::new(&stocks_path)),
            Arc::new(StaticProvider::new([("AAPL", Some(3.0e12))])) as Arc<dyn QuoteProvider>,
            RefreshConfig::default(),
        ));

        TestApp {
            router: create_router(refresher, &public),
            stocks_path,
            _dir: dir,
        }
    }

    async fn send_get(router: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    #[tokio::test]
    async fn test_html_pages() {
        let app = test_app();

        for (uri, expected) in [
            ("/", "<h1>index</h1>"),
            ("/flash-quiz", "<h1>quiz</h1>"),
            ("/sp500-explorer", "<h1>explorer</h1>"),
            ("/app.js", "console.log(1);"),
        ] {
            let (status, _, body) = send_get(&app.router, uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body, expected.as_bytes(), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_favicon_is_empty() {
        let app = test_app();
        let (status, _, body) = send_get(&app.router, "/favicon.ico").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = test_app();
        let (status, _, body) = send_get(&app.router, "/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_stocks_json_is_uncached() {
        let app = test_app();
        let (status, _, _) = send_get(&app.router, "/stocks.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        StockStore::new(&app.stocks_path)
            .save(&[StockRecord::new("AAPL")])
            .await
            .unwrap();

        let (status, headers, body) = send_get(&app.router, "/stocks.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "no-store, no-cache, must-revalidate"
        );
        assert_eq!(headers[header::EXPIRES], "0");

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json[0]["symbol"], "AAPL");
    }

    #[tokio::test]
    async fn test_status_without_file() {
        let app = test_app();
        let (status, _, body) = send_get(&app.router, "/market-cap-status").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["isUpdating"], false);
        assert_eq!(json["lastUpdate"], Value::Null);
        assert_eq!(json["hasValidData"], false);
    }

    #[tokio::test]
    async fn test_status_reads_file_on_each_request() {
        let app = test_app();
        let mut record = StockRecord::new("AAPL");
        record.market_cap = Some(3.0e12);
        StockStore::new(&app.stocks_path).save(&[record]).await.unwrap();

        let (_, _, body) = send_get(&app.router, "/market-cap-status").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["hasValidData"], true);

        std::fs::remove_file(&app.stocks_path).unwrap();
        let (_, _, body) = send_get(&app.router, "/market-cap-status").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["hasValidData"], false);
    }

    #[tokio::test]
    async fn test_health_and_openapi() {
        let app = test_app();
        let (status, _, body) = send_get(&app.router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");

        let (status, _, body) = send_get(&app.router, "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["paths"]["/market-cap-status"].is_object());
    }
}
