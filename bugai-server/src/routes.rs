//! HTTP handlers for BugAI server.

use std::path::{Path, PathBuf};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, delete, error, get, post, web};
use bugai_core::{AnalysisError, AnalysisRequest, AnalysisService, HISTORY_LIMIT};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::openapi::ApiDoc;

/// Body served at `/` when the landing page is missing.
pub const PLACEHOLDER_INDEX: &str =
    "<!doctype html><title>BugAI</title><h1>BugAI</h1><p>index.html not found</p>";

#[derive(Clone)]
/// Shared application state for handlers.
pub struct AppState {
    /// Analysis orchestration and history access.
    pub analysis: AnalysisService,
    /// Directory holding `index.html`.
    pub static_dir: PathBuf,
}

/// Error payload returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable failure detail.
    pub detail: String,
}

/// Response payload for clearing history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearHistoryResponse {
    /// Number of removed entries.
    pub deleted_count: usize,
}

fn error_response(err: &AnalysisError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ErrorResponse {
        detail: err.detail(),
    })
}

fn task_failed(err: error::BlockingError) -> HttpResponse {
    log::error!("blocking task failed: {err}");
    HttpResponse::InternalServerError().json(ErrorResponse {
        detail: format!("An unexpected error occurred: {err}"),
    })
}

/// JSON extractor settings: malformed or incomplete bodies answer 422.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::UnprocessableEntity().json(ErrorResponse {
            detail: err.to_string(),
        });
        error::InternalError::from_response(err, response).into()
    })
}

/// Register every BugAI route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig, static_dir: &Path) {
    cfg.app_data(json_config())
        .service(analyze)
        .service(history_list)
        .service(history_clear)
        .service(openapi_json)
        .service(index)
        .service(actix_files::Files::new("/static", static_dir));
}

#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Structured analysis", body = bugai_core::AnalysisResult),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Upstream, parsing, or store failure; upstream HTTP errors keep their status", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/api/analyze")]
/// Analyze submitted code with the upstream model.
pub async fn analyze(
    state: web::Data<AppState>,
    payload: web::Json<AnalysisRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    let service = state.analysis.clone();
    let result = web::block(move || service.analyze(&request)).await;

    match result {
        Ok(Ok(analysis)) => HttpResponse::Ok().json(analysis),
        Ok(Err(err)) => error_response(&err),
        Err(err) => task_failed(err),
    }
}

#[utoipa::path(
    get,
    path = "/api/history",
    responses(
        (status = 200, description = "Most recent analyses, newest first", body = [bugai_core::HistoryEntry]),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "history"
)]
#[get("/api/history")]
/// List the most recent history entries.
pub async fn history_list(state: web::Data<AppState>) -> impl Responder {
    let service = state.analysis.clone();
    match web::block(move || service.history(HISTORY_LIMIT)).await {
        Ok(Ok(entries)) => HttpResponse::Ok().json(entries),
        Ok(Err(err)) => error_response(&err),
        Err(err) => task_failed(err),
    }
}

#[utoipa::path(
    delete,
    path = "/api/history",
    responses(
        (status = 200, description = "History cleared", body = ClearHistoryResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "history"
)]
#[delete("/api/history")]
/// Delete every history entry.
pub async fn history_clear(state: web::Data<AppState>) -> impl Responder {
    let service = state.analysis.clone();
    match web::block(move || service.clear_history()).await {
        Ok(Ok(deleted_count)) => HttpResponse::Ok().json(ClearHistoryResponse { deleted_count }),
        Ok(Err(err)) => error_response(&err),
        Err(err) => task_failed(err),
    }
}

#[get("/")]
/// Serve the landing page.
pub async fn index(state: web::Data<AppState>) -> impl Responder {
    let path = state.static_dir.join("index.html");
    match web::block(move || std::fs::read_to_string(path)).await {
        Ok(Ok(body)) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Ok(Err(err)) => {
            log::warn!("landing page unavailable: {err}");
            HttpResponse::NotFound()
                .content_type("text/html; charset=utf-8")
                .body(PLACEHOLDER_INDEX)
        }
        Err(err) => task_failed(err),
    }
}

#[utoipa::path(
    get,
    path = "/api/openapi.json",
    responses(
        (status = 200, description = "OpenAPI document", body = serde_json::Value)
    ),
    tag = "system"
)]
#[get("/api/openapi.json")]
/// Serve the OpenAPI document.
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use bugai_core::{
        AnalysisResult, HistoryEntry, HistoryStore, MemoryHistoryStore, ModelClient,
        UpstreamError,
    };
    use std::sync::Arc;

    use crate::gemini::ScriptedModelClient;

    const FENCED_ANALYSIS: &str = "Sure, here you go.\n```json\n{\"bugs\":[{\"description\":\"Off by one\",\"line\":\"3\",\"severity\":\"medium\"}],\"suggestions\":[\"Add bounds checks\"],\"explanation\":\"Loop runs one step too far.\",\"correctedCode\":\"for i in range(n): pass\"}\n```";

    struct FailingModel(UpstreamError);

    impl ModelClient for FailingModel {
        fn generate(&self, _system: &str, _prompt: &str) -> Result<String, UpstreamError> {
            Err(self.0.clone())
        }
    }

    fn state_with(
        model: impl ModelClient + Send + Sync + 'static,
    ) -> (web::Data<AppState>, MemoryHistoryStore) {
        let store = MemoryHistoryStore::new();
        let state = web::Data::new(AppState {
            analysis: AnalysisService::new(Arc::new(model), Arc::new(store.clone())),
            static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"),
        });
        (state, store)
    }

    fn analyze_body() -> serde_json::Value {
        serde_json::json!({
            "code": "for i in range(n + 1):\n    items[i]",
            "language": "python",
            "languageMime": "text/x-python"
        })
    }

    macro_rules! app {
        ($state:expr) => {{
            let static_dir = $state.static_dir.clone();
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .configure(|cfg| configure(cfg, &static_dir)),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn analyze_returns_result_and_records_history() {
        let (state, store) = state_with(ScriptedModelClient::new(FENCED_ANALYSIS));
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(analyze_body())
            .to_request();
        let resp: AnalysisResult = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.bugs.len(), 1);
        assert_eq!(resp.bugs[0].line, Some(3));
        assert_eq!(resp.suggestions, vec!["Add bounds checks".to_string()]);
        assert_eq!(resp.corrected_code, "for i in range(n): pass");

        let req = test::TestRequest::get().uri("/api/history").to_request();
        let history: Vec<HistoryEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].language, "python");
        assert_eq!(history[0].bug_count, 1);
        assert_eq!(history[0].explanation_summary, "Loop runs one step too far....");
        assert_eq!(history[0].full_data.language_mime, "text/x-python");
        assert_eq!(store.list(HISTORY_LIMIT).expect("list").len(), 1);
    }

    #[actix_web::test]
    async fn history_uses_wire_field_names() {
        let (state, _store) = state_with(ScriptedModelClient::new(FENCED_ANALYSIS));
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(analyze_body())
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get().uri("/api/history").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let entry = &body[0];
        assert!(entry["explanation"].is_string());
        assert_eq!(entry["bugCount"], 1);
        assert_eq!(entry["fullData"]["code"], analyze_body()["code"]);
        assert_eq!(entry["fullData"]["bugs"][0]["severity"], "medium");
        assert_eq!(entry["id"], entry["timestamp"]);
    }

    #[actix_web::test]
    async fn unparseable_model_output_is_500_without_history() {
        let (state, store) = state_with(ScriptedModelClient::new(
            "Here is my analysis.\n\n```python\nprint('hi')\n```\n\nEnd of response.",
        ));
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(analyze_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.detail, bugai_core::EXTRACTION_DETAIL);
        assert!(store.list(HISTORY_LIMIT).expect("list").is_empty());
    }

    #[actix_web::test]
    async fn upstream_status_is_forwarded() {
        let (state, store) = state_with(FailingModel(UpstreamError::Http {
            status: 429,
            body: "quota exceeded".to_string(),
        }));
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(analyze_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.detail, "Upstream model error: quota exceeded");
        assert!(store.list(HISTORY_LIMIT).expect("list").is_empty());
    }

    #[actix_web::test]
    async fn upstream_transport_failure_is_500() {
        let (state, _store) = state_with(FailingModel(UpstreamError::Transport(
            "operation timed out".to_string(),
        )));
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(analyze_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.detail.contains("operation timed out"));
    }

    #[actix_web::test]
    async fn missing_field_is_422() {
        let (state, _store) = state_with(ScriptedModelClient::mock());
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(serde_json::json!({"code": "x = 1", "language": "python"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.detail.contains("languageMime"), "{}", body.detail);
    }

    #[actix_web::test]
    async fn clear_history_twice() {
        let (state, _store) = state_with(ScriptedModelClient::mock());
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(analyze_body())
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::delete().uri("/api/history").to_request();
        let first: ClearHistoryResponse = test::call_and_read_body_json(&app, req).await;
        let req = test::TestRequest::delete().uri("/api/history").to_request();
        let second: ClearHistoryResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(first.deleted_count, 1);
        assert_eq!(second.deleted_count, 0);
    }

    #[actix_web::test]
    async fn index_serves_landing_page() {
        let (state, _store) = state_with(ScriptedModelClient::mock());
        let app = app!(state);

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("BugAI"));
    }

    #[actix_web::test]
    async fn index_without_page_is_404_placeholder() {
        let store = MemoryHistoryStore::new();
        let state = web::Data::new(AppState {
            analysis: AnalysisService::new(
                Arc::new(ScriptedModelClient::mock()),
                Arc::new(store),
            ),
            static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("no-such-dir"),
        });
        let app = app!(state);

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = test::read_body(resp).await;
        assert_eq!(body, PLACEHOLDER_INDEX.as_bytes());
    }

    #[actix_web::test]
    async fn openapi_json_lists_api_paths() {
        let (state, _store) = state_with(ScriptedModelClient::mock());
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/openapi.json").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["paths"]["/api/analyze"]["post"].is_object());
        assert!(body["paths"]["/api/history"]["get"].is_object());
        assert!(body["paths"]["/api/history"]["delete"].is_object());
    }
}
