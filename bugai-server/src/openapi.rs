//! OpenAPI document for BugAI server.

use utoipa::OpenApi;

use bugai_core::{AnalysisRecord, AnalysisRequest, AnalysisResult, Bug, HistoryEntry};

use crate::routes::{ClearHistoryResponse, ErrorResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::analyze,
        crate::routes::history_list,
        crate::routes::history_clear,
        crate::routes::openapi_json
    ),
    components(
        schemas(
            AnalysisRequest,
            AnalysisResult,
            AnalysisRecord,
            Bug,
            HistoryEntry,
            ClearHistoryResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "analysis", description = "Code analysis"),
        (name = "history", description = "Analysis history"),
        (name = "system", description = "System endpoints")
    )
)]
/// OpenAPI document for the BugAI server.
pub struct ApiDoc;
