use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::ServiceError;
use crate::service::{AnalysisReply, ArchitectService, IdeasReply};
use crate::validation::{
    Field, IdeaForm, Violation, WorkflowForm, IDEA_FIELDS_MISSING_MESSAGE, WORKFLOW_MISSING_MESSAGE,
};

pub const ANALYZE_PATH: &str = "/analyze-architecture";
pub const IDEAS_PATH: &str = "/generate-ax-ideas";

pub fn build_router(service: ArchitectService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ]);

    Router::new()
        .route(ANALYZE_PATH, post(analyze_architecture).options(preflight))
        .route(IDEAS_PATH, post(generate_ax_ideas).options(preflight))
        .route("/health", get(|| async { "ok" }))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(service)
}

// Bare OPTIONS without CORS request headers still gets an empty 200.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Decode a JSON body whatever the declared content type. A body that is not
/// a JSON object of the expected shape is treated like missing fields.
fn decode_form<T: DeserializeOwned>(body: &Bytes, missing: Violation) -> Result<T, ServiceError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "request body did not decode");
        ServiceError::Validation(missing)
    })
}

async fn analyze_architecture(
    State(service): State<ArchitectService>,
    body: Bytes,
) -> Result<Json<AnalysisReply>, ServiceError> {
    let form: WorkflowForm = decode_form(
        &body,
        Violation::new(Field::Role, WORKFLOW_MISSING_MESSAGE),
    )?;
    let reply = service.analyze_workflow(&form).await?;
    Ok(Json(reply))
}

async fn generate_ax_ideas(
    State(service): State<ArchitectService>,
    body: Bytes,
) -> Result<Json<IdeasReply>, ServiceError> {
    let form: IdeaForm = decode_form(
        &body,
        Violation::new(Field::BusinessArea, IDEA_FIELDS_MISSING_MESSAGE),
    )?;
    let reply = service.generate_ideas(&form).await?;
    Ok(Json(reply))
}
