use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::app::{errors, services::InventoryService};

pub fn router() -> Router {
    Router::new().route(
        "/backup",
        get(export_backup).fallback(errors::method_not_allowed),
    )
}

/// Full export as a downloadable, pretty-printed JSON file.
pub async fn export_backup(Extension(services): Extension<Arc<InventoryService>>) -> Response {
    let doc = match services.export_all().await {
        Ok(doc) => doc,
        Err(e) => return e.into_response(),
    };

    let body = match serde_json::to_string_pretty(&doc) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize backup");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialization_error",
                e.to_string(),
            );
        }
    };

    tracing::info!(total_records = doc.total_records, "backup exported");

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", doc.file_name()),
            ),
        ],
        body,
    )
        .into_response()
}
