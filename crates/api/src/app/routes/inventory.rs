use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Extension, Query,
        rejection::{BytesRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use cutlery_inventory::EntryPayload;

use crate::app::{dto, errors, services::InventoryService};

pub fn router() -> Router {
    Router::new().route(
        "/inventory",
        get(list_entries)
            .post(create_entry)
            .put(update_entry)
            .delete(delete_entry)
            .fallback(errors::method_not_allowed),
    )
}

pub async fn list_entries(
    Extension(services): Extension<Arc<InventoryService>>,
    query: Result<Query<dto::ListQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rej) => return errors::rejection(rej.status(), rej.body_text()),
    };

    match services.list(query.venue.as_deref()).await {
        Ok(entries) => Json(dto::EntriesResponse { entries }).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_entry(
    Extension(services): Extension<Arc<InventoryService>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let payload = match parse_payload(body) {
        Ok(p) => p,
        Err(res) => return res,
    };

    match services.create(&payload).await {
        Ok(entry) => (
            StatusCode::CREATED,
            Json(dto::EntryResponse { entry: Some(entry) }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_entry(
    Extension(services): Extension<Arc<InventoryService>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let payload = match parse_payload(body) {
        Ok(p) => p,
        Err(res) => return res,
    };

    match services.update(&payload).await {
        Ok(entry) => Json(dto::EntryResponse { entry }).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_entry(
    Extension(services): Extension<Arc<InventoryService>>,
    query: Result<Query<dto::DeleteQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rej) => return errors::rejection(rej.status(), rej.body_text()),
    };

    match services.delete(query.id.as_deref()).await {
        Ok(()) => Json(dto::DeleteResponse { success: true }).into_response(),
        Err(e) => e.into_response(),
    }
}

fn parse_payload(body: Result<Bytes, BytesRejection>) -> Result<EntryPayload, Response> {
    let body = body.map_err(|rej| errors::rejection(rej.status(), rej.body_text()))?;
    EntryPayload::from_slice(&body).map_err(|e| errors::ServiceError::from(e).into_response())
}
