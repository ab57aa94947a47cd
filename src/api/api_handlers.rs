use std::collections::HashMap;

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use tracing::{Span, error};

use crate::api::api_objects::TransferRecord;
use crate::error::ApiError;
use crate::scheduler::TransferEngine;
use crate::transfer_objects::TransferKind;

/// Query parameter whose presence, with any value, makes a trigger request
/// return without waiting for the transfer.
pub const NON_BLOCKING_KEY: &str = "non-blocking";

pub type TransferQuery = web::Query<HashMap<String, String>>;

fn is_non_blocking(query: &TransferQuery) -> bool {
    query.contains_key(NON_BLOCKING_KEY)
}

async fn record_response(record: &TransferRecord, span: &Span) -> Result<HttpResponse, ApiError> {
    let body = record.to_json().await.map_err(|source| {
        let err = ApiError::Serialization {
            kind: record.kind(),
            source,
        };
        error!(parent: span, error = %err, uuid = %record.uuid(), "failed to serialize record");
        err
    })?;
    Ok(HttpResponse::Ok().content_type(ContentType::json()).body(body))
}

async fn trigger(
    kind: TransferKind,
    query: TransferQuery,
    engine: web::Data<TransferEngine>,
) -> Result<HttpResponse, ApiError> {
    let record = engine.request(kind, !is_non_blocking(&query)).await;
    record_response(&record, engine.span()).await
}

async fn status(
    kind: TransferKind,
    id: web::Path<String>,
    engine: web::Data<TransferEngine>,
) -> Result<HttpResponse, ApiError> {
    let record = engine.find(kind, &id.into_inner()).await?;
    record_response(&record, engine.span()).await
}

pub async fn handle_download(
    query: TransferQuery,
    engine: web::Data<TransferEngine>,
) -> Result<HttpResponse, ApiError> {
    trigger(TransferKind::Download, query, engine).await
}

pub async fn handle_upload(
    query: TransferQuery,
    engine: web::Data<TransferEngine>,
) -> Result<HttpResponse, ApiError> {
    trigger(TransferKind::Upload, query, engine).await
}

pub async fn handle_download_status(
    id: web::Path<String>,
    engine: web::Data<TransferEngine>,
) -> Result<HttpResponse, ApiError> {
    status(TransferKind::Download, id, engine).await
}

pub async fn handle_upload_status(
    id: web::Path<String>,
    engine: web::Data<TransferEngine>,
) -> Result<HttpResponse, ApiError> {
    status(TransferKind::Upload, id, engine).await
}
