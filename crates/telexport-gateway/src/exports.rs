// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming reads of NDJSON export artifacts.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::envelope::ToolResponse;
use crate::server::GatewayState;

/// GET /v1/exports/:id
///
/// Streams the artifact's NDJSON body. The read guard taken here rides
/// inside the stream, so a concurrent sweep cannot reclaim the file
/// mid-response.
pub async fn get_export(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.read_by_id(&id).await {
        Ok(reader) => {
            debug!(
                id = id.as_str(),
                bytes = reader.artifact.size_bytes,
                "streaming artifact"
            );
            let length = reader.artifact.size_bytes;
            let stream = ReaderStream::new(reader);
            let mut response = Body::from_stream(stream).into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/x-ndjson"),
            );
            if let Ok(value) = header::HeaderValue::from_str(&length.to_string()) {
                response
                    .headers_mut()
                    .insert(header::CONTENT_LENGTH, value);
            }
            response
        }
        Err(e) => {
            let envelope = ToolResponse::from_error(&e);
            let status = StatusCode::from_u16(envelope.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(envelope)).into_response()
        }
    }
}
