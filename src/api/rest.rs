//! JSON handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::catalog::Environment;
use crate::gateway::{DeleteParams, Gateway, GatewayError, QueryParams};
use crate::query::QueryValues;
use crate::record::Record;

/// Shared state for axum handlers.
type AppState = Arc<Gateway>;

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn get_tables(State(gateway): State<AppState>) -> Response {
    Json(gateway.catalog().snapshot()).into_response()
}

pub async fn execute_query(
    State(gateway): State<AppState>,
    body: Bytes,
) -> Result<Json<QueryResponse>, GatewayError> {
    let req: QueryRequest = parse_body(&body)?;

    let params = QueryParams {
        environment: req.environment.parse()?,
        table: req.table,
        index_name: req.index_name,
        values: req.values,
    };

    let outcome = gateway.execute_query(&params).await?;
    Ok(Json(QueryResponse {
        success: true,
        count: outcome.count,
        items: outcome.items,
    }))
}

pub async fn update_item(
    State(gateway): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, GatewayError> {
    let req: UpdateRequest = parse_body(&body)?;

    let environment: Environment = req.environment.parse()?;
    let item = Record::try_from(req.item)?;

    let message = gateway.update_item(environment, &req.table, item).await?;
    Ok(Json(MessageResponse::ok(message)))
}

pub async fn delete_item(
    State(gateway): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, GatewayError> {
    let req: DeleteRequest = parse_body(&body)?;

    let params = DeleteParams {
        environment: req.environment.parse()?,
        table: req.table,
        primary_key: req.primary_key,
        primary_value: req.primary_value,
        confirmation_token: req.confirmation_token,
    };

    let message = gateway.delete_item(&params).await?;
    Ok(Json(MessageResponse::ok(message)))
}

/// Decode a JSON body regardless of the declared content type.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|e| GatewayError::MalformedRequest(e.to_string()))
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        warn!(error = %self, "request rejected");
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Missing and `null` fields both read as the type's empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub environment: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub table: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub index_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: QueryValues,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub environment: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub table: String,
    #[serde(default)]
    pub item: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub environment: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub table: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary_value: String,
    /// Hex SHA-256 of `DELETE:{environment}:{table}:{primaryValue}`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub confirmation_token: String,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub count: usize,
    pub items: Vec<Record>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
