//! Response envelopes of the upstream APIs.
//!
//! List endpoints are not consistent about where the rows live: some return a
//! bare array, some wrap it in `data` or `items`, one nests `data.items`.
//! [`parse_list`] is the single place that knows about those shapes.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ServiceError;
use crate::models::CreatedDocument;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEnvelope {
    Bare(Vec<Value>),
    Data { data: Vec<Value> },
    Items { items: Vec<Value> },
    Nested { data: ItemsOnly },
}

#[derive(Debug, Deserialize)]
struct ItemsOnly {
    items: Vec<Value>,
}

/// Parses the body of a list endpoint into its rows.
///
/// `success: false` wins over any rows sent alongside it. Rows that do not
/// deserialize are skipped with a warning so one bad record cannot empty a
/// whole source.
pub fn parse_list<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<Vec<T>, ServiceError> {
    let body: Value = serde_json::from_slice(body).map_err(|e| {
        ServiceError::SerializationError(format!("unexpected response from {}: {}", endpoint, e))
    })?;

    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = ["message", "error"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .map(str::to_string);
        return Err(ServiceError::ExternalApiError(
            message.unwrap_or_else(|| format!("{} reported failure", endpoint)),
        ));
    }

    let rows = match serde_json::from_value::<ListEnvelope>(body) {
        Ok(
            ListEnvelope::Bare(rows)
            | ListEnvelope::Data { data: rows }
            | ListEnvelope::Items { items: rows }
            | ListEnvelope::Nested {
                data: ItemsOnly { items: rows },
            },
        ) => rows,
        Err(_) => {
            return Err(ServiceError::SerializationError(format!(
                "response from {} carries no rows",
                endpoint
            )))
        }
    };

    let received = rows.len();
    let parsed: Vec<T> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(endpoint, index, error = %e, "skipping malformed row");
                None
            }
        })
        .collect();

    debug!(endpoint, received, rows = parsed.len(), "parsed list response");
    Ok(parsed)
}

/// Error for a non-2xx answer, using the server's message when the body has one.
pub fn error_for_status(endpoint: &str, status: StatusCode, body: &[u8]) -> ServiceError {
    let message = serde_json::from_slice::<MutationResponse>(body)
        .ok()
        .and_then(|response| response.message);
    rejection(endpoint, status, message)
}

fn rejection(endpoint: &str, status: StatusCode, message: Option<String>) -> ServiceError {
    ServiceError::ExternalApiError(
        message.unwrap_or_else(|| format!("{} failed with status {}", endpoint, status)),
    )
}

#[derive(Debug, Default, Deserialize)]
struct MutationResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default, alias = "error")]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default, alias = "_id")]
    id: Option<String>,
}

/// Interprets the answer to a create call.
///
/// A non-2xx status or `success: false` is an [`ServiceError::ExternalApiError`]
/// carrying the server's message when it sent one.
pub fn parse_mutation(
    endpoint: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<CreatedDocument, ServiceError> {
    // Empty or non-JSON bodies are tolerated; the status code decides.
    let response: MutationResponse = if body.iter().all(u8::is_ascii_whitespace) {
        MutationResponse::default()
    } else {
        serde_json::from_slice(body).unwrap_or_default()
    };

    if !status.is_success() || response.success == Some(false) {
        return Err(rejection(endpoint, status, response.message));
    }

    let id = response.id.or_else(|| {
        response
            .data
            .as_ref()
            .and_then(|data| data.get("_id").or_else(|| data.get("id")))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    Ok(CreatedDocument {
        id,
        message: response.message,
    })
}
