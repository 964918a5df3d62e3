use std::collections::BTreeSet;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    apply_tags_update, new_id, now, page_of, parse_json, split_list, tags_json, AppState, ListParams, Rejection,
    Store, TagsInput, TagsUpdateInput,
};

/// Optional batch fields the server stores and echoes without interpreting.
const OPTION_KEYS: [&str; 6] = [
    "delivery_report",
    "send_at",
    "expire_at",
    "callback_url",
    "client_reference",
    "parameters",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchKind {
    #[serde(rename = "mt_text")]
    Text,
    #[serde(rename = "mt_binary")]
    Binary,
}

impl BatchKind {
    fn as_str(self) -> &'static str {
        match self {
            BatchKind::Text => "mt_text",
            BatchKind::Binary => "mt_binary",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Batch {
    #[serde(rename = "type")]
    pub kind: BatchKind,
    pub id: String,
    pub from: String,
    pub to: Vec<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udh: Option<String>,
    pub canceled: bool,
    pub created_at: String,
    pub modified_at: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
    #[serde(skip)]
    pub tags: BTreeSet<String>,
}

#[derive(Deserialize)]
struct BatchInput {
    #[serde(rename = "type")]
    kind: BatchKind,
    from: String,
    to: Vec<String>,
    body: String,
    #[serde(default)]
    udh: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(flatten)]
    options: Map<String, Value>,
}

impl BatchInput {
    fn validate(&self) -> Result<(), Rejection> {
        if self.from.is_empty() {
            return Err(Rejection::bad_request("missing_parameter", "from must not be empty"));
        }
        if self.to.is_empty() {
            return Err(Rejection::bad_request("missing_parameter", "to must not be empty"));
        }
        match (self.kind, &self.udh) {
            (BatchKind::Binary, None) => {
                return Err(Rejection::bad_request("missing_parameter", "binary batches need a udh"))
            }
            (BatchKind::Text, Some(_)) => {
                return Err(Rejection::bad_request(
                    "syntax_invalid_parameter_format",
                    "udh is only valid on binary batches",
                ))
            }
            _ => {}
        }
        if let Some(key) = self.options.keys().find(|k| !OPTION_KEYS.contains(&k.as_str())) {
            return Err(Rejection::bad_request(
                "syntax_invalid_parameter_format",
                format!("unknown field {key}"),
            ));
        }
        if self.kind == BatchKind::Binary && self.options.contains_key("parameters") {
            return Err(Rejection::bad_request(
                "syntax_invalid_parameter_format",
                "parameters are only valid on text batches",
            ));
        }
        Ok(())
    }

    fn into_batch(self, id: String, created_at: String) -> Batch {
        Batch {
            kind: self.kind,
            id,
            from: self.from,
            to: self.to,
            body: self.body,
            udh: self.udh,
            canceled: false,
            modified_at: now(),
            created_at,
            options: self.options,
            tags: self.tags.into_iter().collect(),
        }
    }
}

fn string_list(key: &str, value: Value) -> Result<Vec<String>, Rejection> {
    serde_json::from_value(value)
        .map_err(|_| Rejection::bad_request("syntax_invalid_parameter_format", format!("{key} must be a list of strings")))
}

/// Apply a partial update. A JSON `null` resets an optional field.
fn apply_update(batch: &mut Batch, update: Map<String, Value>) -> Result<(), Rejection> {
    let invalid = |key: &str| Rejection::bad_request("syntax_invalid_parameter_format", format!("invalid value for {key}"));
    for (key, value) in update {
        match (key.as_str(), value) {
            ("type", Value::String(kind)) if kind == batch.kind.as_str() => {}
            ("type", _) => {
                return Err(Rejection::bad_request(
                    "syntax_invalid_parameter_format",
                    format!("batch {} is of type {}", batch.id, batch.kind.as_str()),
                ))
            }
            ("from", Value::String(from)) if !from.is_empty() => batch.from = from,
            ("to_add", value) => {
                for recipient in string_list("to_add", value)? {
                    if !batch.to.contains(&recipient) {
                        batch.to.push(recipient);
                    }
                }
            }
            ("to_remove", value) => {
                let removed = string_list("to_remove", value)?;
                batch.to.retain(|r| !removed.contains(r));
            }
            ("body", Value::String(body)) => batch.body = body,
            ("udh", Value::String(udh)) if batch.kind == BatchKind::Binary => batch.udh = Some(udh),
            ("parameters", _) if batch.kind == BatchKind::Binary => return Err(invalid("parameters")),
            (option, Value::Null) if OPTION_KEYS.contains(&option) => {
                batch.options.remove(option);
            }
            (option, value) if OPTION_KEYS.contains(&option) => {
                batch.options.insert(key.clone(), value);
            }
            (other, _) => return Err(invalid(other)),
        }
    }
    if batch.to.is_empty() {
        return Err(Rejection::bad_request("missing_parameter", "a batch needs at least one recipient"));
    }
    batch.modified_at = now();
    Ok(())
}

fn position(store: &Store, id: &str) -> Result<usize, Rejection> {
    store
        .batches
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| Rejection::not_found("batch", id))
}

pub(crate) async fn create(State(state): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<Batch>), Rejection> {
    let input: BatchInput = parse_json(&body)?;
    input.validate()?;
    let batch = input.into_batch(new_id(), now());
    tracing::info!(id = %batch.id, recipients = batch.to.len(), "batch created");
    state.store.write().await.batches.push(batch.clone());
    Ok((StatusCode::CREATED, Json(batch)))
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, Rejection> {
    let senders = split_list(params.from.as_deref());
    let tags = split_list(params.tags.as_deref());
    let store = state.store.read().await;
    let matching: Vec<&Batch> = store
        .batches
        .iter()
        .filter(|b| senders.is_empty() || senders.contains(&b.from.as_str()))
        .filter(|b| tags.is_empty() || tags.iter().any(|t| b.tags.contains(*t)))
        .filter(|b| params.in_date_range(&b.created_at))
        .collect();
    page_of(&matching, &params, "batches")
}

pub(crate) async fn fetch(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Batch>, Rejection> {
    let store = state.store.read().await;
    let index = position(&store, &id)?;
    Ok(Json(store.batches[index].clone()))
}

pub(crate) async fn replace(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Batch>, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    let input: BatchInput = parse_json(&body)?;
    input.validate()?;
    let current = &store.batches[index];
    let mut batch = input.into_batch(id, current.created_at.clone());
    batch.tags = current.tags.clone();
    store.batches[index] = batch.clone();
    tracing::info!(id = %batch.id, "batch replaced");
    Ok(Json(batch))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Batch>, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    let update: Map<String, Value> = parse_json(&body)?;
    let mut batch = store.batches[index].clone();
    apply_update(&mut batch, update)?;
    store.batches[index] = batch.clone();
    tracing::info!(id = %batch.id, "batch updated");
    Ok(Json(batch))
}

pub(crate) async fn cancel(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Batch>, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    let batch = &mut store.batches[index];
    if !batch.canceled {
        batch.canceled = true;
        batch.modified_at = now();
        tracing::info!(id = %batch.id, "batch canceled");
    }
    Ok(Json(batch.clone()))
}

pub(crate) async fn fetch_tags(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Value>, Rejection> {
    let store = state.store.read().await;
    let index = position(&store, &id)?;
    Ok(tags_json(&store.batches[index].tags))
}

pub(crate) async fn replace_tags(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    let input: TagsInput = parse_json(&body)?;
    let batch = &mut store.batches[index];
    batch.tags = input.tags.into_iter().collect();
    Ok(tags_json(&batch.tags))
}

pub(crate) async fn update_tags(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    let input: TagsUpdateInput = parse_json(&body)?;
    let batch = &mut store.batches[index];
    apply_tags_update(&mut batch.tags, input);
    Ok(tags_json(&batch.tags))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportParams {
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
    code: Option<String>,
}

/// Status bucket of every recipient: the server never delivers anything.
fn report_status(batch: &Batch) -> (&'static str, u32) {
    if batch.canceled {
        ("Cancelled", 408)
    } else {
        ("Queued", 400)
    }
}

pub(crate) async fn delivery_report(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
    Query(params): Query<ReportParams>,
) -> Result<Json<Value>, Rejection> {
    let full = match params.kind.as_deref() {
        None | Some("summary") => false,
        Some("full") => true,
        Some(other) => {
            return Err(Rejection::bad_request(
                "syntax_invalid_parameter_format",
                format!("unsupported report type {other}"),
            ))
        }
    };
    let store = state.store.read().await;
    let batch = &store.batches[position(&store, &id)?];
    let (status, code) = report_status(batch);
    let code_text = code.to_string();
    let statuses = split_list(params.status.as_deref());
    let codes = split_list(params.code.as_deref());

    let mut buckets = Vec::new();
    if (statuses.is_empty() || statuses.contains(&status)) && (codes.is_empty() || codes.contains(&code_text.as_str())) {
        let mut bucket = json!({ "code": code, "status": status, "count": batch.to.len() });
        if full {
            bucket["recipients"] = json!(batch.to);
        }
        buckets.push(bucket);
    }
    Ok(Json(json!({
        "type": "delivery_report_sms",
        "batch_id": batch.id,
        "total_message_count": batch.to.len(),
        "statuses": buckets,
    })))
}

pub(crate) async fn recipient_delivery_report(
    State(state): State<AppState>,
    Path((_, id, recipient)): Path<(String, String, String)>,
) -> Result<Json<Value>, Rejection> {
    let store = state.store.read().await;
    let batch = &store.batches[position(&store, &id)?];
    if !batch.to.contains(&recipient) {
        return Err(Rejection::not_found("recipient", &recipient));
    }
    let (status, code) = report_status(batch);
    Ok(Json(json!({
        "type": "recipient_delivery_report_sms",
        "batch_id": batch.id,
        "recipient": recipient,
        "code": code,
        "status": status,
        "at": batch.modified_at,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Batch {
        let input: BatchInput =
            serde_json::from_str(r#"{"type":"mt_text","from":"123","to":["1","2"],"body":"hi","callback_url":"http://cb"}"#)
                .unwrap();
        input.validate().unwrap();
        input.into_batch("b1".to_string(), now())
    }

    fn update(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn unknown_create_fields_are_rejected() {
        let input: BatchInput =
            serde_json::from_str(r#"{"type":"mt_text","from":"1","to":["2"],"body":"x","color":"red"}"#).unwrap();
        assert_eq!(input.validate().unwrap_err().code, "syntax_invalid_parameter_format");
    }

    #[test]
    fn binary_batches_need_udh() {
        let input: BatchInput =
            serde_json::from_str(r#"{"type":"mt_binary","from":"1","to":["2"],"body":"AQI="}"#).unwrap();
        assert_eq!(input.validate().unwrap_err().code, "missing_parameter");
    }

    #[test]
    fn null_resets_and_absent_keeps() {
        let mut b = batch();
        apply_update(&mut b, update(r#"{"type":"mt_text","callback_url":null,"body":"new"}"#)).unwrap();
        assert!(!b.options.contains_key("callback_url"));
        assert_eq!(b.body, "new");
        assert_eq!(b.from, "123");
    }

    #[test]
    fn delivery_report_reset_stores_none() {
        let mut b = batch();
        apply_update(&mut b, update(r#"{"delivery_report":"none"}"#)).unwrap();
        assert_eq!(b.options["delivery_report"], "none");
    }

    #[test]
    fn recipients_are_added_and_removed() {
        let mut b = batch();
        apply_update(&mut b, update(r#"{"to_add":["3","1"],"to_remove":["2"]}"#)).unwrap();
        assert_eq!(b.to, ["1", "3"]);
    }

    #[test]
    fn removing_every_recipient_is_rejected() {
        let mut b = batch();
        let err = apply_update(&mut b, update(r#"{"to_remove":["1","2"]}"#)).unwrap_err();
        assert_eq!(err.code, "missing_parameter");
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut b = batch();
        assert!(apply_update(&mut b, update(r#"{"type":"mt_binary"}"#)).is_err());
        assert!(apply_update(&mut b, update(r#"{"color":"red"}"#)).is_err());
    }

    #[test]
    fn serializes_options_inline() {
        let json = serde_json::to_value(batch()).unwrap();
        assert_eq!(json["type"], "mt_text");
        assert_eq!(json["callback_url"], "http://cb");
        assert!(json.get("udh").is_none());
        assert!(json.get("tags").is_none());
    }
}
