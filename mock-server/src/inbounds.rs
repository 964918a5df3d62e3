use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::{page_of, split_list, AppState, ListParams, Rejection};

/// A mobile originated message. `body` is base64 and `udh` hex for
/// `mo_binary`.
#[derive(Clone, Debug, Serialize)]
pub struct Inbound {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub from: String,
    pub to: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    pub sent_at: String,
    pub received_at: String,
}

pub(crate) fn seed() -> Vec<Inbound> {
    let text = |id: &str, from: &str, to: &str, body: &str, at: &str| Inbound {
        kind: "mo_text",
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        body: body.to_string(),
        udh: None,
        keyword: None,
        operator: Some("24001".to_string()),
        sent_at: at.to_string(),
        received_at: at.to_string(),
    };
    vec![
        text("mo-1", "46701000001", "12345", "Hello", "2016-12-01T10:00:00.000Z"),
        Inbound {
            keyword: Some("STOP".to_string()),
            ..text("mo-2", "46701000002", "12345", "STOP all", "2016-12-02T11:30:00.000Z")
        },
        Inbound {
            kind: "mo_binary",
            body: "AQID".to_string(),
            udh: Some("050003cc0201".to_string()),
            operator: None,
            ..text("mo-3", "46701000003", "54321", "", "2016-12-03T08:15:00.000Z")
        },
    ]
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, Rejection> {
    let recipients = split_list(params.to.as_deref());
    let store = state.store.read().await;
    let matching: Vec<&Inbound> = store
        .inbounds
        .iter()
        .filter(|m| recipients.is_empty() || recipients.contains(&m.to.as_str()))
        .filter(|m| params.in_date_range(&m.received_at))
        .collect();
    page_of(&matching, &params, "inbounds")
}

pub(crate) async fn fetch(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Inbound>, Rejection> {
    let store = state.store.read().await;
    store
        .inbounds
        .iter()
        .find(|m| m.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Rejection::not_found("inbound", &id))
}
