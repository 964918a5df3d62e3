//! In-memory stand-in for the XMS REST API.
//!
//! Serves one service plan under `/xms/v1/{plan}` and checks the bearer
//! token on every request. State lives in memory and is lost on restart.
//! A handful of inbound messages are seeded at startup since the API
//! offers no way to create them.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

mod batches;
mod error;
mod groups;
mod inbounds;

pub use batches::{Batch, BatchKind};
pub use error::Rejection;
pub use groups::Group;
pub use inbounds::Inbound;

const DEFAULT_PAGE_SIZE: u32 = 30;
const MAX_PAGE_SIZE: u32 = 100;

/// Service plan and token the server accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConfig {
    pub service_plan_id: String,
    pub token: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            service_plan_id: "test-plan".to_string(),
            token: "test-token".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    pub batches: Vec<Batch>,
    pub inbounds: Vec<Inbound>,
    pub groups: Vec<Group>,
}

impl Store {
    fn seeded() -> Self {
        Self {
            inbounds: inbounds::seed(),
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
}

pub fn app(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(RwLock::new(Store::seeded())),
    };
    Router::new()
        .route("/xms/v1/{plan}/batches", get(batches::list).post(batches::create))
        .route(
            "/xms/v1/{plan}/batches/{id}",
            get(batches::fetch)
                .post(batches::update)
                .put(batches::replace)
                .delete(batches::cancel),
        )
        .route(
            "/xms/v1/{plan}/batches/{id}/tags",
            get(batches::fetch_tags)
                .put(batches::replace_tags)
                .post(batches::update_tags),
        )
        .route("/xms/v1/{plan}/batches/{id}/delivery_report", get(batches::delivery_report))
        .route(
            "/xms/v1/{plan}/batches/{id}/delivery_report/{recipient}",
            get(batches::recipient_delivery_report),
        )
        .route("/xms/v1/{plan}/inbounds", get(inbounds::list))
        .route("/xms/v1/{plan}/inbounds/{id}", get(inbounds::fetch))
        .route("/xms/v1/{plan}/groups", get(groups::list).post(groups::create))
        .route(
            "/xms/v1/{plan}/groups/{id}",
            get(groups::fetch)
                .post(groups::update)
                .put(groups::replace)
                .delete(groups::delete),
        )
        .route("/xms/v1/{plan}/groups/{id}/members", get(groups::members))
        .route(
            "/xms/v1/{plan}/groups/{id}/tags",
            get(groups::fetch_tags)
                .put(groups::replace_tags)
                .post(groups::update_tags),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

async fn authorize(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let expected = format!("Bearer {}", state.config.token);
    let token_ok = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    let plan_ok = params.get("plan") == Some(&state.config.service_plan_id);
    if !(token_ok && plan_ok) {
        tracing::warn!(path = %request.uri().path(), "rejected credentials");
        return Err(Rejection::unauthorized());
    }
    Ok(next.run(request).await)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, Rejection> {
    serde_json::from_slice(body).map_err(|e| Rejection::bad_request("syntax_invalid_json", e.to_string()))
}

/// Query parameters understood by the collection endpoints. Each endpoint
/// only looks at the filters it supports.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default)]
    pub page: u32,
    pub page_size: Option<u32>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub tags: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ListParams {
    fn page_size(&self) -> Result<u32, Rejection> {
        match self.page_size.unwrap_or(DEFAULT_PAGE_SIZE) {
            0 => Err(Rejection::bad_request(
                "syntax_constraint_violation",
                "page_size must be positive",
            )),
            size => Ok(size.min(MAX_PAGE_SIZE)),
        }
    }

    /// Whether the date part of `timestamp` lies in `[start_date, end_date)`.
    pub fn in_date_range(&self, timestamp: &str) -> bool {
        let date = timestamp.get(..10).unwrap_or(timestamp);
        self.start_date.as_deref().map_or(true, |start| date >= start)
            && self.end_date.as_deref().map_or(true, |end| date < end)
    }
}

pub(crate) fn split_list(value: Option<&str>) -> Vec<&str> {
    value
        .map(|v| v.split(',').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Slice `items` into the requested page and wrap it in the page envelope.
pub(crate) fn page_of<T: Serialize>(items: &[&T], params: &ListParams, key: &str) -> Result<Json<Value>, Rejection> {
    let size = params.page_size()? as usize;
    let start = (params.page as usize).saturating_mul(size);
    let content: Vec<&&T> = items.iter().skip(start).take(size).collect();
    let mut page = json!({
        "page": params.page,
        "page_size": content.len(),
        "count": items.len(),
    });
    page[key] = json!(content);
    Ok(Json(page))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TagsInput {
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TagsUpdateInput {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

pub(crate) fn tags_json(tags: &BTreeSet<String>) -> Json<Value> {
    Json(json!({ "tags": tags }))
}

pub(crate) fn apply_tags_update(tags: &mut BTreeSet<String>, update: TagsUpdateInput) {
    tags.extend(update.add);
    for tag in &update.remove {
        tags.remove(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_is_half_open() {
        let params = ListParams {
            start_date: Some("2016-12-01".to_string()),
            end_date: Some("2016-12-02".to_string()),
            ..Default::default()
        };
        assert!(params.in_date_range("2016-12-01T23:59:59.000Z"));
        assert!(!params.in_date_range("2016-12-02T00:00:00.000Z"));
        assert!(!params.in_date_range("2016-11-30T12:00:00.000Z"));
    }

    #[test]
    fn split_list_drops_empty_entries() {
        assert_eq!(split_list(Some("a,,b")), ["a", "b"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn page_of_reports_actual_content_length() {
        let items = ["a", "b", "c"];
        let refs: Vec<&&str> = items.iter().collect();
        let params = ListParams {
            page: 1,
            page_size: Some(2),
            ..Default::default()
        };
        let Json(page) = page_of(&refs, &params, "things").unwrap();
        assert_eq!(page["page_size"], 1);
        assert_eq!(page["count"], 3);
        assert_eq!(page["things"], json!(["c"]));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let params = ListParams {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(params.page_size().is_err());
    }

    #[test]
    fn tags_update_adds_then_removes() {
        let mut tags: BTreeSet<String> = ["a".to_string()].into();
        apply_tags_update(
            &mut tags,
            TagsUpdateInput {
                add: vec!["b".to_string(), "c".to_string()],
                remove: vec!["a".to_string()],
            },
        );
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), ["b", "c"]);
    }
}
