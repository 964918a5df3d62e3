use std::collections::BTreeSet;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    apply_tags_update, new_id, now, page_of, parse_json, split_list, tags_json, AppState, ListParams, Rejection,
    Store, TagsInput, TagsUpdateInput,
};

#[derive(Clone, Debug, Serialize)]
pub struct Group {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub size: usize,
    pub child_groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_update: Option<Value>,
    pub created_at: String,
    pub modified_at: String,
    #[serde(skip)]
    pub members: BTreeSet<String>,
    #[serde(skip)]
    pub tags: BTreeSet<String>,
}

impl Group {
    fn touch(&mut self) {
        self.size = self.members.len();
        self.modified_at = now();
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupInput {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    child_groups: Vec<String>,
    #[serde(default)]
    auto_update: Option<Value>,
    #[serde(default)]
    tags: Vec<String>,
}

impl GroupInput {
    fn into_group(self, store: &Store, id: String, created_at: String) -> Result<Group, Rejection> {
        if let Some(missing) = self.child_groups.iter().find(|c| position(store, c).is_err()) {
            return Err(Rejection::bad_request(
                "syntax_invalid_parameter_format",
                format!("child group {missing} does not exist"),
            ));
        }
        let mut group = Group {
            id,
            name: self.name,
            size: 0,
            child_groups: self.child_groups,
            auto_update: self.auto_update,
            modified_at: created_at.clone(),
            created_at,
            members: self.members.into_iter().collect(),
            tags: self.tags.into_iter().collect(),
        };
        group.touch();
        Ok(group)
    }
}

fn position(store: &Store, id: &str) -> Result<usize, Rejection> {
    store
        .groups
        .iter()
        .position(|g| g.id == id)
        .ok_or_else(|| Rejection::not_found("group", id))
}

fn invalid(key: &str) -> Rejection {
    Rejection::bad_request("syntax_invalid_parameter_format", format!("invalid value for {key}"))
}

fn string_list(key: &str, value: Value) -> Result<Vec<String>, Rejection> {
    serde_json::from_value(value).map_err(|_| invalid(key))
}

/// Apply a partial update. Member lists of other groups are looked up in
/// `store`; a JSON `null` resets `name` or `auto_update`.
fn apply_update(group: &mut Group, store: &Store, update: Map<String, Value>) -> Result<(), Rejection> {
    for (key, value) in update {
        match (key.as_str(), value) {
            ("name", Value::Null) => group.name = None,
            ("name", Value::String(name)) => group.name = Some(name),
            ("auto_update", Value::Null) => group.auto_update = None,
            ("auto_update", value @ Value::Object(_)) => group.auto_update = Some(value),
            ("add", value) => group.members.extend(string_list("add", value)?),
            ("remove", value) => {
                for member in string_list("remove", value)? {
                    group.members.remove(&member);
                }
            }
            ("add_from_group", Value::String(other)) => {
                let source = &store.groups[position(store, &other)?];
                group.members.extend(source.members.iter().cloned());
            }
            ("remove_from_group", Value::String(other)) => {
                let source = &store.groups[position(store, &other)?];
                group.members.retain(|m| !source.members.contains(m));
            }
            (other, _) => return Err(invalid(other)),
        }
    }
    group.touch();
    Ok(())
}

pub(crate) async fn create(State(state): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<Group>), Rejection> {
    let input: GroupInput = parse_json(&body)?;
    let mut store = state.store.write().await;
    let group = input.into_group(&store, new_id(), now())?;
    tracing::info!(id = %group.id, size = group.size, "group created");
    store.groups.push(group.clone());
    Ok((StatusCode::CREATED, Json(group)))
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, Rejection> {
    let tags = split_list(params.tags.as_deref());
    let store = state.store.read().await;
    let matching: Vec<&Group> = store
        .groups
        .iter()
        .filter(|g| tags.is_empty() || tags.iter().any(|t| g.tags.contains(*t)))
        .collect();
    page_of(&matching, &params, "groups")
}

pub(crate) async fn fetch(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Group>, Rejection> {
    let store = state.store.read().await;
    let index = position(&store, &id)?;
    Ok(Json(store.groups[index].clone()))
}

pub(crate) async fn replace(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Group>, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    let input: GroupInput = parse_json(&body)?;
    let created_at = store.groups[index].created_at.clone();
    let group = input.into_group(&store, id, created_at)?;
    store.groups[index] = group.clone();
    tracing::info!(id = %group.id, "group replaced");
    Ok(Json(group))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Group>, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    let update: Map<String, Value> = parse_json(&body)?;
    let mut group = store.groups[index].clone();
    apply_update(&mut group, &store, update)?;
    store.groups[index] = group.clone();
    tracing::info!(id = %group.id, size = group.size, "group updated");
    Ok(Json(group))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
) -> Result<StatusCode, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    store.groups.remove(index);
    tracing::info!(%id, "group deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn members(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, Rejection> {
    let store = state.store.read().await;
    let index = position(&store, &id)?;
    Ok(Json(store.groups[index].members.iter().cloned().collect()))
}

pub(crate) async fn fetch_tags(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Value>, Rejection> {
    let store = state.store.read().await;
    let index = position(&store, &id)?;
    Ok(tags_json(&store.groups[index].tags))
}

pub(crate) async fn replace_tags(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    let input: TagsInput = parse_json(&body)?;
    let group = &mut store.groups[index];
    group.tags = input.tags.into_iter().collect();
    Ok(tags_json(&group.tags))
}

pub(crate) async fn update_tags(
    State(state): State<AppState>,
    Path((_, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, Rejection> {
    let mut store = state.store.write().await;
    let index = position(&store, &id)?;
    let input: TagsUpdateInput = parse_json(&body)?;
    let group = &mut store.groups[index];
    apply_tags_update(&mut group.tags, input);
    Ok(tags_json(&group.tags))
}
