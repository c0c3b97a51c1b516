use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use tagbook_core::types::ItemGroup;

use super::auth::check_auth;
use super::error::AppError;
use super::{parse_id, parse_orders, MoveRequest, SharedState};

// ==============================================================================
// DTOs
// ==============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ItemGroupInfo {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) display_order: i32,
}

impl From<ItemGroup> for ItemGroupInfo {
    fn from(group: ItemGroup) -> Self {
        Self {
            id: group.group_id.to_string(),
            name: group.name,
            display_order: group.display_order,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct GroupNameRequest {
    name: String,
}

// ==============================================================================
// Handlers
// ==============================================================================

pub(super) async fn list_groups(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ItemGroupInfo>>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let groups = state.catalog.list_groups(uid).await?;
    Ok(Json(groups.into_iter().map(ItemGroupInfo::from).collect()))
}

pub(super) async fn create_group(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<GroupNameRequest>, JsonRejection>,
) -> Result<Json<ItemGroupInfo>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let group = state.catalog.create_group(uid, &req.name).await?;
    Ok(Json(group.into()))
}

pub(super) async fn get_group(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ItemGroupInfo>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let group_id = parse_id(&id, "group id")?;
    let group = state.catalog.get_group(uid, group_id).await?;
    Ok(Json(group.into()))
}

pub(super) async fn modify_group(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    req: Result<Json<GroupNameRequest>, JsonRejection>,
) -> Result<Json<ItemGroupInfo>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let group_id = parse_id(&id, "group id")?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let group = state.catalog.modify_group(uid, group_id, &req.name).await?;
    Ok(Json(group.into()))
}

pub(super) async fn delete_group(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let group_id = parse_id(&id, "group id")?;
    state.catalog.delete_group(uid, group_id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

pub(super) async fn move_groups(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let changes = parse_orders(&req)?;
    state.catalog.reorder_groups(uid, &changes).await?;
    Ok(Json(serde_json::json!({ "status": "moved" })))
}
