use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use tagbook_core::store::sort_for_display;
use tagbook_core::types::{Item, ItemBatch, ItemChanges, NewItem, UNGROUPED};
use tagbook_core::parse_item_ids;

use super::auth::check_auth;
use super::error::AppError;
use super::{parse_id, parse_orders, MoveRequest, SharedState};

// ==============================================================================
// DTOs
// ==============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ItemInfo {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) group_id: String,
    pub(super) display_order: i32,
    pub(super) hidden: bool,
}

impl From<Item> for ItemInfo {
    fn from(item: Item) -> Self {
        Self {
            id: item.item_id.to_string(),
            name: item.name,
            group_id: item.group_id.to_string(),
            display_order: item.display_order,
            hidden: item.hidden,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct ItemsQuery {
    ids: Option<String>,
}

/// Shared by create and modify: modify replaces both fields.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ItemRequest {
    #[serde(default)]
    group_id: Option<String>,
    name: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct BatchEntry {
    #[serde(default)]
    group_id: Option<String>,
    name: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct BatchRequest {
    #[serde(default)]
    group_id: Option<String>,
    items: Vec<BatchEntry>,
    #[serde(default)]
    skip_existing: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct HideRequest {
    hidden: bool,
}

// ==============================================================================
// Handlers
// ==============================================================================

/// Every item of the caller, or only those named by `?ids=1,2`.
pub(super) async fn list_items(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<Vec<ItemInfo>>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let filter = parse_item_ids(query.ids.as_deref().unwrap_or(""))?;

    let items = match filter {
        None => state.catalog.list_items(uid).await?,
        Some(ids) => {
            let mut items: Vec<Item> = state
                .catalog
                .get_items_by_ids(uid, &ids)
                .await?
                .into_values()
                .collect();
            sort_for_display(&mut items);
            items
        }
    };
    Ok(Json(items.into_iter().map(ItemInfo::from).collect()))
}

pub(super) async fn create_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<Json<ItemInfo>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let new = NewItem {
        group_id: parse_group_id(req.group_id.as_deref())?,
        name: req.name,
    };
    let item = state.catalog.create_item(uid, new).await?;
    Ok(Json(item.into()))
}

pub(super) async fn create_items_batch(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<Vec<ItemInfo>>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;

    let group_id = parse_group_id(req.group_id.as_deref())?;
    let items = req
        .items
        .into_iter()
        .map(|entry| {
            // Entries without a group inherit the batch's.
            let entry_group = match entry.group_id.as_deref() {
                Some(raw) => parse_group_id(Some(raw))?,
                None => group_id,
            };
            Ok(NewItem {
                group_id: entry_group,
                name: entry.name,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let batch = ItemBatch {
        group_id,
        items,
        skip_existing: req.skip_existing,
    };
    let items = state.catalog.create_items_batch(uid, batch).await?;
    Ok(Json(items.into_iter().map(ItemInfo::from).collect()))
}

pub(super) async fn get_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ItemInfo>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let item_id = parse_id(&id, "item id")?;
    let item = state.catalog.get_item(uid, item_id).await?;
    Ok(Json(item.into()))
}

pub(super) async fn modify_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    req: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<Json<ItemInfo>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let item_id = parse_id(&id, "item id")?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let changes = ItemChanges {
        item_id,
        group_id: parse_group_id(req.group_id.as_deref())?,
        name: req.name,
    };
    let item = state.catalog.modify_item(uid, changes).await?;
    Ok(Json(item.into()))
}

pub(super) async fn hide_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    req: Result<Json<HideRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let item_id = parse_id(&id, "item id")?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.catalog.hide_item(uid, item_id, req.hidden).await?;
    Ok(Json(serde_json::json!({ "status": "updated", "hidden": req.hidden })))
}

pub(super) async fn delete_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let item_id = parse_id(&id, "item id")?;
    state.catalog.delete_item(uid, item_id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

pub(super) async fn move_items(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let changes = parse_orders(&req)?;
    state.catalog.reorder_items(uid, &changes).await?;
    Ok(Json(serde_json::json!({ "status": "moved" })))
}

// ==============================================================================
// Helpers
// ==============================================================================

/// Absent or `"0"` means ungrouped.
fn parse_group_id(raw: Option<&str>) -> Result<i64, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(UNGROUPED),
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|id| *id >= UNGROUPED)
            .ok_or_else(|| AppError::BadRequest(format!("invalid group id: {raw}"))),
    }
}
