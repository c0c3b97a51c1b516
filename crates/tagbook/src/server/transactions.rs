use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use super::auth::check_auth;
use super::error::AppError;
use super::SharedState;

#[derive(Deserialize)]
pub(super) struct TransactionItemsQuery {
    ids: String,
}

/// Item ids linked to each requested transaction, keyed by transaction id.
/// Transactions with no links are omitted.
pub(super) async fn get_transaction_items(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<TransactionItemsQuery>,
) -> Result<Json<BTreeMap<String, Vec<String>>>, AppError> {
    let uid = check_auth(&state.api_token, &headers)?;
    let transaction_ids = parse_transaction_ids(&query.ids)?;

    let linked = state
        .catalog
        .get_item_ids_for_transactions(uid, &transaction_ids)
        .await?;
    Ok(Json(
        linked
            .into_iter()
            .map(|(transaction_id, item_ids)| {
                (
                    transaction_id.to_string(),
                    item_ids.iter().map(i64::to_string).collect(),
                )
            })
            .collect(),
    ))
}

fn parse_transaction_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    let invalid = || AppError::BadRequest(format!("invalid transaction id list: {raw}"));
    if raw.trim().is_empty() {
        return Err(invalid());
    }
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(invalid)
        })
        .collect()
}
