mod auth;
mod error;
mod groups;
mod items;
mod transactions;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, CorsLayer};

use tagbook_core::types::DisplayOrderChange;
use tagbook_core::ItemCatalog;

use error::AppError;

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub catalog: Arc<ItemCatalog>,
    pub api_token: String,
}

type SharedState = Arc<AppState>;

/// Upper bound on any request body.
const BODY_LIMIT: usize = 1024 * 1024;

// ==============================================================================
// Router
// ==============================================================================

pub fn build_router(state: AppState, origin: &str) -> Router {
    // Only reflect the allowed origin when the request's Origin header
    // actually matches.
    let allowed: axum::http::HeaderValue = origin.parse().expect("valid origin header value");
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate({
            let allowed = allowed.clone();
            move |request_origin: &axum::http::HeaderValue, _| *request_origin == allowed
        }))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::HeaderName::from_static("x-api-token"),
            axum::http::header::HeaderName::from_static("x-user-id"),
        ]);

    let shared = Arc::new(state);

    let public_api = Router::new().route("/api/v1/health", get(health));

    let group_routes = Router::new()
        .route(
            "/api/v1/item-groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route("/api/v1/item-groups/move", post(groups::move_groups))
        .route(
            "/api/v1/item-groups/{id}",
            get(groups::get_group)
                .post(groups::modify_group)
                .delete(groups::delete_group),
        );

    let item_routes = Router::new()
        .route(
            "/api/v1/items",
            get(items::list_items).post(items::create_item),
        )
        .route("/api/v1/items/batch", post(items::create_items_batch))
        .route("/api/v1/items/move", post(items::move_items))
        .route(
            "/api/v1/items/{id}",
            get(items::get_item)
                .post(items::modify_item)
                .delete(items::delete_item),
        )
        .route("/api/v1/items/{id}/hide", post(items::hide_item));

    let protected_api = Router::new()
        .merge(group_routes)
        .merge(item_routes)
        .route(
            "/api/v1/transactions/items",
            get(transactions::get_transaction_items),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT));

    Router::new()
        .merge(public_api)
        .merge(protected_api)
        .route("/api", any(api_not_found))
        .route("/api/{*path}", any(api_not_found))
        .fallback(api_not_found)
        .layer(cors)
        .with_state(shared)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn api_not_found() -> AppError {
    AppError::NotFound("API route not found".to_string())
}

// ==============================================================================
// Shared Request Shapes
// ==============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct MoveEntry {
    id: String,
    display_order: i32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct MoveRequest {
    orders: Vec<MoveEntry>,
}

/// Parse a positive id sent as a JSON string or path segment.
fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid {what}: {raw}")))
}

fn parse_orders(req: &MoveRequest) -> Result<Vec<DisplayOrderChange>, AppError> {
    req.orders
        .iter()
        .map(|entry| {
            Ok(DisplayOrderChange {
                id: parse_id(&entry.id, "id")?,
                display_order: entry.display_order,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tagbook_core::{Datastore, SequenceIdGenerator};
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    fn test_catalog() -> Arc<ItemCatalog> {
        let db = Datastore::open_in_memory(2).expect("in-memory datastore must open");
        let ids = SequenceIdGenerator::new(0).expect("node 0 is valid");
        Arc::new(ItemCatalog::new(Arc::new(db), Arc::new(ids)))
    }

    fn test_router(catalog: Arc<ItemCatalog>) -> Router {
        let state = AppState {
            catalog,
            api_token: TOKEN.to_string(),
        };
        build_router(state, "http://127.0.0.1:3080")
    }

    async fn response_body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .expect("response body must be readable");
        serde_json::from_slice(&bytes).expect("response body must be valid JSON")
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        uid: i64,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-api-token", TOKEN)
            .header("x-user-id", uid.to_string());
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request must build");

        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router should serve request");
        let status = response.status();
        (status, response_body_json(response).await)
    }

    fn code(json: &serde_json::Value) -> Option<&str> {
        json.get("code").and_then(serde_json::Value::as_str)
    }

    fn id_of(json: &serde_json::Value) -> String {
        json.get("id")
            .and_then(serde_json::Value::as_str)
            .expect("ids are serialized as strings")
            .to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let router = test_router(test_catalog());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request must build"),
            )
            .await
            .expect("router should serve request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_api_route_returns_json_404() {
        let router = test_router(test_catalog());
        let (status, json) = call(&router, "GET", "/api/v1/does-not-exist", 1, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json.get("error").and_then(serde_json::Value::as_str),
            Some("API route not found")
        );
    }

    #[tokio::test]
    async fn missing_credentials_are_unauthorized() {
        let router = test_router(test_catalog());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/items")
                    .body(Body::empty())
                    .expect("request must build"),
            )
            .await
            .expect("router should serve request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/items")
                    .header("x-api-token", TOKEN)
                    .body(Body::empty())
                    .expect("request must build"),
            )
            .await
            .expect("router should serve request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = response_body_json(response).await;
        assert_eq!(code(&json), Some("unauthorized"));
    }

    #[tokio::test]
    async fn group_lifecycle_maps_errors_to_statuses() {
        let router = test_router(test_catalog());

        let (status, group) = call(
            &router,
            "POST",
            "/api/v1/item-groups",
            7,
            Some(serde_json::json!({ "name": "Food" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let group_id = id_of(&group);
        assert_eq!(group.get("display_order"), Some(&serde_json::json!(1)));

        let (status, _) = call(
            &router,
            "POST",
            "/api/v1/items",
            7,
            Some(serde_json::json!({ "group_id": group_id, "name": "Coffee" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = call(
            &router,
            "DELETE",
            &format!("/api/v1/item-groups/{group_id}"),
            7,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code(&json), Some("in_use_cannot_delete"));

        let (status, json) = call(
            &router,
            "POST",
            &format!("/api/v1/item-groups/{group_id}"),
            7,
            Some(serde_json::json!({ "name": "Food" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code(&json), Some("nothing_to_update"));

        // Another user cannot see the group.
        let (status, json) = call(
            &router,
            "GET",
            &format!("/api/v1/item-groups/{group_id}"),
            8,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code(&json), Some("not_found"));
    }

    #[tokio::test]
    async fn duplicate_item_name_is_conflict() {
        let router = test_router(test_catalog());
        let body = serde_json::json!({ "name": "Rent" });

        let (status, _) = call(&router, "POST", "/api/v1/items", 3, Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, json) = call(&router, "POST", "/api/v1/items", 3, Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code(&json), Some("name_already_exists"));
    }

    #[tokio::test]
    async fn batch_with_skip_existing_returns_every_entry() {
        let router = test_router(test_catalog());
        call(
            &router,
            "POST",
            "/api/v1/items",
            3,
            Some(serde_json::json!({ "name": "B" })),
        )
        .await;

        let (status, json) = call(
            &router,
            "POST",
            "/api/v1/items/batch",
            3,
            Some(serde_json::json!({
                "items": [{ "name": "A" }, { "name": "B" }, { "name": "C" }],
                "skip_existing": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json
            .as_array()
            .expect("batch returns a list")
            .iter()
            .filter_map(|item| item.get("name").and_then(serde_json::Value::as_str))
            .collect();
        assert_eq!(names, vec!["B", "A", "C"]);

        let (status, json) = call(
            &router,
            "POST",
            "/api/v1/items/batch",
            3,
            Some(serde_json::json!({
                "group_id": "0",
                "items": [{ "group_id": "5", "name": "D" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code(&json), Some("invalid_argument"));
    }

    #[tokio::test]
    async fn move_and_filtered_list_round_through_string_ids() {
        let router = test_router(test_catalog());
        let (_, a) = call(
            &router,
            "POST",
            "/api/v1/items",
            4,
            Some(serde_json::json!({ "name": "A" })),
        )
        .await;
        let (_, b) = call(
            &router,
            "POST",
            "/api/v1/items",
            4,
            Some(serde_json::json!({ "name": "B" })),
        )
        .await;
        let (a_id, b_id) = (id_of(&a), id_of(&b));

        let (status, _) = call(
            &router,
            "POST",
            "/api/v1/items/move",
            4,
            Some(serde_json::json!({ "orders": [
                { "id": a_id, "display_order": 2 },
                { "id": b_id, "display_order": 1 }
            ] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = call(
            &router,
            "GET",
            &format!("/api/v1/items?ids={a_id},{b_id}"),
            4,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<String> = json
            .as_array()
            .expect("list returns an array")
            .iter()
            .map(id_of)
            .collect();
        assert_eq!(ids, vec![b_id.clone(), a_id.clone()]);

        let (status, json) = call(&router, "GET", "/api/v1/items?ids=1,x", 4, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code(&json), Some("invalid_argument"));
    }

    #[tokio::test]
    async fn hide_sets_flag() {
        let router = test_router(test_catalog());
        let (_, item) = call(
            &router,
            "POST",
            "/api/v1/items",
            4,
            Some(serde_json::json!({ "name": "A" })),
        )
        .await;
        let item_id = id_of(&item);

        let (status, _) = call(
            &router,
            "POST",
            &format!("/api/v1/items/{item_id}/hide"),
            4,
            Some(serde_json::json!({ "hidden": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = call(&router, "GET", &format!("/api/v1/items/{item_id}"), 4, None).await;
        assert_eq!(json.get("hidden"), Some(&serde_json::json!(true)));
    }

    #[tokio::test]
    async fn transaction_items_are_keyed_by_string_ids() {
        let catalog = test_catalog();
        let router = test_router(Arc::clone(&catalog));
        let item = catalog
            .create_item(
                9,
                tagbook_core::types::NewItem {
                    group_id: 0,
                    name: "Coffee".to_string(),
                },
            )
            .await
            .expect("create item");
        catalog
            .link_transaction_items(9, 321, 1_700_000_000, &[item.item_id])
            .await
            .expect("link item");

        let (status, json) = call(
            &router,
            "GET",
            "/api/v1/transactions/items?ids=321,322",
            9,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({ "321": [item.item_id.to_string()] })
        );

        let (status, json) = call(
            &router,
            "DELETE",
            &format!("/api/v1/items/{}", item.item_id),
            9,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code(&json), Some("in_use_cannot_delete"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let router = test_router(test_catalog());
        let name = "x".repeat(BODY_LIMIT + 1);
        let (status, _) = call(
            &router,
            "POST",
            "/api/v1/item-groups",
            1,
            Some(serde_json::json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
