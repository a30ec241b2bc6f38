//! Item demo handlers
//!
//! In-memory CRUD resource demonstrating the authorization chain: reads
//! require READ_ITEMS, creation requires WRITE_ITEMS and records the current
//! principal as owner, updates require the ADMIN role, deletion requires
//! DELETE_ITEMS (held only through the admin's implicit grant).
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use authgate_core::Principal;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

/// Item owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Id of the principal that created the item
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Item creation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Item update request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// In-memory item storage
#[derive(Default)]
pub struct ItemStore {
    items: RwLock<HashMap<String, Item>>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, item: Item) -> Item {
        self.items
            .write()
            .await
            .insert(item.id.clone(), item.clone());
        item
    }

    pub async fn get(&self, id: &str) -> Option<Item> {
        self.items.read().await.get(id).cloned()
    }

    pub async fn list(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self.items.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        items
    }

    pub async fn update(&self, id: &str, request: UpdateItemRequest) -> Option<Item> {
        let mut items = self.items.write().await;
        let item = items.get_mut(id)?;
        if let Some(name) = request.name {
            item.name = name;
        }
        if let Some(description) = request.description {
            item.description = Some(description);
        }
        Some(item.clone())
    }

    pub async fn remove(&self, id: &str) -> Option<Item> {
        self.items.write().await.remove(id)
    }
}

/// List all items
#[utoipa::path(
    get,
    path = "/api/v1/items",
    tag = "items",
    responses(
        (status = 200, description = "All items", body = [Item]),
        (status = 403, description = "Insufficient permissions", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_items(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.items.list().await)
}

/// Get a single item
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item", body = Item),
        (status = 404, description = "Item not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .items
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

    Ok(Json(item))
}

/// Create an item owned by the current principal
#[utoipa::path(
    post,
    path = "/api/v1/items",
    tag = "items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 403, description = "Insufficient permissions", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateItemRequest>,
) -> impl IntoResponse {
    let item = Item {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        description: request.description,
        owner_id: principal.id,
        created_at: Utc::now(),
    };

    let item = state.items.insert(item).await;
    (StatusCode::CREATED, Json(item))
}

/// Update an item (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 403, description = "Insufficient permissions", body = crate::error::ApiError),
        (status = 404, description = "Item not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .items
        .update(&id, request)
        .await
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

    Ok(Json(item))
}

/// Delete an item
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 403, description = "Insufficient permissions", body = crate::error::ApiError),
        (status = 404, description = "Item not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .items
        .remove(&id)
        .await
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

    Ok(Json(serde_json::json!({ "message": "Item deleted" })))
}
