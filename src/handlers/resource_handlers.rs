//! HTTP handlers for resource metadata.
//! Credentials come from the `Authorization` header; everything else is
//! delegated to `ResourceService`.

use crate::{
    auth::RequestContext,
    errors::AppError,
    models::resource::ResourceId,
    services::resource_service::{ResourceFields, ResourceView, UpdateResourceRequest},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ListResourcesResponse {
    pub resources: Vec<ResourceView>,
}

/// Body of `PATCH /api/v2/resources/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateResourceBody {
    #[serde(default)]
    pub resource: ResourceFields,
    #[serde(default)]
    pub update_mask: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResourceResponse {
    pub resource: ResourceView,
}

#[derive(Debug, Serialize)]
pub struct DeleteResourceResponse {}

/// GET `/api/v2/resources` — every resource owned by the caller.
pub async fn list_resources(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ListResourcesResponse>, AppError> {
    let resources = state.resources.list_resources(&ctx).await?;
    Ok(Json(ListResourcesResponse { resources }))
}

/// PATCH `/api/v2/resources/{id}` — apply the fields named in `update_mask`.
pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<ResourceId>,
    ctx: RequestContext,
    Json(body): Json<UpdateResourceBody>,
) -> Result<Json<UpdateResourceResponse>, AppError> {
    let resource = state
        .resources
        .update_resource(
            &ctx,
            UpdateResourceRequest {
                id,
                resource: body.resource,
                update_mask: body.update_mask,
            },
        )
        .await?;
    Ok(Json(UpdateResourceResponse { resource }))
}

/// DELETE `/api/v2/resources/{id}`
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<ResourceId>,
    ctx: RequestContext,
) -> Result<Json<DeleteResourceResponse>, AppError> {
    state.resources.delete_resource(&ctx, id).await?;
    Ok(Json(DeleteResourceResponse {}))
}
