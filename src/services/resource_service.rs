//! src/services/resource_service.rs
//!
//! ResourceService — list, patch and delete the caller's resource metadata
//! and map stored rows into their API representation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{
    auth::{AuthError, PrincipalResolver, RequestContext},
    models::{
        memo::FindMemo,
        resource::{DeleteResource, FindResource, Resource, ResourceId, UpdateResource},
        user::User,
    },
    store::{ResourceStore, StoreError},
};

/// Update mask entry selecting `filename`.
pub const MASK_FILENAME: &str = "filename";
/// Update mask entry selecting `memo_id`.
pub const MASK_MEMO_ID: &str = "memo_id";

/// API representation of a resource.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ResourceView {
    pub id: ResourceId,
    pub created_ts: DateTime<Utc>,
    pub filename: String,
    pub external_link: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
    /// Present only when the associated memo could be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo_id: Option<i32>,
}

/// New field values; only the entries named by the update mask are applied.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ResourceFields {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub memo_id: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct UpdateResourceRequest {
    pub id: ResourceId,
    pub resource: ResourceFields,
    pub update_mask: Vec<String>,
}

/// How a failure is reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    Internal,
    NotFound,
}

#[derive(Debug, Error)]
pub enum ResourceServiceError {
    #[error("failed to get current user: {0}")]
    CurrentUser(#[source] AuthError),
    #[error("failed to list resources: {0}")]
    List(#[source] StoreError),
    #[error("failed to find resource: {0}")]
    Find(#[source] StoreError),
    #[error("failed to update resource: {0}")]
    Update(#[source] StoreError),
    #[error("failed to delete resource: {0}")]
    Delete(#[source] StoreError),
    #[error("resource not found")]
    NotFound,
}

impl ResourceServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound => ErrorCode::NotFound,
            _ => ErrorCode::Internal,
        }
    }
}

pub type ServiceResult<T> = Result<T, ResourceServiceError>;

#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn ResourceStore>,
    principals: Arc<dyn PrincipalResolver>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn ResourceStore>, principals: Arc<dyn PrincipalResolver>) -> Self {
        Self { store, principals }
    }

    async fn current_user(&self, ctx: &RequestContext) -> ServiceResult<User> {
        self.principals
            .current_user(ctx)
            .await
            .map_err(ResourceServiceError::CurrentUser)
    }

    /// Look up `id` constrained to `creator_id`.
    ///
    /// A missing row and a row owned by someone else both come back as
    /// `NotFound`.
    async fn find_owned(&self, id: ResourceId, creator_id: i32) -> ServiceResult<Resource> {
        self.store
            .get_resource(&FindResource {
                id: Some(id),
                creator_id: Some(creator_id),
            })
            .await
            .map_err(ResourceServiceError::Find)?
            .ok_or(ResourceServiceError::NotFound)
    }

    /// All resources created by the caller.
    #[instrument(skip(self, ctx))]
    pub async fn list_resources(&self, ctx: &RequestContext) -> ServiceResult<Vec<ResourceView>> {
        let user = self.current_user(ctx).await?;
        let resources = self
            .store
            .list_resources(&FindResource {
                creator_id: Some(user.id),
                ..Default::default()
            })
            .await
            .map_err(ResourceServiceError::List)?;

        let mut views = Vec::with_capacity(resources.len());
        for resource in resources {
            views.push(self.to_view(resource).await);
        }
        debug!("listed {} resources for user {}", views.len(), user.id);
        Ok(views)
    }

    /// Patch the fields named in `update_mask` and bump `updated_ts`.
    ///
    /// Unknown mask entries are ignored. The caller must own the resource.
    #[instrument(skip(self, ctx, request), fields(resource_id = request.id))]
    pub async fn update_resource(
        &self,
        ctx: &RequestContext,
        request: UpdateResourceRequest,
    ) -> ServiceResult<ResourceView> {
        let user = self.current_user(ctx).await?;
        self.find_owned(request.id, user.id).await?;

        let update = build_update(request, Utc::now().timestamp());
        let resource = self
            .store
            .update_resource(&update)
            .await
            .map_err(ResourceServiceError::Update)?;
        Ok(self.to_view(resource).await)
    }

    #[instrument(skip(self, ctx))]
    pub async fn delete_resource(&self, ctx: &RequestContext, id: ResourceId) -> ServiceResult<()> {
        let user = self.current_user(ctx).await?;
        let resource = self.find_owned(id, user.id).await?;
        self.store
            .delete_resource(&DeleteResource { id: resource.id })
            .await
            .map_err(ResourceServiceError::Delete)?;
        debug!("deleted resource {}", resource.id);
        Ok(())
    }

    /// Map a stored row into its API shape.
    ///
    /// The memo association is resolved best-effort: a failed or empty
    /// lookup drops `memo_id` rather than failing the response.
    pub async fn to_view(&self, resource: Resource) -> ResourceView {
        let memo_id = match resource.memo_id {
            Some(memo_id) => self.resolve_memo_id(memo_id).await,
            None => None,
        };

        ResourceView {
            id: resource.id,
            created_ts: DateTime::from_timestamp(resource.created_ts, 0).unwrap_or_default(),
            filename: resource.filename,
            external_link: resource.external_link,
            content_type: resource.content_type,
            size: resource.size,
            memo_id,
        }
    }

    async fn resolve_memo_id(&self, memo_id: i32) -> Option<i32> {
        match self.store.get_memo(&FindMemo { id: Some(memo_id) }).await {
            Ok(Some(memo)) => Some(memo.id),
            Ok(None) => {
                debug!("memo {} referenced by a resource no longer exists", memo_id);
                None
            }
            Err(err) => {
                warn!("failed to resolve memo {}: {}", memo_id, err);
                None
            }
        }
    }
}

fn build_update(request: UpdateResourceRequest, now: i64) -> UpdateResource {
    let mut update = UpdateResource::new(request.id, now);
    for field in &request.update_mask {
        match field.as_str() {
            MASK_FILENAME => update.filename = Some(request.resource.filename.clone()),
            MASK_MEMO_ID => {
                // A null memo_id leaves the association as it is.
                if request.resource.memo_id.is_some() {
                    update.memo_id = request.resource.memo_id;
                }
            }
            _ => {}
        }
    }
    update
}
