//! Storage capability consumed by the resource service.
//!
//! Lookups that may legitimately miss return `Ok(None)`; `Err` is reserved
//! for failures of the query itself.

pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    memo::{FindMemo, Memo},
    resource::{DeleteResource, FindResource, Resource, UpdateResource},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource {0} does not exist")]
    ResourceMissing(i32),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// All resources matching `find`, in ascending id order.
    async fn list_resources(&self, find: &FindResource) -> StoreResult<Vec<Resource>>;

    /// First resource matching `find`.
    async fn get_resource(&self, find: &FindResource) -> StoreResult<Option<Resource>>;

    /// Apply `update` and return the row as stored afterwards.
    async fn update_resource(&self, update: &UpdateResource) -> StoreResult<Resource>;

    async fn delete_resource(&self, delete: &DeleteResource) -> StoreResult<()>;

    async fn get_memo(&self, find: &FindMemo) -> StoreResult<Option<Memo>>;
}
