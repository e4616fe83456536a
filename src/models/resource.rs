//! Resource rows and the filter/patch structs the store accepts for them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type ResourceId = i32;

/// Metadata for a single attachment.
///
/// Only the metadata row lives here; the payload is either stored by the
/// upload path or reachable through `external_link`.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Resource {
    pub id: ResourceId,

    /// Owning user. Never changes after creation.
    pub creator_id: i32,

    /// Seconds since epoch.
    pub created_ts: i64,

    /// Seconds since epoch, stamped by every update.
    pub updated_ts: i64,

    pub filename: String,

    /// Empty when the payload is stored locally.
    pub external_link: String,

    /// Content type (MIME type).
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub content_type: String,

    /// Size in bytes.
    pub size: i64,

    /// Memo this resource is attached to, if any.
    pub memo_id: Option<i32>,
}

/// Filter for resource lookups. Unset fields do not constrain the query.
#[derive(Clone, Debug, Default)]
pub struct FindResource {
    pub id: Option<ResourceId>,
    pub creator_id: Option<i32>,
}

/// Partial update. `None` leaves a column untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateResource {
    pub id: ResourceId,
    pub updated_ts: i64,
    pub filename: Option<String>,
    pub memo_id: Option<i32>,
}

impl UpdateResource {
    pub fn new(id: ResourceId, updated_ts: i64) -> Self {
        Self {
            id,
            updated_ts,
            filename: None,
            memo_id: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DeleteResource {
    pub id: ResourceId,
}
