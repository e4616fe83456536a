use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type UserId = i32;

/// An authenticated principal.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub nickname: String,
    pub created_ts: i64,
}
