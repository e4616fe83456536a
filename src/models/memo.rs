//! Memo rows, read here only to resolve resource associations.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Memo {
    pub id: i32,
    pub creator_id: i32,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub content: String,
}

#[derive(Clone, Debug, Default)]
pub struct FindMemo {
    pub id: Option<i32>,
}
