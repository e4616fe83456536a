//! src/store/sqlite.rs
//!
//! SqliteStore — resource, memo and access-token queries against SQLite.
//! Filters and patches are assembled with `QueryBuilder` so that unset
//! fields never reach the SQL.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use tracing::{debug, instrument};

use super::{ResourceStore, StoreError, StoreResult};
use crate::{
    auth::{AuthError, PrincipalResolver, RequestContext},
    models::{
        memo::{FindMemo, Memo},
        resource::{DeleteResource, FindResource, Resource, UpdateResource},
        user::User,
    },
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const RESOURCE_COLUMNS: &str =
    "id, creator_id, created_ts, updated_ts, filename, external_link, type, size, memo_id";

#[derive(Clone)]
pub struct SqliteStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl SqliteStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Apply the embedded schema one statement at a time.
    ///
    /// Every statement is `IF NOT EXISTS`, so running this against an
    /// initialized database is a no-op.
    pub async fn migrate(&self) -> StoreResult<()> {
        let statements = SCHEMA
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        tracing::info!("Running {} migration statements...", statements.len());

        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Cheap connectivity probe used by readiness checks.
    pub async fn ping(&self) -> StoreResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?)
    }

    fn select_resources(find: &FindResource) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
        builder.push(RESOURCE_COLUMNS);
        builder.push(" FROM resources WHERE 1 = 1");
        if let Some(id) = find.id {
            builder.push(" AND id = ");
            builder.push_bind(id);
        }
        if let Some(creator_id) = find.creator_id {
            builder.push(" AND creator_id = ");
            builder.push_bind(creator_id);
        }
        builder.push(" ORDER BY id ASC");
        builder
    }
}

#[async_trait]
impl ResourceStore for SqliteStore {
    #[instrument(skip(self))]
    async fn list_resources(&self, find: &FindResource) -> StoreResult<Vec<Resource>> {
        let mut builder = Self::select_resources(find);
        let rows = builder
            .build_query_as::<Resource>()
            .fetch_all(&*self.db)
            .await?;
        debug!("listed {} resources", rows.len());
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn get_resource(&self, find: &FindResource) -> StoreResult<Option<Resource>> {
        let mut builder = Self::select_resources(find);
        builder.push(" LIMIT 1");
        Ok(builder
            .build_query_as::<Resource>()
            .fetch_optional(&*self.db)
            .await?)
    }

    #[instrument(skip(self), fields(resource_id = update.id))]
    async fn update_resource(&self, update: &UpdateResource) -> StoreResult<Resource> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE resources SET updated_ts = ");
        builder.push_bind(update.updated_ts);
        if let Some(filename) = &update.filename {
            builder.push(", filename = ");
            builder.push_bind(filename.clone());
        }
        if let Some(memo_id) = update.memo_id {
            builder.push(", memo_id = ");
            builder.push_bind(memo_id);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(update.id);
        builder.push(" RETURNING ");
        builder.push(RESOURCE_COLUMNS);

        builder
            .build_query_as::<Resource>()
            .fetch_optional(&*self.db)
            .await?
            .ok_or(StoreError::ResourceMissing(update.id))
    }

    #[instrument(skip(self), fields(resource_id = delete.id))]
    async fn delete_resource(&self, delete: &DeleteResource) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(delete.id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            debug!("resource {} was already gone", delete.id);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_memo(&self, find: &FindMemo) -> StoreResult<Option<Memo>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, creator_id, created_ts, updated_ts, content FROM memos WHERE 1 = 1",
        );
        if let Some(id) = find.id {
            builder.push(" AND id = ");
            builder.push_bind(id);
        }
        builder.push(" ORDER BY id ASC LIMIT 1");
        Ok(builder
            .build_query_as::<Memo>()
            .fetch_optional(&*self.db)
            .await?)
    }
}

#[async_trait]
impl PrincipalResolver for SqliteStore {
    async fn current_user(&self, ctx: &RequestContext) -> Result<User, AuthError> {
        let token = ctx
            .access_token
            .as_deref()
            .ok_or(AuthError::MissingCredentials)?;
        sqlx::query_as::<_, User>(
            "SELECT users.id AS id, users.username AS username, users.nickname AS nickname,
                    users.created_ts AS created_ts
             FROM user_access_tokens JOIN users ON users.id = user_access_tokens.user_id
             WHERE user_access_tokens.token = ?",
        )
        .bind(token)
        .fetch_optional(&*self.db)
        .await
        .map_err(StoreError::from)?
        .ok_or(AuthError::UnknownToken)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_is_repeatable() {
        let store = SqliteStore::in_memory().await;
        store.migrate().await.unwrap();
        assert_eq!(store.ping().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_filters_by_creator() {
        let store = SqliteStore::in_memory().await;
        let alice = store.create_user("alice", "alice-token").await;
        let bob = store.create_user("bob", "bob-token").await;
        let a1 = store.create_resource(alice.id, "a1.png", None).await;
        store.create_resource(bob.id, "b1.png", None).await;
        let a2 = store.create_resource(alice.id, "a2.png", None).await;

        let rows = store
            .list_resources(&FindResource {
                creator_id: Some(alice.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rows, vec![a1, a2]);

        let all = store.list_resources(&FindResource::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn get_requires_every_filter_to_match() {
        let store = SqliteStore::in_memory().await;
        let alice = store.create_user("alice", "alice-token").await;
        let bob = store.create_user("bob", "bob-token").await;
        let resource = store.create_resource(alice.id, "a.png", None).await;

        let found = store
            .get_resource(&FindResource {
                id: Some(resource.id),
                creator_id: Some(alice.id),
            })
            .await
            .unwrap();
        assert_eq!(found, Some(resource.clone()));

        let foreign = store
            .get_resource(&FindResource {
                id: Some(resource.id),
                creator_id: Some(bob.id),
            })
            .await
            .unwrap();
        assert!(foreign.is_none());
    }

    #[tokio::test]
    async fn update_touches_only_patched_columns() {
        let store = SqliteStore::in_memory().await;
        let alice = store.create_user("alice", "alice-token").await;
        let memo = store.create_memo(alice.id, "hello").await;
        let resource = store.create_resource(alice.id, "a.png", Some(memo.id)).await;

        let mut update = UpdateResource::new(resource.id, 1_800_000_000);
        update.filename = Some("b.png".into());
        let updated = store.update_resource(&update).await.unwrap();

        assert_eq!(updated.filename, "b.png");
        assert_eq!(updated.updated_ts, 1_800_000_000);
        assert_eq!(updated.memo_id, Some(memo.id));
        assert_eq!(updated.created_ts, resource.created_ts);
        assert_eq!(updated.creator_id, alice.id);
    }

    #[tokio::test]
    async fn update_moves_resource_to_another_memo() {
        let store = SqliteStore::in_memory().await;
        let alice = store.create_user("alice", "alice-token").await;
        let first = store.create_memo(alice.id, "hello").await;
        let second = store.create_memo(alice.id, "again").await;
        let resource = store.create_resource(alice.id, "a.png", Some(first.id)).await;

        let mut update = UpdateResource::new(resource.id, 1_800_000_000);
        update.memo_id = Some(second.id);
        let updated = store.update_resource(&update).await.unwrap();

        assert_eq!(updated.memo_id, Some(second.id));
        assert_eq!(updated.filename, "a.png");
    }

    #[tokio::test]
    async fn update_without_memo_keeps_association() {
        let store = SqliteStore::in_memory().await;
        let alice = store.create_user("alice", "alice-token").await;
        let memo = store.create_memo(alice.id, "hello").await;
        let resource = store.create_resource(alice.id, "a.png", Some(memo.id)).await;

        let updated = store
            .update_resource(&UpdateResource::new(resource.id, 1_800_000_000))
            .await
            .unwrap();

        assert_eq!(updated.memo_id, Some(memo.id));
        assert_eq!(updated.updated_ts, 1_800_000_000);
    }

    #[tokio::test]
    async fn update_of_missing_row_fails() {
        let store = SqliteStore::in_memory().await;
        let err = store
            .update_resource(&UpdateResource::new(42, 1_800_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceMissing(42)));
    }

    #[tokio::test]
    async fn delete_removes_row_and_tolerates_repeats() {
        let store = SqliteStore::in_memory().await;
        let alice = store.create_user("alice", "alice-token").await;
        let resource = store.create_resource(alice.id, "a.png", None).await;

        store
            .delete_resource(&DeleteResource { id: resource.id })
            .await
            .unwrap();
        let found = store
            .get_resource(&FindResource {
                id: Some(resource.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(found.is_none());

        store
            .delete_resource(&DeleteResource { id: resource.id })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_memo_misses_return_none() {
        let store = SqliteStore::in_memory().await;
        let alice = store.create_user("alice", "alice-token").await;
        let memo = store.create_memo(alice.id, "hello").await;

        let found = store
            .get_memo(&FindMemo { id: Some(memo.id) })
            .await
            .unwrap();
        assert_eq!(found, Some(memo));

        let missing = store.get_memo(&FindMemo { id: Some(999) }).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn resolves_principal_from_access_token() {
        let store = SqliteStore::in_memory().await;
        let alice = store.create_user("alice", "alice-token").await;

        let user = store
            .current_user(&RequestContext::with_token("alice-token"))
            .await
            .unwrap();
        assert_eq!(user, alice);

        let err = store
            .current_user(&RequestContext::with_token("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownToken));

        let err = store
            .current_user(&RequestContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }
}
