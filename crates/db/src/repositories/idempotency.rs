//! Idempotency record persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use wallet_core::ledger::{IdempotencyRecord, IdempotencyRepository, LedgerError};
use wallet_shared::types::{IdempotencyRecordId, UserId};

use crate::entities::idempotency_records;
use crate::error::classify_read;

impl TryFrom<idempotency_records::Model> for IdempotencyRecord {
    type Error = LedgerError;

    fn try_from(model: idempotency_records::Model) -> Result<Self, Self::Error> {
        let status_code = u16::try_from(model.status_code)
            .map_err(|_| LedgerError::Internal(format!("invalid status code {}", model.status_code)))?;
        Ok(Self {
            id: IdempotencyRecordId::from_uuid(model.id),
            key: model.key,
            user_id: UserId::from_uuid(model.user_id),
            response_body: model.response_body,
            status_code,
            created_at: model.created_at.with_timezone(&Utc),
            expires_at: model.expires_at.with_timezone(&Utc),
        })
    }
}

/// `idempotency_records` repository.
#[derive(Debug, Clone)]
pub struct PgIdempotencyRepository {
    db: DatabaseConnection,
}

impl PgIdempotencyRepository {
    /// Creates a new idempotency repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdempotencyRepository for PgIdempotencyRepository {
    async fn find_by_key(
        &self,
        key: &str,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>, LedgerError> {
        idempotency_records::Entity::find()
            .filter(idempotency_records::Column::Key.eq(key))
            .filter(idempotency_records::Column::UserId.eq(user_id.into_inner()))
            .filter(idempotency_records::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
            .map_err(classify_read)?
            .map(IdempotencyRecord::try_from)
            .transpose()
    }

    async fn save(&self, record: IdempotencyRecord) -> Result<(), LedgerError> {
        let model = idempotency_records::ActiveModel {
            id: Set(record.id.into_inner()),
            key: Set(record.key),
            user_id: Set(record.user_id.into_inner()),
            response_body: Set(record.response_body),
            status_code: Set(i32::from(record.status_code)),
            created_at: Set(record.created_at.into()),
            expires_at: Set(record.expires_at.into()),
        };

        // First writer wins; a concurrent save for the same (key, user) is a no-op.
        idempotency_records::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    idempotency_records::Column::Key,
                    idempotency_records::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(classify_read)?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        let result = idempotency_records::Entity::delete_many()
            .filter(idempotency_records::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .map_err(classify_read)?;
        Ok(result.rows_affected)
    }
}
