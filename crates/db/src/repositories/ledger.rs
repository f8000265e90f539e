//! Ledger entry reads.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use wallet_core::ledger::{LedgerEntry, LedgerError, LedgerRepository};
use wallet_shared::types::{TransactionId, UserId};

use crate::entities::ledger_entries;
use crate::error::classify_read;

impl From<ledger_entries::Model> for LedgerEntry {
    fn from(model: ledger_entries::Model) -> Self {
        Self {
            id: model.id,
            transaction_id: TransactionId::from_uuid(model.transaction_id),
            user_id: UserId::from_uuid(model.user_id),
            kind: model.entry_type.into(),
            amount: model.amount,
            running_balance: model.running_balance,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Read-only access to `ledger_entries`. Takes no locks.
#[derive(Debug, Clone)]
pub struct PgLedgerRepository {
    db: DatabaseConnection,
}

impl PgLedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn latest_entry(&self, user_id: UserId) -> Result<Option<LedgerEntry>, LedgerError> {
        let entry = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(ledger_entries::Column::Id)
            .one(&self.db)
            .await
            .map_err(classify_read)?;
        Ok(entry.map(Into::into))
    }

    async fn entries_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(classify_read)?;
        Ok(entries.into_iter().map(Into::into).collect())
    }
}
