//! Wallet ledger schema.
//!
//! Creates the transaction, ledger entry and idempotency record tables. The
//! constraints here back the engine's guarantees: one transaction per
//! idempotency key, one entry per transaction, no negative running balance.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(WALLET_LEDGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS idempotency_records CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TYPE IF EXISTS transaction_type;
",
        )
        .await?;
        Ok(())
    }
}

const WALLET_LEDGER_SQL: &str = r"
CREATE TYPE transaction_type AS ENUM ('DEPOSIT', 'WITHDRAWAL');

-- Immutable transaction log
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    type transaction_type NOT NULL,
    amount NUMERIC(19, 2) NOT NULL,
    description TEXT,
    idempotency_key VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_transactions_idempotency_key UNIQUE (idempotency_key),
    CONSTRAINT chk_transactions_amount_positive CHECK (amount > 0)
);

-- Listing: newest first per user
CREATE INDEX idx_transactions_user_created ON transactions(user_id, created_at DESC, id DESC);

-- Append-only running balance chain, ordered by id per user
CREATE TABLE ledger_entries (
    id BIGSERIAL PRIMARY KEY,
    transaction_id UUID NOT NULL REFERENCES transactions(id) ON DELETE RESTRICT,
    user_id UUID NOT NULL,
    type transaction_type NOT NULL,
    amount NUMERIC(19, 2) NOT NULL,
    running_balance NUMERIC(19, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_ledger_entries_transaction UNIQUE (transaction_id),
    CONSTRAINT chk_ledger_entries_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_ledger_entries_running_balance CHECK (running_balance >= 0)
);

-- Balance read and tail lock: latest entry per user
CREATE INDEX idx_ledger_entries_user_id ON ledger_entries(user_id, id DESC);

-- Stored responses for keyed create requests
CREATE TABLE idempotency_records (
    id UUID PRIMARY KEY,
    key VARCHAR(255) NOT NULL,
    user_id UUID NOT NULL,
    response_body JSONB NOT NULL,
    status_code INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    expires_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_idempotency_records_key_user UNIQUE (key, user_id)
);

-- Cleanup of expired records
CREATE INDEX idx_idempotency_records_expires ON idempotency_records(expires_at);
";
