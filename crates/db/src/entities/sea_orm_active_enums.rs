//! `SeaORM` active enums mirroring Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `transaction_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    /// Adds funds.
    #[sea_orm(string_value = "DEPOSIT")]
    Deposit,
    /// Removes funds.
    #[sea_orm(string_value = "WITHDRAWAL")]
    Withdrawal,
}

impl From<wallet_core::ledger::TransactionType> for TransactionType {
    fn from(kind: wallet_core::ledger::TransactionType) -> Self {
        match kind {
            wallet_core::ledger::TransactionType::Deposit => Self::Deposit,
            wallet_core::ledger::TransactionType::Withdrawal => Self::Withdrawal,
        }
    }
}

impl From<TransactionType> for wallet_core::ledger::TransactionType {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Deposit => Self::Deposit,
            TransactionType::Withdrawal => Self::Withdrawal,
        }
    }
}
