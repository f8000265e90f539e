//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{AMOUNT_CEILING, Amount, AmountError};
pub use pagination::{MAX_OFFSET, Page, PageBounds, PageRequest, PaginationError};
