//! SeaORM entities for the printhouse production domain.

pub mod audit_log;
pub mod blank;
pub mod blank_variant;
pub mod inventory_transaction;
pub mod line_item;
pub mod order;
pub mod print;
pub mod product;
pub mod product_variant;
pub mod session;
pub mod session_order;
