//! Business-logic services over the database and event channel.

pub mod inventory;
pub mod sessions;
pub mod settlement;
