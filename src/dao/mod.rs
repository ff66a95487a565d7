/// Database model definitions.
pub mod models;
/// Roster persistence backends.
pub mod roster_store;
/// Storage abstraction layer for database operations.
pub mod storage;
