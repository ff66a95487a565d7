mod config;
mod error;
mod models;
/// Store implementation over the MongoDB collections.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoRosterStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        if err.is_duplicate_key() {
            StorageError::conflict(err.to_string())
        } else {
            StorageError::unavailable(err.to_string(), err)
        }
    }
}
