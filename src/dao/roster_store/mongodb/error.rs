use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Failures of the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI did not parse.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as given.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A required environment variable is unset.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// No ping succeeded while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings tried before giving up.
        attempts: u32,
        /// Last driver error.
        #[source]
        source: MongoError,
    },
    /// A health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection of the index.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A read failed.
    #[error("failed to read from collection `{collection}`")]
    Query {
        /// Collection read from.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A write failed.
    #[error("failed to write to collection `{collection}`")]
    Write {
        /// Collection written to.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A stored id is not a UUID.
    #[error("stored document carries an invalid id `{value}`")]
    InvalidId {
        /// Raw id.
        value: String,
        /// Parse error.
        #[source]
        source: uuid::Error,
    },
}

impl MongoDaoError {
    /// Whether the error is a unique index violation.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            MongoDaoError::Write { source, .. } => is_duplicate_key(source),
            _ => false,
        }
    }
}

pub(super) fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
