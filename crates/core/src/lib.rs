pub mod config;
pub mod domain;
pub mod errors;
pub mod retrieval;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, OnceLock};

    /// Serializes tests that mutate process environment variables.
    pub fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }
}

pub use config::{AppConfig, ConfigError, LoadOptions};
pub use domain::envelope::{EnvelopeStatus, ResultEnvelope};
pub use domain::record::{RetrievalRecord, UNKNOWN_SOURCE};
pub use errors::{ClientError, ErrorKind, RetrievalError};
pub use retrieval::{
    ClientFactory, KnowledgeBaseClient, RetrieveRequest, RetrieveResponse, Retriever,
    RetrieverSettings, MAX_RESULTS,
};
