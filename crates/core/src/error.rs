use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("unknown storage class `{0}`")]
    UnknownStorageClass(String),

    #[error("invalid lifecycle policy: {0}")]
    InvalidLifecyclePolicy(String),

    #[error("invalid pricing table: {0}")]
    InvalidPricing(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid inventory: {0}")]
    InvalidInventory(String),
}
