use crate::clients::GatewayError;
use aaroh_sdk::signature::SignatureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("order not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("order is not in a state that allows this operation")]
    NotReady,

    #[error("payment signature is invalid")]
    SignatureInvalid,

    #[error("order amount is below the gateway minimum")]
    InvalidAmount,

    #[error("a conflicting order already exists")]
    Conflict,

    #[error("payment gateway error: {0}")]
    Upstream(#[from] GatewayError),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for LifecycleError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => LifecycleError::Conflict,
            _ => LifecycleError::Database(e),
        }
    }
}

impl From<SignatureError> for LifecycleError {
    fn from(_: SignatureError) -> Self {
        LifecycleError::SignatureInvalid
    }
}
