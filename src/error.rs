use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No {entity} with id {id} was found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("Not enough candidates: requested {requested}, only {available} available")]
    InsufficientCandidates { requested: usize, available: usize },
    #[error("Order id could not be decoded")]
    InvalidOrderId,
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;
