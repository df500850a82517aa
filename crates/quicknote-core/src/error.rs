use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage read error: {0}")]
    StorageRead(String),

    #[error("storage write error: {0}")]
    StorageWrite(String),

    #[error("internal error: {0}")]
    Internal(String),
}
