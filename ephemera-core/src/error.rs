use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Splice out of bounds: {position}+{delete} exceeds length {length}")]
    OutOfBounds {
        position: usize,
        delete: usize,
        length: usize,
    },
    #[error("Failed to decode update: {0}")]
    Decode(String),
    #[error("Failed to apply update: {0}")]
    Update(String),
}
