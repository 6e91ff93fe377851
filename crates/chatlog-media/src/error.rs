use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("No decryption capability configured")]
    DecryptorUnavailable,

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("Could not move decrypted image into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MediaError>;
