use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No messages found for conversation {0}")]
    NoMessages(String),
}
