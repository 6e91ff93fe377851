use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed extension blob ({len} bytes): {source}")]
    Malformed {
        len: usize,
        #[source]
        source: prost::DecodeError,
    },
}
