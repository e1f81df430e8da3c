use thiserror::Error;

/// Unified error type for the spectrum client.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Connection is already open")]
    AlreadyConnected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
