use std::io;

use thiserror::Error;

pub type ChatResult<T> = Result<T, ChatError>;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Message(String),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("dotenv: {0}")]
    Dotenv(#[from] dotenv::Error),

    #[error("Failed to create socket. {0}.")]
    Socket(#[source] io::Error),

    #[error("Failed to connect to server. {0}.")]
    Connect(#[source] io::Error),

    #[error("Failed to receive message from server. {0}.")]
    Receive(#[source] io::Error),

    #[error("Failed to send username to server. {0}.")]
    SendUsername(#[source] io::Error),

    /// The server accepted the connection and closed it without a welcome.
    #[error("All connections are busy. Try again later.")]
    ServerBusy,

    #[error("poll() failed. {0}.")]
    Wait(#[source] io::Error),
}

impl From<String> for ChatError {
    fn from(msg: String) -> Self {
        Self::Message(msg)
    }
}
