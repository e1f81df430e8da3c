/// A data message received on the spectrum socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    /// A binary frame, one byte per bin
    Binary(Vec<u8>),
    /// A text frame; not part of the spectrum protocol
    Text(String),
}

/// Events emitted by the connection manager to the render pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The socket finished its upgrade handshake
    Opened {
        /// Endpoint the socket is connected to
        endpoint: String,
    },

    /// A data message arrived
    Message(WireMessage),

    /// The socket closed, failed to connect, or errored
    Closed {
        /// Optional reason for the disconnect
        reason: Option<String>,
    },
}
