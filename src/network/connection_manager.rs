use futures_util::StreamExt;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc::Sender, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::events::{ConnectionEvent, WireMessage};
use crate::error::{Error, Result};

type SpectrumStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a connect waits for the upgrade handshake
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `close` waits for the reader task to finish the close handshake
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection state of the spectrum socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owns the WebSocket connection to the spectrum endpoint.
///
/// Lifecycle changes and data messages are delivered, in receive order, on the
/// event channel handed to [`ConnectionManager::new`]. A dropped connection is
/// never retried here; call [`ConnectionManager::open`] again to reconnect.
pub struct ConnectionManager {
    /// Endpoint URL, e.g. `ws://127.0.0.1:8080/spectrum`
    endpoint: String,

    /// Connection state, shared with the reader task
    state: Arc<Mutex<ConnectionState>>,

    /// Channel to the render pipeline
    event_tx: Sender<ConnectionEvent>,

    /// Signals the reader task to send a close frame
    shutdown_tx: Option<oneshot::Sender<()>>,

    /// Background reader task
    reader: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Create a new connection manager
    pub fn new(endpoint: impl Into<String>, event_tx: Sender<ConnectionEvent>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            event_tx,
            shutdown_tx: None,
            reader: None,
        }
    }

    /// Connect to the endpoint and start forwarding messages
    pub async fn open(&mut self) -> Result<()> {
        self.begin_connect().await?;

        let stream = match connect_stream(&self.endpoint).await {
            Ok(stream) => stream,
            Err(reason) => return Err(self.fail_connect(reason).await),
        };

        *self.state.lock().await = ConnectionState::Connected;
        info!("Connected to {}", self.endpoint);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);
        self.reader = Some(tokio::spawn(read_loop(
            stream,
            self.endpoint.clone(),
            self.state.clone(),
            self.event_tx.clone(),
            shutdown_rx,
        )));

        Ok(())
    }

    /// Start connecting without waiting for the handshake.
    ///
    /// Success arrives as `Opened` on the event channel, failure as `Closed`.
    /// [`ConnectionManager::close`] cancels a handshake still in flight.
    pub async fn spawn_open(&mut self) -> Result<()> {
        self.begin_connect().await?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);
        self.reader = Some(tokio::spawn(connect_then_read(
            self.endpoint.clone(),
            self.state.clone(),
            self.event_tx.clone(),
            shutdown_rx,
        )));

        Ok(())
    }

    /// Close the connection, if any, and wait for the reader to finish
    pub async fn close(&mut self) -> Result<()> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(mut handle) = self.reader.take() {
            match tokio::time::timeout(CLOSE_TIMEOUT, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Reader task ended abnormally: {}", e),
                Err(_) => {
                    warn!("Reader task did not finish in time, aborting");
                    handle.abort();
                }
            }
        }

        *self.state.lock().await = ConnectionState::Disconnected;
        Ok(())
    }

    /// Get the current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn begin_connect(&mut self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if *state != ConnectionState::Disconnected {
                return Err(Error::AlreadyConnected);
            }
            *state = ConnectionState::Connecting;
        }

        // A previous reader has already finished if we are disconnected
        if let Some(handle) = self.reader.take() {
            handle.abort();
        }
        self.shutdown_tx = None;

        info!("Connecting to {}", self.endpoint);
        Ok(())
    }

    async fn fail_connect(&self, reason: String) -> Error {
        warn!("Failed to connect to {}: {}", self.endpoint, reason);
        *self.state.lock().await = ConnectionState::Disconnected;

        // The caller may be the only consumer of the channel, so never wait here
        if let Err(e) = self.event_tx.try_send(ConnectionEvent::Closed {
            reason: Some(reason.clone()),
        }) {
            debug!("Could not report connect failure: {}", e);
        }

        Error::ConnectionLost(reason)
    }
}

/// Run the upgrade handshake, bounded by `CONNECT_TIMEOUT`
async fn connect_stream(endpoint: &str) -> std::result::Result<SpectrumStream, String> {
    match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(endpoint)).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("connection timed out".to_string()),
    }
}

/// Background half of `spawn_open`: connect, then hand over to the reader
async fn connect_then_read(
    endpoint: String,
    state: Arc<Mutex<ConnectionState>>,
    event_tx: Sender<ConnectionEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let connected = tokio::select! {
        _ = &mut shutdown_rx => Err("closed by client".to_string()),
        result = connect_stream(&endpoint) => result,
    };

    match connected {
        Ok(stream) => {
            *state.lock().await = ConnectionState::Connected;
            info!("Connected to {}", endpoint);
            read_loop(stream, endpoint, state, event_tx, shutdown_rx).await;
        }
        Err(reason) => {
            warn!("Failed to connect to {}: {}", endpoint, reason);
            *state.lock().await = ConnectionState::Disconnected;
            if let Err(e) = event_tx
                .send(ConnectionEvent::Closed {
                    reason: Some(reason),
                })
                .await
            {
                debug!("Could not report connect failure: {}", e);
            }
        }
    }
}

/// Forward socket messages until the connection ends or shutdown is requested
async fn read_loop(
    mut stream: SpectrumStream,
    endpoint: String,
    state: Arc<Mutex<ConnectionState>>,
    event_tx: Sender<ConnectionEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    if event_tx
        .send(ConnectionEvent::Opened { endpoint })
        .await
        .is_err()
    {
        debug!("Event receiver dropped before the connection opened");
    }

    let reason = loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                if let Err(e) = stream.close(None).await {
                    debug!("Close handshake failed: {}", e);
                }
                break Some("closed by client".to_string());
            }

            next = stream.next() => {
                let message = match next {
                    Some(Ok(Message::Binary(data))) => WireMessage::Binary(data),
                    Some(Ok(Message::Text(text))) => WireMessage::Text(text),
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "closed by server".to_string());
                        break Some(reason);
                    }
                    // Ping/pong are answered by tungstenite
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break Some(e.to_string()),
                    None => break None,
                };

                if event_tx.send(ConnectionEvent::Message(message)).await.is_err() {
                    debug!("Event receiver dropped, stopping reader");
                    if let Err(e) = stream.close(None).await {
                        debug!("Close handshake failed: {}", e);
                    }
                    break Some("event receiver dropped".to_string());
                }
            }
        }
    };

    *state.lock().await = ConnectionState::Disconnected;
    if let Err(e) = event_tx.send(ConnectionEvent::Closed { reason }).await {
        debug!("Event receiver dropped before the close was reported: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_manager_creation() {
        let (tx, _rx) = mpsc::channel(8);
        let manager = ConnectionManager::new("ws://127.0.0.1:8080/spectrum", tx);

        assert_eq!(manager.state().await, ConnectionState::Disconnected);
        assert_eq!(manager.endpoint(), "ws://127.0.0.1:8080/spectrum");
    }

    #[tokio::test]
    async fn test_close_when_disconnected_is_noop() {
        let (tx, _rx) = mpsc::channel(8);
        let mut manager = ConnectionManager::new("ws://127.0.0.1:8080/spectrum", tx);

        manager.close().await.unwrap();
        assert_eq!(manager.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_spawn_open_failure_arrives_as_closed() {
        // Bind then release a port so nothing is listening on it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, mut rx) = mpsc::channel(8);
        let mut manager = ConnectionManager::new(format!("ws://{}/spectrum", addr), tx);

        manager.spawn_open().await.unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, ConnectionEvent::Closed { reason: Some(_) }));
        assert_eq!(manager.state().await, ConnectionState::Disconnected);
    }
}
