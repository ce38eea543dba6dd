use crate::monitoring::domain::{WireMessage, WireResponse};
use crate::ports::outbound::{DriverPort, PortConnection};
use crate::shared::error::ChannelError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// WireChannel owns the connection to the minifilter port
///
/// State machine: `Disconnected -> Connecting -> Connected -> Disconnected`.
/// Connect attempts are serialized behind a single-slot lock, so concurrent
/// callers never produce two live handles. Any fault while reading or
/// replying discards the handle; the caller reconnects after its backoff.
///
/// Reads and replies share the handle lock, so one task should drive the
/// read/respond cycle.
pub struct WireChannel {
    port: Arc<dyn DriverPort>,
    port_name: String,
    connect_lock: Mutex<()>,
    connection: Mutex<Option<Box<dyn PortConnection>>>,
    state: watch::Sender<ConnectionState>,
    connections_established: AtomicU64,
}

impl WireChannel {
    pub fn new(port: Arc<dyn DriverPort>, port_name: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            port,
            port_name: port_name.into(),
            connect_lock: Mutex::new(()),
            connection: Mutex::new(None),
            state,
            connections_established: AtomicU64::new(0),
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Total handles opened over the channel's lifetime.
    pub fn connections_established(&self) -> u64 {
        self.connections_established.load(Ordering::SeqCst)
    }

    /// Opens the port unless a live handle already exists
    ///
    /// # Errors
    /// Returns the port's error and leaves the channel `Disconnected`
    pub async fn connect(&self) -> Result<(), ChannelError> {
        let _guard = self.connect_lock.lock().await;
        if self.is_connected() {
            return Ok(());
        }

        self.state.send_replace(ConnectionState::Connecting);
        match self.port.connect(&self.port_name).await {
            Ok(connection) => {
                *self.connection.lock().await = Some(connection);
                self.connections_established.fetch_add(1, Ordering::SeqCst);
                self.state.send_replace(ConnectionState::Connected);
                tracing::info!(port = %self.port_name, "Connected to driver port");
                Ok(())
            }
            Err(e) => {
                self.state.send_replace(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Waits at most `timeout` for the next driver request
    ///
    /// # Returns
    /// `Ok(None)` when nothing arrived, which callers treat as idle
    ///
    /// # Errors
    /// - [`ChannelError::NotConnected`] without a live handle
    /// - Any I/O fault or malformed frame, after tearing the handle down
    pub async fn read_request(&self, timeout: Duration) -> Result<Option<WireMessage>, ChannelError> {
        let mut slot = self.connection.lock().await;
        let Some(connection) = slot.as_mut() else {
            return Err(ChannelError::NotConnected);
        };

        let received = match tokio::time::timeout(timeout, connection.receive(timeout)).await {
            Ok(result) => result,
            Err(_) => Ok(None),
        };

        let frame = match received {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.tear_down(&mut slot, &e);
                return Err(e);
            }
        };

        match WireMessage::decode(&frame) {
            Ok(message) => Ok(Some(message)),
            Err(e) => {
                self.tear_down(&mut slot, &e);
                Err(e)
            }
        }
    }

    /// Writes one correlated response
    ///
    /// # Errors
    /// A partial write counts as a connection fault and tears the handle down
    pub async fn send_response(&self, response: &WireResponse) -> Result<(), ChannelError> {
        let frame = response.encode();
        let mut slot = self.connection.lock().await;
        let Some(connection) = slot.as_mut() else {
            return Err(ChannelError::NotConnected);
        };

        let error = match connection.reply(&frame).await {
            Ok(written) if written == frame.len() => return Ok(()),
            Ok(written) => ChannelError::ShortWrite {
                written,
                expected: frame.len(),
            },
            Err(e) => e,
        };
        self.tear_down(&mut slot, &error);
        Err(error)
    }

    pub async fn disconnect(&self) {
        let mut slot = self.connection.lock().await;
        if let Some(mut connection) = slot.take() {
            connection.close();
            tracing::info!(port = %self.port_name, "Disconnected from driver port");
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }

    fn tear_down(&self, slot: &mut Option<Box<dyn PortConnection>>, cause: &ChannelError) {
        if let Some(mut connection) = slot.take() {
            connection.close();
        }
        self.state.send_replace(ConnectionState::Disconnected);
        tracing::warn!(port = %self.port_name, error = %cause, "Driver connection lost");
    }
}
