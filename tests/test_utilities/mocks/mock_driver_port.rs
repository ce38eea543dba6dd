use async_trait::async_trait;
use install_guard::monitoring::domain::{WireMessage, WireResponse};
use install_guard::ports::outbound::{DriverPort, PortConnection};
use install_guard::shared::error::ChannelError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock DriverPort feeding scripted request frames and recording replies
///
/// Every connection shares the same inbound queue and reply log, so frames
/// survive a reconnect the way a blocked driver request would.
#[derive(Clone, Default)]
pub struct MockDriverPort {
    inbound: Arc<Mutex<VecDeque<Vec<u8>>>>,
    replies: Arc<Mutex<Vec<Vec<u8>>>>,
    failing_connects: Arc<AtomicUsize>,
    connects: Arc<AtomicUsize>,
}

impl MockDriverPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` connect attempts fail.
    pub fn with_failing_connects(self, count: usize) -> Self {
        self.failing_connects.store(count, Ordering::SeqCst);
        self
    }

    pub fn push_request(&self, message: &WireMessage) {
        self.push_frame(message.encode());
    }

    pub fn push_frame(&self, frame: Vec<u8>) {
        self.inbound.lock().unwrap().push_back(frame);
    }

    pub fn pending_requests(&self) -> usize {
        self.inbound.lock().unwrap().len()
    }

    pub fn responses(&self) -> Vec<WireResponse> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|frame| WireResponse::decode(frame).unwrap())
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverPort for MockDriverPort {
    async fn connect(&self, port_name: &str) -> Result<Box<dyn PortConnection>, ChannelError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_connects.store(remaining - 1, Ordering::SeqCst);
            return Err(ChannelError::ConnectFailed {
                port: port_name.to_string(),
                details: "mock driver not loaded".to_string(),
            });
        }
        Ok(Box::new(MockConnection {
            inbound: Arc::clone(&self.inbound),
            replies: Arc::clone(&self.replies),
        }))
    }
}

struct MockConnection {
    inbound: Arc<Mutex<VecDeque<Vec<u8>>>>,
    replies: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl PortConnection for MockConnection {
    async fn receive(&mut self, _timeout: Duration) -> Result<Option<Vec<u8>>, ChannelError> {
        Ok(self.inbound.lock().unwrap().pop_front())
    }

    async fn reply(&mut self, frame: &[u8]) -> Result<usize, ChannelError> {
        self.replies.lock().unwrap().push(frame.to_vec());
        Ok(frame.len())
    }

    fn close(&mut self) {}
}
