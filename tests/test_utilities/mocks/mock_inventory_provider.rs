use async_trait::async_trait;
use install_guard::prelude::*;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock InventoryProvider returning queued snapshots, then repeating the last one
pub struct MockInventoryProvider {
    snapshots: Mutex<VecDeque<Snapshot>>,
    last: Mutex<Snapshot>,
}

impl MockInventoryProvider {
    pub fn new(snapshots: Vec<Snapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into()),
            last: Mutex::new(Snapshot::new()),
        }
    }
}

#[async_trait]
impl InventoryProvider for MockInventoryProvider {
    async fn snapshot(&self) -> Result<Snapshot> {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.snapshots.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}
