use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Monotonic request counter; only the response carrying the latest token is applied.
#[derive(Debug, Clone, Default)]
pub struct RequestTokens {
    latest: Arc<AtomicU64>,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_latest(&self, token: u64) -> bool {
        self.latest() == token
    }
}
