use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ChatProvider, ChatRequest};

/// A scripted provider for tests. Returns pre-defined replies in order and
/// records every request it receives.
pub struct MockProvider {
    replies: Vec<String>,
    index: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers every request with the same reply.
    pub fn replying(reply: &str) -> Self {
        Self::new(vec![reply.to_string()])
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        // The last reply repeats once the script runs out.
        self.replies
            .get(i)
            .or_else(|| self.replies.last())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockProvider: no replies scripted (called {} times)", i + 1))
    }
}
