use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// The last `capacity` grant times inside a rolling window.
#[derive(Debug)]
pub(crate) struct RequestWindow {
    grants: VecDeque<Instant>,
    capacity: usize,
    span: Duration,
}

impl RequestWindow {
    pub(crate) fn new(capacity: usize, span: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            grants: VecDeque::with_capacity(capacity),
            capacity,
            span,
        }
    }

    /// Record a grant at `now`, or return how long to wait until the oldest
    /// grant leaves the window.
    pub(crate) fn reserve(&mut self, now: Instant) -> Result<(), Duration> {
        if self.grants.len() == self.capacity {
            let oldest = self.grants[0];
            let frees_at = oldest + self.span;
            if frees_at > now {
                return Err(frees_at - now);
            }
            self.grants.pop_front();
        }
        self.grants.push_back(now);
        Ok(())
    }
}

/// Requests-per-minute budget shared by every clone of a client.
#[derive(Clone)]
pub(crate) struct Throttle {
    window: Arc<Mutex<RequestWindow>>,
}

impl Throttle {
    pub(crate) fn per_minute(requests: usize) -> Self {
        Self {
            window: Arc::new(Mutex::new(RequestWindow::new(requests, Duration::from_secs(60)))),
        }
    }

    /// Wait for a slot in the window.
    pub(crate) async fn wait_turn(&self) {
        loop {
            let wait = match self.window.lock().await.reserve(Instant::now()) {
                Ok(()) => return,
                Err(wait) => wait,
            };
            tracing::debug!("Gemini budget spent, next slot in {:.1}s", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }
    }
}
