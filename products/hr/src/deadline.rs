use std::{future::Future, time::Duration};

use tokio::time::{Instant, timeout_at};
use tracing::warn;

use crate::error::{HrError, HrResult, StoreKind};

/// Time budget shared by every store call of one operation.
///
/// Created when the operation starts; each call is bounded by the same
/// instant, so a slow first store leaves less time for the second.
#[derive(Copy, Clone, Debug)]
pub struct Deadline {
    limit: Option<Duration>,
    at: Option<Instant>,
}

impl Deadline {
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            limit,
            at: limit.map(|limit| Instant::now() + limit),
        }
    }

    pub fn unbounded() -> Self {
        Self::start(None)
    }

    pub async fn run<T, F>(&self, store: StoreKind, fut: F) -> HrResult<T>
    where
        F: Future<Output = HrResult<T>>,
    {
        let (Some(at), Some(limit)) = (self.at, self.limit) else {
            return fut.await;
        };
        match timeout_at(at, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%store, ?limit, "store call exceeded request deadline");
                Err(HrError::Timeout { store, limit })
            }
        }
    }
}
