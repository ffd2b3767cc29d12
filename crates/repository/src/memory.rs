use std::cell::RefCell;
use std::collections::BTreeMap;
use std::task::Poll;

use futures_util::future::{LocalBoxFuture, poll_fn};

use crate::transport::{Transport, TransportError};

/// In-process transport serving canned bodies.
///
/// Every request is recorded in arrival order. Each response is delivered
/// after yielding to the executor once, so concurrent callers interleave the
/// way they would against a real network. Unknown targets answer 404.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: RefCell<BTreeMap<String, Result<String, TransportError>>>,
    requests: RefCell<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, target: impl Into<String>, body: impl Into<String>) {
        self.responses
            .borrow_mut()
            .insert(target.into(), Ok(body.into()));
    }

    pub fn fail(&self, target: impl Into<String>, err: TransportError) {
        self.responses.borrow_mut().insert(target.into(), Err(err));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self, target: &str) -> usize {
        self.requests.borrow().iter().filter(|t| *t == target).count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for MemoryTransport {
    fn get_text(&self, target: &str) -> LocalBoxFuture<'_, Result<String, TransportError>> {
        self.requests.borrow_mut().push(target.to_string());
        let target = target.to_string();
        Box::pin(async move {
            yield_once().await;
            self.responses
                .borrow()
                .get(&target)
                .cloned()
                .unwrap_or(Err(TransportError::Status { status: 404 }))
        })
    }
}

async fn yield_once() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}
