//! Seam between the pipeline and the byte transport.
//!
//! The transport pushes [`RawChunk`]s to registered listeners and accepts
//! newline-terminated command frames. Opening, enumerating, and permission
//! handling of the physical link live behind implementations of
//! [`Transport`].

use std::sync::{Arc, Mutex, Weak};

use crate::protocol::RawChunk;

pub type ChunkListener = Box<dyn FnMut(RawChunk) + Send + 'static>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

pub trait Transport: Send + Sync {
    /// Registers `listener` for every chunk delivered from now on.
    fn subscribe(&self, listener: ChunkListener) -> Subscription;

    /// Writes an already-terminated frame. Never retried by the caller.
    fn send(&self, frame: &str) -> Result<(), TransportError>;
}

/// Revocable registration handle. Dropping it unsubscribes.
pub struct Subscription {
    revoke: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(revoke: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            revoke: Some(Box::new(revoke)),
        }
    }

    /// Revokes the registration. Returns false if it was already revoked.
    pub fn unsubscribe(&mut self) -> bool {
        match self.revoke.take() {
            Some(revoke) => {
                revoke();
                true
            }
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

type SharedListener = Arc<Mutex<ChunkListener>>;

#[derive(Default)]
struct MemoryInner {
    listeners: Vec<(u64, SharedListener)>,
    next_id: u64,
    sent: Vec<String>,
    fail_sends: bool,
    closed: bool,
}

/// In-process transport: chunks are pushed with [`MemoryTransport::deliver`]
/// and sent frames are recorded.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands `chunk` to every listener; returns how many received it.
    /// Listeners run outside the transport lock, so they may send or
    /// unsubscribe from inside the callback.
    pub fn deliver(&self, chunk: RawChunk) -> usize {
        let listeners: Vec<SharedListener> = match self.inner.lock() {
            Ok(inner) if !inner.closed => {
                inner.listeners.iter().map(|(_, listener)| listener.clone()).collect()
            }
            _ => return 0,
        };
        for listener in &listeners {
            if let Ok(mut listener) = listener.lock() {
                listener(chunk.clone());
            }
        }
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.listeners.len()).unwrap_or(0)
    }

    pub fn sent_frames(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| inner.sent.clone())
            .unwrap_or_default()
    }

    /// Makes every following `send` fail until switched back.
    pub fn set_fail_sends(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_sends = fail;
        }
    }

    /// Closes the link: listeners are dropped and sends fail.
    pub fn close(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.closed = true;
            inner.listeners.clear();
        }
    }
}

impl Transport for MemoryTransport {
    fn subscribe(&self, listener: ChunkListener) -> Subscription {
        let id = match self.inner.lock() {
            Ok(mut inner) => {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.listeners.push((id, Arc::new(Mutex::new(listener))));
                id
            }
            Err(_) => return Subscription::new(|| {}),
        };

        let weak: Weak<Mutex<MemoryInner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut inner) = inner.lock() {
                    inner.listeners.retain(|(listener_id, _)| *listener_id != id);
                }
            }
        })
    }

    fn send(&self, frame: &str) -> Result<(), TransportError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| TransportError::Send("transport state poisoned".into()))?;
        if inner.closed {
            return Err(TransportError::Closed);
        }
        if inner.fail_sends {
            return Err(TransportError::Send("link refused write".into()));
        }
        inner.sent.push(frame.to_string());
        Ok(())
    }
}
