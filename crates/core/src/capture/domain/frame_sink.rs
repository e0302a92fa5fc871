use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::shared::frame::FrameBuffer;

/// Creates a single-slot frame mailbox.
///
/// At most one frame is ever pending. Pushing while a frame is pending
/// evicts the stale one, so a slow consumer sees the newest frame and the
/// backlog never grows beyond one.
pub fn frame_mailbox() -> (FrameSink, FrameMailbox) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let dropped = Arc::new(AtomicU64::new(0));
    let closed = Arc::new(AtomicBool::new(false));
    let sink = FrameSink {
        tx,
        evict: rx.clone(),
        dropped: dropped.clone(),
        closed: closed.clone(),
    };
    let mailbox = FrameMailbox {
        rx,
        dropped,
        closed,
    };
    (sink, mailbox)
}

/// Producer end, handed to the capture backend.
#[derive(Clone)]
pub struct FrameSink {
    tx: Sender<FrameBuffer>,
    evict: Receiver<FrameBuffer>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl FrameSink {
    /// Offers a frame, replacing any pending one. Returns `false` once the
    /// consumer has closed the mailbox, telling the producer to stop.
    pub fn push(&self, frame: FrameBuffer) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let mut pending = frame;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return true,
                Err(TrySendError::Disconnected(_)) => return false,
                Err(TrySendError::Full(frame)) => {
                    if let Ok(stale) = self.evict.try_recv() {
                        log::trace!("Dropping late frame #{}", stale.sequence());
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    pending = frame;
                }
            }
        }
    }

    /// Drops the pending frame, if any, without counting it as late.
    pub fn discard_pending(&self) {
        while self.evict.try_recv().is_ok() {}
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Consumer end, owned by the delivery worker.
pub struct FrameMailbox {
    rx: Receiver<FrameBuffer>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl FrameMailbox {
    pub fn receiver(&self) -> &Receiver<FrameBuffer> {
        &self.rx
    }

    pub fn try_take(&self) -> Option<FrameBuffer> {
        self.rx.try_recv().ok()
    }

    /// Frames replaced before the consumer got to them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        self.dropped.clone()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        while self.rx.try_recv().is_ok() {}
    }
}

impl Drop for FrameMailbox {
    fn drop(&mut self) {
        self.close();
    }
}
