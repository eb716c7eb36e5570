use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use crossbeam_channel::{Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Begin {
        id: ProgressId,
        title: String,
    },
    Report {
        id: ProgressId,
        message: Option<String>,
        percentage: Option<u32>,
    },
    End {
        id: ProgressId,
        message: Option<String>,
    },
}

pub type ProgressReceiver = Receiver<ProgressEvent>;

/// Emits [`ProgressEvent`]s to whoever holds the receiver. A detached sender
/// drops every event.
#[derive(Clone)]
pub struct ProgressSender {
    tx: Option<Sender<ProgressEvent>>,
    next_id: Arc<AtomicU64>,
}

impl ProgressSender {
    pub fn channel() -> (Self, ProgressReceiver) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sender = Self {
            tx: Some(tx),
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (sender, rx)
    }

    pub fn detached() -> Self {
        Self {
            tx: None,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn start(&self, title: impl Into<String>) -> Progress {
        let id = ProgressId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.send(ProgressEvent::Begin {
            id,
            title: title.into(),
        });
        Progress {
            id,
            sender: self.clone(),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::detached()
    }
}

#[derive(Clone)]
pub struct Progress {
    id: ProgressId,
    sender: ProgressSender,
    finished: Arc<AtomicBool>,
}

impl Progress {
    pub fn id(&self) -> ProgressId {
        self.id
    }

    pub fn report(&self, message: impl Into<Option<String>>, percentage: Option<u32>) {
        self.sender.send(ProgressEvent::Report {
            id: self.id,
            message: message.into(),
            percentage,
        });
    }

    /// Report `done` out of `total` steps.
    pub fn fraction(&self, done: usize, total: usize) {
        let percentage = if total == 0 {
            100
        } else {
            (done.min(total) * 100 / total) as u32
        };
        self.report(None, Some(percentage));
    }

    pub fn finish(&self, message: impl Into<Option<String>>) {
        let message = message.into();
        if self
            .finished
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.sender.send(ProgressEvent::End {
                id: self.id,
                message,
            });
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish(None);
    }
}
