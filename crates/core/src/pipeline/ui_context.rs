use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::ui_state::UiState;

/// A unit of UI work. Runs with exclusive access to the UI state.
pub type UiTask = Box<dyn FnOnce(&mut UiState) + Send>;

enum UiMessage {
    Run { epoch: Option<u64>, task: UiTask },
    Shutdown,
}

/// Cheap, cloneable way to post work onto the UI context.
///
/// Posting never blocks, so the frame worker can dispatch without any
/// risk of waiting on the UI.
#[derive(Clone)]
pub struct UiHandle {
    tx: Sender<UiMessage>,
}

impl UiHandle {
    /// Returns `false` once the UI context has shut down.
    pub fn dispatch(&self, task: impl FnOnce(&mut UiState) + Send + 'static) -> bool {
        self.tx
            .send(UiMessage::Run {
                epoch: None,
                task: Box::new(task),
            })
            .is_ok()
    }

    /// Like [`dispatch`](Self::dispatch), but the task is dropped unrun if
    /// the UI has moved past `epoch` by the time it is dequeued.
    pub fn dispatch_for_epoch(
        &self,
        epoch: u64,
        task: impl FnOnce(&mut UiState) + Send + 'static,
    ) -> bool {
        self.tx
            .send(UiMessage::Run {
                epoch: Some(epoch),
                task: Box::new(task),
            })
            .is_ok()
    }
}

fn run(state: &mut UiState, epoch: Option<u64>, task: UiTask) {
    match epoch {
        Some(e) if e != state.epoch() => {
            log::trace!("Dropping UI task from epoch {e}, now at {}", state.epoch());
        }
        _ => task(state),
    }
}

/// The UI execution context: a single thread that owns [`UiState`] and
/// runs posted tasks strictly in order.
pub struct UiContext {
    tx: Sender<UiMessage>,
    inner: Inner,
}

enum Inner {
    Threaded(Option<JoinHandle<UiState>>),
    /// Tasks queue up until the owner calls `run_pending`.
    Manual { rx: Receiver<UiMessage>, state: UiState },
}

impl UiContext {
    pub fn spawn(mut state: UiState) -> std::io::Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<UiMessage>();
        let handle = std::thread::Builder::new()
            .name("ui-context".into())
            .spawn(move || {
                for message in rx {
                    match message {
                        UiMessage::Run { epoch, task } => run(&mut state, epoch, task),
                        UiMessage::Shutdown => break,
                    }
                }
                state
            })?;
        Ok(Self {
            tx,
            inner: Inner::Threaded(Some(handle)),
        })
    }

    /// A context driven by the caller, for deterministic tests.
    pub fn manual(state: UiState) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            inner: Inner::Manual { rx, state },
        }
    }

    pub fn handle(&self) -> UiHandle {
        UiHandle {
            tx: self.tx.clone(),
        }
    }

    /// Runs `f` on the UI context and waits for its result.
    ///
    /// Blocking: never call from the frame worker. `None` if the context
    /// has shut down.
    pub fn query<R, F>(&mut self, f: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut UiState) -> R + Send + 'static,
    {
        self.run_pending();
        match &mut self.inner {
            Inner::Manual { state, .. } => return Some(f(state)),
            Inner::Threaded(None) => return None,
            Inner::Threaded(Some(_)) => {}
        }
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let sent = self.handle().dispatch(move |state| {
            let _ = reply_tx.send(f(state));
        });
        if !sent {
            return None;
        }
        reply_rx.recv().ok()
    }

    /// Waits until every task posted so far has run.
    pub fn sync(&mut self) -> bool {
        self.query(|_| ()).is_some()
    }

    /// Runs queued tasks on the calling thread. Manual contexts only;
    /// returns how many messages were handled.
    pub fn run_pending(&mut self) -> usize {
        let Inner::Manual { rx, state } = &mut self.inner else {
            return 0;
        };
        drain(rx, state)
    }

    /// Stops the context after the tasks already posted and hands back
    /// the final state.
    pub fn shutdown(mut self) -> Option<UiState> {
        self.stop()
    }

    fn stop(&mut self) -> Option<UiState> {
        match std::mem::replace(&mut self.inner, Inner::Threaded(None)) {
            Inner::Threaded(None) => None,
            Inner::Threaded(Some(handle)) => {
                let _ = self.tx.send(UiMessage::Shutdown);
                match handle.join() {
                    Ok(state) => Some(state),
                    Err(_) => {
                        log::error!("UI context thread panicked");
                        None
                    }
                }
            }
            Inner::Manual { rx, mut state } => {
                drain(&rx, &mut state);
                Some(state)
            }
        }
    }
}

fn drain(rx: &Receiver<UiMessage>, state: &mut UiState) -> usize {
    let mut handled = 0;
    while let Ok(message) = rx.try_recv() {
        handled += 1;
        if let UiMessage::Run { epoch, task } = message {
            run(state, epoch, task);
        }
    }
    handled
}

impl Drop for UiContext {
    fn drop(&mut self) {
        self.stop();
    }
}
