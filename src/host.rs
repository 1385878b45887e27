use crate::context::Context;
use crate::events::{EventKind, InputEvent, RawInput};
use crate::id::SurfaceId;
use crate::rect::Rect;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;
use tracing::warn;

/// Messages from the platform.
#[derive(Debug, Clone)]
pub enum HostMessage {
    /// Raw pointer, click or focus input.
    Input(RawInput),
    /// An animated transition on a surface has finished.
    TransitionEnd(SurfaceId),
    /// Time has passed.
    Tick(Duration),
    /// A surface was laid out.
    Layout(SurfaceId, Rect),
}

/// Connects a context to a platform backend.
///
/// The backend sends [`HostMessage`]s through [`sender`](Host::sender), from any thread; they
/// are applied on the UI thread when [`poll`](Host::poll) is called.
pub struct Host {
    context: Context,
    sender: Sender<HostMessage>,
    event_recv: Receiver<HostMessage>,
}

impl Host {
    pub fn new(context: Context) -> Host {
        let (sender, event_recv) = channel::unbounded();
        Host {
            context,
            sender,
            event_recv,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns a sender for platform messages.
    pub fn sender(&self) -> Sender<HostMessage> {
        self.sender.clone()
    }

    /// Receives all messages from the queue and applies them. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut count = 0;
        loop {
            match self.event_recv.try_recv() {
                Ok(message) => {
                    self.recv_message(message);
                    count += 1;
                }
                Err(TryRecvError::Empty) => break,
                // the host keeps its own sender, so this can't happen
                Err(TryRecvError::Disconnected) => break,
            }
        }
        count
    }

    fn recv_message(&mut self, message: HostMessage) {
        let doc = self.context.document();
        match message {
            HostMessage::Input(raw) => {
                if !doc.contains(raw.target) {
                    warn!(kind = ?raw.kind, "dropping input for unknown surface");
                    return;
                }
                self.context.dispatch(InputEvent::from(raw));
            }
            HostMessage::TransitionEnd(surface) => {
                if !doc.contains(surface) {
                    warn!("dropping transition end for unknown surface");
                    return;
                }
                self.context
                    .dispatch(InputEvent::new(EventKind::TransitionEnd, surface));
            }
            HostMessage::Tick(dt) => self.context.scheduler().advance(dt),
            HostMessage::Layout(surface, bounds) => doc.set_bounds(surface, bounds),
        }
    }
}
