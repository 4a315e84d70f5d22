//! Lock-free input buffer between the host and the game loop
//!
//! Host callbacks (keyboard, pointer, menu buttons) submit [`InputEvent`]s
//! without blocking; the driver drains them once per frame, in order.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::surface::InputEvent;

/// Input stamped with the wall time it was produced at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputMessage {
    pub wall_ms: u64,
    pub event: InputEvent,
}

/// Bounded MPSC buffer of pending input.
///
/// Keyboard, pointer and menu callbacks each hold an [`InputSender`]; the
/// driver drains once per frame before ticking. Pointer moves arrive far
/// more often than frames, so a run of consecutive moves collapses to the
/// last one on drain.
pub struct InputBuffer {
    sender: Sender<InputMessage>,
    receiver: Receiver<InputMessage>,
}

impl InputBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Returns false if the buffer is full
    #[inline]
    pub fn try_submit(&self, wall_ms: u64, event: InputEvent) -> bool {
        self.sender.try_send(InputMessage { wall_ms, event }).is_ok()
    }

    /// Everything submitted since the last drain, oldest first
    pub fn drain(&self) -> Vec<InputMessage> {
        let mut out: Vec<InputMessage> = Vec::with_capacity(self.receiver.len());
        for message in self.receiver.try_iter() {
            let superseded = matches!(
                (out.last().map(|m| &m.event), &message.event),
                (Some(InputEvent::PointerMove { .. }), InputEvent::PointerMove { .. })
            );
            if superseded {
                out.pop();
            }
            out.push(message);
        }
        out
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Clonable sender handle
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<InputMessage>,
}

impl InputSender {
    #[inline]
    pub fn try_send(&self, wall_ms: u64, event: InputEvent) -> Result<(), InputBufferError> {
        self.sender
            .try_send(InputMessage { wall_ms, event })
            .map_err(|e| match e {
                TrySendError::Full(_) => InputBufferError::Full,
                TrySendError::Disconnected(_) => InputBufferError::Disconnected,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputBufferError {
    #[error("input buffer full")]
    Full,
    #[error("game loop stopped")]
    Disconnected,
}
