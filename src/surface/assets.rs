//! Asynchronous visual loading
//!
//! Requests return immediately. Providers report completions through a
//! [`VisualSender`]; the game loop drains the paired [`VisualQueue`] at the
//! start of each tick and only then places the entity.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::game::state::EntityId;
use crate::surface::{ActorKind, VisualHandle};

/// Finished load for one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualReady {
    pub entity: EntityId,
    pub handle: VisualHandle,
}

/// Loads visuals without blocking the caller
pub trait AssetProvider {
    fn request_visual(&mut self, entity: EntityId, kind: ActorKind);
}

/// Completion side handed to providers
#[derive(Debug, Clone)]
pub struct VisualSender {
    sender: Sender<VisualReady>,
}

impl VisualSender {
    /// Report a finished load; returns false once the game loop is gone
    pub fn complete(&self, entity: EntityId, handle: VisualHandle) -> bool {
        self.sender.send(VisualReady { entity, handle }).is_ok()
    }
}

/// Receiving side owned by the game loop
#[derive(Debug)]
pub struct VisualQueue {
    sender: Sender<VisualReady>,
    receiver: Receiver<VisualReady>,
}

impl VisualQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> VisualSender {
        VisualSender {
            sender: self.sender.clone(),
        }
    }

    pub fn drain(&self) -> Vec<VisualReady> {
        self.receiver.try_iter().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for VisualQueue {
    fn default() -> Self {
        Self::new()
    }
}
