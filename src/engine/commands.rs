// src/engine/commands.rs
//! Inbound command surface
//!
//! The operator panel and the multi-device session relay produce the same
//! event set, so both feed one bounded channel and the engine cannot tell them
//! apart. The engine drains the queue once per rendering-loop callback.

use crate::catalog::RhythmId;
use crate::params::{NibpReading, ParameterSet};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

/// Events accepted by the engine, regardless of local or networked origin
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Apply a full target parameter set
    SetParameters(ParameterSet),
    /// Start the simulation loop
    Activate,
    /// Stop the simulation loop and reset all transient state
    Deactivate,
    /// Deliver a defibrillation shock, landing on the given rhythm
    Shock {
        /// Post-shock rhythm identifier
        rhythm: RhythmId,
    },
    /// Display a finished non-invasive pressure measurement verbatim
    Nibp(NibpReading),
}

/// Cloneable sending side handed to operator panels and relay adapters
#[derive(Debug, Clone)]
pub struct CommandHandle {
    tx: Sender<EngineCommand>,
}

impl CommandHandle {
    /// Enqueue a command. Returns `false` when the queue is full or the
    /// engine is gone; senders are expected to treat that as a dropped frame,
    /// not an error worth retrying.
    pub fn send(&self, command: EngineCommand) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Bounded inbound queue owned by the engine
#[derive(Debug)]
pub struct CommandQueue {
    tx: Sender<EngineCommand>,
    rx: Receiver<EngineCommand>,
}

impl CommandQueue {
    /// Queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// A new sending handle.
    pub fn handle(&self) -> CommandHandle {
        CommandHandle {
            tx: self.tx.clone(),
        }
    }

    /// Pop the next queued command, if any.
    pub fn try_next(&self) -> Option<EngineCommand> {
        self.rx.try_recv().ok()
    }
}
