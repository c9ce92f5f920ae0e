//! Connection state types.

use std::sync::atomic::{AtomicU32, Ordering};

/// State of the realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected.
    Idle,
    /// Attempting to connect.
    Connecting,
    /// Connected; messages flow.
    Open,
    /// Deliberate teardown in progress.
    Closing,
    /// Connection closed.
    Closed,
}

/// Atomic wrapper for connection state.
#[derive(Debug)]
pub struct AtomicConnectionState(AtomicU32);

impl AtomicConnectionState {
    /// Create a new atomic state.
    #[must_use]
    pub const fn new(state: ConnectionState) -> Self {
        Self(AtomicU32::new(state as u32))
    }

    /// Load the current state.
    #[must_use]
    pub fn load(&self) -> ConnectionState {
        match self.0.load(Ordering::SeqCst) {
            0 => ConnectionState::Idle,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }

    /// Store a new state.
    pub fn store(&self, state: ConnectionState) {
        self.0.store(state as u32, Ordering::SeqCst);
    }
}
