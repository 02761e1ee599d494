//! The seam to the message channel.
//!
//! The channel itself (socket, reconnect with backoff) lives outside this
//! crate. It must deliver frames in order, once per connection epoch; the
//! client only needs a way to send and to hear about connection state.

use std::collections::VecDeque;

use thiserror::Error;

use crate::protocol::OutboundMessage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection is closed")]
    Closed,
}

/// Observable connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Map a WebSocket `readyState` (0..=3).
    pub fn from_ready_state(ready_state: u16) -> Option<ConnectionState> {
        match ready_state {
            0 => Some(ConnectionState::Connecting),
            1 => Some(ConnectionState::Open),
            2 => Some(ConnectionState::Closing),
            3 => Some(ConnectionState::Closed),
            _ => None,
        }
    }

    /// Whether user interaction may produce outbound messages.
    pub fn is_interactive(self) -> bool {
        self == ConnectionState::Open
    }
}

/// Outbound half of the message channel.
pub trait Transport {
    fn send(&mut self, message: &OutboundMessage) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, message: &OutboundMessage) -> Result<(), TransportError> {
        (**self).send(message)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &OutboundMessage) -> Result<(), TransportError> {
        (**self).send(message)
    }
}

/// In-memory FIFO transport.
///
/// Queues every sent message until drained. Closing it makes further sends
/// fail, which is how a dropped connection looks to the sender.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<OutboundMessage>,
    closed: bool,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn reopen(&mut self) {
        self.closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pop(&mut self) -> Option<OutboundMessage> {
        self.queue.pop_front()
    }

    pub fn drain(&mut self) -> Vec<OutboundMessage> {
        self.queue.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutboundMessage> {
        self.queue.iter()
    }
}

impl Transport for Outbox {
    fn send(&mut self, message: &OutboundMessage) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.queue.push_back(message.clone());
        Ok(())
    }
}
