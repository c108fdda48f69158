//! Client requests and replies.
//!
//! Every transmit or receive request produces exactly one [`Reply`], either
//! immediately or once the deferred interrupt pass replays it.

use alloc::vec::Vec;

/// Opaque identifier the host uses to route a reply.
pub type ClientId = u32;

/// Request to send one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub client: ClientId,
    /// Complete Ethernet frame without FCS.
    pub frame: Vec<u8>,
}

impl TxRequest {
    pub fn new(client: ClientId, frame: Vec<u8>) -> Self {
        Self { client, frame }
    }
}

/// Request to receive one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxRequest {
    pub client: ClientId,
    /// Size of the client buffer. A longer frame is a protocol violation.
    pub capacity: usize,
}

impl RxRequest {
    pub fn new(client: ClientId, capacity: usize) -> Self {
        Self { client, capacity }
    }
}

/// Completion delivered to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Frame handed to the transmitter.
    Sent { client: ClientId },
    /// Frame received.
    Received { client: ClientId, frame: Vec<u8> },
}

impl Reply {
    pub fn client(&self) -> ClientId {
        match self {
            Self::Sent { client } | Self::Received { client, .. } => *client,
        }
    }
}

/// What happened to a request at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Reply already queued.
    Completed,
    /// Parked until the hardware condition clears.
    Deferred,
}
