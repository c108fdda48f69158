//! Suspended client requests.
//!
//! A request that cannot complete immediately (TX ring full, no received
//! frame) is parked here and replayed once by the deferred interrupt pass.
//! At most one request per direction may be parked.

/// Single-slot holder for a suspended request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending<T> {
    Empty,
    Armed(T),
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> Pending<T> {
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed(_))
    }

    /// Park `request`. Fatal if a request is already parked; the client
    /// protocol allows one outstanding request per direction.
    pub fn arm(&mut self, request: T, what: &str) {
        if self.is_armed() {
            fatal!("fxp: second {} request while one is pending", what);
        }
        *self = Self::Armed(request);
    }

    /// Remove the parked request for replay.
    pub fn take(&mut self) -> Option<T> {
        match core::mem::take(self) {
            Self::Armed(request) => Some(request),
            Self::Empty => None,
        }
    }
}

/// Parked requests for both directions.
#[derive(Debug)]
pub struct FlowControlQueue<Tx, Rx> {
    tx: Pending<Tx>,
    rx: Pending<Rx>,
}

impl<Tx, Rx> Default for FlowControlQueue<Tx, Rx> {
    fn default() -> Self {
        Self {
            tx: Pending::Empty,
            rx: Pending::Empty,
        }
    }
}

impl<Tx, Rx> FlowControlQueue<Tx, Rx> {
    pub fn arm_tx(&mut self, request: Tx) {
        self.tx.arm(request, "transmit");
    }

    pub fn arm_rx(&mut self, request: Rx) {
        self.rx.arm(request, "receive");
    }

    pub fn is_tx_armed(&self) -> bool {
        self.tx.is_armed()
    }

    pub fn is_rx_armed(&self) -> bool {
        self.rx.is_armed()
    }

    pub fn take_tx(&mut self) -> Option<Tx> {
        self.tx.take()
    }

    pub fn take_rx(&mut self) -> Option<Rx> {
        self.rx.take()
    }
}
