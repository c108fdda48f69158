//! DMA-shared structures.
//!
//! Layouts follow the 8255x simplified memory model: the frame buffer sits
//! directly behind the descriptor header, no RBD/TBD arrays. Every header
//! word is accessed volatilely and converted from little-endian.

use volatile::Volatile;

use super::regs::{
    CbCommand, CbStatus, RfdCommand, RfdStatus, MAX_TAGGED_FRAME, RFDR_COUNT_MASK,
    STATS_COUNTERS, TXSZ_EOF, TX_TBDA_NIL,
};

/// Size of the per-descriptor frame buffer.
pub const FRAME_BUF_SIZE: usize = MAX_TAGGED_FRAME;

/// Configure command payload length.
pub const CONFIG_BYTES: usize = 22;

// ═══════════════════════════════════════════════════════════════════════════
// RECEIVE FRAME DESCRIPTOR
// ═══════════════════════════════════════════════════════════════════════════

/// Receive frame descriptor.
#[repr(C)]
pub struct RxDescriptor {
    status: Volatile<u16>,
    command: Volatile<u16>,
    link: Volatile<u32>,
    /// RBD pointer, unused in simplified mode.
    rbd: Volatile<u32>,
    /// Actual count with EOF and F flags.
    count: Volatile<u16>,
    size: Volatile<u16>,
    buf: [u8; FRAME_BUF_SIZE],
}

impl RxDescriptor {
    pub fn new() -> Self {
        Self {
            status: Volatile::new(0),
            command: Volatile::new(0),
            link: Volatile::new(0),
            rbd: Volatile::new(0),
            count: Volatile::new(0),
            size: Volatile::new(0),
            buf: [0; FRAME_BUF_SIZE],
        }
    }

    #[inline]
    pub fn status(&self) -> RfdStatus {
        RfdStatus::from_bits_retain(u16::from_le(self.status.read()))
    }

    #[inline]
    pub fn command(&self) -> RfdCommand {
        RfdCommand::from_bits_retain(u16::from_le(self.command.read()))
    }

    #[inline]
    pub fn set_command(&mut self, cmd: RfdCommand) {
        self.command.write(cmd.bits().to_le());
    }

    #[inline]
    pub fn raw_count(&self) -> u16 {
        u16::from_le(self.count.read())
    }

    /// Return the descriptor to the hardware-owned empty state.
    ///
    /// `link` is left alone; it only changes at ring initialization.
    pub fn reset(&mut self, cmd: RfdCommand) {
        self.status.write(0);
        self.command.write(cmd.bits().to_le());
        self.rbd.write(0);
        self.count.write(0);
        self.size.write((FRAME_BUF_SIZE as u16).to_le());
    }

    pub fn set_link(&mut self, link: u32) {
        self.link.write(link.to_le());
    }

    pub fn link(&self) -> u32 {
        u32::from_le(self.link.read())
    }

    /// Received bytes. Only meaningful after completion.
    pub fn frame(&self, len: usize) -> &[u8] {
        &self.buf[..len.min(FRAME_BUF_SIZE)]
    }

    /// Byte count field masked from the actual-count word.
    pub fn received_length(&self) -> usize {
        usize::from(self.raw_count() & RFDR_COUNT_MASK)
    }

    /// Write a frame the way the RU does.
    #[cfg(test)]
    pub(crate) fn hw_receive(&mut self, frame: &[u8], status: RfdStatus) {
        use super::regs::{RFDR_EOF, RFDR_F};
        self.buf[..frame.len()].copy_from_slice(frame);
        self.count.write((RFDR_EOF | RFDR_F | frame.len() as u16).to_le());
        self.status.write(status.bits().to_le());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TRANSMIT COMMAND BLOCK
// ═══════════════════════════════════════════════════════════════════════════

/// Transmit command block.
#[repr(C)]
pub struct TxDescriptor {
    status: Volatile<u16>,
    command: Volatile<u16>,
    link: Volatile<u32>,
    tbd_array: Volatile<u32>,
    /// Byte count with EOF flag.
    size: Volatile<u16>,
    threshold: Volatile<u8>,
    tbd_count: Volatile<u8>,
    buf: [u8; FRAME_BUF_SIZE],
}

impl TxDescriptor {
    pub fn new() -> Self {
        Self {
            status: Volatile::new(0),
            command: Volatile::new(0),
            link: Volatile::new(0),
            tbd_array: Volatile::new(0),
            size: Volatile::new(0),
            threshold: Volatile::new(0),
            tbd_count: Volatile::new(0),
            buf: [0; FRAME_BUF_SIZE],
        }
    }

    #[inline]
    pub fn status(&self) -> CbStatus {
        CbStatus::from_bits_retain(u16::from_le(self.status.read()))
    }

    #[inline]
    pub fn command(&self) -> CbCommand {
        CbCommand::from_bits_retain(u16::from_le(self.command.read()))
    }

    #[inline]
    pub fn set_command(&mut self, cmd: CbCommand) {
        self.command.write(cmd.bits().to_le());
    }

    pub fn set_link(&mut self, link: u32) {
        self.link.write(link.to_le());
    }

    pub fn link(&self) -> u32 {
        u32::from_le(self.link.read())
    }

    /// Park the block as an end-of-list NOP.
    pub fn reset(&mut self, threshold: u8) {
        self.status.write(0);
        self.command.write((CbCommand::EL | CbCommand::OP_NOP).bits().to_le());
        self.tbd_array.write(TX_TBDA_NIL.to_le());
        self.size.write(0);
        self.threshold.write(threshold);
        self.tbd_count.write(0);
    }

    /// Copy `frame` in and arm the block as the end of the chain.
    pub fn load(&mut self, frame: &[u8], threshold: u8) {
        self.buf[..frame.len()].copy_from_slice(frame);
        self.status.write(0);
        self.command.write((CbCommand::EL | CbCommand::OP_XMIT).bits().to_le());
        self.tbd_array.write(TX_TBDA_NIL.to_le());
        self.size.write((TXSZ_EOF | frame.len() as u16).to_le());
        self.threshold.write(threshold);
        self.tbd_count.write(0);
    }

    #[cfg(test)]
    pub(crate) fn hw_complete(&mut self, status: CbStatus) {
        self.status.write(status.bits().to_le());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ACTION COMMAND BLOCK
// ═══════════════════════════════════════════════════════════════════════════

/// Shared block for configure and individual-address setup commands.
#[repr(C)]
pub struct ActionBlock {
    status: Volatile<u16>,
    command: Volatile<u16>,
    link: Volatile<u32>,
    data: [u8; 24],
}

impl ActionBlock {
    pub fn new() -> Self {
        Self {
            status: Volatile::new(0),
            command: Volatile::new(0),
            link: Volatile::new(0),
            data: [0; 24],
        }
    }

    pub fn status(&self) -> CbStatus {
        CbStatus::from_bits_retain(u16::from_le(self.status.read()))
    }

    /// Prepare a single-command chain carrying `payload`.
    pub fn prepare(&mut self, opcode: CbCommand, payload: &[u8]) {
        self.data[..payload.len()].copy_from_slice(payload);
        self.status.write(0);
        self.command.write((CbCommand::EL | opcode).bits().to_le());
        self.link.write(0);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STATISTICS DUMP AREA
// ═══════════════════════════════════════════════════════════════════════════

/// Statistics dump area: standard counters followed by the completion word.
#[repr(C)]
pub struct StatsDump {
    counters: [Volatile<u32>; STATS_COUNTERS],
    completion: Volatile<u32>,
}

impl StatsDump {
    pub fn new() -> Self {
        Self {
            counters: core::array::from_fn(|_| Volatile::new(0)),
            completion: Volatile::new(0),
        }
    }

    pub fn clear_completion(&mut self) {
        self.completion.write(0);
    }

    pub fn completion(&self) -> u32 {
        u32::from_le(self.completion.read())
    }

    pub fn counter(&self, index: usize) -> u32 {
        u32::from_le(self.counters[index].read())
    }
}
