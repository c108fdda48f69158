//! Intel 8255x register and descriptor definitions.
//!
//! Offsets are relative to the I/O BAR. All descriptor words are
//! little-endian in memory.
//!
//! # Reference
//! Intel 8255x 10/100 Mbps Ethernet Controller Family Open Source Software
//! Developer Manual, §6 (SCB), §6.4 (action commands), §6.5 (receive)

use bitflags::bitflags;

// ═══════════════════════════════════════════════════════════════════════════
// SCB / CSR OFFSETS
// ═══════════════════════════════════════════════════════════════════════════

/// SCB status byte (CU and RU state).
pub const SCB_STATUS: u32 = 0x00;
/// SCB STAT/ACK byte. Write 1s to acknowledge.
pub const SCB_INT_STAT: u32 = 0x01;
/// SCB command byte (CUC and RUC fields).
pub const SCB_CMD: u32 = 0x02;
/// SCB interrupt mask byte.
pub const SCB_INT_MASK: u32 = 0x03;
/// SCB general pointer.
pub const SCB_POINTER: u32 = 0x04;
/// PORT interface.
pub const CSR_PORT: u32 = 0x08;
/// Serial EEPROM control register.
pub const CSR_EEPROM: u32 = 0x0e;
/// MDI control register.
pub const CSR_MDI_CTL: u32 = 0x10;

// ═══════════════════════════════════════════════════════════════════════════
// SCB STATUS
// ═══════════════════════════════════════════════════════════════════════════

const SS_CUS_MASK: u8 = 0xc0;
const SS_RUS_MASK: u8 = 0x3c;

/// Command unit state as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuState {
    Idle,
    Suspended,
    /// Low-priority queue active.
    Active,
    /// High-priority queue active.
    ActiveHighPriority,
}

impl CuState {
    pub fn from_status(status: u8) -> Self {
        match status & SS_CUS_MASK {
            0x00 => Self::Idle,
            0x40 => Self::Suspended,
            0x80 => Self::Active,
            _ => Self::ActiveHighPriority,
        }
    }
}

/// Receive unit state as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuState {
    Idle,
    Suspended,
    NoResources,
    Ready,
    /// Encoding the 8255x does not define.
    Reserved(u8),
}

impl RuState {
    pub fn from_status(status: u8) -> Self {
        match status & SS_RUS_MASK {
            0x00 => Self::Idle,
            0x04 => Self::Suspended,
            0x08 => Self::NoResources,
            0x10 => Self::Ready,
            other => Self::Reserved(other),
        }
    }
}

bitflags! {
    /// SCB STAT/ACK interrupt causes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IntCause: u8 {
        /// CU finished a command with the I bit set.
        const CX = 0x80;
        /// RU finished receiving a frame.
        const FR = 0x40;
        /// CU left the active state.
        const CNA = 0x20;
        /// RU left the ready state.
        const RNR = 0x10;
        /// MDI read or write completed.
        const MDI = 0x08;
        /// Software generated interrupt.
        const SWI = 0x04;
        /// Flow control pause.
        const FCP = 0x01;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SCB COMMAND / INTERRUPT MASK
// ═══════════════════════════════════════════════════════════════════════════

/// Command unit field of the SCB command byte.
pub const SC_CUC_MASK: u8 = 0xf0;
/// Receive unit field of the SCB command byte.
pub const SC_RUC_MASK: u8 = 0x07;

/// Command unit opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CuCommand {
    Nop = 0x00,
    Start = 0x10,
    Resume = 0x20,
    /// Load statistics dump area address.
    LoadDumpAddress = 0x40,
    DumpStatistics = 0x50,
    LoadBase = 0x60,
}

/// Receive unit opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RuCommand {
    Nop = 0x00,
    Start = 0x01,
    Resume = 0x02,
    Abort = 0x04,
    LoadBase = 0x06,
}

/// Mask every interrupt source.
pub const SIM_M: u8 = 0x01;
/// Generate a software interrupt.
pub const SIM_SI: u8 = 0x02;

/// PORT selection: software reset.
pub const CP_SOFTWARE_RESET: u32 = 0x0000_0000;

// ═══════════════════════════════════════════════════════════════════════════
// SERIAL EEPROM
// ═══════════════════════════════════════════════════════════════════════════

/// Serial clock.
pub const CE_EESK: u8 = 0x01;
/// Chip select.
pub const CE_EECS: u8 = 0x02;
/// Data in (to EEPROM).
pub const CE_EEDI: u8 = 0x04;
/// Data out (from EEPROM).
pub const CE_EEDO: u8 = 0x08;

/// Start bit plus READ opcode (`1 10`).
pub const EEPROM_READ_PREFIX: u32 = 0b110;
pub const EEPROM_PREFIX_LEN: u32 = 3;
/// Serial clock period in microseconds.
pub const EESK_PERIOD_US: u32 = 4;
/// Chip-select deassert time in microseconds.
pub const EECS_DELAY_US: u32 = 1;

/// EEPROM words holding the station address.
pub const EEPROM_MAC_WORDS: [u16; 3] = [0, 1, 2];

// ═══════════════════════════════════════════════════════════════════════════
// MDI
// ═══════════════════════════════════════════════════════════════════════════

pub const CM_DATA_MASK: u32 = 0x0000_ffff;
pub const CM_REG_SHIFT: u32 = 16;
pub const CM_PHYADDR_SHIFT: u32 = 21;
pub const CM_READ: u32 = 0x0800_0000;
pub const CM_READY: u32 = 0x1000_0000;

/// PHY address of the on-board 82555.
pub const CM_PHYADDR: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════════
// MII REGISTERS
// ═══════════════════════════════════════════════════════════════════════════

pub const MII_CTRL: u8 = 0x00;
pub const MII_STATUS: u8 = 0x01;
pub const MII_PHYID_H: u8 = 0x02;
pub const MII_PHYID_L: u8 = 0x03;
pub const MII_ANA: u8 = 0x04;
pub const MII_ANLPA: u8 = 0x05;
pub const MII_ANE: u8 = 0x06;
pub const MII_EXT_STATUS: u8 = 0x0f;
/// 82555 status and control register.
pub const MII_SCR: u8 = 0x10;

pub const MII_CTRL_LB: u16 = 0x4000;
pub const MII_CTRL_SP_100: u16 = 0x2000;
pub const MII_CTRL_ANE: u16 = 0x1000;
pub const MII_CTRL_PD: u16 = 0x0800;
pub const MII_CTRL_ISO: u16 = 0x0400;
pub const MII_CTRL_DM: u16 = 0x0100;

pub const MII_STATUS_EXT_STAT: u16 = 0x0100;
pub const MII_STATUS_LS: u16 = 0x0004;

/// 82555 SCR: link is full duplex.
pub const MII_SCR_FD: u16 = 0x0001;
/// 82555 SCR: link runs at 100 Mbps.
pub const MII_SCR_100: u16 = 0x0002;
/// 82555 SCR reserved bits 8:2, ignored when comparing snapshots.
pub const MII_SCR_RESERVED: u16 = 0x01fc;

// ═══════════════════════════════════════════════════════════════════════════
// RECEIVE FRAME DESCRIPTOR
// ═══════════════════════════════════════════════════════════════════════════

bitflags! {
    /// RFD status word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RfdStatus: u16 {
        const C = 0x8000;
        const OK = 0x2000;
        const CRC_ERR = 0x0800;
        const ALIGN_ERR = 0x0400;
        const OUT_OF_BUF = 0x0200;
        const DMA_OVERRUN = 0x0100;
        const TOO_SHORT = 0x0080;
        const RX_ERR = 0x0010;
    }
}

impl RfdStatus {
    /// Bits that indicate a damaged frame.
    pub const ERRORS: Self = Self::CRC_ERR
        .union(Self::ALIGN_ERR)
        .union(Self::OUT_OF_BUF)
        .union(Self::DMA_OVERRUN)
        .union(Self::TOO_SHORT)
        .union(Self::RX_ERR);
}

bitflags! {
    /// RFD command word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RfdCommand: u16 {
        /// End of list.
        const EL = 0x8000;
        /// Suspend after this frame.
        const S = 0x4000;
    }
}

/// RFD actual count: end of frame.
pub const RFDR_EOF: u16 = 0x8000;
/// RFD actual count: count field updated.
pub const RFDR_F: u16 = 0x4000;
/// RFD actual count: byte count.
pub const RFDR_COUNT_MASK: u16 = 0x3fff;

// ═══════════════════════════════════════════════════════════════════════════
// COMMAND BLOCKS
// ═══════════════════════════════════════════════════════════════════════════

bitflags! {
    /// Command block status word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CbStatus: u16 {
        const C = 0x8000;
        const OK = 0x2000;
        /// Transmit: DMA underrun occurred at least once.
        const U = 0x1000;
    }
}

bitflags! {
    /// Command block command word. The low three bits are the opcode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CbCommand: u16 {
        /// End of list.
        const EL = 0x8000;
        /// Suspend after completion.
        const S = 0x4000;
        /// Interrupt after completion.
        const I = 0x2000;
        const OP_NOP = 0x0000;
        const OP_IAS = 0x0001;
        const OP_CONFIGURE = 0x0002;
        const OP_XMIT = 0x0004;
    }
}

/// Opcode field of a command block.
pub const CBC_OPCODE_MASK: u16 = 0x0007;

/// Transmit byte count: end of frame.
pub const TXSZ_EOF: u16 = 0x8000;
/// Transmit buffer descriptor array address meaning "none".
pub const TX_TBDA_NIL: u32 = 0xffff_ffff;

/// Transmit threshold, in units of 8 bytes in the FIFO before transmit starts.
pub const TXTT_MIN: u8 = 0x01;
pub const TXTT_MAX: u8 = 0xe0;

// ═══════════════════════════════════════════════════════════════════════════
// STATISTICS
// ═══════════════════════════════════════════════════════════════════════════

/// Standard statistics counters written by DUMP_STATISTICS.
pub const STATS_COUNTERS: usize = 16;
/// Completion word written after a dump of the standard counters.
pub const SCM_DSC: u32 = 0x0000_a005;

// ═══════════════════════════════════════════════════════════════════════════
// FRAMES
// ═══════════════════════════════════════════════════════════════════════════

/// Shortest frame the driver hands to hardware (without FCS).
pub const MIN_FRAME: usize = 60;
/// Longest frame, including an 802.1Q tag (without FCS).
pub const MAX_TAGGED_FRAME: usize = 1518;
