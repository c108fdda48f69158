//! CU/RU command protocol.
//!
//! The System Control Block accepts one command byte at a time. A command
//! is issued by loading the general pointer, writing the opcode, and
//! waiting until the device clears the opcode field back to NOP. Action
//! commands (configure, IA setup) additionally wait for the C bit of their
//! command block; statistics dumps wait for the completion word.

use core::sync::atomic::{fence, Ordering};
use core::time::Duration;

use super::desc::{ActionBlock, StatsDump};
use super::regs::{
    CbCommand, CbStatus, CuCommand, CuState, IntCause, RuCommand, RuState, CP_SOFTWARE_RESET,
    CSR_PORT, SCB_CMD, SCB_INT_MASK, SCB_INT_STAT, SCB_POINTER, SCB_STATUS, SCM_DSC,
    SC_CUC_MASK, SC_RUC_MASK, SIM_M, SIM_SI,
};
use super::ring::RxRing;
use crate::platform::{BusAddress, Clock, PortIo};
use crate::time::{spin_until, timeout};

/// Command for one of the two SCB units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cu(CuCommand),
    Ru(RuCommand),
}

impl Command {
    fn byte(self) -> u8 {
        match self {
            Self::Cu(c) => c as u8,
            Self::Ru(c) => c as u8,
        }
    }

    fn field_mask(self) -> u8 {
        match self {
            Self::Cu(_) => SC_CUC_MASK,
            Self::Ru(_) => SC_RUC_MASK,
        }
    }

    fn accept_timeout(self) -> Duration {
        match self {
            Self::Cu(_) => timeout::CU_ACCEPT,
            Self::Ru(_) => timeout::RU_ACCEPT,
        }
    }
}

/// System Control Block of one controller.
#[derive(Debug, Clone, Copy)]
pub struct Scb {
    base: u32,
}

impl Scb {
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    pub fn status<P: PortIo + ?Sized>(&self, p: &mut P) -> u8 {
        p.port_read8(self.base + SCB_STATUS)
    }

    pub fn cu_state<P: PortIo + ?Sized>(&self, p: &mut P) -> CuState {
        CuState::from_status(self.status(p))
    }

    pub fn ru_state<P: PortIo + ?Sized>(&self, p: &mut P) -> RuState {
        RuState::from_status(self.status(p))
    }

    /// Read pending interrupt causes and acknowledge exactly those.
    pub fn ack<P: PortIo + ?Sized>(&self, p: &mut P) -> IntCause {
        let isr = p.port_read8(self.base + SCB_INT_STAT);
        p.port_write8(self.base + SCB_INT_STAT, isr);
        IntCause::from_bits_retain(isr)
    }

    pub fn mask_interrupts<P: PortIo + ?Sized>(&self, p: &mut P) {
        p.port_write8(self.base + SCB_INT_MASK, SIM_M);
    }

    pub fn unmask_interrupts<P: PortIo + ?Sized>(&self, p: &mut P) {
        p.port_write8(self.base + SCB_INT_MASK, 0);
    }

    /// Ask the device to raise an SWI interrupt.
    pub fn software_interrupt<P: PortIo + ?Sized>(&self, p: &mut P) {
        p.port_write8(self.base + SCB_INT_MASK, SIM_SI);
    }

    /// PORT software reset. Leaves CU and RU idle and interrupts masked.
    pub fn soft_reset<P: PortIo + Clock + ?Sized>(&self, p: &mut P) {
        p.port_write32(self.base + CSR_PORT, CP_SOFTWARE_RESET);
        p.micro_delay(timeout::SOFT_RESET_US);
    }

    /// Issue `cmd` with `pointer` in the general pointer.
    ///
    /// # Arguments
    /// * `require_idle` - the addressed unit must be idle beforehand
    ///
    /// Fatal if the unit is busy when it must be idle, or if the device
    /// does not accept the command in time.
    pub fn issue<P>(&self, p: &mut P, cmd: Command, pointer: u32, require_idle: bool)
    where
        P: PortIo + Clock + ?Sized,
    {
        if require_idle {
            let status = self.status(p);
            let idle = match cmd {
                Command::Cu(_) => CuState::from_status(status) == CuState::Idle,
                Command::Ru(_) => RuState::from_status(status) == RuState::Idle,
            };
            if !idle {
                fatal!("fxp: {:?} issued while unit busy (status {:#04x})", cmd, status);
            }
        }

        fence(Ordering::Release);
        p.port_write32(self.base + SCB_POINTER, pointer);
        p.port_write8(self.base + SCB_CMD, cmd.byte());

        let port = self.base + SCB_CMD;
        let mask = cmd.field_mask();
        if !spin_until(p, cmd.accept_timeout(), |p| p.port_read8(port) & mask == 0) {
            fatal!("fxp: {:?} not accepted", cmd);
        }
        log::trace!("fxp: {:?} ptr {:#010x}", cmd, pointer);
    }

    /// Run a single action command block to completion.
    ///
    /// The CU must be idle. Fatal if the block does not complete with OK
    /// within `limit`.
    pub fn execute_action<P>(
        &self,
        p: &mut P,
        block: &mut ActionBlock,
        block_bus: BusAddress,
        opcode: CbCommand,
        payload: &[u8],
        limit: Duration,
    ) where
        P: PortIo + Clock + ?Sized,
    {
        block.prepare(opcode, payload);
        self.issue(p, Command::Cu(CuCommand::Start), block_bus.as_u32(), true);

        spin_until(p, limit, |_| block.status().contains(CbStatus::C));
        fence(Ordering::Acquire);
        let status = block.status();
        if !status.contains(CbStatus::C | CbStatus::OK) {
            fatal!(
                "fxp: action {:#x} failed, status {:#06x}",
                opcode.bits(),
                status.bits()
            );
        }
    }

    /// Dump the statistics counters into `dump`.
    ///
    /// The dump address must have been loaded with LOAD_DUMP_ADDRESS.
    pub fn dump_statistics<P>(&self, p: &mut P, dump: &mut StatsDump)
    where
        P: PortIo + Clock + ?Sized,
    {
        dump.clear_completion();
        self.issue(p, Command::Cu(CuCommand::DumpStatistics), 0, false);

        spin_until(p, timeout::DUMP_STATISTICS, |_| dump.completion() != 0);
        fence(Ordering::Acquire);
        match dump.completion() {
            0 => fatal!("fxp: statistics dump timed out"),
            SCM_DSC => {}
            other => fatal!("fxp: bad statistics dump completion {:#x}", other),
        }
    }

    /// Recover the RU after it ran out of receive descriptors.
    ///
    /// Every RFD is reinitialized and the RU restarted at the first one.
    /// Only valid in the no-resources state.
    pub fn restart_ru<P>(&self, p: &mut P, rx: &mut RxRing)
    where
        P: PortIo + Clock + ?Sized,
    {
        let state = self.ru_state(p);
        if state != RuState::NoResources {
            fatal!("fxp: RU restart in state {:?}", state);
        }
        rx.reinit();
        self.issue(p, Command::Ru(RuCommand::Start), rx.base().as_u32(), false);
        log::debug!("fxp: RU restarted");
    }
}
