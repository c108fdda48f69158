//! Interrupt handling.
//!
//! Two phases. The hard phase reads and acknowledges the cause byte and
//! only records what needs doing. The deferred phase, run afterwards on
//! the same dispatch path, touches the rings: it replays parked requests,
//! retires transmitted blocks and restarts a CU that stopped early.

use super::command::Command;
use super::regs::{CuCommand, CuState, IntCause};
use super::{FxpDevice, Platform, Reply};

/// Work recorded by the hard phase.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct InterruptFlags {
    /// Deferred phase has work.
    pub got_int: bool,
    /// CU left the active state while the TX ring was busy.
    pub send_int: bool,
    /// RU ran out of descriptors.
    pub rx_need_restart: bool,
}

impl<P: Platform> FxpDevice<P> {
    /// Entry point for the device IRQ.
    pub fn handle_interrupt(&mut self) {
        self.on_interrupt();
        self.platform.irq_enable(self.pci.irq);

        if self.irq.got_int {
            self.irq.got_int = false;
            self.check_interrupts();
        }
    }

    /// Hard phase: acknowledge and classify causes.
    pub fn on_interrupt(&mut self) {
        let causes = self.scb.ack(&mut self.platform);
        let mut unhandled = causes;

        if causes.contains(IntCause::FR) {
            unhandled.remove(IntCause::FR);
            if self.queue.is_rx_armed() {
                self.irq.got_int = true;
            }
        }
        if causes.contains(IntCause::CNA) {
            unhandled.remove(IntCause::CNA);
            if !self.tx.is_idle() {
                self.irq.send_int = true;
                self.irq.got_int = true;
            }
        }
        if causes.contains(IntCause::RNR) {
            unhandled.remove(IntCause::RNR);
            // Receive ring is full of frames; restarted on the next read.
            self.irq.rx_need_restart = true;
        }
        if causes.contains(IntCause::SWI) {
            unhandled.remove(IntCause::SWI);
            self.irq.got_int = true;
        }
        if !unhandled.is_empty() {
            log::warn!("fxp: unhandled interrupt causes {:#04x}", unhandled.bits());
        }
    }

    /// Deferred phase.
    pub fn check_interrupts(&mut self) {
        if !self.enabled {
            return;
        }

        if self.queue.is_rx_armed() && self.rx.head_complete() {
            self.replay_rx();
        }

        self.service_tx();

        if self.watchdog.need_reset {
            self.recover();
        }
        if self.watchdog.report_link {
            self.report_link();
        }
    }

    fn replay_rx(&mut self) {
        let Some(request) = self.queue.take_rx() else {
            return;
        };
        match self.read_frame(request.capacity) {
            Some(frame) => self.replies.push_back(Reply::Received {
                client: request.client,
                frame,
            }),
            None => self.queue.arm_rx(request),
        }
    }

    /// Retire transmitted blocks and move the TX side forward.
    ///
    /// # Returns
    /// Number of blocks retired.
    pub(super) fn service_tx(&mut self) -> usize {
        if self.tx.is_idle() || !self.irq.send_int {
            return 0;
        }
        self.irq.send_int = false;

        let retired = self.tx.drain();

        if self.need_conf {
            if self.scb.cu_state(&mut self.platform) == CuState::Idle {
                self.need_conf = false;
                self.do_conf();
            } else {
                log::debug!("fxp: configure still deferred, CU busy");
            }
        }

        if retired == 0 {
            return 0;
        }
        self.watchdog.tx_alive = true;

        if !self.tx.is_idle() {
            // The CU reached the old end of list before the next block was
            // linked in. Resume at the first unfinished block.
            let state = self.scb.cu_state(&mut self.platform);
            if state == CuState::Idle {
                self.scb.issue(
                    &mut self.platform,
                    Command::Cu(CuCommand::Start),
                    self.tx.tail_bus().as_u32(),
                    true,
                );
            } else {
                log::debug!("fxp: CU {:?} after retiring {} blocks", state, retired);
            }
        }

        self.replay_tx();
        retired
    }

    pub(super) fn replay_tx(&mut self) {
        let Some(request) = self.queue.take_tx() else {
            return;
        };
        if !self.start_transmit(&request.frame) {
            fatal!("fxp: transmit replay found the ring full");
        }
        self.watchdog.tx_alive = true;
        self.replies.push_back(Reply::Sent {
            client: request.client,
        });
    }

    /// Full reset after a transmit stall. Parked requests survive.
    fn recover(&mut self) {
        log::warn!("fxp {}: transmitter stalled, resetting", self.pci.addr);
        self.watchdog.need_reset = false;
        self.irq = InterruptFlags::default();
        self.need_conf = false;

        self.init_hw();
        self.watchdog.tx_alive = true;
        self.replay_tx();
    }
}
