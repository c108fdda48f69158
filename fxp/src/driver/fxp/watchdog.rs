//! Link and transmit-stall watchdog.
//!
//! Runs once per period from the host timer. A link change schedules a
//! link report; a parked transmit request that sees no progress for a full
//! period schedules a reset. Both are carried out by the deferred interrupt
//! phase, reached through a software interrupt.

use core::time::Duration;

use super::link;
use super::{FxpDevice, Platform};

/// Watchdog bookkeeping.
#[derive(Debug, Clone)]
pub struct WatchdogState {
    period: Duration,
    deadline: Option<crate::time::Tick>,
    /// Masked SCR at the last link report.
    pub(super) scr: u16,
    /// Transmit progress seen since the previous tick.
    pub(super) tx_alive: bool,
    pub(super) need_reset: bool,
    pub(super) report_link: bool,
}

impl WatchdogState {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
            scr: 0,
            tx_alive: false,
            need_reset: false,
            report_link: false,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn deadline(&self) -> Option<crate::time::Tick> {
        self.deadline
    }

    pub fn tx_alive(&self) -> bool {
        self.tx_alive
    }

    pub fn need_reset(&self) -> bool {
        self.need_reset
    }

    pub fn report_pending(&self) -> bool {
        self.report_link
    }

    /// Record a new SCR reading.
    ///
    /// # Returns
    /// `true` if it differs from the last reported one.
    pub fn link_changed(&mut self, scr: u16) -> bool {
        if scr != self.scr {
            self.report_link = true;
            return true;
        }
        false
    }

    /// Advance the stall detector by one period.
    ///
    /// With nothing parked the transmitter counts as alive. Otherwise a
    /// period without progress since the last tick requests a reset.
    ///
    /// # Returns
    /// `true` if a reset is now required.
    pub fn check_stall(&mut self, tx_parked: bool) -> bool {
        if !tx_parked {
            self.tx_alive = true;
            return false;
        }
        if self.tx_alive {
            self.tx_alive = false;
            return false;
        }
        self.need_reset = true;
        true
    }
}

impl<P: Platform> FxpDevice<P> {
    /// Timer callback. Runs the watchdog if its deadline has passed.
    pub fn expire_timers(&mut self) {
        let Some(deadline) = self.watchdog.deadline else {
            return;
        };
        if self.platform.now() >= deadline {
            self.watchdog_tick();
        }
    }

    /// One watchdog period.
    pub fn watchdog_tick(&mut self) {
        self.arm_watchdog();
        if !self.enabled {
            return;
        }

        // The MDI may be mid-transaction if the tick interrupted one.
        if !self.serial.is_busy() {
            let scr = link::read_scr(&mut self.serial, &mut self.platform);
            if self.watchdog.link_changed(scr) {
                log::debug!("fxp: link changed");
                self.raise_software_interrupt();
            }
        }

        if self.watchdog.check_stall(self.queue.is_tx_armed()) {
            self.raise_software_interrupt();
        }
    }

    pub(super) fn arm_watchdog(&mut self) {
        let deadline = self.platform.now().saturating_add(self.watchdog.period);
        self.watchdog.deadline = Some(deadline);
        self.platform.set_timer(deadline);
    }

    /// Have the device interrupt so the deferred phase runs.
    fn raise_software_interrupt(&mut self) {
        self.irq.got_int = true;
        self.scb.software_interrupt(&mut self.platform);
    }

    pub(super) fn report_link(&mut self) {
        self.watchdog.report_link = false;
        let (scr, status) = link::probe_link(&mut self.serial, &mut self.platform);
        self.watchdog.scr = scr;
        self.link = Some(status);
        log::info!("fxp {}: {}", self.pci.addr, status);
    }
}
