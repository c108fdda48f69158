//! Hardware bring-up.
//!
//! # Initialization Sequence
//! 1. Reinitialize RX and TX rings in place
//! 2. PORT software reset
//! 3. Mask interrupts
//! 4. CU and RU base addresses to zero (flat addressing)
//! 5. Re-arm the interrupt line
//! 6. Configure command
//! 7. Load statistics dump address
//! 8. Acknowledge stale causes, unmask
//! 9. RU START on the first RFD
//! 10. Individual address setup
//!
//! The same sequence recovers a stalled transmitter.
//!
//! # Reference
//! Intel 8255x Open Source Software Developer Manual, §6.3 (initialization)

use smoltcp::wire::EthernetAddress;

use super::command::Command;
use super::regs::{CbCommand, CuCommand, RuCommand, EEPROM_MAC_WORDS};
use super::{FxpDevice, Platform};
use crate::time::timeout;

impl<P: Platform> FxpDevice<P> {
    pub(super) fn init_hw(&mut self) {
        // ═══════════════════════════════════════════════════════════════════
        // STEP 1: Rings
        // ═══════════════════════════════════════════════════════════════════
        self.rx.reinit();
        self.tx.reinit();

        // ═══════════════════════════════════════════════════════════════════
        // STEP 2-4: Reset
        // ═══════════════════════════════════════════════════════════════════
        self.reset_hw();

        // ═══════════════════════════════════════════════════════════════════
        // STEP 5: Interrupt line
        // ═══════════════════════════════════════════════════════════════════
        self.platform.irq_enable(self.pci.irq);

        // ═══════════════════════════════════════════════════════════════════
        // STEP 6-7: Configure, statistics
        // ═══════════════════════════════════════════════════════════════════
        self.do_conf();
        self.scb.issue(
            &mut self.platform,
            Command::Cu(CuCommand::LoadDumpAddress),
            self.stats_bus.as_u32(),
            true,
        );

        // ═══════════════════════════════════════════════════════════════════
        // STEP 8: Interrupts on
        // ═══════════════════════════════════════════════════════════════════
        self.scb.ack(&mut self.platform);
        self.scb.unmask_interrupts(&mut self.platform);

        // ═══════════════════════════════════════════════════════════════════
        // STEP 9: Receiver
        // ═══════════════════════════════════════════════════════════════════
        self.scb.issue(
            &mut self.platform,
            Command::Ru(RuCommand::Start),
            self.rx.base().as_u32(),
            true,
        );

        // ═══════════════════════════════════════════════════════════════════
        // STEP 10: Station address
        // ═══════════════════════════════════════════════════════════════════
        self.set_individual_address();
    }

    /// Soft reset, leaving the device masked with flat CU/RU addressing.
    pub(super) fn reset_hw(&mut self) {
        self.scb.soft_reset(&mut self.platform);
        self.scb.mask_interrupts(&mut self.platform);
        self.scb
            .issue(&mut self.platform, Command::Cu(CuCommand::LoadBase), 0, true);
        self.scb
            .issue(&mut self.platform, Command::Ru(RuCommand::LoadBase), 0, true);
    }

    /// Send the current configuration bytes. The CU must be idle.
    pub(super) fn do_conf(&mut self) {
        self.scb.execute_action(
            &mut self.platform,
            &mut self.action,
            self.action_bus,
            CbCommand::OP_CONFIGURE,
            self.conf.as_bytes(),
            timeout::CONFIGURE,
        );
        log::debug!("fxp: configured, mode {:?}", self.mode);
    }

    fn set_individual_address(&mut self) {
        let mac = match (self.address, self.config.mac_override) {
            (Some(mac), _) => mac,
            (None, Some(mac)) => mac,
            (None, None) => self.read_eeprom_address(),
        };
        self.address = Some(mac);

        self.scb.execute_action(
            &mut self.platform,
            &mut self.action,
            self.action_bus,
            CbCommand::OP_IAS,
            mac.as_bytes(),
            timeout::IA_SETUP,
        );
        log::info!("fxp {}: station address {}", self.pci.addr, mac);
    }

    /// Station address from EEPROM words 0-2, low byte first.
    fn read_eeprom_address(&mut self) -> EthernetAddress {
        let mut mac = [0u8; 6];
        for (pair, &word) in mac.chunks_exact_mut(2).zip(EEPROM_MAC_WORDS.iter()) {
            let v = self.serial.read_eeprom(&mut self.platform, word);
            pair.copy_from_slice(&v.to_le_bytes());
        }
        EthernetAddress(mac)
    }
}
