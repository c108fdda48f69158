//! Serial management interfaces.
//!
//! The station address lives in a 93Cxx-style serial EEPROM that is
//! bit-banged through the EEPROM control register. PHY registers are read
//! through the MDI control register, which clocks the MII management frame
//! itself; the driver only waits for the ready bit.
//!
//! # EEPROM read
//! 1. Assert chip select
//! 2. Clock out start bit and READ opcode (`110`)
//! 3. Clock out the register address, MSB first
//! 4. Clock in 16 data bits, MSB first
//! 5. Deassert chip select
//!
//! The address width (6 bits on 64-word parts, 8 on 256-word parts) is
//! found once by clocking zero address bits until the EEPROM drives its
//! dummy zero on data-out.

use super::regs::{
    CE_EECS, CE_EEDI, CE_EEDO, CE_EESK, CM_DATA_MASK, CM_PHYADDR, CM_PHYADDR_SHIFT, CM_READ,
    CM_READY, CM_REG_SHIFT, CSR_EEPROM, CSR_MDI_CTL, EECS_DELAY_US, EEPROM_PREFIX_LEN,
    EEPROM_READ_PREFIX, EESK_PERIOD_US,
};
use crate::platform::{Clock, PortIo};
use crate::time::{spin_until, timeout};

/// Longest address width probed before giving up.
const MAX_ADDR_BITS: u32 = 32;

/// Serial EEPROM and MDI access for one controller.
#[derive(Debug)]
pub struct SerialEngine {
    base: u32,
    /// Cached EEPROM address width.
    addr_bits: Option<u32>,
    /// Set while an MDI transaction is outstanding.
    busy: bool,
}

impl SerialEngine {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            addr_bits: None,
            busy: false,
        }
    }

    /// Whether a management transaction is in progress.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// EEPROM address width, probing the part on first use.
    pub fn eeprom_addr_bits<P>(&mut self, p: &mut P) -> u32
    where
        P: PortIo + Clock + ?Sized,
    {
        if let Some(bits) = self.addr_bits {
            return bits;
        }
        let bits = self.probe_addr_bits(p);
        if bits != 6 && bits != 8 {
            fatal!("fxp: unsupported EEPROM address width {}", bits);
        }
        log::debug!("fxp: EEPROM address width {}", bits);
        self.addr_bits = Some(bits);
        bits
    }

    /// Read one 16-bit EEPROM word.
    pub fn read_eeprom<P>(&mut self, p: &mut P, reg: u16) -> u16
    where
        P: PortIo + Clock + ?Sized,
    {
        let alen = self.eeprom_addr_bits(p);
        let port = self.base + CSR_EEPROM;

        p.port_write8(port, CE_EECS);
        self.shift_out(p, EEPROM_READ_PREFIX, EEPROM_PREFIX_LEN);
        self.shift_out(p, u32::from(reg), alen);

        let mut value = 0u16;
        for _ in 0..16 {
            p.port_write8(port, CE_EECS | CE_EESK);
            p.micro_delay(half_period());
            let bit = p.port_read8(port) & CE_EEDO != 0;
            value = (value << 1) | u16::from(bit);
            p.port_write8(port, CE_EECS);
            p.micro_delay(half_period());
        }
        self.deselect(p);
        value
    }

    /// Read a PHY register through the MDI control register.
    pub fn read_phy<P>(&mut self, p: &mut P, reg: u8) -> u16
    where
        P: PortIo + Clock + ?Sized,
    {
        if self.busy {
            fatal!("fxp: MDI access re-entered");
        }
        self.busy = true;

        let port = self.base + CSR_MDI_CTL;
        if p.port_read32(port) & CM_READY == 0 {
            fatal!("fxp: MDI not ready");
        }
        p.port_write32(
            port,
            CM_READ | (CM_PHYADDR << CM_PHYADDR_SHIFT) | (u32::from(reg) << CM_REG_SHIFT),
        );

        let mut value = 0;
        let ready = spin_until(p, timeout::MDI_READY, |p| {
            value = p.port_read32(port);
            value & CM_READY != 0
        });
        if !ready {
            fatal!("fxp: MDI not ready after reading PHY register {:#x}", reg);
        }

        self.busy = false;
        (value & CM_DATA_MASK) as u16
    }

    fn probe_addr_bits<P>(&mut self, p: &mut P) -> u32
    where
        P: PortIo + Clock + ?Sized,
    {
        let port = self.base + CSR_EEPROM;

        p.port_write8(port, CE_EECS);
        self.shift_out(p, EEPROM_READ_PREFIX, EEPROM_PREFIX_LEN);

        let mut bits = None;
        for i in 0..MAX_ADDR_BITS {
            self.clock_bit(p, 0);
            if p.port_read8(port) & CE_EEDO == 0 {
                bits = Some(i + 1);
                break;
            }
        }
        let Some(bits) = bits else {
            fatal!("fxp: EEPROM address width probe failed");
        };

        // The part now streams the word at address 0.
        for _ in 0..16 {
            p.port_write8(port, CE_EECS | CE_EESK);
            p.micro_delay(half_period());
            p.port_write8(port, CE_EECS);
            p.micro_delay(half_period());
        }
        self.deselect(p);
        bits
    }

    /// Clock out the low `len` bits of `value`, MSB first.
    fn shift_out<P>(&self, p: &mut P, value: u32, len: u32)
    where
        P: PortIo + Clock + ?Sized,
    {
        for i in (0..len).rev() {
            let b = if value & (1 << i) != 0 { CE_EEDI } else { 0 };
            self.clock_bit(p, b);
        }
    }

    fn clock_bit<P>(&self, p: &mut P, b: u8)
    where
        P: PortIo + Clock + ?Sized,
    {
        let port = self.base + CSR_EEPROM;
        p.port_write8(port, CE_EECS | b);
        p.port_write8(port, CE_EECS | b | CE_EESK);
        p.micro_delay(half_period());
        p.port_write8(port, CE_EECS | b);
        p.micro_delay(half_period());
    }

    fn deselect<P>(&self, p: &mut P)
    where
        P: PortIo + Clock + ?Sized,
    {
        p.port_write8(self.base + CSR_EEPROM, 0);
        p.micro_delay(EECS_DELAY_US);
    }
}

#[inline]
const fn half_period() -> u32 {
    EESK_PERIOD_US / 2 + 1
}
