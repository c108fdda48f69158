//! Driver configuration.
//!
//! Defaults suit a single 8255x on a PC. A boot environment can override
//! them through `FXPETH<n>` style variables:
//!
//! | Variable        | Value                          |
//! |-----------------|--------------------------------|
//! | `FXPETH0`       | `off` or `pci:<bus>.<dev>.<fn>` |
//! | `FXPETH0_EA`    | `xx:xx:xx:xx:xx:xx`            |

use core::time::Duration;

use smoltcp::wire::EthernetAddress;

use crate::error::{FxpError, Result};
use crate::pci::PciAddr;
use crate::time::timeout;

// ═══════════════════════════════════════════════════════════════════════════
// DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════

/// Receive frame descriptors.
pub const DEFAULT_RX_RING_SIZE: usize = 40;

/// Transmit command blocks.
pub const DEFAULT_TX_RING_SIZE: usize = 4;

/// Smallest ring the append/drain logic supports.
const MIN_RING_SIZE: usize = 2;

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// Optional controller features written into the configure block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tuning {
    /// Use PCI Memory Write and Invalidate for receive DMA (82558A and later).
    pub memory_write_invalidate: bool,
    /// Limit the transmit FIFO to avoid underruns on slow buses.
    pub limit_tx_fifo: bool,
    /// Full-duplex flow control frames (82558A and later).
    pub flow_control: bool,
    /// Controller wired to an 82503 serial interface instead of an MII PHY.
    pub serial_503: bool,
}

/// fxp driver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FxpConfig {
    /// Number of receive frame descriptors.
    pub rx_ring_size: usize,
    /// Number of transmit command blocks.
    pub tx_ring_size: usize,
    /// Watchdog period.
    pub watchdog_period: Duration,
    /// Bind to this PCI function instead of the first supported one.
    pub pci_location: Option<PciAddr>,
    /// Do not bind at all.
    pub disabled: bool,
    /// Use this station address instead of the EEPROM one.
    pub mac_override: Option<EthernetAddress>,
    pub tuning: Tuning,
}

impl Default for FxpConfig {
    fn default() -> Self {
        Self {
            rx_ring_size: DEFAULT_RX_RING_SIZE,
            tx_ring_size: DEFAULT_TX_RING_SIZE,
            watchdog_period: timeout::WATCHDOG_PERIOD,
            pci_location: None,
            disabled: false,
            mac_override: None,
            tuning: Tuning::default(),
        }
    }
}

impl FxpConfig {
    /// Build a configuration for instance `instance` from a variable lookup.
    ///
    /// Absent variables keep their defaults.
    pub fn from_env<'a, F>(instance: u8, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut config = Self::default();
        let name = alloc::format!("FXPETH{}", instance);

        if let Some(value) = lookup(&name) {
            match value.trim() {
                "off" => config.disabled = true,
                "on" | "" => {}
                other => config.pci_location = Some(parse_pci_location(other)?),
            }
        }

        let ea_name = alloc::format!("{}_EA", name);
        if let Some(value) = lookup(&ea_name) {
            config.mac_override = Some(parse_mac(value.trim())?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the ring logic cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.rx_ring_size < MIN_RING_SIZE {
            return Err(FxpError::InvalidConfig("rx ring too small"));
        }
        if self.tx_ring_size < MIN_RING_SIZE {
            return Err(FxpError::InvalidConfig("tx ring too small"));
        }
        if self.watchdog_period.is_zero() {
            return Err(FxpError::InvalidConfig("zero watchdog period"));
        }
        if let Some(mac) = self.mac_override {
            if !mac.is_unicast() {
                return Err(FxpError::InvalidConfig("station address is not unicast"));
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════

/// Parse `pci:<bus>.<dev>.<fn>` (decimal fields).
pub fn parse_pci_location(s: &str) -> Result<PciAddr> {
    const BAD: FxpError = FxpError::InvalidConfig("expected pci:<bus>.<dev>.<fn>");

    let rest = s.strip_prefix("pci:").ok_or(BAD)?;
    let mut parts = rest.split('.');
    let mut next = |max: u8| -> Result<u8> {
        let v: u8 = parts.next().ok_or(BAD)?.parse().map_err(|_| BAD)?;
        if v > max {
            return Err(BAD);
        }
        Ok(v)
    };
    let bus = next(u8::MAX)?;
    let device = next(31)?;
    let function = next(7)?;
    if parts.next().is_some() {
        return Err(BAD);
    }
    Ok(PciAddr::new(bus, device, function))
}

/// Parse a colon-separated hexadecimal station address.
pub fn parse_mac(s: &str) -> Result<EthernetAddress> {
    const BAD: FxpError = FxpError::InvalidConfig("expected xx:xx:xx:xx:xx:xx");

    let mut bytes = [0u8; 6];
    let mut parts = s.split(':');
    for byte in bytes.iter_mut() {
        let part = parts.next().ok_or(BAD)?;
        if part.is_empty() || part.len() > 2 {
            return Err(BAD);
        }
        *byte = u8::from_str_radix(part, 16).map_err(|_| BAD)?;
    }
    if parts.next().is_some() {
        return Err(BAD);
    }
    Ok(EthernetAddress(bytes))
}
