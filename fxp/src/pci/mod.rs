//! PCI discovery for 8255x controllers.
//!
//! Finds a supported function, validates its I/O BAR and decodes the
//! revision into a [`DeviceKind`].

mod ids;

use core::fmt;

pub use ids::{DeviceKind, Revision, SUPPORTED_DEVICES};

use crate::error::{FxpError, Result};
use crate::platform::PciBus;

// ═══════════════════════════════════════════════════════════════════════════
// CONFIG SPACE LAYOUT
// ═══════════════════════════════════════════════════════════════════════════

pub const PCI_VENDOR_ID: u8 = 0x00;
pub const PCI_DEVICE_ID: u8 = 0x02;
pub const PCI_REVISION_ID: u8 = 0x08;
/// BAR 2: I/O-space window of the CSR block on the 8255x.
pub const PCI_BAR_2: u8 = 0x18;
pub const PCI_INTERRUPT_LINE: u8 = 0x3c;

/// Address bits of an I/O BAR.
const IO_BAR_MASK: u32 = 0xffff_ffe0;

/// The CSR block is 32 bytes and must not straddle a 256-byte boundary
/// inside the legacy ISA-aliased window.
const CSR_WINDOW: u32 = 32;

// ═══════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════

/// PCI device address (bus/device/function).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PciAddr {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciAddr {
    pub const fn new(bus: u8, device: u8, function: u8) -> Self {
        Self { bus, device, function }
    }
}

impl fmt::Display for PciAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:{:02x}.{}", self.bus, self.device, self.function)
    }
}

/// A located and validated controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciDevice {
    pub addr: PciAddr,
    pub vendor_id: u16,
    pub device_id: u16,
    pub revision: Revision,
    pub kind: DeviceKind,
    /// Base of the CSR block in I/O space.
    pub io_base: u32,
    pub irq: u8,
}

// ═══════════════════════════════════════════════════════════════════════════
// LOCATE
// ═══════════════════════════════════════════════════════════════════════════

fn is_supported(vendor: u16, device: u16) -> bool {
    SUPPORTED_DEVICES
        .iter()
        .any(|&(v, d)| v == vendor && d == device)
}

/// Find and validate a controller.
///
/// # Arguments
/// * `at` - fixed location from configuration; otherwise the first supported
///   function in enumeration order is used
///
/// # Returns
/// The device, already reserved on the bus.
pub fn locate<B: PciBus + ?Sized>(bus: &mut B, at: Option<PciAddr>) -> Result<PciDevice> {
    let addr = match at {
        Some(addr) => {
            if !bus.functions().contains(&addr) {
                return Err(FxpError::NotFound);
            }
            let vendor = bus.config_read16(addr, PCI_VENDOR_ID);
            let device = bus.config_read16(addr, PCI_DEVICE_ID);
            if !is_supported(vendor, device) {
                return Err(FxpError::WrongDevice { addr, vendor, device });
            }
            addr
        }
        None => {
            let found = bus.functions().into_iter().find(|&addr| {
                let vendor = bus.config_read16(addr, PCI_VENDOR_ID);
                let device = bus.config_read16(addr, PCI_DEVICE_ID);
                is_supported(vendor, device)
            });
            found.ok_or(FxpError::NotFound)?
        }
    };

    let vendor_id = bus.config_read16(addr, PCI_VENDOR_ID);
    let device_id = bus.config_read16(addr, PCI_DEVICE_ID);
    let revision = Revision::from_id(bus.config_read8(addr, PCI_REVISION_ID));
    let io_base = validate_io_bar(bus.config_read32(addr, PCI_BAR_2));
    let irq = bus.config_read8(addr, PCI_INTERRUPT_LINE);

    log::info!(
        "fxp: {} {:04x}:{:04x} {} at I/O {:#x}, IRQ {}",
        addr,
        vendor_id,
        device_id,
        revision,
        io_base,
        irq
    );

    let kind = match revision.kind() {
        Some(kind) => kind,
        None => {
            log::warn!("fxp: {}: {} is not supported", addr, revision);
            return Err(FxpError::UnsupportedRevision(revision.id()));
        }
    };

    bus.reserve(addr);
    Ok(PciDevice {
        addr,
        vendor_id,
        device_id,
        revision,
        kind,
        io_base,
        irq,
    })
}

/// Mask the I/O BAR and check it is usable.
///
/// A BAR the firmware left unassigned or placed in the aliased low window
/// is a platform misconfiguration and fatal.
pub fn validate_io_bar(raw: u32) -> u32 {
    let bar = raw & IO_BAR_MASK;
    if (bar & 0x3ff) >= 0x100 - CSR_WINDOW || bar < 0x400 {
        fatal!("fxp: bad I/O base address {:#x}", bar);
    }
    bar
}
