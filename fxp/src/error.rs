//! fxp error types
//!
//! Only conditions a caller can act on are errors. Hardware protocol
//! violations and timeouts abort through `fatal!`.

use core::fmt;

use crate::pci::PciAddr;

pub type Result<T> = core::result::Result<T, FxpError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FxpError {
    /// No supported controller on the bus.
    NotFound,
    /// Controller explicitly disabled through configuration.
    Disabled,
    /// Configured PCI location holds a device that is not a supported 8255x.
    WrongDevice {
        addr: PciAddr,
        vendor: u16,
        device: u16,
    },
    /// Revision ID names a chip this driver does not drive.
    UnsupportedRevision(u8),
    /// Malformed configuration value.
    InvalidConfig(&'static str),
    /// Operation needs an enabled device.
    NotConfigured,
}

impl fmt::Display for FxpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "No 8255x controller found"),
            Self::Disabled => write!(f, "Controller disabled by configuration"),
            Self::WrongDevice { addr, vendor, device } => write!(
                f,
                "Device {:04x}:{:04x} at {} is not a supported 8255x",
                vendor, device, addr
            ),
            Self::UnsupportedRevision(rev) => write!(f, "Unsupported 8255x revision 0x{:02x}", rev),
            Self::InvalidConfig(what) => write!(f, "Invalid configuration: {}", what),
            Self::NotConfigured => write!(f, "Device not configured"),
        }
    }
}
