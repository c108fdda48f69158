//! 8255x PCI IDs and revision decoding.

use core::fmt;

/// Vendor/device pairs bound by this driver.
pub const SUPPORTED_DEVICES: &[(u16, u16)] = &[
    // 82557/8/9 Fast Ethernet
    (0x8086, 0x1229),
    // 82801BA/BAM/CA/CAM LAN (ICH2/ICH3)
    (0x8086, 0x2449),
];

/// Chip families with distinct configuration needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    I82557,
    I82558A,
    I82559,
}

/// PCI revision ID of an 8255x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision(u8);

impl Revision {
    pub const fn from_id(id: u8) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u8 {
        self.0
    }

    /// Marketing name, if the revision is a known 8255x stepping.
    pub fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0x01 => "82557A",
            0x02 => "82557B",
            0x03 => "82557C",
            0x04 => "82558A",
            0x05 => "82558B",
            0x06 => "82559A",
            0x07 => "82559B",
            0x08 => "82559C",
            0x09 => "82559ER-A",
            0x0c => "82550-A",
            0x0d => "82550-B0",
            0x0e => "82550-B1",
            0x0f => "82551-A",
            0x10 => "82551-B",
            _ => return None,
        })
    }

    /// Family the driver runs this revision as. Steppings that were never
    /// validated are rejected.
    pub fn kind(self) -> Option<DeviceKind> {
        match self.0 {
            0x01 => Some(DeviceKind::I82557),
            0x04 => Some(DeviceKind::I82558A),
            0x08 => Some(DeviceKind::I82559),
            _ => None,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (rev 0x{:02x})", name, self.0),
            None => write!(f, "unknown revision 0x{:02x}", self.0),
        }
    }
}
