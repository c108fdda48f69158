//! PHY link state.
//!
//! Assumes an 82555-compatible PHY: speed and duplex of an established
//! link come from its status and control register (SCR).

use core::fmt;

use super::regs::{
    MII_ANA, MII_ANE, MII_ANLPA, MII_CTRL, MII_CTRL_ANE, MII_CTRL_DM, MII_CTRL_ISO, MII_CTRL_LB,
    MII_CTRL_PD, MII_CTRL_SP_100, MII_EXT_STATUS, MII_PHYID_H, MII_PHYID_L, MII_SCR,
    MII_SCR_100, MII_SCR_FD, MII_SCR_RESERVED, MII_STATUS, MII_STATUS_EXT_STAT,
    MII_STATUS_LS,
};
use super::serial::SerialEngine;
use crate::platform::{Clock, PortIo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Mbps10,
    Mbps100,
}

/// How the PHY arrived at its current link parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    AutoNegotiated,
    /// Speed and duplex forced in the control register.
    Manual,
    /// Loopback, powered down or isolated.
    Inactive,
}

/// PHY identifier registers decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhyId {
    pub oui: u32,
    pub model: u8,
    pub revision: u8,
}

impl PhyId {
    pub fn from_regs(id1: u16, id2: u16) -> Self {
        Self {
            oui: (u32::from(id1) << 6) | (u32::from(id2 & 0xfc00) >> 10),
            model: ((id2 & 0x03f0) >> 4) as u8,
            revision: (id2 & 0x000f) as u8,
        }
    }
}

/// Link state at the last report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub up: bool,
    pub speed: Speed,
    pub full_duplex: bool,
    pub mode: LinkMode,
    pub phy: PhyId,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.up {
            return write!(f, "link down");
        }
        let speed = match self.speed {
            Speed::Mbps10 => 10,
            Speed::Mbps100 => 100,
        };
        let duplex = if self.full_duplex { "full" } else { "half" };
        match self.mode {
            LinkMode::AutoNegotiated => write!(f, "link up, {} Mbps, {} duplex", speed, duplex),
            LinkMode::Manual => write!(f, "manual config: {} Mbps, {} duplex", speed, duplex),
            LinkMode::Inactive => write!(f, "PHY inactive"),
        }
    }
}

/// SCR with the reserved bits cleared, compared across watchdog periods.
#[inline]
pub const fn scr_snapshot(raw: u16) -> u16 {
    raw & !MII_SCR_RESERVED
}

pub fn read_scr<P>(serial: &mut SerialEngine, p: &mut P) -> u16
where
    P: PortIo + Clock + ?Sized,
{
    scr_snapshot(serial.read_phy(p, MII_SCR))
}

/// Read the PHY register set and derive the link state.
///
/// # Returns
/// The masked SCR snapshot and the decoded status.
pub fn probe_link<P>(serial: &mut SerialEngine, p: &mut P) -> (u16, LinkStatus)
where
    P: PortIo + Clock + ?Sized,
{
    let scr = read_scr(serial, p);
    let ctrl = serial.read_phy(p, MII_CTRL);
    // Link status is latched low; the second read reflects the current state.
    serial.read_phy(p, MII_STATUS);
    let status = serial.read_phy(p, MII_STATUS);
    let id1 = serial.read_phy(p, MII_PHYID_H);
    let id2 = serial.read_phy(p, MII_PHYID_L);
    let ana = serial.read_phy(p, MII_ANA);
    let anlpa = serial.read_phy(p, MII_ANLPA);
    let ane = serial.read_phy(p, MII_ANE);
    let ext = if status & MII_STATUS_EXT_STAT != 0 {
        serial.read_phy(p, MII_EXT_STATUS)
    } else {
        0
    };
    log::debug!(
        "fxp: PHY ctrl {:#06x} status {:#06x} ana {:#06x} anlpa {:#06x} ane {:#06x} ext {:#06x}",
        ctrl,
        status,
        ana,
        anlpa,
        ane,
        ext
    );

    let mode = if ctrl & (MII_CTRL_LB | MII_CTRL_PD | MII_CTRL_ISO) != 0 {
        LinkMode::Inactive
    } else if ctrl & MII_CTRL_ANE == 0 {
        LinkMode::Manual
    } else {
        LinkMode::AutoNegotiated
    };

    let (speed, full_duplex) = match mode {
        LinkMode::Manual => (
            if ctrl & MII_CTRL_SP_100 != 0 { Speed::Mbps100 } else { Speed::Mbps10 },
            ctrl & MII_CTRL_DM != 0,
        ),
        _ => (
            if scr & MII_SCR_100 != 0 { Speed::Mbps100 } else { Speed::Mbps10 },
            scr & MII_SCR_FD != 0,
        ),
    };

    let link = LinkStatus {
        up: status & MII_STATUS_LS != 0,
        speed,
        full_duplex,
        mode,
        phy: PhyId::from_regs(id1, id2),
    };
    (scr, link)
}
