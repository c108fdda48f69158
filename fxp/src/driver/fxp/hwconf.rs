//! Configure command bytes.
//!
//! The 22-byte block sent with the configure action command. Defaults are
//! safe for every supported family; family-specific and receive-mode bits
//! are layered on top.

use bitflags::bitflags;

use super::desc::CONFIG_BYTES;
use crate::config::Tuning;
use crate::pci::DeviceKind;

// Byte 1: TX/RX FIFO limits.
const CTL_DEFAULT: u8 = 0x00;
const CRL_DEFAULT: u8 = 0x08;
// Byte 3.
const CCB3_MWIE: u8 = 0x01;
// Byte 6.
const CCB6_ESC: u8 = 0x20;
const CCB6_ETCB: u8 = 0x10;
const CCB6_RES: u8 = 0x02;
// Byte 7.
const CCB7_2FFIFO: u8 = 0x08;
const CUR_1: u8 = 0x02;
// Byte 8.
const CCB8_503_MII: u8 = 0x01;
// Byte 10: normal loopback, preamble length 7, no source address insertion.
const CCB10_DEFAULT: u8 = 0x2e;
// Byte 12: interframe spacing.
const CIS_DEFAULT: u8 = 0x60;
const CCB13_DEFAULT: u8 = 0x00;
const CCB14_DEFAULT: u8 = 0xf2;
// Byte 15.
const CCB15_RES1: u8 = 0x08;
const CCB15_RES2: u8 = 0x40;
const CCB15_CRSCDT: u8 = 0x80;
const CCB15_BD: u8 = 0x02;
const CCB15_PM: u8 = 0x01;
const CCB16_DEFAULT: u8 = 0x00;
const CCB17_DEFAULT: u8 = 0x40;
// Byte 18.
const CCB18_RES1: u8 = 0x80;
const CCB18_PFCT: u8 = 0x70;
const CCB18_LROK: u8 = 0x08;
const CCB18_PE: u8 = 0x02;
// Byte 19.
const CCB19_FDPE: u8 = 0x80;
const CCB19_FDRSTAFC: u8 = 0x10;
const CCB19_FDRSTOFC: u8 = 0x08;
// Byte 20.
const CCB20_PFCL: u8 = 0x20;
const CCB20_RES1: u8 = 0x1f;
// Byte 21.
const CCB21_MA: u8 = 0x08;
const CCB21_RES21: u8 = 0x05;

bitflags! {
    /// Frames the receive unit accepts besides unicast to the station address.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReceiveMode: u8 {
        const PROMISCUOUS = 0x01;
        const MULTICAST = 0x02;
        const BROADCAST = 0x04;
    }
}

/// Configure command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigBytes([u8; CONFIG_BYTES]);

impl ConfigBytes {
    /// Defaults for `kind`, with optional features from `tuning`.
    pub fn for_device(kind: DeviceKind, tuning: &Tuning) -> Self {
        let mut b = [0u8; CONFIG_BYTES];
        b[0] = CONFIG_BYTES as u8;
        b[1] = CTL_DEFAULT | CRL_DEFAULT;
        b[6] = CCB6_ESC | CCB6_ETCB | CCB6_RES;
        b[7] = CUR_1;
        b[8] = CCB8_503_MII;
        b[10] = CCB10_DEFAULT;
        b[12] = CIS_DEFAULT;
        b[13] = CCB13_DEFAULT;
        b[14] = CCB14_DEFAULT;
        b[15] = CCB15_RES1 | CCB15_RES2;
        b[16] = CCB16_DEFAULT;
        b[17] = CCB17_DEFAULT;
        b[18] = CCB18_RES1 | CCB18_PFCT | CCB18_PE;
        b[19] = CCB19_FDPE;
        b[20] = CCB20_PFCL | CCB20_RES1;
        b[21] = CCB21_RES21;

        match kind {
            DeviceKind::I82557 => {
                if tuning.serial_503 {
                    b[8] &= !CCB8_503_MII;
                    b[15] |= CCB15_CRSCDT;
                }
            }
            DeviceKind::I82558A | DeviceKind::I82559 => {
                if tuning.memory_write_invalidate {
                    b[3] |= CCB3_MWIE;
                }
                if tuning.limit_tx_fifo {
                    b[7] |= CCB7_2FFIFO;
                }
                if tuning.flow_control {
                    b[16] = 0x1f;
                    b[17] = 0x01;
                    b[19] |= CCB19_FDRSTAFC | CCB19_FDRSTOFC;
                }
                b[18] |= CCB18_LROK;
            }
        }
        Self(b)
    }

    /// Rewrite the address filtering bits for `mode`.
    ///
    /// Broadcast reception is disabled only when no mode flag is set.
    pub fn apply_receive_mode(&mut self, mode: ReceiveMode) {
        let b = &mut self.0;
        b[0] = CONFIG_BYTES as u8;
        b[15] &= !(CCB15_BD | CCB15_PM);
        b[21] &= !CCB21_MA;

        if mode.contains(ReceiveMode::PROMISCUOUS) {
            b[15] |= CCB15_PM;
        }
        if mode.contains(ReceiveMode::MULTICAST) {
            b[21] |= CCB21_MA;
        }
        if mode.is_empty() {
            b[15] |= CCB15_BD;
        }
    }

    pub fn as_bytes(&self) -> &[u8; CONFIG_BYTES] {
        &self.0
    }
}
