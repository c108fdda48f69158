//! smoltcp integration layer.
//!
//! [`FxpPhy`] exposes an [`FxpDevice`] to smoltcp through the polled ring
//! API. It borrows the device, so the host keeps ownership and can still
//! run the interrupt and timer paths between polls.
//!
//! # Usage
//!
//! ```ignore
//! use morpheus_fxp::FxpPhy;
//! use smoltcp::iface::{Config, Interface};
//! use smoltcp::wire::HardwareAddress;
//!
//! let mac = dev.configure(ReceiveMode::BROADCAST)?;
//! let mut phy = FxpPhy::new(&mut dev);
//! let mut iface = Interface::new(Config::new(HardwareAddress::Ethernet(mac)), &mut phy, now);
//!
//! loop {
//!     iface.poll(now, &mut phy, &mut sockets);
//! }
//! ```
//!
//! Frames received while a client receive request is parked go to that
//! client, not to smoltcp.

use alloc::vec;
use alloc::vec::Vec;

use smoltcp::phy::{Device, DeviceCapabilities, Medium, RxToken, TxToken};
use smoltcp::time::Instant;

use crate::driver::fxp::regs::MIN_FRAME;
use crate::driver::fxp::FxpDevice;
use crate::platform::Platform;

/// Largest frame smoltcp may hand us, Ethernet header included.
const MTU: usize = 1514;

/// smoltcp `phy::Device` over a borrowed controller.
pub struct FxpPhy<'d, P: Platform> {
    dev: &'d mut FxpDevice<P>,
}

impl<'d, P: Platform> FxpPhy<'d, P> {
    pub fn new(dev: &'d mut FxpDevice<P>) -> Self {
        Self { dev }
    }

    pub fn device(&mut self) -> &mut FxpDevice<P> {
        &mut *self.dev
    }
}

impl<'d, P: Platform> Device for FxpPhy<'d, P> {
    type RxToken<'a> = FxpRxToken where Self: 'a;
    type TxToken<'a> = FxpTxToken<'a, P> where Self: 'a;

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = MTU;
        caps.medium = Medium::Ethernet;
        caps
    }

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        let frame = self.dev.try_receive()?;
        Some((FxpRxToken { frame }, FxpTxToken { dev: &mut *self.dev }))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        if !self.dev.can_transmit() {
            self.dev.reclaim_tx();
        }
        if self.dev.can_transmit() {
            Some(FxpTxToken { dev: &mut *self.dev })
        } else {
            None
        }
    }
}

/// A frame already copied out of the RX ring.
pub struct FxpRxToken {
    frame: Vec<u8>,
}

impl RxToken for FxpRxToken {
    fn consume<R, F>(mut self, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        f(&mut self.frame)
    }
}

pub struct FxpTxToken<'a, P: Platform> {
    dev: &'a mut FxpDevice<P>,
}

impl<'a, P: Platform> TxToken for FxpTxToken<'a, P> {
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        // Runts are zero-padded to the minimum frame size.
        let mut buffer = vec![0u8; len.max(MIN_FRAME)];
        let result = f(&mut buffer[..len]);

        if !self.dev.try_transmit(&buffer) {
            self.dev.reclaim_tx();
            if !self.dev.try_transmit(&buffer) {
                log::warn!("fxp: TX ring full, dropping {} byte frame", len);
            }
        }
        result
    }
}
