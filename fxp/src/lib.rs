//! MorpheusX fxp driver
//!
//! Packet ring and hardware command engine for Intel 8255x fast-Ethernet
//! controllers (82557, 82558, 82559 families).
//!
//! # Layers
//!
//! - [`platform`] - what the driver consumes: port I/O, bus mapping, clock,
//!   timer, interrupt line and PCI configuration space
//! - [`driver::fxp`] - descriptor rings, CU/RU command protocol, two-phase
//!   interrupt handling, pending-request replay and watchdog
//! - [`stack`] - smoltcp `phy::Device` adapter over the polled ring API
//!
//! # Usage
//!
//! ```ignore
//! use morpheus_fxp::{FxpConfig, FxpDevice, ReceiveMode, RxRequest};
//!
//! let mut dev = FxpDevice::probe(platform, &mut pci, FxpConfig::default())?;
//! let mac = dev.configure(ReceiveMode::BROADCAST)?;
//!
//! dev.receive(RxRequest::new(client, 1518));
//! loop {
//!     // on IRQ:   dev.handle_interrupt();
//!     // on alarm: dev.expire_timers();
//!     while let Some(reply) = dev.next_reply() {
//!         deliver(reply);
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod config;
pub mod driver;
pub mod error;
pub mod pci;
pub mod platform;
pub mod stack;
pub mod time;

pub use config::FxpConfig;
pub use driver::fxp::{
    CounterSnapshot, Disposition, FxpDevice, LinkStatus, ReceiveMode, Reply, RxRequest,
    TxRequest,
};
pub use error::{FxpError, Result};
pub use platform::{BusAddress, Platform};
pub use smoltcp::wire::EthernetAddress;
pub use stack::FxpPhy;
