//! Intel 8255x (fxp) driver.
//!
//! # Structure
//!
//! - [`regs`] - SCB registers, descriptor bits, PHY registers
//! - [`desc`] - DMA-shared descriptor layouts
//! - [`ring`] - RX/TX descriptor rings
//! - [`command`] - CU/RU command protocol
//! - [`serial`] - EEPROM and MDI access
//! - [`pending`] - parked client requests
//! - `init` - hardware bring-up and reset
//! - `interrupt` - hard and deferred interrupt phases
//! - `watchdog` - link and stall monitoring
//!
//! [`FxpDevice`] owns all of it for one controller. The host drives it from
//! a single dispatch loop: client requests, [`FxpDevice::handle_interrupt`]
//! on IRQ and [`FxpDevice::expire_timers`] on timer expiry. Nothing here
//! blocks except bounded hardware polls.

pub mod client;
pub mod command;
pub mod desc;
pub mod hwconf;
pub mod link;
pub mod pending;
pub mod regs;
pub mod ring;
pub mod serial;
pub mod stats;

mod init;
mod interrupt;
mod watchdog;

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use smoltcp::wire::EthernetAddress;

pub use client::{ClientId, Disposition, Reply, RxRequest, TxRequest};
pub use hwconf::ReceiveMode;
pub use link::{LinkMode, LinkStatus, Speed};
pub use stats::CounterSnapshot;
pub use watchdog::WatchdogState;

use self::command::{Command, Scb};
use self::desc::{ActionBlock, StatsDump, FRAME_BUF_SIZE};
use self::hwconf::ConfigBytes;
use self::interrupt::InterruptFlags;
use self::pending::FlowControlQueue;
use self::regs::CuCommand;
use self::ring::{RxPoll, RxRing, TxAppend, TxRing};
use self::serial::SerialEngine;
use crate::config::FxpConfig;
use crate::error::{FxpError, Result};
use crate::pci::{self, PciDevice};
use crate::platform::{map_object, BusAddress, PciBus, Platform};

/// One 8255x controller.
pub struct FxpDevice<P: Platform> {
    platform: P,
    pci: PciDevice,
    config: FxpConfig,
    scb: Scb,
    serial: SerialEngine,

    /// Hardware initialized and accepting requests.
    enabled: bool,
    mode: ReceiveMode,
    conf: ConfigBytes,
    /// Configure command waiting for the CU to go idle.
    need_conf: bool,
    address: Option<EthernetAddress>,
    link: Option<LinkStatus>,

    rx: RxRing,
    tx: TxRing,
    action: Box<ActionBlock>,
    action_bus: BusAddress,
    stats: Box<StatsDump>,
    stats_bus: BusAddress,

    queue: FlowControlQueue<TxRequest, RxRequest>,
    irq: InterruptFlags,
    watchdog: WatchdogState,
    replies: VecDeque<Reply>,
}

impl<P: Platform> FxpDevice<P> {
    /// Find a controller and set up its DMA structures.
    ///
    /// The hardware is not touched beyond PCI configuration reads; it is
    /// brought up by the first [`configure`](Self::configure).
    pub fn probe<B: PciBus + ?Sized>(mut platform: P, bus: &mut B, config: FxpConfig) -> Result<Self> {
        config.validate()?;
        if config.disabled {
            return Err(FxpError::Disabled);
        }
        let pci = pci::locate(bus, config.pci_location)?;

        let rx = RxRing::new(config.rx_ring_size, &mut platform);
        let tx = TxRing::new(config.tx_ring_size, &mut platform);
        let action = Box::new(ActionBlock::new());
        let action_bus = map_object(&mut platform, &*action);
        let stats = Box::new(StatsDump::new());
        let stats_bus = map_object(&mut platform, &*stats);

        let conf = ConfigBytes::for_device(pci.kind, &config.tuning);
        let watchdog = WatchdogState::new(config.watchdog_period);

        Ok(Self {
            platform,
            scb: Scb::new(pci.io_base),
            serial: SerialEngine::new(pci.io_base),
            pci,
            config,
            enabled: false,
            mode: ReceiveMode::empty(),
            conf,
            need_conf: false,
            address: None,
            link: None,
            rx,
            tx,
            action,
            action_bus,
            stats,
            stats_bus,
            queue: FlowControlQueue::default(),
            irq: InterruptFlags::default(),
            watchdog,
            replies: VecDeque::new(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // CLIENT INTERFACE
    // ═══════════════════════════════════════════════════════════════════════

    /// Set the receive mode, bringing the hardware up on first use.
    ///
    /// # Returns
    /// The station address.
    pub fn configure(&mut self, mode: ReceiveMode) -> Result<EthernetAddress> {
        if !self.enabled {
            self.init_hw();
            self.report_link();
            self.arm_watchdog();
            self.enabled = true;
        }

        self.mode = mode;
        self.conf.apply_receive_mode(mode);
        if self.tx.is_idle() {
            self.do_conf();
        } else {
            log::debug!("fxp: transmitter busy, configure deferred");
            self.need_conf = true;
        }
        self.address.ok_or(FxpError::NotConfigured)
    }

    /// Submit a frame for transmission.
    ///
    /// Fatal if a transmit request is already parked.
    pub fn transmit(&mut self, request: TxRequest) -> Result<Disposition> {
        self.ensure_enabled()?;
        if !self.queue.is_tx_armed() && self.start_transmit(&request.frame) {
            self.replies.push_back(Reply::Sent { client: request.client });
            Ok(Disposition::Completed)
        } else {
            self.queue.arm_tx(request);
            Ok(Disposition::Deferred)
        }
    }

    /// Ask for the next received frame.
    ///
    /// Fatal if a receive request is already parked.
    pub fn receive(&mut self, request: RxRequest) -> Result<Disposition> {
        self.ensure_enabled()?;
        if !self.queue.is_rx_armed() {
            if let Some(frame) = self.read_frame(request.capacity) {
                self.replies.push_back(Reply::Received {
                    client: request.client,
                    frame,
                });
                return Ok(Disposition::Completed);
            }
            self.restart_ru_if_needed();
        }
        self.queue.arm_rx(request);
        Ok(Disposition::Deferred)
    }

    /// Dump and translate the hardware counters.
    pub fn get_statistics(&mut self) -> Result<CounterSnapshot> {
        self.ensure_enabled()?;
        self.scb.dump_statistics(&mut self.platform, &mut self.stats);
        Ok(CounterSnapshot::from_dump(&self.stats))
    }

    /// Next reply to hand back to a client.
    pub fn next_reply(&mut self) -> Option<Reply> {
        self.replies.pop_front()
    }

    /// Soft-reset the controller. A later `configure` brings it back up.
    pub fn stop(&mut self) {
        if self.enabled {
            self.scb.soft_reset(&mut self.platform);
            self.enabled = false;
            log::info!("fxp {}: stopped", self.pci.addr);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // POLLED INTERFACE
    // ═══════════════════════════════════════════════════════════════════════

    /// Queue a frame without parking on a full ring.
    ///
    /// # Returns
    /// `false` if the ring is full or a parked request is ahead of it.
    pub fn try_transmit(&mut self, frame: &[u8]) -> bool {
        if !self.enabled || self.queue.is_tx_armed() {
            return false;
        }
        self.start_transmit(frame)
    }

    /// Take a received frame, if any, without parking.
    pub fn try_receive(&mut self) -> Option<Vec<u8>> {
        if !self.enabled || self.queue.is_rx_armed() {
            return None;
        }
        let frame = self.read_frame(FRAME_BUF_SIZE);
        if frame.is_none() {
            self.restart_ru_if_needed();
        }
        frame
    }

    /// Whether [`try_transmit`](Self::try_transmit) would accept a frame now.
    pub fn can_transmit(&self) -> bool {
        self.enabled && !self.queue.is_tx_armed() && self.tx.has_room()
    }

    /// Retire completed transmit blocks without waiting for an interrupt.
    pub fn reclaim_tx(&mut self) -> usize {
        if !self.enabled {
            return 0;
        }
        self.irq.send_int = true;
        self.service_tx()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn address(&self) -> Option<EthernetAddress> {
        self.address
    }

    pub fn link_status(&self) -> Option<LinkStatus> {
        self.link
    }

    pub fn pci(&self) -> &PciDevice {
        &self.pci
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn receive_mode(&self) -> ReceiveMode {
        self.mode
    }

    pub fn tx_ring(&self) -> &TxRing {
        &self.tx
    }

    pub fn rx_ring(&self) -> &RxRing {
        &self.rx
    }

    pub fn watchdog(&self) -> &WatchdogState {
        &self.watchdog
    }

    pub fn is_tx_pending(&self) -> bool {
        self.queue.is_tx_armed()
    }

    pub fn is_rx_pending(&self) -> bool {
        self.queue.is_rx_armed()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    // ═══════════════════════════════════════════════════════════════════════
    // INTERNALS
    // ═══════════════════════════════════════════════════════════════════════

    fn ensure_enabled(&self) -> Result<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(FxpError::NotConfigured)
        }
    }

    /// Append to the TX ring, starting the CU on a fresh chain.
    fn start_transmit(&mut self, frame: &[u8]) -> bool {
        match self.tx.append(frame) {
            TxAppend::Started(bus) => {
                self.scb.issue(
                    &mut self.platform,
                    Command::Cu(CuCommand::Start),
                    bus.as_u32(),
                    true,
                );
                true
            }
            TxAppend::Linked => true,
            TxAppend::RingFull => false,
        }
    }

    /// Copy out and recycle the RX head if it holds a frame.
    fn read_frame(&mut self, capacity: usize) -> Option<Vec<u8>> {
        match self.rx.poll() {
            RxPoll::NotReady => None,
            RxPoll::Ready(len) => {
                if len > capacity {
                    fatal!("fxp: {} byte frame for {} byte buffer", len, capacity);
                }
                let frame = self.rx.frame(len).to_vec();
                self.rx.recycle();
                Some(frame)
            }
        }
    }

    /// Restart the RU if it reported running out of descriptors.
    fn restart_ru_if_needed(&mut self) {
        if !self.irq.rx_need_restart {
            return;
        }
        self.irq.rx_need_restart = false;

        let state = self.scb.ru_state(&mut self.platform);
        if state == regs::RuState::NoResources {
            self.scb.restart_ru(&mut self.platform, &mut self.rx);
        } else {
            log::warn!("fxp: RU restart raced, RU state {:?}", state);
        }
    }
}
