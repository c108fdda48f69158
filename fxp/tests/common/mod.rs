//! Simulated 8255x for driver tests.
//!
//! [`SimNic`] answers the driver's port I/O the way the controller does:
//! SCB command acceptance, the CU walking command block chains, the RU
//! filling receive descriptors, statistics dumps, a 64-word serial EEPROM
//! and an MDI-attached PHY. Descriptor memory is reached through the bus
//! addresses the driver mapped, so the DMA view is the real one.

#![allow(dead_code)]

use std::cell::Cell;
use std::time::Duration;

use morpheus_fxp::driver::fxp::regs::*;
use morpheus_fxp::pci::{
    PciAddr, PCI_BAR_2, PCI_DEVICE_ID, PCI_INTERRUPT_LINE, PCI_REVISION_ID, PCI_VENDOR_ID,
};
use morpheus_fxp::platform::{BusMapper, Clock, PciBus, Platform, PortIo};
use morpheus_fxp::time::Tick;
use morpheus_fxp::{FxpConfig, FxpDevice, ReceiveMode};

pub const IO_BASE: u32 = 0xc000;
pub const IRQ: u8 = 11;
pub const NIC_ADDR: PciAddr = PciAddr::new(0, 3, 0);

/// Station address burned into the simulated EEPROM.
pub const STATION: [u8; 6] = [0x00, 0xa0, 0xc9, 0x01, 0x02, 0x0f];

/// 82555 at 100 Mbps full duplex, autonegotiated.
pub const PHY_SCR_100_FD: u16 = 0x0003;

const EEPROM_ADDR_BITS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cu {
    Idle,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ru {
    Idle,
    Ready,
    NoResources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EePhase {
    Prefix(u32),
    Address(u32),
    Data(u32),
    Done,
}

struct Region {
    bus: u32,
    ptr: *mut u8,
    len: usize,
}

// ═══════════════════════════════════════════════════════════════════════════
// SIMULATED CONTROLLER
// ═══════════════════════════════════════════════════════════════════════════

pub struct SimNic {
    regions: Vec<Region>,
    next_bus: u32,
    clock: Cell<u64>,
    pub timer: Option<Tick>,
    pub irq_enables: usize,

    pub cu: Cu,
    pub ru: Ru,
    pub int_stat: u8,
    pub int_mask: u8,
    cmd: u8,
    pointer: u32,
    dump_addr: u32,
    rx_next: u32,
    /// Block the CU is parked on while transmission is held.
    cu_next: Option<u32>,

    /// Park the CU in front of every transmit block until `complete_tx`.
    pub hold_tx: bool,
    /// Report a DMA underrun on the next transmitted frame.
    pub underrun_next: bool,
    /// Leave SCB commands unaccepted.
    pub ignore_commands: bool,

    pub eeprom: [u16; 64],
    ee_phase: EePhase,
    ee_last: u8,
    ee_addr: u32,
    ee_dout: bool,
    mdi: u32,
    pub phy: [u16; 32],

    pub counters: [u32; STATS_COUNTERS],
    pub transmitted: Vec<Vec<u8>>,
    pub configs: Vec<Vec<u8>>,
    pub addresses: Vec<[u8; 6]>,
    pub soft_resets: usize,
    pub ru_starts: usize,
    pub dropped: usize,
}

impl SimNic {
    pub fn new() -> Self {
        let mut eeprom = [0u16; 64];
        for (i, word) in eeprom.iter_mut().enumerate().skip(3) {
            *word = 0x1100 + i as u16;
        }
        for i in 0..3 {
            eeprom[i] = u16::from_le_bytes([STATION[2 * i], STATION[2 * i + 1]]);
        }

        let mut phy = [0u16; 32];
        phy[MII_CTRL as usize] = MII_CTRL_ANE | MII_CTRL_SP_100;
        phy[MII_STATUS as usize] = 0x782d;
        phy[MII_PHYID_H as usize] = 0x02a8;
        phy[MII_PHYID_L as usize] = 0x0154;
        phy[MII_ANA as usize] = 0x01e1;
        phy[MII_ANLPA as usize] = 0x45e1;
        phy[MII_ANE as usize] = 0x0001;
        phy[MII_SCR as usize] = PHY_SCR_100_FD;

        Self {
            regions: Vec::new(),
            next_bus: 0x0010_0000,
            clock: Cell::new(1),
            timer: None,
            irq_enables: 0,
            cu: Cu::Idle,
            ru: Ru::Idle,
            int_stat: 0,
            int_mask: SIM_M,
            cmd: 0,
            pointer: 0,
            dump_addr: 0,
            rx_next: 0,
            cu_next: None,
            hold_tx: false,
            underrun_next: false,
            ignore_commands: false,
            eeprom,
            ee_phase: EePhase::Done,
            ee_last: 0,
            ee_addr: 0,
            ee_dout: true,
            mdi: CM_READY,
            phy,
            counters: [0; STATS_COUNTERS],
            transmitted: Vec::new(),
            configs: Vec::new(),
            addresses: Vec::new(),
            soft_resets: 0,
            ru_starts: 0,
            dropped: 0,
        }
    }

    /// Interrupt line level.
    pub fn irq_asserted(&self) -> bool {
        self.int_stat != 0 && self.int_mask & SIM_M == 0
    }

    pub fn advance(&self, d: Duration) {
        self.clock.set(self.clock.get() + d.as_micros() as u64);
    }

    /// Let the parked CU transmit up to `n` more frames.
    pub fn complete_tx(&mut self, n: usize) {
        if let Some(at) = self.cu_next.take() {
            self.run_cu(at, n);
        }
    }

    /// Deliver a frame into the next receive descriptor.
    ///
    /// Returns `false` if the RU was not ready and the frame was dropped.
    pub fn inject_rx(&mut self, frame: &[u8]) -> bool {
        if self.ru != Ru::Ready {
            self.dropped += 1;
            return false;
        }
        let at = self.rx_next;
        let command = self.read16(at + 2);
        let size = usize::from(self.read16(at + 14));
        assert!(frame.len() <= size, "frame larger than RFD buffer");

        self.write_bytes(at + 16, frame);
        self.write16(at + 12, RFDR_EOF | RFDR_F | frame.len() as u16);
        self.write16(at, (RfdStatus::C | RfdStatus::OK).bits());
        self.int_stat |= IntCause::FR.bits();

        if command & RfdCommand::EL.bits() != 0 {
            self.ru = Ru::NoResources;
            self.int_stat |= IntCause::RNR.bits();
        } else {
            self.rx_next = self.read32(at + 4);
        }
        true
    }

    fn status(&self) -> u8 {
        let cu = match self.cu {
            Cu::Idle => 0x00,
            Cu::Active => 0x80,
        };
        let ru = match self.ru {
            Ru::Idle => 0x00,
            Ru::NoResources => 0x08,
            Ru::Ready => 0x10,
        };
        cu | ru
    }

    fn soft_reset(&mut self) {
        self.cu = Cu::Idle;
        self.ru = Ru::Idle;
        self.int_stat = 0;
        self.int_mask = SIM_M;
        self.cu_next = None;
        self.rx_next = 0;
        self.dump_addr = 0;
        self.soft_resets += 1;
    }

    fn execute(&mut self, byte: u8) {
        match byte & SC_CUC_MASK {
            0 => {}
            c if c == CuCommand::Start as u8 => {
                let budget = if self.hold_tx { 0 } else { usize::MAX };
                self.run_cu(self.pointer, budget);
            }
            c if c == CuCommand::LoadDumpAddress as u8 => self.dump_addr = self.pointer,
            c if c == CuCommand::DumpStatistics as u8 => self.dump_statistics(),
            c if c == CuCommand::LoadBase as u8 => assert_eq!(self.pointer, 0),
            c => panic!("unexpected CU command {:#x}", c),
        }
        match byte & SC_RUC_MASK {
            0 => {}
            r if r == RuCommand::Start as u8 => {
                self.rx_next = self.pointer;
                self.ru = Ru::Ready;
                self.ru_starts += 1;
            }
            r if r == RuCommand::LoadBase as u8 => assert_eq!(self.pointer, 0),
            r => panic!("unexpected RU command {:#x}", r),
        }
    }

    /// Walk the command block chain from `at`, transmitting at most `budget`
    /// frames before parking.
    fn run_cu(&mut self, mut at: u32, mut budget: usize) {
        self.cu = Cu::Active;
        loop {
            let command = CbCommand::from_bits_retain(self.read16(at + 2));
            let opcode = command.bits() & CBC_OPCODE_MASK;
            let mut status = CbStatus::C | CbStatus::OK;

            match opcode {
                o if o == CbCommand::OP_NOP.bits() => {}
                o if o == CbCommand::OP_IAS.bits() => {
                    let mut mac = [0u8; 6];
                    mac.copy_from_slice(&self.read_bytes(at + 8, 6));
                    self.addresses.push(mac);
                }
                o if o == CbCommand::OP_CONFIGURE.bits() => {
                    let bytes = self.read_bytes(at + 8, 22);
                    self.configs.push(bytes);
                }
                o if o == CbCommand::OP_XMIT.bits() => {
                    if budget == 0 {
                        self.cu_next = Some(at);
                        return;
                    }
                    budget -= 1;
                    assert_eq!(self.read32(at + 8), TX_TBDA_NIL);
                    let size = self.read16(at + 12);
                    assert!(size & TXSZ_EOF != 0);
                    let frame = self.read_bytes(at + 16, usize::from(size & 0x3fff));
                    self.transmitted.push(frame);
                    if self.underrun_next {
                        self.underrun_next = false;
                        status |= CbStatus::U;
                    }
                }
                o => panic!("unexpected CB opcode {}", o),
            }

            self.write16(at, status.bits());
            if command.contains(CbCommand::I) {
                self.int_stat |= IntCause::CX.bits();
            }
            if command.contains(CbCommand::EL) {
                self.cu = Cu::Idle;
                self.int_stat |= IntCause::CNA.bits();
                return;
            }
            at = self.read32(at + 4);
        }
    }

    fn dump_statistics(&mut self) {
        let base = self.dump_addr;
        for (i, &value) in self.counters.clone().iter().enumerate() {
            self.write32(base + 4 * i as u32, value);
        }
        self.write32(base + 4 * STATS_COUNTERS as u32, SCM_DSC);
    }

    // ───────────────────────────────────────────────────────────────────────
    // EEPROM
    // ───────────────────────────────────────────────────────────────────────

    fn eeprom_write(&mut self, value: u8) {
        if value & CE_EECS == 0 {
            self.ee_phase = EePhase::Done;
            self.ee_dout = true;
        } else if self.ee_last & CE_EECS == 0 {
            self.ee_phase = EePhase::Prefix(0);
        } else if value & CE_EESK != 0 && self.ee_last & CE_EESK == 0 {
            self.eeprom_clock(value & CE_EEDI != 0);
        }
        self.ee_last = value;
    }

    fn eeprom_clock(&mut self, din: bool) {
        self.ee_phase = match self.ee_phase {
            EePhase::Prefix(n) if n + 1 == EEPROM_PREFIX_LEN => {
                self.ee_addr = 0;
                EePhase::Address(0)
            }
            EePhase::Prefix(n) => EePhase::Prefix(n + 1),
            EePhase::Address(k) => {
                self.ee_addr = (self.ee_addr << 1) | u32::from(din);
                if k + 1 == EEPROM_ADDR_BITS {
                    self.ee_dout = false;
                    EePhase::Data(0)
                } else {
                    EePhase::Address(k + 1)
                }
            }
            EePhase::Data(j) if j < 16 => {
                let word = self.eeprom[self.ee_addr as usize];
                self.ee_dout = word & (1 << (15 - j)) != 0;
                EePhase::Data(j + 1)
            }
            EePhase::Data(_) | EePhase::Done => {
                self.ee_dout = true;
                EePhase::Done
            }
        };
    }

    // ───────────────────────────────────────────────────────────────────────
    // DMA MEMORY
    // ───────────────────────────────────────────────────────────────────────

    fn translate(&self, bus: u32, len: usize) -> *mut u8 {
        for r in &self.regions {
            if bus >= r.bus && (bus - r.bus) as usize + len <= r.len {
                // SAFETY: inside a region the driver mapped and still owns.
                return unsafe { r.ptr.add((bus - r.bus) as usize) };
            }
        }
        panic!("DMA to unmapped bus address {:#x}", bus);
    }

    fn read_bytes(&self, bus: u32, len: usize) -> Vec<u8> {
        let ptr = self.translate(bus, len);
        // SAFETY: see `translate`.
        unsafe { std::slice::from_raw_parts(ptr, len).to_vec() }
    }

    fn write_bytes(&mut self, bus: u32, data: &[u8]) {
        let ptr = self.translate(bus, data.len());
        // SAFETY: see `translate`.
        unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), ptr, data.len()) }
    }

    fn read16(&self, bus: u32) -> u16 {
        let b = self.read_bytes(bus, 2);
        u16::from_le_bytes([b[0], b[1]])
    }

    fn read32(&self, bus: u32) -> u32 {
        let b = self.read_bytes(bus, 4);
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    fn write16(&mut self, bus: u32, value: u16) {
        self.write_bytes(bus, &value.to_le_bytes());
    }

    fn write32(&mut self, bus: u32, value: u32) {
        self.write_bytes(bus, &value.to_le_bytes());
    }
}

impl PortIo for SimNic {
    fn port_read8(&mut self, port: u32) -> u8 {
        match port - IO_BASE {
            SCB_STATUS => self.status(),
            SCB_INT_STAT => self.int_stat,
            SCB_CMD => self.cmd,
            SCB_INT_MASK => self.int_mask,
            CSR_EEPROM => {
                if self.ee_dout {
                    self.ee_last | CE_EEDO
                } else {
                    self.ee_last
                }
            }
            off => panic!("read8 from CSR offset {:#x}", off),
        }
    }

    fn port_read32(&mut self, port: u32) -> u32 {
        match port - IO_BASE {
            SCB_POINTER => self.pointer,
            CSR_PORT => 0,
            CSR_MDI_CTL => self.mdi,
            off => panic!("read32 from CSR offset {:#x}", off),
        }
    }

    fn port_write8(&mut self, port: u32, value: u8) {
        match port - IO_BASE {
            SCB_INT_STAT => self.int_stat &= !value,
            SCB_CMD => {
                self.cmd = value;
                if !self.ignore_commands {
                    self.execute(value);
                    self.cmd = 0;
                }
            }
            SCB_INT_MASK => {
                if value & SIM_SI != 0 {
                    self.int_stat |= IntCause::SWI.bits();
                }
                self.int_mask = value & !SIM_SI;
            }
            CSR_EEPROM => self.eeprom_write(value),
            off => panic!("write8 to CSR offset {:#x}", off),
        }
    }

    fn port_write32(&mut self, port: u32, value: u32) {
        match port - IO_BASE {
            SCB_POINTER => self.pointer = value,
            CSR_PORT => {
                assert_eq!(value, CP_SOFTWARE_RESET);
                self.soft_reset();
            }
            CSR_MDI_CTL => {
                assert!(value & CM_READ != 0);
                assert_eq!((value >> CM_PHYADDR_SHIFT) & 0x1f, CM_PHYADDR);
                let reg = ((value >> CM_REG_SHIFT) & 0x1f) as usize;
                self.mdi = CM_READY | u32::from(self.phy[reg]);
            }
            off => panic!("write32 to CSR offset {:#x}", off),
        }
    }
}

impl BusMapper for SimNic {
    fn map_to_bus_address(&mut self, virt: *const u8, len: usize) -> Option<u64> {
        let bus = self.next_bus;
        self.regions.push(Region {
            bus,
            ptr: virt as *mut u8,
            len,
        });
        self.next_bus += ((len as u32) + 0x1f) & !0xf;
        Some(u64::from(bus))
    }
}

impl Clock for SimNic {
    fn now(&self) -> Tick {
        let t = self.clock.get() + 1;
        self.clock.set(t);
        Tick(t)
    }

    fn micro_delay(&mut self, us: u32) {
        self.clock.set(self.clock.get() + u64::from(us));
    }
}

impl Platform for SimNic {
    fn set_timer(&mut self, deadline: Tick) {
        self.timer = Some(deadline);
    }

    fn irq_enable(&mut self, irq: u8) {
        assert_eq!(irq, IRQ);
        self.irq_enables += 1;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PCI
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
pub struct SimFunction {
    pub addr: PciAddr,
    pub vendor: u16,
    pub device: u16,
    pub revision: u8,
    pub bar2: u32,
    pub irq: u8,
}

impl SimFunction {
    /// An 82559 at the usual slot.
    pub fn fxp() -> Self {
        Self {
            addr: NIC_ADDR,
            vendor: 0x8086,
            device: 0x1229,
            revision: 0x08,
            bar2: IO_BASE | 0x1,
            irq: IRQ,
        }
    }
}

pub struct SimPci {
    pub functions: Vec<SimFunction>,
    pub reserved: Vec<PciAddr>,
}

impl SimPci {
    pub fn new() -> Self {
        Self::with(vec![SimFunction::fxp()])
    }

    pub fn with(functions: Vec<SimFunction>) -> Self {
        Self {
            functions,
            reserved: Vec::new(),
        }
    }

    fn function(&self, addr: PciAddr) -> &SimFunction {
        self.functions
            .iter()
            .find(|f| f.addr == addr)
            .expect("config read from absent function")
    }
}

impl PciBus for SimPci {
    fn functions(&mut self) -> Vec<PciAddr> {
        self.functions.iter().map(|f| f.addr).collect()
    }

    fn config_read8(&mut self, addr: PciAddr, offset: u8) -> u8 {
        let f = self.function(addr);
        match offset {
            PCI_REVISION_ID => f.revision,
            PCI_INTERRUPT_LINE => f.irq,
            _ => panic!("config read8 at {:#x}", offset),
        }
    }

    fn config_read16(&mut self, addr: PciAddr, offset: u8) -> u16 {
        let f = self.function(addr);
        match offset {
            PCI_VENDOR_ID => f.vendor,
            PCI_DEVICE_ID => f.device,
            _ => panic!("config read16 at {:#x}", offset),
        }
    }

    fn config_read32(&mut self, addr: PciAddr, offset: u8) -> u32 {
        let f = self.function(addr);
        match offset {
            PCI_BAR_2 => f.bar2,
            _ => panic!("config read32 at {:#x}", offset),
        }
    }

    fn reserve(&mut self, addr: PciAddr) {
        self.reserved.push(addr);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// Probe with `config` and bring the device up in broadcast mode.
pub fn bring_up_with(config: FxpConfig) -> FxpDevice<SimNic> {
    let mut dev = FxpDevice::probe(SimNic::new(), &mut SimPci::new(), config)
        .expect("probe should succeed");
    dev.configure(ReceiveMode::BROADCAST)
        .expect("configure should succeed");
    service(&mut dev);
    dev
}

pub fn bring_up() -> FxpDevice<SimNic> {
    bring_up_with(FxpConfig::default())
}

/// Run the interrupt path until the simulated line drops.
pub fn service(dev: &mut FxpDevice<SimNic>) {
    for _ in 0..16 {
        if !dev.platform().irq_asserted() {
            return;
        }
        dev.handle_interrupt();
    }
    panic!("interrupt line stuck");
}

/// Advance the clock one watchdog period and fire the timer.
pub fn tick(dev: &mut FxpDevice<SimNic>) {
    let period = dev.watchdog().period();
    dev.platform().advance(period);
    dev.expire_timers();
    service(dev);
}

/// A broadcast IPv4 frame of `len` bytes filled with `tag`.
pub fn frame(tag: u8, len: usize) -> Vec<u8> {
    let mut f = vec![tag; len];
    f[..6].copy_from_slice(&[0xff; 6]);
    f[6..12].copy_from_slice(&STATION);
    f[12..14].copy_from_slice(&[0x08, 0x00]);
    f
}
