//! Platform seams.
//!
//! Everything the driver needs from its host is expressed here: raw port
//! I/O, translation of driver memory to device-visible bus addresses, a
//! monotonic clock with short delays, a one-shot timer, the interrupt line
//! and PCI configuration space. A bare-metal host backs these with `in`/`out`
//! instructions and its DMA allocator; tests back them with a simulated NIC.

use crate::pci::PciAddr;
use crate::time::Tick;

/// Device-visible address of a DMA region.
///
/// 8255x bus masters use 32-bit addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BusAddress(pub u32);

impl BusAddress {
    /// Raw value for SCB pointer and descriptor link fields.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HARDWARE ACCESS
// ═══════════════════════════════════════════════════════════════════════════

/// I/O-space register access.
pub trait PortIo {
    fn port_read8(&mut self, port: u32) -> u8;
    fn port_read32(&mut self, port: u32) -> u32;
    fn port_write8(&mut self, port: u32, value: u8);
    fn port_write32(&mut self, port: u32, value: u32);
}

/// Virtual-to-bus address translation.
pub trait BusMapper {
    /// Translate a driver-owned region to the address the device must use.
    ///
    /// Returns `None` when the region cannot be made visible to the device.
    fn map_to_bus_address(&mut self, virt: *const u8, len: usize) -> Option<u64>;
}

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Tick;

    /// Busy-wait for at least `us` microseconds.
    fn micro_delay(&mut self, us: u32);
}

/// Complete host environment for one controller.
pub trait Platform: PortIo + BusMapper + Clock {
    /// Arm the one-shot driver timer. Expiry is reported back through
    /// [`FxpDevice::expire_timers`](crate::FxpDevice::expire_timers).
    fn set_timer(&mut self, deadline: Tick);

    /// Re-enable delivery of `irq` after a hard interrupt was handled.
    fn irq_enable(&mut self, irq: u8);
}

// ═══════════════════════════════════════════════════════════════════════════
// PCI
// ═══════════════════════════════════════════════════════════════════════════

/// PCI configuration space access.
pub trait PciBus {
    /// Functions present on the bus, in enumeration order.
    fn functions(&mut self) -> alloc::vec::Vec<PciAddr>;

    fn config_read8(&mut self, addr: PciAddr, offset: u8) -> u8;
    fn config_read16(&mut self, addr: PciAddr, offset: u8) -> u16;
    fn config_read32(&mut self, addr: PciAddr, offset: u8) -> u32;

    /// Claim a function so no other driver binds to it.
    fn reserve(&mut self, addr: PciAddr);
}

/// Map a driver-owned object and return its 32-bit bus address.
///
/// Translation failure or an address beyond the 32-bit DMA window is fatal.
pub fn map_object<M: BusMapper + ?Sized, T>(mapper: &mut M, object: &T) -> BusAddress {
    let virt = object as *const T as *const u8;
    let len = core::mem::size_of::<T>();
    let bus = match mapper.map_to_bus_address(virt, len) {
        Some(bus) => bus,
        None => fatal!("fxp: cannot map {} bytes at {:p} for DMA", len, virt),
    };
    match bus.checked_add(len as u64) {
        Some(end) if end <= 1 << 32 => {}
        _ => fatal!("fxp: bus address {:#x} outside 32-bit DMA window", bus),
    }
    BusAddress(bus as u32)
}
