//! Receive and transmit descriptor rings.
//!
//! Both rings are fixed arenas of descriptors linked into a circle through
//! their bus addresses, which are translated once at construction and
//! cached per slot. The rings only move descriptors between driver and
//! hardware ownership; issuing SCB commands is left to the caller.
//!
//! # Ownership
//!
//! RX: every descriptor belongs to the hardware except the one at `head`
//! once its C bit is set. Exactly one descriptor carries EL.
//!
//! TX: while not idle, the active chain runs from `tail` to `head` and only
//! `head` carries EL. When idle the hardware holds nothing.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{fence, Ordering};

use super::desc::{RxDescriptor, TxDescriptor};
use super::regs::{
    CbCommand, CbStatus, RfdCommand, RfdStatus, MAX_TAGGED_FRAME, MIN_FRAME, RFDR_EOF, RFDR_F,
    TXTT_MAX, TXTT_MIN,
};
use crate::platform::{map_object, BusAddress, BusMapper};

/// Result of inspecting the RX head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxPoll {
    /// Head descriptor still owned by hardware.
    NotReady,
    /// Head holds a complete frame of this many bytes.
    Ready(usize),
}

/// Result of handing a frame to the TX ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxAppend {
    /// Ring was idle; the new chain starts here and the CU must be started.
    Started(BusAddress),
    /// Frame was linked behind the previous head.
    Linked,
    /// No free slot.
    RingFull,
}

#[inline]
fn next(index: usize, len: usize) -> usize {
    (index + 1) % len
}

#[inline]
fn prev(index: usize, len: usize) -> usize {
    (index + len - 1) % len
}

fn map_slots<M, D>(mapper: &mut M, descs: &[D]) -> Vec<BusAddress>
where
    M: BusMapper + ?Sized,
{
    descs.iter().map(|d| map_object(mapper, d)).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// RX RING
// ═══════════════════════════════════════════════════════════════════════════

/// Receive frame descriptor ring.
pub struct RxRing {
    descs: Box<[RxDescriptor]>,
    bus: Vec<BusAddress>,
    /// Next descriptor to inspect.
    head: usize,
}

impl RxRing {
    /// Allocate, map and initialize a ring of `size` descriptors.
    pub fn new<M: BusMapper + ?Sized>(size: usize, mapper: &mut M) -> Self {
        assert!(size >= 2, "BUG: RX ring needs at least two descriptors");
        let descs: Box<[RxDescriptor]> = (0..size).map(|_| RxDescriptor::new()).collect();
        let bus = map_slots(mapper, &descs);
        let mut ring = Self { descs, bus, head: 0 };
        ring.reinit();
        ring
    }

    /// Bus address of the first descriptor, for RU START.
    pub fn base(&self) -> BusAddress {
        self.bus[0]
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Reset every descriptor in place and rewind to slot 0.
    ///
    /// Only the last descriptor carries EL.
    pub fn reinit(&mut self) {
        let n = self.descs.len();
        for i in 0..n {
            let link = self.bus[next(i, n)].as_u32();
            let cmd = if i == n - 1 { RfdCommand::EL } else { RfdCommand::empty() };
            let desc = &mut self.descs[i];
            desc.set_link(link);
            desc.reset(cmd);
        }
        self.head = 0;
        fence(Ordering::Release);
    }

    /// Whether the head descriptor has been completed by hardware.
    pub fn head_complete(&self) -> bool {
        self.descs[self.head].status().contains(RfdStatus::C)
    }

    /// Inspect the head descriptor.
    ///
    /// A completed descriptor must report OK, no error bits, and a final
    /// byte count; anything else is a fatal hardware fault.
    pub fn poll(&self) -> RxPoll {
        let desc = &self.descs[self.head];
        let status = desc.status();
        if !status.contains(RfdStatus::C) {
            return RxPoll::NotReady;
        }
        fence(Ordering::Acquire);

        if !status.contains(RfdStatus::OK) || status.intersects(RfdStatus::ERRORS) {
            fatal!("fxp: receive error, RFD status {:#06x}", status.bits());
        }
        let count = desc.raw_count();
        if count & (RFDR_EOF | RFDR_F) != RFDR_EOF | RFDR_F {
            fatal!("fxp: RFD count not final: {:#06x}", count);
        }
        RxPoll::Ready(desc.received_length())
    }

    /// Frame bytes of the completed head descriptor.
    pub fn frame(&self, len: usize) -> &[u8] {
        self.descs[self.head].frame(len)
    }

    /// Give the head descriptor back to hardware as the new end of list.
    pub fn recycle(&mut self) {
        let n = self.descs.len();
        let index = self.head;
        self.descs[index].reset(RfdCommand::EL);
        fence(Ordering::Release);

        let p = prev(index, n);
        let prev_cmd = self.descs[p].command();
        if !prev_cmd.contains(RfdCommand::EL) {
            fatal!("fxp: RFD {} lost its EL bit ({:#06x})", p, prev_cmd.bits());
        }
        self.descs[p].set_command(prev_cmd - RfdCommand::EL);

        self.head = next(index, n);
    }

    #[cfg(test)]
    pub(crate) fn desc_mut(&mut self, index: usize) -> &mut RxDescriptor {
        &mut self.descs[index]
    }

    #[cfg(test)]
    pub(crate) fn end_of_list_count(&self) -> usize {
        self.descs.iter().filter(|d| d.command().contains(RfdCommand::EL)).count()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TX RING
// ═══════════════════════════════════════════════════════════════════════════

/// Transmit command block ring.
pub struct TxRing {
    descs: Box<[TxDescriptor]>,
    bus: Vec<BusAddress>,
    /// Last block appended.
    head: usize,
    /// Oldest block not yet retired.
    tail: usize,
    /// Hardware holds no chain.
    idle: bool,
    /// Underrun retry threshold for new blocks.
    threshold: u8,
}

impl TxRing {
    pub fn new<M: BusMapper + ?Sized>(size: usize, mapper: &mut M) -> Self {
        assert!(size >= 2, "BUG: TX ring needs at least two blocks");
        let descs: Box<[TxDescriptor]> = (0..size).map(|_| TxDescriptor::new()).collect();
        let bus = map_slots(mapper, &descs);
        let mut ring = Self {
            descs,
            bus,
            head: 0,
            tail: 0,
            idle: true,
            threshold: TXTT_MIN,
        };
        ring.reinit();
        ring
    }

    /// Park every block as an EL NOP and mark the ring idle.
    ///
    /// The underrun threshold survives; it describes the bus, not the chain.
    pub fn reinit(&mut self) {
        let n = self.descs.len();
        for i in 0..n {
            let link = self.bus[next(i, n)].as_u32();
            let desc = &mut self.descs[i];
            desc.set_link(link);
            desc.reset(self.threshold);
        }
        self.head = 0;
        self.tail = 0;
        self.idle = true;
        fence(Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Whether `append` would find a free slot.
    pub fn has_room(&self) -> bool {
        self.idle || next(self.head, self.descs.len()) != self.tail
    }

    /// Bus address of the oldest unretired block, where a stalled CU resumes.
    pub fn tail_bus(&self) -> BusAddress {
        self.bus[self.tail]
    }

    /// Queue `frame` for transmission.
    ///
    /// # Returns
    /// * `Started` - ring was idle, caller must CU START at the returned address
    /// * `Linked` - appended to the running chain
    /// * `RingFull` - nothing was written
    pub fn append(&mut self, frame: &[u8]) -> TxAppend {
        if frame.len() < MIN_FRAME || frame.len() > MAX_TAGGED_FRAME {
            fatal!("fxp: bad frame size {}", frame.len());
        }
        let n = self.descs.len();

        if self.idle {
            self.descs[0].load(frame, self.threshold);
            fence(Ordering::Release);
            self.idle = false;
            self.head = 0;
            self.tail = 0;
            return TxAppend::Started(self.bus[0]);
        }

        let slot = next(self.head, n);
        if slot == self.tail {
            return TxAppend::RingFull;
        }

        self.descs[slot].load(frame, self.threshold);
        fence(Ordering::Release);

        let p = self.head;
        let prev_cmd = self.descs[p].command();
        if prev_cmd != CbCommand::EL | CbCommand::OP_XMIT {
            fatal!("fxp: TX block {} has command {:#06x}, expected EL|XMIT", p, prev_cmd.bits());
        }
        self.descs[p].set_command(CbCommand::OP_XMIT);
        self.head = slot;
        TxAppend::Linked
    }

    /// Retire completed blocks from `tail`.
    ///
    /// Stops at the first incomplete block or after the EL block, in which
    /// case the ring becomes idle.
    ///
    /// # Returns
    /// Number of blocks retired.
    pub fn drain(&mut self) -> usize {
        if self.idle {
            return 0;
        }
        let n = self.descs.len();
        let mut retired = 0;
        let mut t = self.tail;

        loop {
            let status = self.descs[t].status();
            if !status.contains(CbStatus::C) {
                break;
            }
            fence(Ordering::Acquire);
            retired += 1;

            if !status.contains(CbStatus::OK) {
                fatal!("fxp: transmit failed, CB status {:#06x}", status.bits());
            }
            if status.contains(CbStatus::U) && self.threshold < TXTT_MAX {
                self.threshold += 1;
                log::warn!("fxp: transmit underrun, threshold now {:#x}", self.threshold);
            }
            if self.descs[t].command().contains(CbCommand::EL) {
                self.idle = true;
                break;
            }
            t = next(t, n);
        }

        if retired > 0 {
            self.tail = t;
        }
        retired
    }

    #[cfg(test)]
    pub(crate) fn desc_mut(&mut self, index: usize) -> &mut TxDescriptor {
        &mut self.descs[index]
    }

    /// EL count over the active chain, `tail..=head`.
    #[cfg(test)]
    pub(crate) fn chain_end_of_list_count(&self) -> usize {
        if self.idle {
            return 0;
        }
        let n = self.descs.len();
        let mut i = self.tail;
        let mut count = 0;
        loop {
            if self.descs[i].command().contains(CbCommand::EL) {
                count += 1;
            }
            if i == self.head {
                return count;
            }
            i = next(i, n);
        }
    }
}
