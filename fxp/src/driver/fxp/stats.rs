//! Statistics counters.

use super::desc::StatsDump;

// Index of each standard counter in the dump area.
const TX_GOOD: usize = 0;
const TX_MAXCOL: usize = 1;
const TX_LATECOL: usize = 2;
const TX_UNDERRUN: usize = 3;
const TX_LOST_CRS: usize = 4;
const TX_DEFERRED: usize = 5;
// 6 and 7: single and multiple collisions, included in the total.
const TX_TOTAL_COLLISIONS: usize = 8;
const RX_GOOD: usize = 9;
const RX_CRC: usize = 10;
const RX_ALIGN: usize = 11;
const RX_RESOURCE: usize = 12;
const RX_OVERRUN: usize = 13;
const RX_COLLISION_DETECT: usize = 14;
const RX_SHORT: usize = 15;

/// Interface counters in the form clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// All damaged or dropped receive frames.
    pub recv_errors: u32,
    /// Frames that could not be sent.
    pub send_errors: u32,
    /// Receive FIFO overruns.
    pub overwrites: u32,
    pub crc_errors: u32,
    pub frame_alignment_errors: u32,
    /// Frames dropped for lack of a receive descriptor.
    pub missed_packets: u32,
    pub packets_received: u32,
    pub packets_sent: u32,
    pub transmits_deferred: u32,
    pub collisions: u32,
    /// Transmits aborted after too many collisions.
    pub transmits_aborted: u32,
    pub carrier_lost: u32,
    pub fifo_underruns: u32,
    pub fifo_overruns: u32,
    /// Not reported by the 8255x.
    pub cd_heartbeat: u32,
    pub out_of_window_collisions: u32,
}

impl CounterSnapshot {
    /// Translate a completed dump.
    pub fn from_dump(dump: &StatsDump) -> Self {
        let c = |index: usize| dump.counter(index);
        let rx_crc = c(RX_CRC);
        let rx_align = c(RX_ALIGN);
        let rx_resource = c(RX_RESOURCE);
        let rx_overrun = c(RX_OVERRUN);
        let tx_maxcol = c(TX_MAXCOL);
        let tx_latecol = c(TX_LATECOL);
        let tx_crs = c(TX_LOST_CRS);

        Self {
            recv_errors: rx_crc
                .wrapping_add(rx_align)
                .wrapping_add(rx_resource)
                .wrapping_add(rx_overrun)
                .wrapping_add(c(RX_COLLISION_DETECT))
                .wrapping_add(c(RX_SHORT)),
            send_errors: tx_maxcol.wrapping_add(tx_latecol).wrapping_add(tx_crs),
            overwrites: rx_overrun,
            crc_errors: rx_crc,
            frame_alignment_errors: rx_align,
            missed_packets: rx_resource,
            packets_received: c(RX_GOOD),
            packets_sent: c(TX_GOOD),
            transmits_deferred: c(TX_DEFERRED),
            collisions: c(TX_TOTAL_COLLISIONS),
            transmits_aborted: tx_maxcol,
            carrier_lost: tx_crs,
            fifo_underruns: c(TX_UNDERRUN),
            fifo_overruns: rx_overrun,
            cd_heartbeat: 0,
            out_of_window_collisions: tx_latecol,
        }
    }
}
