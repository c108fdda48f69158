//! Hardware wait bounds.
//!
//! Every bounded poll in the driver uses one of these. Exceeding any of
//! them means the controller stopped responding and is fatal.
//!
//! # Reference
//! Intel 8255x Open Source Software Developer Manual, §6 (SCB) and §6.4
//! (action commands)

use core::time::Duration;

/// SCB command byte must read back as NOP after a CU command.
pub const CU_ACCEPT: Duration = Duration::from_millis(1);

/// SCB command byte must read back as NOP after an RU command.
pub const RU_ACCEPT: Duration = Duration::from_millis(1);

/// Configure action command completion.
pub const CONFIGURE: Duration = Duration::from_millis(100);

/// Individual address setup completion.
pub const IA_SETUP: Duration = Duration::from_millis(1);

/// Statistics dump completion word.
pub const DUMP_STATISTICS: Duration = Duration::from_secs(1);

/// MDI control register ready bit.
pub const MDI_READY: Duration = Duration::from_millis(100);

/// Settle time after a PORT software reset.
pub const SOFT_RESET_US: u32 = 10;

/// Default watchdog period.
pub const WATCHDOG_PERIOD: Duration = Duration::from_secs(1);
