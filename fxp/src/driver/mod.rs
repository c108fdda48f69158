//! Device drivers.
//!
//! Only the Intel 8255x family for now.

pub mod fxp;
