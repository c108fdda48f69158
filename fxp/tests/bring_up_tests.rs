//! Probe, configure and stop

mod common;

use common::{bring_up, bring_up_with, service, Cu, Ru, SimFunction, SimNic, SimPci, NIC_ADDR, STATION};
use morpheus_fxp::pci::PciAddr;
use morpheus_fxp::{EthernetAddress, FxpConfig, FxpDevice, FxpError, ReceiveMode, RxRequest, TxRequest};

// Configure byte 15: promiscuous and broadcast-disable bits.
const B15_PM: u8 = 0x01;
const B15_BD: u8 = 0x02;

#[test]
fn test_probe_reserves_device_without_touching_hardware() {
    let mut pci = SimPci::new();
    let dev = FxpDevice::probe(SimNic::new(), &mut pci, FxpConfig::default())
        .expect("probe should succeed");

    assert_eq!(pci.reserved, vec![NIC_ADDR]);
    assert_eq!(dev.pci().io_base, common::IO_BASE);
    assert_eq!(dev.pci().irq, common::IRQ);
    assert!(!dev.is_enabled());
    assert!(dev.address().is_none());
    assert_eq!(dev.platform().soft_resets, 0);
}

#[test]
fn test_configure_brings_up_hardware() {
    let mut dev = FxpDevice::probe(SimNic::new(), &mut SimPci::new(), FxpConfig::default())
        .expect("probe should succeed");
    let mac = dev.configure(ReceiveMode::BROADCAST).expect("configure should succeed");

    assert_eq!(mac, EthernetAddress(STATION));
    assert_eq!(dev.address(), Some(mac));
    assert!(dev.is_enabled());

    let nic = dev.platform();
    assert_eq!(nic.soft_resets, 1);
    assert_eq!(nic.addresses, vec![STATION]);
    // Once during bring-up, once for the receive mode.
    assert_eq!(nic.configs.len(), 2);
    assert_eq!(nic.configs[1][0], 22);
    assert_eq!(nic.configs[1][15] & (B15_PM | B15_BD), 0);
    assert_eq!(nic.cu, Cu::Idle);
    assert_eq!(nic.ru, Ru::Ready);
    assert!(nic.timer.is_some());
    assert!(nic.irq_enables >= 1);
}

#[test]
fn test_link_reported_at_bring_up() {
    let dev = bring_up();
    let link = dev.link_status().expect("link should be reported");
    assert!(link.up);
    assert_eq!(link.to_string(), "link up, 100 Mbps, full duplex");
}

#[test]
fn test_reconfigure_does_not_reset() {
    let mut dev = bring_up();
    dev.configure(ReceiveMode::PROMISCUOUS).expect("configure should succeed");
    assert_eq!(dev.receive_mode(), ReceiveMode::PROMISCUOUS);

    let nic = dev.platform();
    assert_eq!(nic.soft_resets, 1);
    assert_eq!(nic.configs.len(), 3);
    assert_eq!(nic.configs[2][15] & B15_PM, B15_PM);
}

#[test]
fn test_empty_mode_disables_broadcast() {
    let mut dev = bring_up();
    dev.configure(ReceiveMode::empty()).expect("configure should succeed");
    let last = dev.platform().configs.last().cloned().unwrap_or_default();
    assert_eq!(last[15] & B15_BD, B15_BD);
}

#[test]
fn test_mac_override() {
    let addr = EthernetAddress([0x02, 0, 0, 0, 0, 0x01]);
    let config = FxpConfig {
        mac_override: Some(addr),
        ..FxpConfig::default()
    };
    let dev = bring_up_with(config);
    assert_eq!(dev.address(), Some(addr));
    assert_eq!(dev.platform().addresses, vec![addr.0]);
}

#[test]
fn test_requests_before_configure_rejected() {
    let mut dev = FxpDevice::probe(SimNic::new(), &mut SimPci::new(), FxpConfig::default())
        .expect("probe should succeed");
    assert_eq!(
        dev.transmit(TxRequest::new(1, common::frame(0, 60))),
        Err(FxpError::NotConfigured)
    );
    assert_eq!(dev.receive(RxRequest::new(1, 1518)), Err(FxpError::NotConfigured));
    assert_eq!(dev.get_statistics(), Err(FxpError::NotConfigured));
}

#[test]
fn test_stop_then_reconfigure() {
    let mut dev = bring_up();
    dev.stop();
    assert!(!dev.is_enabled());
    assert_eq!(dev.platform().soft_resets, 2);
    assert_eq!(
        dev.transmit(TxRequest::new(1, common::frame(0, 60))),
        Err(FxpError::NotConfigured)
    );

    let mac = dev.configure(ReceiveMode::BROADCAST).expect("configure should succeed");
    service(&mut dev);
    assert_eq!(mac, EthernetAddress(STATION));
    assert_eq!(dev.platform().soft_resets, 3);
    assert_eq!(dev.platform().addresses, vec![STATION, STATION]);
}

// ═══════════════════════════════════════════════════════════════════════════
// PROBE FAILURES
// ═══════════════════════════════════════════════════════════════════════════

fn probe(pci: &mut SimPci, config: FxpConfig) -> Option<FxpError> {
    FxpDevice::probe(SimNic::new(), pci, config).err()
}

#[test]
fn test_probe_disabled() {
    let config = FxpConfig {
        disabled: true,
        ..FxpConfig::default()
    };
    assert_eq!(probe(&mut SimPci::new(), config), Some(FxpError::Disabled));
}

#[test]
fn test_probe_empty_bus() {
    let mut pci = SimPci::with(Vec::new());
    assert_eq!(probe(&mut pci, FxpConfig::default()), Some(FxpError::NotFound));
}

#[test]
fn test_probe_wrong_device_at_fixed_location() {
    let addr = PciAddr::new(0, 5, 0);
    let mut pci = SimPci::with(vec![
        SimFunction::fxp(),
        SimFunction {
            addr,
            device: 0x100e,
            ..SimFunction::fxp()
        },
    ]);
    let config = FxpConfig {
        pci_location: Some(addr),
        ..FxpConfig::default()
    };
    assert_eq!(
        probe(&mut pci, config),
        Some(FxpError::WrongDevice {
            addr,
            vendor: 0x8086,
            device: 0x100e
        })
    );
    assert!(pci.reserved.is_empty());
}

#[test]
fn test_probe_skips_foreign_functions() {
    let mut pci = SimPci::with(vec![
        SimFunction {
            addr: PciAddr::new(0, 2, 0),
            vendor: 0x10ec,
            device: 0x8139,
            ..SimFunction::fxp()
        },
        SimFunction::fxp(),
    ]);
    assert_eq!(probe(&mut pci, FxpConfig::default()), None);
    assert_eq!(pci.reserved, vec![NIC_ADDR]);
}

#[test]
fn test_probe_unsupported_revision() {
    let mut pci = SimPci::with(vec![SimFunction {
        revision: 0x02,
        ..SimFunction::fxp()
    }]);
    assert_eq!(
        probe(&mut pci, FxpConfig::default()),
        Some(FxpError::UnsupportedRevision(0x02))
    );
    assert!(pci.reserved.is_empty());
}

#[test]
fn test_probe_rejects_bad_ring_size() {
    let config = FxpConfig {
        tx_ring_size: 1,
        ..FxpConfig::default()
    };
    assert!(matches!(
        probe(&mut SimPci::new(), config),
        Some(FxpError::InvalidConfig(_))
    ));
}
