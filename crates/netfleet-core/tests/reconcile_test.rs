mod mock_netbox;

use mock_netbox::MockNetBox;
use netfleet_core::model::{
    Device, DeviceFacts, Interface, LldpNeighbor, NeighborIdKind, PortType, SwitchportMode,
};
use netfleet_core::netbox::{ReconcileInput, Reconciler, SyncOptions};
use netfleet_core::RunContext;
use std::collections::BTreeSet;
use std::sync::Arc;

fn facts(host: &str, hostname: &str) -> DeviceFacts {
    DeviceFacts {
        host: host.to_string(),
        hostname: hostname.to_string(),
        platform: "cisco_ios".to_string(),
        vendor: "cisco".to_string(),
        nb_platform: "cisco-ios".to_string(),
        model: Some("WS-C2960X-48TS-L".to_string()),
        serial: Some("FOC1".to_string()),
        version: Some("15.2(4)E10".to_string()),
        uptime: None,
    }
}

fn interface(host: &str, name: &str, port_type: PortType) -> Interface {
    Interface {
        device: host.to_string(),
        name: name.to_string(),
        short_name: name.to_string(),
        enabled: true,
        description: None,
        mac: None,
        mtu: None,
        speed: None,
        ip4: None,
        ip6: None,
        nb_type: port_type.nb_type(None).to_string(),
        port_type,
        mode: SwitchportMode::Unset,
        untagged_vlan: None,
        tagged_vlans: BTreeSet::new(),
        lag_parent: None,
    }
}

fn base_input(host: &str, hostname: &str) -> ReconcileInput {
    ReconcileInput {
        devices: vec![Device::new(host, "cisco_ios")],
        facts: vec![facts(host, hostname)],
        interfaces: Vec::new(),
        neighbors: Vec::new(),
        inventory: Vec::new(),
        options: SyncOptions::default().sync_all(),
    }
}

#[tokio::test]
async fn dry_run_on_fresh_netbox_plans_everything_and_writes_nothing() {
    let api = Arc::new(MockNetBox::new());
    let mut input = base_input("10.0.0.1", "core-sw-01");
    input.interfaces = vec![
        interface("10.0.0.1", "GigabitEthernet0/1", PortType::AccessCopper),
        interface("10.0.0.1", "GigabitEthernet0/2", PortType::AccessCopper),
        {
            let mut svi = interface("10.0.0.1", "Vlan10", PortType::Virtual);
            svi.ip4 = Some("10.0.0.1/24".to_string());
            svi
        },
    ];

    let ctx = RunContext::new(true, "/tmp/netfleet-test");
    let reconciler = Reconciler::new(api.clone());
    let report = reconciler.run(&input, &ctx).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.phases["devices"].created, 1);
    assert_eq!(report.phases["interfaces"].created, 3);
    assert_eq!(report.phases["ip-addresses"].created, 1);
    assert_eq!(report.phases["vlans"].created, 1);

    // The whole point of dry-run: zero mutating calls
    assert_eq!(api.writes(), 0);
}

#[tokio::test]
async fn real_run_applies_and_second_run_is_a_noop() {
    let api = Arc::new(MockNetBox::new());
    let mut input = base_input("10.0.0.1", "core-sw-01");
    input.interfaces = vec![
        interface("10.0.0.1", "GigabitEthernet0/1", PortType::AccessCopper),
        {
            let mut svi = interface("10.0.0.1", "Vlan10", PortType::Virtual);
            svi.ip4 = Some("10.0.0.1/24".to_string());
            svi
        },
    ];

    let reconciler = Reconciler::new(api.clone());
    let ctx = RunContext::new(false, "/tmp/netfleet-test");
    let first = reconciler.run(&input, &ctx).await.unwrap();
    assert_eq!(first.phases["devices"].created, 1);
    assert_eq!(first.phases["interfaces"].created, 2);
    assert!(api.writes() > 0);

    // Applying the plan converged the target: a re-run changes nothing
    let ctx2 = RunContext::new(false, "/tmp/netfleet-test");
    let second = reconciler.run(&input, &ctx2).await.unwrap();
    for (phase, totals) in &second.phases {
        assert_eq!(totals.created, 0, "phase {} created records on re-run", phase);
        assert_eq!(totals.updated, 0, "phase {} updated records on re-run", phase);
        assert_eq!(totals.failed, 0, "phase {} failed on re-run", phase);
    }
}

#[tokio::test]
async fn lag_parent_is_created_before_its_members() {
    let api = Arc::new(MockNetBox::new());
    let mut input = base_input("10.0.0.2", "edge-sw-9");

    // Member listed before the LAG on purpose: pass ordering is semantic,
    // not positional
    let mut member = interface("10.0.0.2", "TFGigabitEthernet0/1", PortType::SfpPlus);
    member.lag_parent = Some("Ag10".to_string());
    let lag = interface("10.0.0.2", "AggregatePort10", PortType::Lag);
    input.interfaces = vec![member, lag];

    let reconciler = Reconciler::new(api.clone());
    let ctx = RunContext::new(false, "/tmp/netfleet-test");
    let report = reconciler.run(&input, &ctx).await.unwrap();
    assert_eq!(report.phases["interfaces"].created, 2);

    let interfaces = api.interfaces.lock().clone();
    let created_member = interfaces
        .iter()
        .find(|i| i.name == "TFGigabitEthernet0/1")
        .expect("member must be created");
    // "Ag10" resolved through the alias map to the canonical LAG name
    assert_eq!(created_member.lag.as_deref(), Some("AggregatePort10"));
    assert!(interfaces.iter().any(|i| i.name == "AggregatePort10" && i.if_type == "lag"));
}

#[tokio::test]
async fn missing_lag_parent_still_writes_the_member() {
    let api = Arc::new(MockNetBox::new());
    let mut input = base_input("10.0.0.3", "sw3");
    let mut member = interface("10.0.0.3", "GigabitEthernet0/1", PortType::AccessCopper);
    member.lag_parent = Some("Port-channel9".to_string());
    input.interfaces = vec![member];

    let reconciler = Reconciler::new(api.clone());
    let ctx = RunContext::new(false, "/tmp/netfleet-test");
    let report = reconciler.run(&input, &ctx).await.unwrap();

    // Applied without the parent link, not silently skipped
    assert_eq!(report.phases["interfaces"].created, 1);
    let interfaces = api.interfaces.lock().clone();
    let created = interfaces
        .iter()
        .find(|i| i.name == "GigabitEthernet0/1")
        .unwrap();
    assert_eq!(created.lag, None);
}

#[tokio::test]
async fn mutual_lldp_observations_plan_exactly_one_cable() {
    let api = Arc::new(MockNetBox::new());
    api.seed_device("sw1", &["GigabitEthernet0/1"]);
    api.seed_device("sw2", &["GigabitEthernet0/2"]);

    let mut input = ReconcileInput {
        devices: vec![
            Device::new("10.0.0.1", "cisco_ios"),
            Device::new("10.0.0.2", "cisco_ios"),
        ],
        facts: vec![facts("10.0.0.1", "sw1"), facts("10.0.0.2", "sw2")],
        interfaces: Vec::new(),
        neighbors: vec![
            LldpNeighbor {
                local_device: "10.0.0.1".to_string(),
                local_interface: "GigabitEthernet0/1".to_string(),
                remote_name: "sw2".to_string(),
                remote_interface: "GigabitEthernet0/2".to_string(),
                remote_platform: None,
                remote_description: None,
                id_kind: NeighborIdKind::Hostname,
            },
            LldpNeighbor {
                local_device: "10.0.0.2".to_string(),
                local_interface: "GigabitEthernet0/2".to_string(),
                remote_name: "sw1".to_string(),
                remote_interface: "GigabitEthernet0/1".to_string(),
                remote_platform: None,
                remote_description: None,
                id_kind: NeighborIdKind::Hostname,
            },
        ],
        inventory: Vec::new(),
        options: SyncOptions {
            cables: true,
            ..Default::default()
        },
    };
    // No device phase requested: cables resolve against the seeded state
    input.options.cables = true;

    let reconciler = Reconciler::new(api.clone());
    let ctx = RunContext::new(false, "/tmp/netfleet-test");
    let report = reconciler.run(&input, &ctx).await.unwrap();

    assert_eq!(report.phases["cables"].created, 1);
    let cables = api.cables.lock().clone();
    assert_eq!(cables.len(), 1);
    assert_eq!(cables[0].status, "connected");
}

#[tokio::test]
async fn unresolved_cable_endpoints_are_skipped() {
    let api = Arc::new(MockNetBox::new());
    api.seed_device("sw1", &["GigabitEthernet0/1"]);
    // sw-unknown is absent from NetBox

    let input = ReconcileInput {
        devices: vec![Device::new("10.0.0.1", "cisco_ios")],
        facts: vec![facts("10.0.0.1", "sw1")],
        interfaces: Vec::new(),
        neighbors: vec![LldpNeighbor {
            local_device: "10.0.0.1".to_string(),
            local_interface: "GigabitEthernet0/1".to_string(),
            remote_name: "sw-unknown".to_string(),
            remote_interface: "GigabitEthernet0/9".to_string(),
            remote_platform: None,
            remote_description: None,
            id_kind: NeighborIdKind::Hostname,
        }],
        inventory: Vec::new(),
        options: SyncOptions {
            cables: true,
            ..Default::default()
        },
    };

    let reconciler = Reconciler::new(api.clone());
    let ctx = RunContext::new(false, "/tmp/netfleet-test");
    let report = reconciler.run(&input, &ctx).await.unwrap();

    assert_eq!(report.phases["cables"].created, 0);
    assert_eq!(report.phases["cables"].skipped, 1);
    assert!(api.cables.lock().is_empty());
}

#[tokio::test]
async fn failed_device_removes_dependents_from_later_phases() {
    let api = Arc::new(MockNetBox::new());
    let mut input = base_input("10.0.0.4", "sw4");
    input.interfaces = vec![interface("10.0.0.4", "GigabitEthernet0/1", PortType::AccessCopper)];
    // create_devices off: the missing device cannot be created, so its
    // interfaces must not be attempted either
    input.options.create_devices = false;

    let reconciler = Reconciler::new(api.clone());
    let ctx = RunContext::new(false, "/tmp/netfleet-test");
    let report = reconciler.run(&input, &ctx).await.unwrap();

    assert_eq!(report.phases["devices"].skipped, 1);
    assert_eq!(report.phases["interfaces"].created, 0);
    assert!(api.interfaces.lock().is_empty());
}

#[tokio::test]
async fn cleanup_without_tenant_is_a_config_error() {
    let api = Arc::new(MockNetBox::new());
    let mut input = base_input("10.0.0.5", "sw5");
    input.options.cleanup = true;
    input.options.tenant = None;

    let reconciler = Reconciler::new(api);
    let ctx = RunContext::new(true, "/tmp/netfleet-test");
    assert!(reconciler.run(&input, &ctx).await.is_err());
}
