//! In-memory NetBox used by the reconciliation tests.

use async_trait::async_trait;
use netfleet_core::error::FleetError;
use netfleet_core::netbox::models::{
    DeviceFilter, NbCable, NbDevice, NbInterface, NbInventoryItem, NbIpAddress, NbRef, NbVlan,
};
use netfleet_core::netbox::NetBoxApi;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Default)]
pub struct MockNetBox {
    pub devices: Mutex<Vec<NbDevice>>,
    pub interfaces: Mutex<Vec<NbInterface>>,
    pub ips: Mutex<Vec<NbIpAddress>>,
    pub vlans: Mutex<Vec<NbVlan>>,
    pub cables: Mutex<Vec<NbCable>>,
    pub items: Mutex<Vec<NbInventoryItem>>,
    next_id: AtomicU64,
    /// Every mutating call increments this; dry-run must leave it at zero
    pub write_calls: AtomicUsize,
}

impl MockNetBox {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    fn id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn wrote(&self) {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Seed a device with interfaces, bypassing the write counter
    pub fn seed_device(&self, name: &str, interface_names: &[&str]) {
        let device = NbDevice {
            id: self.id(),
            name: name.to_string(),
            status: "active".to_string(),
            ..Default::default()
        };
        self.devices.lock().push(device);
        for iface in interface_names {
            self.interfaces.lock().push(NbInterface {
                id: self.id(),
                device: name.to_string(),
                name: iface.to_string(),
                if_type: "1000base-t".to_string(),
                enabled: true,
                ..Default::default()
            });
        }
    }
}

#[async_trait]
impl NetBoxApi for MockNetBox {
    async fn list_devices(&self, _filter: &DeviceFilter) -> Result<Vec<NbDevice>, FleetError> {
        Ok(self.devices.lock().clone())
    }

    async fn get_device(&self, name: &str) -> Result<Option<NbDevice>, FleetError> {
        Ok(self.devices.lock().iter().find(|d| d.name == name).cloned())
    }

    async fn create_device(&self, device: &NbDevice) -> Result<NbDevice, FleetError> {
        self.wrote();
        let mut created = device.clone();
        created.id = self.id();
        self.devices.lock().push(created.clone());
        Ok(created)
    }

    async fn update_device(&self, device: &NbDevice) -> Result<(), FleetError> {
        self.wrote();
        let mut devices = self.devices.lock();
        if let Some(slot) = devices.iter_mut().find(|d| d.id == device.id) {
            *slot = device.clone();
        }
        Ok(())
    }

    async fn delete_device(&self, id: u64) -> Result<(), FleetError> {
        self.wrote();
        self.devices.lock().retain(|d| d.id != id);
        Ok(())
    }

    async fn list_interfaces(&self, device: &str) -> Result<Vec<NbInterface>, FleetError> {
        Ok(self
            .interfaces
            .lock()
            .iter()
            .filter(|i| i.device == device)
            .cloned()
            .collect())
    }

    async fn create_interface(&self, iface: &NbInterface) -> Result<NbInterface, FleetError> {
        self.wrote();
        let mut created = iface.clone();
        created.id = self.id();
        self.interfaces.lock().push(created.clone());
        Ok(created)
    }

    async fn update_interface(&self, iface: &NbInterface) -> Result<(), FleetError> {
        self.wrote();
        let mut interfaces = self.interfaces.lock();
        if let Some(slot) = interfaces.iter_mut().find(|i| i.id == iface.id) {
            *slot = iface.clone();
        }
        Ok(())
    }

    async fn delete_interface(&self, id: u64) -> Result<(), FleetError> {
        self.wrote();
        self.interfaces.lock().retain(|i| i.id != id);
        Ok(())
    }

    async fn list_ip_addresses(&self, device: &str) -> Result<Vec<NbIpAddress>, FleetError> {
        Ok(self
            .ips
            .lock()
            .iter()
            .filter(|ip| ip.device == device)
            .cloned()
            .collect())
    }

    async fn create_ip_address(&self, ip: &NbIpAddress) -> Result<NbIpAddress, FleetError> {
        self.wrote();
        let mut created = ip.clone();
        created.id = self.id();
        self.ips.lock().push(created.clone());
        Ok(created)
    }

    async fn update_ip_address(&self, ip: &NbIpAddress) -> Result<(), FleetError> {
        self.wrote();
        let mut ips = self.ips.lock();
        if let Some(slot) = ips.iter_mut().find(|i| i.id == ip.id) {
            *slot = ip.clone();
        }
        Ok(())
    }

    async fn delete_ip_address(&self, id: u64) -> Result<(), FleetError> {
        self.wrote();
        self.ips.lock().retain(|i| i.id != id);
        Ok(())
    }

    async fn list_vlans(&self, _site: Option<&str>) -> Result<Vec<NbVlan>, FleetError> {
        Ok(self.vlans.lock().clone())
    }

    async fn create_vlan(&self, vlan: &NbVlan) -> Result<NbVlan, FleetError> {
        self.wrote();
        let mut created = vlan.clone();
        created.id = self.id();
        self.vlans.lock().push(created.clone());
        Ok(created)
    }

    async fn update_vlan(&self, vlan: &NbVlan) -> Result<(), FleetError> {
        self.wrote();
        let mut vlans = self.vlans.lock();
        if let Some(slot) = vlans.iter_mut().find(|v| v.id == vlan.id) {
            *slot = vlan.clone();
        }
        Ok(())
    }

    async fn list_cables(&self) -> Result<Vec<NbCable>, FleetError> {
        Ok(self.cables.lock().clone())
    }

    async fn create_cable(&self, cable: &NbCable) -> Result<NbCable, FleetError> {
        self.wrote();
        let mut created = cable.clone();
        created.id = self.id();
        self.cables.lock().push(created.clone());
        Ok(created)
    }

    async fn list_inventory_items(
        &self,
        device: &str,
    ) -> Result<Vec<NbInventoryItem>, FleetError> {
        Ok(self
            .items
            .lock()
            .iter()
            .filter(|i| i.device == device)
            .cloned()
            .collect())
    }

    async fn create_inventory_item(
        &self,
        item: &NbInventoryItem,
    ) -> Result<NbInventoryItem, FleetError> {
        self.wrote();
        let mut created = item.clone();
        created.id = self.id();
        self.items.lock().push(created.clone());
        Ok(created)
    }

    async fn update_inventory_item(&self, item: &NbInventoryItem) -> Result<(), FleetError> {
        self.wrote();
        let mut items = self.items.lock();
        if let Some(slot) = items.iter_mut().find(|i| i.id == item.id) {
            *slot = item.clone();
        }
        Ok(())
    }

    async fn ensure_site(&self, name: &str) -> Result<NbRef, FleetError> {
        Ok(NbRef::new(self.id(), name))
    }

    async fn ensure_role(&self, name: &str) -> Result<NbRef, FleetError> {
        Ok(NbRef::new(self.id(), name))
    }

    async fn ensure_manufacturer(&self, name: &str) -> Result<NbRef, FleetError> {
        Ok(NbRef::new(self.id(), name))
    }

    async fn ensure_device_type(
        &self,
        _manufacturer: &str,
        model: &str,
    ) -> Result<NbRef, FleetError> {
        Ok(NbRef::new(self.id(), model))
    }

    async fn ensure_platform(&self, slug: &str) -> Result<NbRef, FleetError> {
        Ok(NbRef::new(self.id(), slug))
    }
}
