use super::models::{
    DeviceFilter, NbCable, NbCableEnd, NbDevice, NbInterface, NbInventoryItem, NbIpAddress,
    NbRef, NbVlan,
};
use crate::error::FleetError;
use crate::settings::NetBoxSettings;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// The subset of the NetBox REST API the reconciler consumes.
///
/// Implemented by [`NetBoxRestClient`] for real deployments and by in-memory
/// fakes in tests. All `ensure_*` helpers are get-or-create.
#[async_trait]
pub trait NetBoxApi: Send + Sync {
    async fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<NbDevice>, FleetError>;
    async fn get_device(&self, name: &str) -> Result<Option<NbDevice>, FleetError>;
    async fn create_device(&self, device: &NbDevice) -> Result<NbDevice, FleetError>;
    async fn update_device(&self, device: &NbDevice) -> Result<(), FleetError>;
    async fn delete_device(&self, id: u64) -> Result<(), FleetError>;

    async fn list_interfaces(&self, device: &str) -> Result<Vec<NbInterface>, FleetError>;
    async fn create_interface(&self, iface: &NbInterface) -> Result<NbInterface, FleetError>;
    async fn update_interface(&self, iface: &NbInterface) -> Result<(), FleetError>;
    async fn delete_interface(&self, id: u64) -> Result<(), FleetError>;

    async fn list_ip_addresses(&self, device: &str) -> Result<Vec<NbIpAddress>, FleetError>;
    async fn create_ip_address(&self, ip: &NbIpAddress) -> Result<NbIpAddress, FleetError>;
    async fn update_ip_address(&self, ip: &NbIpAddress) -> Result<(), FleetError>;
    async fn delete_ip_address(&self, id: u64) -> Result<(), FleetError>;

    async fn list_vlans(&self, site: Option<&str>) -> Result<Vec<NbVlan>, FleetError>;
    async fn create_vlan(&self, vlan: &NbVlan) -> Result<NbVlan, FleetError>;
    async fn update_vlan(&self, vlan: &NbVlan) -> Result<(), FleetError>;

    async fn list_cables(&self) -> Result<Vec<NbCable>, FleetError>;
    async fn create_cable(&self, cable: &NbCable) -> Result<NbCable, FleetError>;

    async fn list_inventory_items(&self, device: &str)
        -> Result<Vec<NbInventoryItem>, FleetError>;
    async fn create_inventory_item(
        &self,
        item: &NbInventoryItem,
    ) -> Result<NbInventoryItem, FleetError>;
    async fn update_inventory_item(&self, item: &NbInventoryItem) -> Result<(), FleetError>;

    async fn ensure_site(&self, name: &str) -> Result<NbRef, FleetError>;
    async fn ensure_role(&self, name: &str) -> Result<NbRef, FleetError>;
    async fn ensure_manufacturer(&self, name: &str) -> Result<NbRef, FleetError>;
    async fn ensure_device_type(
        &self,
        manufacturer: &str,
        model: &str,
    ) -> Result<NbRef, FleetError>;
    async fn ensure_platform(&self, slug: &str) -> Result<NbRef, FleetError>;
}

/// Token-authenticated client against a live NetBox.
///
/// Transient failures (429, 5xx) are retried with backoff; authentication
/// rejections surface as [`FleetError::NetBoxAuth`] and abort the run.
pub struct NetBoxRestClient {
    http: reqwest::Client,
    settings: NetBoxSettings,
}

impl NetBoxRestClient {
    pub fn new(settings: NetBoxSettings) -> Result<Self, FleetError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.settings.url.trim_end_matches('/'), path)
    }

    /// One request with token auth, retry on backpressure, typed errors
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, FleetError> {
        let mut attempt = 0u32;
        loop {
            let mut req = self
                .http
                .request(method.clone(), self.url(path))
                .header("Authorization", format!("Token {}", self.settings.token))
                .header("Accept", "application/json");
            if let Some(body) = body {
                req = req.json(body);
            }

            let response = req.send().await?;
            let status = response.status();

            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(FleetError::NetBoxAuth(format!(
                        "{} {} -> {}",
                        method, path, status
                    )));
                }
                status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
                    if attempt >= self.settings.retry_count {
                        return Err(FleetError::NetBoxApi {
                            status: status.as_u16(),
                            message: response.text().await.unwrap_or_default(),
                        });
                    }
                    let delay = self.settings.retry_delay * 2u32.saturating_pow(attempt);
                    warn!(
                        path,
                        status = status.as_u16(),
                        delay_ms = delay.as_millis() as u64,
                        "NetBox backpressure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                status if status.is_client_error() => {
                    return Err(FleetError::NetBoxApi {
                        status: status.as_u16(),
                        message: response.text().await.unwrap_or_default(),
                    });
                }
                StatusCode::NO_CONTENT => return Ok(Value::Null),
                _ => {
                    return Ok(response.json::<Value>().await?);
                }
            }
        }
    }

    /// Follow pagination until every result page is collected
    async fn get_all(&self, path: &str) -> Result<Vec<Value>, FleetError> {
        let mut results = Vec::new();
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut offset = 0usize;
        loop {
            let page_path = format!(
                "{}{}limit={}&offset={}",
                path, separator, self.settings.page_limit, offset
            );
            let page = self.request(Method::GET, &page_path, None).await?;
            let items = page["results"].as_array().cloned().unwrap_or_default();
            let got = items.len();
            results.extend(items);
            if page["next"].is_null() || got == 0 {
                break;
            }
            offset += got;
        }
        Ok(results)
    }

    async fn ensure(&self, path: &str, slug_field: &str, name: &str) -> Result<NbRef, FleetError> {
        let slug = slugify(name);
        let found = self
            .get_all(&format!("{}?slug={}", path, slug))
            .await?;
        if let Some(existing) = found.first() {
            return Ok(NbRef::new(
                existing["id"].as_u64().unwrap_or_default(),
                name,
            ));
        }
        debug!(path, name, "creating missing reference object");
        let created = self
            .request(
                Method::POST,
                path,
                Some(&json!({ "name": name, slug_field: slug })),
            )
            .await?;
        Ok(NbRef::new(created["id"].as_u64().unwrap_or_default(), name))
    }

    async fn interface_pk(&self, device: &str, interface: &str) -> Result<Option<u64>, FleetError> {
        let found = self
            .get_all(&format!(
                "dcim/interfaces/?device={}&name={}",
                device, interface
            ))
            .await?;
        Ok(found.first().and_then(|v| v["id"].as_u64()))
    }

    async fn vlan_pk(&self, vid: u16) -> Result<Option<u64>, FleetError> {
        let found = self.get_all(&format!("ipam/vlans/?vid={}", vid)).await?;
        Ok(found.first().and_then(|v| v["id"].as_u64()))
    }

    async fn device_pk(&self, name: &str) -> Result<u64, FleetError> {
        let found = self
            .get_all(&format!("dcim/devices/?name={}", name))
            .await?;
        found
            .first()
            .and_then(|v| v["id"].as_u64())
            .ok_or_else(|| FleetError::NetBoxApi {
                status: 404,
                message: format!("device {} not found", name),
            })
    }

    async fn device_payload(&self, device: &NbDevice) -> Result<Value, FleetError> {
        let mut payload = json!({
            "name": device.name,
            "status": device.status,
            "serial": device.serial.clone().unwrap_or_default(),
        });
        if let Some(site) = &device.site {
            payload["site"] = json!(self.ensure_site(site).await?.id);
        }
        if let Some(role) = &device.role {
            payload["role"] = json!(self.ensure_role(role).await?.id);
        }
        if let Some(platform) = &device.platform {
            payload["platform"] = json!(self.ensure_platform(platform).await?.id);
        }
        if let Some(model) = &device.device_type {
            let manufacturer = device.platform.as_deref().unwrap_or("generic");
            let manufacturer = manufacturer.split('-').next().unwrap_or("generic");
            payload["device_type"] =
                json!(self.ensure_device_type(manufacturer, model).await?.id);
        }
        Ok(payload)
    }

    async fn interface_payload(&self, iface: &NbInterface) -> Result<Value, FleetError> {
        let device_id = self.device_pk(&iface.device).await?;
        let mut payload = json!({
            "device": device_id,
            "name": iface.name,
            "type": iface.if_type,
            "enabled": iface.enabled,
            "description": iface.description.clone().unwrap_or_default(),
        });
        if let Some(mtu) = iface.mtu {
            payload["mtu"] = json!(mtu);
        }
        if let Some(mac) = &iface.mac_address {
            payload["mac_address"] = json!(mac);
        }
        if let Some(speed) = iface.speed_kbps {
            payload["speed"] = json!(speed);
        }
        if let Some(mode) = &iface.mode {
            payload["mode"] = json!(mode);
            if let Some(vid) = iface.untagged_vlan {
                if let Some(pk) = self.vlan_pk(vid).await? {
                    payload["untagged_vlan"] = json!(pk);
                }
            }
            if !iface.tagged_vlans.is_empty() {
                let mut pks = Vec::new();
                for vid in &iface.tagged_vlans {
                    if let Some(pk) = self.vlan_pk(*vid).await? {
                        pks.push(pk);
                    }
                }
                payload["tagged_vlans"] = json!(pks);
            }
        }
        if let Some(lag) = &iface.lag {
            if let Some(pk) = self.interface_pk(&iface.device, lag).await? {
                payload["lag"] = json!(pk);
            } else {
                warn!(device = %iface.device, lag = %lag, "LAG parent not found in NetBox");
            }
        }
        Ok(payload)
    }
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

fn text(value: &Value, field: &str) -> Option<String> {
    value[field].as_str().map(str::to_string).filter(|s| !s.is_empty())
}

fn nested_name(value: &Value, field: &str) -> Option<String> {
    value[field]["name"]
        .as_str()
        .or_else(|| value[field]["display"].as_str())
        .map(str::to_string)
}

fn parse_device(value: &Value) -> NbDevice {
    NbDevice {
        id: value["id"].as_u64().unwrap_or_default(),
        name: text(value, "name").unwrap_or_default(),
        site: nested_name(value, "site"),
        role: nested_name(value, "role"),
        platform: value["platform"]["slug"]
            .as_str()
            .map(str::to_string)
            .or_else(|| nested_name(value, "platform")),
        device_type: value["device_type"]["model"]
            .as_str()
            .map(str::to_string),
        serial: text(value, "serial"),
        status: value["status"]["value"]
            .as_str()
            .unwrap_or("active")
            .to_string(),
        tenant: nested_name(value, "tenant"),
        primary_ip4: value["primary_ip4"]["address"].as_str().map(str::to_string),
    }
}

fn parse_interface(value: &Value) -> NbInterface {
    NbInterface {
        id: value["id"].as_u64().unwrap_or_default(),
        device: nested_name(value, "device").unwrap_or_default(),
        name: text(value, "name").unwrap_or_default(),
        if_type: value["type"]["value"].as_str().unwrap_or("other").to_string(),
        enabled: value["enabled"].as_bool().unwrap_or(true),
        description: text(value, "description"),
        mtu: value["mtu"].as_u64().map(|m| m as u32),
        mac_address: text(value, "mac_address"),
        speed_kbps: value["speed"].as_u64(),
        mode: value["mode"]["value"].as_str().map(str::to_string),
        untagged_vlan: value["untagged_vlan"]["vid"].as_u64().map(|v| v as u16),
        tagged_vlans: value["tagged_vlans"]
            .as_array()
            .map(|vlans| {
                vlans
                    .iter()
                    .filter_map(|v| v["vid"].as_u64().map(|vid| vid as u16))
                    .collect()
            })
            .unwrap_or_default(),
        lag: nested_name(value, "lag"),
    }
}

fn parse_ip(value: &Value) -> NbIpAddress {
    NbIpAddress {
        id: value["id"].as_u64().unwrap_or_default(),
        address: text(value, "address").unwrap_or_default(),
        device: value["assigned_object"]["device"]["name"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        interface: value["assigned_object"]["name"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        is_primary: false,
    }
}

fn parse_vlan(value: &Value) -> NbVlan {
    NbVlan {
        id: value["id"].as_u64().unwrap_or_default(),
        vid: value["vid"].as_u64().unwrap_or_default() as u16,
        name: text(value, "name").unwrap_or_default(),
        site: nested_name(value, "site"),
    }
}

fn parse_cable(value: &Value) -> Option<NbCable> {
    let end = |field: &str| -> Option<NbCableEnd> {
        let termination = value[field].as_array()?.first()?.clone();
        Some(NbCableEnd {
            device: termination["object"]["device"]["name"]
                .as_str()?
                .to_string(),
            interface: termination["object"]["name"].as_str()?.to_string(),
        })
    };
    Some(NbCable {
        id: value["id"].as_u64().unwrap_or_default(),
        a: end("a_terminations")?,
        b: end("b_terminations")?,
        status: value["status"]["value"]
            .as_str()
            .unwrap_or("connected")
            .to_string(),
    })
}

fn parse_inventory_item(value: &Value) -> NbInventoryItem {
    NbInventoryItem {
        id: value["id"].as_u64().unwrap_or_default(),
        device: nested_name(value, "device").unwrap_or_default(),
        name: text(value, "name").unwrap_or_default(),
        part_id: text(value, "part_id"),
        serial: text(value, "serial"),
        manufacturer: nested_name(value, "manufacturer"),
        description: text(value, "description"),
    }
}

#[async_trait]
impl NetBoxApi for NetBoxRestClient {
    async fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<NbDevice>, FleetError> {
        let mut path = "dcim/devices/".to_string();
        let mut params = Vec::new();
        if let Some(site) = &filter.site {
            params.push(format!("site={}", slugify(site)));
        }
        if let Some(role) = &filter.role {
            params.push(format!("role={}", slugify(role)));
        }
        if let Some(tenant) = &filter.tenant {
            params.push(format!("tenant={}", slugify(tenant)));
        }
        if !params.is_empty() {
            path = format!("{}?{}", path, params.join("&"));
        }
        Ok(self.get_all(&path).await?.iter().map(parse_device).collect())
    }

    async fn get_device(&self, name: &str) -> Result<Option<NbDevice>, FleetError> {
        let found = self
            .get_all(&format!("dcim/devices/?name={}", name))
            .await?;
        Ok(found.first().map(parse_device))
    }

    async fn create_device(&self, device: &NbDevice) -> Result<NbDevice, FleetError> {
        let payload = self.device_payload(device).await?;
        let created = self
            .request(Method::POST, "dcim/devices/", Some(&payload))
            .await?;
        Ok(parse_device(&created))
    }

    async fn update_device(&self, device: &NbDevice) -> Result<(), FleetError> {
        let payload = self.device_payload(device).await?;
        self.request(
            Method::PATCH,
            &format!("dcim/devices/{}/", device.id),
            Some(&payload),
        )
        .await?;
        Ok(())
    }

    async fn delete_device(&self, id: u64) -> Result<(), FleetError> {
        self.request(Method::DELETE, &format!("dcim/devices/{}/", id), None)
            .await?;
        Ok(())
    }

    async fn list_interfaces(&self, device: &str) -> Result<Vec<NbInterface>, FleetError> {
        Ok(self
            .get_all(&format!("dcim/interfaces/?device={}", device))
            .await?
            .iter()
            .map(parse_interface)
            .collect())
    }

    async fn create_interface(&self, iface: &NbInterface) -> Result<NbInterface, FleetError> {
        let payload = self.interface_payload(iface).await?;
        let created = self
            .request(Method::POST, "dcim/interfaces/", Some(&payload))
            .await?;
        Ok(parse_interface(&created))
    }

    async fn update_interface(&self, iface: &NbInterface) -> Result<(), FleetError> {
        let payload = self.interface_payload(iface).await?;
        self.request(
            Method::PATCH,
            &format!("dcim/interfaces/{}/", iface.id),
            Some(&payload),
        )
        .await?;
        Ok(())
    }

    async fn delete_interface(&self, id: u64) -> Result<(), FleetError> {
        self.request(Method::DELETE, &format!("dcim/interfaces/{}/", id), None)
            .await?;
        Ok(())
    }

    async fn list_ip_addresses(&self, device: &str) -> Result<Vec<NbIpAddress>, FleetError> {
        Ok(self
            .get_all(&format!("ipam/ip-addresses/?device={}", device))
            .await?
            .iter()
            .map(parse_ip)
            .collect())
    }

    async fn create_ip_address(&self, ip: &NbIpAddress) -> Result<NbIpAddress, FleetError> {
        let interface_id = self
            .interface_pk(&ip.device, &ip.interface)
            .await?
            .ok_or_else(|| FleetError::NetBoxApi {
                status: 404,
                message: format!("interface {}/{} not found", ip.device, ip.interface),
            })?;
        let payload = json!({
            "address": ip.address,
            "assigned_object_type": "dcim.interface",
            "assigned_object_id": interface_id,
            "status": "active",
        });
        let created = self
            .request(Method::POST, "ipam/ip-addresses/", Some(&payload))
            .await?;
        let mut parsed = parse_ip(&created);
        parsed.device = ip.device.clone();
        parsed.interface = ip.interface.clone();

        if ip.is_primary {
            let device_id = self.device_pk(&ip.device).await?;
            self.request(
                Method::PATCH,
                &format!("dcim/devices/{}/", device_id),
                Some(&json!({ "primary_ip4": parsed.id })),
            )
            .await?;
        }
        Ok(parsed)
    }

    async fn update_ip_address(&self, ip: &NbIpAddress) -> Result<(), FleetError> {
        if ip.is_primary {
            let device_id = self.device_pk(&ip.device).await?;
            self.request(
                Method::PATCH,
                &format!("dcim/devices/{}/", device_id),
                Some(&json!({ "primary_ip4": ip.id })),
            )
            .await?;
        }
        Ok(())
    }

    async fn delete_ip_address(&self, id: u64) -> Result<(), FleetError> {
        self.request(Method::DELETE, &format!("ipam/ip-addresses/{}/", id), None)
            .await?;
        Ok(())
    }

    async fn list_vlans(&self, site: Option<&str>) -> Result<Vec<NbVlan>, FleetError> {
        let path = match site {
            Some(site) => format!("ipam/vlans/?site={}", slugify(site)),
            None => "ipam/vlans/".to_string(),
        };
        Ok(self.get_all(&path).await?.iter().map(parse_vlan).collect())
    }

    async fn create_vlan(&self, vlan: &NbVlan) -> Result<NbVlan, FleetError> {
        let mut payload = json!({ "vid": vlan.vid, "name": vlan.name, "status": "active" });
        if let Some(site) = &vlan.site {
            payload["site"] = json!(self.ensure_site(site).await?.id);
        }
        let created = self
            .request(Method::POST, "ipam/vlans/", Some(&payload))
            .await?;
        Ok(parse_vlan(&created))
    }

    async fn update_vlan(&self, vlan: &NbVlan) -> Result<(), FleetError> {
        self.request(
            Method::PATCH,
            &format!("ipam/vlans/{}/", vlan.id),
            Some(&json!({ "name": vlan.name })),
        )
        .await?;
        Ok(())
    }

    async fn list_cables(&self) -> Result<Vec<NbCable>, FleetError> {
        Ok(self
            .get_all("dcim/cables/")
            .await?
            .iter()
            .filter_map(parse_cable)
            .collect())
    }

    async fn create_cable(&self, cable: &NbCable) -> Result<NbCable, FleetError> {
        let a_id = self
            .interface_pk(&cable.a.device, &cable.a.interface)
            .await?;
        let b_id = self
            .interface_pk(&cable.b.device, &cable.b.interface)
            .await?;
        let (Some(a_id), Some(b_id)) = (a_id, b_id) else {
            return Err(FleetError::NetBoxApi {
                status: 404,
                message: format!(
                    "cable endpoint missing: {}/{} or {}/{}",
                    cable.a.device, cable.a.interface, cable.b.device, cable.b.interface
                ),
            });
        };
        let payload = json!({
            "a_terminations": [{ "object_type": "dcim.interface", "object_id": a_id }],
            "b_terminations": [{ "object_type": "dcim.interface", "object_id": b_id }],
            "status": cable.status,
        });
        let created = self
            .request(Method::POST, "dcim/cables/", Some(&payload))
            .await?;
        Ok(parse_cable(&created).unwrap_or_else(|| cable.clone()))
    }

    async fn list_inventory_items(
        &self,
        device: &str,
    ) -> Result<Vec<NbInventoryItem>, FleetError> {
        Ok(self
            .get_all(&format!("dcim/inventory-items/?device={}", device))
            .await?
            .iter()
            .map(parse_inventory_item)
            .collect())
    }

    async fn create_inventory_item(
        &self,
        item: &NbInventoryItem,
    ) -> Result<NbInventoryItem, FleetError> {
        let device_id = self.device_pk(&item.device).await?;
        let mut payload = json!({
            "device": device_id,
            "name": item.name,
            "part_id": item.part_id.clone().unwrap_or_default(),
            "serial": item.serial.clone().unwrap_or_default(),
            "description": item.description.clone().unwrap_or_default(),
        });
        if let Some(manufacturer) = &item.manufacturer {
            payload["manufacturer"] = json!(self.ensure_manufacturer(manufacturer).await?.id);
        }
        let created = self
            .request(Method::POST, "dcim/inventory-items/", Some(&payload))
            .await?;
        Ok(parse_inventory_item(&created))
    }

    async fn update_inventory_item(&self, item: &NbInventoryItem) -> Result<(), FleetError> {
        let payload = json!({
            "part_id": item.part_id.clone().unwrap_or_default(),
            "serial": item.serial.clone().unwrap_or_default(),
            "description": item.description.clone().unwrap_or_default(),
        });
        self.request(
            Method::PATCH,
            &format!("dcim/inventory-items/{}/", item.id),
            Some(&payload),
        )
        .await?;
        Ok(())
    }

    async fn ensure_site(&self, name: &str) -> Result<NbRef, FleetError> {
        self.ensure("dcim/sites/", "slug", name).await
    }

    async fn ensure_role(&self, name: &str) -> Result<NbRef, FleetError> {
        self.ensure("dcim/device-roles/", "slug", name).await
    }

    async fn ensure_manufacturer(&self, name: &str) -> Result<NbRef, FleetError> {
        self.ensure("dcim/manufacturers/", "slug", name).await
    }

    async fn ensure_device_type(
        &self,
        manufacturer: &str,
        model: &str,
    ) -> Result<NbRef, FleetError> {
        let slug = slugify(model);
        let found = self
            .get_all(&format!("dcim/device-types/?slug={}", slug))
            .await?;
        if let Some(existing) = found.first() {
            return Ok(NbRef::new(
                existing["id"].as_u64().unwrap_or_default(),
                model,
            ));
        }
        let manufacturer_ref = self.ensure_manufacturer(manufacturer).await?;
        let created = self
            .request(
                Method::POST,
                "dcim/device-types/",
                Some(&json!({
                    "manufacturer": manufacturer_ref.id,
                    "model": model,
                    "slug": slug,
                })),
            )
            .await?;
        Ok(NbRef::new(created["id"].as_u64().unwrap_or_default(), model))
    }

    async fn ensure_platform(&self, slug: &str) -> Result<NbRef, FleetError> {
        self.ensure("dcim/platforms/", "slug", slug).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_flattens_names() {
        assert_eq!(slugify("My Site #1"), "my-site--1");
        assert_eq!(slugify("cisco-ios"), "cisco-ios");
    }

    #[test]
    fn device_payload_round_trips_through_parse() {
        let raw = json!({
            "id": 7,
            "name": "core-sw-01",
            "site": { "name": "hq" },
            "role": { "name": "access-switch" },
            "platform": { "slug": "cisco-ios", "name": "Cisco IOS" },
            "device_type": { "model": "WS-C2960X-48TS-L" },
            "serial": "FOC1",
            "status": { "value": "active" },
            "primary_ip4": { "address": "10.0.0.1/24" },
        });
        let parsed = parse_device(&raw);
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.site.as_deref(), Some("hq"));
        assert_eq!(parsed.platform.as_deref(), Some("cisco-ios"));
        assert_eq!(parsed.primary_ip4.as_deref(), Some("10.0.0.1/24"));
    }

    #[test]
    fn interface_parse_reads_vlan_membership() {
        let raw = json!({
            "id": 12,
            "device": { "name": "core-sw-01" },
            "name": "GigabitEthernet0/1",
            "type": { "value": "1000base-t" },
            "enabled": true,
            "mode": { "value": "tagged" },
            "untagged_vlan": { "vid": 10 },
            "tagged_vlans": [ { "vid": 20 }, { "vid": 30 } ],
            "lag": { "name": "Port-channel1" },
        });
        let parsed = parse_interface(&raw);
        assert_eq!(parsed.untagged_vlan, Some(10));
        assert_eq!(parsed.tagged_vlans.iter().copied().collect::<Vec<_>>(), vec![20, 30]);
        assert_eq!(parsed.lag.as_deref(), Some("Port-channel1"));
    }
}
