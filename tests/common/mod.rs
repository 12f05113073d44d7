#![allow(dead_code)]

use anyhow::Result;
use dhcp_sync::{DhcpApi, LeaseDetail, Reservation, SyncError};
use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// In-memory DHCP API.
///
/// Created reservations are stored the way a server would report them back:
/// `name` becomes `hostname` again and the server fills in `subnet` and
/// `nextServer` itself.
pub struct FakeDhcp {
    pub label: &'static str,
    pub subnet: String,
    pub next_server: String,
    pub leases: RefCell<BTreeMap<IpAddr, Map<String, Value>>>,
    /// Replaces the listing derived from `leases` when set.
    pub listing: RefCell<Option<Vec<Value>>>,
    pub calls: RefCell<Vec<String>>,
    pub created: RefCell<Vec<LeaseDetail>>,
    pub fail_delete: RefCell<Option<IpAddr>>,
}

impl FakeDhcp {
    pub fn new(label: &'static str) -> Self {
        FakeDhcp {
            label,
            subnet: "10.0.0.0".to_string(),
            next_server: "0a000001".to_string(),
            leases: RefCell::new(BTreeMap::new()),
            listing: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
            created: RefCell::new(Vec::new()),
            fail_delete: RefCell::new(None),
        }
    }

    /// Add a lease as the server would report it, with `subnet` and
    /// `nextServer` filled in.
    pub fn with_lease(self, ip: &str, hostname: &str) -> Self {
        let fields = self.server_fields(ip, hostname);
        self.with_detail(fields)
    }

    pub fn with_detail(self, detail: Value) -> Self {
        let Value::Object(fields) = detail else {
            panic!("detail must be an object");
        };
        let ip = fields["ip"].as_str().unwrap().parse().unwrap();
        self.leases.borrow_mut().insert(ip, fields);
        self
    }

    pub fn with_listing(self, listing: Vec<Value>) -> Self {
        *self.listing.borrow_mut() = Some(listing);
        self
    }

    pub fn server_fields(&self, ip: &str, hostname: &str) -> Value {
        json!({
            "ip": ip,
            "hostname": hostname,
            "mac": format!("00:11:22:33:44:{:02x}", ip.len()),
            "subnet": self.subnet,
            "nextServer": self.next_server,
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn hostnames(&self) -> Vec<(String, String)> {
        self.leases
            .borrow()
            .iter()
            .map(|(ip, fields)| {
                (
                    ip.to_string(),
                    fields["hostname"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl DhcpApi for FakeDhcp {
    fn list_reservations(&self) -> Result<Vec<Reservation>> {
        self.record("LIST".to_string());
        let listing = match &*self.listing.borrow() {
            Some(listing) => listing.clone(),
            None => self
                .leases
                .borrow()
                .values()
                .map(|fields| json!({"ip": fields["ip"], "hostname": fields["hostname"]}))
                .collect(),
        };
        listing.into_iter().map(Reservation::from_value).collect()
    }

    fn lease_detail(&self, ip: &IpAddr) -> Result<LeaseDetail> {
        self.record(format!("GET {ip}"));
        match self.leases.borrow().get(ip) {
            Some(fields) => Ok(LeaseDetail::new(fields.clone())),
            None => Err(SyncError::Fetch {
                url: format!("fake://{}/{ip}", self.label),
                reason: "HTTP 404 Not Found".to_string(),
            }
            .into()),
        }
    }

    fn delete_reservation(&self, ip: &IpAddr) -> Result<String> {
        self.record(format!("DELETE {ip}"));
        if *self.fail_delete.borrow() == Some(*ip) {
            return Err(SyncError::Apply {
                op: dhcp_sync::ApplyOp::Delete,
                ip: ip.to_string(),
                reason: "HTTP 500 Internal Server Error".to_string(),
            }
            .into());
        }
        self.leases.borrow_mut().remove(ip);
        Ok(format!("{{\"deleted\":\"{ip}\"}}\n"))
    }

    fn create_reservation(&self, ip: &IpAddr, record: &LeaseDetail) -> Result<String> {
        self.record(format!("POST {ip}"));
        self.created.borrow_mut().push(record.clone());

        let mut fields = record.fields().clone();
        if let Some(name) = fields.remove("name") {
            fields.insert("hostname".to_string(), name);
        }
        fields.insert("subnet".to_string(), json!(self.subnet));
        fields.insert("nextServer".to_string(), json!(self.next_server));
        self.leases.borrow_mut().insert(*ip, fields);
        Ok(format!("{{\"created\":\"{ip}\"}}"))
    }
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}
