use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use crate::SyncError;

/// Which endpoint a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Primary,
    Secondary,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Primary => write!(f, "primary"),
            Side::Secondary => write!(f, "secondary"),
        }
    }
}

/// Summary record from the reservation list of a subnet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reservation {
    pub ip: IpAddr,
    pub hostname: String,
    /// Any further summary fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reservation {
    /// Build a reservation from one entry of a `reservations` array.
    ///
    /// Both `ip` and `hostname` must be present as strings, and `ip` must be
    /// an address in its canonical text form.
    pub fn from_value(value: Value) -> Result<Self> {
        let record = value.to_string();
        let Value::Object(mut fields) = value else {
            return Err(SyncError::MissingField { field: "ip", record }.into());
        };

        let ip = match fields.remove("ip") {
            Some(Value::String(ip)) => ip,
            _ => return Err(SyncError::MissingField { field: "ip", record }.into()),
        };
        let hostname = match fields.remove("hostname") {
            Some(Value::String(hostname)) => hostname,
            _ => {
                return Err(SyncError::MissingField {
                    field: "hostname",
                    record,
                }
                .into())
            }
        };

        // URLs are built from the parsed address, so it must print back as
        // exactly the string the server listed.
        let ip = match ip.parse::<IpAddr>() {
            Ok(parsed) if parsed.to_string() == ip => parsed,
            _ => return Err(SyncError::InvalidIpAddress(ip).into()),
        };

        Ok(Reservation {
            ip,
            hostname,
            extra: fields,
        })
    }
}

/// Full field set of one reservation as returned by the detail endpoint.
///
/// Equality compares the whole key/value set and ignores key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaseDetail(Map<String, Value>);

impl LeaseDetail {
    pub fn new(fields: Map<String, Value>) -> Self {
        LeaseDetail(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn hostname(&self) -> Option<&str> {
        self.0.get("hostname").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for LeaseDetail {
    fn from(fields: Map<String, Value>) -> Self {
        LeaseDetail(fields)
    }
}

/// Operations needed to make the secondary match the primary.
///
/// An IP present on both sides with differing detail is listed in both
/// `deletes` and `adds`, and its current secondary detail is kept in
/// `replaced`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationPlan {
    pub deletes: BTreeMap<IpAddr, Reservation>,
    pub adds: BTreeMap<IpAddr, LeaseDetail>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub replaced: BTreeMap<IpAddr, LeaseDetail>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.adds.is_empty()
    }

    /// IPs scheduled for delete-then-re-add.
    pub fn updated_ips(&self) -> impl Iterator<Item = &IpAddr> {
        self.adds
            .keys()
            .filter(move |ip| self.deletes.contains_key(*ip))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub deleted: usize,
    pub added: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Treat an IP listed twice on one side as a fatal error.
    pub strict: bool,
}
