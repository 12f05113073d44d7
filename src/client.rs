//! Access to a DHCP management API.
//!
//! [`DhcpApi`] is the seam the reconciler and the apply phase work against;
//! [`HttpDhcpClient`] is the blocking HTTP(S) implementation.

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::{Certificate, Identity};
use serde_json::Value;
use std::error::Error as StdError;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use tracing::debug;

use crate::config::{EndpointConfig, TlsConfig};
use crate::errors::ApplyOp;
use crate::transform::form_fields;
use crate::{LeaseDetail, Reservation, SyncError};

pub trait DhcpApi {
    /// All reservations of the configured subnet.
    fn list_reservations(&self) -> Result<Vec<Reservation>>;

    /// Full detail record for one reservation.
    fn lease_detail(&self, ip: &IpAddr) -> Result<LeaseDetail>;

    /// Remove a reservation, returning the raw response body.
    fn delete_reservation(&self, ip: &IpAddr) -> Result<String>;

    /// Create a reservation from an already transformed record, returning the
    /// raw response body.
    fn create_reservation(&self, ip: &IpAddr, record: &LeaseDetail) -> Result<String>;
}

pub struct HttpDhcpClient {
    http: Client,
    config: EndpointConfig,
}

impl HttpDhcpClient {
    pub fn new(config: EndpointConfig) -> Result<Self> {
        let http = build_http_client(&config.tls)?;
        Ok(HttpDhcpClient { http, config })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    fn get_json(&self, url: &str) -> Result<Value> {
        debug!(%url, "GET");
        let resp = self.http.get(url).send().map_err(|e| SyncError::Fetch {
            url: url.to_string(),
            reason: error_chain(&e),
        })?;

        let status = resp.status();
        let body = read_body(resp).map_err(|reason| SyncError::Fetch {
            url: url.to_string(),
            reason,
        })?;

        if !status.is_success() {
            return Err(SyncError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {status}: {}", body.trim()),
            }
            .into());
        }

        serde_json::from_str(&body).map_err(|e| {
            SyncError::Parse {
                url: url.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn finish_write(op: ApplyOp, ip: &IpAddr, result: reqwest::Result<Response>) -> Result<String> {
        let apply_error = |reason: String| SyncError::Apply {
            op,
            ip: ip.to_string(),
            reason,
        };

        let resp = result.map_err(|e| apply_error(error_chain(&e)))?;
        let status = resp.status();
        let body = read_body(resp).map_err(apply_error)?;

        if !status.is_success() {
            return Err(apply_error(format!("HTTP {status}: {}", body.trim())).into());
        }
        Ok(body)
    }
}

impl DhcpApi for HttpDhcpClient {
    fn list_reservations(&self) -> Result<Vec<Reservation>> {
        let url = self.config.base_url();
        let mut listing = self.get_json(&url)?;

        let entries = match listing.get_mut("reservations").map(Value::take) {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                return Err(SyncError::Parse {
                    url,
                    reason: format!("expected `reservations` to be an array, got {other}"),
                }
                .into())
            }
            None => {
                return Err(SyncError::MissingField {
                    field: "reservations",
                    record: listing.to_string(),
                }
                .into())
            }
        };

        entries
            .into_iter()
            .map(Reservation::from_value)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Invalid reservation listed by {url}"))
    }

    fn lease_detail(&self, ip: &IpAddr) -> Result<LeaseDetail> {
        let url = self.config.lease_url(ip);
        let value = self.get_json(&url)?;
        serde_json::from_value(value).map_err(|e| {
            SyncError::Parse {
                url,
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn delete_reservation(&self, ip: &IpAddr) -> Result<String> {
        let url = self.config.lease_url(ip);
        debug!(%url, "DELETE");
        let result = self.http.delete(&url).send();
        Self::finish_write(ApplyOp::Delete, ip, result)
    }

    fn create_reservation(&self, ip: &IpAddr, record: &LeaseDetail) -> Result<String> {
        let url = self.config.base_url();
        debug!(%url, %ip, "POST");
        let result = self.http.post(&url).form(&form_fields(record)).send();
        Self::finish_write(ApplyOp::Add, ip, result)
    }
}

fn build_http_client(tls: &TlsConfig) -> Result<Client> {
    let mut builder = Client::builder();

    if let Some(path) = &tls.ca_cert {
        let pem = read_pem(path, "CA certificate")?;
        let cert = Certificate::from_pem(&pem).map_err(|e| SyncError::TlsMaterial {
            what: "CA certificate",
            path: path.clone(),
            reason: e.to_string(),
        })?;
        builder = builder.add_root_certificate(cert);
    }

    match (&tls.client_cert, &tls.client_key) {
        (Some(cert_path), Some(key_path)) => {
            let mut pem = read_pem(cert_path, "client certificate")?;
            pem.push(b'\n');
            pem.extend(read_pem(key_path, "client key")?);
            let identity = Identity::from_pem(&pem).map_err(|e| SyncError::TlsMaterial {
                what: "client identity",
                path: cert_path.clone(),
                reason: error_chain(&e),
            })?;
            builder = builder.identity(identity);
        }
        (None, None) => {}
        _ => anyhow::bail!("A client certificate and a client key must be configured together"),
    }

    builder.build().context("Failed to build HTTP client")
}

fn read_pem(path: &Path, what: &'static str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        SyncError::TlsMaterial {
            what,
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn read_body(resp: Response) -> std::result::Result<String, String> {
    resp.text().map_err(|e| error_chain(&e))
}

/// Render an error together with its sources, e.g. the underlying
/// "connection refused" behind a reqwest error.
fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
