//! Endpoint configuration for the primary and secondary DHCP APIs.

use std::net::IpAddr;
use std::path::PathBuf;

use crate::Scheme;

/// PEM material used when talking HTTPS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub ca_cert: Option<PathBuf>,
}

/// Location of one DHCP management API and the subnet to operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub scheme: Scheme,
    pub host: String,
    pub port: Option<u16>,
    pub subnet: String,
    pub tls: TlsConfig,
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, subnet: impl Into<String>) -> Self {
        EndpointConfig {
            scheme: Scheme::default(),
            host: host.into(),
            port: None,
            subnet: subnet.into(),
            tls: TlsConfig::default(),
        }
    }

    /// Collection URL for the subnet: `{scheme}://{host}[:port]/dhcp/{subnet}`.
    ///
    /// A host that already carries its own port keeps it.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        match self.port {
            Some(port) if !host_has_port(host) => {
                format!("{}://{}:{}/dhcp/{}", self.scheme, host, port, self.subnet)
            }
            _ => format!("{}://{}/dhcp/{}", self.scheme, host, self.subnet),
        }
    }

    /// Detail URL for one reservation: `{base}/{ip}`.
    pub fn lease_url(&self, ip: &IpAddr) -> String {
        format!("{}/{}", self.base_url(), ip)
    }
}

fn host_has_port(host: &str) -> bool {
    // Bracketed IPv6 literal: only a suffix after `]` can be a port.
    if let Some(end) = host.rfind(']') {
        return host[end..].contains(':');
    }
    host.matches(':').count() == 1
}
