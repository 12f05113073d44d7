use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::Scheme;

mod plan;
mod sync;

pub(crate) struct SyncArgs {
    pub(crate) primary: String,
    pub(crate) secondary: String,
    pub(crate) subnet: String,
    pub(crate) scheme: Scheme,
    pub(crate) port: Option<u16>,
    pub(crate) client_cert: Option<PathBuf>,
    pub(crate) client_key: Option<PathBuf>,
    pub(crate) ca_cert: Option<PathBuf>,
    pub(crate) dry_run: bool,
    pub(crate) json: bool,
    pub(crate) show_diff: bool,
    pub(crate) strict: bool,
}

#[derive(Parser)]
#[command(
    name = "dhcp-sync",
    about = "Synchronize DHCP static reservations from a primary to a secondary DHCP API",
    long_about = "Fetches the reservations of one subnet from both endpoints, deletes what the \
                  secondary has that the primary does not, and re-creates every reservation \
                  whose detail differs or is missing on the secondary.",
    after_help = "Examples:\n  dhcp-sync dhcp1.example.net dhcp2.example.net 10.0.0.0\n  dhcp-sync --dry-run --show-diff dhcp1 dhcp2 10.0.0.0\n  dhcp-sync --scheme https --port 8443 --ca-cert ca.pem --client-cert host.pem --client-key host.key dhcp1 dhcp2 10.0.0.0"
)]
struct Cli {
    /// Primary (source of truth) DHCP API host, optionally host:port
    primary: String,

    /// Secondary DHCP API host to bring in line with the primary
    secondary: String,

    /// Subnet identifier used in the API path (/dhcp/<SUBNET>)
    subnet: String,

    /// URL scheme for both endpoints
    #[arg(long, value_enum, default_value_t = Scheme::Http)]
    scheme: Scheme,

    /// Port for both endpoints (ignored for a host that carries its own port)
    #[arg(short, long)]
    port: Option<u16>,

    /// PEM client certificate presented to both endpoints
    #[arg(long, env = "DHCP_SYNC_CLIENT_CERT", requires = "client_key")]
    client_cert: Option<PathBuf>,

    /// PEM private key for the client certificate
    #[arg(long, env = "DHCP_SYNC_CLIENT_KEY", requires = "client_cert")]
    client_key: Option<PathBuf>,

    /// PEM CA certificate used to verify both endpoints
    #[arg(long, env = "DHCP_SYNC_CA_CERT")]
    ca_cert: Option<PathBuf>,

    /// Build and print the plan without changing the secondary
    #[arg(long)]
    dry_run: bool,

    /// Print the plan as JSON
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// Show a diff of every reservation that would be replaced
    #[arg(long, requires = "dry_run", conflicts_with = "json")]
    show_diff: bool,

    /// Abort if an IP address is listed twice on one side
    #[arg(long)]
    strict: bool,

    /// Show detailed progress for each request
    #[arg(short, long)]
    verbose: bool,
}

pub fn run_with_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    sync::run_sync(SyncArgs {
        primary: cli.primary,
        secondary: cli.secondary,
        subnet: cli.subnet,
        scheme: cli.scheme,
        port: cli.port,
        client_cert: cli.client_cert,
        client_key: cli.client_key,
        ca_cert: cli.ca_cert,
        dry_run: cli.dry_run,
        json: cli.json,
        show_diff: cli.show_diff,
        strict: cli.strict,
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "dhcp_sync=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second call (tests driving the CLI in-process) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
