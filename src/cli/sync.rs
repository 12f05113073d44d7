use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::{apply_plan, build_plan, EndpointConfig, HttpDhcpClient, SyncOptions, TlsConfig};

use super::plan::{write_detail_diffs, write_plan, write_plan_json};
use super::SyncArgs;

pub(crate) fn run_sync(args: SyncArgs) -> Result<()> {
    let tls = TlsConfig {
        client_cert: args.client_cert,
        client_key: args.client_key,
        ca_cert: args.ca_cert,
    };
    let endpoint = |host: String| EndpointConfig {
        scheme: args.scheme,
        host,
        port: args.port,
        subnet: args.subnet.clone(),
        tls: tls.clone(),
    };

    let primary = HttpDhcpClient::new(endpoint(args.primary))
        .context("Failed to set up primary client")?;
    let secondary = HttpDhcpClient::new(endpoint(args.secondary))
        .context("Failed to set up secondary client")?;

    let options = SyncOptions {
        strict: args.strict,
    };
    let plan = build_plan(&primary, &secondary, &options)?;

    if args.dry_run {
        let mut out = io::stdout().lock();
        if args.json {
            write_plan_json(&plan, &mut out)?;
        } else {
            write_plan(&plan, &mut out)?;
            if args.show_diff {
                write_detail_diffs(&plan, &mut out)?;
            }
        }
        out.flush()?;
        return Ok(());
    }

    let mut report = io::stderr().lock();
    let stats = apply_plan(&secondary, plan, &mut report).with_context(|| {
        format!(
            "Sync of {} stopped after a failed call",
            secondary.config().base_url()
        )
    })?;

    writeln!(
        report,
        "Reservations deleted: {}, added: {}",
        stats.deleted, stats.added
    )?;
    Ok(())
}
