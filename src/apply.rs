use anyhow::{Context, Result};
use std::io::Write;
use tracing::info;

use crate::client::DhcpApi;
use crate::transform::prepare_for_write;
use crate::{ReconciliationPlan, SyncStats};

/// Apply a plan to the secondary, writing one report entry per call.
///
/// Every add is prepared before anything is sent, so a record that cannot be
/// written stops the run with the secondary untouched. Every delete runs
/// before the first add, so a changed reservation is always removed before it
/// is re-created. The first failed call aborts the run; calls already made are
/// not rolled back.
pub fn apply_plan<S, W>(
    secondary: &S,
    plan: ReconciliationPlan,
    report: &mut W,
) -> Result<SyncStats>
where
    S: DhcpApi + ?Sized,
    W: Write,
{
    let mut stats = SyncStats::default();

    let records = plan
        .adds
        .into_iter()
        .map(|(ip, detail)| {
            prepare_for_write(detail)
                .with_context(|| format!("Cannot prepare reservation for {ip}"))
                .map(|record| (ip, record))
        })
        .collect::<Result<Vec<_>>>()?;

    for (ip, reservation) in &plan.deletes {
        let response = secondary.delete_reservation(ip)?;
        writeln!(
            report,
            "Deleted reservation for {} ({}):\n{}",
            ip,
            reservation.hostname,
            response.trim_end()
        )
        .context("Failed to write report")?;
        stats.deleted += 1;
    }

    for (ip, record) in records {
        let hostname = record.hostname().unwrap_or_default().to_string();
        let response = secondary.create_reservation(&ip, &record)?;
        writeln!(
            report,
            "Added reservation for {} ({}):\n{}",
            ip,
            hostname,
            response.trim_end()
        )
        .context("Failed to write report")?;
        stats.added += 1;
    }

    info!(deleted = stats.deleted, added = stats.added, "plan applied");
    Ok(stats)
}
