//! Dry-run rendering of a reconciliation plan.

use anyhow::{Context, Result};
use std::io::Write;

use crate::ReconciliationPlan;

pub(crate) fn write_plan<W: Write>(plan: &ReconciliationPlan, out: &mut W) -> Result<()> {
    if plan.is_empty() {
        writeln!(out, "No changes.")?;
        return Ok(());
    }

    writeln!(out, "Reservations to delete: {}", plan.deletes.len())?;
    for (ip, reservation) in &plan.deletes {
        writeln!(out, "  - {} ({})", ip, reservation.hostname)?;
    }

    writeln!(out, "Reservations to add: {}", plan.adds.len())?;
    for (ip, detail) in &plan.adds {
        let hostname = detail.hostname().unwrap_or("?");
        if plan.deletes.contains_key(ip) {
            writeln!(out, "  + {} ({}) replaces existing", ip, hostname)?;
        } else {
            writeln!(out, "  + {} ({})", ip, hostname)?;
        }
    }

    Ok(())
}

pub(crate) fn write_plan_json<W: Write>(plan: &ReconciliationPlan, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, plan).context("Failed to serialize plan")?;
    writeln!(out)?;
    Ok(())
}

/// Unified diff, secondary against primary, for every replaced reservation.
pub(crate) fn write_detail_diffs<W: Write>(plan: &ReconciliationPlan, out: &mut W) -> Result<()> {
    for (ip, current) in &plan.replaced {
        let Some(wanted) = plan.adds.get(ip) else {
            continue;
        };

        let before = pretty(current.fields())?;
        let after = pretty(wanted.fields())?;
        let diff = similar::TextDiff::from_lines(&before, &after);
        let unified = diff
            .unified_diff()
            .context_radius(3)
            .header(&format!("secondary/{ip}"), &format!("primary/{ip}"))
            .to_string();
        write!(out, "{}", unified)?;
    }
    Ok(())
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).context("Failed to render detail")?;
    text.push('\n');
    Ok(text)
}
