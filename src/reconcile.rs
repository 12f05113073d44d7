//! Diffing of primary and secondary reservation snapshots.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::{debug, info, warn};

use crate::client::DhcpApi;
use crate::{LeaseDetail, ReconciliationPlan, Reservation, Side, SyncError, SyncOptions};

/// Key reservations by IP.
///
/// A repeated IP keeps the last record seen. That points at broken data
/// upstream, so it is logged, or rejected when `options.strict` is set.
pub fn index_by_ip(
    reservations: Vec<Reservation>,
    side: Side,
    options: &SyncOptions,
) -> Result<BTreeMap<IpAddr, Reservation>> {
    let mut keyed = BTreeMap::new();

    for reservation in reservations {
        let ip = reservation.ip;
        if let Some(previous) = keyed.insert(ip, reservation) {
            if options.strict {
                return Err(SyncError::DuplicateReservation {
                    ip: ip.to_string(),
                    side,
                }
                .into());
            }
            warn!(
                %ip,
                %side,
                dropped_hostname = %previous.hostname,
                "duplicate reservation in list, keeping the last one"
            );
        }
    }

    Ok(keyed)
}

/// Compute what must be deleted from and added to the secondary so that it
/// matches the primary.
///
/// Every primary reservation's detail is fetched from the primary. For IPs
/// that also exist on the secondary the secondary's detail is fetched too and
/// compared as a whole; any difference becomes a delete plus a re-add.
pub fn build_plan<P, S>(
    primary: &P,
    secondary: &S,
    options: &SyncOptions,
) -> Result<ReconciliationPlan>
where
    P: DhcpApi + ?Sized,
    S: DhcpApi + ?Sized,
{
    let primary_list = primary
        .list_reservations()
        .context("Failed to fetch primary reservations")?;
    let secondary_list = secondary
        .list_reservations()
        .context("Failed to fetch secondary reservations")?;

    let keyed_primary = index_by_ip(primary_list, Side::Primary, options)?;
    let mut keyed_secondary = index_by_ip(secondary_list, Side::Secondary, options)?;

    let mut plan = ReconciliationPlan::default();

    let stale: Vec<IpAddr> = keyed_secondary
        .keys()
        .filter(|ip| !keyed_primary.contains_key(*ip))
        .copied()
        .collect();
    for ip in stale {
        if let Some(reservation) = keyed_secondary.remove(&ip) {
            debug!(%ip, hostname = %reservation.hostname, "only on secondary");
            plan.deletes.insert(ip, reservation);
        }
    }

    for ip in keyed_primary.keys() {
        let primary_detail = primary
            .lease_detail(ip)
            .with_context(|| format!("Failed to fetch primary detail for {ip}"))?;
        require_hostname(&primary_detail)
            .with_context(|| format!("Primary detail for {ip} cannot be written back"))?;

        let Some(existing) = keyed_secondary.remove(ip) else {
            debug!(%ip, "only on primary");
            plan.adds.insert(*ip, primary_detail);
            continue;
        };

        let secondary_detail = secondary
            .lease_detail(ip)
            .with_context(|| format!("Failed to fetch secondary detail for {ip}"))?;

        if primary_detail == secondary_detail {
            continue;
        }

        debug!(%ip, "detail differs");
        plan.deletes.insert(*ip, existing);
        plan.adds.insert(*ip, primary_detail);
        plan.replaced.insert(*ip, secondary_detail);
    }

    info!(
        primary = keyed_primary.len(),
        deletes = plan.deletes.len(),
        adds = plan.adds.len(),
        updates = plan.replaced.len(),
        "reconciliation plan built"
    );

    Ok(plan)
}

/// A detail queued for addition must be writable, otherwise the deletes
/// applied ahead of it would leave the secondary without the reservation.
fn require_hostname(detail: &LeaseDetail) -> Result<()> {
    if detail.contains_key("hostname") {
        return Ok(());
    }
    Err(SyncError::MissingField {
        field: "hostname",
        record: Value::Object(detail.fields().clone()).to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn reservation(ip: &str, hostname: &str) -> Reservation {
        Reservation {
            ip: ip.parse().unwrap(),
            hostname: hostname.to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn index_orders_by_address() {
        let keyed = index_by_ip(
            vec![reservation("10.0.0.10", "b"), reservation("10.0.0.9", "a")],
            Side::Primary,
            &SyncOptions::default(),
        )
        .unwrap();

        let ips: Vec<String> = keyed.keys().map(|ip| ip.to_string()).collect();
        assert_eq!(ips, vec!["10.0.0.9", "10.0.0.10"]);
    }

    #[test]
    fn duplicate_ip_keeps_last_record() {
        let keyed = index_by_ip(
            vec![reservation("10.0.0.5", "first"), reservation("10.0.0.5", "second")],
            Side::Secondary,
            &SyncOptions::default(),
        )
        .unwrap();

        assert_eq!(keyed.len(), 1);
        assert_eq!(keyed.values().next().unwrap().hostname, "second");
    }

    #[test]
    fn duplicate_ip_is_fatal_when_strict() {
        let options = SyncOptions { strict: true };
        let err = index_by_ip(
            vec![reservation("10.0.0.5", "first"), reservation("10.0.0.5", "second")],
            Side::Primary,
            &options,
        )
        .unwrap_err();

        assert!(err
            .to_string()
            .contains("10.0.0.5 appears more than once in the primary"));
    }
}
