use std::process::Command;

fn dhcp_sync() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dhcp-sync"));
    cmd.env_remove("DHCP_SYNC_CLIENT_CERT")
        .env_remove("DHCP_SYNC_CLIENT_KEY")
        .env_remove("DHCP_SYNC_CA_CERT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_requires_three_positionals() {
    let output = dhcp_sync()
        .args(["dhcp1", "dhcp2"])
        .output()
        .expect("run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<SUBNET>"));
}

#[test]
fn test_cli_json_requires_dry_run() {
    let output = dhcp_sync()
        .args(["--json", "dhcp1", "dhcp2", "10.0.0.0"])
        .output()
        .expect("run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--dry-run"));
}

#[test]
fn test_cli_client_cert_requires_key() {
    let output = dhcp_sync()
        .args(["--client-cert", "host.pem", "dhcp1", "dhcp2", "10.0.0.0"])
        .output()
        .expect("run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--client-key"));
}

#[test]
fn test_cli_unreachable_primary_exits_non_zero() {
    let output = dhcp_sync()
        .args(["127.0.0.1:1", "127.0.0.1:1", "10.0.0.0"])
        .output()
        .expect("run binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Failed to fetch primary reservations"));
    assert!(stderr.contains("http://127.0.0.1:1/dhcp/10.0.0.0"));
}

#[test]
fn test_cli_missing_ca_file_is_reported() {
    let output = dhcp_sync()
        .args([
            "--scheme",
            "https",
            "--ca-cert",
            "/nonexistent/dhcp-sync/ca.pem",
            "dhcp1",
            "dhcp2",
            "10.0.0.0",
        ])
        .output()
        .expect("run binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to set up primary client"));
    assert!(stderr.contains("CA certificate"));
}
