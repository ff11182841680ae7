// Hardware id of the machine running the CLI

use keylock_core::sha256_hex;
use std::env;

/// Number of hex characters in a hardware id.
const HWID_LEN: usize = 32;

/// Computes this machine's hardware id.
///
/// Stable across reboots; changes when the OS install, hostname or machine id
/// changes.
pub fn machine_hwid() -> String {
    hwid_from_components(&collect_hardware_ids())
}

/// Hashes identifying components into a hardware id.
pub fn hwid_from_components(components: &[String]) -> String {
    let mut digest = sha256_hex(components.join("|").as_bytes());
    digest.truncate(HWID_LEN);
    digest
}

fn collect_hardware_ids() -> Vec<String> {
    let mut ids = vec![env::consts::OS.to_string(), env::consts::ARCH.to_string()];

    ids.push(
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string()),
    );

    if let Some(machine_id) = machine_id() {
        ids.push(machine_id);
    }

    ids
}

#[cfg(target_os = "linux")]
fn machine_id() -> Option<String> {
    ["/etc/machine-id", "/var/lib/dbus/machine-id"]
        .iter()
        .find_map(|path| std::fs::read_to_string(path).ok())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

#[cfg(target_os = "macos")]
fn machine_id() -> Option<String> {
    let output = std::process::Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
        .ok()?;
    String::from_utf8(output.stdout)
        .ok()?
        .lines()
        .find(|line| line.contains("IOPlatformUUID"))
        .and_then(|line| line.split('"').nth(3))
        .map(str::to_string)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn machine_id() -> Option<String> {
    None
}
