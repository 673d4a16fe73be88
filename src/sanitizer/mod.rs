use regex_lite::Regex;

use crate::error::ProvisionError;
use crate::models::port_names::{CONTAINER_MANAGEMENT, MANAGEMENT_SPELLINGS};
use crate::models::{RawDevice, SanitizedDevice};

/// Marker prepended to global commands the container platform rejects
pub const REMOVED_MARKER: &str = "!removed_for_cEOS-lab| ";

/// Marker prepended to every line of an excised breakout stanza
pub const BLOCK_MARKER: &str = "!";

/// Line that closes a configuration section
pub const SECTION_TERMINATOR: &str = "!";

/// File the container reads its system MAC address from on boot
pub const SYSTEM_MAC_FILE: &str = "/mnt/flash/system_mac_address";

/// Global-config commands that are commented out for the lab.
/// Matched against the start of the line.
const SUPPRESSED_PREFIXES: &[&str] = &[
    "radius",
    "username",
    "aaa",
    "ip radius",
    "hardware speed",
    "queue",
    "server ",
    "ntp server",
    "daemon TerminAttr",
    "   exec /usr/bin/TerminAttr",
];

/// Captures the full `N[/M[/L]]` interface path
const INTERFACE_HEADER: &str = r"^interface Ethernet(\d+(?:/\d+)*)";

/// Breakout sub-ports with no counterpart on the container image
const BREAKOUT_SUBPORTS: &[u32] = &[2, 3, 4];

/// Convert a collected device into one whose configuration boots on the
/// container image.
///
/// An empty configuration has no terminator to re-append after the MAC
/// snippet and is rejected as `MalformedConfig`.
pub fn sanitize(raw: RawDevice) -> Result<SanitizedDevice, ProvisionError> {
    let (mut config, ethernet_interface_count) = sanitize_lines(raw.config);
    inject_system_mac(&mut config, &raw.facts.system_mac)?;

    Ok(SanitizedDevice {
        name: raw.name,
        lldp_system_name: raw.lldp_system_name,
        facts: raw.facts,
        ethernet_interface_count,
        config,
    })
}

/// Rewrite configuration lines in one pass and count the Ethernet
/// interfaces the container needs. Total: an empty input yields an empty
/// output and a count of 0.
pub fn sanitize_lines(lines: Vec<String>) -> (Vec<String>, usize) {
    let ethernet_interface_count = count_ethernet_interfaces(&lines);
    let header_re = Regex::new(INTERFACE_HEADER).ok();

    let mut in_removed_block = false;
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let line = remap_management(&line);

        if in_removed_block {
            if line == SECTION_TERMINATOR {
                in_removed_block = false;
            }
            out.push(format!("{}{}", BLOCK_MARKER, line));
            continue;
        }

        if is_suppressed(&line) {
            out.push(format!("{}{}", REMOVED_MARKER, line));
            continue;
        }

        if is_breakout_subport(&line, header_re.as_ref()) {
            in_removed_block = true;
            out.push(format!("{}{}", BLOCK_MARKER, line));
            continue;
        }

        if header_re.as_ref().is_some_and(|re| re.is_match(&line)) {
            // interface EthernetN/M -> interface EthernetN
            let parent = line.split('/').next().unwrap_or(&line).to_string();
            out.push(parent);
            continue;
        }

        out.push(line);
    }

    (out, ethernet_interface_count)
}

/// Count `interface Ethernet<N>` headers that are not breakout sub-ports
pub fn count_ethernet_interfaces(lines: &[String]) -> usize {
    let header_re = Regex::new(INTERFACE_HEADER).ok();
    lines
        .iter()
        .filter(|line| header_re.as_ref().is_some_and(|re| re.is_match(line)))
        .filter(|line| !is_breakout_subport(line, header_re.as_ref()))
        .count()
}

/// Insert the boot-time event handler that restores the original switch's
/// system MAC, keeping the final terminator line last
pub fn inject_system_mac(config: &mut Vec<String>, system_mac: &str) -> Result<(), ProvisionError> {
    let terminator = config
        .pop()
        .ok_or_else(|| ProvisionError::MalformedConfig("configuration is empty".to_string()))?;

    config.extend(system_mac_snippet(system_mac));
    config.push(terminator);
    Ok(())
}

fn system_mac_snippet(system_mac: &str) -> [String; 7] {
    [
        "event-handler onStartup".to_string(),
        " trigger on-boot".to_string(),
        " action bash".to_string(),
        format!("      var_sysmac='{}'", system_mac),
        format!("  echo $var_sysmac > {}", SYSTEM_MAC_FILE),
        format!("  truncate -s -1 {}", SYSTEM_MAC_FILE),
        "  EOF".to_string(),
    ]
}

/// Both historical spellings are rewritten in turn; the second pass is a
/// no-op once the first has matched
fn remap_management(line: &str) -> String {
    MANAGEMENT_SPELLINGS
        .iter()
        .fold(line.to_string(), |acc, spelling| {
            acc.replace(spelling, CONTAINER_MANAGEMENT)
        })
}

fn is_suppressed(line: &str) -> bool {
    SUPPRESSED_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Any segment after the slot naming sub-port 2, 3 or 4 marks a breakout,
/// on both `N/M` and modular `N/M/L` names
fn is_breakout_subport(line: &str, header_re: Option<&Regex>) -> bool {
    header_re
        .and_then(|re| re.captures(line))
        .and_then(|caps| caps.get(1))
        .is_some_and(|path| {
            path.as_str()
                .split('/')
                .skip(1)
                .filter_map(|sub| sub.parse::<u32>().ok())
                .any(|sub| BREAKOUT_SUBPORTS.contains(&sub))
        })
}
