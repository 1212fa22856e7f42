//! Address extraction from lookup responses and CIDR formatting

use netsync_core::IpExtractor;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr};

/// Pull the raw address string out of a response body
///
/// Returns a description of what was wrong when nothing usable is found.
pub fn extract_address(body: &str, extractor: &IpExtractor) -> Result<String, String> {
    match extractor {
        IpExtractor::JsonField(field) => {
            let json: Value =
                serde_json::from_str(body).map_err(|e| format!("invalid JSON body: {}", e))?;

            json.get(field)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| format!("missing '{}' field", field))
        }
        IpExtractor::PlainText => body
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| "empty body".to_string()),
    }
}

/// Format an IPv4 address as CIDR
///
/// A bare address gets `/32`. A value that already carries a prefix is
/// returned unchanged once both halves are checked. IPv6 is rejected: the
/// result feeds IPv4-only address sets.
pub fn to_cidr(raw: &str) -> Result<String, String> {
    if let Some((addr, prefix)) = raw.split_once('/') {
        let ip = parse_ipv4(addr)?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| format!("invalid prefix length: {}", prefix))?;
        if prefix > 32 {
            return Err(format!("prefix length {} out of range for {}", prefix, ip));
        }
        return Ok(raw.to_string());
    }

    Ok(format!("{}/32", parse_ipv4(raw)?))
}

fn parse_ipv4(raw: &str) -> Result<Ipv4Addr, String> {
    match raw.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => Ok(v4),
        Ok(IpAddr::V6(v6)) => Err(format!("not an IPv4 address: {}", v6)),
        Err(_) => Err(format!("invalid IP address: {}", raw)),
    }
}
