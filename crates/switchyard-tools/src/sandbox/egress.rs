//! Outbound target validation for HTTP tools

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use switchyard_core::{Error, Result};
use url::{Host, Url};

use super::transport::HostResolver;

/// Checked outbound target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Lower-cased host name or IP literal
    pub host: String,
    /// Addresses the name resolved to when it was checked; empty for IP
    /// literals and for names that failed to resolve
    pub addrs: Vec<IpAddr>,
}

/// Parse `url` and check it may be called
///
/// `allowed_hosts` is the effective allow-list; an empty list allows any
/// public host.
pub async fn validate_target(url: &str, allowed_hosts: &[String], resolver: &dyn HostResolver) -> Result<Target> {
    let parsed = Url::parse(url).map_err(|_| Error::InvalidParameter("HTTP tools require an absolute HTTPS URL".into()))?;
    let host = parsed
        .host()
        .ok_or_else(|| Error::InvalidParameter("HTTP tools require an absolute HTTPS URL".into()))?;
    if parsed.scheme() != "https" {
        return Err(Error::InvalidParameter("HTTP tools require an absolute HTTPS URL".into()));
    }

    let (host_name, addrs) = match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_lowercase();
            if is_local_name(&domain) {
                return Err(rejected_host(&domain, "is not allowed"));
            }
            let addrs = resolve_public(&domain, resolver).await?;
            (domain, addrs)
        }
        Host::Ipv4(ip) => {
            assert_public_ip(IpAddr::V4(ip))?;
            (ip.to_string(), Vec::new())
        }
        Host::Ipv6(ip) => {
            assert_public_ip(IpAddr::V6(ip))?;
            (ip.to_string(), Vec::new())
        }
    };

    if !allowed_hosts.is_empty() && !allowed_hosts.iter().any(|pattern| host_matches(&host_name, pattern)) {
        return Err(rejected_host(&host_name, "is not in allowed_hosts"));
    }

    Ok(Target { host: host_name, addrs })
}

/// Whether a host is public as written
///
/// Runs when a config is stored; names are not resolved here since
/// placeholders may still sit in the host.
pub fn is_public_literal(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => !is_local_name(&domain.trim_end_matches('.').to_lowercase()),
        Host::Ipv4(ip) => is_public_v4(*ip),
        Host::Ipv6(ip) => is_public(IpAddr::V6(*ip)),
    }
}

fn is_local_name(domain: &str) -> bool {
    domain == "localhost" || domain.ends_with(".localhost") || domain.ends_with(".local")
}

fn rejected_host(host: &str, reason: &str) -> Error {
    tracing::warn!(host = %host, reason, "http tool egress rejected");
    Error::Request(format!("HTTP tool target host '{host}' {reason}"))
}

/// Resolution failures are ignored; the call then fails on its own
async fn resolve_public(host: &str, resolver: &dyn HostResolver) -> Result<Vec<IpAddr>> {
    match resolver.resolve(host).await {
        Ok(addrs) => {
            addrs.iter().copied().try_for_each(assert_public_ip)?;
            Ok(addrs)
        }
        Err(e) => {
            tracing::debug!(host = %host, error = %e, "dns resolution failed during egress check");
            Ok(Vec::new())
        }
    }
}

fn assert_public_ip(ip: IpAddr) -> Result<()> {
    if is_public(ip) {
        Ok(())
    } else {
        tracing::warn!(ip = %ip, "http tool egress rejected");
        Err(Error::Request(format!("HTTP tool target IP '{ip}' is not allowed")))
    }
}

pub fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or_else(|| is_public_v6(v6), is_public_v4),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    let this_network = a == 0;
    let shared = a == 100 && (b & 0xc0) == 64;
    let ietf_protocol = a == 192 && b == 0 && c == 0;
    let benchmarking = a == 198 && (b & 0xfe) == 18;
    let reserved = a >= 240;

    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || this_network
        || shared
        || ietf_protocol
        || benchmarking
        || reserved)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    let site_local = (first & 0xffc0) == 0xfec0;
    let documentation = first == 0x2001 && ip.segments()[1] == 0x0db8;
    // ::/8 holds the unspecified, loopback and IPv4-compatible ranges
    let reserved = (first & 0xff00) == 0;

    !(ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || unique_local
        || link_local
        || site_local
        || documentation
        || reserved)
}

/// `*.suffix` matches any subdomain; other patterns match exactly
pub fn host_matches(host: &str, pattern: &str) -> bool {
    pattern
        .strip_prefix('*')
        .filter(|suffix| suffix.starts_with('.'))
        .map_or_else(|| host == pattern, |suffix| host.ends_with(suffix))
}
