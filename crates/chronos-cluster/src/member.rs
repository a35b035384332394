//! Member registry — parses the configured cluster URL into members.
//!
//! A cluster URL is a single base URL whose authority may carry several
//! comma-separated `host:port` entries, all sharing one scheme:
//!
//! ```text
//! http://chronos-1:4400,chronos-2:4400,chronos-3:4400
//! ```

use std::fmt;

use tracing::debug;

use crate::error::{ClusterError, ClusterResult};

/// Scheme shared by every member of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    fn parse(scheme: &str) -> ClusterResult<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(ClusterError::Configuration(format!(
                "cluster url scheme {other} is not supported"
            ))),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate service host behind the cluster URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    host: String,
    active: bool,
}

impl Member {
    fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            active: true,
        }
    }

    /// Network address (`host[:port]`) of this member.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether this member is currently eligible for selection.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// The fixed member set parsed from a cluster URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRegistry {
    protocol: Protocol,
    members: Vec<Member>,
}

impl MemberRegistry {
    /// Parse a cluster URL into one active member per host token.
    pub fn parse(url: &str) -> ClusterResult<Self> {
        let url = url.trim();
        let (scheme, rest) = url.split_once("://").ok_or_else(|| {
            ClusterError::Configuration(format!("cluster url {url:?} has no scheme"))
        })?;

        if !is_valid_scheme(scheme) {
            return Err(ClusterError::Configuration(format!(
                "cluster url {url:?} has a malformed scheme"
            )));
        }
        let protocol = Protocol::parse(scheme)?;

        let authority = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        // Credentials belong to the request layer, never to member hosts.
        let hosts = match authority.rsplit_once('@') {
            Some((_, hosts)) => hosts,
            None => authority,
        };

        let members = hosts
            .split(',')
            .map(|token| validate_host(token).map(|_| Member::new(token)))
            .collect::<ClusterResult<Vec<_>>>()?;

        debug!(%protocol, count = members.len(), "parsed cluster members");
        Ok(Self { protocol, members })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Protocol, Vec<Member>) {
        (self.protocol, self.members)
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Check a single `host[:port]` token.
fn validate_host(token: &str) -> ClusterResult<()> {
    let invalid = |reason: &str| {
        Err(ClusterError::Configuration(format!(
            "cluster member {token:?} {reason}"
        )))
    };

    if token.is_empty() {
        return invalid("is empty");
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return invalid("contains whitespace");
    }

    // Bracketed IPv6 literal: `[::1]` or `[::1]:8080`.
    let (host, port) = if let Some(rest) = token.strip_prefix('[') {
        match rest.split_once(']') {
            Some((addr, tail)) if !addr.is_empty() => match tail {
                "" => (addr, None),
                tail => match tail.strip_prefix(':') {
                    Some(port) => (addr, Some(port)),
                    None => return invalid("has trailing characters after the address"),
                },
            },
            _ => return invalid("has an unterminated IPv6 literal"),
        }
    } else {
        match token.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (token, None),
        }
    };

    if host.is_empty() {
        return invalid("has no host");
    }
    if let Some(port) = port {
        if port.parse::<u16>().is_err() {
            return invalid("has an invalid port");
        }
    }
    Ok(())
}
