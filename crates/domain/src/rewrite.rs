use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Answer kind of a legacy rewrite, derived from the answer text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteKind {
    A,
    Aaaa,
    Cname,
}

/// A locally-configured `domain → answer` record, independent of filter
/// lists.
///
/// Only `domain` and `answer` are persisted; `ip` and `kind` are re-derived
/// on load. The answer is an IPv4/IPv6 address, a canonical name, or one of
/// the literal exception markers `"A"` / `"AAAA"` which clear previously
/// matched answers of that type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RewriteEntry", into = "RewriteEntry")]
pub struct LegacyRewrite {
    /// Exact lowercased name, or a wildcard `*.suffix`.
    pub domain: String,

    pub answer: String,

    pub ip: Option<IpAddr>,

    pub kind: RewriteKind,
}

/// Wire form of a rewrite: exactly the two user-supplied fields.
#[derive(Debug, Serialize, Deserialize)]
struct RewriteEntry {
    domain: String,
    answer: String,
}

impl From<RewriteEntry> for LegacyRewrite {
    fn from(e: RewriteEntry) -> Self {
        LegacyRewrite::new(e.domain, e.answer)
    }
}

impl From<LegacyRewrite> for RewriteEntry {
    fn from(r: LegacyRewrite) -> Self {
        RewriteEntry {
            domain: r.domain,
            answer: r.answer,
        }
    }
}

impl LegacyRewrite {
    pub fn new(domain: impl Into<String>, answer: impl Into<String>) -> Self {
        let domain = domain.into().to_ascii_lowercase();
        let answer = answer.into();

        let (ip, kind) = match answer.as_str() {
            // Exception markers keep their type but carry no address.
            "A" => (None, RewriteKind::A),
            "AAAA" => (None, RewriteKind::Aaaa),
            other => match other.parse::<IpAddr>() {
                Ok(ip @ IpAddr::V4(_)) => (Some(ip), RewriteKind::A),
                Ok(ip @ IpAddr::V6(_)) => (Some(ip), RewriteKind::Aaaa),
                Err(_) => (None, RewriteKind::Cname),
            },
        };

        Self {
            domain,
            answer,
            ip,
            kind,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.domain.starts_with("*.")
    }

    pub fn is_cname(&self) -> bool {
        self.kind == RewriteKind::Cname
    }

    /// Exception marker (`"A"` / `"AAAA"` answer): matches its type but has
    /// no address, signalling pass-through upstream.
    pub fn is_exception(&self) -> bool {
        self.ip.is_none() && !self.is_cname()
    }

    /// Pattern match against a host: exact name, or any proper subdomain of
    /// a `*.suffix` wildcard.
    pub fn matches_host(&self, host: &str) -> bool {
        if self.is_wildcard() {
            host.ends_with(&self.domain[1..])
        } else {
            host == self.domain
        }
    }
}
