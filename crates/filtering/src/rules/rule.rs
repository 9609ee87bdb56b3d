use super::dnsrewrite::DnsRewrite;
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::Arc;

/// Request view handed to the rule engine for one match.
#[derive(Debug, Clone, Copy)]
pub struct RuleQuery<'a> {
    pub host: &'a str,
    pub qtype: RecordType,
    pub client_ip: Option<IpAddr>,
    pub client_name: Option<&'a str>,
    pub client_tags: &'a [String],
}

impl<'a> RuleQuery<'a> {
    /// A query carrying nothing but the hostname, used by matchers that
    /// ignore type and client constraints.
    pub fn hostname_only(host: &'a str) -> Self {
        Self {
            host,
            qtype: RecordType::A,
            client_ip: None,
            client_name: None,
            client_tags: &[],
        }
    }
}

/// How a network rule's pattern binds to the queried hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `||example.org^`: the domain itself and any subdomain.
    DomainAnchor(String),
    /// `|example.org^`: the exact hostname.
    ExactHost(String),
    /// Bare domain-shaped token: same as a domain anchor.
    Plain(String),
    /// Anything else: substring of the hostname.
    Substring(String),
}

impl Pattern {
    /// Domain the suffix index files this rule under; substring patterns
    /// are scanned instead.
    pub fn domain_key(&self) -> Option<&str> {
        match self {
            Pattern::DomainAnchor(d) | Pattern::ExactHost(d) | Pattern::Plain(d) => Some(d),
            Pattern::Substring(_) => None,
        }
    }

    pub fn matches_host(&self, host: &str) -> bool {
        match self {
            Pattern::DomainAnchor(d) | Pattern::Plain(d) => {
                host == d || (host.len() > d.len() && host.ends_with(d) && host.as_bytes()[host.len() - d.len() - 1] == b'.')
            }
            Pattern::ExactHost(d) => host == d,
            Pattern::Substring(s) => host.contains(s.as_str()),
        }
    }
}

/// `$dnstype=` constraint: positive list and/or `~`-negated list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsTypeConstraint {
    pub allowed: Vec<RecordType>,
    pub negated: Vec<RecordType>,
}

impl DnsTypeConstraint {
    pub fn permits(&self, qtype: RecordType) -> bool {
        if self.negated.contains(&qtype) {
            return false;
        }
        self.allowed.is_empty() || self.allowed.contains(&qtype)
    }
}

/// `$client=` / `$ctag=` style constraint: match any positive entry, unless
/// a negated entry matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConstraint {
    pub allowed: Vec<String>,
    pub negated: Vec<String>,
}

impl ClientConstraint {
    fn matches_entry(entry: &str, q: &RuleQuery<'_>) -> bool {
        if Some(entry) == q.client_name {
            return true;
        }
        match (entry.parse::<IpAddr>(), q.client_ip) {
            (Ok(ip), Some(client)) => ip == client,
            _ => false,
        }
    }

    pub fn permits(&self, q: &RuleQuery<'_>) -> bool {
        if self.negated.iter().any(|e| Self::matches_entry(e, q)) {
            return false;
        }
        self.allowed.is_empty() || self.allowed.iter().any(|e| Self::matches_entry(e, q))
    }

    pub fn permits_tags(&self, tags: &[String]) -> bool {
        if self.negated.iter().any(|e| tags.iter().any(|t| t == e)) {
            return false;
        }
        self.allowed.is_empty() || self.allowed.iter().any(|e| tags.iter().any(|t| t == e))
    }
}

/// An Adblock-style network rule, possibly carrying modifiers.
#[derive(Debug, Clone)]
pub struct NetworkRule {
    pub text: Arc<str>,
    pub filter_list_id: i32,
    pub pattern: Pattern,
    pub whitelist: bool,
    pub important: bool,
    pub dns_types: Option<DnsTypeConstraint>,
    pub clients: Option<ClientConstraint>,
    pub ctags: Option<ClientConstraint>,
    /// `$denyallow=` domains the rule must not apply to.
    pub deny_allow: Vec<String>,
    pub dns_rewrite: Option<DnsRewrite>,
}

impl NetworkRule {
    /// Pattern-only match, ignoring modifiers. Used for blocked-service
    /// rules which are matched against a hostname-only request.
    pub fn matches_hostname(&self, host: &str) -> bool {
        self.pattern.matches_host(host)
    }

    /// Full match including `$dnstype`, `$client`, `$ctag` and
    /// `$denyallow` constraints.
    pub fn matches_query(&self, q: &RuleQuery<'_>) -> bool {
        if !self.pattern.matches_host(q.host) {
            return false;
        }
        if let Some(types) = &self.dns_types {
            if !types.permits(q.qtype) {
                return false;
            }
        }
        if let Some(clients) = &self.clients {
            if !clients.permits(q) {
                return false;
            }
        }
        if let Some(ctags) = &self.ctags {
            if !ctags.permits_tags(q.client_tags) {
                return false;
            }
        }
        for domain in &self.deny_allow {
            if q.host == domain
                || (q.host.len() > domain.len()
                    && q.host.ends_with(domain)
                    && q.host.as_bytes()[q.host.len() - domain.len() - 1] == b'.')
            {
                return false;
            }
        }
        true
    }

    /// Precedence score: `$important` beats whitelist beats plain rules;
    /// an important whitelist rule beats them all.
    pub fn priority(&self) -> u8 {
        (u8::from(self.important) << 1) | u8::from(self.whitelist)
    }
}

/// An `/etc/hosts`-style rule: `IP hostname`. Matches the exact hostname.
#[derive(Debug, Clone)]
pub struct HostRule {
    pub text: Arc<str>,
    pub filter_list_id: i32,
    pub hostname: String,
    pub ip: IpAddr,
}
