use super::dnsrewrite::DnsRewrite;
use super::rule::{ClientConstraint, DnsTypeConstraint, HostRule, NetworkRule, Pattern};
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::Arc;

/// Outcome of parsing one rule line.
#[derive(Debug)]
pub enum ParsedLine {
    Network(NetworkRule),
    /// A hosts-style line can name several hostnames after the address.
    Hosts(Vec<HostRule>),
}

fn is_domain_token(s: &str) -> bool {
    !s.is_empty()
        && s.contains('.')
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
}

/// Self-referential hosts entries carry no filtering meaning.
fn is_ignored_hostname(name: &str) -> bool {
    matches!(
        name,
        "localhost" | "localhost.localdomain" | "broadcasthost" | "ip6-localhost" | "ip6-loopback"
    )
}

fn parse_pattern(text: &str) -> Option<Pattern> {
    let lower = text.to_ascii_lowercase();

    if let Some(rest) = lower.strip_prefix("||") {
        let domain = rest.strip_suffix('^').unwrap_or(rest);
        if domain.is_empty() {
            return None;
        }
        return Some(Pattern::DomainAnchor(domain.to_string()));
    }

    if let Some(rest) = lower.strip_prefix('|') {
        let host = rest.strip_suffix('^').unwrap_or(rest);
        if host.is_empty() {
            return None;
        }
        return Some(Pattern::ExactHost(host.to_string()));
    }

    // `*.domain` and `/pattern/` forms, then bare tokens.
    if let Some(rest) = lower.strip_prefix("*.") {
        if is_domain_token(rest) {
            return Some(Pattern::DomainAnchor(rest.to_string()));
        }
    }
    if lower.len() > 2 && lower.starts_with('/') && lower.ends_with('/') {
        return Some(Pattern::Substring(lower[1..lower.len() - 1].to_string()));
    }

    let bare = lower.strip_suffix('^').unwrap_or(&lower);
    if is_domain_token(bare) {
        return Some(Pattern::Plain(bare.to_string()));
    }

    let trimmed = lower.trim_matches('*');
    if trimmed.is_empty() {
        return None;
    }
    Some(Pattern::Substring(trimmed.to_string()))
}

fn parse_record_type(s: &str) -> Option<RecordType> {
    s.to_ascii_uppercase().parse().ok()
}

#[derive(Default)]
struct Modifiers {
    important: bool,
    dns_types: Option<DnsTypeConstraint>,
    clients: Option<ClientConstraint>,
    ctags: Option<ClientConstraint>,
    deny_allow: Vec<String>,
    dns_rewrite: Option<DnsRewrite>,
}

/// Parse the `$`-suffix of a network rule. Any unknown or malformed
/// modifier invalidates the whole line.
fn parse_modifiers(text: &str) -> Option<Modifiers> {
    let mut m = Modifiers::default();

    for part in text.split(',') {
        let (name, value) = match part.split_once('=') {
            Some((n, v)) => (n, Some(v)),
            None => (part, None),
        };

        match (name, value) {
            ("important", None) => m.important = true,
            ("dnstype", Some(v)) => {
                let mut constraint = DnsTypeConstraint::default();
                for entry in v.split('|') {
                    if let Some(neg) = entry.strip_prefix('~') {
                        constraint.negated.push(parse_record_type(neg)?);
                    } else {
                        constraint.allowed.push(parse_record_type(entry)?);
                    }
                }
                m.dns_types = Some(constraint);
            }
            ("client", Some(v)) => m.clients = Some(parse_client_list(v)),
            ("ctag", Some(v)) => m.ctags = Some(parse_client_list(v)),
            ("denyallow", Some(v)) => {
                m.deny_allow = v.split('|').map(|d| d.to_ascii_lowercase()).collect();
            }
            ("dnsrewrite", Some(v)) => m.dns_rewrite = Some(DnsRewrite::parse(v)?),
            ("dnsrewrite", None) => {
                // Bare `$dnsrewrite`: meaningful only on whitelist rules,
                // where it cancels every other rewrite for the host.
                m.dns_rewrite = Some(DnsRewrite::parse("")?);
            }
            _ => return None,
        }
    }

    Some(m)
}

fn parse_client_list(v: &str) -> ClientConstraint {
    let mut c = ClientConstraint::default();
    for entry in v.split('|') {
        let entry = entry.trim_matches('"');
        if let Some(neg) = entry.strip_prefix('~') {
            c.negated.push(neg.to_string());
        } else {
            c.allowed.push(entry.to_string());
        }
    }
    c
}

/// Parse one line of filter-list text into a matcher-ready rule.
///
/// Comments (`!`, `#`) and anything unintelligible yield `None`; the
/// storage builder just skips those lines.
pub fn parse_rule_line(line: &str, filter_list_id: i32) -> Option<ParsedLine> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('!') || line.starts_with('#') {
        return None;
    }

    // hosts file format: "addr name [name…]"
    let mut parts = line.split_whitespace();
    let first = parts.next()?;
    if let Ok(ip) = first.parse::<IpAddr>() {
        let rules: Vec<HostRule> = parts
            .take_while(|t| !t.starts_with('#'))
            .filter(|name| !is_ignored_hostname(name))
            .map(|name| HostRule {
                text: Arc::from(format!("{ip} {name}")),
                filter_list_id,
                hostname: name.to_ascii_lowercase(),
                ip,
            })
            .collect();
        if rules.is_empty() {
            return None;
        }
        return Some(ParsedLine::Hosts(rules));
    }

    if line.contains(char::is_whitespace) {
        return None;
    }

    let text: Arc<str> = Arc::from(line);
    let (mut body, options) = match line.rsplit_once('$') {
        Some((b, o)) if !b.is_empty() => (b, Some(o)),
        _ => (line, None),
    };

    let whitelist = match body.strip_prefix("@@") {
        Some(rest) => {
            body = rest;
            true
        }
        None => false,
    };

    let modifiers = match options {
        Some(o) => parse_modifiers(o)?,
        None => Modifiers::default(),
    };

    let pattern = parse_pattern(body)?;

    Some(ParsedLine::Network(NetworkRule {
        text,
        filter_list_id,
        pattern,
        whitelist,
        important: modifiers.important,
        dns_types: modifiers.dns_types,
        clients: modifiers.clients,
        ctags: modifiers.ctags,
        deny_allow: modifiers.deny_allow,
        dns_rewrite: modifiers.dns_rewrite,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(line: &str) -> NetworkRule {
        match parse_rule_line(line, 1) {
            Some(ParsedLine::Network(r)) => r,
            other => panic!("expected network rule for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_skip_comments_and_blank() {
        assert!(parse_rule_line("", 1).is_none());
        assert!(parse_rule_line("   ", 1).is_none());
        assert!(parse_rule_line("! comment", 1).is_none());
        assert!(parse_rule_line("# comment", 1).is_none());
    }

    #[test]
    fn test_parse_domain_anchor() {
        let r = network("||doubleclick.net^");
        assert_eq!(r.pattern, Pattern::DomainAnchor("doubleclick.net".into()));
        assert!(!r.whitelist);
        assert_eq!(&*r.text, "||doubleclick.net^");
    }

    #[test]
    fn test_parse_whitelist_rule() {
        let r = network("@@||test.example.org");
        assert!(r.whitelist);
        assert_eq!(r.pattern, Pattern::DomainAnchor("test.example.org".into()));
    }

    #[test]
    fn test_parse_exact_host() {
        let r = network("|refused^");
        assert_eq!(r.pattern, Pattern::ExactHost("refused".into()));
    }

    #[test]
    fn test_parse_plain_domain() {
        let r = network("Ads.Example.COM");
        assert_eq!(r.pattern, Pattern::Plain("ads.example.com".into()));
    }

    #[test]
    fn test_parse_wildcard_prefix() {
        let r = network("*.ads.example");
        assert_eq!(r.pattern, Pattern::DomainAnchor("ads.example".into()));
    }

    #[test]
    fn test_parse_slash_pattern() {
        let r = network("/tracker/");
        assert_eq!(r.pattern, Pattern::Substring("tracker".into()));
    }

    #[test]
    fn test_parse_important_modifier() {
        let r = network("||test.example.org^$important");
        assert!(r.important);
    }

    #[test]
    fn test_parse_dnstype_modifier() {
        let r = network("||example.org^$dnstype=A|~AAAA");
        let types = r.dns_types.unwrap();
        assert_eq!(types.allowed, vec![RecordType::A]);
        assert_eq!(types.negated, vec![RecordType::AAAA]);
    }

    #[test]
    fn test_parse_dnsrewrite_modifier() {
        let r = network("|a-records^$dnsrewrite=127.0.0.1");
        assert!(r.dns_rewrite.is_some());
    }

    #[test]
    fn test_unknown_modifier_rejects_line() {
        assert!(parse_rule_line("||example.org^$frobnicate", 1).is_none());
    }

    #[test]
    fn test_parse_hosts_line() {
        let rules = match parse_rule_line("0.0.0.0 Tracker.Evil.example second.example", 1) {
            Some(ParsedLine::Hosts(r)) => r,
            other => panic!("expected hosts rules, got {other:?}"),
        };
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].hostname, "tracker.evil.example");
        assert_eq!(&*rules[0].text, "0.0.0.0 Tracker.Evil.example");
        assert_eq!(rules[1].hostname, "second.example");
    }

    #[test]
    fn test_hosts_line_skips_self_referential() {
        assert!(parse_rule_line("127.0.0.1 localhost", 1).is_none());
        assert!(parse_rule_line("::1 ip6-localhost ip6-loopback", 1).is_none());
    }

    #[test]
    fn test_hosts_line_inline_comment() {
        let rules = match parse_rule_line("0.0.0.0 ads.example # blocked", 1) {
            Some(ParsedLine::Hosts(r)) => r,
            other => panic!("expected hosts rules, got {other:?}"),
        };
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_denyallow_modifier() {
        let r = network("||example.org^$denyallow=safe.example.org");
        assert_eq!(r.deny_allow, vec!["safe.example.org".to_string()]);
    }
}
