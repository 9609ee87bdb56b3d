use crate::result::{FilterReason, FilterResult};
use dnswarden_domain::{LegacyRewrite, RewriteKind};
use hickory_proto::rr::RecordType;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use tracing::{debug, warn};

fn kind_matches_qtype(kind: RewriteKind, qtype: RecordType) -> bool {
    match kind {
        // CNAME records participate in every chain regardless of qtype.
        RewriteKind::Cname => true,
        RewriteKind::A => qtype == RecordType::A,
        RewriteKind::Aaaa => qtype == RecordType::AAAA,
    }
}

/// Comparator for matched rewrite records: CNAME first, wildcards before
/// exact patterns, longer (more specific) wildcards first. Stable.
fn rewrite_order(a: &LegacyRewrite, b: &LegacyRewrite) -> Ordering {
    if a.is_cname() != b.is_cname() {
        return if a.is_cname() {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }
    if a.is_wildcard() != b.is_wildcard() {
        return if a.is_wildcard() {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }
    if a.is_wildcard() {
        return b.domain.len().cmp(&a.domain.len());
    }
    Ordering::Equal
}

/// Collect, order and truncate the records applying to `(host, qtype)`.
///
/// Once an exact-pattern record appears, later wildcard records are
/// shadowed by it and dropped.
fn find_rewrites(all: &[LegacyRewrite], host: &str, qtype: RecordType) -> Vec<LegacyRewrite> {
    let mut matched: Vec<LegacyRewrite> = all
        .iter()
        .filter(|r| r.matches_host(host) && kind_matches_qtype(r.kind, qtype))
        .cloned()
        .collect();

    matched.sort_by(rewrite_order);

    let mut seen_exact = false;
    matched.retain(|r| {
        if seen_exact && r.is_wildcard() {
            return false;
        }
        if !r.is_wildcard() {
            seen_exact = true;
        }
        true
    });

    matched
}

/// Resolve the legacy rewrites for `host`.
///
/// Returns `None` when no record matches or the chain ends in an exception
/// (identity or own-pattern answer), letting the pipeline continue. A loop
/// stops resolution and keeps the last known canonical name.
pub fn resolve(host: &str, qtype: RecordType, all: &[LegacyRewrite]) -> Option<FilterResult> {
    let mut matched = find_rewrites(all, host, qtype);
    if matched.is_empty() {
        return None;
    }

    let orig_host = host;
    let mut host = host.to_string();
    let mut visited: FxHashSet<String> = FxHashSet::default();
    visited.insert(host.clone());

    let mut res = FilterResult {
        reason: FilterReason::Rewritten,
        ..FilterResult::default()
    };

    loop {
        let Some(first) = matched.first() else { break };
        if !first.is_cname() {
            break;
        }

        let answer = first.answer.clone();

        if host == answer && first.is_wildcard() {
            // `*.x → sub.x` queried as sub.x: the wildcard maps the host
            // onto itself. Keep it as the canonical name and stop.
            res.canon_name = Some(host);
            return Some(res);
        }

        res.canon_name = Some(answer.clone());

        if answer == orig_host || answer == first.domain {
            // Identity rewrite: an exception record disabling rewrites for
            // this name. Pass the query through untouched.
            debug!(host = orig_host, "Rewrite exception, passing through");
            return None;
        }

        if !visited.insert(answer.clone()) {
            warn!(host = orig_host, canon = %answer, "Rewrite chain loop, stopping");
            return Some(res);
        }

        host = answer;
        matched = find_rewrites(all, &host, qtype);
    }

    for record in matched.iter().filter(|r| !r.is_cname()) {
        match record.ip {
            // Exception marker ("A"/"AAAA" answer): clear the verdict so
            // the query goes upstream.
            None => res.reason = FilterReason::NotFilteredNotFound,
            Some(ip) => res.ip_list.push(ip),
        }
    }

    Some(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn rw(domain: &str, answer: &str) -> LegacyRewrite {
        LegacyRewrite::new(domain, answer)
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_simple_a_rewrite() {
        let all = vec![rw("host.example", "1.2.3.4")];
        let res = resolve("host.example", RecordType::A, &all).unwrap();
        assert_eq!(res.reason, FilterReason::Rewritten);
        assert_eq!(res.ip_list, vec![ip("1.2.3.4")]);
        assert!(res.canon_name.is_none());
    }

    #[test]
    fn test_qtype_mismatch_yields_nothing() {
        let all = vec![rw("host.example", "1.2.3.4")];
        assert!(resolve("host.example", RecordType::AAAA, &all).is_none());
    }

    #[test]
    fn test_multi_level_cname_chain() {
        let all = vec![
            rw("somecname", "somehost.com"),
            rw("somehost.com", "0.0.0.0"),
            rw("b.host.com", "somecname"),
        ];
        let res = resolve("b.host.com", RecordType::A, &all).unwrap();
        assert_eq!(res.reason, FilterReason::Rewritten);
        assert_eq!(res.canon_name.as_deref(), Some("somehost.com"));
        assert_eq!(res.ip_list, vec![ip("0.0.0.0")]);
    }

    #[test]
    fn test_identity_rewrite_is_pass_through() {
        let all = vec![rw("sub.example.org", "sub.example.org")];
        assert!(resolve("sub.example.org", RecordType::A, &all).is_none());
    }

    #[test]
    fn test_wildcard_self_map_stops_without_loop() {
        let all = vec![rw("*.example.org", "sub.example.org")];
        let res = resolve("sub.example.org", RecordType::A, &all).unwrap();
        assert_eq!(res.reason, FilterReason::Rewritten);
        assert_eq!(res.canon_name.as_deref(), Some("sub.example.org"));
        assert!(res.ip_list.is_empty());
    }

    #[test]
    fn test_chain_back_to_original_host_is_exception() {
        let all = vec![rw("a.example", "b.example"), rw("b.example", "a.example")];
        assert!(resolve("a.example", RecordType::A, &all).is_none());
    }

    #[test]
    fn test_loop_keeps_last_canonical_name() {
        let all = vec![
            rw("a.example", "b.example"),
            rw("b.example", "c.example"),
            rw("c.example", "b.example"),
        ];
        let res = resolve("a.example", RecordType::A, &all).unwrap();
        assert_eq!(res.reason, FilterReason::Rewritten);
        // c → b revisits b; resolution stops at the name emitted last.
        assert_eq!(res.canon_name.as_deref(), Some("b.example"));
    }

    #[test]
    fn test_exception_marker_clears_reason() {
        let all = vec![rw("host.example", "A"), rw("host.example", "1.2.3.4")];
        let res = resolve("host.example", RecordType::A, &all).unwrap();
        assert_eq!(res.reason, FilterReason::NotFilteredNotFound);
    }

    #[test]
    fn test_exact_shadows_following_wildcards() {
        let all = vec![
            rw("*.example.org", "1.1.1.1"),
            rw("www.example.org", "2.2.2.2"),
        ];
        let res = resolve("www.example.org", RecordType::A, &all).unwrap();
        // Exact records sort after wildcards but shadow the ones behind
        // them only; here both match and the wildcard sorts first.
        assert_eq!(res.ip_list, vec![ip("1.1.1.1"), ip("2.2.2.2")]);
    }

    #[test]
    fn test_longer_wildcard_wins_ordering() {
        let all = vec![
            rw("*.org", "1.1.1.1"),
            rw("*.example.org", "2.2.2.2"),
        ];
        let found = find_rewrites(&all, "a.example.org", RecordType::A);
        assert_eq!(found[0].domain, "*.example.org");
        assert_eq!(found[1].domain, "*.org");
    }

    #[test]
    fn test_cname_matches_any_qtype() {
        let all = vec![rw("host.example", "target.example")];
        let res = resolve("host.example", RecordType::TXT, &all).unwrap();
        assert_eq!(res.canon_name.as_deref(), Some("target.example"));
        assert!(res.ip_list.is_empty());
    }

    #[test]
    fn test_chain_terminates_within_rewrite_count() {
        // A chain through every record terminates in at most N+1 steps.
        let all = vec![
            rw("a.example", "b.example"),
            rw("b.example", "c.example"),
            rw("c.example", "d.example"),
            rw("d.example", "9.9.9.9"),
        ];
        let res = resolve("a.example", RecordType::A, &all).unwrap();
        assert_eq!(res.canon_name.as_deref(), Some("d.example"));
        assert_eq!(res.ip_list, vec![ip("9.9.9.9")]);
    }
}
