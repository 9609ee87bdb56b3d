use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use rustc_hash::FxBuildHasher;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Why a query was (or was not) filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// No matching rule anywhere.
    NotFilteredNotFound,
    /// An allow rule matched.
    NotFilteredAllowList,
    /// A checker failed; the query passes through best-effort.
    NotFilteredError,
    /// A block rule matched.
    FilteredBlockList,
    FilteredSafeBrowsing,
    FilteredParental,
    FilteredInvalid,
    FilteredSafeSearch,
    FilteredBlockedService,
    /// Legacy IP/CNAME rewrite.
    Rewritten,
    /// Operating-system hosts entry.
    RewrittenAutoHosts,
    /// `$dnsrewrite` rule.
    RewrittenRule,
}

impl FilterReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterReason::NotFilteredNotFound => "NotFilteredNotFound",
            FilterReason::NotFilteredAllowList => "NotFilteredWhiteList",
            FilterReason::NotFilteredError => "NotFilteredError",
            FilterReason::FilteredBlockList => "FilteredBlackList",
            FilterReason::FilteredSafeBrowsing => "FilteredSafeBrowsing",
            FilterReason::FilteredParental => "FilteredParental",
            FilterReason::FilteredInvalid => "FilteredInvalid",
            FilterReason::FilteredSafeSearch => "FilteredSafeSearch",
            FilterReason::FilteredBlockedService => "FilteredBlockedService",
            FilterReason::Rewritten => "Rewrite",
            FilterReason::RewrittenAutoHosts => "RewriteEtcHosts",
            FilterReason::RewrittenRule => "RewriteRule",
        }
    }

    /// True for every `Filtered*` reason.
    pub fn is_filtering(self) -> bool {
        matches!(
            self,
            FilterReason::FilteredBlockList
                | FilterReason::FilteredSafeBrowsing
                | FilterReason::FilteredParental
                | FilterReason::FilteredInvalid
                | FilterReason::FilteredSafeSearch
                | FilterReason::FilteredBlockedService
        )
    }
}

/// One rule that participated in a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRule {
    /// Original rule text.
    pub text: Arc<str>,
    /// Address of a host rule, when one produced this entry.
    pub ip: Option<IpAddr>,
    pub filter_list_id: i32,
}

/// A synthesised answer value inside a rewrite result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteValue {
    Ip(IpAddr),
    Name(String),
    Text(String),
}

/// Synthetic answer records produced by `$dnsrewrite` rules or the hosts
/// matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DnsRewriteResult {
    pub rcode: ResponseCode,
    pub response: HashMap<RecordType, Vec<RewriteValue>, FxBuildHasher>,
}

impl DnsRewriteResult {
    pub fn new(rcode: ResponseCode) -> Self {
        Self {
            rcode,
            response: HashMap::default(),
        }
    }
}

/// The verdict for one query.
#[derive(Debug, Clone)]
pub struct FilterResult {
    pub reason: FilterReason,

    /// Set by the matcher that produced the verdict; true means the DNS
    /// layer must answer with a blocked response.
    pub is_filtered: bool,

    pub rules: Vec<ResultRule>,

    /// Rewritten target of a CNAME rewrite.
    pub canon_name: Option<String>,

    /// Addresses accumulated by legacy rewrites.
    pub ip_list: Vec<IpAddr>,

    /// Matched blocked service, for `filtered-blocked-service`.
    pub service_name: Option<String>,

    pub dns_rewrite: Option<DnsRewriteResult>,
}

impl Default for FilterResult {
    fn default() -> Self {
        Self {
            reason: FilterReason::NotFilteredNotFound,
            is_filtered: false,
            rules: Vec::new(),
            canon_name: None,
            ip_list: Vec::new(),
            service_name: None,
            dns_rewrite: None,
        }
    }
}

impl FilterResult {
    /// Empty result: nothing matched, query passes through untouched.
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn blocked(rules: Vec<ResultRule>) -> Self {
        Self {
            reason: FilterReason::FilteredBlockList,
            is_filtered: true,
            rules,
            ..Self::default()
        }
    }

    pub fn allowed(rules: Vec<ResultRule>) -> Self {
        Self {
            reason: FilterReason::NotFilteredAllowList,
            is_filtered: false,
            rules,
            ..Self::default()
        }
    }

    /// Verdict of an opaque checker (safe browsing, parental, safe search).
    pub fn from_checker(reason: FilterReason, rule_text: &'static str, list_id: i32) -> Self {
        Self {
            reason,
            is_filtered: true,
            rules: vec![ResultRule {
                text: Arc::from(rule_text),
                ip: None,
                filter_list_id: list_id,
            }],
            ..Self::default()
        }
    }

    /// Best-effort marker used by diagnostics when a checker fails.
    pub fn checker_error() -> Self {
        Self {
            reason: FilterReason::NotFilteredError,
            ..Self::default()
        }
    }

    /// True when the pipeline should stop at this result.
    pub fn is_match(&self) -> bool {
        self.reason != FilterReason::NotFilteredNotFound
    }
}
