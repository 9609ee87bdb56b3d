use compact_str::CompactString;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::collections::HashMap;

/// A node in the reversed-label domain trie.
#[derive(Default)]
struct TrieNode {
    children: HashMap<CompactString, TrieNode, FxBuildHasher>,
    /// Indices of rules whose domain key terminates at this node.
    rule_ids: SmallVec<[u32; 2]>,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: HashMap::with_hasher(FxBuildHasher),
            rule_ids: SmallVec::new(),
        }
    }
}

/// A candidate produced by a trie lookup: the rule index plus whether the
/// rule's domain equals the whole queried host (as opposed to being a
/// proper suffix, i.e. the host is a subdomain of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieHit {
    pub rule_id: u32,
    pub exact: bool,
}

/// Reversed-label trie over the domain keys of network rules.
///
/// `example.org` is stored as the path ["org", "example"]. A lookup for
/// `sub.example.org` walks root → "org" → "example" and reports every rule
/// filed along the way, so the caller can apply each rule's own anchor
/// semantics (exact host vs domain-and-subdomains).
///
/// Built once per storage and never mutated afterwards.
#[derive(Default)]
pub struct DomainTrie {
    root: TrieNode,
}

impl DomainTrie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
        }
    }

    pub fn insert(&mut self, domain: &str, rule_id: u32) {
        let mut node = &mut self.root;
        for label in domain.split('.').rev() {
            node = node.children.entry(CompactString::new(label)).or_default();
        }
        node.rule_ids.push(rule_id);
    }

    /// Collect every rule filed on the suffix path of `host`.
    pub fn lookup(&self, host: &str) -> SmallVec<[TrieHit; 8]> {
        let labels: SmallVec<[&str; 8]> = host.split('.').rev().collect();
        let n = labels.len();
        let mut node = &self.root;
        let mut hits = SmallVec::new();

        for (i, label) in labels.iter().enumerate() {
            match node.children.get(*label) {
                Some(child) => {
                    for &rule_id in &child.rule_ids {
                        hits.push(TrieHit {
                            rule_id,
                            exact: i + 1 == n,
                        });
                    }
                    node = child;
                }
                None => break,
            }
        }

        hits
    }
}
