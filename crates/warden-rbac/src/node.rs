//! # Permission nodes
//!
//! A permission node is a dotted identifier naming one guarded action,
//! e.g. `"build.place"` or `"zone.admin.setparent"`. A node whose final
//! segment is the wildcard marker `_ALL_` stands for every node under the
//! preceding prefix, so `"zone.admin._ALL_"` covers
//! `"zone.admin.setparent"`, `"zone.admin.delete"`, and so on. The bare
//! node `"_ALL_"` covers everything.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final segment marking a wildcard node.
pub const WILDCARD: &str = "_ALL_";

/// A validated permission node identifier.
///
/// Nodes are dot-separated, each segment drawn from `[A-Za-z0-9_-]`, and
/// the wildcard marker is only allowed as the final segment.
///
/// # Examples
///
/// ```
/// use warden_rbac::PermNode;
///
/// let node = PermNode::parse("build.place").unwrap();
/// assert_eq!(node.as_str(), "build.place");
/// assert!(!node.is_wildcard());
///
/// let all = PermNode::parse("build._ALL_").unwrap();
/// assert!(all.is_wildcard());
/// assert!(all.covers(&node));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermNode(String);

impl PermNode {
    /// Parse and validate a node identifier.
    ///
    /// # Returns
    ///
    /// `Some(PermNode)` if the string is a well-formed node, `None` otherwise.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        let segments: Vec<&str> = s.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return None;
            }
            if *segment == WILDCARD {
                // Wildcard only as the final segment.
                if i != segments.len() - 1 {
                    return None;
                }
                continue;
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return None;
            }
        }
        Some(Self(s.to_string()))
    }

    /// The node identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this node is a wildcard (`_ALL_`-terminated).
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD || self.0.ends_with(&format!(".{WILDCARD}"))
    }

    /// The prefix covered by a wildcard node, without the trailing marker.
    ///
    /// Returns `Some("")` for the bare `_ALL_` node and `None` for
    /// non-wildcard nodes.
    pub fn wildcard_prefix(&self) -> Option<&str> {
        if self.0 == WILDCARD {
            Some("")
        } else {
            self.0.strip_suffix(&format!(".{WILDCARD}"))
        }
    }

    /// Whether this node covers `other`.
    ///
    /// An exact node covers only itself. A wildcard node covers every node
    /// strictly under its prefix.
    pub fn covers(&self, other: &PermNode) -> bool {
        if self == other {
            return true;
        }
        match self.wildcard_prefix() {
            Some("") => true,
            Some(prefix) => {
                other.0.len() > prefix.len()
                    && other.0.starts_with(prefix)
                    && other.0.as_bytes()[prefix.len()] == b'.'
            }
            None => false,
        }
    }

    /// The wildcard nodes that would cover this node, most specific first.
    ///
    /// For `"a.b.c"` this yields `"a.b._ALL_"`, `"a._ALL_"`, `"_ALL_"`.
    /// Lookups consult these only after the exact node misses.
    pub fn wildcard_chain(&self) -> Vec<PermNode> {
        let mut chain = Vec::new();
        let base = match self.wildcard_prefix() {
            // For a wildcard node, start from its own prefix.
            Some(prefix) => prefix,
            None => self.0.as_str(),
        };
        let mut rest = base;
        while let Some(idx) = rest.rfind('.') {
            rest = &rest[..idx];
            chain.push(PermNode(format!("{rest}.{WILDCARD}")));
        }
        if !base.is_empty() {
            chain.push(PermNode(WILDCARD.to_string()));
        }
        chain
    }
}

impl fmt::Display for PermNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PermNode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
