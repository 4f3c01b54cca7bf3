// WHY: lazy walk of a host subtree yielding only the text units worth sending to detection
// Holds no state between calls; every `scan` starts from scratch on whatever root it is given.

use std::collections::HashSet;

use crate::converter::charset;
use crate::tree::{HostTree, NodeId};

pub const DEFAULT_IGNORED_CONTAINERS: &[&str] = &["script", "style", "code", "pre", "noscript", "template"];
pub const DEFAULT_EDITABLE_CONTAINERS: &[&str] = &["input", "textarea"];

/// Which containers hide their text from the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPolicy {
    ignored: HashSet<String>,
    editable: HashSet<String>,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_CONTAINERS, DEFAULT_EDITABLE_CONTAINERS)
    }
}

impl ScanPolicy {
    pub fn new<I, E>(ignored: I, editable: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            ignored: ignored.into_iter().map(|t| t.as_ref().to_ascii_lowercase()).collect(),
            editable: editable.into_iter().map(|t| t.as_ref().to_ascii_lowercase()).collect(),
        }
    }

    /// Element whose subtree is never visited
    pub fn is_excluded<T: HostTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        if tree.is_editable(node) {
            return true;
        }
        match tree.container_tag(node) {
            Some(tag) => self.ignored.contains(tag) || self.editable.contains(tag),
            None => false,
        }
    }

    /// True if any ancestor of `node` is excluded
    pub fn inside_excluded<T: HostTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        let mut current = tree.parent(node);
        while let Some(id) = current {
            if self.is_excluded(tree, id) {
                return true;
            }
            current = tree.parent(id);
        }
        false
    }

    /// Full check for a single text node reached without a walk: containers and content
    pub fn accepts<T: HostTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        let Some(text) = tree.text(node) else {
            return false;
        };
        // text with no container at all is not part of the rendered document
        if tree.parent(node).is_none() {
            return false;
        }
        is_candidate_text(text) && !self.inside_excluded(tree, node)
    }
}

/// Non-blank text carrying at least one Myanmar or Zawgyi-range character
pub fn is_candidate_text(text: &str) -> bool {
    !text.trim().is_empty() && charset::contains_candidate(text)
}

/// Depth-first, document-order iterator over candidate text units under one root
pub struct Scanner<'a, T: HostTree + ?Sized> {
    tree: &'a T,
    policy: &'a ScanPolicy,
    stack: Vec<NodeId>,
}

impl<'a, T: HostTree + ?Sized> Scanner<'a, T> {
    pub fn new(tree: &'a T, root: NodeId, policy: &'a ScanPolicy) -> Self {
        let stack = if tree.is_alive(root) && !policy.inside_excluded(tree, root) {
            vec![root]
        } else {
            Vec::new()
        };
        Self { tree, policy, stack }
    }
}

impl<T: HostTree + ?Sized> Iterator for Scanner<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(node) = self.stack.pop() {
            if let Some(text) = self.tree.text(node) {
                if self.tree.parent(node).is_some() && is_candidate_text(text) {
                    return Some(node);
                }
                continue;
            }
            if self.policy.is_excluded(self.tree, node) {
                continue;
            }
            self.stack.extend(self.tree.children(node).iter().rev().copied());
        }
        None
    }
}

pub fn scan<'a, T: HostTree + ?Sized>(tree: &'a T, root: NodeId, policy: &'a ScanPolicy) -> Scanner<'a, T> {
    Scanner::new(tree, root, policy)
}
