// WHY: the only writer of tree content; keeps the first-seen original of every unit it touches so revert is exact

use std::collections::HashMap;
use tracing::debug;

use crate::converter::ConversionResult;
use crate::tree::{HostTree, NodeId};

#[derive(Debug, Default, Clone)]
pub struct Updater {
    originals: HashMap<NodeId, String>,
}

impl Updater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write each converted text whose unit still holds the submitted input; returns the units written.
    /// A unit edited since its batch went out is left alone so the newer content is converted on its own.
    pub fn apply<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        units: &[NodeId],
        results: &[ConversionResult],
    ) -> Vec<NodeId> {
        let mut written = Vec::new();
        for (&unit, result) in units.iter().zip(results) {
            let Some(text) = result.converted_text.as_deref() else {
                continue;
            };
            let Some(current) = tree.text(unit) else {
                debug!("Skipping detached unit {:?}", unit);
                continue;
            };
            if current != result.input {
                debug!("Skipping unit {:?} changed since submission", unit);
                continue;
            }
            if current == text {
                continue;
            }
            let current = current.to_string();
            self.originals.entry(unit).or_insert(current);
            if tree.set_text(unit, text) {
                written.push(unit);
            }
        }
        written
    }

    /// Restore every snapshotted unit still in the tree and forget all snapshots
    pub fn revert_all<T: HostTree + ?Sized>(&mut self, tree: &mut T) -> Vec<NodeId> {
        let mut restored = Vec::new();
        for (unit, original) in self.originals.drain() {
            if tree.text(unit) == Some(original.as_str()) {
                continue;
            }
            if tree.set_text(unit, &original) {
                restored.push(unit);
            }
        }
        debug!("Reverted {} units", restored.len());
        restored
    }

    pub fn original(&self, unit: NodeId) -> Option<&str> {
        self.originals.get(&unit).map(String::as_str)
    }

    pub fn forget(&mut self, unit: NodeId) -> bool {
        self.originals.remove(&unit).is_some()
    }

    /// Drop snapshots whose units have left the tree
    pub fn prune_detached<T: HostTree + ?Sized>(&mut self, tree: &T) -> usize {
        let before = self.originals.len();
        self.originals.retain(|&unit, _| tree.is_alive(unit));
        before - self.originals.len()
    }

    pub fn snapshot_count(&self) -> usize {
        self.originals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Document;

    fn converted(input: &str, output: &str) -> ConversionResult {
        ConversionResult {
            input: input.to_string(),
            is_myanmar_script: true,
            is_zawgyi_encoded: true,
            converted_text: Some(output.to_string()),
        }
    }

    fn untouched(input: &str) -> ConversionResult {
        ConversionResult {
            input: input.to_string(),
            is_myanmar_script: false,
            is_zawgyi_encoded: false,
            converted_text: None,
        }
    }

    #[test]
    fn test_first_original_survives_repeated_apply() {
        let (mut doc, texts) = Document::from_lines(&["\u{1064}"]);
        let mut updater = Updater::new();

        updater.apply(&mut doc, &texts, &[converted("\u{1064}", "first")]);
        updater.apply(&mut doc, &texts, &[converted("first", "second")]);
        assert_eq!(doc.text(texts[0]), Some("second"));
        assert_eq!(updater.original(texts[0]), Some("\u{1064}"));

        updater.revert_all(&mut doc);
        assert_eq!(doc.text(texts[0]), Some("\u{1064}"));
        assert_eq!(updater.snapshot_count(), 0);
    }

    #[test]
    fn test_unchanged_or_missing_text_not_snapshotted() {
        let (mut doc, texts) = Document::from_lines(&["same", "other"]);
        let mut updater = Updater::new();

        let written = updater.apply(&mut doc, &texts, &[converted("same", "same"), untouched("other")]);
        assert!(written.is_empty());
        assert_eq!(updater.snapshot_count(), 0);
        assert_eq!(doc.pending_records(), 0);
    }

    #[test]
    fn test_detached_units_skipped() {
        let (mut doc, texts) = Document::from_lines(&["a", "b"]);
        let mut updater = Updater::new();
        let paragraph = doc.parent(texts[0]).unwrap();
        doc.remove(paragraph);

        let written = updater.apply(&mut doc, &texts, &[converted("a", "x"), converted("b", "y")]);
        assert_eq!(written, vec![texts[1]]);
        assert_eq!(updater.original(texts[0]), None);
    }

    #[test]
    fn test_prune_detached() {
        let (mut doc, texts) = Document::from_lines(&["a", "b"]);
        let mut updater = Updater::new();
        updater.apply(&mut doc, &texts, &[converted("a", "x"), converted("b", "y")]);

        let paragraph = doc.parent(texts[1]).unwrap();
        doc.remove(paragraph);
        assert_eq!(updater.prune_detached(&doc), 1);
        assert_eq!(updater.snapshot_count(), 1);
        assert!(updater.forget(texts[0]));
        assert!(!updater.forget(texts[0]));
    }

    #[test]
    fn test_unit_edited_since_submission_left_alone() {
        let (mut doc, texts) = Document::from_lines(&["\u{1064}", "\u{1090}"]);
        let mut updater = Updater::new();
        doc.set_text(texts[0], "\u{1090}\u{1000}");
        doc.take_records();

        let written = updater.apply(
            &mut doc,
            &texts,
            &[converted("\u{1064}", "\u{1004}\u{103A}\u{1039}"), converted("\u{1090}", "\u{101B}")],
        );
        assert_eq!(written, vec![texts[1]]);
        assert_eq!(doc.text(texts[0]), Some("\u{1090}\u{1000}"));
        assert_eq!(updater.original(texts[0]), None);
        assert_eq!(doc.pending_records(), 1);
    }
}
