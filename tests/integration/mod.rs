// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zawgyi_sweep::{Document, ExecutionMode, HostTree, NodeId, Settings};

/// Temporary directory holding input files and a settings file
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();
        Self { temp_dir, root_path }
    }

    /// Create a text file with given content, creating parent directories as needed
    pub fn create_text_file<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("Failed to read test file")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root_path.join("config").join("settings.json")
    }

    pub fn glob(&self, pattern: &str) -> String {
        format!("{}/{}", self.root_path.display(), pattern)
    }
}

/// Defaults with conversion on the calling thread, for deterministic paused-clock tests
pub fn inline_settings() -> Settings {
    Settings {
        execution: ExecutionMode::Inline,
        ..Settings::default()
    }
}

/// Append `<p>text</p>` under `parent`, queuing one child-list record
pub fn add_paragraph(doc: &mut Document, parent: NodeId, text: &str) -> NodeId {
    let paragraph = doc.create_element("p");
    let node = doc.create_text(text);
    doc.append_child(paragraph, node);
    doc.append_child(parent, paragraph);
    node
}

/// Current text of every node, for before/after comparisons
pub fn texts_of(doc: &Document, nodes: &[NodeId]) -> Vec<Option<String>> {
    nodes.iter().map(|&n| doc.text(n).map(str::to_string)).collect()
}

/// Assert a string holds nothing from the Zawgyi legacy block, naming the offending codepoint
pub fn assert_no_legacy(text: &str, context: &str) {
    if let Some(c) = text.chars().find(|c| ('\u{1060}'..='\u{1097}').contains(c)) {
        panic!("{}: legacy codepoint U+{:04X} left in {:?}", context, c as u32, text);
    }
}
