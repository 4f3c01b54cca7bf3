// WHY: the host document is an external collaborator; the pipeline only ever talks to it through `HostTree`
// `Document` is a small in-memory implementation used by the CLI and the tests.
// Handles are generational: once a node is detached its slot generation moves on, so stale handles
// report dead instead of aliasing whatever reuses the slot.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Change notification queued by the host tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    CharacterData {
        target: NodeId,
    },
}

impl MutationRecord {
    pub fn target(&self) -> NodeId {
        match self {
            MutationRecord::ChildList { target, .. } => *target,
            MutationRecord::CharacterData { target } => *target,
        }
    }
}

/// Host-tree capabilities the pipeline consumes
pub trait HostTree {
    fn is_alive(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children in document order; empty for text and dead nodes
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Lowercase tag of an element node, `None` for text nodes
    fn container_tag(&self, node: NodeId) -> Option<&str>;

    /// Element is an editable surface (content-editable region or form field)
    fn is_editable(&self, node: NodeId) -> bool;

    /// Content of a live text node
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Overwrite a live text node's content; false when the handle is dead or not text
    fn set_text(&mut self, node: NodeId, text: &str) -> bool;

    /// Drain change notifications queued since the last call, oldest first
    fn take_records(&mut self) -> Vec<MutationRecord>;

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element { tag: String, editable: bool },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    isolated: Vec<NodeId>,
    records: Vec<MutationRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut document = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
            isolated: Vec::new(),
            records: Vec::new(),
        };
        document.root = document.allocate(NodeKind::Element {
            tag: "body".to_string(),
            editable: false,
        });
        document
    }

    /// One `<p>` element with a single text child per line
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> (Self, Vec<NodeId>) {
        let mut document = Self::new();
        let root = document.root();
        let mut text_nodes = Vec::with_capacity(lines.len());
        for line in lines {
            let paragraph = document.create_element("p");
            let text = document.create_text(line.as_ref());
            document.append_child(paragraph, text);
            document.append_child(root, paragraph);
            text_nodes.push(text);
        }
        // building the document is not a mutation anyone should react to
        document.records.clear();
        (document, text_nodes)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId { index, generation: 0 }
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            editable: false,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.allocate(NodeKind::Text(text.to_string()))
    }

    /// Mark an element as a content-editable surface
    pub fn set_editable(&mut self, element: NodeId, editable: bool) -> bool {
        match self.node_mut(element).map(|node| &mut node.kind) {
            Some(NodeKind::Element { editable: flag, .. }) => {
                *flag = editable;
                true
            }
            _ => false,
        }
    }

    /// Detached root of an encapsulated sub-document; the caller hands it to the pipeline explicitly
    pub fn create_isolated_root(&mut self, tag: &str) -> NodeId {
        let root = self.create_element(tag);
        self.isolated.push(root);
        root
    }

    pub fn isolated_roots(&self) -> Vec<NodeId> {
        self.isolated
            .iter()
            .copied()
            .filter(|&id| self.is_alive(id))
            .collect()
    }

    /// Topmost ancestor of `node`
    pub fn root_of(&self, node: NodeId) -> Option<NodeId> {
        if !self.is_alive(node) {
            return None;
        }
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Some(current)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.append_children(parent, &[child])
    }

    /// Attach several nodes in one step, queuing a single child-list record for all of them
    pub fn append_children(&mut self, parent: NodeId, children: &[NodeId]) -> bool {
        if !matches!(self.node(parent).map(|n| &n.kind), Some(NodeKind::Element { .. })) {
            return false;
        }
        let mut added = Vec::with_capacity(children.len());
        for &child in children {
            if child == parent || self.contains(child, parent) {
                continue;
            }
            let previous_parent = match self.node(child) {
                Some(node) => node.parent,
                None => continue,
            };
            if let Some(previous) = previous_parent {
                if let Some(node) = self.node_mut(previous) {
                    node.children.retain(|&c| c != child);
                }
            }
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(parent);
            }
            if let Some(node) = self.node_mut(parent) {
                node.children.push(child);
            }
            added.push(child);
        }
        if added.is_empty() {
            return false;
        }
        self.records.push(MutationRecord::ChildList {
            target: parent,
            added,
            removed: Vec::new(),
        });
        true
    }

    /// Detach `node` and free its whole subtree; every handle into it becomes dead
    pub fn remove(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.node(node).map(|n| n.parent) else {
            return false;
        };
        if node == self.root {
            return false;
        }
        if let Some(parent) = parent {
            if let Some(p) = self.node_mut(parent) {
                p.children.retain(|&c| c != node);
            }
            self.records.push(MutationRecord::ChildList {
                target: parent,
                added: Vec::new(),
                removed: vec![node],
            });
        }
        self.isolated.retain(|&id| id != node);

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let slot = &mut self.slots[id.index as usize];
            if let Some(freed) = slot.node.take() {
                stack.extend(freed.children);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
        true
    }

    pub fn pending_records(&self) -> usize {
        self.records.len()
    }

    /// Text nodes under `root` in document order, regardless of container
    pub fn text_nodes(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match self.node(id) {
                Some(Node { kind: NodeKind::Text(_), .. }) => found.push(id),
                Some(node) => stack.extend(node.children.iter().rev().copied()),
                None => {}
            }
        }
        found
    }
}

impl HostTree for Document {
    fn is_alive(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn container_tag(&self, node: NodeId) -> Option<&str> {
        match self.node(node).map(|n| &n.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    fn is_editable(&self, node: NodeId) -> bool {
        matches!(
            self.node(node).map(|n| &n.kind),
            Some(NodeKind::Element { editable: true, .. })
        )
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match self.node(node).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> bool {
        match self.node_mut(node).map(|n| &mut n.kind) {
            Some(NodeKind::Text(content)) => {
                *content = text.to_string();
            }
            _ => return false,
        }
        self.records.push(MutationRecord::CharacterData { target: node });
        true
    }

    fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }
}
