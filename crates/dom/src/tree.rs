use std::cmp::Ordering;

/// Index into the document arena. Detached nodes keep their id; slots are
/// never reused within one document's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|v| v.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let value = match self.attr("class") {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr("class", &value);
    }

    pub fn remove_class(&mut self, class: &str) {
        if let Some(existing) = self.attr("class") {
            let value = existing
                .split_ascii_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
            self.set_attr("class", &value);
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    /// The synthetic document root.
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Arena-backed document tree.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.push(NodeData::Element(data))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        if let NodeData::Text(t) = &mut self.nodes[id.0].data {
            *t = value.into();
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Element(_))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Position of `id` within its parent's child list.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let index = index.min(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `new` as the immediately preceding sibling of `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) {
        if let Some(parent) = self.parent(sibling) {
            // detach can shift indices when both share a parent, so resolve
            // the insertion point after detaching.
            self.detach(new);
            let index = self.children(parent).iter().position(|c| *c == sibling);
            if let Some(index) = index {
                self.nodes[parent.0].children.insert(index, new);
                self.nodes[new.0].parent = Some(parent);
            }
        }
    }

    /// Insert `new` as the immediately following sibling of `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, new: NodeId) {
        if let Some(parent) = self.parent(sibling) {
            self.detach(new);
            let index = self.children(parent).iter().position(|c| *c == sibling);
            if let Some(index) = index {
                self.nodes[parent.0].children.insert(index + 1, new);
                self.nodes[new.0].parent = Some(parent);
            }
        }
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// All nodes under `root` (root included) in document order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in self.children(id).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(t) = self.text(node) {
                out.push_str(t);
            }
        }
        out
    }

    /// First element named `name` in document order, if any.
    pub fn first_element_named(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.element(*id).map(|el| el.name == name).unwrap_or(false))
    }

    pub fn body(&self) -> NodeId {
        self.first_element_named("body").unwrap_or_else(|| self.root())
    }

    pub fn title(&self) -> Option<String> {
        self.first_element_named("title")
            .map(|id| self.text_content(id).trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Split a text node at `offset` (bytes). The original keeps the head,
    /// a new following sibling takes the tail. Returns the tail node, or
    /// `None` when the offset is degenerate or not a char boundary.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(id)?;
        if offset == 0 || offset >= text.len() || !text.is_char_boundary(offset) {
            return None;
        }
        let tail = text[offset..].to_string();
        let head = text[..offset].to_string();
        self.set_text(id, head);
        let tail_id = self.create_text(tail);
        self.insert_after(id, tail_id);
        Some(tail_id)
    }

    /// Split an element before child index `at`: a clone carrying the same
    /// tag and attributes is inserted as the next sibling and receives
    /// children `at..`. Returns the clone.
    pub fn split_element(&mut self, id: NodeId, at: usize) -> Option<NodeId> {
        let element = self.element(id)?.clone();
        let clone = self.create_element(element);
        let moved: Vec<NodeId> = self.children(id).get(at..).unwrap_or(&[]).to_vec();
        self.insert_after(id, clone);
        for child in moved {
            self.append_child(clone, child);
        }
        Some(clone)
    }

    /// Replace a node with its own children (document order preserved),
    /// then merge adjacent text nodes in the parent. Returns false when the
    /// node has no parent to splice into.
    pub fn replace_with_children(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let Some(index) = self.child_index(id) else {
            return false;
        };
        let children: Vec<NodeId> = self.children(id).to_vec();
        self.detach(id);
        for (i, child) in children.into_iter().enumerate() {
            self.insert_at(parent, index + i, child);
        }
        self.merge_adjacent_text(parent);
        true
    }

    /// Merge runs of adjacent text-node children and drop empty ones.
    pub fn merge_adjacent_text(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = self.children(parent).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            match self.text(child).map(|t| t.to_string()) {
                Some(text) if text.is_empty() => {
                    self.detach(child);
                }
                Some(text) => match previous_text {
                    Some(prev) => {
                        let merged = format!("{}{}", self.text(prev).unwrap_or(""), text);
                        self.set_text(prev, merged);
                        self.detach(child);
                    }
                    None => previous_text = Some(child),
                },
                None => previous_text = None,
            }
        }
    }

    /// Chain of ancestors from the node's parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let mut chain_a: Vec<NodeId> = vec![a];
        chain_a.extend(self.ancestors(a));
        let mut chain_b: Vec<NodeId> = vec![b];
        chain_b.extend(self.ancestors(b));
        chain_a.into_iter().find(|id| chain_b.contains(id))
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    /// Child-index path from the root down to `id`.
    fn index_path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if let Some(index) = self.child_index(current) {
                path.push(index);
            }
            current = parent;
        }
        path.reverse();
        path
    }

    /// Document-order comparison of two attached nodes.
    pub fn order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.index_path(a).cmp(&self.index_path(b))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
