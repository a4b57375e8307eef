use crate::error::HighlightError;

/// Arena index of a node. Ids stay valid for the document's lifetime; a
/// detached node keeps its id but is no longer reachable from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Minimal mutable document: elements with attributes, text leaves, and the
/// structural operations the tokenizer and restorer need.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_root("body")
    }

    pub fn with_root(tag: &str) -> Self {
        let root = Node {
            data: NodeData::Element {
                tag: tag.to_string(),
                attributes: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, HighlightError> {
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, HighlightError> {
        let id = self.create_text(text);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).map(|n| &n.data)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text(_)))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), HighlightError> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.data) {
            Some(NodeData::Text(text)) => {
                *text = value.to_string();
                Ok(())
            }
            Some(NodeData::Element { .. }) => Err(HighlightError::invalid_input(format!(
                "node {id:?} is not a text node"
            ))),
            None => Err(HighlightError::stale(id, "unknown node")),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Character length for text nodes, child count for elements.
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.data(id) {
            Some(NodeData::Text(text)) => text.chars().count(),
            Some(NodeData::Element { .. }) => self.children(id).len(),
            None => 0,
        }
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        if self.nodes.get(id.0).is_none() {
            return false;
        }
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.parent(cur) {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), HighlightError> {
        match self.data(parent) {
            Some(NodeData::Element { .. }) => {}
            Some(NodeData::Text(_)) => {
                return Err(HighlightError::invalid_input(
                    "text nodes cannot have children",
                ))
            }
            None => return Err(HighlightError::stale(parent, "unknown node")),
        }
        if self.nodes.get(child.0).is_none() {
            return Err(HighlightError::stale(child, "unknown node"));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(HighlightError::invalid_input(
                "cannot insert a node into its own subtree",
            ));
        }
        Ok(())
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|&c| c != id);
            self.nodes[id.0].parent = None;
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HighlightError> {
        self.check_insertable(parent, child)?;
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), HighlightError> {
        self.check_insertable(parent, child)?;
        if self.parent(reference) != Some(parent) {
            return Err(HighlightError::stale(reference, "reference is not a child"));
        }
        self.detach(child);
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference)
            .ok_or(HighlightError::stale(reference, "reference is not a child"))?;
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn remove(&mut self, id: NodeId) -> Result<(), HighlightError> {
        if self.parent(id).is_none() {
            return Err(HighlightError::stale(id, "node is detached"));
        }
        self.detach(id);
        Ok(())
    }

    /// Replaces `node` with `replacements`, in order, at the same position.
    pub fn replace_with(
        &mut self,
        node: NodeId,
        replacements: &[NodeId],
    ) -> Result<(), HighlightError> {
        let parent = self
            .parent(node)
            .ok_or(HighlightError::stale(node, "node is detached"))?;
        for &replacement in replacements {
            if replacement == node {
                return Err(HighlightError::invalid_input(
                    "a node cannot replace itself",
                ));
            }
            self.check_insertable(parent, replacement)?;
        }
        for &replacement in replacements {
            self.detach(replacement);
        }
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == node)
            .ok_or(HighlightError::stale(node, "node is not a child of its parent"))?;
        self.nodes[parent.0]
            .children
            .splice(index..=index, replacements.iter().copied());
        for &replacement in replacements {
            self.nodes[replacement.0].parent = Some(parent);
        }
        self.nodes[node.0].parent = None;
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), HighlightError> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.data) {
            Some(NodeData::Element { attributes, .. }) => {
                match attributes.iter_mut().find(|(k, _)| k == name) {
                    Some((_, v)) => *v = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            Some(NodeData::Text(_)) => Err(HighlightError::invalid_input(
                "text nodes have no attributes",
            )),
            None => Err(HighlightError::stale(id, "unknown node")),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(NodeData::Element { attributes, .. }) =
            self.nodes.get_mut(id.0).map(|n| &mut n.data)
        {
            attributes.retain(|(k, _)| k != name);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), HighlightError> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let value = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &value)
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), HighlightError> {
        if !self.has_class(id, class) {
            return Ok(());
        }
        let remaining = self
            .attribute(id, "class")
            .unwrap_or_default()
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        if remaining.is_empty() {
            self.remove_attribute(id, "class");
            Ok(())
        } else {
            self.set_attribute(id, "class", &remaining)
        }
    }

    /// True for form fields, `contenteditable` hosts, and anything inside them.
    pub fn is_editable(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(node) = cur {
            if let Some(tag) = self.tag(node) {
                if tag.eq_ignore_ascii_case("input") || tag.eq_ignore_ascii_case("textarea") {
                    return true;
                }
                if self
                    .attribute(node, "contenteditable")
                    .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
                {
                    return true;
                }
            }
            cur = self.parent(node);
        }
        false
    }

    /// Descendants of `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Merges adjacent text children and drops empty ones, recursively.
    pub fn normalize(&mut self, id: NodeId) {
        if self.tag(id).is_none() {
            return;
        }
        let children = std::mem::take(&mut self.nodes[id.0].children);
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            if let NodeData::Text(text) = &mut self.nodes[child.0].data {
                let text = std::mem::take(text);
                let previous_text = kept.last().copied().filter(|&prev| self.is_text(prev));
                if text.is_empty() || previous_text.is_some() {
                    if let Some(prev) = previous_text {
                        if let NodeData::Text(prev_text) = &mut self.nodes[prev.0].data {
                            prev_text.push_str(&text);
                        }
                    }
                    self.nodes[child.0].parent = None;
                    continue;
                }
                self.nodes[child.0].data = NodeData::Text(text);
                kept.push(child);
                continue;
            }
            self.normalize(child);
            kept.push(child);
        }
        self.nodes[id.0].children = kept;
    }

    /// Deterministic serialization: attributes in insertion order, text escaped.
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) => {
                for c in text.chars() {
                    match c {
                        '&' => out.push_str("&amp;"),
                        '<' => out.push_str("&lt;"),
                        '>' => out.push_str("&gt;"),
                        _ => out.push(c),
                    }
                }
            }
            Some(NodeData::Element { tag, attributes }) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {name}=\"{}\"", value.replace('"', "&quot;")));
                }
                out.push('>');
                for &child in self.children(id) {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            None => {}
        }
    }
}

/// Substring by character offsets, clamped to the string.
pub(crate) fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let byte_at = |idx: usize| {
        s.char_indices()
            .nth(idx)
            .map(|(b, _)| b)
            .unwrap_or(s.len())
    };
    let start_byte = byte_at(start);
    let end_byte = byte_at(end.max(start));
    &s[start_byte..end_byte]
}
