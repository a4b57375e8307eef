use super::tree::{char_slice, Document, NodeData, NodeId};

/// A position in the document. For text nodes `offset` counts characters,
/// for elements it counts children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Portion of one text node that falls inside a range, as character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSegment {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// A boundary point held as a character offset into the text content of an
/// element. Survives the splitting and merging of that element's text nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAnchor {
    pub container: NodeId,
    pub offset: usize,
}

impl TextAnchor {
    /// Elements for which `transient` holds are never picked as the container.
    pub fn capture(
        doc: &Document,
        point: BoundaryPoint,
        transient: impl Fn(NodeId) -> bool,
    ) -> Option<Self> {
        if !doc.is_attached(point.node) {
            return None;
        }
        let mut container = point.node;
        while doc.is_text(container) || transient(container) {
            container = doc.parent(container)?;
        }
        let before = DomRange::new(BoundaryPoint::new(container, 0), point);
        Some(Self {
            container,
            offset: before.text(doc).chars().count(),
        })
    }

    pub fn resolve(&self, doc: &Document) -> BoundaryPoint {
        let mut consumed = 0usize;
        for node in doc.descendants(self.container) {
            let Some(text) = doc.text(node) else {
                continue;
            };
            let len = text.chars().count();
            if self.offset <= consumed + len {
                return BoundaryPoint::new(node, self.offset - consumed);
            }
            consumed += len;
        }
        BoundaryPoint::new(self.container, doc.node_length(self.container))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchoredRange {
    pub start: TextAnchor,
    pub end: TextAnchor,
}

impl AnchoredRange {
    pub fn resolve(&self, doc: &Document) -> DomRange {
        DomRange::new(self.start.resolve(doc), self.end.resolve(doc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl DomRange {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    /// Range covering everything inside `node`.
    pub fn select_contents(doc: &Document, node: NodeId) -> Self {
        Self {
            start: BoundaryPoint::new(node, 0),
            end: BoundaryPoint::new(node, doc.node_length(node)),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Intersected text nodes in document order. A range whose boundaries are
    /// detached, or whose end precedes its start, yields nothing.
    pub fn text_segments(&self, doc: &Document) -> Vec<TextSegment> {
        self.walk(doc).segments
    }

    /// Selected text, concatenated across text nodes.
    pub fn text(&self, doc: &Document) -> String {
        self.text_segments(doc)
            .into_iter()
            .filter_map(|seg| {
                doc.text(seg.node)
                    .map(|text| char_slice(text, seg.start, seg.end).to_string())
            })
            .collect()
    }

    /// Re-expresses both ends as text offsets so the range can be carried
    /// across edits that only split or merge text nodes.
    pub fn anchor(
        &self,
        doc: &Document,
        transient: impl Fn(NodeId) -> bool,
    ) -> Option<AnchoredRange> {
        Some(AnchoredRange {
            start: TextAnchor::capture(doc, self.start, &transient)?,
            end: TextAnchor::capture(doc, self.end, &transient)?,
        })
    }

    pub fn intersects_editable(&self, doc: &Document) -> bool {
        if doc.is_editable(self.start.node) || doc.is_editable(self.end.node) {
            return true;
        }
        let walk = self.walk(doc);
        walk.segments.iter().any(|seg| doc.is_editable(seg.node))
            || walk.elements.iter().any(|&el| doc.is_editable(el))
    }

    fn walk(&self, doc: &Document) -> RangeWalk {
        let mut walk = RangeWalk {
            start: self.start,
            end: self.end,
            inside: false,
            finished: false,
            segments: Vec::new(),
            elements: Vec::new(),
        };
        if doc.is_attached(self.start.node) && doc.is_attached(self.end.node) {
            walk.visit(doc, doc.root());
        }
        walk
    }
}

struct RangeWalk {
    start: BoundaryPoint,
    end: BoundaryPoint,
    inside: bool,
    finished: bool,
    segments: Vec<TextSegment>,
    elements: Vec<NodeId>,
}

impl RangeWalk {
    fn visit(&mut self, doc: &Document, node: NodeId) {
        if self.finished {
            return;
        }
        match doc.data(node) {
            Some(NodeData::Text(text)) => self.visit_text(node, text.chars().count()),
            Some(NodeData::Element { .. }) => {
                if self.inside {
                    self.elements.push(node);
                }
                let children = doc.children(node);
                for idx in 0..=children.len() {
                    if node == self.start.node && idx == self.start.offset.min(children.len()) {
                        self.inside = true;
                    }
                    if node == self.end.node && idx == self.end.offset.min(children.len()) {
                        self.finished = true;
                        return;
                    }
                    if let Some(&child) = children.get(idx) {
                        self.visit(doc, child);
                        if self.finished {
                            return;
                        }
                    }
                }
            }
            None => {}
        }
    }

    fn visit_text(&mut self, node: NodeId, len: usize) {
        let start = if node == self.start.node {
            self.inside = true;
            self.start.offset.min(len)
        } else {
            0
        };
        if !self.inside {
            // end reached before start: reversed range
            if node == self.end.node {
                self.finished = true;
            }
            return;
        }
        let end = if node == self.end.node {
            self.finished = true;
            self.end.offset.min(len)
        } else {
            len
        };
        if start < end {
            self.segments.push(TextSegment { node, start, end });
        }
    }
}
