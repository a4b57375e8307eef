mod range;
mod tree;

pub use range::{AnchoredRange, BoundaryPoint, DomRange, TextAnchor, TextSegment};
pub use tree::{Document, NodeData, NodeId};
pub(crate) use tree::char_slice;
