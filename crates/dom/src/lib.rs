//! In-memory DOM for highlight anchoring: an arena tree built from parsed
//! HTML, with the mutation primitives the highlight engine needs (text
//! splitting, element splitting, unwrap-with-merge) and document-order
//! text walking for the resolver.

pub mod parse;
pub mod path;
pub mod range;
pub mod serialize;
pub mod tree;
pub mod walk;

pub use parse::{append_fragment, parse_document};
pub use path::{element_path, resolve_path};
pub use range::{DomRange, Position};
pub use serialize::{inner_html, to_html};
pub use tree::{Document, ElementData, NodeData, NodeId};
pub use walk::{find_text_range, text_nodes};
