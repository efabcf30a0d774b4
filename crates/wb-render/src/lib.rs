pub mod anchor;
pub mod edge;
pub mod marker;
pub mod path;
pub mod svg;

pub use anchor::{Anchor, Side, resolve_anchor, resolve_edge_anchors};
pub use edge::{EdgeGeometry, edge_geometry, scene_geometry};
pub use marker::{MarkerGlyph, MarkerPlacement, edge_markers, marker_glyph};
pub use path::{EdgePath, PathOptions, generate_path};
pub use svg::{fmt_num, to_svg_path};
