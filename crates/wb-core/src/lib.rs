pub mod align;
pub mod fingerprint;
pub mod id;
pub mod lint;
pub mod model;
pub mod snap;
pub mod spatial;

pub use align::{DEFAULT_ALIGNMENT_TOLERANCE, MAX_ALIGNMENT_GUIDES, find_alignment_guides};
pub use fingerprint::{Fingerprint, FingerprintChange, layout_hash, structure_hash};
pub use id::NodeId;
pub use lint::{LintDiagnostic, LintSeverity, lint_scene};
pub use model::*;
pub use snap::{
    GuideAxis, SnapEngine, SnapGuide, SnapResult, SnapSettings, calculate_snap_position,
};
pub use spatial::SpatialIndex;
