//! Hierarchical feature filters
//!
//! Extracted radiomics features are identified by a modality, a region of
//! interest and a feature name. This crate arranges them in a [`FilterTree`](tree::FilterTree)
//! and tracks which nodes the user selected with tri-state checkboxes:
//!
//! ```text
//! [-] CT
//!     [x] GTV
//!         [x] original_shape_Volume
//!         [x] original_firstorder_Mean
//!     [ ] GTV_N
//!         [ ] original_shape_Volume
//! ```
//!
//! Besides toggling a node with its subtree, a node can be toggled
//! "everywhere": the same ROI or feature is then toggled under every modality
//! at once.

pub mod path;
pub mod selection;
pub mod tree;

pub use self::path::SEPARATOR;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PathError {
    #[display("Feature path is empty")]
    Empty,
    #[display("Feature path contains an empty segment")]
    EmptySegment,
    #[display("Segment '{segment}' contains the path separator '{SEPARATOR}'")]
    SeparatorInSegment { segment: String },
}
