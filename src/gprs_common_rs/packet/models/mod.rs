//! パケットモデル

pub mod field_tree;
pub mod flat_report;

pub use field_tree::{FieldDescriptor, FieldKind, FieldNode, FieldTree, FieldValue, Scalar};
pub use flat_report::{DataMap, FlatReport, ReportValue};
