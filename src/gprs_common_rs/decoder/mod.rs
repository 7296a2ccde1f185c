//! パケット種別判定とスキーマ駆動デコーダ

pub mod classifier;
pub mod layout_decoder;
pub mod schema;

pub use classifier::{HeaderByteClassifier, PacketClassifier, PacketType};
pub use layout_decoder::{LayoutDecoder, StructDecoder};
pub use schema::{FieldSpec, FieldSpecKind, Schema, SchemaLoader, VariantSpec};
