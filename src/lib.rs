/// GPRS command packet flattening
/// Normalizes decoded GPRS command packets into flat, ordered reports

pub mod gprs_common_rs;

// 便利な再エクスポート
pub mod prelude {
    pub use crate::gprs_common_rs::decoder::{HeaderByteClassifier, LayoutDecoder, PacketClassifier, PacketType, Schema, StructDecoder};
    pub use crate::gprs_common_rs::flatten::Flattener;
    pub use crate::gprs_common_rs::packet::core::{GprsPacketError, GprsResult, PacketInput, SchemaContractError};
    pub use crate::gprs_common_rs::packet::models::{FieldTree, FieldValue, FlatReport, ReportValue, Scalar};
    pub use crate::gprs_common_rs::service::{BatchProcessor, DispatchOutcome, GprsService};
}
