//! ディスパッチ層: 入力の正規化、種別ゲート、デコード、フラット化

pub mod batch_processor;
pub mod gprs_service;

pub use batch_processor::{BatchProcessor, BatchStats};
pub use gprs_service::{DispatchOutcome, GprsService};
