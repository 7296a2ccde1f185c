use crate::gprs_common_rs::decoder::{
    HeaderByteClassifier, LayoutDecoder, PacketClassifier, PacketType, Schema, SchemaLoader, StructDecoder,
};
use crate::gprs_common_rs::flatten::Flattener;
use crate::gprs_common_rs::packet::core::exceptions::{GprsResult, PacketParseError, SchemaContractError};
use crate::gprs_common_rs::packet::core::packet_input::PacketInput;
use crate::gprs_common_rs::packet::debug::PacketDebugLogger;
use crate::gprs_common_rs::packet::models::{FieldTree, FlatReport};
use crate::gprs_common_rs::utils::config_loader::{DispatchConfig, GprsConfig};
use log::{debug, info, warn};
use std::path::Path;

/// 1パケット分の処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// コマンドパケットのレポート
    Report(FlatReport),
    /// コマンド以外のパケット（フラット化しない）
    NotCommand(PacketType),
    /// 正規化・判定・デコードに失敗したパケット
    Invalid(String),
}

impl DispatchOutcome {
    pub fn into_report(self) -> Option<FlatReport> {
        match self {
            DispatchOutcome::Report(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_report(&self) -> bool {
        matches!(self, DispatchOutcome::Report(_))
    }
}

/// 判定 → デコード → フラット化を束ねるサービス
///
/// コマンド種別のゲートはこの層で行う。状態は持たず、複数スレッドから共有できる。
#[derive(Debug)]
pub struct GprsService<C, D> {
    classifier: C,
    decoder: D,
    schema: Schema,
    flattener: Flattener,
    config: DispatchConfig,
}

impl GprsService<HeaderByteClassifier, LayoutDecoder> {
    /// 設定からヘッダ判定器とレイアウトデコーダを組み立てる
    pub fn from_config(config: &GprsConfig) -> GprsResult<Self> {
        let schema = match &config.schema.path {
            Some(path) => {
                info!("loading schema from {}", path);
                SchemaLoader::load_from_file(Path::new(path))?
            }
            None => Schema::command().clone(),
        };
        Ok(Self::new(
            HeaderByteClassifier::new(config.dispatch.classifier_offset),
            LayoutDecoder::new(),
            schema,
            config.dispatch.clone(),
        ))
    }
}

impl<C: PacketClassifier, D: StructDecoder> GprsService<C, D> {
    pub fn new(classifier: C, decoder: D, schema: Schema, config: DispatchConfig) -> Self {
        Self { classifier, decoder, schema, flattener: Flattener::new(), config }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn classify(&self, bytes: &[u8]) -> Result<PacketType, PacketParseError> {
        self.classifier.classify(bytes)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<FieldTree, PacketParseError> {
        self.decoder.decode(bytes, &self.schema)
    }

    pub fn flatten(&self, tree: &FieldTree) -> Result<FlatReport, SchemaContractError> {
        self.flattener.flatten(tree)
    }

    /// 生パケットを処理する
    ///
    /// 不正な入力は `Invalid` として返し、スキーマ契約違反のみ `Err` になる。
    pub fn process<I: Into<PacketInput>>(&self, input: I) -> GprsResult<DispatchOutcome> {
        match input.into().normalize() {
            Ok(bytes) => self.process_bytes(&bytes),
            Err(err) => Ok(invalid(err)),
        }
    }

    pub fn process_bytes(&self, bytes: &[u8]) -> GprsResult<DispatchOutcome> {
        if let Some(outcome) = self.gate(bytes) {
            return Ok(outcome);
        }
        self.complete(self.decode(bytes))
    }

    /// デコード前に処理が終わるパケットなら結果を返す
    pub(crate) fn gate(&self, bytes: &[u8]) -> Option<DispatchOutcome> {
        if self.config.debug_packets {
            PacketDebugLogger::log_packet(bytes);
        }
        match self.classify(bytes) {
            Ok(packet_type) if packet_type.is_command() => None,
            Ok(packet_type) => {
                debug!("packet type {} is not a command packet, skipping", packet_type);
                Some(DispatchOutcome::NotCommand(packet_type))
            }
            Err(err) => Some(invalid(err)),
        }
    }

    pub(crate) fn complete(&self, decoded: Result<FieldTree, PacketParseError>) -> GprsResult<DispatchOutcome> {
        let tree = match decoded {
            Ok(tree) => tree,
            Err(err) => return Ok(invalid(err)),
        };
        if self.config.debug_packets {
            PacketDebugLogger::log_tree(&tree);
        }
        Ok(DispatchOutcome::Report(self.flatten(&tree)?))
    }
}

pub(crate) fn invalid(err: PacketParseError) -> DispatchOutcome {
    warn!("Invalid report packet! {}", err);
    DispatchOutcome::Invalid(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gprs_common_rs::packet::core::exceptions::GprsPacketError;
    use crate::gprs_common_rs::packet::models::ReportValue;

    fn service() -> GprsService<HeaderByteClassifier, LayoutDecoder> {
        GprsService::from_config(&GprsConfig::default()).unwrap()
    }

    #[test]
    fn test_network_command() {
        let outcome = service().process("0x02 0x05 0x03 0xC0 0xA8 0x01 0x01 0x13 0x88").unwrap();
        let report = outcome.into_report().unwrap();
        assert_eq!(report.reference, ReportValue::UInt(5));
        assert_eq!(report.code, Some(ReportValue::UInt(3)));
        assert_eq!(report.data_value("ip_address"), Some(&ReportValue::from("192.168.1.1")));
        assert_eq!(report.data_value("port"), Some(&ReportValue::UInt(5000)));
    }

    #[test]
    fn test_not_command() {
        let outcome = service().process(vec![0x01, 0x05, 0x03]).unwrap();
        assert_eq!(outcome, DispatchOutcome::NotCommand(PacketType(1)));
        assert!(outcome.into_report().is_none());
    }

    #[test]
    fn test_invalid_inputs() {
        let svc = service();
        assert!(matches!(svc.process("not a packet").unwrap(), DispatchOutcome::Invalid(_)));
        assert!(matches!(svc.process(Vec::<u8>::new()).unwrap(), DispatchOutcome::Invalid(_)));
        // コード1の data が途中で切れている
        assert!(matches!(svc.process(vec![0x02, 0x05, 0x01, 0x01]).unwrap(), DispatchOutcome::Invalid(_)));
    }

    #[test]
    fn test_contract_error_propagates() {
        let schema = SchemaLoader::load_from_json(
            r#"{
                "header": [{"name": "type", "kind": "u8"}, {"name": "ref", "kind": "u8"}],
                "variant": {
                    "name": "type_class",
                    "code": {"name": "code", "kind": "u8"},
                    "cases": {"7": [{"name": "relay_presence_bits", "kind": "bits", "length": 8}]}
                }
            }"#,
        )
        .unwrap();
        let svc = GprsService::new(HeaderByteClassifier::default(), LayoutDecoder::new(), schema, DispatchConfig::default());

        let err = svc.process(vec![0x02, 0x01, 0x07, 0xFF]).unwrap_err();
        assert!(matches!(err, GprsPacketError::Contract(SchemaContractError::MissingValueBits { .. })));
    }

    #[test]
    fn test_debug_packets_path() {
        let mut config = GprsConfig::default();
        config.dispatch.debug_packets = true;
        let svc = GprsService::from_config(&config).unwrap();
        assert!(svc.process(vec![0x02, 0x05]).unwrap().is_report());
    }
}
