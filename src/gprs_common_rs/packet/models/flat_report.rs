use super::field_tree::Scalar;
use indexmap::IndexMap;
use serde::Serialize;

/// data 部の順序付きマップ（キーは一意、挿入順を保持）
pub type DataMap = IndexMap<String, ReportValue>;

/// レポートに出力される値
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Text(String),
    Bytes(Vec<u8>),
    Bits(Vec<bool>),
    List(Vec<ReportValue>),
    Map(DataMap),
}

impl From<Scalar> for ReportValue {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Bool(v) => ReportValue::Bool(v),
            Scalar::Int(v) => ReportValue::Int(v),
            Scalar::UInt(v) => ReportValue::UInt(v),
            Scalar::Text(v) => ReportValue::Text(v),
        }
    }
}

impl From<&Scalar> for ReportValue {
    fn from(value: &Scalar) -> Self {
        ReportValue::from(value.clone())
    }
}

impl From<&str> for ReportValue {
    fn from(value: &str) -> Self {
        ReportValue::Text(value.to_string())
    }
}

impl From<u64> for ReportValue {
    fn from(value: u64) -> Self {
        ReportValue::UInt(value)
    }
}

impl From<bool> for ReportValue {
    fn from(value: bool) -> Self {
        ReportValue::Bool(value)
    }
}

/// フラット化されたコマンドレポート
///
/// `code` と `data` は存在しない場合キーごと省略される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatReport {
    #[serde(rename = "ref")]
    pub reference: ReportValue,
    #[serde(rename = "type")]
    pub packet_type: ReportValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ReportValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DataMap>,
}

impl FlatReport {
    pub fn new(reference: ReportValue, packet_type: ReportValue) -> Self {
        Self { reference, packet_type, code: None, data: None }
    }

    /// 存在するトップレベルキーの一覧
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["ref", "type"];
        if self.code.is_some() {
            keys.push("code");
        }
        if self.data.is_some() {
            keys.push("data");
        }
        keys
    }

    pub fn data_value(&self, key: &str) -> Option<&ReportValue> {
        self.data.as_ref()?.get(key)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
