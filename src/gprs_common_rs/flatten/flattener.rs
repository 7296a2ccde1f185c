//! コマンドパケットのフィールドツリーをフラットなレポートに変換する
//!
//! data 部のフィールドは宣言順に走査される。命名規則:
//! - `X_presence_bits` / `X_value_bits` の組は `X_1`, `X_2`, ... に展開
//! - `_` または `has_` で始まる名前、`_bits` を含む名前は出力しない
//! - `ip_address_bytes` は `ip_address`（ドット区切り文字列）に置き換える

use crate::gprs_common_rs::packet::core::bit_utils::{present_indices, reversed};
use crate::gprs_common_rs::packet::core::exceptions::SchemaContractError;
use crate::gprs_common_rs::packet::models::{
    DataMap, FieldKind, FieldTree, FieldValue, FlatReport, ReportValue, Scalar,
};
use log::{debug, trace};

pub const REF_FIELD: &str = "ref";
pub const TYPE_FIELD: &str = "type";
pub const VARIANT_FIELD: &str = "type_class";
pub const CODE_FIELD: &str = "code";
pub const DATA_FIELD: &str = "data";

pub const PRESENCE_SUFFIX: &str = "_presence_bits";
pub const VALUE_SUFFIX: &str = "_value_bits";
pub const IP_ADDRESS_BYTES: &str = "ip_address_bytes";
pub const IP_ADDRESS: &str = "ip_address";

/// presence ビットマップのフィールド名か
pub fn is_presence_bits(name: &str) -> bool {
    name.ends_with(PRESENCE_SUFFIX)
}

/// 出力しない内部フィールドか
pub fn is_hidden_field(name: &str) -> bool {
    name.starts_with('_') || name.starts_with("has_") || name.contains("_bits")
}

pub fn is_ip_address_bytes(name: &str) -> bool {
    name == IP_ADDRESS_BYTES
}

/// フィールドツリー → FlatReport 変換
///
/// 状態を持たない。パケット種別の判定は呼び出し側（ディスパッチ層）で行う。
#[derive(Debug, Clone, Copy, Default)]
pub struct Flattener;

impl Flattener {
    pub fn new() -> Self {
        Flattener
    }

    pub fn flatten(&self, tree: &FieldTree) -> Result<FlatReport, SchemaContractError> {
        let reference = self.required(tree, REF_FIELD)?;
        let packet_type = self.required(tree, TYPE_FIELD)?;
        let mut report = FlatReport::new(reference, packet_type);

        let payload = match tree.get(VARIANT_FIELD) {
            None => {
                debug!("flatten: no {} payload, header-only report", VARIANT_FIELD);
                return Ok(report);
            }
            Some(FieldValue::Nested(payload)) => payload,
            Some(other) => {
                return Err(SchemaContractError::type_mismatch(
                    VARIANT_FIELD,
                    &FieldKind::Nested.to_string(),
                    &other.kind().to_string(),
                ))
            }
        };

        let code = payload
            .get(CODE_FIELD)
            .ok_or_else(|| SchemaContractError::MissingField(format!("{}.{}", VARIANT_FIELD, CODE_FIELD)))?;
        report.code = Some(self.convert(code)?);

        match payload.get(DATA_FIELD) {
            None => {}
            Some(FieldValue::Nested(data)) => {
                let data = self.flatten_data(data)?;
                debug!("flatten: {} data fields", data.len());
                report.data = Some(data);
            }
            Some(other) => {
                return Err(SchemaContractError::type_mismatch(
                    DATA_FIELD,
                    &FieldKind::Nested.to_string(),
                    &other.kind().to_string(),
                ))
            }
        }

        Ok(report)
    }

    /// data 部を宣言順に走査して順序付きマップを作る
    pub fn flatten_data(&self, tree: &FieldTree) -> Result<DataMap, SchemaContractError> {
        let mut data = DataMap::new();

        for node in tree.iter() {
            let key = node.name.as_str();

            if is_presence_bits(key) {
                self.expand_bitmap_pair(tree, key, &node.value, &mut data)?;
            }

            if is_hidden_field(key) {
                continue;
            }

            if is_ip_address_bytes(key) {
                data.insert(IP_ADDRESS.to_string(), ip_address_string(key, &node.value)?);
                continue;
            }

            data.insert(key.to_string(), self.convert(&node.value)?);
        }

        Ok(data)
    }

    fn expand_bitmap_pair(
        &self,
        tree: &FieldTree,
        key: &str,
        presence: &FieldValue,
        data: &mut DataMap,
    ) -> Result<(), SchemaContractError> {
        let type_name = &key[..key.len() - PRESENCE_SUFFIX.len()];
        let value_name = format!("{}{}", type_name, VALUE_SUFFIX);

        let values = tree.get(&value_name).ok_or_else(|| SchemaContractError::MissingValueBits {
            presence: key.to_string(),
            expected: value_name.clone(),
        })?;

        // ビット列は最後の出現から宣言されているので反転して揃える
        let presence = match presence {
            FieldValue::Bits(bits) => reversed(bits),
            other => {
                return Err(SchemaContractError::type_mismatch(
                    key,
                    &FieldKind::BitSequence.to_string(),
                    &other.kind().to_string(),
                ))
            }
        };
        let values = values.reversed().ok_or_else(|| {
            SchemaContractError::type_mismatch(&value_name, "sequence", &values.kind().to_string())
        })?;

        let mismatch = || SchemaContractError::BitmapLengthMismatch {
            field: type_name.to_string(),
            presence_len: presence.len(),
            value_len: values.sequence_len().unwrap_or(0),
        };
        if values.sequence_len() != Some(presence.len()) {
            return Err(mismatch());
        }

        for index in present_indices(&presence) {
            let value = values.element(index).ok_or_else(mismatch)?;
            let key_name = format!("{}_{}", type_name, index + 1);
            trace!("flatten: {} -> {}", key_name, value);
            data.insert(key_name, ReportValue::from(value));
        }

        Ok(())
    }

    fn required(&self, tree: &FieldTree, name: &str) -> Result<ReportValue, SchemaContractError> {
        let value = tree
            .get(name)
            .ok_or_else(|| SchemaContractError::MissingField(name.to_string()))?;
        self.convert(value)
    }

    fn convert(&self, value: &FieldValue) -> Result<ReportValue, SchemaContractError> {
        Ok(match value {
            FieldValue::Scalar(s) => ReportValue::from(s),
            FieldValue::Bytes(b) => ReportValue::Bytes(b.clone()),
            FieldValue::Bits(b) => ReportValue::Bits(b.clone()),
            FieldValue::List(items) => ReportValue::List(items.iter().map(ReportValue::from).collect()),
            FieldValue::Nested(tree) => ReportValue::Map(self.flatten_data(tree)?),
        })
    }
}

fn ip_address_string(key: &str, value: &FieldValue) -> Result<ReportValue, SchemaContractError> {
    let octets: Vec<String> = match value {
        FieldValue::Bytes(bytes) => bytes.iter().map(|b| b.to_string()).collect(),
        FieldValue::List(items) => items
            .iter()
            .map(|item| match item {
                Scalar::UInt(n) => Ok(n.to_string()),
                Scalar::Int(n) => Ok(n.to_string()),
                other => Err(SchemaContractError::type_mismatch(key, "integer", scalar_kind(other))),
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(SchemaContractError::type_mismatch(
                key,
                &FieldKind::ByteSequence.to_string(),
                &other.kind().to_string(),
            ))
        }
    };
    Ok(ReportValue::Text(octets.join(".")))
}

fn scalar_kind(value: &Scalar) -> &'static str {
    match value {
        Scalar::Bool(_) => "bool",
        Scalar::Int(_) | Scalar::UInt(_) => "integer",
        Scalar::Text(_) => "text",
    }
}
