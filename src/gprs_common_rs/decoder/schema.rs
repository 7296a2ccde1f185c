/// コマンドパケットのレイアウト定義
/// JSON からヘッダ・バリアント（type_class）・コード別 data レイアウトを読み込む

use crate::gprs_common_rs::packet::core::exceptions::{GprsPacketError, GprsResult, PacketParseError};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;

/// 1フィールドあたりの最大ビット長
pub const MAX_FIELD_BITS: usize = 1 << 16;

static DEFAULT_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    let json = include_str!("../packet/format_spec/command_schema.json");
    SchemaLoader::load_from_json(json).expect("command schema parse")
});

/// フィールドの型
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpecKind {
    /// 符号なし整数（ビット幅）
    UInt(usize),
    /// 符号付き整数（ビット幅）
    Int(usize),
    /// 1ビットのフラグ
    Bool,
    /// ビット列（ビット数）
    Bits(usize),
    /// バイト列（バイト数）
    Bytes(usize),
    /// 整数配列（要素ビット幅、要素数）
    UIntArray { width: usize, count: usize },
}

impl FieldSpecKind {
    /// ワイヤ上のビット長
    pub fn bit_length(&self) -> usize {
        match self {
            FieldSpecKind::UInt(w) | FieldSpecKind::Int(w) => *w,
            FieldSpecKind::Bool => 1,
            FieldSpecKind::Bits(n) => *n,
            FieldSpecKind::Bytes(n) => n.saturating_mul(8),
            FieldSpecKind::UIntArray { width, count } => width.saturating_mul(*count),
        }
    }
}

/// フィールド仕様
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldSpecKind,
    /// 先行する真偽フィールド名。偽ならこのフィールドは存在しない
    pub condition: Option<String>,
}

/// type_class バリアントの定義
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSpec {
    pub name: String,
    pub code: FieldSpec,
    pub cases: IndexMap<u64, Vec<FieldSpec>>,
}

/// パケットレイアウト
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub header: Vec<FieldSpec>,
    pub variant: Option<VariantSpec>,
}

impl Schema {
    /// 同梱のコマンドパケット定義
    pub fn command() -> &'static Schema {
        &DEFAULT_SCHEMA
    }

    /// コードに対応する data レイアウト
    pub fn case(&self, code: u64) -> Option<&[FieldSpec]> {
        self.variant.as_ref()?.cases.get(&code).map(|v| v.as_slice())
    }

    /// 人が読むためのレイアウト一覧
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for field in &self.header {
            lines.push(describe_field("", field));
        }
        if let Some(variant) = &self.variant {
            lines.push(describe_field(&format!("{}.", variant.name), &variant.code));
            for (code, fields) in &variant.cases {
                for field in fields {
                    lines.push(describe_field(&format!("{}[{}].data.", variant.name, code), field));
                }
            }
        }
        lines
    }
}

fn describe_field(prefix: &str, field: &FieldSpec) -> String {
    let mut line = format!("{}{} ({:?}, {} bits)", prefix, field.name, field.kind, field.kind.bit_length());
    if let Some(cond) = &field.condition {
        line.push_str(&format!(" if {}", cond));
    }
    line
}

/// JSONからレイアウトを読み込む
pub struct SchemaLoader;

impl SchemaLoader {
    pub fn load_from_json(json_str: &str) -> GprsResult<Schema> {
        let json: Value = serde_json::from_str(json_str)
            .map_err(|e| format_error(format!("JSON解析エラー: {}", e)))?;

        let header = match json.get("header") {
            Some(Value::Array(items)) => Self::parse_fields(items)?,
            _ => return Err(format_error("header 配列が見つかりません".to_string())),
        };

        let variant = match json.get("variant") {
            None | Some(Value::Null) => None,
            Some(v) => Some(Self::parse_variant(v)?),
        };

        Ok(Schema { header, variant })
    }

    pub fn load_from_file(path: &std::path::Path) -> GprsResult<Schema> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_json(&content)
    }

    fn parse_variant(def: &Value) -> GprsResult<VariantSpec> {
        let name = def["name"].as_str().unwrap_or("type_class").to_string();
        let code = Self::parse_field(&def["code"])?;
        if code.condition.is_some() {
            return Err(format_error("code フィールドに条件は指定できません".to_string()));
        }

        let mut cases = IndexMap::new();
        if let Some(Value::Object(map)) = def.get("cases") {
            for (key, fields) in map {
                let code_value: u64 = key
                    .parse()
                    .map_err(|_| format_error(format!("不正なコード値: {}", key)))?;
                let fields = match fields {
                    Value::Array(items) => Self::parse_fields(items)?,
                    _ => return Err(format_error(format!("コード {} のフィールドが配列ではありません", key))),
                };
                cases.insert(code_value, fields);
            }
        }

        Ok(VariantSpec { name, code, cases })
    }

    fn parse_fields(items: &[Value]) -> GprsResult<Vec<FieldSpec>> {
        let mut fields: Vec<FieldSpec> = Vec::with_capacity(items.len());
        for item in items {
            let field = Self::parse_field(item)?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(format_error(format!("フィールド名が重複しています: {}", field.name)));
            }
            if let Some(cond) = &field.condition {
                let known = fields
                    .iter()
                    .any(|f| &f.name == cond && matches!(f.kind, FieldSpecKind::Bool | FieldSpecKind::UInt(_)));
                if !known {
                    return Err(format_error(format!(
                        "'{}' の条件 '{}' は先行する真偽フィールドではありません",
                        field.name, cond
                    )));
                }
            }
            fields.push(field);
        }
        Ok(fields)
    }

    fn parse_field(def: &Value) -> GprsResult<FieldSpec> {
        let name = def["name"]
            .as_str()
            .ok_or_else(|| format_error("name フィールドが見つかりません".to_string()))?
            .to_string();
        let kind_str = def["kind"]
            .as_str()
            .ok_or_else(|| format_error(format!("'{}' の kind が見つかりません", name)))?;

        let positive = |key: &str| {
            let n = def[key]
                .as_u64()
                .filter(|n| *n > 0)
                .ok_or_else(|| format_error(format!("'{}' の {} が見つかりません", name, key)))?;
            usize::try_from(n)
                .ok()
                .filter(|n| *n <= MAX_FIELD_BITS)
                .ok_or_else(|| format_error(format!("'{}' の {} が大きすぎます: {}", name, key, n)))
        };
        let length = || positive("length");
        let count = || positive("count");

        let kind = match kind_str {
            "u8" => FieldSpecKind::UInt(8),
            "u16" => FieldSpecKind::UInt(16),
            "u32" => FieldSpecKind::UInt(32),
            "i8" => FieldSpecKind::Int(8),
            "i16" => FieldSpecKind::Int(16),
            "bool" => FieldSpecKind::Bool,
            "uint" => FieldSpecKind::UInt(length()?),
            "bits" => FieldSpecKind::Bits(length()?),
            "bytes" => FieldSpecKind::Bytes(length()?),
            "u8_array" => FieldSpecKind::UIntArray { width: 8, count: count()? },
            "u16_array" => FieldSpecKind::UIntArray { width: 16, count: count()? },
            _ => return Err(format_error(format!("不明なフィールド型: {}", kind_str))),
        };
        if let FieldSpecKind::UInt(w) = kind {
            if w > 64 {
                return Err(format_error(format!("'{}' のビット幅が大きすぎます: {}", name, w)));
            }
        }
        if kind.bit_length() > MAX_FIELD_BITS {
            return Err(format_error(format!(
                "'{}' のビット長が上限 {} を超えています: {}",
                name,
                MAX_FIELD_BITS,
                kind.bit_length()
            )));
        }

        Ok(FieldSpec {
            name,
            kind,
            condition: def["if"].as_str().map(|s| s.to_string()),
        })
    }
}

fn format_error(msg: String) -> GprsPacketError {
    GprsPacketError::Parse(PacketParseError::UnexpectedFormat(msg))
}
