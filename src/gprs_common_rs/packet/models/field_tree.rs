use crate::gprs_common_rs::packet::core::exceptions::SchemaContractError;
use std::fmt;

/// デコード済みスカラー値
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::UInt(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "\"{}\"", v),
        }
    }
}

/// フィールドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    ByteSequence,
    BitSequence,
    ScalarSequence,
    Nested,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar => write!(f, "scalar"),
            FieldKind::ByteSequence => write!(f, "byte-sequence"),
            FieldKind::BitSequence => write!(f, "bit-sequence"),
            FieldKind::ScalarSequence => write!(f, "scalar-sequence"),
            FieldKind::Nested => write!(f, "nested"),
        }
    }
}

/// フィールド値
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Bytes(Vec<u8>),
    Bits(Vec<bool>),
    List(Vec<Scalar>),
    Nested(FieldTree),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Scalar(_) => FieldKind::Scalar,
            FieldValue::Bytes(_) => FieldKind::ByteSequence,
            FieldValue::Bits(_) => FieldKind::BitSequence,
            FieldValue::List(_) => FieldKind::ScalarSequence,
            FieldValue::Nested(_) => FieldKind::Nested,
        }
    }

    /// シーケンス型の要素数。シーケンスでなければ None
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            FieldValue::Bytes(v) => Some(v.len()),
            FieldValue::Bits(v) => Some(v.len()),
            FieldValue::List(v) => Some(v.len()),
            FieldValue::Scalar(_) | FieldValue::Nested(_) => None,
        }
    }

    /// シーケンスを逆順にした値。シーケンスでなければ None
    pub fn reversed(&self) -> Option<FieldValue> {
        use crate::gprs_common_rs::packet::core::bit_utils::reversed;
        match self {
            FieldValue::Bytes(v) => Some(FieldValue::Bytes(reversed(v))),
            FieldValue::Bits(v) => Some(FieldValue::Bits(reversed(v))),
            FieldValue::List(v) => Some(FieldValue::List(reversed(v))),
            FieldValue::Scalar(_) | FieldValue::Nested(_) => None,
        }
    }

    /// シーケンスの i 番目の要素をスカラーとして取り出す
    pub fn element(&self, index: usize) -> Option<Scalar> {
        match self {
            FieldValue::Bytes(v) => v.get(index).map(|b| Scalar::UInt(*b as u64)),
            FieldValue::Bits(v) => v.get(index).map(|b| Scalar::Bool(*b)),
            FieldValue::List(v) => v.get(index).cloned(),
            FieldValue::Scalar(_) | FieldValue::Nested(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&FieldTree> {
        match self {
            FieldValue::Nested(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        FieldValue::Scalar(value)
    }
}

/// 名前付きフィールド
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub name: String,
    pub value: FieldValue,
}

/// フィールド記述子（名前と種類の組）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

/// 宣言順を保持するフィールドツリー
///
/// 同一ツリー内のフィールド名は一意。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldTree {
    fields: Vec<FieldNode>,
}

impl FieldTree {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// フィールドを末尾に追加。同名フィールドがあればエラー
    pub fn push(&mut self, name: &str, value: FieldValue) -> Result<(), SchemaContractError> {
        if self.contains(name) {
            return Err(SchemaContractError::DuplicateField(name.to_string()));
        }
        self.fields.push(FieldNode { name: name.to_string(), value });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldNode> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 宣言順の記述子一覧
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        self.fields
            .iter()
            .map(|f| FieldDescriptor { name: f.name.clone(), kind: f.value.kind() })
            .collect()
    }

    // テストや手組みのツリー向けのビルダー

    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        // ビルダーでは後勝ちにせず最初の宣言を残す
        if !self.contains(name) {
            self.fields.push(FieldNode { name: name.to_string(), value });
        }
        self
    }

    pub fn with_uint(self, name: &str, value: u64) -> Self {
        self.with(name, FieldValue::Scalar(Scalar::UInt(value)))
    }

    pub fn with_bool(self, name: &str, value: bool) -> Self {
        self.with(name, FieldValue::Scalar(Scalar::Bool(value)))
    }

    pub fn with_text(self, name: &str, value: &str) -> Self {
        self.with(name, FieldValue::Scalar(Scalar::Text(value.to_string())))
    }

    pub fn with_bytes(self, name: &str, value: &[u8]) -> Self {
        self.with(name, FieldValue::Bytes(value.to_vec()))
    }

    pub fn with_bits(self, name: &str, value: &[bool]) -> Self {
        self.with(name, FieldValue::Bits(value.to_vec()))
    }

    pub fn with_list(self, name: &str, value: Vec<Scalar>) -> Self {
        self.with(name, FieldValue::List(value))
    }

    pub fn with_tree(self, name: &str, value: FieldTree) -> Self {
        self.with(name, FieldValue::Nested(value))
    }
}
