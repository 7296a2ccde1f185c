use super::schema::{FieldSpec, FieldSpecKind, Schema};
use crate::gprs_common_rs::packet::core::bit_utils::{bytes_for_bits, load_int_be, load_uint_be, read_bits_msb};
use crate::gprs_common_rs::packet::core::exceptions::PacketParseError;
use crate::gprs_common_rs::packet::models::{FieldTree, FieldValue, Scalar};
use log::debug;

/// スキーマに従ってバイト列をフィールドツリーに変換する
pub trait StructDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], schema: &Schema) -> Result<FieldTree, PacketParseError>;
}

/// Schema をそのまま解釈するデコーダ
///
/// ビットは MSB から順に読み、複数バイトの整数はビッグエンディアン。
/// フィールド間の暗黙のバイト境界合わせは行わない。
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutDecoder;

impl LayoutDecoder {
    pub fn new() -> Self {
        LayoutDecoder
    }
}

struct BitCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.pos)
    }

    fn uint(&mut self, width: usize) -> Result<u64, PacketParseError> {
        let value = load_uint_be(self.bytes, self.pos, width)?;
        self.pos += width;
        Ok(value)
    }

    fn int(&mut self, width: usize) -> Result<i64, PacketParseError> {
        let value = load_int_be(self.bytes, self.pos, width)?;
        self.pos += width;
        Ok(value)
    }

    fn bits(&mut self, length: usize) -> Result<Vec<bool>, PacketParseError> {
        let value = read_bits_msb(self.bytes, self.pos, length)?;
        self.pos += length;
        Ok(value)
    }
}

impl StructDecoder for LayoutDecoder {
    fn decode(&self, bytes: &[u8], schema: &Schema) -> Result<FieldTree, PacketParseError> {
        let mut cursor = BitCursor::new(bytes);
        let mut tree = FieldTree::new();
        decode_fields(&mut cursor, &schema.header, &mut tree)?;

        if let Some(variant) = &schema.variant {
            // コードを読む余地がなければ type_class なし
            if cursor.remaining() >= variant.code.kind.bit_length() {
                let mut payload = FieldTree::new();
                decode_fields(&mut cursor, std::slice::from_ref(&variant.code), &mut payload)?;

                let code = match payload.get(&variant.code.name) {
                    Some(FieldValue::Scalar(Scalar::UInt(code))) => Some(*code),
                    _ => None,
                };
                match code.and_then(|c| schema.case(c)) {
                    Some(fields) => {
                        let mut data = FieldTree::new();
                        decode_fields(&mut cursor, fields, &mut data)?;
                        push(&mut payload, "data", FieldValue::Nested(data))?;
                    }
                    None => debug!("decode: no data layout for code {:?}", code),
                }
                push(&mut tree, &variant.name, FieldValue::Nested(payload))?;
            }
        }

        let used = bytes_for_bits(cursor.pos);
        if used < bytes.len() {
            debug!("decode: {} trailing bytes ignored", bytes.len() - used);
        }
        Ok(tree)
    }
}

fn decode_fields(cursor: &mut BitCursor<'_>, fields: &[FieldSpec], tree: &mut FieldTree) -> Result<(), PacketParseError> {
    for field in fields {
        if let Some(cond) = &field.condition {
            if !condition_holds(tree, cond) {
                continue;
            }
        }
        let value = decode_value(cursor, &field.kind)?;
        push(tree, &field.name, value)?;
    }
    Ok(())
}

fn decode_value(cursor: &mut BitCursor<'_>, kind: &FieldSpecKind) -> Result<FieldValue, PacketParseError> {
    Ok(match kind {
        FieldSpecKind::UInt(width) => FieldValue::Scalar(Scalar::UInt(cursor.uint(*width)?)),
        FieldSpecKind::Int(width) => FieldValue::Scalar(Scalar::Int(cursor.int(*width)?)),
        FieldSpecKind::Bool => FieldValue::Scalar(Scalar::Bool(cursor.uint(1)? == 1)),
        FieldSpecKind::Bits(length) => FieldValue::Bits(cursor.bits(*length)?),
        FieldSpecKind::Bytes(length) => FieldValue::Bytes(
            (0..*length)
                .map(|_| cursor.uint(8).map(|b| b as u8))
                .collect::<Result<Vec<u8>, _>>()?,
        ),
        FieldSpecKind::UIntArray { width, count } => FieldValue::List(
            (0..*count)
                .map(|_| cursor.uint(*width).map(Scalar::UInt))
                .collect::<Result<Vec<Scalar>, _>>()?,
        ),
    })
}

fn condition_holds(tree: &FieldTree, name: &str) -> bool {
    match tree.get(name) {
        Some(FieldValue::Scalar(Scalar::Bool(flag))) => *flag,
        Some(FieldValue::Scalar(Scalar::UInt(n))) => *n != 0,
        _ => false,
    }
}

fn push(tree: &mut FieldTree, name: &str, value: FieldValue) -> Result<(), PacketParseError> {
    tree.push(name, value)
        .map_err(|e| PacketParseError::UnexpectedFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gprs_common_rs::decoder::schema::SchemaLoader;

    #[test]
    fn test_decode_diagnostic() {
        let bytes = [0x02, 0x07, 0x01, 1, 2, 3, 0x10, 0x1F, 0x05, 0x30, 0x39, 0x00, 0xFF];
        let tree = LayoutDecoder::new().decode(&bytes, Schema::command()).unwrap();

        assert_eq!(tree.get("type"), Some(&FieldValue::Scalar(Scalar::UInt(2))));
        assert_eq!(tree.get("ref"), Some(&FieldValue::Scalar(Scalar::UInt(7))));

        let payload = tree.get("type_class").and_then(|v| v.as_tree()).unwrap();
        assert_eq!(payload.get("code"), Some(&FieldValue::Scalar(Scalar::UInt(1))));

        let data = payload.get("data").and_then(|v| v.as_tree()).unwrap();
        assert_eq!(data.get("int_voltage"), Some(&FieldValue::Scalar(Scalar::UInt(12345))));
        assert_eq!(data.get("ext_voltage"), Some(&FieldValue::Scalar(Scalar::UInt(255))));
    }

    #[test]
    fn test_header_only_packet() {
        let tree = LayoutDecoder::new().decode(&[0x02, 0x09], Schema::command()).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.get("type_class").is_none());
    }

    #[test]
    fn test_unknown_code_has_no_data() {
        let tree = LayoutDecoder::new().decode(&[0x02, 0x09, 0x63], Schema::command()).unwrap();
        let payload = tree.get("type_class").and_then(|v| v.as_tree()).unwrap();
        assert_eq!(payload.get("code"), Some(&FieldValue::Scalar(Scalar::UInt(99))));
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn test_short_packet() {
        let err = LayoutDecoder::new().decode(&[0x02], Schema::command()).unwrap_err();
        assert_eq!(err, PacketParseError::insufficient_data(16, 8));

        // コード1は 10 バイトの data が必要
        let err = LayoutDecoder::new().decode(&[0x02, 0x01, 0x01, 0x00], Schema::command()).unwrap_err();
        assert!(matches!(err, PacketParseError::InsufficientData { .. }));
    }

    #[test]
    fn test_conditional_fields() {
        let json = r#"{
            "header": [
                {"name": "has_temp", "kind": "bool"},
                {"name": "has_volt", "kind": "bool"},
                {"name": "_pad", "kind": "uint", "length": 6},
                {"name": "temp", "kind": "i8", "if": "has_temp"},
                {"name": "volt", "kind": "u16", "if": "has_volt"}
            ]
        }"#;
        let schema = SchemaLoader::load_from_json(json).unwrap();
        let tree = LayoutDecoder::new().decode(&[0b1000_0000, 0xF6], &schema).unwrap();

        assert_eq!(tree.get("temp"), Some(&FieldValue::Scalar(Scalar::Int(-10))));
        assert!(tree.get("volt").is_none());
        let names: Vec<String> = tree.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["has_temp", "has_volt", "_pad", "temp"]);
    }

    #[test]
    fn test_oversize_field_fails_to_decode() {
        let schema = Schema {
            header: vec![
                FieldSpec { name: "type".into(), kind: FieldSpecKind::UInt(8), condition: None },
                FieldSpec { name: "x_presence_bits".into(), kind: FieldSpecKind::Bits(usize::MAX), condition: None },
            ],
            variant: None,
        };
        let err = LayoutDecoder::new().decode(&[0x02, 0xFF], &schema).unwrap_err();
        assert!(matches!(err, PacketParseError::InsufficientData { .. }));

        let schema = Schema {
            header: vec![FieldSpec { name: "blob".into(), kind: FieldSpecKind::Bytes(usize::MAX), condition: None }],
            variant: None,
        };
        assert!(LayoutDecoder::new().decode(&[0x02, 0xFF], &schema).is_err());
    }

    #[test]
    fn test_bitmap_fields_are_msb_first() {
        let json = r#"{
            "header": [
                {"name": "input_presence_bits", "kind": "bits", "length": 4},
                {"name": "input_value_bits", "kind": "bits", "length": 4}
            ]
        }"#;
        let schema = SchemaLoader::load_from_json(json).unwrap();
        let tree = LayoutDecoder::new().decode(&[0b0011_0001], &schema).unwrap();
        assert_eq!(tree.get("input_presence_bits"), Some(&FieldValue::Bits(vec![false, false, true, true])));
        assert_eq!(tree.get("input_value_bits"), Some(&FieldValue::Bits(vec![false, false, false, true])));
    }
}
