/// 生パケット入力の正規化
/// バイト列、または "0x02 0x01 0x1A ..." 形式の文字列を受け付ける

use super::exceptions::PacketParseError;
use once_cell::sync::Lazy;
use regex::Regex;

static HEX_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0x([0-9A-Fa-f]+)$").expect("hex token pattern")
});

/// パケット入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketInput {
    /// バイト列そのもの
    Bytes(Vec<u8>),
    /// 空白区切りの 0x トークン列（またはそれ以外の文字列）
    Text(String),
}

impl From<Vec<u8>> for PacketInput {
    fn from(bytes: Vec<u8>) -> Self {
        PacketInput::Bytes(bytes)
    }
}

impl From<&[u8]> for PacketInput {
    fn from(bytes: &[u8]) -> Self {
        PacketInput::Bytes(bytes.to_vec())
    }
}

impl From<String> for PacketInput {
    fn from(text: String) -> Self {
        PacketInput::Text(text)
    }
}

impl From<&str> for PacketInput {
    fn from(text: &str) -> Self {
        PacketInput::Text(text.to_string())
    }
}

impl PacketInput {
    /// 入力をバイト列に正規化する
    ///
    /// 0x トークンを含まない文字列は `NotAPacket` として元の文字列のまま返す。
    pub fn normalize(self) -> Result<Vec<u8>, PacketParseError> {
        match self {
            PacketInput::Bytes(bytes) => Ok(bytes),
            PacketInput::Text(text) => parse_hex_tokens(&text),
        }
    }
}

/// 文字列がトークン形式のパケットに見えるか
pub fn looks_like_hex_packet(text: &str) -> bool {
    text.split_whitespace().any(|token| token.starts_with("0x"))
}

/// "0xA 0xB 0xC" をバイト列に変換
pub fn parse_hex_tokens(text: &str) -> Result<Vec<u8>, PacketParseError> {
    if !looks_like_hex_packet(text) {
        return Err(PacketParseError::NotAPacket(text.to_string()));
    }

    text.split_whitespace()
        .map(|token| {
            let digits = HEX_TOKEN
                .captures(token)
                .and_then(|caps| caps.get(1))
                .ok_or_else(|| PacketParseError::InvalidHexToken(token.to_string()))?;
            u8::from_str_radix(digits.as_str(), 16)
                .map_err(|_| PacketParseError::InvalidHexToken(token.to_string()))
        })
        .collect()
}

/// バイト列を "0x02 0x01 ..." 形式に戻す
pub fn to_hex_tokens(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{}", hex::encode_upper([*b])))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_pass_through() {
        let input = PacketInput::from(vec![0x02, 0x01, 0xFF]);
        assert_eq!(input.normalize().unwrap(), vec![0x02, 0x01, 0xFF]);
    }

    #[test]
    fn test_hex_text() {
        let input = PacketInput::from("0x2 0x1 0x1A 0xff");
        assert_eq!(input.normalize().unwrap(), vec![0x02, 0x01, 0x1A, 0xFF]);
    }

    #[test]
    fn test_token_count_is_preserved() {
        let bytes = parse_hex_tokens("0x00 0x00 0x00").unwrap();
        assert_eq!(bytes.len(), 3);
    }

    #[test]
    fn test_other_text_is_not_a_packet() {
        let err = PacketInput::from("hello world").normalize().unwrap_err();
        assert_eq!(err, PacketParseError::NotAPacket("hello world".to_string()));

        let err = PacketInput::from("").normalize().unwrap_err();
        assert_eq!(err, PacketParseError::NotAPacket(String::new()));
    }

    #[test]
    fn test_bad_tokens() {
        assert_eq!(
            parse_hex_tokens("0x01 0xZZ").unwrap_err(),
            PacketParseError::InvalidHexToken("0xZZ".to_string())
        );
        assert_eq!(
            parse_hex_tokens("0x01 0x100").unwrap_err(),
            PacketParseError::InvalidHexToken("0x100".to_string())
        );
        assert_eq!(
            parse_hex_tokens("0x01 17").unwrap_err(),
            PacketParseError::InvalidHexToken("17".to_string())
        );
    }

    #[test]
    fn test_to_hex_tokens() {
        assert_eq!(to_hex_tokens(&[0x02, 0x0A, 0xC0]), "0x02 0x0A 0xC0");
        assert_eq!(parse_hex_tokens(&to_hex_tokens(&[7, 8, 9])).unwrap(), vec![7, 8, 9]);
    }
}
