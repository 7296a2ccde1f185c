use crate::gprs_common_rs::packet::core::exceptions::PacketParseError;
use std::fmt;

/// パケット種別コード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketType(pub u8);

impl PacketType {
    /// フラット化の対象となるコマンドパケット
    pub const COMMAND: PacketType = PacketType(2);

    pub fn is_command(&self) -> bool {
        *self == Self::COMMAND
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 生パケットの種別判定
pub trait PacketClassifier: Send + Sync {
    fn classify(&self, bytes: &[u8]) -> Result<PacketType, PacketParseError>;
}

/// ヘッダの固定位置のバイトを種別コードとして読む判定器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderByteClassifier {
    offset: usize,
}

impl HeaderByteClassifier {
    pub fn new(offset: usize) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Default for HeaderByteClassifier {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PacketClassifier for HeaderByteClassifier {
    fn classify(&self, bytes: &[u8]) -> Result<PacketType, PacketParseError> {
        bytes
            .get(self.offset)
            .map(|b| PacketType(*b))
            .ok_or_else(|| PacketParseError::insufficient_data((self.offset + 1) * 8, bytes.len() * 8))
    }
}
