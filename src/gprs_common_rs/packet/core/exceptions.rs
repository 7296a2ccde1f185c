/// GPRS パケット処理用エラー型定義
/// 入力正規化・デコード・フラット化・設定読み込みの各層のエラー

use std::fmt;
use std::error::Error;

/// パケット解析エラー（不正な入力パケット）
#[derive(Debug, Clone, PartialEq)]
pub enum PacketParseError {
    /// データが短すぎる
    InsufficientData { required: usize, actual: usize },
    /// 16進トークンとして解釈できない
    InvalidHexToken(String),
    /// パケット形式ではない文字列
    NotAPacket(String),
    /// 予期しないデータ形式
    UnexpectedFormat(String),
}

impl fmt::Display for PacketParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketParseError::InsufficientData { required, actual } => {
                write!(f, "データが不足しています: 必要 {}ビット, 実際 {}ビット", required, actual)
            }
            PacketParseError::InvalidHexToken(token) => {
                write!(f, "不正な16進トークン: '{}'", token)
            }
            PacketParseError::NotAPacket(text) => {
                write!(f, "パケット形式ではありません: '{}'", text)
            }
            PacketParseError::UnexpectedFormat(msg) => {
                write!(f, "予期しないデータ形式: {}", msg)
            }
        }
    }
}

impl Error for PacketParseError {}

/// フィールドツリーとフラット化処理の間の契約違反
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaContractError {
    /// 必須フィールドが存在しない
    MissingField(String),
    /// _presence_bits に対応する _value_bits が存在しない
    MissingValueBits { presence: String, expected: String },
    /// presence と value の長さが一致しない
    BitmapLengthMismatch { field: String, presence_len: usize, value_len: usize },
    /// フィールド型不一致
    TypeMismatch { field: String, expected: String, actual: String },
    /// 同名フィールドの重複
    DuplicateField(String),
}

impl fmt::Display for SchemaContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaContractError::MissingField(field) => {
                write!(f, "必須フィールド '{}' がありません", field)
            }
            SchemaContractError::MissingValueBits { presence, expected } => {
                write!(f, "'{}' に対応する '{}' がありません", presence, expected)
            }
            SchemaContractError::BitmapLengthMismatch { field, presence_len, value_len } => {
                write!(f, "'{}' のビットマップ長が一致しません: presence {}, value {}", field, presence_len, value_len)
            }
            SchemaContractError::TypeMismatch { field, expected, actual } => {
                write!(f, "フィールド '{}' の型不一致: 期待 {}, 実際 {}", field, expected, actual)
            }
            SchemaContractError::DuplicateField(field) => {
                write!(f, "フィールド '{}' が重複しています", field)
            }
        }
    }
}

impl Error for SchemaContractError {}

/// 設定エラー
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 設定ファイルの読み込み失敗
    Read(String),
    /// 設定ファイルの解析失敗
    Parse(String),
    /// 環境変数の値が不正
    InvalidEnv { key: String, value: String },
    /// 設定値が制約に違反
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(msg) => write!(f, "設定ファイルを読み込めません: {}", msg),
            ConfigError::Parse(msg) => write!(f, "設定ファイルの解析に失敗しました: {}", msg),
            ConfigError::InvalidEnv { key, value } => {
                write!(f, "環境変数 {} の値が不正です: '{}'", key, value)
            }
            ConfigError::Invalid(msg) => write!(f, "不正な設定: {}", msg),
        }
    }
}

impl Error for ConfigError {}

/// GPRS パケット処理の統合エラー型
#[derive(Debug, Clone, PartialEq)]
pub enum GprsPacketError {
    /// パケット解析エラー
    Parse(PacketParseError),
    /// スキーマ契約違反
    Contract(SchemaContractError),
    /// 設定エラー
    Config(ConfigError),
    /// I/O エラー
    Io(String),
    /// デコードのタイムアウト
    Timeout(u64),
}

impl fmt::Display for GprsPacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GprsPacketError::Parse(err) => write!(f, "パケット解析エラー: {}", err),
            GprsPacketError::Contract(err) => write!(f, "スキーマ契約違反: {}", err),
            GprsPacketError::Config(err) => write!(f, "設定エラー: {}", err),
            GprsPacketError::Io(msg) => write!(f, "I/Oエラー: {}", msg),
            GprsPacketError::Timeout(ms) => write!(f, "デコードが {}ms 以内に完了しませんでした", ms),
        }
    }
}

impl Error for GprsPacketError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GprsPacketError::Parse(err) => Some(err),
            GprsPacketError::Contract(err) => Some(err),
            GprsPacketError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PacketParseError> for GprsPacketError {
    fn from(err: PacketParseError) -> Self {
        GprsPacketError::Parse(err)
    }
}

impl From<SchemaContractError> for GprsPacketError {
    fn from(err: SchemaContractError) -> Self {
        GprsPacketError::Contract(err)
    }
}

impl From<ConfigError> for GprsPacketError {
    fn from(err: ConfigError) -> Self {
        GprsPacketError::Config(err)
    }
}

impl From<std::io::Error> for GprsPacketError {
    fn from(err: std::io::Error) -> Self {
        GprsPacketError::Io(err.to_string())
    }
}

/// Result型のエイリアス
pub type GprsResult<T> = Result<T, GprsPacketError>;

impl PacketParseError {
    /// データ不足エラーを作成（ビット単位）
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        PacketParseError::InsufficientData { required, actual }
    }
}

impl SchemaContractError {
    /// 型不一致エラーを作成
    pub fn type_mismatch(field: &str, expected: &str, actual: &str) -> Self {
        SchemaContractError::TypeMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
