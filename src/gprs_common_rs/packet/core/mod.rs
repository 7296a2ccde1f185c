//! パケットコア機能
//! 入力の正規化、ビット操作、エラー処理

pub mod exceptions;
pub mod bit_utils;
pub mod packet_input;

// 便利な再エクスポート
pub use exceptions::{PacketParseError, SchemaContractError, ConfigError, GprsPacketError, GprsResult};
pub use bit_utils::{reversed, present_indices, read_bits_msb, load_uint_be, load_int_be};
pub use packet_input::{PacketInput, parse_hex_tokens, to_hex_tokens};
