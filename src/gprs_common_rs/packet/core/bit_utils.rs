/// ビット操作ユーティリティ
/// コマンドパケットのビット列は MSB から順に宣言されている

use super::exceptions::PacketParseError;
use bitvec::prelude::*;

/// 宣言順のシーケンスを論理順（インデックス0が最初の出現）に揃える
pub fn reversed<T: Clone>(seq: &[T]) -> Vec<T> {
    seq.iter().rev().cloned().collect()
}

/// true になっているインデックスの一覧
pub fn present_indices(bits: &[bool]) -> Vec<usize> {
    bits.iter()
        .enumerate()
        .filter_map(|(i, present)| if *present { Some(i) } else { None })
        .collect()
}

/// 合計ビット長に必要なバイト数
pub fn bytes_for_bits(bits: usize) -> usize {
    (bits + 7) / 8
}

fn check_range(bytes: &[u8], bit_offset: usize, length: usize) -> Result<(), PacketParseError> {
    let available = bytes.len() * 8;
    match bit_offset.checked_add(length) {
        Some(end) if end <= available => Ok(()),
        end => Err(PacketParseError::insufficient_data(end.unwrap_or(usize::MAX), available)),
    }
}

/// 指定ビット位置から MSB 順にビット列を読み出す
///
/// Args:
///     bytes: 元データ
///     bit_offset: 先頭からのビット位置（MSB基準）
///     length: 読み出すビット数
pub fn read_bits_msb(bytes: &[u8], bit_offset: usize, length: usize) -> Result<Vec<bool>, PacketParseError> {
    check_range(bytes, bit_offset, length)?;
    let bits = BitSlice::<u8, Msb0>::from_slice(bytes);
    Ok(bits[bit_offset..bit_offset + length].iter().by_vals().collect())
}

/// 指定ビット範囲をビッグエンディアンの符号なし整数として読み出す
pub fn load_uint_be(bytes: &[u8], bit_offset: usize, length: usize) -> Result<u64, PacketParseError> {
    if length == 0 || length > 64 {
        return Err(PacketParseError::UnexpectedFormat(format!(
            "整数フィールドのビット長が不正です: {}",
            length
        )));
    }
    check_range(bytes, bit_offset, length)?;
    let bits = BitSlice::<u8, Msb0>::from_slice(bytes);
    Ok(bits[bit_offset..bit_offset + length]
        .iter()
        .by_vals()
        .fold(0u64, |acc, bit| (acc << 1) | bit as u64))
}

/// 符号付き整数として読み出す（2の補数）
pub fn load_int_be(bytes: &[u8], bit_offset: usize, length: usize) -> Result<i64, PacketParseError> {
    let raw = load_uint_be(bytes, bit_offset, length)?;
    if length == 64 {
        return Ok(raw as i64);
    }
    let sign = 1u64 << (length - 1);
    if raw & sign != 0 {
        Ok((raw | !((1u64 << length) - 1)) as i64)
    } else {
        Ok(raw as i64)
    }
}
