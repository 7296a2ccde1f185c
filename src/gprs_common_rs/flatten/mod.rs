//! フィールドツリーのフラット化

pub mod flattener;

pub use flattener::{is_hidden_field, is_ip_address_bytes, is_presence_bits, Flattener};
