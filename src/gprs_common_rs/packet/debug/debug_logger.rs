use crate::gprs_common_rs::packet::models::FieldTree;
use log::{debug, log_enabled, Level};

/// ディスパッチ層向けのパケット確認ヘルパー
/// - 正規化済みパケットを16進でダンプ
/// - デコード済みツリーのフィールド記述子を一覧（入れ子はインデント）
pub struct PacketDebugLogger;

impl PacketDebugLogger {
    pub fn log_packet(buf: &[u8]) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        match buf.first() {
            Some(ty) => debug!("[PacketDebug] len={} type={} hex={}", buf.len(), ty, hex::encode(buf)),
            None => debug!("[PacketDebug] empty packet"),
        }
    }

    pub fn log_tree(tree: &FieldTree) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        for line in Self::describe_tree(tree) {
            debug!("[PacketDebug] {}", line);
        }
    }

    /// 宣言順の `name: kind` 行
    pub fn describe_tree(tree: &FieldTree) -> Vec<String> {
        let mut lines = Vec::new();
        Self::describe_into(tree, 0, &mut lines);
        lines
    }

    fn describe_into(tree: &FieldTree, depth: usize, lines: &mut Vec<String>) {
        for node in tree.iter() {
            lines.push(format!("{}{}: {}", "  ".repeat(depth), node.name, node.value.kind()));
            if let Some(child) = node.value.as_tree() {
                Self::describe_into(child, depth + 1, lines);
            }
        }
    }
}
