//! 载荷分块模块
//!
//! 将一个扁平的字符串值映射按插入顺序切分为有序的分块序列，
//! 每个分块受条目数上限和词数启发式软上限约束。
//! 不变量：按顺序拼接所有分块恰好双射地还原原始载荷。

// 第三方crate导入
use serde_json::{Map, Value};

/// 可本地化载荷类型
///
/// 键为不透明字符串且唯一，插入顺序决定分块顺序。
/// serde_json启用preserve_order特性后Map保持插入顺序。
pub type LocalizablePayload = Map<String, Value>;

/// 将载荷切分为有序的分块序列
///
/// 逐条目累积当前分块；每加入一个条目后，满足以下任一条件即关闭
/// （输出并重置）当前分块：
/// (a) 累积词数超过`ideal_word_size`；
/// (b) 累积条目数达到`max_items`；
/// (c) 该条目是载荷的最后一个条目。
///
/// 空载荷产生零个分块（而不是一个空分块）：唯一可能的关闭条件
/// "最后一个条目"永远不会触发。单条目载荷恰好产生一个分块。
pub fn chunk_payload(
    payload: &LocalizablePayload,
    max_items: usize,
    ideal_word_size: usize,
) -> Vec<LocalizablePayload> {
    let mut chunks = Vec::new();
    let mut current = Map::new();
    let mut current_words = 0usize;

    let total = payload.len();
    for (index, (key, value)) in payload.iter().enumerate() {
        current.insert(key.clone(), value.clone());
        current_words += word_count(value);

        let is_last = index + 1 == total;
        if current_words > ideal_word_size || current.len() >= max_items || is_last {
            chunks.push(std::mem::take(&mut current));
            current_words = 0;
        }
    }

    chunks
}

/// 递归统计一个JSON值的词数
///
/// 字符串按空白符连续段切分并丢弃空token；对象对各值递归累加；
/// 数组先以逗号拼接为单个文本再计数，因此相邻元素的边界词合并
/// （`["foo","bar baz"]`计2个词）；其他值（数字、布尔、null）计为零。
pub fn word_count(value: &Value) -> usize {
    match value {
        Value::String(text) => text.split_whitespace().count(),
        Value::Array(_) => coerce_to_text(value).split_whitespace().count(),
        Value::Object(map) => map.values().map(word_count).sum(),
        _ => 0,
    }
}

/// 将数组元素拼接为单个文本（逗号分隔）
fn coerce_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(coerce_to_text)
            .collect::<Vec<_>>()
            .join(","),
        _ => String::new(),
    }
}
