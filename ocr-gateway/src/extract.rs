//! 文本清洗与购物条目抽取

use std::sync::LazyLock;

use regex::Regex;

/// 抽取结果上限，防止异常输入撑爆下游
const MAX_ITEMS: usize = 50;

/// 项目符号：- * 及各类圆点方点
static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•◦▪▫‣⁃]\s*").unwrap());
/// 序号："1." "2" 等
static NUMBER_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.?\s*").unwrap());
/// 括号注记："(2x)" 等
static PAREN_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\([^)]*\)\s*").unwrap());
/// 行内连续空白
static INNER_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// 清洗识别文本：去掉空行、压缩行内空白，保留换行结构
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| INNER_SPACE.replace_all(line, " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// 从识别文本中抽取购物条目。
///
/// 每行去掉列表标记后作为一个条目；过短（<2）或过长（>100）的行、
/// 以及看起来是标题的行（含 shopping/list/grocery/store/market）
/// 会被跳过。最多返回 50 条。
pub fn extract_shopping_items(text: &str) -> Vec<String> {
    const HEADER_WORDS: &[&str] = &["shopping", "list", "grocery", "store", "market"];

    let mut items = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let line = BULLET_MARKER.replace(line, "");
        let line = NUMBER_MARKER.replace(&line, "");
        let line = PAREN_MARKER.replace(&line, "");
        let line = line.trim();

        if line.len() < 2 || line.len() > 100 {
            continue;
        }

        let lower = line.to_lowercase();
        if HEADER_WORDS.iter().any(|word| lower.contains(word)) {
            continue;
        }

        items.push(line.to_string());
        if items.len() >= MAX_ITEMS {
            break;
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_normalizes_whitespace() {
        let raw = "  Apples   2kg  \n\n\n  Whole   milk \n";
        assert_eq!(clean_text(raw), "Apples 2kg\nWhole milk");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \n  \n"), "");
    }

    #[test]
    fn test_extract_numbered_list() {
        let text = "Shopping List:\n1. Apples\n2. Bread\n3. Milk\n4. Eggs";
        let items = extract_shopping_items(text);
        assert_eq!(items, vec!["Apples", "Bread", "Milk", "Eggs"]);
    }

    #[test]
    fn test_extract_bullet_markers() {
        let text = "- Butter\n* Cheese\n• Yoghurt\n◦ Honey";
        let items = extract_shopping_items(text);
        assert_eq!(items, vec!["Butter", "Cheese", "Yoghurt", "Honey"]);
    }

    #[test]
    fn test_extract_strips_paren_notes() {
        let items = extract_shopping_items("(2x) Olive oil\n(organic) Carrots");
        assert_eq!(items, vec!["Olive oil", "Carrots"]);
    }

    #[test]
    fn test_extract_skips_headers_and_outliers() {
        let long_line = "x".repeat(150);
        let text = format!("Grocery Store\nA\n{long_line}\nRice");
        let items = extract_shopping_items(&text);
        // "Grocery Store" is a header, "A" is too short, the long line too long
        assert_eq!(items, vec!["Rice"]);
    }

    #[test]
    fn test_extract_caps_at_fifty() {
        let text = (0..80)
            .map(|i| format!("Item number {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(extract_shopping_items(&text).len(), 50);
    }

    #[test]
    fn test_extract_empty_text() {
        assert!(extract_shopping_items("").is_empty());
    }
}
