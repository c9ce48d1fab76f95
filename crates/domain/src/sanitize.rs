//! 统一的文本清洗
//!
//! 所有写入边界（参与者名称、消息字段）以及所有身份比较之前都必须经过
//! [`sanitize`]，保证存储值与比较值使用同一套规则。

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")
        .expect("script/style pattern is valid")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// 去除 HTML 标签（`script`/`style` 连同内容一起去除）并裁剪首尾空白。
///
/// 函数是幂等的：`sanitize(sanitize(x)) == sanitize(x)`。
pub fn sanitize(text: &str) -> String {
    let without_blocks = SCRIPT_OR_STYLE.replace_all(text, "");
    let without_tags = TAG.replace_all(&without_blocks, "");
    without_tags.trim().to_owned()
}
