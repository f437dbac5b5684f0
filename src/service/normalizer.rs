//! # normalizer 模块
//!
//! 把候选文本规范成可比较的 [`CanonicalLink`]，用作去重键。
//!
//! 规范化步骤（按顺序）：
//!
//! 1. 去掉首尾空白；
//! 2. 反复做百分号解码并删除 `amp;` 残留，直到文本不再变化；
//! 3. 相对路径 `/proxy?server=` 补全为 `https://t.me/proxy?server=`；
//! 4. 去掉末尾的 `/`；
//! 5. `?` 之前的部分（协议、域名、路径）转小写，查询参数保持原样；
//! 6. 频道预览形式 `https://t.me/s/proxy` 改写为 `https://t.me/proxy`；
//! 7. 截断 `#` 之后的注释；
//! 8. 只接受 `tg://proxy`、`https://t.me/proxy` 本身或其后紧跟 `?` 的结果。
//!
//! 查询参数里的 server/secret 区分大小写，任何一步都不能改动它。

use std::borrow::Cow;

use crate::common::error::Rejection;
use crate::model::CanonicalLink;

const RELATIVE_PREFIX: &str = "/proxy?server=";
const TELEGRAM_ORIGIN: &str = "https://t.me";
const PREVIEW_PREFIX: &str = "https://t.me/s/proxy";
const WEB_PREFIX: &str = "https://t.me/proxy";
const TG_PREFIX: &str = "tg://proxy";

/// 规范化之后允许的链接前缀。
pub const CANONICAL_PREFIXES: [&str; 2] = [TG_PREFIX, WEB_PREFIX];

pub fn normalize(text: &str) -> Result<CanonicalLink, Rejection> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Rejection::Empty);
    }

    let mut link = decode_until_stable(trimmed).trim().to_string();

    if link.starts_with(RELATIVE_PREFIX) {
        link.insert_str(0, TELEGRAM_ORIGIN);
    }

    let link = link.trim_end_matches('/');
    let mut link = lowercase_before_query(link);

    if link.starts_with(PREVIEW_PREFIX) {
        link.replace_range(..PREVIEW_PREFIX.len(), WEB_PREFIX);
    }

    if let Some(pos) = link.find('#') {
        link.truncate(pos);
    }
    let link = link.trim_end_matches(|c: char| c == '/' || c.is_whitespace());

    if link.is_empty() {
        return Err(Rejection::Empty);
    }
    if !is_canonical(link) {
        return Err(Rejection::NonCanonical(link.to_string()));
    }

    Ok(CanonicalLink::new(link.to_string()))
}

/// 以规范前缀开头，且前缀后面紧跟 `?` 或直接结束。
///
/// `https://t.me/proxy_channel`、`https://t.me/ProxyMTProting/1234` 这类频道链接不算。
pub fn is_canonical(link: &str) -> bool {
    CANONICAL_PREFIXES.iter().any(|p| {
        link.strip_prefix(p)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('?'))
    })
}

/// 百分号解码 + 删除 `amp;`，重复到不动点，以处理多次转义的链接。
fn decode_until_stable(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let decoded = percent_decode(&current);
        let next = decoded.replace("amp;", "");
        if next == current {
            return next;
        }
        current = next;
    }
}

fn percent_decode(text: &str) -> Cow<'_, str> {
    if !text.contains('%') {
        return Cow::Borrowed(text);
    }
    let bytes = urlencoding::decode_binary(text.as_bytes());
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

fn lowercase_before_query(link: &str) -> String {
    match link.find('?') {
        Some(pos) => {
            let (head, query) = link.split_at(pos);
            let mut out = head.to_lowercase();
            out.push_str(query);
            out
        }
        None => link.to_lowercase(),
    }
}
