//! # matcher 模块
//!
//! 从频道预览页的 HTML 中找出所有疑似代理链接的片段。
//!
//! 三种提取方式按优先级执行：
//!
//! - `<code>` 标签文本：包含任一前缀即可，允许链接前后带说明文字；
//! - `<a href>` 属性：必须以前缀开头；
//! - 全文正则兜底：只有前两种方式在该页一个都没找到时才执行，
//!   用来抓取没有任何标签包裹的纯文本链接。
//!
//! 这里只负责"找"，不做校验，宁可多抓，交给 normalizer 过滤。

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::model::{Candidate, Source, Strategy};

/// 识别用的链接前缀。
pub const PROXY_PREFIXES: [&str; 4] = [
    "https://t.me/proxy?server=",
    "tg://proxy?server=",
    RELATIVE_PREFIX,
    "https://t.me/s/proxy?server=",
];

const RELATIVE_PREFIX: &str = "/proxy?server=";
const TELEGRAM_ORIGIN: &str = "https://t.me";

static CODE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("code").expect("Invalid code selector"));

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("Invalid anchor selector"));

/// 终止符：空白、引号、尖括号、右括号
static PROXY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:tg://proxy|https://t\.me/proxy|/proxy\?server=)[^\s'"<>)]+"#)
        .expect("Invalid proxy regex")
});

fn is_terminator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\'' | '"' | '<' | '>' | ')')
}

/// 提取一页中的全部候选链接。
pub fn extract(source: &Source, page: &str) -> Vec<Candidate> {
    let mut candidates = extract_tagged(source, page);

    if candidates.is_empty() {
        candidates = extract_fallback(source, page);
        if !candidates.is_empty() {
            debug!("{} 标签中未找到代理，正则兜底得到 {} 条", source, candidates.len());
        }
    }

    candidates
}

/// `<code>` 与 `<a href>` 两种基于标签的提取。
fn extract_tagged(source: &Source, page: &str) -> Vec<Candidate> {
    let doc = Html::parse_document(page);
    let mut candidates = Vec::new();

    for code in doc.select(&CODE_SELECTOR) {
        let text: String = code.text().collect();
        candidates.extend(
            code_links(text.trim())
                .into_iter()
                .map(|link| Candidate::new(absolutize(link), source, Strategy::Code)),
        );
    }

    for anchor in doc.select(&ANCHOR_SELECTOR) {
        let href = anchor.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() {
            continue;
        }
        if PROXY_PREFIXES.iter().any(|p| href.starts_with(p)) {
            candidates.push(Candidate::new(absolutize(href), source, Strategy::Anchor));
        }
    }

    candidates
}

/// 补全相对路径并清除 `amp;` 转义残留，使保留下来的原文可以直接使用。
fn absolutize(link: &str) -> String {
    let link = link.replace("amp;", "");
    if link.starts_with(RELATIVE_PREFIX) {
        format!("{TELEGRAM_ORIGIN}{link}")
    } else {
        link
    }
}

/// 在 `<code>` 文本中按终止符切分，找出包含前缀的片段。
///
/// 明文片段从最早出现的前缀处截取（不区分大小写）；相对路径 `/proxy?server=`
/// 前面若还带着别的域名，就不是 Telegram 链接，不截取。只有解码后才含前缀的片段
/// （被转义过的链接）原样返回，解码交给 normalizer。
fn code_links(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    text.split(is_terminator)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            if let Some(pos) = link_start(token) {
                return Some(&token[pos..]);
            }
            if token.contains('%') {
                let decoded = urlencoding::decode_binary(token.as_bytes());
                let decoded = String::from_utf8_lossy(&decoded);
                if PROXY_PREFIXES.iter().any(|p| decoded.contains(p)) {
                    return Some(token);
                }
            }
            None
        })
        .collect()
}

/// 片段中代理链接的起始位置。
fn link_start(token: &str) -> Option<usize> {
    let lower = token.to_ascii_lowercase();
    let absolute = PROXY_PREFIXES
        .iter()
        .filter(|p| **p != RELATIVE_PREFIX)
        .filter_map(|p| lower.find(p))
        .min();
    let relative = lower
        .find(RELATIVE_PREFIX)
        .filter(|&pos| !has_host_before(&lower[..pos]));

    match (absolute, relative) {
        (Some(a), Some(r)) => Some(a.min(r)),
        (a, r) => a.or(r),
    }
}

/// `/proxy?server=` 之前是否紧挨着协议或域名（如 `https://evil.example`）。
fn has_host_before(head: &str) -> bool {
    head.contains("://")
        || head
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '/' | '_'))
}

fn extract_fallback(source: &Source, page: &str) -> Vec<Candidate> {
    PROXY_REGEX
        .find_iter(page)
        .filter(|m| {
            let relative = m.as_str().to_ascii_lowercase().starts_with(RELATIVE_PREFIX);
            let head = page[..m.start()].rsplit(is_terminator).next().unwrap_or_default();
            !(relative && has_host_before(head))
        })
        .map(|m| Candidate::new(absolutize(m.as_str()), source, Strategy::Fallback))
        .collect()
}
