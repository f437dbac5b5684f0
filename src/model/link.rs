use std::collections::HashMap;
use std::fmt;

use crate::common::error::FetchError;

/// 一个待抓取的频道预览页（URL 字符串）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source(String);

impl Source {
    pub fn new(url: impl Into<String>) -> Self {
        Source(url.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 一次成功抓取得到的页面原文，只在提取阶段使用一次。
#[derive(Debug, Clone)]
pub struct RawPage {
    pub text: String,
}

impl RawPage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 候选链接是由哪一种提取策略得到的。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `<code>` 标签文本（包含匹配）
    Code,
    /// `<a href>` 属性（前缀匹配）
    Anchor,
    /// 全文正则兜底
    Fallback,
}

/// 从页面中提取出的候选链接。
///
/// `source` 与 `strategy` 只用于日志诊断，不参与去重。
#[derive(Debug, Clone)]
pub struct Candidate {
    /// 页面中的原始文本片段。
    pub text: String,

    /// 候选所在的页面。
    pub source: Source,

    /// 产生该候选的提取策略。
    pub strategy: Strategy,
}

impl Candidate {
    pub fn new(text: impl Into<String>, source: &Source, strategy: Strategy) -> Self {
        Self {
            text: text.into(),
            source: source.clone(),
            strategy,
        }
    }
}

/// 规范化后的代理链接，作为去重键使用。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalLink(String);

impl CanonicalLink {
    pub(crate) fn new(link: String) -> Self {
        CanonicalLink(link)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub key: CanonicalLink,
    /// 该键第一次出现时的原始文本。
    pub representative: String,
    pub source: Source,
}

/// 按插入顺序保存的去重结果，每个规范键至多一条。
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    entries: Vec<ResultEntry>,
    index: HashMap<CanonicalLink, usize>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CanonicalLink) -> Option<&ResultEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultEntry> {
        self.entries.iter()
    }

    pub fn representatives(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.representative.as_str()).collect()
    }

    /// 已存在的键返回 `false`，不覆盖原有记录。
    pub(crate) fn insert_first(&mut self, key: CanonicalLink, representative: String, source: Source) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(ResultEntry { key, representative, source });
        true
    }
}

/// 单个频道抓取失败的记录。
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: Source,
    pub error: FetchError,
}

/// 一次完整采集的统计数据。
#[derive(Debug, Clone, Default)]
pub struct Stats {
    /// 实际发起抓取的频道数（成功 + 失败）。
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 因停止标志而未开始的频道数。
    pub skipped: usize,
    /// 提取到的候选总数（去重、校验之前）。
    pub raw_candidates: usize,
    /// 规范化阶段被丢弃的候选数。
    pub rejected: usize,
    /// 与已有结果重复的候选数。
    pub duplicates: usize,
    /// 最终唯一链接数。
    pub unique: usize,
    pub failures: Vec<SourceFailure>,
}

impl Stats {
    pub fn record_failure(&mut self, source: Source, error: FetchError) {
        self.attempted += 1;
        self.failed += 1;
        self.failures.push(SourceFailure { source, error });
    }

    pub fn record_success(&mut self, candidates: usize) {
        self.attempted += 1;
        self.succeeded += 1;
        self.raw_candidates += candidates;
    }
}
