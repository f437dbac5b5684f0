use tracing::{debug, trace};

use crate::model::{Candidate, ResultSet};
use crate::service::normalizer::normalize;

/// 单个候选插入后的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// 规范键已存在，保留先到的那条
    Duplicate,
    /// 规范化未通过
    Rejected,
}

/// 按规范键去重，先到先得，保持插入顺序。
#[derive(Debug, Default)]
pub struct Deduplicator {
    results: ResultSet,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, candidate: Candidate) -> InsertOutcome {
        let key = match normalize(&candidate.text) {
            Ok(key) => key,
            Err(reason) => {
                debug!("丢弃候选 {:?}（来自 {}，{:?}）：{}", candidate.text, candidate.source, candidate.strategy, reason);
                return InsertOutcome::Rejected;
            }
        };

        if self.results.insert_first(key, candidate.text, candidate.source) {
            InsertOutcome::Inserted
        } else {
            trace!("重复链接已忽略");
            InsertOutcome::Duplicate
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn finalize(self) -> ResultSet {
        self.results
    }
}
