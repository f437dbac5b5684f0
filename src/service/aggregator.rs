//! # aggregator 模块
//!
//! 串起整条采集流程：抓取 → 提取 → 规范化 → 去重，并生成统计。
//!
//! - 多个频道并发抓取，数量受 `concurrency` 限制；
//! - 每次抓取都有独立超时，某个频道失败只记入统计，不影响其他频道；
//! - 所有候选由唯一的消费循环写入 [`Deduplicator`]，结果按频道列表顺序交付，
//!   因此并发时输出依旧是确定的；
//! - 停止标志被置位后，尚未开始的频道直接跳过。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::{stream, StreamExt};
use tracing::{debug, info, warn};

use crate::common::error::FetchError;
use crate::fetcher::Fetcher;
use crate::model::{HarvestConfig, RawPage, ResultSet, Source, Stats};
use crate::service::dedup::{Deduplicator, InsertOutcome};
use crate::service::matcher;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 同时进行的抓取数量，最小为 1。
    pub concurrency: usize,
    /// 单个频道的超时时间。
    pub timeout: Duration,
    /// 置位后跳过剩余未开始的频道。
    pub stop: Option<Arc<AtomicBool>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(15),
            stop: None,
        }
    }
}

impl RunOptions {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            timeout: config.timeout(),
            stop: None,
        }
    }

    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stopped(&self) -> bool {
        self.stop.as_ref().is_some_and(|s| s.load(Ordering::SeqCst))
    }
}

enum SourceOutcome {
    Skipped,
    Fetched(Result<RawPage, FetchError>),
}

/// 对全部频道执行一次采集，返回去重结果与统计。
///
/// 不会返回错误：最坏情况是结果为空。
pub async fn run<F>(sources: &[Source], fetcher: &F, options: &RunOptions) -> (ResultSet, Stats)
where
    F: Fetcher + ?Sized,
{
    info!("========== [频道抓取阶段] ==========");
    info!("🚀 开始抓取 {} 个频道，并发数 {}", sources.len(), options.concurrency.max(1));

    let started = Instant::now();
    let mut stats = Stats::default();
    let mut dedup = Deduplicator::new();

    let mut outcomes = stream::iter(sources.iter().enumerate())
        .map(|(i, source)| async move {
            if options.stopped() {
                return (i, source, SourceOutcome::Skipped);
            }
            let result = match tokio::time::timeout(options.timeout, fetcher.fetch(source, options.timeout)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(options.timeout)),
            };
            (i, source, SourceOutcome::Fetched(result))
        })
        .buffered(options.concurrency.max(1));

    while let Some((i, source, outcome)) = outcomes.next().await {
        let label = format!("[#{} {}]", i + 1, source);
        match outcome {
            SourceOutcome::Skipped => {
                debug!("⏹ {} 已停止，跳过", label);
                stats.skipped += 1;
            }
            SourceOutcome::Fetched(Err(e)) => {
                warn!("🔴 {} 抓取失败：{}", label, e);
                stats.record_failure(source.clone(), e);
            }
            SourceOutcome::Fetched(Ok(page)) => {
                let candidates = matcher::extract(source, &page.text);
                stats.record_success(candidates.len());

                let before = dedup.len();
                for candidate in candidates {
                    match dedup.insert(candidate) {
                        InsertOutcome::Inserted => {}
                        InsertOutcome::Duplicate => stats.duplicates += 1,
                        InsertOutcome::Rejected => stats.rejected += 1,
                    }
                }
                info!("🟢 {} 抓取成功，新增 {} 条代理", label, dedup.len() - before);
            }
        }
    }

    let results = dedup.finalize();
    stats.unique = results.len();

    info!("========== [结果统计完成 ✅] ==========");
    info!(
        "✅ 频道 {} 个：成功 {}，失败 {}，跳过 {}；候选 {} 条，去重后 {} 条，耗时 {}ms",
        sources.len(),
        stats.succeeded,
        stats.failed,
        stats.skipped,
        stats.raw_candidates,
        stats.unique,
        started.elapsed().as_millis()
    );

    (results, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Clone)]
    enum Reply {
        Page(&'static str),
        Delayed(u64, &'static str),
        Fail(FetchError),
        Hang,
    }

    struct MockFetcher {
        replies: HashMap<String, Reply>,
    }

    impl MockFetcher {
        fn new(replies: Vec<(&str, Reply)>) -> Self {
            Self {
                replies: replies.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            }
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, source: &Source, _timeout: Duration) -> Result<RawPage, FetchError> {
            match self.replies.get(source.as_str()).cloned() {
                Some(Reply::Page(body)) => Ok(RawPage::new(body)),
                Some(Reply::Delayed(ms, body)) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(RawPage::new(body))
                }
                Some(Reply::Fail(e)) => Err(e),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(RawPage::new(""))
                }
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn sources(urls: &[&str]) -> Vec<Source> {
        urls.iter().map(|u| Source::new(*u)).collect()
    }

    fn options(concurrency: usize) -> RunOptions {
        RunOptions {
            concurrency,
            timeout: Duration::from_millis(100),
            stop: None,
        }
    }

    #[tokio::test]
    async fn test_timeout_does_not_abort_run() {
        let fetcher = MockFetcher::new(vec![
            ("a", Reply::Hang),
            ("b", Reply::Page(r#"<a href="tg://proxy?server=B">b</a>"#)),
        ]);

        let (results, stats) = run(&sources(&["a", "b"]), &fetcher, &options(1)).await;

        assert_eq!(stats.attempted, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failures[0].source.as_str(), "a");
        assert_eq!(stats.failures[0].error, FetchError::Timeout(Duration::from_millis(100)));
        assert_eq!(results.representatives(), vec!["tg://proxy?server=B"]);
    }

    #[tokio::test]
    async fn test_counters() {
        let page = r#"
            <code>tg://proxy?server=A</code>
            <a href="tg://proxy?server=A">a</a>
            <a href="/proxy?server=C">c</a>
            <code>https://t.me/proxy</code>
        "#;
        let fetcher = MockFetcher::new(vec![
            ("a", Reply::Page(page)),
            ("b", Reply::Fail(FetchError::Status(500))),
        ]);

        let (results, stats) = run(&sources(&["a", "b", "missing"]), &fetcher, &options(2)).await;

        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.raw_candidates, 3);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.unique, 2);
        assert_eq!(results.representatives(), vec!["tg://proxy?server=A", "https://t.me/proxy?server=C"]);
    }

    #[tokio::test]
    async fn test_parallel_delivery_keeps_source_order() {
        // 第一个频道更慢，但按列表顺序交付，仍由它的写法胜出
        let fetcher = MockFetcher::new(vec![
            ("slow", Reply::Delayed(40, "<code>TG://proxy?server=Same</code>")),
            ("fast", Reply::Page(r#"<a href="tg://proxy?server=Same">x</a>"#)),
        ]);

        let (results, stats) = run(&sources(&["slow", "fast"]), &fetcher, &options(2)).await;

        assert_eq!(stats.succeeded, 2);
        assert_eq!(results.representatives(), vec!["TG://proxy?server=Same"]);
    }

    #[tokio::test]
    async fn test_stop_flag_skips_remaining() {
        let fetcher = MockFetcher::new(vec![("a", Reply::Page("<code>tg://proxy?server=A</code>"))]);
        let stop = Arc::new(AtomicBool::new(true));

        let (results, stats) = run(&sources(&["a", "b"]), &fetcher, &options(1).with_stop_flag(stop)).await;

        assert!(results.is_empty());
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.attempted, 0);
    }

    #[tokio::test]
    async fn test_empty_sources() {
        let fetcher = MockFetcher::new(vec![]);
        let (results, stats) = run(&[], &fetcher, &RunOptions::default()).await;
        assert!(results.is_empty());
        assert_eq!(stats.unique, 0);
    }
}
