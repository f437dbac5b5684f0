//! 页面抓取接口。
//!
//! 采集流程只依赖 [`Fetcher`] trait，HTTP 实现见 [`http::HttpFetcher`]，
//! 测试中可以换成内存实现。

use std::time::Duration;

use async_trait::async_trait;

use crate::common::error::FetchError;
use crate::model::{RawPage, Source};

pub mod http;

pub use http::HttpFetcher;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// 抓取一个频道页面，只请求一次，不重试。
    async fn fetch(&self, source: &Source, timeout: Duration) -> Result<RawPage, FetchError>;
}
