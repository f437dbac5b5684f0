use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use tracing::debug;

use crate::common::error::FetchError;
use crate::fetcher::Fetcher;
use crate::model::{HarvestConfig, RawPage, Source};

/// 基于 reqwest 的页面抓取，所有请求共用一个 Client。
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HarvestConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&config.accept_language)?);

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &Source, timeout: Duration) -> Result<RawPage, FetchError> {
        let as_fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::from(e)
            }
        };

        let response = self
            .client
            .get(source.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(as_fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let text = response.text().await.map_err(as_fetch_error)?;
        debug!("{} 返回 {} 字节", source, text.len());
        Ok(RawPage::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppConfig;

    #[tokio::test]
    async fn test_unreachable_source_is_typed_failure() {
        let config = AppConfig::load_from("no-such-config-file").unwrap();
        let fetcher = HttpFetcher::new(&config.harvest).unwrap();

        // 保留端口，连接必然失败
        let source = Source::new("http://127.0.0.1:9/s/none");
        let err = fetcher.fetch(&source, Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, FetchError::Connect(_) | FetchError::Timeout(_) | FetchError::Request(_)));
    }
}
