use std::time::Duration;

use thiserror::Error;

/// 单个频道的抓取错误，只记录到统计中，不会中断整次采集。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("请求超时（{0:?}）")]
    Timeout(Duration),
    #[error("连接失败：{0}")]
    Connect(String),
    #[error("HTTP 状态码异常：{0}")]
    Status(u16),
    #[error("请求失败：{0}")]
    Request(String),
    #[error("读取响应内容失败：{0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest 不暴露具体超时时长，由调用方按配置补充
            FetchError::Timeout(Duration::ZERO)
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// 规范化阶段丢弃候选的原因，不属于错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("候选内容为空")]
    Empty,
    #[error("无法规范为 tg://proxy 或 https://t.me/proxy：{0}")]
    NonCanonical(String),
}

/// 宿主程序层面的错误（配置、日志、写文件）。
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("{0}")]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),
}
