use std::time::Duration;

use serde::Deserialize;

use crate::common::error::HarvestError;
use crate::model::link::Source;

/// 默认抓取的 TG 频道预览页。
pub const DEFAULT_SOURCES: &[&str] = &[
    "https://t.me/s/gaosuwang",
    "https://t.me/s/ProxyMTProting",
    "https://t.me/s/hgwzcd",
    "https://t.me/s/GSDL6",
    "https://t.me/s/changanhutui",
    "https://t.me/s/qiuyue2",
    "https://t.me/s/gsdl01",
    "https://t.me/s/juzibaipiao",
    "https://t.me/s/daili81",
    "https://t.me/s/hbgzs1",
    "https://t.me/s/VPNzhilian",
    "https://t.me/s/duxiangdail",
    "https://t.me/s/XB811",
    "https://t.me/s/ngg789",
    "https://t.me/s/TGTW88",
    "https://t.me/s/afeiSSS",
    "https://t.me/s/feijidailil",
    "https://t.me/s/dail99",
];

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub harvest: HarvestConfig,
    pub output: OutputConfig,
    pub log: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// 频道预览页列表，按顺序处理
    pub sources: Vec<String>,
    /// 同时进行的抓取数量
    pub concurrency: usize,
    /// 单个频道的超时时间（秒）
    pub timeout: u64,
    pub user_agent: String,
    pub accept_language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    /// 头部时间使用的时区偏移（小时），默认东八区
    pub utc_offset_hours: i32,
    /// 为 true 时输出规范化后的链接，否则输出首次出现的原文
    pub canonical: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub console_levels: Vec<String>,
    pub dir: String,
    pub file_level: String,
}

impl HarvestConfig {
    pub fn sources(&self) -> Vec<Source> {
        self.sources
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Source::new)
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl AppConfig {
    /// 依次加载：内置默认值 → 可选的 `Config.toml` → `TGPROXY__` 前缀环境变量。
    pub fn load() -> Result<Self, HarvestError> {
        Self::load_from("Config")
    }

    pub fn load_from(name: &str) -> Result<Self, HarvestError> {
        let config = config::Config::builder()
            .set_default("harvest.sources", DEFAULT_SOURCES.to_vec())?
            .set_default("harvest.concurrency", 4)?
            .set_default("harvest.timeout", 15)?
            .set_default("harvest.user_agent", DEFAULT_USER_AGENT)?
            .set_default("harvest.accept_language", "zh-CN,zh;q=0.9")?
            .set_default("output.path", "proxylist.txt")?
            .set_default("output.utc_offset_hours", 8)?
            .set_default("output.canonical", false)?
            .set_default("log.console_levels", vec!["INFO", "WARN", "ERROR"])?
            .set_default("log.dir", "logs")?
            .set_default("log.file_level", "DEBUG")?
            .add_source(config::File::with_name(name).required(false))
            .add_source(
                config::Environment::with_prefix("TGPROXY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        let config = config.try_deserialize()?;
        Ok(config)
    }
}
