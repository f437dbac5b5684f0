//! 从 Telegram 频道预览页采集 MTProto 代理链接（`tg://proxy?server=...`、
//! `https://t.me/proxy?server=...`），规范化去重后写成一份带时间戳的列表。
//!
//! 核心流程见 [`service::aggregator::run`]。

pub mod common;
pub mod fetcher;
pub mod model;
pub mod service;
