use std::fs::{create_dir_all, File};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{Level, Metadata};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};
use crate::common::utils::parse_level;
use crate::model::LoggingConfig;

/// 初始化日志：文件记录按 `file_level` 过滤，控制台只输出 `console_levels` 中列出的级别。
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let log_dir = Path::new(&config.dir);
    create_dir_all(log_dir)?;

    let allowed_levels: Vec<Level> = config
        .console_levels
        .iter()
        .filter_map(|lvl_str| parse_level(lvl_str))
        .collect();

    let file_level = parse_level(&config.file_level)
        .map(LevelFilter::from_level)
        .unwrap_or(LevelFilter::DEBUG);

    let file = File::create(log_dir.join("harvest.log"))?;
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(file_level);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false)
        .with_filter(filter_fn(move |metadata: &Metadata| {
            allowed_levels.contains(metadata.level())
        }));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(())
}
