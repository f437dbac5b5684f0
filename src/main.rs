use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use tg_proxy_harvest::common::log::init_logging;
use tg_proxy_harvest::common::utils::now_in;
use tg_proxy_harvest::fetcher::HttpFetcher;
use tg_proxy_harvest::model::AppConfig;
use tg_proxy_harvest::service::aggregator::{self, RunOptions};
use tg_proxy_harvest::service::writer::{self, OutputForm};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    // 必须在其他调用之前完成
    init_logging(&config.log)?;

    let sources = config.harvest.sources();
    let fetcher = HttpFetcher::new(&config.harvest)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("收到中断信号，剩余频道将被跳过");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let options = RunOptions::from_config(&config.harvest).with_stop_flag(stop);
    let (results, stats) = aggregator::run(&sources, &fetcher, &options).await;

    for failure in &stats.failures {
        error!("❌ {} - {}", failure.source, failure.error);
    }

    let captured_at = now_in(config.output.utc_offset_hours);
    let form = OutputForm::from_flag(config.output.canonical);
    writer::write_list(&config.output.path, &results, &stats, &captured_at, form)?;

    info!("抓取完成：共 {} 条有效代理", results.len());
    Ok(())
}
