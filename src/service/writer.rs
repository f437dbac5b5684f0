use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use tracing::info;

use crate::common::error::HarvestError;
use crate::model::{ResultSet, Stats};
use crate::service::normalizer::is_canonical;

/// 输出每条结果时使用的写法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputForm {
    /// 首次出现时的原文；原文不能直接使用时退回规范化链接
    #[default]
    Original,
    /// 规范化后的链接
    Canonical,
}

impl OutputForm {
    pub fn from_flag(canonical: bool) -> Self {
        if canonical { OutputForm::Canonical } else { OutputForm::Original }
    }
}

/// 生成结果文件内容：`#` 开头的头部注释、分隔线，之后每行一条链接并以空行隔开。
pub fn render(results: &ResultSet, stats: &Stats, captured_at: &DateTime<FixedOffset>, form: OutputForm) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "# 抓取时间: {}（UTC{}）\n",
        captured_at.format("%m月%d日 | %H:%M"),
        captured_at.offset()
    ));
    out.push_str(&format!(
        "# 抓取频道数: {} 个（成功 {}，失败 {}）\n",
        stats.attempted + stats.skipped,
        stats.succeeded,
        stats.failed
    ));
    out.push_str(&format!("# 原始候选数: {} 条\n", stats.raw_candidates));
    out.push_str(&format!("# 有效Proxy数: {} 条\n", results.len()));
    if results.is_empty() {
        out.push_str("# 未抓取到有效代理\n");
    }
    out.push_str(&"-".repeat(51));
    out.push_str("\n\n");

    for entry in results.iter() {
        let representative = entry.representative.trim();
        let link = match form {
            OutputForm::Original if is_usable(representative) => representative,
            _ => entry.key.as_str(),
        };
        out.push_str(link);
        out.push_str("\n\n");
    }

    out
}

/// 原文本身就是可直接打开的链接（没有相对路径、转义或 `amp;` 残留）。
fn is_usable(representative: &str) -> bool {
    is_canonical(representative) && !representative.contains("amp;") && !representative.contains('%')
}

/// 写入结果文件，目录不存在时自动创建。结果为空也照常写出。
pub fn write_list(
    path: impl AsRef<Path>,
    results: &ResultSet,
    stats: &Stats,
    captured_at: &DateTime<FixedOffset>,
    form: OutputForm,
) -> Result<(), HarvestError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(render(results, stats, captured_at, form).as_bytes())?;
    writer.flush()?;

    info!("📄 已写入 {} 条代理到 {}", results.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Candidate, Source, Strategy};
    use crate::service::dedup::Deduplicator;
    use chrono::TimeZone;

    fn captured_at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 18, 9, 5, 0)
            .unwrap()
    }

    fn results(links: &[&str]) -> ResultSet {
        let source = Source::new("https://t.me/s/test");
        let mut dedup = Deduplicator::new();
        for link in links {
            dedup.insert(Candidate::new(*link, &source, Strategy::Anchor));
        }
        dedup.finalize()
    }

    #[test]
    fn test_render_layout() {
        let results = results(&["tg://proxy?server=A&port=1", "TG://proxy?server=B"]);
        let stats = Stats {
            attempted: 3,
            succeeded: 2,
            failed: 1,
            raw_candidates: 4,
            unique: 2,
            ..Default::default()
        };

        let text = render(&results, &stats, &captured_at(), OutputForm::Original);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# 抓取时间: 10月18日 | 09:05（UTC+08:00）");
        assert_eq!(lines[1], "# 抓取频道数: 3 个（成功 2，失败 1）");
        assert_eq!(lines[2], "# 原始候选数: 4 条");
        assert_eq!(lines[3], "# 有效Proxy数: 2 条");
        assert!(lines[4].starts_with("---"));
        assert_eq!(&lines[5..], &["", "tg://proxy?server=A&port=1", "", "tg://proxy?server=B", ""]);
    }

    #[test]
    fn test_unusable_original_falls_back_to_key() {
        let results = results(&["/proxy?server=A", "tg%3A%2F%2Fproxy%3Fserver%3DB", "tg://proxy?server=C&amp;port=1"]);
        let text = render(&results, &Stats::default(), &captured_at(), OutputForm::Original);
        let links: Vec<&str> = text.lines().filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-')).collect();
        assert_eq!(links, vec!["https://t.me/proxy?server=A", "tg://proxy?server=B", "tg://proxy?server=C&port=1"]);
    }

    #[test]
    fn test_render_canonical() {
        let results = results(&["/proxy?server=A"]);
        let text = render(&results, &Stats::default(), &captured_at(), OutputForm::Canonical);
        assert!(text.ends_with("\n\nhttps://t.me/proxy?server=A\n\n"));
    }

    #[test]
    fn test_write_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("proxylist.txt");

        write_list(&path, &ResultSet::default(), &Stats::default(), &captured_at(), OutputForm::Original).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("# 有效Proxy数: 0 条"));
        assert!(text.contains("# 未抓取到有效代理"));
    }
}
