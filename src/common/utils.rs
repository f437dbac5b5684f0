use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::Level;

// 把字符串转换成 Level，忽略大小写，不识别时返回 None
pub fn parse_level(s: &str) -> Option<Level> {
    match s.to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// 按小时偏移构造时区，超出 ±23 小时范围时退回 UTC。
pub fn offset_from_hours(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// 指定时区下的当前时间。
pub fn now_in(hours: i32) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset_from_hours(hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("warning"), Some(Level::WARN));
        assert_eq!(parse_level("Info"), Some(Level::INFO));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_offset_from_hours() {
        assert_eq!(offset_from_hours(8).local_minus_utc(), 8 * 3600);
        assert_eq!(offset_from_hours(99).local_minus_utc(), 0);
    }
}
