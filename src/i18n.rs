//! Report localization
//!
//! Only the lookup contract lives here: a locale is detected once at startup
//! and every label in the report goes through [`text`]. Unknown keys fall back
//! to English and then to the key itself, so a missing translation degrades
//! the wording but never the report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported report languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// Parse a language tag such as `zh`, `zh_CN.UTF-8` or `en-US`
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return None;
        }
        if tag.starts_with("zh") {
            Some(Locale::Zh)
        } else if tag.starts_with("en") || tag == "c" || tag == "posix" {
            Some(Locale::En)
        } else {
            None
        }
    }

    /// Detect the locale: explicit choice, then `BOSPROBE_LANG`, then `LC_ALL` / `LANG`
    pub fn detect(explicit: Option<&str>) -> Self {
        if let Some(locale) = explicit.and_then(Self::parse) {
            return locale;
        }

        ["BOSPROBE_LANG", "LC_ALL", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const EN: &[(&str, &str)] = &[
    ("report.title", "BOS probe report"),
    ("report.request_check", "Request check"),
    ("report.overall", "Overall result"),
    ("report.network", "Network"),
    ("report.upload", "Upload"),
    ("report.download", "Download"),
    ("report.detail", "Failure detail"),
    ("report.code", "Code"),
    ("report.error", "Error"),
    ("report.suggestion", "Suggestion"),
    ("report.request_id", "Request ID"),
    ("report.debug_id", "Debug ID"),
    ("report.endpoint", "Endpoint"),
    ("report.endpoint_source", "Endpoint source"),
    ("report.object", "Object"),
    ("report.size", "Size"),
    ("report.elapsed", "Elapsed"),
    ("report.throughput", "Throughput"),
    ("report.log_saved", "Run log saved to"),
    ("report.log_not_saved", "No run log was persisted; output went to the terminal only"),
    ("report.stages", "Stages"),
    ("verdict.passed", "PASSED"),
    ("verdict.failed", "FAILED"),
    ("verdict.success", "SUCCESS"),
    ("verdict.failure", "FAILURE"),
    ("status.ok", "ok"),
    ("status.failed", "failed"),
    ("status.skipped", "skipped"),
    ("status.pending", "not run"),
    ("net.not_checked", "not checked"),
    ("net.reachable", "endpoint reachable"),
    ("net.endpoint_unreachable", "endpoint unreachable, public network reachable"),
    ("net.client_offline", "local network offline"),
    ("source.explicit", "command line"),
    ("source.url", "object URL"),
    ("source.cache", "endpoint cache"),
    ("source.service", "bucket location lookup"),
    ("spinner.network", "Checking network"),
    ("spinner.upload", "Uploading"),
    ("spinner.download", "Downloading"),
];

const ZH: &[(&str, &str)] = &[
    ("report.title", "BOS 诊断报告"),
    ("report.request_check", "请求检查"),
    ("report.overall", "总体结果"),
    ("report.network", "网络"),
    ("report.upload", "上传"),
    ("report.download", "下载"),
    ("report.detail", "失败详情"),
    ("report.code", "错误码"),
    ("report.error", "错误信息"),
    ("report.suggestion", "建议"),
    ("report.request_id", "请求 ID"),
    ("report.debug_id", "调试 ID"),
    ("report.endpoint", "服务域名"),
    ("report.endpoint_source", "域名来源"),
    ("report.object", "对象"),
    ("report.size", "大小"),
    ("report.elapsed", "耗时"),
    ("report.throughput", "速率"),
    ("report.log_saved", "诊断日志已保存至"),
    ("report.log_not_saved", "未能保存诊断日志，输出仅打印到终端"),
    ("report.stages", "阶段"),
    ("verdict.passed", "通过"),
    ("verdict.failed", "未通过"),
    ("verdict.success", "成功"),
    ("verdict.failure", "失败"),
    ("status.ok", "成功"),
    ("status.failed", "失败"),
    ("status.skipped", "已跳过"),
    ("status.pending", "未执行"),
    ("net.not_checked", "未检查"),
    ("net.reachable", "服务域名可达"),
    ("net.endpoint_unreachable", "服务域名不可达，公网可达"),
    ("net.client_offline", "本地网络不通"),
    ("source.explicit", "命令行参数"),
    ("source.url", "对象 URL"),
    ("source.cache", "域名缓存"),
    ("source.service", "查询 bucket 所在区域"),
    ("spinner.network", "正在检查网络"),
    ("spinner.upload", "正在上传"),
    ("spinner.download", "正在下载"),
];

fn table(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => EN,
        Locale::Zh => ZH,
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Look up a report label
pub fn text<'a>(key: &'a str, locale: Locale) -> &'a str {
    lookup(table(locale), key)
        .or_else(|| lookup(EN, key))
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(Locale::parse("zh_CN.UTF-8"), Some(Locale::Zh));
        assert_eq!(Locale::parse("ZH"), Some(Locale::Zh));
        assert_eq!(Locale::parse("en_US.UTF-8"), Some(Locale::En));
        assert_eq!(Locale::parse("C"), Some(Locale::En));
        assert_eq!(Locale::parse("fr_FR"), None);
        assert_eq!(Locale::parse(""), None);
    }

    #[test]
    fn test_explicit_locale_wins() {
        assert_eq!(Locale::detect(Some("zh")), Locale::Zh);
        assert_eq!(Locale::detect(Some("en")), Locale::En);
    }

    #[test]
    fn test_text_lookup() {
        assert_eq!(text("report.suggestion", Locale::En), "Suggestion");
        assert_eq!(text("report.suggestion", Locale::Zh), "建议");
    }

    #[test]
    fn test_unknown_key_falls_back_to_key() {
        assert_eq!(text("report.nonexistent", Locale::Zh), "report.nonexistent");
    }

    #[test]
    fn test_tables_cover_same_keys() {
        for (key, _) in EN {
            assert!(lookup(ZH, key).is_some(), "missing zh translation for {}", key);
        }
        for (key, _) in ZH {
            assert!(lookup(EN, key).is_some(), "missing en label for {}", key);
        }
    }
}
