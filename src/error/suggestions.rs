//! Localized suggestions for diagnostic codes
//!
//! Lookup order is fixed: the probe table, then the table shared with the
//! storage client (client and service codes), then a generic default. The
//! function is total, it never returns an empty string.

use super::codes::Code;
use crate::i18n::Locale;

/// A localized message pair
struct Message {
    en: &'static str,
    zh: &'static str,
}

impl Message {
    fn get(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.en,
            Locale::Zh => self.zh,
        }
    }
}

const fn msg(en: &'static str, zh: &'static str) -> Message {
    Message { en, zh }
}

/// Findings produced by the probe itself. `probe.internal` is absent on
/// purpose: it always renders through the default message.
const PROBE_TABLE: &[(&str, Message)] = &[
    ("probe.request_type_mismatch", msg(
        "The request does not match the selected check. Run `bosprobe upload` with upload options \
         or `bosprobe download` with download options.",
        "请求类型与检查类型不匹配，请使用 `bosprobe upload` 或 `bosprobe download` \
         并提供对应参数。",
    )),
    ("probe.missing_bucket", msg(
        "A bucket is required for upload. Pass it with --bucket.",
        "上传需要指定 bucket，请通过 --bucket 传入。",
    )),
    ("probe.missing_target", msg(
        "Nothing to download. Pass either --bucket (optionally with --object) or --url.",
        "未指定下载目标，请通过 --bucket（可选 --object）或 --url 指定。",
    )),
    ("probe.url_bucket_conflict", msg(
        "--url and --bucket cannot be used together. The URL already names the bucket; keep only \
         one of them.",
        "--url 与 --bucket 不能同时使用，URL 中已包含 bucket，请只保留其中一个。",
    )),
    ("probe.url_object_conflict", msg(
        "--url and --object cannot be used together. The URL already names the object; keep only \
         one of them.",
        "--url 与 --object 不能同时使用，URL 中已包含对象名，请只保留其中一个。",
    )),
    ("probe.url_endpoint_conflict", msg(
        "--url and --endpoint cannot be used together. The endpoint is taken from the URL host.",
        "--url 与 --endpoint 不能同时使用，服务域名将从 URL 中获取。",
    )),
    ("probe.invalid_url", msg(
        "The object URL could not be parsed or has no host. Check that it is a complete http:// or \
         https:// URL.",
        "无法解析对象 URL 或 URL 中缺少域名，请确认其为完整的 http:// 或 https:// 地址。",
    )),
    ("probe.no_resolve_target", msg(
        "No endpoint could be determined because neither a bucket nor a URL was given. Pass \
         --endpoint, --bucket or --url.",
        "缺少 bucket 和 URL，无法确定服务域名，请指定 --endpoint、--bucket 或 --url。",
    )),
    ("probe.endpoint_lookup_failed", msg(
        "The bucket's region could not be looked up. Check the bucket name and credentials, or \
         pass the endpoint explicitly with --endpoint.",
        "查询 bucket 所在区域失败，请检查 bucket 名称和密钥，或通过 --endpoint 直接指定服务域名。",
    )),
    ("probe.empty_bucket", msg(
        "The bucket is empty, so there is no object to download. Upload an object first or pass \
         --object.",
        "bucket 中没有对象可供下载，请先上传对象或通过 --object 指定。",
    )),
    ("probe.listing_denied", msg(
        "These credentials may not list the bucket, so no object could be picked automatically. \
         Pass the object name with --object.",
        "当前密钥没有列举 bucket 的权限，无法自动选择对象，请通过 --object 指定对象名。",
    )),
    ("probe.local_file_not_found", msg(
        "The local file does not exist. Check the path passed with --local-path.",
        "本地文件不存在，请检查 --local-path 指定的路径。",
    )),
    ("probe.local_file_unreadable", msg(
        "The local path is not a readable regular file. Check its type and permissions.",
        "本地路径不是可读的普通文件，请检查文件类型和权限。",
    )),
    ("probe.create_dir_failed", msg(
        "The destination directory could not be created. Check the path and write permissions, or \
         choose another --local-path.",
        "无法创建目标目录，请检查路径和写权限，或更换 --local-path。",
    )),
    ("probe.local_write_failed", msg(
        "The downloaded data could not be written locally. Check free disk space and write \
         permissions.",
        "下载的数据无法写入本地，请检查磁盘空间和写权限。",
    )),
];

/// Codes shared with the storage client: client-side failures and service
/// response codes
const SHARED_TABLE: &[(&str, Message)] = &[
    ("client.malformed_url", msg(
        "The request URL is malformed. Check the endpoint and object name for invalid characters.",
        "请求 URL 格式错误，请检查服务域名和对象名中是否有非法字符。",
    )),
    ("client.request_failed", msg(
        "The request never reached the service. Check the network, proxy and firewall settings and \
         that the endpoint is correct.",
        "请求未能到达服务端，请检查网络、代理和防火墙设置，并确认服务域名正确。",
    )),
    ("client.invalid_response", msg(
        "The service response could not be understood. A proxy may be rewriting traffic; try again \
         without it.",
        "无法解析服务端响应，可能有代理改写了流量，请绕过代理后重试。",
    )),
    ("client.cache_corrupt", msg(
        "The endpoint cache was unreadable and has been reset. No action is needed.",
        "服务域名缓存已损坏并被重置，无需处理。",
    )),
    ("service.AccessDenied", msg(
        "Access was denied. Check that the access key has permission on this bucket and object, \
         and any bucket policy or IP allowlist.",
        "访问被拒绝，请检查密钥是否有该 bucket 和对象的权限，以及 bucket 策略或 IP 白名单设置。",
    )),
    ("service.InvalidAccessKeyId", msg(
        "The access key does not exist. Check the value passed with --ak or BCE_ACCESS_KEY_ID.",
        "Access Key 不存在，请检查 --ak 或 BCE_ACCESS_KEY_ID 的值。",
    )),
    ("service.SignatureDoesNotMatch", msg(
        "The request signature does not match. Check the secret key and that the local clock is \
         accurate.",
        "请求签名不匹配，请检查 Secret Key 以及本地时间是否准确。",
    )),
    ("service.RequestExpired", msg(
        "The request has expired. Synchronize the local clock and try again.",
        "请求已过期，请同步本地时间后重试。",
    )),
    ("service.NoSuchBucket", msg(
        "The bucket does not exist. Check the bucket name and the region of the endpoint.",
        "bucket 不存在，请检查 bucket 名称和服务域名所属区域。",
    )),
    ("service.NoSuchKey", msg(
        "The object does not exist. Check the object name, including any directory prefix.",
        "对象不存在，请检查对象名及其目录前缀。",
    )),
    ("service.InvalidBucketName", msg(
        "The bucket name is invalid. Bucket names use lowercase letters, digits and hyphens.",
        "bucket 名称不合法，只能包含小写字母、数字和连字符。",
    )),
    ("service.EntityTooLarge", msg(
        "The object is too large for a single upload. Use multipart upload for large files.",
        "对象超过单次上传大小限制，大文件请使用分块上传。",
    )),
    ("service.AccountOverdue", msg(
        "The account is overdue. Top up the account before retrying.",
        "账户已欠费，请充值后重试。",
    )),
    ("service.RequestTimeout", msg(
        "The service timed out waiting for the request body. Check the upstream bandwidth.",
        "服务端等待请求数据超时，请检查上行带宽。",
    )),
    ("service.InternalError", msg(
        "The service reported an internal error. Try again later and contact support with the \
         request ID if it persists.",
        "服务端内部错误，请稍后重试，如持续出现请携带请求 ID 联系技术支持。",
    )),
    ("service.ServiceUnavailable", msg(
        "The service is temporarily unavailable. Try again later.",
        "服务暂时不可用，请稍后重试。",
    )),
];

const ACCESS_DENIED: &str = "service.AccessDenied";

const RATE_LIMITED: Message = msg(
    "Requests are being rate limited. Lower the request rate or contact support to raise the \
     quota.",
    "请求被限流，请降低请求频率或联系技术支持提升配额。",
);

const SUCCESS: Message = msg(
    "Everything worked. No action is needed.",
    "诊断通过，无需处理。",
);

const DEFAULT: Message = msg(
    "An unexpected error occurred. Keep the run log and contact support with the request ID shown \
     above.",
    "发生未知错误，请保留诊断日志并携带上方的请求 ID 联系技术支持。",
);

/// Error text fragments that mark an access-denied response as rate limiting
const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "ratelimit",
    "too many requests",
    "slow down",
    "request limit",
    "qps",
    "限流",
    "频率",
];

fn find(table: &'static [(&'static str, Message)], id: &str) -> Option<&'static Message> {
    table.iter().find(|(k, _)| *k == id).map(|(_, m)| m)
}

/// Maps outcome codes to localized suggestions
#[derive(Debug, Clone, Copy)]
pub struct SuggestionEngine {
    locale: Locale,
}

impl SuggestionEngine {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Suggestion for a code; `err_text` is the underlying error message
    pub fn suggest(&self, code: &Code, err_text: &str) -> String {
        if code.is_success() {
            return SUCCESS.get(self.locale).to_string();
        }

        let id = code.id();
        if id == ACCESS_DENIED && is_rate_limited(err_text) {
            return RATE_LIMITED.get(self.locale).to_string();
        }

        find(PROBE_TABLE, &id)
            .or_else(|| find(SHARED_TABLE, &id))
            .unwrap_or(&DEFAULT)
            .get(self.locale)
            .to_string()
    }

    /// Whether a code has its own entry rather than the default message
    pub fn is_registered(code: &Code) -> bool {
        let id = code.id();
        code.is_success() || find(PROBE_TABLE, &id).is_some() || find(SHARED_TABLE, &id).is_some()
    }
}

fn is_rate_limited(err_text: &str) -> bool {
    let lower = err_text.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes::{ClientCode, LocalCode};
    use proptest::prelude::*;

    const LOCALES: [Locale; 2] = [Locale::En, Locale::Zh];

    #[test]
    fn test_every_local_code_except_internal_is_registered() {
        for code in LocalCode::ALL {
            let registered = SuggestionEngine::is_registered(&Code::Local(*code));
            assert_eq!(registered, *code != LocalCode::Internal, "{}", code.as_str());
        }
        for code in ClientCode::ALL {
            assert!(SuggestionEngine::is_registered(&Code::Client(*code)));
        }
    }

    #[test]
    fn test_every_table_entry_is_non_empty_in_both_locales() {
        for (id, message) in PROBE_TABLE.iter().chain(SHARED_TABLE.iter()) {
            assert!(!message.en.is_empty(), "{}", id);
            assert!(!message.zh.is_empty(), "{}", id);
        }
    }

    #[test]
    fn test_internal_uses_default() {
        let engine = SuggestionEngine::new(Locale::En);
        assert_eq!(
            engine.suggest(&Code::Local(LocalCode::Internal), "boom"),
            DEFAULT.en
        );
    }

    #[test]
    fn test_unregistered_service_code_uses_default() {
        let engine = SuggestionEngine::new(Locale::Zh);
        assert_eq!(engine.suggest(&Code::service("SomethingNew"), ""), DEFAULT.zh);
    }

    #[test]
    fn test_access_denied_distinguishes_rate_limiting() {
        let engine = SuggestionEngine::new(Locale::En);
        let code = Code::service("AccessDenied");

        let limited = engine.suggest(&code, "Access denied: request rate limit exceeded");
        let denied = engine.suggest(&code, "Access denied.");

        assert_eq!(limited, RATE_LIMITED.en);
        assert_ne!(limited, denied);
        assert!(denied.contains("permission"));
    }

    #[test]
    fn test_local_table_wins_over_shared() {
        let engine = SuggestionEngine::new(Locale::En);
        let listing = engine.suggest(&Code::Local(LocalCode::ListingDenied), "AccessDenied");
        assert!(listing.contains("--object"));
    }

    #[test]
    fn test_success_message() {
        let engine = SuggestionEngine::new(Locale::Zh);
        assert_eq!(engine.suggest(&Code::Success, ""), SUCCESS.zh);
    }

    proptest! {
        #[test]
        fn suggest_is_total_for_service_codes(raw in "[A-Za-z.]{0,24}", err in ".{0,64}") {
            for locale in LOCALES {
                let engine = SuggestionEngine::new(locale);
                prop_assert!(!engine.suggest(&Code::service(raw.clone()), &err).is_empty());
            }
        }

        #[test]
        fn suggest_is_total_for_any_id(raw in ".{0,32}", err in ".{0,64}") {
            let code: Code = raw.parse().unwrap();
            for locale in LOCALES {
                prop_assert!(!SuggestionEngine::new(locale).suggest(&code, &err).is_empty());
            }
        }
    }
}
