// crates/publish-flow-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings in English and Chinese.
// Dependencies: publish-flow-core
// ============================================================================

//! ## Overview
//! CLI output lines live in a small per-locale catalog and are formatted
//! through the [`t!`](crate::t) macro. Validation messages inside reports are
//! localized separately by the core catalog; this one only covers the CLI's
//! own status and error lines.
//!
//! ## Invariants
//! - The locale is selected once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

pub use publish_flow_core::Locale;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Ordered list of supported CLI locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Zh];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "publish-flow {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("output.json_failed", "Failed to serialize output: {error}"),
    ("input.read_failed", "Failed to read {path}: {error}"),
    (
        "input.read_too_large",
        "Refusing to read {path} because it is {size} bytes (limit {limit}).",
    ),
    ("logging.init_failed", "Failed to initialize logging: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config is valid."),
    (
        "repository.missing",
        "Repository is not configured; set repository.owner and repository.name or \
         GITHUB_REPOSITORY.",
    ),
    ("forge.init_failed", "Failed to create forge client: {error}"),
    ("probe.init_failed", "Failed to create reachability probe: {error}"),
    ("store.init_failed", "Failed to open registry {path}: {error}"),
    ("types.init_failed", "Failed to build publish type handlers: {error}"),
    ("workflow.failed", "Workflow failed: {error}"),
    ("check.ignored", "Issue #{issue} ignored: {reason}"),
    ("check.passed", "Issue #{issue} passed as \"{title}\"; comment {comment}."),
    ("check.failed", "Issue #{issue} failed with {count} error(s); comment {comment}."),
    ("check.pull_request", "Pull request #{number} is up to date."),
    ("closed.ignored", "Pull request #{pull} ignored: {reason}"),
    ("closed.handled", "Pull request #{pull} handled for issue #{issue} (issue closed: {closed})."),
    ("review.ignored", "Review on pull request #{pull} ignored: {reason}"),
    ("review.merged", "Pull request #{pull} merged."),
    ("resolve.replayed", "Pull request #{pull} rebuilt on {branch}."),
    ("resolve.skipped", "Pull request #{pull} skipped: {reason}"),
    ("resolve.none", "No open pull requests needed rebuilding."),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'zh'."),
];

/// Chinese catalog.
const CATALOG_ZH: &[(&str, &str)] = &[
    ("main.version", "publish-flow {version}"),
    ("output.stream.stdout", "标准输出"),
    ("output.stream.stderr", "标准错误"),
    ("output.stream.unknown", "输出"),
    ("output.write_failed", "写入{stream}失败：{error}"),
    ("output.json_failed", "序列化输出失败：{error}"),
    ("input.read_failed", "读取 {path} 失败：{error}"),
    ("input.read_too_large", "拒绝读取 {path}：大小为 {size} 字节（上限 {limit}）。"),
    ("logging.init_failed", "初始化日志失败：{error}"),
    ("config.load_failed", "加载配置失败：{error}"),
    ("config.validate.ok", "配置有效。"),
    (
        "repository.missing",
        "未配置仓库；请设置 repository.owner 与 repository.name 或 GITHUB_REPOSITORY。",
    ),
    ("forge.init_failed", "创建平台客户端失败：{error}"),
    ("probe.init_failed", "创建可达性探测器失败：{error}"),
    ("store.init_failed", "打开注册表 {path} 失败：{error}"),
    ("types.init_failed", "构建发布类型处理器失败：{error}"),
    ("workflow.failed", "工作流失败：{error}"),
    ("check.ignored", "已忽略议题 #{issue}：{reason}"),
    ("check.passed", "议题 #{issue} 检查通过，标题为“{title}”；评论{comment}。"),
    ("check.failed", "议题 #{issue} 检查失败，共 {count} 个错误；评论{comment}。"),
    ("check.pull_request", "拉取请求 #{number} 已是最新。"),
    ("closed.ignored", "已忽略拉取请求 #{pull}：{reason}"),
    ("closed.handled", "已处理拉取请求 #{pull} 对应的议题 #{issue}（议题已关闭：{closed}）。"),
    ("review.ignored", "已忽略拉取请求 #{pull} 的审查：{reason}"),
    ("review.merged", "已合并拉取请求 #{pull}。"),
    ("resolve.replayed", "已在 {branch} 上重建拉取请求 #{pull}。"),
    ("resolve.skipped", "已跳过拉取请求 #{pull}：{reason}"),
    ("resolve.none", "没有需要重建的拉取请求。"),
    ("i18n.lang.invalid_env", "{env} 的值无效：{value}。应为 'en' 或 'zh'。"),
];

/// Returns the raw catalog entries for the requested locale.
pub(crate) const fn catalog_entries_for(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => CATALOG_EN,
        Locale::Zh => CATALOG_ZH,
    }
}

/// Returns the message catalog for the requested locale.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_ZH_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP
            .get_or_init(|| catalog_entries_for(Locale::En).iter().copied().collect()),
        Locale::Zh => CATALOG_ZH_MAP
            .get_or_init(|| catalog_entries_for(Locale::Zh).iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the selected locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(current_locale())
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
