// crates/publish-flow-core/src/core/messages.rs
// ============================================================================
// Module: Publish Flow Message Catalog
// Description: Localized templates for validation errors and check reports.
// Purpose: Keep every user-facing string in one catalog keyed by stable ids.
// Dependencies: serde, standard library collections
// ============================================================================

//! ## Overview
//! Validation errors and report text are rendered from a static catalog per
//! [`Locale`]. The locale is always passed explicitly; there is no process
//! wide "current locale".
//!
//! ## Invariants
//! - Catalogs are initialized once and read-only thereafter.
//! - Missing keys fall back to the English catalog, then to the key itself.
//! - Placeholders use `{name}` syntax and are substituted in argument order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Locale
// ============================================================================

/// Output language for validation messages and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Simplified Chinese.
    #[default]
    Zh,
    /// English.
    En,
}

impl Locale {
    /// Returns the short locale tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
        }
    }

    /// Parses a locale tag such as `"zh"`, `"zh-CN"`, or `"en_US"`.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let lower = tag.trim().to_ascii_lowercase();
        let primary = lower.split(['-', '_']).next().unwrap_or_default();
        match primary {
            "zh" => Some(Self::Zh),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// A named placeholder value for [`translate`].
#[derive(Debug, Clone)]
pub struct MessageArg {
    /// Placeholder name used in templates (e.g. `"max_length"`).
    pub key: &'static str,
    /// Value substituted for the placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`].
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalogs
// ============================================================================

/// Simplified Chinese catalog.
const ZH_ITEMS: &[(&str, &str)] = &[
    ("error.missing", "字段不存在"),
    ("error.string_type", "值不是合法的字符串"),
    ("error.bool_type", "值不是合法的布尔值"),
    ("error.string_too_long", "字符串长度不能超过 {max_length} 个字符"),
    ("error.string_pattern_mismatch", "字符串应满足格式 '{pattern}'"),
    ("error.github_url", "项目主页无法访问"),
    ("error.previous_data", "与上次发布的数据相同。"),
    ("error.metadata", "无法获取到插件元数据。"),
    ("error.plugin_test", "插件无法正常加载"),
    ("field.name", "名称"),
    ("field.module", "模块名称"),
    ("field.module_path", "模块路径"),
    ("field.is_dir", "是否为目录"),
    ("field.author", "作者"),
    ("field.github_url", "项目仓库"),
    ("field.description", "插件介绍"),
    ("field.usage", "使用方法"),
    ("field.version", "版本号"),
    ("field.plugin_type", "插件类型"),
    ("field.previous_data", "发布数据"),
    ("field.metadata", "插件元数据"),
    ("field.plugin_test", "插件加载测试"),
    ("report.heading", "# 📃 商店发布检查结果"),
    ("report.all_passed", "**✅ 所有测试通过，一切准备就绪！**"),
    ("report.problems", "**⚠️ 在发布检查过程中，我们发现以下问题：**"),
    ("report.error_line", "⚠️ {field}：{message}"),
    ("report.github_url_failed", "⚠️ 项目 <a href=\"{url}\">主页</a> 返回状态码 {status_code}。"),
    ("report.plugin_test_output", "插件加载输出"),
    ("report.details", "详情"),
    ("report.detail.github_url", "✅ 项目 <a href=\"{url}\">主页</a> 返回状态码 200。"),
    ("report.detail.version", "✅ 版本号：{version}。"),
    ("report.detail.plugin_type", "✅ 插件类型：{plugin_type}。"),
    ("report.detail.load_passed", "✅ 插件 <a href=\"{url}\">加载测试</a> 通过。"),
    ("report.detail.load_passed_plain", "✅ 插件加载测试通过。"),
    ("report.detail.load_skipped", "✅ 插件加载测试已跳过。"),
    ("report.tip.edit", "💡 如需修改信息，请直接修改 issue，机器人会自动更新检查结果。"),
    ("report.tip.skip", "💡 如需跳过插件加载测试，请由仓库成员评论 /skip。"),
    ("report.tip.reuse", "♻️ 评论已更新至最新检查结果"),
    ("plugin_type.NORMAL", "普通插件"),
    ("plugin_type.ADMIN", "管理员插件"),
    ("plugin_type.SUPERUSER", "超级用户插件"),
    ("plugin_type.ADMIN_SUPERUSER", "管理员/超级用户插件"),
    ("plugin_type.DEPENDANT", "依赖插件"),
    ("plugin_type.HIDDEN", "其他插件"),
];

/// English catalog.
const EN_ITEMS: &[(&str, &str)] = &[
    ("error.missing", "Field required"),
    ("error.string_type", "Input should be a valid string"),
    ("error.bool_type", "Input should be a valid boolean"),
    ("error.string_too_long", "String should have at most {max_length} characters"),
    ("error.string_pattern_mismatch", "String should match pattern '{pattern}'"),
    ("error.github_url", "Project home page is unreachable"),
    ("error.previous_data", "Identical to the previously published data."),
    ("error.metadata", "Unable to obtain plugin metadata."),
    ("error.plugin_test", "Plugin failed to load"),
    ("field.name", "Name"),
    ("field.module", "Module name"),
    ("field.module_path", "Module path"),
    ("field.is_dir", "Is directory"),
    ("field.author", "Author"),
    ("field.github_url", "Repository"),
    ("field.description", "Description"),
    ("field.usage", "Usage"),
    ("field.version", "Version"),
    ("field.plugin_type", "Plugin type"),
    ("field.previous_data", "Published data"),
    ("field.metadata", "Plugin metadata"),
    ("field.plugin_test", "Plugin load test"),
    ("report.heading", "# 📃 Store publish check result"),
    ("report.all_passed", "**✅ All checks passed, ready to publish!**"),
    ("report.problems", "**⚠️ The publish check found the following problems:**"),
    ("report.error_line", "⚠️ {field}: {message}"),
    (
        "report.github_url_failed",
        "⚠️ Project <a href=\"{url}\">home page</a> returned status code {status_code}.",
    ),
    ("report.plugin_test_output", "Plugin load output"),
    ("report.details", "Details"),
    (
        "report.detail.github_url",
        "✅ Project <a href=\"{url}\">home page</a> returned status code 200.",
    ),
    ("report.detail.version", "✅ Version: {version}."),
    ("report.detail.plugin_type", "✅ Plugin type: {plugin_type}."),
    ("report.detail.load_passed", "✅ Plugin <a href=\"{url}\">load test</a> passed."),
    ("report.detail.load_passed_plain", "✅ Plugin load test passed."),
    ("report.detail.load_skipped", "✅ Plugin load test skipped."),
    (
        "report.tip.edit",
        "💡 To change the submission, edit the issue; the check result updates automatically.",
    ),
    ("report.tip.skip", "💡 A repository member can comment /skip to skip the plugin load test."),
    ("report.tip.reuse", "♻️ This comment has been updated with the latest check result"),
    ("plugin_type.NORMAL", "normal plugin"),
    ("plugin_type.ADMIN", "admin plugin"),
    ("plugin_type.SUPERUSER", "superuser plugin"),
    ("plugin_type.ADMIN_SUPERUSER", "admin/superuser plugin"),
    ("plugin_type.DEPENDANT", "dependency plugin"),
    ("plugin_type.HIDDEN", "other plugin"),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` for `locale`, substituting `args` into placeholders.
#[must_use]
pub fn translate(locale: Locale, key: &str, args: &[MessageArg]) -> String {
    let template = catalog(locale)
        .get(key)
        .or_else(|| catalog(Locale::En).get(key))
        .copied()
        .unwrap_or(key);
    substitute(template, args)
}

/// Substitutes `{name}` placeholders in `template` with `args`.
#[must_use]
pub fn substitute(template: &str, args: &[MessageArg]) -> String {
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the catalog for `locale`.
fn catalog(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static ZH: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static EN: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    match locale {
        Locale::Zh => ZH.get_or_init(|| ZH_ITEMS.iter().copied().collect()),
        Locale::En => EN.get_or_init(|| EN_ITEMS.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a locale, a key, and named arguments.
///
/// # Arguments
///
/// - `$locale` is a [`Locale`].
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! msg {
    ($locale:expr, $key:expr $(, $name:ident = $value:expr )* $(,)?) => {{
        let args: ::std::vec::Vec<$crate::core::messages::MessageArg> = ::std::vec![
            $(
                $crate::core::messages::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::core::messages::translate($locale, $key, &args)
    }};
}
