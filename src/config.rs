use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DeckError, DeckResult};
use crate::models::print::PrintConfig;

/// 同时渲染的幻灯片数上限，每份幻灯片各占一个浏览器进程
pub const MAX_CONCURRENT_DECKS_LIMIT: usize = 64;

/// 单个幻灯片失败时的批量策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// 第一个失败即中止整个批次
    Abort,
    /// 记录失败并继续处理其余幻灯片
    Continue,
}

impl std::str::FromStr for FailurePolicy {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(DeckError::Config(format!("未知的失败策略: {}", other))),
        }
    }
}

/// 浏览器启动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Chrome / Chromium 可执行文件，未设置时自动探测
    pub executable: Option<PathBuf>,
    /// 额外的启动参数
    pub args: Vec<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// 单条 DevTools 命令的超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            args: vec![
                "--no-sandbox".to_string(),
                "--disable-setuid-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
            ],
            viewport_width: 1280,
            viewport_height: 720,
            request_timeout_secs: 60,
        }
    }
}

/// 页面加载配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    /// 批量模式下等待网络空闲的超时（秒）
    pub navigation_timeout_secs: u64,
    /// 资源数量保持不变多久视为网络空闲（毫秒）
    pub network_quiet_ms: u64,
    /// 就绪状态轮询间隔（毫秒）
    pub poll_interval_ms: u64,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            network_quiet_ms: 500,
            poll_interval_ms: 100,
        }
    }
}

/// 样式生效等待方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettleStrategy {
    /// 轮询确认样式已挂载并完成绘制
    Probe,
    /// 固定等待 `timeout_ms`
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleSettings {
    pub strategy: SettleStrategy,
    /// 等待上限（毫秒）
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for SettleSettings {
    fn default() -> Self {
        Self {
            strategy: SettleStrategy::Probe,
            timeout_ms: 3000,
            poll_interval_ms: 100,
        }
    }
}

/// 诊断模式配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticSettings {
    /// 要检查的幻灯片目录名
    pub deck: String,
    /// 第一级：等待网络空闲（秒）
    pub network_idle_timeout_secs: u64,
    /// 第二级：只等待 DOM 加载完成（秒）
    pub dom_content_timeout_secs: u64,
    /// 检测演示框架运行时的 JS 表达式
    pub framework_probe: String,
    /// 未检测到框架运行时是否判为失败
    pub require_framework_marker: bool,
    /// 是否同时导出 PDF
    pub export_pdf: bool,
}

impl Default for DiagnosticSettings {
    fn default() -> Self {
        Self {
            deck: "lecture-01".to_string(),
            network_idle_timeout_secs: 15,
            dom_content_timeout_secs: 10,
            framework_probe: "typeof window.Reveal !== 'undefined'".to_string(),
            require_framework_marker: false,
            export_pdf: true,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 幻灯片根目录
    pub input_root: PathBuf,
    /// 每个幻灯片目录下的入口文件
    pub entry_file: String,
    /// PDF 输出目录
    pub output_dir: PathBuf,
    /// 批量报告文件，未设置则不写
    pub report_file: Option<PathBuf>,
    /// 同时渲染的幻灯片数量
    pub max_concurrent_decks: usize,
    pub failure_policy: FailurePolicy,
    /// 是否注入打印样式
    pub inject_print_style: bool,
    /// 自定义打印样式文件，替换内置样式
    pub print_style_file: Option<PathBuf>,
    pub browser: BrowserSettings,
    pub print: PrintConfig,
    pub load: LoadSettings,
    pub settle: SettleSettings,
    pub diagnostic: DiagnosticSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("lectures"),
            entry_file: "index.html".to_string(),
            output_dir: PathBuf::from("pdfs"),
            report_file: None,
            max_concurrent_decks: 1,
            failure_policy: FailurePolicy::Abort,
            inject_print_style: true,
            print_style_file: None,
            browser: BrowserSettings::default(),
            print: PrintConfig::default(),
            load: LoadSettings::default(),
            settle: SettleSettings::default(),
            diagnostic: DiagnosticSettings::default(),
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_file(path: &Path) -> DeckResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DeckError::io(path, e))?;
        Self::from_toml_str(&content)
            .map_err(|e| DeckError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> DeckResult<Self> {
        toml::from_str(content).map_err(|e| DeckError::Config(e.to_string()))
    }

    /// 默认配置叠加环境变量
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env(self) -> Self {
        let env = |name: &str| std::env::var(name).ok();
        Self {
            input_root: env("DECK_INPUT_ROOT").map(PathBuf::from).unwrap_or(self.input_root),
            output_dir: env("DECK_OUTPUT_DIR").map(PathBuf::from).unwrap_or(self.output_dir),
            entry_file: env("DECK_ENTRY_FILE").unwrap_or(self.entry_file),
            max_concurrent_decks: env("MAX_CONCURRENT_DECKS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.max_concurrent_decks),
            failure_policy: env("FAILURE_POLICY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.failure_policy),
            browser: BrowserSettings {
                executable: env("CHROME_EXECUTABLE").map(PathBuf::from).or(self.browser.executable),
                ..self.browser
            },
            load: LoadSettings {
                navigation_timeout_secs: env("NAVIGATION_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(self.load.navigation_timeout_secs),
                ..self.load
            },
            ..self
        }
    }

    /// 校验配置
    pub fn validate(&self) -> DeckResult<()> {
        if !(1..=MAX_CONCURRENT_DECKS_LIMIT).contains(&self.max_concurrent_decks) {
            return Err(DeckError::Config(format!(
                "max_concurrent_decks 必须在 1 到 {} 之间",
                MAX_CONCURRENT_DECKS_LIMIT
            )));
        }
        if self.entry_file.trim().is_empty() {
            return Err(DeckError::Config("entry_file 不能为空".to_string()));
        }
        if self.load.navigation_timeout_secs == 0 {
            return Err(DeckError::Config("navigation_timeout_secs 必须大于 0".to_string()));
        }
        if self.load.poll_interval_ms == 0 || self.settle.poll_interval_ms == 0 {
            return Err(DeckError::Config("轮询间隔必须大于 0".to_string()));
        }
        self.print.validate()
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.load.navigation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_scripts() {
        let config = Config::default();
        assert_eq!(config.input_root, PathBuf::from("lectures"));
        assert_eq!(config.output_dir, PathBuf::from("pdfs"));
        assert_eq!(config.entry_file, "index.html");
        assert_eq!(config.max_concurrent_decks, 1);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.load.navigation_timeout_secs, 30);
        assert_eq!(config.settle.timeout_ms, 3000);
        assert_eq!(config.diagnostic.network_idle_timeout_secs, 15);
        assert_eq!(config.diagnostic.dom_content_timeout_secs, 10);
        assert_eq!(config.print.format, "A4");
        assert!(config.print.landscape);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn concurrency_must_stay_within_limit() {
        let mut config = Config {
            max_concurrent_decks: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.max_concurrent_decks = MAX_CONCURRENT_DECKS_LIMIT;
        assert!(config.validate().is_ok());

        config.max_concurrent_decks = usize::MAX;
        assert!(matches!(config.validate(), Err(DeckError::Config(_))));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            input_root = "decks"
            max_concurrent_decks = 4
            failure_policy = "continue"

            [print]
            format = "Letter"
            margins = { top = "0.5in" }

            [settle]
            strategy = "fixed"
            "#,
        )
        .unwrap();

        assert_eq!(config.input_root, PathBuf::from("decks"));
        assert_eq!(config.output_dir, PathBuf::from("pdfs"));
        assert_eq!(config.max_concurrent_decks, 4);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.print.format, "Letter");
        assert!(config.print.landscape);
        assert_eq!(config.print.margins.top, "0.5in");
        assert_eq!(config.print.margins.left, "10mm");
        assert_eq!(config.settle.strategy, SettleStrategy::Fixed);
        assert_eq!(config.settle.timeout_ms, 3000);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            Config::from_toml_str("failure_policy = \"retry\""),
            Err(DeckError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_concurrency_and_unknown_format() {
        let mut config = Config {
            max_concurrent_decks: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.max_concurrent_decks = 2;
        config.print.format = "postcard".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn failure_policy_parses_case_insensitively() {
        assert_eq!("Continue".parse::<FailurePolicy>().unwrap(), FailurePolicy::Continue);
        assert_eq!("ABORT".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
        assert!("skip".parse::<FailurePolicy>().is_err());
    }
}
