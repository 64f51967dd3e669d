use std::path::PathBuf;

use thiserror::Error;

/// 幻灯片导出错误类型
///
/// 只有 [`DeckError::MissingEntryFile`] 在批量层面可以被跳过，
/// 其余错误都会中止整个批次（见 [`DeckError::is_skippable`]）。
#[derive(Debug, Error)]
pub enum DeckError {
    /// 输入根目录不存在
    #[error("幻灯片根目录不存在: {}", path.display())]
    MissingRoot { path: PathBuf },

    /// 幻灯片入口文件不存在
    #[error("[{deck}] 入口文件不存在: {}", path.display())]
    MissingEntryFile { deck: String, path: PathBuf },

    /// 页面在超时时间内未达到就绪状态
    #[error("导航到 {url} 超时 ({timeout_secs}秒内未达到 {state})")]
    NavigationTimeout {
        url: String,
        state: String,
        timeout_secs: u64,
    },

    /// 导航命令本身失败
    #[error("导航到 {url} 失败: {reason}")]
    Navigation { url: String, reason: String },

    /// PDF 导出失败
    #[error("导出 PDF 失败 ({}): {reason}", path.display())]
    Export { path: PathBuf, reason: String },

    /// 无法获取独立的渲染上下文（浏览器启动失败 / 页面创建失败）
    #[error("无法获取渲染上下文: {reason}")]
    ContextAcquisition { reason: String },

    /// 注入的脚本执行失败
    #[error("执行脚本失败 ({action}): {reason}")]
    Script { action: String, reason: String },

    /// 文件操作失败
    #[error("文件操作失败 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl DeckError {
    /// 批量处理时是否可以跳过该幻灯片并继续
    pub fn is_skippable(&self) -> bool {
        matches!(self, DeckError::MissingEntryFile { .. })
    }

    /// 是否为导航超时（诊断模式下会降级到下一个加载策略）
    pub fn is_navigation_timeout(&self) -> bool {
        matches!(self, DeckError::NavigationTimeout { .. })
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeckError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn script(action: impl Into<String>, source: impl std::fmt::Display) -> Self {
        DeckError::Script {
            action: action.into(),
            reason: source.to_string(),
        }
    }

    pub fn context_acquisition(source: impl std::fmt::Display) -> Self {
        DeckError::ContextAcquisition {
            reason: source.to_string(),
        }
    }
}

/// 幻灯片导出结果类型
pub type DeckResult<T> = Result<T, DeckError>;
