//! # Deck to PDF
//!
//! 把基于浏览器的 HTML 幻灯片（reveal.js）批量导出为 PDF 的 Rust 应用程序
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 渲染上下文：每份幻灯片独占一个无头浏览器，用完即关闭
//! - `infrastructure/` - `JsExecutor`，唯一的 page owner，提供 eval() 能力
//!
//! ### ② 业务能力层（Services）
//! - `PageLoader` - 导航并等待就绪（网络空闲 / DOM 加载完成）
//! - `PrintStyle` / `StyleSettler` - 注入打印样式并确认生效
//! - `probe_framework` - 探测演示框架运行时
//! - `export_pdf` - 打印为 PDF 并整体写入
//!
//! ### ③ 流程层（Workflow）
//! - `RenderFlow` - 一份幻灯片的完整流程（加载 → 样式 → 导出）
//! - `RenderMode` - 批量 / 诊断两种调用模式的差异
//! - `DeckRenderer` - 编排层依赖的渲染能力
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理、并发与失败策略
//! - `orchestrator/diagnostic` - 单份幻灯片冒烟测试

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::RenderContext;
pub use config::{Config, FailurePolicy};
pub use error::{DeckError, DeckResult};
pub use infrastructure::JsExecutor;
pub use models::{discover_decks, Deck, RenderJob};
pub use orchestrator::{run_diagnostic, App, BatchProcessor, BatchReport, DiagnosticReport};
pub use workflow::{ChromeRenderer, DeckCtx, DeckRenderer, RenderFlow, RenderMode, RenderOutcome};
