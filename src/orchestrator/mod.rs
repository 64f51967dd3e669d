//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量处理器
//! - 发现幻灯片、过滤缺失入口文件的目录
//! - 控制并发数量（Semaphore）与失败策略
//! - 汇总批次报告
//!
//! ### `diagnostic` - 单份幻灯片诊断
//! - 分级加载、框架探测、可选导出
//! - 逐项报告检查结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor / diagnostic
//!     ↓
//! workflow::RenderFlow (处理单份幻灯片)
//!     ↓
//! services (能力层：加载 / 样式 / 探测 / 导出)
//!     ↓
//! infrastructure + browser (JsExecutor、渲染上下文)
//! ```

pub mod batch_processor;
pub mod diagnostic;

pub use batch_processor::{App, BatchProcessor, BatchReport, DeckFailure};
pub use diagnostic::{run_diagnostic, CheckResult, DiagnosticReport};
