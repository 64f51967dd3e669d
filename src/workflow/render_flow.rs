//! 幻灯片渲染流程 - 流程层
//!
//! 核心职责：定义"一份幻灯片"变成"一个 PDF"的完整流程
//!
//! 流程顺序：
//! 1. 导航并等待就绪（按加载策略逐级降级）
//! 2. 注入打印样式并等待生效
//! 3. 导出 PDF
//!
//! 批量模式与诊断模式共用同一个流程，差异由 [`RenderMode`] 描述。

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::DeckResult;
use crate::infrastructure::JsExecutor;
use crate::models::RenderJob;
use crate::services::{
    export_pdf, probe_framework, LoadOutcome, LoadTier, PageLoader, PrintStyle, ReadinessState,
    SettleOutcome, StyleSettler,
};
use crate::workflow::deck_ctx::DeckCtx;

/// 单份幻灯片渲染成功的结果
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutcome {
    pub deck: String,
    pub output_path: PathBuf,
    pub bytes: u64,
    pub elapsed_ms: u64,
}

/// 调用模式：批量 / 诊断
#[derive(Debug, Clone)]
pub struct RenderMode {
    pub name: &'static str,
    /// 加载策略，按顺序尝试
    pub load_tiers: Vec<LoadTier>,
    /// 为 None 时不注入样式
    pub print_style: Option<PrintStyle>,
    /// 演示框架探测表达式，为 None 时不探测
    pub framework_probe: Option<String>,
}

impl RenderMode {
    /// 批量模式：网络空闲一级策略，不探测框架
    pub fn batch(config: &Config) -> DeckResult<Self> {
        Ok(Self {
            name: "batch",
            load_tiers: vec![LoadTier::new(
                ReadinessState::NetworkIdle,
                config.navigation_timeout(),
            )],
            print_style: print_style_for(config)?,
            framework_probe: None,
        })
    }

    /// 诊断模式：网络空闲 → DOM 加载完成两级策略，并探测框架
    pub fn diagnostic(config: &Config) -> DeckResult<Self> {
        let settings = &config.diagnostic;
        Ok(Self {
            name: "diagnostic",
            load_tiers: vec![
                LoadTier::new(
                    ReadinessState::NetworkIdle,
                    Duration::from_secs(settings.network_idle_timeout_secs),
                ),
                LoadTier::new(
                    ReadinessState::DomContentLoaded,
                    Duration::from_secs(settings.dom_content_timeout_secs),
                ),
            ],
            print_style: print_style_for(config)?,
            framework_probe: Some(settings.framework_probe.clone()),
        })
    }
}

fn print_style_for(config: &Config) -> DeckResult<Option<PrintStyle>> {
    if !config.inject_print_style {
        return Ok(None);
    }
    match &config.print_style_file {
        Some(path) => PrintStyle::from_file(path).map(Some),
        None => Ok(Some(PrintStyle::for_page(config.print.page_size()?))),
    }
}

/// 幻灯片渲染流程
///
/// - 不持有任何资源（page 由调用方的渲染上下文提供）
/// - 只依赖业务能力（services）
pub struct RenderFlow {
    loader: PageLoader,
    settler: StyleSettler,
    mode: RenderMode,
}

impl RenderFlow {
    pub fn new(config: &Config, mode: RenderMode) -> Self {
        Self {
            loader: PageLoader::new(
                Duration::from_millis(config.load.poll_interval_ms),
                Duration::from_millis(config.load.network_quiet_ms),
            ),
            settler: StyleSettler::new(&config.settle),
            mode,
        }
    }

    /// 导航到入口文件并等待就绪
    pub async fn load(&self, executor: &JsExecutor, job: &RenderJob) -> DeckResult<LoadOutcome> {
        let url = job.source_url()?;
        self.loader.load(executor, &url, &self.mode.load_tiers).await
    }

    /// 注入打印样式并等待生效；未配置样式时什么都不做
    pub async fn prepare_print(
        &self,
        executor: &JsExecutor,
        ctx: &DeckCtx,
    ) -> DeckResult<Option<SettleOutcome>> {
        let Some(style) = &self.mode.print_style else {
            return Ok(None);
        };

        info!("{} 🎨 页面已加载，注入打印样式...", ctx);
        style.inject(executor).await?;
        self.settler.settle(executor).await.map(Some)
    }

    /// 探测演示框架运行时；未配置探测时返回 None
    pub async fn probe(&self, executor: &JsExecutor) -> DeckResult<Option<bool>> {
        match &self.mode.framework_probe {
            Some(expression) => probe_framework(executor, expression).await.map(Some),
            None => Ok(None),
        }
    }

    /// 打印为 PDF
    pub async fn export(&self, executor: &JsExecutor, job: &RenderJob) -> DeckResult<u64> {
        export_pdf(executor.page(), &job.print, &job.output_path).await
    }

    /// 完整流程：加载 → 样式 → 导出
    pub async fn run(
        &self,
        executor: &JsExecutor,
        job: &RenderJob,
        ctx: &DeckCtx,
    ) -> DeckResult<RenderOutcome> {
        let started = Instant::now();
        info!("{} 开始生成: {}", ctx, job.entry_path.display());

        let load = self.load(executor, job).await?;
        info!("{} ✓ 页面就绪 ({}, {}毫秒)", ctx, load.state, load.elapsed_ms);

        self.prepare_print(executor, ctx).await?;

        let bytes = self.export(executor, job).await?;
        info!(
            "{} ✅ PDF 生成成功: {} ({} 字节)",
            ctx,
            job.output_path.display(),
            bytes
        );

        Ok(RenderOutcome {
            deck: job.deck.clone(),
            output_path: job.output_path.clone(),
            bytes,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}
