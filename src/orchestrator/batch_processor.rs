//! 批量幻灯片处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **发现**：扫描根目录下的所有幻灯片
//! 2. **过滤**：入口文件缺失的幻灯片记录为跳过
//! 3. **并发控制**：使用 Semaphore 限制同时渲染的数量（默认 1，即顺序处理）
//! 4. **失败策略**：默认第一个失败即中止，可配置为继续
//! 5. **全局统计**：汇总所有幻灯片的处理结果
//!
//! 每份幻灯片由 [`DeckRenderer`] 在自己的渲染上下文中完成，编排层不持有浏览器。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{error, info, warn};

use crate::config::{Config, FailurePolicy};
use crate::error::DeckError;
use crate::models::{locate_decks, RenderJob};
use crate::utils::logging::{
    log_decks_found, log_startup, print_final_stats, write_report_file,
};
use crate::workflow::{ChromeRenderer, DeckCtx, DeckRenderer, RenderMode, RenderOutcome};

/// 单份幻灯片的失败记录
#[derive(Debug, Clone, Serialize)]
pub struct DeckFailure {
    pub deck: String,
    pub message: String,
}

/// 批次报告
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    /// 成功生成的 PDF，按幻灯片名称排序
    pub rendered: Vec<RenderOutcome>,
    /// 入口文件缺失而跳过的幻灯片
    pub skipped: Vec<String>,
    /// 失败的幻灯片（仅在 continue 策略下出现）
    pub failed: Vec<DeckFailure>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 批量处理器
pub struct BatchProcessor<R: DeckRenderer> {
    config: Config,
    renderer: Arc<R>,
}

/// 使用无头 Chrome 的应用主结构
pub type App = BatchProcessor<ChromeRenderer>;

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置校验失败")?;
        let mode = RenderMode::batch(&config)?;
        let renderer = ChromeRenderer::new(&config, mode);
        Ok(BatchProcessor::new(config, renderer))
    }
}

impl<R: DeckRenderer> BatchProcessor<R> {
    pub fn new(config: Config, renderer: R) -> Self {
        Self {
            config,
            renderer: Arc::new(renderer),
        }
    }

    /// 运行批量导出
    ///
    /// abort 策略下第一个失败会中止批次并返回该错误；
    /// 已经生成的 PDF 保留在磁盘上。
    pub async fn run(&self) -> Result<BatchReport> {
        log_startup(&self.config);

        info!("\n📁 正在扫描幻灯片目录...");
        let decks = locate_decks(&self.config.input_root, &self.config.entry_file).await?;
        let names: Vec<String> = decks.iter().map(|d| d.name.clone()).collect();
        log_decks_found(&names);

        self.ensure_output_dir().await?;

        let mut report = BatchReport::default();
        let mut jobs = Vec::new();
        for deck in &decks {
            if deck.has_entry {
                jobs.push(RenderJob::new(
                    deck,
                    &self.config.output_dir,
                    self.config.print.clone(),
                ));
            } else {
                info!("⏭️ 跳过 {}: {} 不存在", deck.name, self.config.entry_file);
                report.skipped.push(deck.name.clone());
            }
        }

        let aborted_by = self.render_all(jobs, &mut report).await;

        if let Some(path) = &self.config.report_file {
            write_report_file(path, &report)?;
        }
        print_final_stats(&report, &self.config);

        match aborted_by {
            Some(error) => Err(error),
            None => Ok(report),
        }
    }

    async fn ensure_output_dir(&self) -> Result<()> {
        let dir = &self.config.output_dir;
        if !fs::try_exists(dir).await.unwrap_or(false) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;
            info!("📂 已创建输出目录: {}", dir.display());
        }
        Ok(())
    }

    /// 渲染所有任务，结果写入 `report`
    ///
    /// abort 策略下返回中止批次的错误。
    async fn render_all(
        &self,
        jobs: Vec<RenderJob>,
        report: &mut BatchReport,
    ) -> Option<anyhow::Error> {
        let total = jobs.len();
        let policy = self.config.failure_policy;
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_decks));
        let aborted = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();

        for (idx, job) in jobs.into_iter().enumerate() {
            // 拿到许可时，上一个占用许可的任务已经结束并记录了失败标记
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            if aborted.load(Ordering::SeqCst) {
                warn!("⛔ 批次已中止，剩余 {} 个幻灯片不再处理", total - idx);
                break;
            }

            let ctx = DeckCtx::new(job.deck.clone(), idx + 1, total);
            let deck = job.deck.clone();
            let renderer = self.renderer.clone();
            let aborted = aborted.clone();

            let handle = tokio::spawn(async move {
                let mut slot = DeckSlot {
                    aborted,
                    abort_on_drop: policy == FailurePolicy::Abort,
                    _permit: permit,
                };
                let result = renderer.render(job, ctx).await;
                if matches!(&result, Ok(_)) || matches!(&result, Err(e) if e.is_skippable()) {
                    slot.abort_on_drop = false;
                }
                result
            });
            handles.push((deck, handle));
        }

        let mut first_error: Option<(String, anyhow::Error)> = None;

        for (deck, handle) in handles {
            let error = match handle.await {
                Ok(Ok(outcome)) => {
                    report.rendered.push(outcome);
                    continue;
                }
                // 发现之后入口文件被删除
                Ok(Err(e @ DeckError::MissingEntryFile { .. })) => {
                    info!("⏭️ 跳过 {}: {}", deck, e);
                    report.skipped.push(deck);
                    continue;
                }
                Ok(Err(e)) => anyhow::Error::new(e),
                Err(e) => anyhow::anyhow!("渲染任务异常退出: {}", e),
            };

            error!("[{}] ❌ {}", deck, error);
            report.failed.push(DeckFailure {
                deck: deck.clone(),
                message: error.to_string(),
            });
            if first_error.is_none() {
                first_error = Some((deck, error));
            }
        }

        report.rendered.sort_by(|a, b| a.deck.cmp(&b.deck));
        report.skipped.sort();

        match (policy, first_error) {
            (FailurePolicy::Abort, Some((deck, error))) => {
                info!("已生成的 {} 个 PDF 保留在输出目录", report.success_count());
                Some(error.context(format!("[{}] 渲染失败，批次中止", deck)))
            }
            _ => None,
        }
    }
}

/// 渲染任务占用的并发名额
///
/// 任务失败或 panic 时先设置中止标记，再归还许可，
/// 这样下一个拿到许可的任务一定能看到标记。
struct DeckSlot {
    aborted: Arc<AtomicBool>,
    abort_on_drop: bool,
    _permit: OwnedSemaphorePermit,
}

impl Drop for DeckSlot {
    fn drop(&mut self) {
        if self.abort_on_drop {
            self.aborted.store(true, Ordering::SeqCst);
        }
    }
}
