//! 渲染器：把一个 [`RenderJob`] 变成一个 PDF
//!
//! 编排层只依赖 [`DeckRenderer`]，真实实现为 [`ChromeRenderer`]。

use std::future::Future;

use tracing::error;

use crate::browser::RenderContext;
use crate::config::{BrowserSettings, Config};
use crate::error::DeckResult;
use crate::models::RenderJob;
use crate::workflow::deck_ctx::DeckCtx;
use crate::workflow::render_flow::{RenderFlow, RenderMode, RenderOutcome};

/// 单份幻灯片渲染能力
pub trait DeckRenderer: Send + Sync + 'static {
    fn render(
        &self,
        job: RenderJob,
        ctx: DeckCtx,
    ) -> impl Future<Output = DeckResult<RenderOutcome>> + Send;
}

/// 基于无头 Chrome 的渲染器
///
/// 每次渲染都启动一个新的浏览器实例，结束后无论成败都会关闭。
pub struct ChromeRenderer {
    browser: BrowserSettings,
    flow: RenderFlow,
}

impl ChromeRenderer {
    pub fn new(config: &Config, mode: RenderMode) -> Self {
        Self {
            browser: config.browser.clone(),
            flow: RenderFlow::new(config, mode),
        }
    }
}

impl DeckRenderer for ChromeRenderer {
    async fn render(&self, job: RenderJob, ctx: DeckCtx) -> DeckResult<RenderOutcome> {
        job.ensure_entry()?;

        let context = RenderContext::acquire(&self.browser).await?;
        let executor = context.executor();
        let result = self.flow.run(executor, &job, &ctx).await;
        context.release().await;

        if let Err(e) = &result {
            error!("{} ❌ 渲染失败: {}", ctx, e);
        }
        result
    }
}
