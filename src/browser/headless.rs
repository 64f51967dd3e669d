use std::time::Duration;

use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::config::BrowserSettings;
use crate::error::{DeckError, DeckResult};
use crate::infrastructure::JsExecutor;

/// 独立的渲染上下文
///
/// 每份幻灯片独占一个浏览器进程和一个页面，用完即关闭，
/// 避免样式或状态在幻灯片之间泄漏。
pub struct RenderContext {
    browser: Browser,
    handler_task: JoinHandle<()>,
    executor: JsExecutor,
}

impl RenderContext {
    /// 启动无头浏览器并创建空白页面
    pub async fn acquire(settings: &BrowserSettings) -> DeckResult<Self> {
        debug!("🚀 启动无头浏览器...");

        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .viewport(Viewport {
                width: settings.viewport_width,
                height: settings.viewport_height,
                ..Default::default()
            })
            .request_timeout(Duration::from_secs(settings.request_timeout_secs))
            .args(settings.args.clone());

        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }

        let config = builder.build().map_err(|e| {
            error!("配置无头浏览器失败: {}", e);
            DeckError::context_acquisition(format!("配置无头浏览器失败: {}", e))
        })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            DeckError::context_acquisition(format!("启动无头浏览器失败: {}", e))
        })?;
        debug!("无头浏览器启动成功");

        // 在后台处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                error!("创建页面失败: {}", e);
                let ctx_err = DeckError::context_acquisition(format!("创建页面失败: {}", e));
                shutdown(browser, handler_task).await;
                return Err(ctx_err);
            }
        };

        Ok(Self {
            browser,
            handler_task,
            executor: JsExecutor::new(page),
        })
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    /// 关闭浏览器并回收后台任务
    pub async fn release(self) {
        let Self {
            browser,
            handler_task,
            executor,
        } = self;
        drop(executor);
        shutdown(browser, handler_task).await;
    }
}

/// 正常关闭后等待进程退出的上限
const EXIT_GRACE: Duration = Duration::from_secs(5);

async fn shutdown(mut browser: Browser, handler_task: JoinHandle<()>) {
    stop_process(&mut browser, EXIT_GRACE).await;
    handler_task.abort();
    debug!("浏览器已关闭");
}

/// 浏览器进程的关闭操作
trait BrowserProcess {
    async fn close(&mut self) -> Result<(), String>;
    async fn wait(&mut self) -> Result<(), String>;
    async fn kill(&mut self) -> Result<(), String>;
}

impl BrowserProcess for Browser {
    async fn close(&mut self) -> Result<(), String> {
        Browser::close(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn wait(&mut self) -> Result<(), String> {
        Browser::wait(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn kill(&mut self) -> Result<(), String> {
        match Browser::kill(self).await {
            Some(Err(e)) => Err(e.to_string()),
            _ => Ok(()),
        }
    }
}

/// 先请求关闭，关闭失败或进程迟迟不退出时强制结束
async fn stop_process(process: &mut impl BrowserProcess, grace: Duration) {
    let exited = match process.close().await {
        Ok(()) => match timeout(grace, process.wait()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("等待浏览器进程退出失败: {}", e);
                false
            }
            Err(_) => {
                warn!("浏览器 {} 秒内未退出", grace.as_secs());
                false
            }
        },
        Err(e) => {
            warn!("关闭浏览器失败: {}", e);
            false
        }
    };

    if !exited {
        warn!("强制结束浏览器进程");
        if let Err(e) = process.kill().await {
            warn!("强制结束浏览器进程失败: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeProcess {
        close_fails: bool,
        wait_hangs: bool,
        waited: bool,
        killed: bool,
    }

    impl BrowserProcess for FakeProcess {
        async fn close(&mut self) -> Result<(), String> {
            if self.close_fails {
                return Err("connection closed".to_string());
            }
            Ok(())
        }

        async fn wait(&mut self) -> Result<(), String> {
            if self.wait_hangs {
                std::future::pending::<()>().await;
            }
            self.waited = true;
            Ok(())
        }

        async fn kill(&mut self) -> Result<(), String> {
            self.killed = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn clean_close_does_not_kill() {
        let mut process = FakeProcess::default();
        stop_process(&mut process, Duration::from_millis(50)).await;

        assert!(process.waited);
        assert!(!process.killed);
    }

    #[tokio::test]
    async fn failed_close_kills_without_waiting() {
        let mut process = FakeProcess {
            close_fails: true,
            wait_hangs: true,
            ..Default::default()
        };
        stop_process(&mut process, Duration::from_millis(50)).await;

        assert!(!process.waited);
        assert!(process.killed);
    }

    #[tokio::test]
    async fn hanging_exit_is_killed_after_grace() {
        let mut process = FakeProcess {
            wait_hangs: true,
            ..Default::default()
        };
        stop_process(&mut process, Duration::from_millis(50)).await;

        assert!(process.killed);
    }
}
