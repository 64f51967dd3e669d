//! 打印样式服务 - 业务能力层
//!
//! 负责生成并注入打印样式，然后确认样式已经生效

use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::{SettleSettings, SettleStrategy};
use crate::error::{DeckError, DeckResult};
use crate::infrastructure::JsExecutor;
use crate::models::print::PageSize;

/// 注入的 `<style>` 元素 id
pub const STYLE_ELEMENT_ID: &str = "deck-to-pdf-print-style";

/// 打印样式
#[derive(Debug, Clone)]
pub struct PrintStyle {
    css: String,
}

impl PrintStyle {
    /// 按页面尺寸生成内置样式：每页一张幻灯片，隐藏进度条、控件和背景层
    pub fn for_page(size: PageSize) -> Self {
        let width = format_mm(size.width_mm);
        let height = format_mm(size.height_mm);

        let css = format!(
            r#"
@media print {{
  .reveal .slides {{
    width: {width} !important;
    height: {height} !important;
    left: 0 !important;
    top: 0 !important;
    transform: none !important;
    zoom: 1 !important;
  }}
  .reveal .slides section {{
    width: {width} !important;
    height: {height} !important;
    page-break-after: always !important;
    position: relative !important;
    margin: 0 !important;
    padding: 40px !important;
    box-sizing: border-box !important;
    display: flex !important;
    flex-direction: column !important;
    justify-content: center !important;
  }}
  .reveal .backgrounds {{
    display: none !important;
  }}
  .reveal .progress {{
    display: none !important;
  }}
  .reveal .controls {{
    display: none !important;
  }}
}}
"#
        );

        Self { css }
    }

    /// 从文件读取自定义样式
    pub fn from_file(path: &Path) -> DeckResult<Self> {
        let css = std::fs::read_to_string(path).map_err(|e| DeckError::io(path, e))?;
        Ok(Self { css })
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    /// 把样式追加到文档的 `<head>` 中
    pub async fn inject(&self, executor: &JsExecutor) -> DeckResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const existing = document.getElementById({id});
                if (existing) existing.remove();
                const style = document.createElement('style');
                style.id = {id};
                style.textContent = {css};
                (document.head || document.documentElement).appendChild(style);
                return true;
            }})()
            "#,
            id = json_string(STYLE_ELEMENT_ID),
            css = json_string(&self.css),
        );

        let injected: bool = executor.eval_as("注入打印样式", js_code).await?;
        if !injected {
            return Err(DeckError::script("注入打印样式", "样式元素未能插入"));
        }
        debug!("打印样式已注入 ({} 字节)", self.css.len());
        Ok(())
    }
}

fn format_mm(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}mm", value as i64)
    } else {
        format!("{:.1}mm", value)
    }
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// 样式等待结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// 探测确认样式已生效
    Confirmed(Duration),
    /// 达到等待上限仍未确认
    TimedOut(Duration),
    /// 固定等待
    Fixed(Duration),
}

/// 等待注入的样式生效
pub struct StyleSettler {
    strategy: SettleStrategy,
    limit: Duration,
    poll_interval: Duration,
}

impl StyleSettler {
    pub fn new(settings: &SettleSettings) -> Self {
        Self {
            strategy: settings.strategy,
            limit: Duration::from_millis(settings.timeout_ms),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
        }
    }

    /// 等待样式生效
    ///
    /// 探测模式下，样式表挂载、字体加载完毕并经过两帧绘制才算生效；
    /// 超过上限只记录警告，不视为失败。
    pub async fn settle(&self, executor: &JsExecutor) -> DeckResult<SettleOutcome> {
        if self.strategy == SettleStrategy::Fixed {
            sleep(self.limit).await;
            return Ok(SettleOutcome::Fixed(self.limit));
        }

        let js_code = format!(
            r#"
            (async () => {{
                const style = document.getElementById({id});
                if (!style || !style.sheet) return false;
                if (document.fonts && document.fonts.ready) await document.fonts.ready;
                await new Promise(resolve => requestAnimationFrame(() => requestAnimationFrame(resolve)));
                return true;
            }})()
            "#,
            id = json_string(STYLE_ELEMENT_ID),
        );

        self.poll_until_settled(move || {
            executor.eval_as::<bool>("确认样式生效", js_code.clone())
        })
        .await
    }

    /// 反复执行 `check` 直到返回 true 或达到等待上限
    async fn poll_until_settled<F, Fut>(&self, mut check: F) -> DeckResult<SettleOutcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DeckResult<bool>>,
    {
        let started = Instant::now();

        loop {
            let remaining = self.limit.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                warn!("⚠️ {}毫秒内未确认样式生效，继续导出", self.limit.as_millis());
                return Ok(SettleOutcome::TimedOut(started.elapsed()));
            }

            match timeout(remaining, check()).await {
                Ok(Ok(true)) => {
                    let elapsed = started.elapsed();
                    info!("✓ 打印样式已生效 ({}毫秒)", elapsed.as_millis());
                    return Ok(SettleOutcome::Confirmed(elapsed));
                }
                Ok(Ok(false)) => debug!("样式尚未挂载，继续等待"),
                Ok(Err(e)) => return Err(e),
                Err(_) => continue,
            }

            sleep(self.poll_interval.min(self.limit.saturating_sub(started.elapsed()))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_landscape_style_uses_original_slide_size() {
        let size = PageSize::from_format("A4").unwrap().oriented(true);
        let style = PrintStyle::for_page(size);

        assert!(style.css().contains("width: 297mm !important"));
        assert!(style.css().contains("height: 210mm !important"));
        assert!(style.css().contains("page-break-after: always"));
        assert!(style.css().contains(".reveal .progress"));
        assert!(style.css().contains(".reveal .controls"));
        assert!(style.css().contains(".reveal .backgrounds"));
    }

    #[test]
    fn fractional_sizes_keep_one_decimal() {
        let size = PageSize::from_format("Letter").unwrap();
        let style = PrintStyle::for_page(size);
        assert!(style.css().contains("width: 215.9mm"));
        assert!(style.css().contains("height: 279.4mm"));
    }

    #[test]
    fn custom_style_loaded_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("print.css");
        std::fs::write(&path, "@media print { body { margin: 0 } }").unwrap();

        let style = PrintStyle::from_file(&path).unwrap();
        assert_eq!(style.css(), "@media print { body { margin: 0 } }");

        assert!(matches!(
            PrintStyle::from_file(&dir.path().join("missing.css")),
            Err(DeckError::Io { .. })
        ));
    }

    #[test]
    fn css_is_embedded_as_js_string_literal() {
        let literal = json_string("a \"quoted\"\nline");
        assert_eq!(literal, r#""a \"quoted\"\nline""#);
    }

    #[test]
    fn settler_takes_limits_from_settings() {
        let settler = StyleSettler::new(&SettleSettings {
            strategy: SettleStrategy::Fixed,
            timeout_ms: 3000,
            poll_interval_ms: 250,
        });
        assert_eq!(settler.strategy, SettleStrategy::Fixed);
        assert_eq!(settler.limit, Duration::from_secs(3));
        assert_eq!(settler.poll_interval, Duration::from_millis(250));
    }

    fn polling_settler(timeout_ms: u64) -> StyleSettler {
        StyleSettler::new(&SettleSettings {
            strategy: SettleStrategy::Probe,
            timeout_ms,
            poll_interval_ms: 10,
        })
    }

    #[tokio::test]
    async fn settle_times_out_when_style_never_attaches() {
        let settler = polling_settler(60);
        let mut checks = 0;

        let outcome = settler
            .poll_until_settled(|| {
                checks += 1;
                async { Ok(false) }
            })
            .await
            .unwrap();

        match outcome {
            SettleOutcome::TimedOut(elapsed) => assert!(elapsed >= Duration::from_millis(60)),
            other => panic!("应等待超时，实际为 {:?}", other),
        }
        assert!(checks > 1, "未到上限前应反复检查");
    }

    #[tokio::test]
    async fn settle_times_out_when_check_hangs() {
        let settler = polling_settler(50);

        let outcome = settler
            .poll_until_settled(std::future::pending::<DeckResult<bool>>)
            .await
            .unwrap();

        assert!(matches!(outcome, SettleOutcome::TimedOut(_)));
    }

    #[tokio::test]
    async fn settle_confirms_once_style_is_live() {
        let settler = polling_settler(3000);
        let mut checks = 0;

        let outcome = settler
            .poll_until_settled(|| {
                checks += 1;
                let ready = checks >= 3;
                async move { Ok(ready) }
            })
            .await
            .unwrap();

        assert!(matches!(outcome, SettleOutcome::Confirmed(_)));
        assert_eq!(checks, 3);
    }

    #[tokio::test]
    async fn settle_propagates_script_errors() {
        let settler = polling_settler(3000);

        let result = settler
            .poll_until_settled(|| async {
                Err(DeckError::script("确认样式生效", "context destroyed"))
            })
            .await;

        assert!(matches!(result, Err(DeckError::Script { .. })));
    }
}
