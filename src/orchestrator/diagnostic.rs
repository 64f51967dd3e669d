//! 单份幻灯片诊断 - 编排层
//!
//! 冒烟测试：对一份固定的幻灯片执行上下文获取、分级加载、框架探测，
//! 可选地导出 PDF，并逐项报告检查结果。
//!
//! 框架运行时缺失默认只作为提示（单独报告），
//! 设置 `require_framework_marker` 后才会导致诊断失败。

use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::browser::RenderContext;
use crate::config::Config;
use crate::error::{DeckError, DeckResult};
use crate::models::{Deck, RenderJob};
use crate::services::LoadOutcome;
use crate::workflow::{DeckCtx, RenderFlow, RenderMode};

/// 单项检查结果
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    /// 是否计入总体结果
    pub required: bool,
    pub detail: String,
}

/// 诊断报告
#[derive(Debug, Default, Serialize)]
pub struct DiagnosticReport {
    pub deck: String,
    pub checks: Vec<CheckResult>,
    pub load: Option<LoadOutcome>,
    /// 演示框架运行时是否存在，未执行到探测时为 None
    pub framework_marker: Option<bool>,
    pub output_path: Option<PathBuf>,
}

impl DiagnosticReport {
    fn new(deck: &str) -> Self {
        Self {
            deck: deck.to_string(),
            ..Default::default()
        }
    }

    fn record(
        &mut self,
        name: &'static str,
        passed: bool,
        required: bool,
        detail: impl Into<String>,
    ) {
        let detail = detail.into();
        if passed {
            info!("✓ {}: {}", name, detail);
        } else if required {
            error!("❌ {}: {}", name, detail);
        } else {
            warn!("⚠️ {}: {}", name, detail);
        }
        self.checks.push(CheckResult {
            name,
            passed,
            required,
            detail,
        });
    }

    /// 所有必需检查都通过
    pub fn passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// 运行诊断
///
/// 入口文件缺失和无法获取渲染上下文是致命错误，直接返回 `Err`；
/// 之后的步骤失败会记录到报告中。
pub async fn run_diagnostic(config: &Config) -> DeckResult<DiagnosticReport> {
    config.validate()?;
    let settings = &config.diagnostic;

    info!("{}", "=".repeat(60));
    info!("🔍 诊断幻灯片: {}", settings.deck);
    info!("{}", "=".repeat(60));

    let deck = Deck::locate(&config.input_root, &settings.deck, &config.entry_file);
    let job = RenderJob::new(&deck, &config.output_dir, config.print.clone());
    job.ensure_entry()?;

    let mut report = DiagnosticReport::new(&deck.name);
    report.record("entry_file", true, true, job.entry_path.display().to_string());

    let flow = RenderFlow::new(config, RenderMode::diagnostic(config)?);
    let ctx = DeckCtx::single(&deck.name);

    let context = RenderContext::acquire(&config.browser).await?;
    report.record("render_context", true, true, "无头浏览器已启动");

    let result = run_checks(&flow, &context, &job, &ctx, config, &mut report).await;
    context.release().await;

    if let Err(e) = result {
        report.record("unexpected_error", false, true, e.to_string());
    }

    info!(
        "{} 诊断{}",
        ctx,
        if report.passed() { "通过 ✅" } else { "未通过 ❌" }
    );
    Ok(report)
}

async fn run_checks(
    flow: &RenderFlow,
    context: &RenderContext,
    job: &RenderJob,
    ctx: &DeckCtx,
    config: &Config,
    report: &mut DiagnosticReport,
) -> DeckResult<()> {
    let executor = context.executor();

    match flow.load(executor, job).await {
        Ok(load) => {
            let detail = format!(
                "{} 就绪, 用时 {}毫秒{}",
                load.state,
                load.elapsed_ms,
                if load.fallback_used { "（已降级）" } else { "" }
            );
            report.record("navigation", true, true, detail);
            report.load = Some(load);
        }
        Err(e) => {
            report.record("navigation", false, true, e.to_string());
            return Ok(());
        }
    }

    let marker = flow.probe(executor).await?.unwrap_or(false);
    report.framework_marker = Some(marker);
    report.record(
        "framework_marker",
        marker,
        config.diagnostic.require_framework_marker,
        if marker { "检测到框架运行时" } else { "未检测到框架运行时" },
    );

    if !config.diagnostic.export_pdf {
        return Ok(());
    }

    if let Some(parent) = job.output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DeckError::io(parent, e))?;
    }

    let exported = async {
        flow.prepare_print(executor, ctx).await?;
        flow.export(executor, job).await
    }
    .await;

    match exported {
        Ok(bytes) => {
            report.record(
                "pdf_export",
                true,
                true,
                format!("{} ({} 字节)", job.output_path.display(), bytes),
            );
            report.output_path = Some(job.output_path.clone());
        }
        Err(e) => report.record("pdf_export", false, true, e.to_string()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &'static str, passed: bool, required: bool) -> CheckResult {
        CheckResult {
            name,
            passed,
            required,
            detail: String::new(),
        }
    }

    #[test]
    fn missing_marker_is_informational_by_default() {
        let report = DiagnosticReport {
            deck: "lecture-01".to_string(),
            checks: vec![
                check("entry_file", true, true),
                check("navigation", true, true),
                check("framework_marker", false, false),
            ],
            framework_marker: Some(false),
            ..Default::default()
        };
        assert!(report.passed());
        assert!(!report.check("framework_marker").unwrap().passed);
    }

    #[test]
    fn strict_marker_fails_report() {
        let report = DiagnosticReport {
            checks: vec![
                check("navigation", true, true),
                check("framework_marker", false, true),
            ],
            ..Default::default()
        };
        assert!(!report.passed());
    }

    #[test]
    fn navigation_failure_fails_report() {
        let report = DiagnosticReport {
            checks: vec![check("entry_file", true, true), check("navigation", false, true)],
            ..Default::default()
        };
        assert!(!report.passed());
    }

    #[test]
    fn empty_report_does_not_pass() {
        assert!(!DiagnosticReport::default().passed());
    }

    #[tokio::test]
    async fn missing_entry_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("lectures/lecture-01")).unwrap();

        let config = Config {
            input_root: tmp.path().join("lectures"),
            output_dir: tmp.path().join("pdfs"),
            ..Default::default()
        };

        match run_diagnostic(&config).await {
            Err(DeckError::MissingEntryFile { deck, .. }) => assert_eq!(deck, "lecture-01"),
            other => panic!("expected MissingEntryFile, got {:?}", other.map(|r| r.deck)),
        }
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = DiagnosticReport::new("lecture-01");
        report.record("framework_marker", false, false, "未检测到框架运行时");
        report.framework_marker = Some(false);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["deck"], "lecture-01");
        assert_eq!(json["framework_marker"], false);
        assert_eq!(json["checks"][0]["name"], "framework_marker");
        assert_eq!(json["checks"][0]["required"], false);
    }
}
