//! 日志工具模块
//!
//! 提供批次进度输出和报告文件的辅助函数

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use tracing::info;

use crate::config::Config;
use crate::error::{DeckError, DeckResult};
use crate::orchestrator::BatchReport;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 幻灯片批量导出 PDF");
    info!("📁 输入目录: {}", config.input_root.display());
    info!("📂 输出目录: {}", config.output_dir.display());
    info!("📊 最大并发数: {}", config.max_concurrent_decks);
    info!("{}", "=".repeat(60));
}

/// 记录发现的幻灯片
pub fn log_decks_found(names: &[String]) {
    if names.is_empty() {
        info!("✓ 没有找到任何幻灯片目录");
    } else {
        info!("✓ 找到 {} 个幻灯片: {}", names.len(), names.join(", "));
    }
}

/// 打印最终统计信息
pub fn print_final_stats(report: &BatchReport, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("✅ 成功生成 {} 个 PDF 文件", report.success_count());
    info!("⏭️ 跳过: {}", report.skipped.len());
    info!("❌ 失败: {}", report.failed.len());
    info!("{}", "=".repeat(60));
    if let Some(path) = &config.report_file {
        info!("\n报告已保存至: {}", path.display());
    }
}

/// 生成纯文本的批次报告
pub fn format_report(report: &BatchReport, generated_at: DateTime<Local>) -> String {
    let mut text = format!(
        "{}\n幻灯片导出报告 - {}\n{}\n\n",
        "=".repeat(60),
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );

    for outcome in &report.rendered {
        text.push_str(&format!(
            "成功 | {} | {} | {} 字节 | {} 毫秒\n",
            outcome.deck,
            outcome.output_path.display(),
            outcome.bytes,
            outcome.elapsed_ms
        ));
    }
    for deck in &report.skipped {
        text.push_str(&format!("跳过 | {} | 入口文件不存在\n", deck));
    }
    for failure in &report.failed {
        text.push_str(&format!("失败 | {} | {}\n", failure.deck, failure.message));
    }

    text.push_str(&format!(
        "\n合计: 成功 {}, 跳过 {}, 失败 {}\n",
        report.success_count(),
        report.skipped.len(),
        report.failed.len()
    ));
    text
}

/// 写入报告文件（覆盖）
pub fn write_report_file(path: &Path, report: &BatchReport) -> DeckResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DeckError::io(parent, e))?;
    }
    fs::write(path, format_report(report, Local::now())).map_err(|e| DeckError::io(path, e))
}
