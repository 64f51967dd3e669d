use anyhow::Result;
use clap::Parser;
use deck_to_pdf::cli::{Cli, Command};
use deck_to_pdf::{logger, run_diagnostic, App};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    let cli = Cli::parse();

    // 加载配置
    let config = cli.load_config()?;

    match &cli.command {
        None | Some(Command::Batch) => {
            let report = App::initialize(config)?.run().await?;
            if !report.is_success() {
                anyhow::bail!("{} 个幻灯片导出失败", report.failed.len());
            }
            info!("成功生成 {} 个 PDF 文件!", report.success_count());
        }
        Some(Command::Diagnose { json, .. }) => {
            let report = run_diagnostic(&config).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            if !report.passed() {
                anyhow::bail!("诊断未通过: {}", report.deck);
            }
        }
    }

    Ok(())
}
