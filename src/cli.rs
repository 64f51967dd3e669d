//! 命令行参数

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, FailurePolicy};
use crate::error::DeckResult;

#[derive(Debug, Parser)]
#[command(name = "deck_to_pdf", version, about = "把 HTML 幻灯片批量导出为 PDF")]
pub struct Cli {
    /// TOML 配置文件
    #[arg(short, long, env = "DECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// 幻灯片根目录
    #[arg(long, global = true)]
    pub input: Option<PathBuf>,

    /// PDF 输出目录
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// 每个幻灯片目录下的入口文件名
    #[arg(long, global = true)]
    pub entry_file: Option<String>,

    /// 同时渲染的幻灯片数量
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// 单个幻灯片失败时继续处理其余幻灯片
    #[arg(long, global = true)]
    pub continue_on_error: bool,

    /// Chrome / Chromium 可执行文件
    #[arg(long, global = true)]
    pub chrome: Option<PathBuf>,

    /// 批次报告文件
    #[arg(long, global = true)]
    pub report: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 批量导出所有幻灯片（默认）
    Batch,
    /// 对单份幻灯片做冒烟测试
    Diagnose {
        /// 要检查的幻灯片目录名
        #[arg(long)]
        deck: Option<String>,
        /// 不导出 PDF
        #[arg(long)]
        no_export: bool,
        /// 未检测到演示框架运行时视为失败
        #[arg(long)]
        strict: bool,
        /// 以 JSON 输出诊断报告
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// 默认值 → 配置文件 → 环境变量 → 命令行参数
    pub fn load_config(&self) -> DeckResult<Config> {
        let base = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        let mut config = base.with_env();
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input_root = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(entry_file) = &self.entry_file {
            config.entry_file = entry_file.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrent_decks = concurrency;
        }
        if self.continue_on_error {
            config.failure_policy = FailurePolicy::Continue;
        }
        if let Some(chrome) = &self.chrome {
            config.browser.executable = Some(chrome.clone());
        }
        if let Some(report) = &self.report {
            config.report_file = Some(report.clone());
        }

        if let Some(Command::Diagnose {
            deck,
            no_export,
            strict,
            ..
        }) = &self.command
        {
            if let Some(deck) = deck {
                config.diagnostic.deck = deck.clone();
            }
            if *no_export {
                config.diagnostic.export_pdf = false;
            }
            if *strict {
                config.diagnostic.require_framework_marker = true;
            }
        }
    }
}
