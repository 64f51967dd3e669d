//! 打印几何参数：纸张规格、页边距、以及转换为 DevTools `Page.printToPDF` 参数

use std::sync::LazyLock;

use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use phf::phf_map;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DeckError, DeckResult};

const MM_PER_INCH: f64 = 25.4;
const PX_PER_INCH: f64 = 96.0;

/// 长度：数字 + 可选单位（mm / cm / in / px）
static LENGTH_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(mm|cm|in|px)?\s*$"));

/// 纸张规格（纵向宽, 纵向高），单位毫米
static PAPER_FORMATS: phf::Map<&'static str, (f64, f64)> = phf_map! {
    "letter" => (215.9, 279.4),
    "legal" => (215.9, 355.6),
    "tabloid" => (279.4, 431.8),
    "ledger" => (431.8, 279.4),
    "a0" => (841.0, 1189.0),
    "a1" => (594.0, 841.0),
    "a2" => (420.0, 594.0),
    "a3" => (297.0, 420.0),
    "a4" => (210.0, 297.0),
    "a5" => (148.0, 210.0),
    "a6" => (105.0, 148.0),
};

/// 页面尺寸（毫米）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    /// 按纸张名称查找（大小写不敏感）
    pub fn from_format(format: &str) -> DeckResult<Self> {
        PAPER_FORMATS
            .get(format.trim().to_ascii_lowercase().as_str())
            .map(|&(width_mm, height_mm)| Self {
                width_mm,
                height_mm,
            })
            .ok_or_else(|| DeckError::Config(format!("未知的纸张规格: {}", format)))
    }

    /// 横向时交换宽高
    pub fn oriented(self, landscape: bool) -> Self {
        if landscape {
            Self {
                width_mm: self.height_mm,
                height_mm: self.width_mm,
            }
        } else {
            self
        }
    }

    pub fn width_in(&self) -> f64 {
        round_inches(self.width_mm / MM_PER_INCH)
    }

    pub fn height_in(&self) -> f64 {
        round_inches(self.height_mm / MM_PER_INCH)
    }
}

fn round_inches(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 解析长度字符串为英寸
///
/// 支持 `mm` / `cm` / `in` / `px`，不带单位的数字按像素处理。
pub fn parse_length_inches(value: &str) -> DeckResult<f64> {
    let re = LENGTH_PATTERN
        .as_ref()
        .map_err(|e| DeckError::Config(e.to_string()))?;

    let caps = re
        .captures(value)
        .ok_or_else(|| DeckError::Config(format!("无法解析长度: '{}'", value)))?;

    let number: f64 = caps[1]
        .parse()
        .map_err(|_| DeckError::Config(format!("无法解析长度: '{}'", value)))?;

    let inches = match caps.get(2).map(|m| m.as_str()) {
        Some("mm") => number / MM_PER_INCH,
        Some("cm") => number * 10.0 / MM_PER_INCH,
        Some("in") => number,
        _ => number / PX_PER_INCH,
    };

    Ok(inches)
}

/// 页边距配置（字符串形式，如 "10mm"）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform("10mm")
    }
}

impl Margins {
    pub fn uniform(value: &str) -> Self {
        Self {
            top: value.to_string(),
            right: value.to_string(),
            bottom: value.to_string(),
            left: value.to_string(),
        }
    }
}

/// 打印配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// 纸张规格
    pub format: String,
    /// 是否横向
    pub landscape: bool,
    pub margins: Margins,
    /// 是否打印背景
    pub print_background: bool,
    /// 是否优先使用 CSS `@page` 定义的尺寸
    pub prefer_css_page_size: bool,
    pub scale: f64,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            format: "A4".to_string(),
            landscape: true,
            margins: Margins::default(),
            print_background: true,
            prefer_css_page_size: true,
            scale: 1.0,
        }
    }
}

impl PrintConfig {
    /// 横向/纵向后的实际页面尺寸
    pub fn page_size(&self) -> DeckResult<PageSize> {
        Ok(PageSize::from_format(&self.format)?.oriented(self.landscape))
    }

    /// 校验配置，所有字段都可被解析
    pub fn validate(&self) -> DeckResult<()> {
        self.to_params()?;
        if self.scale.is_nan() || self.scale <= 0.0 {
            return Err(DeckError::Config(format!("打印缩放比例必须大于 0: {}", self.scale)));
        }
        Ok(())
    }

    /// 转换为 `Page.printToPDF` 参数
    ///
    /// 纸张尺寸按纵向传入，由 `landscape` 交给浏览器旋转。
    pub fn to_params(&self) -> DeckResult<PrintToPdfParams> {
        let paper = PageSize::from_format(&self.format)?;

        Ok(PrintToPdfParams {
            landscape: Some(self.landscape),
            print_background: Some(self.print_background),
            prefer_css_page_size: Some(self.prefer_css_page_size),
            scale: Some(self.scale),
            paper_width: Some(paper.width_in()),
            paper_height: Some(paper.height_in()),
            margin_top: Some(parse_length_inches(&self.margins.top)?),
            margin_right: Some(parse_length_inches(&self.margins.right)?),
            margin_bottom: Some(parse_length_inches(&self.margins.bottom)?),
            margin_left: Some(parse_length_inches(&self.margins.left)?),
            ..Default::default()
        })
    }
}
