//! 幻灯片处理上下文
//!
//! 封装"我正在处理第几份幻灯片"这一信息，只用于日志

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct DeckCtx {
    /// 幻灯片目录名
    pub deck: String,

    /// 在本批次中的序号（从1开始）
    pub index: usize,

    /// 本批次待渲染总数
    pub total: usize,
}

impl DeckCtx {
    pub fn new(deck: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            deck: deck.into(),
            index,
            total,
        }
    }

    /// 单份幻灯片（诊断模式）
    pub fn single(deck: impl Into<String>) -> Self {
        Self::new(deck, 1, 1)
    }
}

impl Display for DeckCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[幻灯片 {}/{} {}]", self.index, self.total, self.deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_position_and_name() {
        let ctx = DeckCtx::new("lecture-02", 2, 3);
        assert_eq!(ctx.to_string(), "[幻灯片 2/3 lecture-02]");
        assert_eq!(DeckCtx::single("lecture-01").to_string(), "[幻灯片 1/1 lecture-01]");
    }
}
