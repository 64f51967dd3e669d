use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{DeckError, DeckResult};
use crate::models::print::PrintConfig;

/// 一份幻灯片：根目录下的一个子目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    /// 目录名，同时作为输出文件名
    pub name: String,
    /// 入口 HTML 文件路径
    pub entry_path: PathBuf,
    /// 入口文件是否存在（发现时的快照）
    pub has_entry: bool,
}

impl Deck {
    /// 根据根目录、目录名和入口文件名定位幻灯片
    pub fn locate(root: &Path, name: &str, entry_file: &str) -> Self {
        let entry_path = root.join(name).join(entry_file);
        let has_entry = entry_path.is_file();
        Self {
            name: name.to_string(),
            entry_path,
            has_entry,
        }
    }

    /// 输出 PDF 路径：`<output_dir>/<name>.pdf`
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.pdf", self.name))
    }
}

/// 渲染任务：一份幻灯片对应一个 PDF
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub deck: String,
    pub entry_path: PathBuf,
    pub output_path: PathBuf,
    pub print: PrintConfig,
}

impl RenderJob {
    pub fn new(deck: &Deck, output_dir: &Path, print: PrintConfig) -> Self {
        Self {
            deck: deck.name.clone(),
            entry_path: deck.entry_path.clone(),
            output_path: deck.output_path(output_dir),
            print,
        }
    }

    /// 确认入口文件仍然存在
    pub fn ensure_entry(&self) -> DeckResult<()> {
        if self.entry_path.is_file() {
            Ok(())
        } else {
            Err(DeckError::MissingEntryFile {
                deck: self.deck.clone(),
                path: self.entry_path.clone(),
            })
        }
    }

    /// 入口文件的 `file://` URL（基于绝对路径）
    pub fn source_url(&self) -> DeckResult<String> {
        let absolute = std::path::absolute(&self.entry_path)
            .map_err(|e| DeckError::io(&self.entry_path, e))?;

        Url::from_file_path(&absolute)
            .map(|url| url.to_string())
            .map_err(|_| {
                DeckError::Config(format!("无法转换为 file URL: {}", absolute.display()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn locate_flags_presence_of_entry_file() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("lecture-01")).unwrap();
        fs::write(root.path().join("lecture-01/index.html"), "<html></html>").unwrap();
        fs::create_dir(root.path().join("lecture-02")).unwrap();

        let present = Deck::locate(root.path(), "lecture-01", "index.html");
        assert!(present.has_entry);

        let absent = Deck::locate(root.path(), "lecture-02", "index.html");
        assert!(!absent.has_entry);
        assert_eq!(absent.entry_path, root.path().join("lecture-02/index.html"));
    }

    #[test]
    fn job_output_is_named_after_deck() {
        let deck = Deck {
            name: "lecture-01".to_string(),
            entry_path: PathBuf::from("lectures/lecture-01/index.html"),
            has_entry: true,
        };
        let job = RenderJob::new(&deck, Path::new("pdfs"), PrintConfig::default());
        assert_eq!(job.output_path, PathBuf::from("pdfs/lecture-01.pdf"));
    }

    #[test]
    fn ensure_entry_reports_missing_file() {
        let root = tempfile::tempdir().unwrap();
        let deck = Deck::locate(root.path(), "lecture-03", "index.html");
        let job = RenderJob::new(&deck, root.path(), PrintConfig::default());

        match job.ensure_entry() {
            Err(DeckError::MissingEntryFile { deck, .. }) => assert_eq!(deck, "lecture-03"),
            other => panic!("expected MissingEntryFile, got {:?}", other),
        }
    }

    #[test]
    fn source_url_uses_file_scheme() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("deck")).unwrap();
        fs::write(root.path().join("deck/index.html"), "").unwrap();

        let deck = Deck::locate(root.path(), "deck", "index.html");
        let job = RenderJob::new(&deck, root.path(), PrintConfig::default());
        let url = job.source_url().unwrap();

        assert!(url.starts_with("file://"));
        assert!(url.ends_with("/deck/index.html"));
    }
}
