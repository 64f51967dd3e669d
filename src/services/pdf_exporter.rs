//! PDF 导出服务 - 业务能力层
//!
//! 调用浏览器的打印能力，并把结果整体写入目标路径

use std::path::{Path, PathBuf};

use chromiumoxide::Page;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{DeckError, DeckResult};
use crate::models::print::PrintConfig;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// 打印当前页面并写入 `dest`，返回写入的字节数
pub async fn export_pdf(page: &Page, print: &PrintConfig, dest: &Path) -> DeckResult<u64> {
    info!("🖨️ 正在生成 PDF...");
    let params = print.to_params()?;

    let bytes = page.pdf(params).await.map_err(|e| DeckError::Export {
        path: dest.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!("浏览器返回 {} 字节", bytes.len());

    write_pdf_atomically(&bytes, dest).await
}

/// 先写临时文件再重命名，目标路径上不会出现半个 PDF
pub async fn write_pdf_atomically(bytes: &[u8], dest: &Path) -> DeckResult<u64> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(DeckError::Export {
            path: dest.to_path_buf(),
            reason: "浏览器返回的内容不是 PDF".to_string(),
        });
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DeckError::io(parent, e))?;
    }

    let partial = partial_path(dest);
    if let Err(e) = fs::write(&partial, bytes).await {
        let _ = fs::remove_file(&partial).await;
        return Err(DeckError::Export {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        });
    }

    fs::rename(&partial, dest).await.map_err(|e| DeckError::Export {
        path: dest.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(bytes.len() as u64)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_pdf_and_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pdfs/lecture-01.pdf");

        let written = write_pdf_atomically(b"%PDF-1.7\n%%EOF", &dest).await.unwrap();

        assert_eq!(written, 14);
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.7\n%%EOF");
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("lecture-01.pdf");
        std::fs::write(&dest, b"%PDF-old").unwrap();

        write_pdf_atomically(b"%PDF-new", &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-new");
    }

    #[tokio::test]
    async fn rejects_non_pdf_bytes_without_touching_dest() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("lecture-01.pdf");

        let err = write_pdf_atomically(b"<html>", &dest).await.unwrap_err();
        assert!(matches!(err, DeckError::Export { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("pdfs/lecture-01.pdf")),
            PathBuf::from("pdfs/lecture-01.pdf.part")
        );
    }
}
