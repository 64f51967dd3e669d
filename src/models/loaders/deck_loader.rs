use crate::error::{DeckError, DeckResult};
use crate::models::deck::Deck;
use std::path::Path;
use tokio::fs;

/// 列出根目录下的所有幻灯片目录名（按名称排序，不递归）
pub async fn discover_decks(root: &Path) -> DeckResult<Vec<String>> {
    if !fs::metadata(root).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Err(DeckError::MissingRoot {
            path: root.to_path_buf(),
        });
    }

    let mut names = Vec::new();
    let mut entries = fs::read_dir(root)
        .await
        .map_err(|e| DeckError::io(root, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DeckError::io(root, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| DeckError::io(entry.path(), e))?;

        if !file_type.is_dir() {
            continue;
        }
        // 名称会原样用于入口路径和输出文件名，不能做有损转换
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::warn!(
                "⚠️ 忽略目录 {}: 名称不是有效的 UTF-8",
                Path::new(&raw).display()
            ),
        }
    }

    names.sort();
    tracing::debug!("在 {} 下发现 {} 个目录", root.display(), names.len());

    Ok(names)
}

/// 发现并定位所有幻灯片，附带入口文件是否存在
pub async fn locate_decks(root: &Path, entry_file: &str) -> DeckResult<Vec<Deck>> {
    let names = discover_decks(root).await?;
    Ok(names
        .iter()
        .map(|name| Deck::locate(root, name, entry_file))
        .collect())
}
