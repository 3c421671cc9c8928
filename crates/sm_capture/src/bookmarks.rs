use serde_json::Value;
use sm_core::{BookmarkEntry, Result};
use std::path::Path;

/// Every web bookmark in a bookmark tree, depth first in the order the file lists
/// them (`serde_json` is built with `preserve_order`).
///
/// Accepts a Chromium `Bookmarks` file (`{"roots": {...}}`), a single node, or an
/// array of nodes. The bookmark title becomes the entry content.
pub fn collect_bookmarks(tree: &Value) -> Vec<BookmarkEntry> {
    let mut entries = Vec::new();
    walk(tree, &mut entries);
    entries
}

fn walk(node: &Value, entries: &mut Vec<BookmarkEntry>) {
    match node {
        Value::Array(nodes) => nodes.iter().for_each(|n| walk(n, entries)),
        Value::Object(object) => {
            if let Some(url) = object.get("url").and_then(Value::as_str) {
                if url.starts_with("http") {
                    let title = object
                        .get("name")
                        .or_else(|| object.get("title"))
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    entries.push(BookmarkEntry {
                        url: url.to_string(),
                        content: title.to_string(),
                    });
                }
            }
            if let Some(roots) = object.get("roots").and_then(Value::as_object) {
                roots.values().for_each(|root| walk(root, entries));
            }
            if let Some(children) = object.get("children") {
                walk(children, entries);
            }
        }
        _ => {}
    }
}

pub async fn load_bookmarks(path: &Path) -> Result<Vec<BookmarkEntry>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let tree: Value = serde_json::from_str(&raw)?;
    Ok(collect_bookmarks(&tree))
}
