//! Document persistence: the JSON wire shape and file-level save/load over
//! a documents root.

use relative_path::RelativePath;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::{CommentReply, CommentThread, TextRange};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Document not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed document: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid documents directory: {0}")]
    InvalidDocumentsDir(String),
}

/// A saved document: buffer content plus every comment thread.
///
/// The shape is the persistence contract; ids are deliberately absent and
/// reassigned on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub content: String,
    pub comments: Vec<CommentPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPayload {
    pub range: TextRange,
    pub replies: Vec<ReplyPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub author: String,
    pub text: String,
    pub timestamp: u64,
}

impl From<&CommentThread> for CommentPayload {
    fn from(thread: &CommentThread) -> Self {
        Self {
            range: thread.range,
            replies: thread.replies.iter().map(Into::into).collect(),
        }
    }
}

impl From<&CommentReply> for ReplyPayload {
    fn from(reply: &CommentReply) -> Self {
        Self {
            author: reply.author.clone(),
            text: reply.text.clone(),
            timestamp: reply.created_at,
        }
    }
}

/// Read a document from the documents directory.
pub fn load_document(
    relative_path: &RelativePath,
    documents_root: &Path,
) -> Result<DocumentPayload, PersistError> {
    let absolute_path = relative_path.to_path(documents_root);
    if !absolute_path.exists() {
        return Err(PersistError::NotFound(absolute_path));
    }
    let raw = fs::read_to_string(&absolute_path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write a document into the documents directory, creating parent
/// directories as needed.
pub fn save_document(
    relative_path: &RelativePath,
    documents_root: &Path,
    payload: &DocumentPayload,
) -> Result<(), PersistError> {
    let absolute_path = relative_path.to_path(documents_root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let raw = serde_json::to_string_pretty(payload)?;
    fs::write(&absolute_path, raw)?;
    Ok(())
}

/// All saved documents under the documents directory, as sorted paths
/// relative to it.
pub fn list_documents(documents_root: &Path) -> Result<Vec<PathBuf>, PersistError> {
    if !documents_root.exists() {
        return Err(PersistError::InvalidDocumentsDir(
            "documents directory not found".to_string(),
        ));
    }

    let mut documents = Vec::new();
    collect_documents(documents_root, documents_root, &mut documents)?;
    documents.sort();
    Ok(documents)
}

fn collect_documents(
    dir: &Path,
    documents_root: &Path,
    documents: &mut Vec<PathBuf>,
) -> Result<(), PersistError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_documents(&path, documents_root, documents)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            if let Ok(relative) = path.strip_prefix(documents_root) {
                documents.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}
