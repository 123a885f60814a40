use crate::domain::draft::{Document, RegistrationDraft};
use crate::error::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A registration draft on disk: form fields plus paths of the attachments.
///
/// Relative attachment paths are resolved against the draft file's directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftFile {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub category: String,
    pub documents: Vec<PathBuf>,
    pub voter_id: Option<PathBuf>,
    pub extra: BTreeMap<String, String>,
}

impl DraftFile {
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Reads the attachments and builds the in-memory draft.
    pub async fn into_draft(self, base_dir: &Path) -> Result<RegistrationDraft> {
        let mut documents = Vec::with_capacity(self.documents.len());
        for path in &self.documents {
            documents.push(load_document(&base_dir.join(path)).await?);
        }
        let voter_id = match &self.voter_id {
            Some(path) => Some(load_document(&base_dir.join(path)).await?),
            None => None,
        };

        Ok(RegistrationDraft {
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            password: self.password,
            category: self.category,
            documents,
            voter_id,
            extra: self.extra,
        })
    }
}

async fn load_document(path: &Path) -> Result<Document> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Document::new(file_name, content_type(path), bytes))
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
