//! Knowledge-base document endpoints. All envelope-wrapped.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use super::{ApiClient, Envelope};

impl ApiClient {
    /// Uploads a local file into the knowledge base (multipart).
    pub async fn upload_document(&self, file: &Path, user_id: &str) -> Result<Envelope<Value>> {
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            )
            .text("userId", user_id.to_string());

        let request = self.http().post(self.url("/ai/documents")).multipart(form);
        self.fetch_enveloped(request, "upload document").await
    }

    /// Registers a server-side file path with the RAG index.
    pub async fn add_document_by_path(&self, file_path: &str) -> Result<Envelope<Value>> {
        let request = self
            .http()
            .post(self.url("/ai/rag/documents"))
            .json(&serde_json::json!({ "filePath": file_path }));
        self.fetch_enveloped(request, "add document by path").await
    }

    /// Removes a document from the knowledge base.
    pub async fn delete_document(&self, document_id: &str, user_id: &str) -> Result<Envelope<bool>> {
        let request = self
            .http()
            .delete(self.url(&format!("/ai/documents/{}", document_id)))
            .query(&[("userId", user_id)]);
        self.fetch_enveloped(request, "delete document").await
    }

    /// Lists the user's documents.
    pub async fn list_documents(&self, user_id: &str) -> Result<Envelope<Vec<Value>>> {
        let request = self
            .http()
            .get(self.url("/ai/documents"))
            .query(&[("userId", user_id)]);
        self.fetch_enveloped(request, "list documents").await
    }

    /// Rebuilds the RAG index from the registered documents.
    pub async fn reload_rag_index(&self) -> Result<Envelope<Value>> {
        let request = self.http().post(self.url("/ai/rag/reload"));
        self.fetch_enveloped(request, "reload RAG index").await
    }
}
