//! Knowledge-base collections

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    client::{AgentClient, segment},
    error::{Error, Result},
    types::Ack,
};

/// Collection the backend uses when an upload names none
pub const DEFAULT_COLLECTION: &str = "sales_knowledge_base";

/// The backend's spelling of "no active collection" on the set endpoint
const NO_COLLECTION: &str = "None";

pub struct KnowledgeApi<'a> {
    pub(crate) client: &'a AgentClient,
}

#[derive(Debug, Serialize)]
struct ActiveRequest<'a> {
    collection: &'a str,
}

#[derive(Debug, Deserialize)]
struct ActiveResponse {
    active: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    top_k: u32,
}

/// Outcome of building a collection from uploaded documents
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub success: bool,
    pub collection: String,
    /// Number of indexed chunks
    pub chunks: u64,
}

/// One retrieved chunk
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryHit {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Search results; the backend reports lookup problems inline in `error`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryResult {
    pub hits: Vec<QueryHit>,
    pub error: Option<String>,
    pub hint: Option<String>,
}

impl KnowledgeApi<'_> {
    /// Names of every collection in the vector store
    pub async fn collections(&self) -> Result<Vec<String>> {
        self.client.get_json("/api/knowledge/collections").await
    }

    /// Collection the agent currently searches, if any
    pub async fn active(&self) -> Result<Option<String>> {
        let response: ActiveResponse = self.client.get_json("/api/knowledge/active").await?;
        Ok(response.active.filter(|name| name != NO_COLLECTION))
    }

    /// Select the collection the agent searches; `None` disables retrieval
    pub async fn set_active(&self, collection: Option<&str>) -> Result<Ack> {
        let body = ActiveRequest {
            collection: collection.unwrap_or(NO_COLLECTION),
        };
        self.client.post_json("/api/knowledge/active", &body).await
    }

    /// Upload documents and index them into `collection`
    pub async fn upload<P: AsRef<Path>>(&self, files: &[P], collection: &str) -> Result<UploadResult> {
        if files.is_empty() {
            return Err(Error::InvalidConfig("no files to upload".to_string()));
        }

        let mut form = reqwest::multipart::Form::new().text("collection_name", collection.to_string());
        for path in files {
            let path = path.as_ref();
            let data = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.txt".to_string());
            tracing::debug!("Uploading {} ({} bytes)", file_name, data.len());
            form = form.part("files", reqwest::multipart::Part::bytes(data).file_name(file_name));
        }

        self.client.post_multipart("/api/knowledge/upload", form).await
    }

    /// Retrieve the `top_k` best chunks for `query` from the active collection
    pub async fn query(&self, query: &str, top_k: u32) -> Result<QueryResult> {
        let body = QueryRequest { query, top_k };
        self.client.post_json("/api/knowledge/query", &body).await
    }

    /// Drop a collection; the backend clears the active selection if it matched
    pub async fn delete_collection(&self, name: &str) -> Result<Ack> {
        let path = format!("/api/knowledge/collection/{}", segment(name));
        self.client.delete_json(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::serve_once;

    #[tokio::test]
    async fn test_active_maps_none_string() {
        let (base, _server) = serve_once("200 OK", "application/json", vec![r#"{"active": "None"}"#]).await;
        let client = AgentClient::new(base).unwrap();
        assert_eq!(client.knowledge().active().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_active_none_sends_none_string() {
        let (base, server) =
            serve_once("200 OK", "application/json", vec![r#"{"success": true, "active": "None"}"#]).await;
        let client = AgentClient::new(base).unwrap();
        let ack = client.knowledge().set_active(None).await.unwrap();
        assert!(ack.success);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/knowledge/active"));
        assert!(request.contains(r#"{"collection":"None"}"#));
    }

    #[tokio::test]
    async fn test_query_reports_inline_error() {
        let (base, _server) = serve_once(
            "200 OK",
            "application/json",
            vec![r#"{"error": "No active collection set. Please activate a collection first."}"#],
        )
        .await;
        let client = AgentClient::new(base).unwrap();
        let result = client.knowledge().query("pricing", 3).await.unwrap();
        assert!(result.hits.is_empty());
        assert!(result.error.unwrap().contains("No active collection"));
    }

    #[tokio::test]
    async fn test_delete_collection_encodes_name() {
        let (base, server) = serve_once("200 OK", "application/json", vec![r#"{"success": true}"#]).await;
        let client = AgentClient::new(base).unwrap();
        client.knowledge().delete_collection("q3 prices").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("DELETE /api/knowledge/collection/q3%20prices"));
    }

    #[tokio::test]
    async fn test_upload_without_files_is_rejected() {
        let client = AgentClient::new("http://127.0.0.1:9").unwrap();
        let files: [&str; 0] = [];
        let err = client.knowledge().upload(&files, DEFAULT_COLLECTION).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
