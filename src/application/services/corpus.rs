use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::application::RagService;
use crate::domain::{chunk_content, Document, DomainError};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Passage indexed when no corpus file is configured.
pub const DEFAULT_CORPUS: &[&str] = &[
    "New Delhi is the capital of India. It is located in the northern part of the country \
     and serves as the center of government, culture, and commerce. New Delhi is known for \
     its historical sites and vibrant urban life.",
];

/// Loads reference passages into the document collection.
pub struct CorpusService {
    rag: Arc<RagService>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl CorpusService {
    pub fn new(rag: Arc<RagService>) -> Self {
        Self {
            rag,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    pub fn with_chunking(rag: Arc<RagService>, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            rag,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Indexes each passage as one document, in order.
    #[instrument(skip(self, passages), fields(count = passages.len()))]
    pub async fn load_documents(
        &self,
        source: &str,
        passages: &[String],
    ) -> Result<Vec<Document>, DomainError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let collection = &self.rag.collections().documents;
        let texts: Vec<&str> = passages.iter().map(String::as_str).collect();
        let embeddings = self.rag.embed_batch(&texts).await?;
        if embeddings.len() != passages.len() {
            return Err(DomainError::internal(format!(
                "expected {} embeddings, got {}",
                passages.len(),
                embeddings.len()
            )));
        }

        let mut documents = Vec::with_capacity(passages.len());
        for (text, embedding) in passages.iter().zip(embeddings.iter()) {
            let id = self.rag.next_id(collection).await?;
            let doc = Document::new(id, source, text.as_str());
            self.rag.add(collection, &doc.to_record(), embedding).await?;
            documents.push(doc);
        }

        info!(source, count = documents.len(), "corpus indexed");
        Ok(documents)
    }

    /// Splits `content` on paragraph boundaries, with overlap, and indexes
    /// every chunk.
    pub async fn load_text(&self, source: &str, content: &str) -> Result<Vec<Document>, DomainError> {
        let chunks = chunk_content(content, self.chunk_size, self.chunk_overlap);
        self.load_documents(source, &chunks).await
    }

    #[instrument(skip(self))]
    pub async fn load_file(&self, path: &Path) -> Result<Vec<Document>, DomainError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DomainError::not_found(format!("{}: {e}", path.display())))?;
        let content = String::from_utf8_lossy(&bytes);
        self.load_text(&path.display().to_string(), &content).await
    }

    pub async fn load_default(&self) -> Result<Vec<Document>, DomainError> {
        let passages: Vec<String> = DEFAULT_CORPUS.iter().map(|s| s.to_string()).collect();
        self.load_documents("builtin", &passages).await
    }
}
