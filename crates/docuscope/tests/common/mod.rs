//! Deterministic fake providers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use docuscope::error::{Error, Result};
use docuscope::providers::{EmbeddingProvider, LlmProvider};
use docuscope::{RagConfig, Session};

pub const DIMENSIONS: usize = 32;

/// Bag-of-words embedder: each lowercase alphanumeric token bumps one of
/// `DIMENSIONS` buckets chosen by an FNV hash
#[derive(Default)]
pub struct FakeEmbedder {
    pub healthy: AtomicBool,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Arc<Self> {
        let embedder = Self::default();
        embedder.healthy.store(true, Ordering::SeqCst);
        Arc::new(embedder)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in token.to_lowercase().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            v[(hash % DIMENSIONS as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::embedding("connection refused"));
        }
        Ok(Self::vector(text))
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-embed"
    }
}

/// LLM that answers with a fixed text and records the last prompt
#[derive(Default)]
pub struct FakeLlm {
    pub healthy: AtomicBool,
    pub fail: AtomicBool,
    /// Never complete, to exercise cancellation
    pub hang: AtomicBool,
    pub last_prompt: Mutex<Option<String>>,
}

impl FakeLlm {
    pub fn new() -> Arc<Self> {
        let llm = Self::default();
        llm.healthy.store(true, Ordering::SeqCst);
        Arc::new(llm)
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        *self.last_prompt.lock() = Some(prompt.to_string());
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::generation("model timed out"));
        }
        Ok("  The answer is in the document.  ".to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-llm"
    }
}

pub fn test_config() -> RagConfig {
    let mut config = RagConfig::default();
    config.embeddings.dimensions = DIMENSIONS;
    config
}

pub struct Harness {
    pub session: Session,
    pub embedder: Arc<FakeEmbedder>,
    pub llm: Arc<FakeLlm>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: RagConfig) -> Self {
        let embedder = FakeEmbedder::new();
        let llm = FakeLlm::new();
        let session = Session::new(&config, embedder.clone(), llm.clone());
        Self {
            session,
            embedder,
            llm,
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub async fn ready() -> Self {
        let mut harness = Self::new();
        harness.session.initialize().await.expect("fake models are healthy");
        harness
    }

    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }
}

/// A PDF with one line of Courier text per page
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}
