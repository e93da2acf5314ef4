use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use vialy::error::{Result, VialyError};
use vialy::providers::Generator;
use vialy::retrieval::{Passage, Retriever, RetrieverChain};
use vialy::storage::SqliteStore;
use vialy::{Assistant, Config};

/// Generator stand-in that records every prompt it receives and answers
/// with a canned reply. Can be told to fail or to stall past a deadline.
pub struct RecordingGenerator {
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub answer: String,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl RecordingGenerator {
    #[allow(dead_code)]
    pub fn answering(answer: &str) -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                prompts: Arc::clone(&prompts),
                answer: answer.to_string(),
                fail: false,
                delay: None,
            },
            prompts,
        )
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(VialyError::Provider("backend down".into()).into());
        }
        Ok(self.answer.clone())
    }
}

/// Retriever stand-in serving fixed passages
pub struct StaticRetriever {
    pub passages: Vec<(&'static str, &'static str, Option<u32>)>,
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, _query: &str, k: usize) -> Result<Vec<Passage>> {
        Ok(self
            .passages
            .iter()
            .take(k)
            .map(|(text, file, page)| Passage::new(text, file, *page))
            .collect())
    }
}

/// Retriever stand-in that always fails
pub struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<Passage>> {
        Err(VialyError::Retrieval("index unreachable".into()).into())
    }
}

/// Config pointing the store at a temp directory, with a short generation
/// deadline so timeout tests stay fast
#[allow(dead_code)]
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.session.db_path = Some(
        dir.path()
            .join("sessions.db")
            .to_string_lossy()
            .to_string(),
    );
    config.pipeline.generation_timeout_seconds = 2;
    config
}

/// Fully wired pipeline over temp storage with injected stand-ins
#[allow(dead_code)]
pub fn build_assistant(
    config: &Config,
    retrievers: Vec<Box<dyn Retriever>>,
    generator: Box<dyn Generator>,
) -> Assistant {
    let db_path = config
        .session
        .db_path
        .as_ref()
        .expect("test config must set db_path");
    let store = Arc::new(SqliteStore::new_with_path(db_path).expect("failed to create store"));
    Assistant::new(store, RetrieverChain::new(retrievers), generator, config)
}
