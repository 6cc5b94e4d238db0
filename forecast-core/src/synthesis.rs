use crate::{Config, error::SynthesisError, model::OutputLabel, synthesis::google::GoogleTtsSynthesizer};
use async_trait::async_trait;
use std::{collections::HashMap, fmt::Debug, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

pub mod google;

/// Speech-synthesis collaborator. Each call overwrites the artifact for `label`.
#[async_trait]
pub trait Synthesizer: Send + Sync + Debug {
    async fn synthesize(&self, text: &str, label: OutputLabel) -> Result<PathBuf, SynthesisError>;
}

/// Wraps a synthesizer so concurrent writes to the same label run one at a
/// time. Different labels still proceed in parallel.
#[derive(Debug)]
pub struct SerializedSynthesizer {
    inner: Arc<dyn Synthesizer>,
    locks: HashMap<OutputLabel, Mutex<()>>,
}

impl SerializedSynthesizer {
    pub fn new(inner: Arc<dyn Synthesizer>) -> Self {
        let locks = OutputLabel::all()
            .iter()
            .map(|label| (*label, Mutex::new(())))
            .collect();
        Self { inner, locks }
    }
}

#[async_trait]
impl Synthesizer for SerializedSynthesizer {
    async fn synthesize(&self, text: &str, label: OutputLabel) -> Result<PathBuf, SynthesisError> {
        match self.locks.get(&label) {
            Some(lock) => {
                let _guard = lock.lock().await;
                self.inner.synthesize(text, label).await
            }
            None => self.inner.synthesize(text, label).await,
        }
    }
}

/// Construct the synthesizer from config. Label serialization is applied
/// only when `serialize_outputs` is set; otherwise overlapping writers race
/// and the last one to finish wins.
pub fn synthesizer_from_config(config: &Config) -> anyhow::Result<Arc<dyn Synthesizer>> {
    let google = GoogleTtsSynthesizer::new(config.synthesis.voice.clone(), config.output_dir.clone())?
        .with_base_url(&config.synthesis.base_url);
    let synth: Arc<dyn Synthesizer> = Arc::new(google);

    if config.serialize_outputs {
        Ok(Arc::new(SerializedSynthesizer::new(synth)))
    } else {
        Ok(synth)
    }
}
