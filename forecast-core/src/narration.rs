use crate::{Config, error::NarrationError, narration::openai::OpenAiNarrator};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openai;

/// Text-generation collaborator.
#[async_trait]
pub trait Narrator: Send + Sync + Debug {
    /// Generate text for `system` plus ordered prompt `fragments`.
    async fn generate(&self, system: &str, fragments: &[&str]) -> Result<String, NarrationError>;
}

/// Join prompt fragments into the single user message sent to the model.
/// Each fragment starts on its own line.
pub fn compose_user_message(fragments: &[&str]) -> String {
    fragments.iter().fold(String::new(), |mut acc, fragment| {
        acc.push('\n');
        acc.push_str(fragment);
        acc
    })
}

pub fn narrator_from_config(config: &Config) -> anyhow::Result<Arc<dyn Narrator>> {
    let narrator = OpenAiNarrator::new(
        config.narration_api_key()?.to_owned(),
        config.narration.model.clone(),
    )?
    .with_base_url(&config.narration.base_url);

    Ok(Arc::new(narrator))
}
