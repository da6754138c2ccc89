use attune_core::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::ProviderHandle;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{Alphabetic}\p{Nd}]+").unwrap());

/// Split into lower-case runs of alphanumeric characters.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Registered providers in registration order.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    providers: Vec<ProviderHandle>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. A second provider with the same name is rejected and
    /// the registry is left as it was.
    pub fn register(&mut self, provider: ProviderHandle) -> Result<()> {
        let name = provider.name().to_string();
        if self.get(&name).is_some() {
            return Err(Error::DuplicateName(name));
        }
        debug!(name = %name, keywords = provider.trigger_keywords().len(), "Registering provider");
        self.providers.push(provider);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<ProviderHandle> {
        let idx = self.providers.iter().position(|p| p.name() == name)?;
        Some(self.providers.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&ProviderHandle> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// First provider, in registration order, that declares a keyword found
    /// in the message. Multi-word keywords must appear as consecutive tokens.
    pub fn find_by_keyword(&self, message_lowercased: &str) -> Option<&ProviderHandle> {
        let tokens = tokenize(message_lowercased);
        self.providers.iter().find(|provider| {
            provider
                .trigger_keywords()
                .iter()
                .any(|keyword| contains_phrase(&tokens, &tokenize(keyword)))
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderHandle> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && tokens.windows(phrase.len()).any(|w| w == phrase)
}
