// src/config.rs

//! Support chat configuration: keyword tables, canned replies, glossary,
//! scripted texts, language tables and timings.
//!
//! Loaded once at startup and shared read-only (`Arc<SupportConfig>`).
//! The built-in file lives at `assets/support.yml`; `SUPPORT_CONFIG`
//! points at a replacement.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::chat::language::Language;
use crate::error::{Result, SupportError};
use crate::{log_info, log_warn};

const BUILTIN_CONFIG: &str = include_str!("../assets/support.yml");

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "SUPPORT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    pub customer_name: String,
    #[serde(default)]
    pub default_language: Language,
    pub timing: TimingConfig,
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub canned_replies: HashMap<String, String>,
    #[serde(default)]
    pub glossary: HashMap<String, String>,
    pub scripts: Scripts,
    pub personas: Personas,
    pub languages: HashMap<String, LanguageStrings>,

    #[serde(skip)]
    fallback_strings: LanguageStrings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub high_risk_countdown_secs: u32,
    pub emotional_countdown_secs: u32,
    pub callback_offer_delay_ms: u64,
    pub manual_join_delay_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_interval_ms: u64,
}

fn default_tick_ms() -> u64 {
    1000
}

impl TimingConfig {
    pub fn callback_offer_delay(&self) -> Duration {
        Duration::from_millis(self.callback_offer_delay_ms)
    }

    pub fn manual_join_delay(&self) -> Duration {
        Duration::from_millis(self.manual_join_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub high_risk: Vec<String>,
    pub emotional: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scripts {
    pub generic_reply: String,
    pub glossary_hint: String,
    pub glossary_missing: String,
    pub glossary_index: String,
    pub high_risk_alert: String,
    pub emotional_alert: String,
    pub callback_offer: String,
    pub manual_connecting: String,
    pub cancelled: String,
    pub instant_callback: String,
    pub scheduled_callback: String,
    pub audio_placeholder: String,
    pub audio_notice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personas {
    pub bot: String,
    pub security_bot: String,
    pub security_agent: AgentPersona,
    pub agent: AgentPersona,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPersona {
    pub name: String,
    pub greeting: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageStrings {
    pub header: String,
    pub welcome: String,
    pub speak: String,
}

impl SupportConfig {
    /// The configuration compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CONFIG)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: SupportConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        config.normalize();
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// `SUPPORT_CONFIG` if set, otherwise the built-in configuration.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                log_info!("Loading support config from {}", path);
                Self::from_path(Path::new(path.trim()))
            }
            Ok(_) => {
                log_warn!("{} is set but empty; using the built-in config", CONFIG_ENV);
                Self::builtin()
            }
            Err(_) => Self::builtin(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.keywords.high_risk.iter().all(|k| k.trim().is_empty()) {
            return Err(SupportError::ConfigError("high_risk keyword set is empty".into()));
        }
        if self.keywords.emotional.iter().all(|k| k.trim().is_empty()) {
            return Err(SupportError::ConfigError("emotional keyword set is empty".into()));
        }
        if self.timing.high_risk_countdown_secs == 0 || self.timing.emotional_countdown_secs == 0 {
            return Err(SupportError::ConfigError("countdowns must be at least one second".into()));
        }
        if self.timing.tick_interval_ms == 0 {
            return Err(SupportError::ConfigError("tick_interval_ms must be positive".into()));
        }
        for language in Language::all() {
            if !self.languages.contains_key(language.code()) {
                return Err(SupportError::UnknownLanguage(format!(
                    "no strings configured for '{}'",
                    language.code()
                )));
            }
        }
        Ok(())
    }

    /// Keywords, canned-reply keys and glossary terms are matched lowercase.
    fn normalize(&mut self) {
        let lower = |items: &mut Vec<String>| {
            items.retain(|k| !k.trim().is_empty());
            for item in items.iter_mut() {
                *item = item.to_lowercase();
            }
        };
        lower(&mut self.keywords.high_risk);
        lower(&mut self.keywords.emotional);

        self.canned_replies = self
            .canned_replies
            .drain()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        self.glossary = self
            .glossary
            .drain()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
    }

    pub fn strings(&self, language: Language) -> &LanguageStrings {
        self.languages
            .get(language.code())
            .unwrap_or(&self.fallback_strings)
    }

    pub fn welcome(&self, language: Language) -> String {
        fill(&self.strings(language).welcome, &[("customer", self.customer_name.as_str())])
    }
}

/// Replace `{key}` placeholders in a scripted text.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}
