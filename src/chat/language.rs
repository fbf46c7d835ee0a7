// src/chat/language.rs

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SupportError;

/// Display languages offered by the language bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ga,
    Fr,
    Es,
    Pt,
    Ja,
}

impl Language {
    pub fn all() -> Vec<Language> {
        vec![
            Language::En,
            Language::Ga,
            Language::Fr,
            Language::Es,
            Language::Pt,
            Language::Ja,
        ]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ga => "ga",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::Pt => "pt",
            Language::Ja => "ja",
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            Language::En => "🇬🇧",
            Language::Ga => "🇮🇪",
            Language::Fr => "🇫🇷",
            Language::Es => "🇪🇸",
            Language::Pt => "🇧🇷",
            Language::Ja => "🇯🇵",
        }
    }

    /// Next language in language-bar order, wrapping around.
    pub fn next(&self) -> Language {
        let all = Self::all();
        let index = all.iter().position(|l| l == self).unwrap_or(0);
        all[(index + 1) % all.len()]
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

impl FromStr for Language {
    type Err = SupportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::all()
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SupportError::UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps_around() {
        assert_eq!(Language::En.next(), Language::Ga);
        assert_eq!(Language::Ja.next(), Language::En);
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!("FR".parse::<Language>().unwrap(), Language::Fr);
        assert!(matches!(
            "de".parse::<Language>(),
            Err(SupportError::UnknownLanguage(_))
        ));
    }
}
