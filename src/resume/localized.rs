// src/resume/localized.rs
//! Bilingual text values used by every resume block

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Sv,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Sv, Language::En];

    /// Normalize a user supplied language code, falling back to Swedish
    pub fn parse(lang: Option<&str>) -> Self {
        match lang.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("sv") | Some("se") | Some("swedish") | Some("svenska") => Language::Sv,
            Some("en") | Some("english") | Some("engelska") => Language::En,
            _ => Language::default(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Sv => "sv",
            Language::En => "en",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Language::Sv => Language::En,
            Language::En => Language::Sv,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Either a plain string shared by both languages or a `{sv, en}` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Localized {
        #[serde(default)]
        sv: String,
        #[serde(default)]
        en: String,
    },
}

impl Default for LocalizedText {
    fn default() -> Self {
        LocalizedText::Plain(String::new())
    }
}

impl From<&str> for LocalizedText {
    fn from(value: &str) -> Self {
        LocalizedText::Plain(value.to_string())
    }
}

impl LocalizedText {
    pub fn pair(sv: impl Into<String>, en: impl Into<String>) -> Self {
        LocalizedText::Localized {
            sv: sv.into(),
            en: en.into(),
        }
    }

    fn get(&self, lang: Language) -> &str {
        match (self, lang) {
            (LocalizedText::Plain(text), _) => text,
            (LocalizedText::Localized { sv, .. }, Language::Sv) => sv,
            (LocalizedText::Localized { en, .. }, Language::En) => en,
        }
    }

    /// Resolve to a single string. An empty translation falls back to the other language.
    pub fn resolve(&self, lang: Language) -> &str {
        let text = self.get(lang);
        if text.trim().is_empty() {
            self.get(lang.other())
        } else {
            text
        }
    }

    pub fn is_blank(&self) -> bool {
        Language::ALL.iter().all(|lang| self.get(*lang).trim().is_empty())
    }

    /// The language left untranslated when only one side of a pair is filled in
    pub fn missing_translation(&self) -> Option<Language> {
        match self {
            LocalizedText::Plain(_) => None,
            LocalizedText::Localized { sv, en } => {
                match (sv.trim().is_empty(), en.trim().is_empty()) {
                    (true, false) => Some(Language::Sv),
                    (false, true) => Some(Language::En),
                    _ => None,
                }
            }
        }
    }
}
