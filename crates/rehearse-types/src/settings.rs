//! Per-chat settings and the catalog of allowed values.
//!
//! Settings are persisted as JSON using the field names of the original
//! schema, so rows written by older deployments still deserialize.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Language and time-zone preferences for one chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Language of the input words.
    #[serde(rename = "InputLanguage")]
    pub input_language: String,

    /// ISO 639-3 code of the input language.
    #[serde(rename = "InputLanguageISO639_3")]
    pub input_language_iso639_3: String,

    /// ISO 639-3 codes of accepted translation languages (true = accepted).
    #[serde(rename = "TranslationLanguages", default)]
    pub translation_languages: BTreeMap<String, bool>,

    #[serde(rename = "TimeZone", default = "default_time_zone")]
    pub time_zone: String,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_language: "Hungarian".to_string(),
            input_language_iso639_3: "hun".to_string(),
            translation_languages: ["eng", "rus", "ukr"]
                .into_iter()
                .map(|code| (code.to_string(), true))
                .collect(),
            time_zone: default_time_zone(),
        }
    }
}

impl Settings {
    /// Parsed time zone, if the stored value is well-formed.
    pub fn time_zone(&self) -> Option<TimeZone> {
        self.time_zone.parse().ok()
    }

    /// Adopt a language profile, replacing the translation set.
    pub fn apply_language(&mut self, profile: &LanguageProfile) {
        self.input_language = profile.name.clone();
        self.input_language_iso639_3 = profile.iso639_3.clone();
        self.translation_languages = profile
            .translations
            .iter()
            .map(|code| (code.clone(), true))
            .collect();
    }
}

/// A supported input language and the translations offered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageProfile {
    pub name: String,
    pub iso639_3: String,
    #[serde(default)]
    pub translations: Vec<String>,
}

impl LanguageProfile {
    fn new(name: &str, iso639_3: &str, translations: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            iso639_3: iso639_3.to_string(),
            translations: translations.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Enumerated allowed values for settings, injected from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCatalog {
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageProfile>,

    /// Lowest accepted whole-hour UTC offset.
    #[serde(default = "default_min_utc_offset")]
    pub min_utc_offset: i8,

    /// Highest accepted whole-hour UTC offset.
    #[serde(default = "default_max_utc_offset")]
    pub max_utc_offset: i8,
}

fn default_languages() -> Vec<LanguageProfile> {
    vec![
        LanguageProfile::new("Hungarian", "hun", &["eng", "rus", "ukr"]),
        LanguageProfile::new("English", "eng", &["rus", "ukr"]),
        LanguageProfile::new("German", "deu", &["eng", "rus", "ukr"]),
    ]
}

fn default_min_utc_offset() -> i8 {
    -12
}

fn default_max_utc_offset() -> i8 {
    11
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            min_utc_offset: default_min_utc_offset(),
            max_utc_offset: default_max_utc_offset(),
        }
    }
}

impl LanguageCatalog {
    /// Look up a language by its display name.
    pub fn language(&self, name: &str) -> Result<&LanguageProfile, SettingsError> {
        self.languages
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| SettingsError::UnsupportedLanguage(name.to_string()))
    }

    /// Parse a time zone and check it is within the allowed offsets.
    pub fn time_zone(&self, tz: &str) -> Result<TimeZone, SettingsError> {
        let parsed: TimeZone = tz
            .parse()
            .map_err(|_| SettingsError::UnsupportedTimeZone(tz.to_string()))?;
        if parsed.0 == 0 || (self.min_utc_offset..=self.max_utc_offset).contains(&parsed.0) {
            Ok(parsed)
        } else {
            Err(SettingsError::UnsupportedTimeZone(tz.to_string()))
        }
    }

    pub fn language_names(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.name.as_str()).collect()
    }
}

/// Whole-hour offset from UTC, written as `UTC`, `UTC+N` or `UTC-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeZone(pub i8);

impl TimeZone {
    pub fn to_fixed_offset(self) -> Option<FixedOffset> {
        FixedOffset::east_opt(i32::from(self.0) * 3600)
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "UTC")
        } else {
            write!(f, "UTC{:+}", self.0)
        }
    }
}

impl FromStr for TimeZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("UTC")
            .ok_or_else(|| format!("invalid time zone: '{s}'"))?;
        if rest.is_empty() {
            return Ok(TimeZone(0));
        }
        if !rest.starts_with(['+', '-']) {
            return Err(format!("invalid time zone: '{s}'"));
        }
        rest.parse::<i8>()
            .map(TimeZone)
            .map_err(|_| format!("invalid time zone: '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.input_language, "Hungarian");
        assert_eq!(settings.input_language_iso639_3, "hun");
        assert_eq!(settings.translation_languages.len(), 3);
        assert_eq!(settings.time_zone(), Some(TimeZone(0)));
    }

    #[test]
    fn test_settings_json_uses_legacy_field_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["InputLanguage"], "Hungarian");
        assert_eq!(json["InputLanguageISO639_3"], "hun");
        assert_eq!(json["TranslationLanguages"]["eng"], true);
        assert_eq!(json["TimeZone"], "UTC");
    }

    #[test]
    fn test_settings_parse_legacy_row_without_time_zone() {
        let raw = r#"{"InputLanguage":"German","InputLanguageISO639_3":"deu","TranslationLanguages":{"eng":true}}"#;
        let settings: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.input_language, "German");
        assert_eq!(settings.time_zone, "UTC");
    }

    #[test]
    fn test_apply_language_replaces_translations() {
        let catalog = LanguageCatalog::default();
        let mut settings = Settings::default();
        settings.apply_language(catalog.language("English").unwrap());
        assert_eq!(settings.input_language_iso639_3, "eng");
        assert!(!settings.translation_languages.contains_key("eng"));
        assert!(settings.translation_languages.contains_key("rus"));
    }

    #[test]
    fn test_catalog_rejects_unknown_language() {
        let catalog = LanguageCatalog::default();
        let err = catalog.language("Klingon").unwrap_err();
        assert!(matches!(err, SettingsError::UnsupportedLanguage(ref l) if l == "Klingon"));
    }

    #[test]
    fn test_time_zone_parse_and_display() {
        assert_eq!("UTC".parse::<TimeZone>().unwrap(), TimeZone(0));
        assert_eq!("UTC+3".parse::<TimeZone>().unwrap(), TimeZone(3));
        assert_eq!("UTC-11".parse::<TimeZone>().unwrap(), TimeZone(-11));
        assert_eq!(TimeZone(5).to_string(), "UTC+5");
        assert_eq!(TimeZone(-2).to_string(), "UTC-2");
        assert!("GMT+1".parse::<TimeZone>().is_err());
        assert!("UTC3".parse::<TimeZone>().is_err());
        assert!("UTC+".parse::<TimeZone>().is_err());
    }

    #[test]
    fn test_catalog_time_zone_range() {
        let catalog = LanguageCatalog::default();
        assert!(catalog.time_zone("UTC").is_ok());
        assert!(catalog.time_zone("UTC+0").is_ok());
        assert!(catalog.time_zone("UTC-12").is_ok());
        assert!(catalog.time_zone("UTC+11").is_ok());
        assert!(catalog.time_zone("UTC+12").is_err());
        assert!(catalog.time_zone("UTC-13").is_err());
    }

    #[test]
    fn test_time_zone_fixed_offset() {
        let offset = TimeZone(2).to_fixed_offset().unwrap();
        assert_eq!(offset.local_minus_utc(), 7200);
    }
}
