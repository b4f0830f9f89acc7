//! # Locale Classification
//!
//! A small heuristic language detector for user questions. Each locale is a
//! rule carrying marker substrings; rules are tried in order and the first one
//! whose marker appears in the case-folded question wins. Unmatched input
//! always resolves to the default locale, so classification never fails.

use crate::constants::DEFAULT_LOCALE;
use serde::Deserialize;
use std::collections::HashMap;

/// Slovak markers: question words, time words, receipt vocabulary, retail
/// chains, cities and common grocery categories.
const SK_MARKERS: &[&str] = &[
    "koľko", "kolko", "kedy", "ktoré", "ktore", "posledných", "poslednych", "najviac",
    "najmenej", "porovnaj", "porovnať", "spolu", "suma",
    // time
    "včera", "vcera", "dnes", "zajtra", "minulý", "minuly", "budúci", "buduci", "týždeň",
    "tyzden", "mesiac", "rok", "v roku", "za mesiac", "za týždeň",
    // shopping
    "nákup", "nakup", "nákupy", "nakupy", "pokladňa", "pokladna", "bloček", "blocek",
    "účtenka", "uctenka", "paragon",
    // places
    "obchod", "predajňa", "predajna", "supermarket", "potraviny", "predaj", "prevádzka",
    "prevadzka", "pobočka", "pobocka",
    // chains
    "lidl", "tesco", "kaufland", "billa", "coop", "terno", "jednota",
    // cities
    "bratislava", "košice", "kosice", "žilina", "zilina", "prešov", "presov", "nitra",
    "trnava", "trenčín", "trencin", "banská bystrica", "banska bystrica",
    // groceries
    "pivo", "víno", "vino", "syry", "syr", "klobása", "klobasa", "pečivo", "pecivo", "mlieko",
    "džús",
];

/// One entry of the rule table: a locale tag and the markers that select it.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleRule {
    pub tag: String,
    pub markers: Vec<String>,
}

impl LocaleRule {
    pub fn new(tag: &str, markers: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    /// `folded` must already be lowercased.
    fn matches(&self, folded: &str) -> bool {
        self.markers.iter().any(|m| folded.contains(m.as_str()))
    }
}

/// Fixed sentences used when the narration model gives nothing usable.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackPhrases {
    pub no_data: String,
    pub summary_ready: String,
}

/// The ordered rule table plus the per-locale fallback sentences.
#[derive(Debug, Clone)]
pub struct LocaleRules {
    rules: Vec<LocaleRule>,
    default_tag: String,
    phrases: HashMap<String, FallbackPhrases>,
}

impl Default for LocaleRules {
    fn default() -> Self {
        let mut phrases = HashMap::new();
        phrases.insert(
            "sk".to_string(),
            FallbackPhrases {
                no_data: "Nenašli sme žiadne zodpovedajúce údaje.".to_string(),
                summary_ready: "Zhrnutie je pripravené.".to_string(),
            },
        );
        phrases.insert(
            "en".to_string(),
            FallbackPhrases {
                no_data: "No matching data was found.".to_string(),
                summary_ready: "Summary is ready.".to_string(),
            },
        );
        Self {
            rules: vec![LocaleRule::new("sk", SK_MARKERS)],
            default_tag: DEFAULT_LOCALE.to_string(),
            phrases,
        }
    }
}

impl LocaleRules {
    /// Appends a rule. Earlier rules take precedence.
    pub fn with_rule(mut self, rule: LocaleRule, phrases: FallbackPhrases) -> Self {
        self.phrases.insert(rule.tag.clone(), phrases);
        self.rules.push(rule);
        self
    }

    /// Returns the locale tag for `question`.
    pub fn classify(&self, question: &str) -> &str {
        let folded = question.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&folded))
            .map(|rule| rule.tag.as_str())
            .unwrap_or(&self.default_tag)
    }

    /// Fallback sentences for `locale`, or for the default locale when the tag is unknown.
    pub fn phrases(&self, locale: &str) -> Option<&FallbackPhrases> {
        self.phrases
            .get(locale)
            .or_else(|| self.phrases.get(&self.default_tag))
    }

    pub fn no_data(&self, locale: &str) -> String {
        self.phrases(locale)
            .map(|p| p.no_data.clone())
            .unwrap_or_default()
    }

    pub fn summary_ready(&self, locale: &str) -> String {
        self.phrases(locale)
            .map(|p| p.summary_ready.clone())
            .unwrap_or_default()
    }
}
