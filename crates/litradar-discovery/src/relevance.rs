//! Domain relevance: a broad keyword gate followed by a narrow off-topic
//! exclusion gate.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matched as substrings of the lowercased text with punctuation folded to
/// spaces. Short acronyms carry surrounding spaces so `ai` doesn't hit `said`.
const DEFAULT_KEYWORDS: &[&str] = &[
    // AI / ML
    "artificial intelligence",
    " ai ",
    " genai ",
    "generative",
    "machine learning",
    "deep learning",
    "neural network",
    "large language model",
    " llm",
    "chatgpt",
    " gpt",
    "diffusion model",
    "text to image",
    "algorithm",
    "automation",
    // creativity
    "creativ",
    "artist",
    "artwork",
    "design",
    "illustrat",
    "music",
    "writer",
    // labor
    "labor",
    "labour",
    "workforce",
    "worker",
    "employment",
    "occupation",
    "gig economy",
    "freelanc",
    // HCI
    "human computer",
    "human ai",
    " hci ",
    "co creation",
    "collaborat",
    "user experience",
    "interaction",
    // authorship
    "authorship",
    "copyright",
    "intellectual property",
    "attribution",
    "originality",
];

const OFF_TOPIC_PATTERNS: &[&str] = &[
    // healthcare
    r"(?i)\b(clinical|clinicians?|patients?|hospitals?|nursing|oncology|cancer|tumou?rs?|diabetes|cardiac|cardiovascular|surgery|surgical|radiology|diagnos[ie]s|disease|covid[- ]?19)\b",
    // hard sciences
    r"(?i)\b(quantum|astrophysics|astronomy|galax(y|ies)|molecular|molecules?|proteins?|genomics?|chemistry|chemical|polymers?|catalysts?|semiconductors?|crystallograph\w*)\b",
    // agriculture
    r"(?i)\b(agricultur\w*|agronom\w*|crops?|farming|farmers?|livestock|soil|irrigation|harvest)\b",
    // sports
    r"(?i)\b(sports?|athletes?|football|soccer|basketball|tennis|olympic)\b",
    // finance
    r"(?i)\b(stock markets?|stock prices?|trading|portfolios?|cryptocurrenc(y|ies)|bitcoin|credit risk|banking|asset pricing)\b",
    // military
    r"(?i)\b(military|warfare|weapons?|missiles?|battlefield|armed forces|defen[cs]e systems?)\b",
];

static OFF_TOPIC: Lazy<Vec<Regex>> = Lazy::new(|| {
    OFF_TOPIC_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("valid off-topic regex"))
        .collect()
});

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::with_vocabulary(DEFAULT_KEYWORDS.iter().copied())
    }
}

impl RelevanceFilter {
    /// A filter with a custom positive vocabulary. The off-topic exclusions
    /// are fixed.
    pub fn with_vocabulary<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .filter_map(|k| fold_keyword(k.as_ref()))
                .collect(),
        }
    }

    pub fn is_relevant(&self, title: &str, abstract_text: Option<&str>) -> bool {
        let text = format!("{title} {}", abstract_text.unwrap_or(""));
        self.has_keyword(&text) && !is_off_topic(&text)
    }

    fn has_keyword(&self, text: &str) -> bool {
        let haystack = fold(text);
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }
}

pub fn is_off_topic(text: &str) -> bool {
    OFF_TOPIC.iter().any(|re| re.is_match(text))
}

/// Lowercase, punctuation to spaces, padded so edge words match ` x `.
fn fold(text: &str) -> String {
    let body: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    format!(" {} ", body.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Fold a keyword the same way as the text it is searched in. Leading and
/// trailing spaces survive as a single space so word-boundary keywords keep
/// working.
fn fold_keyword(keyword: &str) -> Option<String> {
    let mapped: String = keyword
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let core = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    if core.is_empty() {
        return None;
    }
    let lead = if mapped.starts_with(' ') { " " } else { "" };
    let trail = if mapped.ends_with(' ') { " " } else { "" };
    Some(format!("{lead}{core}{trail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_on_topic_text() {
        let filter = RelevanceFilter::default();
        assert!(filter.is_relevant("AI and creative authorship in design", None));
        assert!(filter.is_relevant(
            "Platform work after automation",
            Some("We interview freelance illustrators.")
        ));
        assert!(filter.is_relevant("GenAI: a survey of co-creation tools", None));
    }

    #[test]
    fn requires_a_positive_keyword() {
        let filter = RelevanceFilter::default();
        assert!(!filter.is_relevant("Robotics in Manufacturing", None));
        assert!(!filter.is_relevant("She said the main road was closed", None));
    }

    #[test]
    fn off_topic_terms_exclude_on_topic_text() {
        let filter = RelevanceFilter::default();
        assert!(!filter.is_relevant(
            "Machine learning for cancer screening",
            Some("A study in hospitals.")
        ));
        assert!(!filter.is_relevant("Deep learning for crop yield forecasting", None));
        assert!(!filter.is_relevant("Generative AI in Military planning", None));
    }

    #[test]
    fn off_topic_matches_whole_words_only() {
        // "soiled" and "sportsmanship" are not whole-word hits.
        assert!(!is_off_topic("soiled canvases and sportsmanship"));
        assert!(is_off_topic("Soil moisture"));
    }

    #[test]
    fn custom_vocabulary_replaces_defaults() {
        let filter = RelevanceFilter::with_vocabulary(["typography"]);
        assert!(filter.is_relevant("Variable Typography on the web", None));
        assert!(!filter.is_relevant("Generative AI in design", None));
    }

    #[test]
    fn punctuated_custom_keywords_match() {
        let filter = RelevanceFilter::with_vocabulary(["Co-Creation", "human-AI", "text-to-image"]);
        assert!(filter.is_relevant("Co-creation with human-AI tools", None));
        assert!(filter.is_relevant("Prompting text to image systems", None));
        assert!(!filter.is_relevant("Creation myths of the north", None));
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let filter = RelevanceFilter::with_vocabulary(["", " - ", "typography"]);
        assert!(!filter.is_relevant("Anything at all goes here", None));
    }
}
