//! Tokens of a free-text field description.
//!
//! Multi-word terms ("firm to stiff", "moderately weathered") are matched
//! first, then single words. Unknown words are checked against a table of
//! common misspellings and finally fuzzy-matched against the vocabulary.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Minimum similarity for a fuzzy spelling correction.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// What a token describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Consistency,
    Density,
    RockStrength,
    Weathering,
    /// Bedding and discontinuity terms for rock
    Structure,
    Colour,
    /// slightly / moderately / very, qualifying the next constituent
    Proportion,
    /// sandy, silty, gravelly, clayey
    Constituent,
    Moisture,
    ParticleSize,
    Plasticity,
    SoilType,
    RockType,
    Unknown,
}

impl TokenKind {
    /// Kinds that misspelt words may be corrected to. Strength and state
    /// terms are short enough that fuzzy matching them misfires.
    fn accepts_fuzzy(&self) -> bool {
        !matches!(
            self,
            TokenKind::Consistency
                | TokenKind::Density
                | TokenKind::RockStrength
                | TokenKind::Weathering
                | TokenKind::Unknown
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Lower-case term after any spelling correction
    pub value: String,
    /// Byte offsets into the input
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Multi-word terms; earlier entries win.
const PHRASES: &[(&str, TokenKind)] = &[
    ("very soft to soft", TokenKind::Consistency),
    ("soft to firm", TokenKind::Consistency),
    ("firm to stiff", TokenKind::Consistency),
    ("stiff to very stiff", TokenKind::Consistency),
    ("very stiff to hard", TokenKind::Consistency),
    ("extremely high plasticity", TokenKind::Plasticity),
    ("high plasticity", TokenKind::Plasticity),
    ("intermediate plasticity", TokenKind::Plasticity),
    ("low plasticity", TokenKind::Plasticity),
    ("non-plastic", TokenKind::Plasticity),
    ("extremely strong", TokenKind::RockStrength),
    ("very strong", TokenKind::RockStrength),
    ("very weak", TokenKind::RockStrength),
    ("moderately strong", TokenKind::RockStrength),
    ("moderately weak", TokenKind::RockStrength),
    ("very soft", TokenKind::Consistency),
    ("very stiff", TokenKind::Consistency),
    ("very loose", TokenKind::Density),
    ("medium dense", TokenKind::Density),
    ("very dense", TokenKind::Density),
    ("completely weathered", TokenKind::Weathering),
    ("highly weathered", TokenKind::Weathering),
    ("moderately weathered", TokenKind::Weathering),
    ("slightly weathered", TokenKind::Weathering),
    ("very thinly bedded", TokenKind::Structure),
    ("very thickly bedded", TokenKind::Structure),
    ("thinly bedded", TokenKind::Structure),
    ("medium bedded", TokenKind::Structure),
    ("thickly bedded", TokenKind::Structure),
    ("fine to medium", TokenKind::ParticleSize),
    ("medium to coarse", TokenKind::ParticleSize),
    ("fine to coarse", TokenKind::ParticleSize),
    ("dark brown", TokenKind::Colour),
    ("light brown", TokenKind::Colour),
    ("reddish brown", TokenKind::Colour),
    ("yellowish brown", TokenKind::Colour),
    ("greyish brown", TokenKind::Colour),
    ("grayish brown", TokenKind::Colour),
    ("dark grey", TokenKind::Colour),
    ("dark gray", TokenKind::Colour),
    ("light grey", TokenKind::Colour),
    ("light gray", TokenKind::Colour),
    ("brownish grey", TokenKind::Colour),
    ("brownish gray", TokenKind::Colour),
];

/// Single-word vocabulary, in fuzzy-match priority order.
const WORDS: &[(&str, TokenKind)] = &[
    ("clay", TokenKind::SoilType),
    ("silt", TokenKind::SoilType),
    ("sand", TokenKind::SoilType),
    ("gravel", TokenKind::SoilType),
    ("peat", TokenKind::SoilType),
    ("organic", TokenKind::SoilType),
    ("cobbles", TokenKind::SoilType),
    ("boulders", TokenKind::SoilType),
    ("limestone", TokenKind::RockType),
    ("sandstone", TokenKind::RockType),
    ("mudstone", TokenKind::RockType),
    ("shale", TokenKind::RockType),
    ("granite", TokenKind::RockType),
    ("basalt", TokenKind::RockType),
    ("brown", TokenKind::Colour),
    ("grey", TokenKind::Colour),
    ("gray", TokenKind::Colour),
    ("red", TokenKind::Colour),
    ("yellow", TokenKind::Colour),
    ("yellowish", TokenKind::Colour),
    ("orange", TokenKind::Colour),
    ("black", TokenKind::Colour),
    ("white", TokenKind::Colour),
    ("green", TokenKind::Colour),
    ("blue", TokenKind::Colour),
    ("pink", TokenKind::Colour),
    ("purple", TokenKind::Colour),
    ("tan", TokenKind::Colour),
    ("buff", TokenKind::Colour),
    ("slightly", TokenKind::Proportion),
    ("moderately", TokenKind::Proportion),
    ("very", TokenKind::Proportion),
    ("sandy", TokenKind::Constituent),
    ("silty", TokenKind::Constituent),
    ("gravelly", TokenKind::Constituent),
    ("clayey", TokenKind::Constituent),
    ("dry", TokenKind::Moisture),
    ("moist", TokenKind::Moisture),
    ("wet", TokenKind::Moisture),
    ("saturated", TokenKind::Moisture),
    ("fine", TokenKind::ParticleSize),
    ("medium", TokenKind::ParticleSize),
    ("coarse", TokenKind::ParticleSize),
    ("soft", TokenKind::Consistency),
    ("firm", TokenKind::Consistency),
    ("stiff", TokenKind::Consistency),
    ("hard", TokenKind::Consistency),
    ("loose", TokenKind::Density),
    ("dense", TokenKind::Density),
    ("strong", TokenKind::RockStrength),
    ("weak", TokenKind::RockStrength),
    ("fresh", TokenKind::Weathering),
    ("bedded", TokenKind::Structure),
    ("laminated", TokenKind::Structure),
    ("massive", TokenKind::Structure),
    ("jointed", TokenKind::Structure),
    ("fractured", TokenKind::Structure),
];

static VOCABULARY: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| WORDS.iter().copied().collect());

static TYPOS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("firn", "firm"),
        ("frim", "firm"),
        ("stif", "stiff"),
        ("stiif", "stiff"),
        ("vrey", "very"),
        ("vrry", "very"),
        ("clai", "clay"),
        ("caly", "clay"),
        ("claey", "clay"),
        ("snad", "sand"),
        ("snda", "sand"),
        ("gravle", "gravel"),
        ("gravelley", "gravelly"),
        ("limstone", "limestone"),
        ("limstn", "limestone"),
        ("sandston", "sandstone"),
        ("mudstn", "mudstone"),
        ("mudston", "mudstone"),
        ("granit", "granite"),
        ("slighly", "slightly"),
        ("moderatly", "moderately"),
        ("dens", "dense"),
        ("loos", "loose"),
        ("medim", "medium"),
    ])
});

/// Case-insensitive edit distance, counted in characters.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() {
        return b.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 - distance / longer length`; 1.0 for two empty strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

/// Best option at or above `threshold`; the first one wins a tie.
pub fn fuzzy_match<'a, I>(target: &str, options: I, threshold: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    options
        .into_iter()
        .map(|option| (option, similarity(target, option)))
        .filter(|(_, score)| *score >= threshold)
        .fold(None, |best: Option<(&str, f64)>, candidate| match best {
            Some(b) if candidate.1 <= b.1 => Some(b),
            _ => Some(candidate),
        })
}

/// Split a description into classified tokens. Punctuation, digits and
/// non-ASCII text separate words and are otherwise ignored.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(c) = input[pos..].chars().next() {
        if !c.is_ascii_alphabetic() {
            pos += c.len_utf8();
            continue;
        }
        let rest = &input[pos..];

        if let Some((phrase, kind)) = match_phrase(rest) {
            tokens.push(Token {
                kind,
                value: phrase.to_string(),
                start: pos,
                end: pos + phrase.len(),
                corrected_from: None,
                score: None,
            });
            pos += phrase.len();
            continue;
        }

        let len = rest
            .find(|c: char| !(c.is_ascii_alphabetic() || c == '-'))
            .unwrap_or(rest.len());
        tokens.push(classify(&rest[..len], pos));
        pos += len;
    }
    tokens
}

fn match_phrase(rest: &str) -> Option<(&'static str, TokenKind)> {
    PHRASES.iter().copied().find(|(phrase, _)| {
        let matches = rest
            .get(..phrase.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(phrase));
        matches
            && rest[phrase.len()..]
                .chars()
                .next()
                .map_or(true, |next| next.is_whitespace() || ",;.)".contains(next))
    })
}

fn classify(word: &str, start: usize) -> Token {
    let lower = word.to_ascii_lowercase();
    let mut token = Token {
        kind: TokenKind::Unknown,
        value: lower.clone(),
        start,
        end: start + word.len(),
        corrected_from: None,
        score: None,
    };

    if let Some(&kind) = VOCABULARY.get(lower.as_str()) {
        token.kind = kind;
        return token;
    }

    let correction = TYPOS
        .get(lower.as_str())
        .map(|&fixed| (fixed, 1.0))
        .or_else(|| {
            let candidates = WORDS.iter().filter(|(_, kind)| kind.accepts_fuzzy()).map(|(w, _)| *w);
            fuzzy_match(&lower, candidates, DEFAULT_FUZZY_THRESHOLD)
        });
    if let Some((fixed, score)) = correction {
        if let Some(&kind) = VOCABULARY.get(fixed) {
            token.kind = kind;
            token.value = fixed.to_string();
            token.corrected_from = Some(word.to_string());
            token.score = Some(score);
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(TokenKind, String)> {
        tokenize(input).into_iter().map(|t| (t.kind, t.value)).collect()
    }

    #[test]
    fn test_distance_and_similarity() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("CLAY", "clay"), 0);
        assert_eq!(levenshtein_distance("", "sand"), 4);
        assert_eq!(similarity("", ""), 1.0);
        assert!((similarity("gravell", "gravel") - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_fuzzy_match_prefers_first_on_tie() {
        let best = fuzzy_match("sant", ["sand", "salt"], 0.7).unwrap();
        assert_eq!(best.0, "sand");
        assert!(fuzzy_match("xyz", ["sand"], 0.8).is_none());
    }

    #[test]
    fn test_phrases_before_words() {
        assert_eq!(
            kinds("Stiff to very stiff, dark grey CLAY"),
            vec![
                (TokenKind::Consistency, "stiff to very stiff".to_string()),
                (TokenKind::Colour, "dark grey".to_string()),
                (TokenKind::SoilType, "clay".to_string()),
            ]
        );
        // "very" alone qualifies a constituent
        assert_eq!(kinds("very sandy")[0].0, TokenKind::Proportion);
    }

    #[test]
    fn test_phrase_needs_word_boundary() {
        // "fine to mediums" is not the phrase "fine to medium"
        let tokens = kinds("fine to mediums");
        assert_eq!(tokens[0], (TokenKind::ParticleSize, "fine".to_string()));
    }

    #[test]
    fn test_spelling_corrections() {
        let tokens = tokenize("Firn brown basallt");
        assert_eq!(tokens[0].value, "firm");
        assert_eq!(tokens[0].corrected_from.as_deref(), Some("Firn"));
        assert_eq!(tokens[0].score, Some(1.0));
        assert_eq!(tokens[2].kind, TokenKind::RockType);
        assert_eq!(tokens[2].value, "basalt");
        assert!((tokens[2].score.unwrap() - 6.0 / 7.0).abs() < 1e-12);
        // closest wins over the first match above the threshold
        assert_eq!(tokenize("gravell")[0].value, "gravelly");
    }

    #[test]
    fn test_offsets_and_non_ascii() {
        let input = "Soft – grey CLAY with rootlets (é)";
        let tokens = tokenize(input);
        let clay = tokens.iter().find(|t| t.kind == TokenKind::SoilType).unwrap();
        assert_eq!(&input[clay.start..clay.end], "CLAY");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Unknown);
    }
}
