//! Constrained random placeholder text.
//!
//! Words are drawn uniformly (with replacement) from a fixed pseudo-Latin
//! dictionary and assembled into sentences and paragraphs whose lengths are
//! drawn uniformly from the inclusive bounds of a [`GenerationRequest`].
//!
//! The random source is always passed in. Production callers hand over an
//! entropy-seeded generator; tests pass a seeded `StdRng` so distributional
//! properties can be asserted deterministically.
//!
//! # Example
//!
//! ```rust
//! use devtoolbox_core::lorem::{generate, GenerationRequest, Unit};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let req = GenerationRequest {
//!     unit: Unit::Sentences,
//!     count: 2,
//!     ..Default::default()
//! };
//! let mut rng = StdRng::seed_from_u64(7);
//! let text = generate(&req, &mut rng).unwrap();
//! assert!(text.starts_with("Lorem ipsum dolor sit amet"));
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::LoremError;

/// Opening sentence used when [`GenerationRequest::start_with_canonical_opening`] is set.
pub const CANONICAL_OPENING: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.";

/// Opening words used by the [`Unit::Words`] mode.
const CANONICAL_WORDS: [&str; 2] = ["Lorem", "ipsum"];

pub const MAX_COUNT: usize = 100;
pub const MAX_WORDS_PER_SENTENCE: usize = 50;
pub const MAX_SENTENCES_PER_PARAGRAPH: usize = 30;

/// Sampling dictionary.
pub const DICTIONARY: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in",
    "reprehenderit", "voluptate", "velit", "esse", "cillum", "eu", "fugiat", "nulla",
    "pariatur", "excepteur", "sint", "occaecat", "cupidatat", "non", "proident", "sunt",
    "culpa", "qui", "officia", "deserunt", "mollit", "anim", "id", "est", "laborum", "at",
    "vero", "eos", "accusamus", "iusto", "odio", "dignissimos", "ducimus", "blanditiis",
    "praesentium", "voluptatum", "deleniti", "atque", "corrupti", "quos", "dolores", "quas",
    "molestias", "excepturi", "occaecati", "cupiditate", "provident", "similique", "mollitia",
    "animi", "perspiciatis", "unde", "omnis", "iste", "natus", "error", "voluptatem",
    "accusantium", "doloremque", "laudantium", "totam", "rem", "aperiam", "eaque", "ipsa",
    "quae", "ab", "illo", "inventore", "veritatis", "quasi", "architecto", "beatae", "vitae",
    "dicta", "explicabo", "nemo", "ipsam", "quia", "voluptas",
];

/// What `count` counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Paragraphs,
    Sentences,
    Words,
}

impl std::str::FromStr for Unit {
    type Err = LoremError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paragraphs" | "paragraph" | "p" => Ok(Unit::Paragraphs),
            "sentences" | "sentence" | "s" => Ok(Unit::Sentences),
            "words" | "word" | "w" => Ok(Unit::Words),
            other => Err(LoremError::InvalidRequest {
                field: "unit",
                reason: format!("must be paragraphs, sentences, or words (got '{}')", other),
            }),
        }
    }
}

/// Parameters for one call to [`generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub unit: Unit,
    pub count: usize,
    pub min_words_per_sentence: usize,
    pub max_words_per_sentence: usize,
    pub min_sentences_per_paragraph: usize,
    pub max_sentences_per_paragraph: usize,
    pub start_with_canonical_opening: bool,
    pub wrap_in_markup_tags: bool,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            unit: Unit::Paragraphs,
            count: 3,
            min_words_per_sentence: 4,
            max_words_per_sentence: 12,
            min_sentences_per_paragraph: 3,
            max_sentences_per_paragraph: 7,
            start_with_canonical_opening: true,
            wrap_in_markup_tags: false,
        }
    }
}

impl GenerationRequest {
    /// Reject zero counts, inverted bounds, and values past the slider limits.
    pub fn validate(&self) -> Result<(), LoremError> {
        check_range("count", self.count, self.count, MAX_COUNT)?;
        check_range(
            "words per sentence",
            self.min_words_per_sentence,
            self.max_words_per_sentence,
            MAX_WORDS_PER_SENTENCE,
        )?;
        check_range(
            "sentences per paragraph",
            self.min_sentences_per_paragraph,
            self.max_sentences_per_paragraph,
            MAX_SENTENCES_PER_PARAGRAPH,
        )?;
        Ok(())
    }
}

fn check_range(field: &'static str, min: usize, max: usize, limit: usize) -> Result<(), LoremError> {
    let reason = if min == 0 {
        "must be at least 1".to_string()
    } else if min > max {
        format!("minimum {} exceeds maximum {}", min, max)
    } else if max > limit {
        format!("must be at most {} (got {})", limit, max)
    } else {
        return Ok(());
    };
    Err(LoremError::InvalidRequest { field, reason })
}

/// Generate placeholder text for `req`, drawing randomness from `rng`.
pub fn generate<R: Rng + ?Sized>(req: &GenerationRequest, rng: &mut R) -> Result<String, LoremError> {
    req.validate()?;

    let canonical = req.start_with_canonical_opening;
    let text = match req.unit {
        Unit::Words => {
            // A single word is always sampled; the opening needs room for both.
            let opening = canonical && req.count >= CANONICAL_WORDS.len();
            let words: Vec<&str> = (0..req.count)
                .map(|i| match CANONICAL_WORDS.get(i) {
                    Some(word) if opening => *word,
                    _ => sample_word(rng),
                })
                .collect();
            let joined = words.join(" ");
            if req.wrap_in_markup_tags {
                wrap(&joined)
            } else {
                joined
            }
        }
        Unit::Sentences => {
            let sentences: Vec<String> = (0..req.count)
                .map(|i| {
                    if i == 0 && canonical {
                        CANONICAL_OPENING.to_string()
                    } else {
                        sentence(req, rng)
                    }
                })
                .collect();
            join_pieces(sentences, " ", req.wrap_in_markup_tags)
        }
        Unit::Paragraphs => {
            let paragraphs: Vec<String> = (0..req.count)
                .map(|i| paragraph(req, rng, i == 0 && canonical))
                .collect();
            join_pieces(paragraphs, "\n\n", req.wrap_in_markup_tags)
        }
    };

    Ok(text)
}

fn sample_word<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    // DICTIONARY is non-empty, so choose never returns None.
    DICTIONARY.choose(rng).copied().unwrap_or("lorem")
}

fn sentence<R: Rng + ?Sized>(req: &GenerationRequest, rng: &mut R) -> String {
    let len = rng.gen_range(req.min_words_per_sentence..=req.max_words_per_sentence);
    let words: Vec<&str> = (0..len).map(|_| sample_word(rng)).collect();
    let mut sentence = capitalize(&words.join(" "));
    sentence.push('.');
    sentence
}

fn paragraph<R: Rng + ?Sized>(req: &GenerationRequest, rng: &mut R, opening: bool) -> String {
    let len = rng.gen_range(req.min_sentences_per_paragraph..=req.max_sentences_per_paragraph);
    (0..len)
        .map(|i| {
            if i == 0 && opening {
                CANONICAL_OPENING.to_string()
            } else {
                sentence(req, rng)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn wrap(piece: &str) -> String {
    format!("<p>{}</p>", piece)
}

fn join_pieces(pieces: Vec<String>, separator: &str, markup: bool) -> String {
    if markup {
        pieces.iter().map(|p| wrap(p)).collect::<Vec<_>>().join("\n")
    } else {
        pieces.join(separator)
    }
}

/// Counts shown under the generator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
    pub sentences: usize,
    pub paragraphs: usize,
}

/// Count characters, words, sentences, and paragraphs of generated text.
///
/// Markup tags are ignored; each `<p>` element or blank-line separated block
/// counts as one paragraph.
pub fn text_stats(text: &str) -> TextStats {
    let plain = text.replace("<p>", "").replace("</p>", "\n\n");
    let paragraphs = plain.split("\n\n").filter(|p| !p.trim().is_empty()).count();
    let words = plain.split_whitespace().count();
    let sentences = plain
        .split_whitespace()
        .filter(|w| w.ends_with('.'))
        .count();

    TextStats {
        characters: plain.trim().chars().count(),
        words,
        sentences,
        paragraphs,
    }
}
