// src/seo/readability.rs
//! Flesch reading ease for English, LIX for Swedish

use serde::Serialize;

use crate::resume::Language;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Readability {
    pub language: Language,
    pub sentences: usize,
    pub words: usize,
    pub syllables: usize,
    pub long_words: usize,
    pub flesch_reading_ease: f64,
    pub lix: f64,
    /// 0 (hard) to 100 (easy), by the metric that fits the page language
    pub score: u8,
}

/// Page language from the `html lang` attribute, English unless Swedish
pub fn page_language(lang_attr: Option<&str>) -> Language {
    match lang_attr.map(|l| l.trim().to_lowercase()) {
        Some(l) if l.starts_with("sv") => Language::Sv,
        _ => Language::En,
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y' | 'å' | 'ä' | 'ö' | 'é')
}

/// Vowel groups, a trailing silent `e` does not count
pub fn count_syllables(word: &str) -> usize {
    let word: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    if word.is_empty() {
        return 0;
    }

    let mut groups = 0;
    let mut previous_vowel = false;
    for &c in &word {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            groups += 1;
        }
        previous_vowel = vowel;
    }

    let len = word.len();
    if groups > 1 && word[len - 1] == 'e' && !is_vowel(word[len - 2]) && word[len - 2] != 'l' {
        groups -= 1;
    }
    groups.max(1)
}

fn words_of(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().any(char::is_alphabetic))
        .collect()
}

fn count_sentences(text: &str) -> usize {
    text.split(|c| matches!(c, '.' | '!' | '?'))
        .filter(|segment| segment.chars().any(char::is_alphabetic))
        .count()
}

pub fn readability(text: &str, language: Language) -> Readability {
    let words = words_of(text);
    let word_count = words.len();
    let sentences = count_sentences(text).max(if word_count > 0 { 1 } else { 0 });

    if word_count == 0 {
        return Readability {
            language,
            sentences: 0,
            words: 0,
            syllables: 0,
            long_words: 0,
            flesch_reading_ease: 0.0,
            lix: 0.0,
            score: 0,
        };
    }

    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let long_words = words.iter().filter(|w| w.chars().count() > 6).count();

    let words_per_sentence = word_count as f64 / sentences as f64;
    let flesch = 206.835
        - 1.015 * words_per_sentence
        - 84.6 * (syllables as f64 / word_count as f64);
    let lix = words_per_sentence + 100.0 * long_words as f64 / word_count as f64;

    let score = match language {
        Language::En => flesch,
        // LIX 20 reads like a children's book, 60 like a legal text
        Language::Sv => (60.0 - lix) * 2.5,
    };

    Readability {
        language,
        sentences,
        words: word_count,
        syllables,
        long_words,
        flesch_reading_ease: round1(flesch),
        lix: round1(lix),
        score: score.clamp(0.0, 100.0).round() as u8,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
