//! The fixed extended alphabet and its membership checks.
//!
//! Index 0 is reserved for the NUL sentinel. The remaining symbols are
//! printable ASCII, a set of common Hangul jamo and syllables, and a handful of
//! Latin, Greek, Hebrew and typographic characters, deduplicated in first-seen
//! order.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::error::{Result, SjzError};

/// Reserved symbol at index 0.
pub const SENTINEL: char = '\0';

/// Fixed second entry of every front order whose front is not itself the anchor.
pub const ANCHOR: char = 'A';

const HANGUL: &str = concat!(
    "ㄱㄴㄷㄹㅁㅂㅅㅇㅈㅊㅋㅌㅍㅎ",
    "ㅏㅐㅑㅒㅓㅔㅕㅖㅗㅛㅜㅠㅡㅣ",
    "가나다라마바사아자차카타파하",
    "고노도로모보소오조초코토포호",
    "구누두루무부수우주추쿠투푸후",
    "그는드르므브스으즈츠크트프흐",
    "기니디리미비시이지치키티피히",
    "안녕하세요습니다입것은를의에",
    "와과할수있었였을를이가에서도",
    "지만까를위해되된한합같음임함",
);

const EXTRA: &[char] = &[
    '\r', '\n', '\t', '£', 'â', 'æ', 'è', 'é', 'Œ', 'œ', 'η', 'ο', 'σ', 'τ', 'ς', 'ϰ', 'ו', 'ח',
    '—', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '•', '™',
];

static ALPHABET: OnceLock<Alphabet> = OnceLock::new();

/// Ordered, immutable symbol table.
#[derive(Debug)]
pub struct Alphabet {
    symbols: Vec<char>,
    index: FxHashMap<char, u16>,
}

/// The process-wide alphabet.
pub fn alphabet() -> &'static Alphabet {
    Alphabet::get()
}

impl Alphabet {
    pub fn get() -> &'static Alphabet {
        ALPHABET.get_or_init(Self::build)
    }

    fn build() -> Self {
        let candidates = std::iter::once(SENTINEL)
            .chain((32u8..127).map(char::from))
            .chain(HANGUL.chars())
            .chain(EXTRA.iter().copied());

        let mut symbols = Vec::new();
        let mut index = FxHashMap::default();
        for ch in candidates {
            if index.contains_key(&ch) {
                continue;
            }
            index.insert(ch, symbols.len() as u16);
            symbols.push(ch);
        }

        log::debug!("sjzip alphabet built with {} symbols", symbols.len());
        Self { symbols, index }
    }

    /// Alphabet size N; also the radix of the mixed-radix payload.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in canonical order.
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn contains(&self, ch: char) -> bool {
        self.index.contains_key(&ch)
    }

    pub fn index_of(&self, ch: char) -> Option<u16> {
        self.index.get(&ch).copied()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.symbols.get(index).copied()
    }

    /// Index of `ch`, or [`SjzError::UnsupportedCharacter`].
    pub fn ensure_supported(&self, ch: char) -> Result<u16> {
        self.index_of(ch)
            .ok_or(SjzError::UnsupportedCharacter { ch })
    }

    /// Accept a string only if it is exactly one supported character.
    pub fn ensure_single(&self, s: &str) -> Result<char> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => {
                self.ensure_supported(ch)?;
                Ok(ch)
            }
            _ => Err(SjzError::NotSingleCharacter {
                len: s.chars().count(),
            }),
        }
    }

    /// Check every character of `text` and return its length in characters.
    ///
    /// The length ceiling is checked first, then the first unsupported character
    /// is reported together with its character position.
    pub fn validate_text(&self, text: &str, max_len: usize) -> Result<usize> {
        let len = text.chars().count();
        if len > max_len {
            return Err(SjzError::TextTooLong { len, max: max_len });
        }
        if let Some((position, ch)) = text.chars().enumerate().find(|(_, ch)| !self.contains(*ch)) {
            return Err(SjzError::UnsupportedCharacterAt { ch, position });
        }
        Ok(len)
    }
}
