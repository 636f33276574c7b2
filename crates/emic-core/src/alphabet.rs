//! Symbols, alphabets, observed sequences and histories.
//!
//! A [`History`] is stored oldest symbol first, so the most recent symbol is
//! the last element. Extending a history "into the past" prepends a symbol.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

/// A symbol is an index into a finite alphabet.
pub type Symbol = u8;

/// Largest supported alphabet (every `u8` value is a symbol).
pub const MAX_ALPHABET_SIZE: usize = 256;

/// Errors raised when validating alphabets and sequences.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("alphabet size must be in 1..={max}, got {size}")]
    InvalidAlphabet { size: usize, max: usize },

    #[error("symbol {symbol} at position {position} is outside an alphabet of {alphabet_size}")]
    SymbolOutOfRange {
        symbol: Symbol,
        position: usize,
        alphabet_size: usize,
    },

    #[error("sequence alphabet of size {sequence} does not fit a tree over {tree} symbols")]
    AlphabetMismatch { sequence: usize, tree: usize },
}

/// A finite alphabet `{0, .., size-1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Alphabet {
    size: usize,
}

impl Alphabet {
    /// The binary alphabet `{0, 1}`.
    pub const BINARY: Alphabet = Alphabet { size: 2 };

    pub fn new(size: usize) -> Result<Self, SequenceError> {
        if size == 0 || size > MAX_ALPHABET_SIZE {
            return Err(SequenceError::InvalidAlphabet {
                size,
                max: MAX_ALPHABET_SIZE,
            });
        }
        Ok(Alphabet { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        (symbol as usize) < self.size
    }

    /// Symbols in ascending order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> {
        // size <= 256, so every index fits a u8
        (0..self.size).map(|s| s as Symbol)
    }
}

impl TryFrom<usize> for Alphabet {
    type Error = SequenceError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Alphabet::new(size)
    }
}

impl From<Alphabet> for usize {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.size
    }
}

/// A validated observation sequence over a known alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    alphabet: Alphabet,
    symbols: Vec<Symbol>,
}

impl Sequence {
    /// Validate `symbols` against `alphabet`.
    pub fn new(symbols: Vec<Symbol>, alphabet: Alphabet) -> Result<Self, SequenceError> {
        if let Some(position) = symbols.iter().position(|&s| !alphabet.contains(s)) {
            return Err(SequenceError::SymbolOutOfRange {
                symbol: symbols[position],
                position,
                alphabet_size: alphabet.size(),
            });
        }
        Ok(Sequence { alphabet, symbols })
    }

    /// Convenience constructor taking a raw alphabet size.
    pub fn from_symbols(symbols: Vec<Symbol>, alphabet_size: usize) -> Result<Self, SequenceError> {
        Sequence::new(symbols, Alphabet::new(alphabet_size)?)
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Occurrence count of each symbol, indexed by symbol.
    pub fn symbol_counts(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.alphabet.size()];
        for &s in &self.symbols {
            counts[s as usize] += 1;
        }
        counts
    }

    /// Number of distinct symbols that actually occur.
    pub fn distinct_symbols(&self) -> usize {
        self.symbol_counts().iter().filter(|&&c| c > 0).count()
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }
}

/// A finite window of past symbols, oldest first.
///
/// Borrows as `[Symbol]` so maps keyed by `History` can be queried with a
/// slice of a sequence without allocating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Box<[Symbol]>);

impl History {
    /// The null history λ.
    pub fn empty() -> Self {
        History(Box::new([]))
    }

    pub fn from_slice(symbols: &[Symbol]) -> Self {
        History(symbols.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }

    /// The most recent symbol, if any.
    pub fn most_recent(&self) -> Option<Symbol> {
        self.0.last().copied()
    }

    /// The history one step further into the past: `older` followed by `self`.
    pub fn extend_past(&self, older: Symbol) -> History {
        let mut symbols = Vec::with_capacity(self.len() + 1);
        symbols.push(older);
        symbols.extend_from_slice(&self.0);
        History(symbols.into_boxed_slice())
    }

    /// The history after observing `next`: `self` followed by `next`.
    pub fn then(&self, next: Symbol) -> History {
        let mut symbols = Vec::with_capacity(self.len() + 1);
        symbols.extend_from_slice(&self.0);
        symbols.push(next);
        History(symbols.into_boxed_slice())
    }

    /// The `len` most recent symbols.
    pub fn suffix(&self, len: usize) -> &[Symbol] {
        &self.0[self.len().saturating_sub(len)..]
    }

    /// True when `self` ends with `other`.
    pub fn ends_with(&self, other: &[Symbol]) -> bool {
        self.0.ends_with(other)
    }
}

impl Borrow<[Symbol]> for History {
    fn borrow(&self) -> &[Symbol] {
        &self.0
    }
}

impl From<&[Symbol]> for History {
    fn from(symbols: &[Symbol]) -> Self {
        History::from_slice(symbols)
    }
}

impl From<Vec<Symbol>> for History {
    fn from(symbols: Vec<Symbol>) -> Self {
        History(symbols.into_boxed_slice())
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "λ");
        }
        if self.0.iter().all(|&s| s < 10) {
            for s in self.0.iter() {
                write!(f, "{}", s)?;
            }
            Ok(())
        } else {
            let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
            write!(f, "{}", parts.join(","))
        }
    }
}
