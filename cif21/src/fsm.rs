//!
//! # Finite State Machine Engine
//!
//! A byte-driven, table-based state machine.
//! Each state owns a 256-entry [TransitionTable], mapping every input byte
//! either to a next state or to nothing, i.e. the error marker.
//!
//! Engines are assembled with an [EngineBuilder], which installs transitions
//! one byte, one literal byte-set, or one [CharClass] at a time.
//! Once built an [Engine] is immutable, and can be shared freely between threads.
//!

// Std-Lib
use std::num::NonZeroU16;

// Crates.io Imports
use serde::{Deserialize, Serialize};

// Local Imports
use crate::utils::{enumstr, EnumStr};

/// State identifier. Valid states run from 1 through the engine's state-count.
pub type StateId = usize;

/// The unique initial state of every [Engine]
pub const INITIAL_STATE: StateId = 1;

/// Error marker, as reported in diagnostics.
/// Never a table index: the [Engine] API reports it as [None].
pub const ERROR_STATE: i64 = -1;

enumstr!(
    /// # Character Classes
    ///
    /// Named groups of input bytes, used to install many transitions at once.
    /// `SeparatorChar` and `LayerNameChar` are unions of other classes, see [CharClass::components].
    CharClass {
        Digit: "Digit",
        UpperChar: "UpperChar",
        BlankChar: "BlankChar",
        UserChar: "UserChar",
        CommentChar: "CommentChar",
        SeparatorChar: "SeparatorChar",
        LayerNameChar: "LayerNameChar",
    }
);
impl CharClass {
    /// Component classes of union classes.
    /// Empty for the primitive classes, which are defined directly over bytes.
    pub fn components(&self) -> &'static [CharClass] {
        match self {
            Self::SeparatorChar => &[Self::UpperChar, Self::BlankChar],
            Self::LayerNameChar => &[Self::Digit, Self::UpperChar],
            _ => &[],
        }
    }
    /// Boolean indication of whether `byte` is a member of this class
    pub fn contains(&self, byte: u8) -> bool {
        match self {
            Self::Digit => byte.is_ascii_digit(),
            Self::UpperChar => byte.is_ascii_uppercase(),
            Self::BlankChar => {
                !(byte.is_ascii_digit()
                    || byte.is_ascii_uppercase()
                    || byte == b'-'
                    || byte == b'('
                    || byte == b')'
                    || byte == b';')
            }
            Self::UserChar => byte != b';',
            // Admits every byte, including both parentheses.
            // Exits from comment states are installed afterwards, overwriting these entries.
            Self::CommentChar => true,
            Self::SeparatorChar | Self::LayerNameChar => {
                self.components().iter().any(|c| c.contains(byte))
            }
        }
    }
    /// Iterate over all member bytes, in increasing order
    pub fn members(self) -> impl Iterator<Item = u8> {
        (0..=u8::MAX).filter(move |b| self.contains(*b))
    }
}

/// # Transition Input
///
/// The set of bytes a single [EngineBuilder::set] call applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// A single byte
    Byte(u8),
    /// A literal set of bytes
    Literal(&'static [u8]),
    /// A character class
    Class(CharClass),
}
impl From<u8> for Input {
    fn from(b: u8) -> Self {
        Self::Byte(b)
    }
}
impl From<&'static str> for Input {
    fn from(s: &'static str) -> Self {
        Self::Literal(s.as_bytes())
    }
}
impl From<CharClass> for Input {
    fn from(c: CharClass) -> Self {
        Self::Class(c)
    }
}

/// # Engine Configuration Errors
///
/// Defects in the construction of an [Engine], reported when building rather than
/// silently degrading the machine's coverage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("engine with {num_states} states exceeds the supported maximum of {max}")]
    TooManyStates { num_states: usize, max: usize },
    #[error("state {state} is outside the engine's states 1..={num_states}")]
    StateOutOfRange { state: StateId, num_states: usize },
    #[error("empty input set for transitions out of state {state}")]
    EmptyInput { state: StateId },
}

/// # Transition Table
///
/// One state's complete byte -> next-state map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    next: [Option<NonZeroU16>; 256],
}
impl Default for TransitionTable {
    fn default() -> Self {
        Self { next: [None; 256] }
    }
}
impl TransitionTable {
    /// Get the next state for input `byte`, or [None] if no transition is defined
    #[inline(always)]
    pub fn get(&self, byte: u8) -> Option<StateId> {
        self.next[byte as usize].map(|s| s.get() as StateId)
    }
    /// Boolean indication of whether no transitions are defined
    pub fn is_empty(&self) -> bool {
        self.next.iter().all(Option::is_none)
    }
    /// Iterate over all defined `(byte, next-state)` pairs
    pub fn defined(&self) -> impl Iterator<Item = (u8, StateId)> + '_ {
        (0..=u8::MAX).filter_map(move |b| self.get(b).map(|s| (b, s)))
    }
    /// Install a transition. Later installs overwrite earlier ones.
    fn set_byte(&mut self, byte: u8, next: NonZeroU16) {
        self.next[byte as usize] = Some(next);
    }
}

/// # State Machine Engine
///
/// Ordered collection of [TransitionTable]s, indexed by state `1..=num_states`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    tables: Vec<TransitionTable>,
}
impl Engine {
    /// Create an [EngineBuilder] for an engine of `num_states` states
    pub fn builder(num_states: usize) -> Result<EngineBuilder, ConfigError> {
        EngineBuilder::new(num_states)
    }
    /// Number of states
    pub fn num_states(&self) -> usize {
        self.tables.len()
    }
    /// Get the [TransitionTable] of `state`, if it exists
    pub fn table(&self, state: StateId) -> Option<&TransitionTable> {
        self.tables.get(state.checked_sub(1)?)
    }
    /// Feed `byte` while in `state`.
    /// Returns the next state, or [None] for an undefined transition (or a non-existent `state`).
    #[inline(always)]
    pub fn next(&self, state: StateId, byte: u8) -> Option<StateId> {
        self.table(state)?.get(byte)
    }
}

/// # Engine Builder
///
/// The only mutable form of an [Engine]'s transitions.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    tables: Vec<TransitionTable>,
}
impl EngineBuilder {
    /// Create a builder for `num_states` states, each initially without transitions
    pub fn new(num_states: usize) -> Result<Self, ConfigError> {
        let max = u16::MAX as usize;
        if num_states > max {
            return Err(ConfigError::TooManyStates { num_states, max });
        }
        Ok(Self {
            tables: vec![TransitionTable::default(); num_states],
        })
    }
    /// Install transitions from `state` to `next` for every byte in `input`.
    /// Union classes are expanded into their components.
    pub fn set(
        &mut self,
        state: StateId,
        input: impl Into<Input>,
        next: StateId,
    ) -> Result<&mut Self, ConfigError> {
        self.check(state)?;
        self.check(next)?;
        // Checked in range above, and the state-count fits in a `u16`
        let target = NonZeroU16::new(next as u16).ok_or(ConfigError::StateOutOfRange {
            state: next,
            num_states: self.tables.len(),
        })?;
        let input = input.into();
        if let Input::Class(class) = input {
            let components = class.components();
            if !components.is_empty() {
                for component in components {
                    self.set(state, *component, next)?;
                }
                return Ok(self);
            }
        }
        let table = &mut self.tables[state - 1];
        match input {
            Input::Byte(b) => table.set_byte(b, target),
            Input::Literal(bytes) => {
                if bytes.is_empty() {
                    return Err(ConfigError::EmptyInput { state });
                }
                for b in bytes {
                    table.set_byte(*b, target);
                }
            }
            Input::Class(class) => {
                for b in class.members() {
                    table.set_byte(b, target);
                }
            }
        }
        Ok(self)
    }
    /// Finalize into an immutable [Engine]
    pub fn build(self) -> Engine {
        Engine {
            tables: self.tables,
        }
    }
    /// Check that `state` exists
    fn check(&self, state: StateId) -> Result<(), ConfigError> {
        if state < INITIAL_STATE || state > self.tables.len() {
            return Err(ConfigError::StateOutOfRange {
                state,
                num_states: self.tables.len(),
            });
        }
        Ok(())
    }
}
