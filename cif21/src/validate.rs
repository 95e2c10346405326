//!
//! # CIF Syntax Validation
//!
//! Drives the [CifGrammar] byte-by-byte over an input stream,
//! and classifies the result as accepted, incomplete, or invalid.
//!

// Std-Lib
use std::io::{BufReader, Read};

// Crates.io Imports
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

// Local Imports
use crate::data::{display_byte, CifError, CifResult};
use crate::fsm::{StateId, INITIAL_STATE};
use crate::grammar::CifGrammar;

/// # Validation Outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    /// Input ended in an accepting state
    Accepted { state: StateId },
    /// Input ended without error, in the non-accepting `state`.
    /// Most commonly caused by a missing End command.
    Incomplete { state: StateId },
    /// Input `byte`, at byte-offset `offset`, has no transition out of `state`
    Invalid {
        state: StateId,
        byte: u8,
        offset: usize,
    },
}
impl ValidationOutcome {
    /// Boolean indication of acceptance
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
    /// The last valid state reached
    pub fn state(&self) -> StateId {
        match *self {
            Self::Accepted { state } | Self::Incomplete { state } | Self::Invalid { state, .. } => {
                state
            }
        }
    }
    /// Convert into a [CifResult], returning the final state on acceptance
    pub fn into_result(self) -> CifResult<StateId> {
        match self {
            Self::Accepted { state } => Ok(state),
            Self::Incomplete { state } => Err(CifError::Incomplete { state }),
            Self::Invalid {
                state,
                byte,
                offset,
            } => Err(CifError::Invalid {
                state,
                byte,
                offset,
            }),
        }
    }
    /// Human-readable diagnostic lines. Empty for accepted input.
    pub fn messages(&self) -> Vec<String> {
        match *self {
            Self::Accepted { .. } => Vec::new(),
            Self::Incomplete { state } => vec![
                "validate: error: the file contents are incomplete (maybe a missing End command)"
                    .into(),
                format!("    State: {}", state),
            ],
            Self::Invalid {
                state,
                byte,
                offset,
            } => vec![
                "validate: error: invalid content detected when validating input".into(),
                format!("    State: {}", state),
                format!("    Input char: {} (ASCII={})", display_byte(byte), byte),
                format!("    Offset: {}", offset),
            ],
        }
    }
}

/// # Validation Cursor
///
/// Step-wise position within a [CifGrammar], advanced one byte at a time.
/// Rejected bytes leave the cursor in its last valid state.
#[derive(Debug, Clone)]
pub struct CifCursor<'g> {
    grammar: &'g CifGrammar,
    state: StateId,
    offset: usize,
}
impl<'g> CifCursor<'g> {
    /// Create a new cursor, in the initial state
    pub fn new(grammar: &'g CifGrammar) -> Self {
        Self {
            grammar,
            state: INITIAL_STATE,
            offset: 0,
        }
    }
    /// Current state
    pub fn state(&self) -> StateId {
        self.state
    }
    /// Number of bytes accepted so far
    pub fn offset(&self) -> usize {
        self.offset
    }
    /// Feed a byte. Returns the new state, or [None] if `byte` is invalid here.
    pub fn feed(&mut self, byte: u8) -> Option<StateId> {
        let next = self.grammar.next(self.state, byte)?;
        self.state = next;
        self.offset += 1;
        Some(next)
    }
    /// Outcome of rejecting `byte` in the current state
    fn reject(&self, byte: u8) -> ValidationOutcome {
        ValidationOutcome::Invalid {
            state: self.state,
            byte,
            offset: self.offset,
        }
    }
    /// Outcome of reaching the end of input in the current state
    pub fn finish(&self) -> ValidationOutcome {
        if self.grammar.is_accepting(self.state) {
            ValidationOutcome::Accepted { state: self.state }
        } else {
            ValidationOutcome::Incomplete { state: self.state }
        }
    }
}

/// # Syntax Validator
///
/// Single-pass, no-lookahead checker of CIF content.
/// Never modifies its grammar; any number of validators can share one.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'g> {
    grammar: &'g CifGrammar,
}
impl Validator<'static> {
    /// Create a [Validator] using the process-wide shared grammar
    pub fn shared() -> Self {
        Self::new(CifGrammar::shared())
    }
}
impl<'g> Validator<'g> {
    /// Create a [Validator] of `grammar`
    pub fn new(grammar: &'g CifGrammar) -> Self {
        Self { grammar }
    }
    /// Validate a stream of bytes.
    /// Stops pulling from `bytes` at the first invalid byte.
    pub fn validate(&self, bytes: impl IntoIterator<Item = u8>) -> ValidationOutcome {
        let mut cursor = CifCursor::new(self.grammar);
        for byte in bytes {
            if cursor.feed(byte).is_none() {
                let outcome = cursor.reject(byte);
                debug!(?outcome, "rejected CIF content");
                return outcome;
            }
        }
        let outcome = cursor.finish();
        trace!(?outcome, bytes = cursor.offset(), "validated CIF content");
        outcome
    }
    /// Validate the content of a [Read]er.
    /// Read failures are returned as [CifError::Resource], as no verdict can be reached.
    pub fn validate_reader(&self, read: impl Read) -> CifResult<ValidationOutcome> {
        let mut cursor = CifCursor::new(self.grammar);
        for byte in BufReader::new(read).bytes() {
            let byte = byte?;
            if cursor.feed(byte).is_none() {
                let outcome = cursor.reject(byte);
                debug!(?outcome, "rejected CIF content");
                return Ok(outcome);
            }
        }
        Ok(cursor.finish())
    }
}

/// Validate `bytes` with the shared grammar
pub fn validate(bytes: impl IntoIterator<Item = u8>) -> ValidationOutcome {
    Validator::shared().validate(bytes)
}
/// Validate string `src` with the shared grammar
pub fn validate_str(src: &str) -> ValidationOutcome {
    validate(src.bytes())
}
