//!
//! # CIF Grammar Definition
//!
//! Wires an [Engine] to the CIF command grammar, per the Caltech technical report 2686 (1980).
//! Each command family owns a disjoint range of states:
//!
//! | States  | Family                                                              |
//! |---------|---------------------------------------------------------------------|
//! | 1       | Between commands                                                    |
//! | 2-13    | Polygon `P`                                                         |
//! | 14-30   | Box `B`                                                             |
//! | 31-39   | Round flash `R`                                                     |
//! | 40-53   | Wire `W`                                                            |
//! | 54-56   | Layer `L`                                                           |
//! | 57-68   | Definitions `D`: start `DS` 58-64, delete `DD` 65-67, finish `DF` 68 |
//! | 70-86   | Call `C`: translation 73-78, mirror 79-80, rotation 81-86            |
//! | 88      | User extension, any leading digit                                   |
//! | 89-90   | Comment `( ... )`                                                   |
//! | 91-92   | End `E`, and trailing blanks                                        |
//!
//! States 69 and 87 have no transitions.
//! Files are well-formed iff they end in one of the [ACCEPTING_STATES].
//!

// Crates.io Imports
use once_cell::sync::Lazy;

// Local Imports
use crate::fsm::CharClass::{
    BlankChar, CommentChar, Digit, LayerNameChar, SeparatorChar, UserChar,
};
use crate::fsm::Input::{self, Byte, Class};
use crate::fsm::{ConfigError, Engine, StateId};

/// Number of states in the CIF grammar.
/// The highest state referenced by any transition.
pub const NUM_STATES: usize = 92;

/// States representing "a complete, well-formed file was just consumed"
pub const ACCEPTING_STATES: [StateId; 2] = [91, 92];

// Short-hands for the transition listing
const DIGIT: Input = Class(Digit);
const BLANK: Input = Class(BlankChar);
const SEP: Input = Class(SeparatorChar);
const USER: Input = Class(UserChar);
const COMMENT: Input = Class(CommentChar);
const LAYER_NAME: Input = Class(LayerNameChar);
const MINUS: Input = Byte(b'-');
const SEMI: Input = Byte(b';');

/// Complete listing of the grammar's transitions, as `(from, input, to)`.
/// Applied in order; later entries overwrite earlier ones for the same byte.
#[rustfmt::skip]
pub const TRANSITIONS: &[(StateId, Input, StateId)] = &[
    // Between commands
    (1, BLANK, 1),
    (1, Byte(b'P'), 2),
    (1, Byte(b'B'), 14),
    (1, Byte(b'R'), 31),
    (1, Byte(b'W'), 40),
    (1, Byte(b'L'), 54),
    (1, Byte(b'D'), 57),
    (1, Byte(b'C'), 70),
    (1, DIGIT, 88),
    (1, Byte(b'('), 89),
    (1, Byte(b'E'), 91),

    // Polygon: `P` path `;`
    (2, BLANK, 2),
    (2, MINUS, 3),
    (2, DIGIT, 4),
    (3, DIGIT, 4),
    (4, DIGIT, 4),
    (4, SEP, 5),
    (5, SEP, 5),
    (5, MINUS, 6),
    (5, DIGIT, 7),
    (6, DIGIT, 7),
    (7, DIGIT, 7),
    (7, SEP, 8),
    (7, SEMI, 1),
    (8, SEP, 8),
    (8, MINUS, 9),
    (8, DIGIT, 10),
    (8, SEMI, 1),
    (9, DIGIT, 10),
    (10, DIGIT, 10),
    (10, SEP, 11),
    (11, SEP, 11),
    (11, MINUS, 12),
    (11, DIGIT, 13),
    (12, DIGIT, 13),
    (13, DIGIT, 13),
    // Back to the x-coordinate state 8, not the y-digit state 7: coordinates stay paired.
    (13, SEP, 8),
    (13, SEMI, 1),

    // Box: `B` length width center [direction] `;`
    (14, BLANK, 14),
    (14, DIGIT, 15),
    (15, DIGIT, 15),
    (15, SEP, 16),
    (16, SEP, 16),
    (16, DIGIT, 17),
    (17, DIGIT, 17),
    (17, SEP, 18),
    (18, SEP, 18),
    (18, MINUS, 19),
    (18, DIGIT, 20),
    (19, DIGIT, 20),
    (20, DIGIT, 20),
    (20, SEP, 21),
    (21, SEP, 21),
    (21, MINUS, 22),
    (21, DIGIT, 23),
    (22, DIGIT, 23),
    (23, DIGIT, 23),
    (23, SEP, 24),
    (23, SEMI, 1),
    (24, SEP, 24),
    (24, MINUS, 25),
    (24, DIGIT, 26),
    (24, SEMI, 1),
    (25, DIGIT, 26),
    (26, DIGIT, 26),
    (26, SEP, 27),
    (27, SEP, 27),
    (27, MINUS, 28),
    (27, DIGIT, 29),
    (28, DIGIT, 29),
    (29, DIGIT, 29),
    (29, SEP, 30),
    (29, SEMI, 1),
    (30, SEP, 30),
    (30, SEMI, 1),

    // Round flash: `R` diameter center `;`
    (31, BLANK, 31),
    (31, DIGIT, 32),
    (32, DIGIT, 32),
    (32, SEP, 33),
    (33, SEP, 33),
    (33, MINUS, 34),
    (33, DIGIT, 35),
    (34, DIGIT, 35),
    (35, DIGIT, 35),
    (35, SEP, 36),
    (36, SEP, 36),
    (36, MINUS, 37),
    (36, DIGIT, 38),
    (37, DIGIT, 38),
    (38, DIGIT, 38),
    (38, SEP, 39),
    (38, SEMI, 1),
    (39, SEP, 39),
    (39, SEMI, 1),

    // Wire: `W` width path `;`
    (40, BLANK, 40),
    (40, DIGIT, 41),
    (41, DIGIT, 41),
    (41, SEP, 42),
    (42, SEP, 42),
    (42, MINUS, 43),
    (42, DIGIT, 44),
    (43, DIGIT, 44),
    (44, DIGIT, 44),
    (44, SEP, 45),
    (45, SEP, 45),
    (45, MINUS, 46),
    (45, DIGIT, 47),
    (46, DIGIT, 47),
    (47, DIGIT, 47),
    (47, SEP, 48),
    (47, SEMI, 1),
    (48, SEP, 48),
    (48, MINUS, 49),
    (48, DIGIT, 50),
    (48, SEMI, 1),
    (49, DIGIT, 50),
    (50, DIGIT, 50),
    (50, SEP, 51),
    (51, SEP, 51),
    (51, MINUS, 52),
    (51, DIGIT, 53),
    (52, DIGIT, 53),
    (53, DIGIT, 53),
    (53, SEP, 48),
    (53, SEMI, 1),

    // Layer: `L` shortname `;`
    (54, BLANK, 54),
    (54, LAYER_NAME, 55),
    (55, LAYER_NAME, 55),
    (55, BLANK, 56),
    (55, SEMI, 1),
    (56, BLANK, 56),
    (56, SEMI, 1),

    // Definitions: `D` then `S`, `F`, or `D`
    (57, BLANK, 57),
    (57, Byte(b'S'), 58),
    (57, Byte(b'D'), 65),
    (57, Byte(b'F'), 68),
    // Definition start: `DS` integer [a b] `;`
    (58, BLANK, 58),
    (58, DIGIT, 59),
    (59, DIGIT, 59),
    (59, SEP, 60),
    (59, SEMI, 1),
    (60, SEP, 60),
    (60, DIGIT, 61),
    (60, SEMI, 1),
    (61, DIGIT, 61),
    (61, SEP, 62),
    (62, SEP, 62),
    (62, DIGIT, 63),
    (63, DIGIT, 63),
    (63, SEP, 64),
    (63, SEMI, 1),
    (64, SEP, 64),
    (64, SEMI, 1),
    // Definition delete: `DD` integer `;`
    (65, BLANK, 65),
    (65, DIGIT, 66),
    (66, DIGIT, 66),
    (66, SEP, 67),
    (66, SEMI, 1),
    (67, SEP, 67),
    (67, SEMI, 1),
    // Definition finish: `DF` `;`
    (68, BLANK, 68),
    (68, SEMI, 1),

    // Call: `C` integer {transformation} `;`
    (70, BLANK, 70),
    (70, DIGIT, 71),
    (71, DIGIT, 71),
    (71, BLANK, 72),
    (71, Byte(b'T'), 73),
    (71, Byte(b'M'), 79),
    (71, Byte(b'R'), 81),
    (71, SEMI, 1),
    (72, BLANK, 72),
    (72, Byte(b'T'), 73),
    (72, Byte(b'M'), 79),
    (72, Byte(b'R'), 81),
    (72, SEMI, 1),
    // Translation: `T` point
    (73, BLANK, 73),
    (73, MINUS, 74),
    (73, DIGIT, 75),
    (74, DIGIT, 75),
    (75, DIGIT, 75),
    (75, SEP, 76),
    (76, SEP, 76),
    (76, MINUS, 77),
    (76, DIGIT, 78),
    (77, DIGIT, 78),
    (78, DIGIT, 78),
    (78, BLANK, 72),
    (78, Byte(b'T'), 73),
    (78, Byte(b'M'), 79),
    (78, Byte(b'R'), 81),
    (78, SEMI, 1),
    // Mirror: `M X` or `M Y`
    (79, BLANK, 79),
    (79, Byte(b'X'), 80),
    (79, Byte(b'Y'), 80),
    (80, BLANK, 72),
    (80, Byte(b'T'), 73),
    (80, Byte(b'M'), 79),
    (80, Byte(b'R'), 81),
    (80, SEMI, 1),
    // Rotation: `R` point
    (81, BLANK, 81),
    (81, MINUS, 82),
    (81, DIGIT, 83),
    (82, DIGIT, 83),
    (83, DIGIT, 83),
    (83, SEP, 84),
    (84, SEP, 84),
    (84, MINUS, 85),
    (84, DIGIT, 86),
    (85, DIGIT, 86),
    (86, DIGIT, 86),
    (86, BLANK, 72),
    (86, Byte(b'T'), 73),
    (86, Byte(b'M'), 79),
    (86, Byte(b'R'), 81),
    (86, SEMI, 1),

    // User extension: digit userText `;`
    (88, USER, 88),
    (88, SEMI, 1),

    // Comment: `(` commentText `)` `;`
    (89, COMMENT, 89),
    (89, Byte(b')'), 90),
    (90, BLANK, 90),
    (90, SEMI, 1),

    // End: `E` {blank}
    (91, BLANK, 92),
    (92, BLANK, 92),
];

/// Process-wide grammar instance, built on first use
static SHARED: Lazy<CifGrammar> =
    Lazy::new(|| CifGrammar::new().expect("CIF grammar transitions fit its state count"));

/// # CIF Grammar
///
/// An immutable [Engine] configured with the CIF [TRANSITIONS],
/// plus its set of [ACCEPTING_STATES].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CifGrammar {
    engine: Engine,
}
impl CifGrammar {
    /// Build the grammar, with the required [NUM_STATES] states
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_num_states(NUM_STATES)
    }
    /// Build the grammar into an engine of `num_states` states.
    /// Fails if any transition references a state beyond `num_states`.
    pub fn with_num_states(num_states: usize) -> Result<Self, ConfigError> {
        let mut builder = Engine::builder(num_states)?;
        for (from, input, to) in TRANSITIONS.iter() {
            builder.set(*from, *input, *to)?;
        }
        Ok(Self {
            engine: builder.build(),
        })
    }
    /// Get a reference to the process-wide shared grammar.
    /// Immutable, and safe to use from any number of threads.
    pub fn shared() -> &'static CifGrammar {
        &SHARED
    }
    /// Get a reference to our [Engine]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
    /// Feed `byte` while in `state`. Returns [None] for invalid transitions.
    #[inline(always)]
    pub fn next(&self, state: StateId, byte: u8) -> Option<StateId> {
        self.engine.next(state, byte)
    }
    /// Boolean indication of whether `state` is accepting
    pub fn is_accepting(&self, state: StateId) -> bool {
        ACCEPTING_STATES.contains(&state)
    }
}
