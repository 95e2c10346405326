//!
//! # Cif21 Caltech Intermediate Form Validator, Reader & Writer
//!
//! CIF (Caltech Intermediate Form) is a compact text format for IC layout geometry,
//! defined in Caltech technical report 2686 (1980).
//! Cif21 checks CIF text for well-formedness, reads it into a typed command model,
//! and writes that model back out as CIF.
//!
//! Cif21 is organized in layers:
//!
//! * The [fsm] module provides a generic byte-driven state machine [Engine],
//!   configured through an [EngineBuilder] from single bytes, literal byte-sets, and [CharClass]es.
//! * The [grammar] module wires an [Engine] to the CIF command grammar, as [CifGrammar].
//!   A single process-wide instance is shared via [CifGrammar::shared].
//! * The [validate] module runs a [Validator] over a byte stream, in one pass without lookahead,
//!   producing a [ValidationOutcome] which is accepted, incomplete, or invalid at a specific byte.
//! * The [data] module defines the command model: a [CifFile] of [CifCommand]s.
//! * The [read] and [write] modules convert between CIF text and the command model.
//!
//! ## Alternate Serialization
//!
//! Each element of the command model is [serde]-serializable,
//! and can be saved to and loaded from JSON, YAML, and TOML via [utils::SerializationFormat].
//! JSON-Schema descriptions are available via [schemars].
//!
//! ## Usage
//!
//! Validating CIF content:
//!
//! ```
//! use cif21::{validate_str, ValidationOutcome};
//! assert!(validate_str("B 4 2 1 1 ; E").is_accepted());
//! assert_eq!(validate_str(""), ValidationOutcome::Incomplete { state: 1 });
//! ```
//!
//! Reading and writing a [CifFile]:
//!
//! ```
//! let file = cif21::CifFile::parse_str("L NM ; B 4 2 1 1 ; E").unwrap();
//! assert_eq!(file.commands.len(), 3);
//! let cif = file.to_string().unwrap();
//! assert_eq!(cif, "L NM ;\nB 4 2 1 1 1 0 ;\nE\n");
//! ```
//!
//! Loading a [CifFile] from disk, with non-default [CifReadOptions]:
//!
//! ```no_run
//! use cif21::{CifLoader, CifReadOptions, UnsupportedPolicy};
//! let opts = CifReadOptions { validate: false, unsupported: UnsupportedPolicy::Skip };
//! let mut loader = CifLoader::new(opts);
//! let file = loader.load_file("sample.cif")?;
//! println!("{} commands", file.commands.len());
//! # Ok::<(), cif21::CifError>(())
//! ```
//!

// Re-export our utilities crate
pub use cif21utils as utils;

pub mod fsm;
pub use fsm::*;

pub mod grammar;
pub use grammar::*;

pub mod validate;
pub use validate::*;

pub mod data;
pub use data::*;

pub mod read;
pub use read::*;

pub mod write;
pub use write::*;

#[cfg(test)]
mod tests;
