//!
//! # Cif21 Internal Utilities Crate
//!
//! Shared helpers for the CIF reader, writer and converters:
//! * [enumstr] for enums with paired CIF-text values
//! * [SerializationFormat] and [SerdeFile] for JSON, YAML and TOML (de)serialization to and from files
//!

pub mod ser;
pub use ser::*;

pub mod enumstr;
pub use enumstr::*;
