//!
//! # Enum-String Mapping Module
//!
//! Defines the [enumstr] macro and its paired [EnumStr] trait,
//! for enumerations whose variants each correspond to a fixed piece of CIF text.
//! CIF exposes several such closed sets: command keywords, mirror axes, and the like.
//!
//! The [EnumStr] trait defines three methods:
//! * `to_str(&self) -> &'static str` converts a variant to its text
//! * `from_str(&str) -> Option<Self>` does the opposite, returning [None] for unknown text
//! * `variants() -> &'static [Self]` lists every variant, in declaration order
//!
//! Example:
//!
//! ```rs
//! use cif21utils::enumstr;
//!
//! enumstr!(
//! /// # Mirror Axes
//! Axis {
//!     X: "X",
//!     Y: "Y",
//!  }
//! );
//! ```
//!

///
/// # String-Enumeration Trait
///
/// Conversions between fieldless enums and their text values.
/// Primarily implemented by the [enumstr] macro.
///
pub trait EnumStr: std::marker::Sized + 'static {
    fn to_str(&self) -> &'static str;
    fn from_str(txt: &str) -> Option<Self>;
    fn variants() -> &'static [Self];
}

///
/// # Enum-String Pairing Macro
///
/// Creates an `enum` which:
/// * (a) Pairs each variant with a string value
/// * (b) Implements [EnumStr] for conversions to and from these strings
/// * (c) Implements [std::fmt::Display], writing the string values
///
/// All variants are fieldless. Derived traits include `serde::{Serialize, Deserialize}`,
/// which must be in scope at the invocation site.
/// Additional attributes (including further `derive`s) can be passed before the enum name.
///
#[macro_export]
macro_rules! enumstr {
    (   $(#[$meta: meta])*
        $enum_name: ident {
        $( $variant: ident : $strval: literal ),* $(,)?
    }) => {
        $(#[$meta])*
        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $( #[doc=$strval]
                $variant ),*
        }
        impl EnumStr for $enum_name {
            /// Convert a [$enum_name] variant to its paired (static) string value.
            fn to_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $strval),*,
                }
            }
            /// Create a [$enum_name] from one of its string values.
            /// Matching is case sensitive, as is all CIF keyword text.
            fn from_str(txt: &str) -> Option<Self> {
                match txt {
                    $( $strval => Some(Self::$variant)),*,
                    _ => None,
                }
            }
            /// All variants, in declaration order
            fn variants() -> &'static [Self] {
                &[ $( Self::$variant ),* ]
            }
        }
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.write_str(self.to_str())
            }
        }
    }
}
