//!
//! # Cif Data Model
//!
//! A [CifFile] is an ordered sequence of [CifCommand]s.
//! Each command variant carries its own payload, and has a symmetric textual
//! `read` (via [std::str::FromStr]) and `print` (via [std::fmt::Display]) form.
//!

// Std-Lib
use std::path::Path;
use std::str::FromStr;

// Crates.io Imports
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::fsm::{ConfigError, StateId};
use crate::read::{parse_fragment, CifParser};
use crate::utils::{enumstr, EnumStr, SerdeFile};

/// # Cif Point
///
/// Signed integer coordinates. Printed and read as `x y`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct CifPoint {
    pub x: i64,
    pub y: i64,
}
impl CifPoint {
    /// Create a new [CifPoint]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}
impl FromStr for CifPoint {
    type Err = CifError;
    fn from_str(s: &str) -> CifResult<Self> {
        parse_fragment(s, |p| p.parse_point("point"))
    }
}

/// # Cif Size
///
/// Non-negative width and height. Printed and read as `width height`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct CifSize {
    pub width: u64,
    pub height: u64,
}
impl CifSize {
    /// Create a new [CifSize]
    pub fn new(width: u64, height: u64) -> Self {
        Self { width, height }
    }
}
impl FromStr for CifSize {
    type Err = CifError;
    fn from_str(s: &str) -> CifResult<Self> {
        parse_fragment(s, |p| p.parse_size())
    }
}

/// # Polygon
///
/// Ordered vertex list. Duplicate and collinear points are kept verbatim.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifPolygon {
    pub points: Vec<CifPoint>,
}

/// # Box
///
/// Rectangle of `size`, centered at `position`.
/// `rotation` is a direction vector for the box's length, defaulting to (1, 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifBox {
    pub size: CifSize,
    pub position: CifPoint,
    pub rotation: CifPoint,
}
impl Default for CifBox {
    fn default() -> Self {
        Self {
            size: CifSize::default(),
            position: CifPoint::default(),
            rotation: CifBox::DEFAULT_ROTATION,
        }
    }
}
impl CifBox {
    /// The neutral rotation vector, used when none is specified
    pub const DEFAULT_ROTATION: CifPoint = CifPoint { x: 1, y: 0 };
}

/// # Round Flash
///
/// Circle of `diameter` centered at `position`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifRoundFlash {
    pub diameter: u64,
    pub position: CifPoint,
}

/// # Wire
///
/// Path of `width` along its ordered `points`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifWire {
    pub width: u64,
    pub points: Vec<CifPoint>,
}

/// # Layer
///
/// Sets the layer of all subsequent geometry.
/// Names are made of digits and upper-case letters.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifLayer {
    pub name: String,
}

/// Definition Scale Factor `a / b`, applied to all distances within a symbol definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifScale {
    pub a: u64,
    pub b: u64,
}

/// # Definition Start
///
/// Opens the definition of symbol `id`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifDefinitionStart {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<CifScale>,
}

/// # Definition Delete
///
/// Deletes all symbol definitions numbered `id` or higher
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifDefinitionDelete {
    pub id: u64,
}

enumstr!(
    /// # Mirror Axes
    #[derive(JsonSchema)]
    CifAxis {
        X: "X",
        Y: "Y",
    }
);

/// # Call Transformation
///
/// Applied in order, as listed in each [CifCall].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CifTransform {
    /// `T x y`
    Translate(CifPoint),
    /// `M X` or `M Y`
    Mirror(CifAxis),
    /// `R x y`, rotating the x-axis onto direction `(x, y)`
    Rotate(CifPoint),
}

/// # Call
///
/// Instance of symbol `id`, placed through an ordered list of `transforms`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifCall {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<CifTransform>,
}

/// # Comment
///
/// Opaque text between parentheses
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifComment {
    pub text: String,
}

/// # User Extension
///
/// Command beginning with a digit `code`, followed by opaque `text`.
/// Trailing blanks of `text` are not retained.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifUserExtension {
    pub code: u8,
    pub text: String,
}

enumstr!(
    /// # Command Types
    ///
    /// Closed set of tags identifying each [CifCommand] variant
    #[derive(JsonSchema)]
    CifCommandType {
        Polygon: "Polygon",
        Box: "Box",
        RoundFlash: "RoundFlash",
        Wire: "Wire",
        Layer: "Layer",
        DefinitionStart: "DefinitionStart",
        DefinitionFinish: "DefinitionFinish",
        DefinitionDelete: "DefinitionDelete",
        Call: "Call",
        Comment: "Comment",
        UserExtension: "UserExtension",
        End: "End",
    }
);

enumstr!(
    /// # Command Families
    CifCommandFamily {
        Primitive: "Primitive",
        Control: "Control",
        Extension: "Extension",
    }
);

/// # Cif Command
///
/// Sum type over all supported commands.
/// Serialized as a table of its payload's fields plus a `type` tag,
/// so that payload-free commands remain tables, as TOML requires of array elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum CifCommand {
    Polygon(CifPolygon),
    Box(CifBox),
    RoundFlash(CifRoundFlash),
    Wire(CifWire),
    Layer(CifLayer),
    DefinitionStart(CifDefinitionStart),
    DefinitionFinish,
    DefinitionDelete(CifDefinitionDelete),
    Call(CifCall),
    Comment(CifComment),
    UserExtension(CifUserExtension),
    End,
}
impl CifCommand {
    /// Get our [CifCommandType] tag
    pub fn command_type(&self) -> CifCommandType {
        match self {
            Self::Polygon(_) => CifCommandType::Polygon,
            Self::Box(_) => CifCommandType::Box,
            Self::RoundFlash(_) => CifCommandType::RoundFlash,
            Self::Wire(_) => CifCommandType::Wire,
            Self::Layer(_) => CifCommandType::Layer,
            Self::DefinitionStart(_) => CifCommandType::DefinitionStart,
            Self::DefinitionFinish => CifCommandType::DefinitionFinish,
            Self::DefinitionDelete(_) => CifCommandType::DefinitionDelete,
            Self::Call(_) => CifCommandType::Call,
            Self::Comment(_) => CifCommandType::Comment,
            Self::UserExtension(_) => CifCommandType::UserExtension,
            Self::End => CifCommandType::End,
        }
    }
    /// Get our [CifCommandFamily]
    pub fn family(&self) -> CifCommandFamily {
        match self {
            Self::Polygon(_) | Self::Box(_) | Self::RoundFlash(_) | Self::Wire(_) => {
                CifCommandFamily::Primitive
            }
            Self::Comment(_) | Self::UserExtension(_) => CifCommandFamily::Extension,
            _ => CifCommandFamily::Control,
        }
    }
    /// Symbol number, for commands which carry one
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::DefinitionStart(d) => Some(d.id),
            Self::DefinitionDelete(d) => Some(d.id),
            Self::Call(c) => Some(c.id),
            _ => None,
        }
    }
    /// Center point, for position-based primitives
    pub fn position(&self) -> Option<&CifPoint> {
        match self {
            Self::Box(b) => Some(&b.position),
            Self::RoundFlash(r) => Some(&r.position),
            _ => None,
        }
    }
    /// Vertex list, for path-based primitives
    pub fn path(&self) -> Option<&[CifPoint]> {
        match self {
            Self::Polygon(p) => Some(&p.points),
            Self::Wire(w) => Some(&w.points),
            _ => None,
        }
    }
}
impl FromStr for CifCommand {
    type Err = CifError;
    /// Parse a single command, dispatching on its leading keyword
    fn from_str(s: &str) -> CifResult<Self> {
        parse_fragment(s, |p| match p.parse_command()? {
            Some(cmd) => Ok(cmd),
            None => p.fail_field("keyword"),
        })
    }
}

/// Implement conversions from each payload type into [CifCommand],
/// and parsing of each payload type from its command text.
macro_rules! payload {
    ($( $variant: ident ( $payload: ident ) => $parse_fn: ident ),* $(,)?) => {
        $(
            impl From<$payload> for CifCommand {
                fn from(p: $payload) -> Self {
                    Self::$variant(p)
                }
            }
            impl FromStr for $payload {
                type Err = CifError;
                fn from_str(s: &str) -> CifResult<Self> {
                    parse_fragment(s, CifParser::$parse_fn)
                }
            }
        )*
    };
}
payload!(
    Polygon(CifPolygon) => parse_polygon,
    Box(CifBox) => parse_box,
    RoundFlash(CifRoundFlash) => parse_round_flash,
    Wire(CifWire) => parse_wire,
    Layer(CifLayer) => parse_layer,
    DefinitionStart(CifDefinitionStart) => parse_definition_start,
    DefinitionDelete(CifDefinitionDelete) => parse_definition_delete,
    Call(CifCall) => parse_call,
    Comment(CifComment) => parse_comment,
    UserExtension(CifUserExtension) => parse_user_extension,
);

/// # Cif File
///
/// The ordered sequence of [CifCommand]s of a single file.
/// Well-formed files end with [CifCommand::End].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CifFile {
    pub commands: Vec<CifCommand>,
}
impl CifFile {
    /// Create a new and initially empty [CifFile].
    /// Also available via [Default].
    pub fn new() -> CifFile {
        CifFile::default()
    }
    /// Open a [CifFile] from CIF-format file `fname`, with default [CifReadOptions]
    pub fn open(fname: impl AsRef<Path>) -> CifResult<CifFile> {
        super::read::parse_file(fname)
    }
    /// Parse a [CifFile] from CIF-format string `src`, with default [CifReadOptions]
    pub fn parse_str(src: &str) -> CifResult<CifFile> {
        super::read::parse_str(src)
    }
    /// Write to CIF-format file `fname`
    pub fn save(&self, fname: impl AsRef<Path>) -> CifResult<()> {
        super::write::save(self, fname)
    }
    /// Write to a CIF-format [String]
    pub fn to_string(&self) -> CifResult<String> {
        super::write::to_string(self)
    }
}

enumstr!(
    /// # Unsupported-Command Policy
    ///
    /// Action taken by the loader upon commands with unknown keywords.
    /// Only reachable with validation disabled, as the grammar admits no such commands.
    #[derive(JsonSchema)]
    UnsupportedPolicy {
        Abort: "abort",
        Skip: "skip",
    }
);
impl Default for UnsupportedPolicy {
    fn default() -> Self {
        Self::Abort
    }
}

/// # Reader Options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CifReadOptions {
    /// Validate syntax before building commands
    pub validate: bool,
    /// Action upon unsupported commands
    pub unsupported: UnsupportedPolicy,
}
impl Default for CifReadOptions {
    fn default() -> Self {
        Self {
            validate: true,
            unsupported: UnsupportedPolicy::Abort,
        }
    }
}

/// Render `byte` for diagnostics: printable ASCII as-is, everything else escaped
pub(crate) fn display_byte(byte: u8) -> String {
    if byte.is_ascii_graphic() || byte == b' ' {
        char::from(byte).to_string()
    } else {
        format!("\\x{:02x}", byte)
    }
}
/// Render the optional context of a [CifError::MalformedField]
fn malformed_context(command: &Option<CifCommandType>) -> String {
    match command {
        Some(c) => format!("{} command", c),
        None => "value".into(),
    }
}
/// Render the optional offending byte of a [CifError::MalformedField]
fn found_suffix(found: &Option<u8>) -> String {
    match found {
        Some(b) => format!(", found `{}`", display_byte(*b)),
        None => ", found end of input".into(),
    }
}

/// # Cif Error Enumeration
#[derive(Debug, thiserror::Error)]
pub enum CifError {
    /// Input could not be opened or read
    #[error("cannot read CIF input: {0}")]
    Resource(#[from] std::io::Error),
    /// Syntax validation hit an undefined transition
    #[error("invalid CIF content at byte {offset}: state {state}, input char {} (ASCII={byte})", display_byte(*byte))]
    Invalid {
        state: StateId,
        byte: u8,
        offset: usize,
    },
    /// Input ended in a non-accepting state
    #[error("incomplete CIF content in state {state} (maybe a missing End command)")]
    Incomplete { state: StateId },
    /// Command keyword with no matching variant
    #[error("unsupported CIF command `{}` at byte {pos}", display_byte(*keyword))]
    Unsupported { keyword: u8, pos: usize },
    /// A command field could not be parsed
    #[error("malformed {} field `{field}` at byte {pos}{}", malformed_context(command), found_suffix(found))]
    MalformedField {
        command: Option<CifCommandType>,
        field: &'static str,
        pos: usize,
        found: Option<u8>,
    },
    /// Content remaining after a complete command fragment
    #[error("unexpected content after command, at byte {pos}")]
    Trailing { pos: usize },
    /// Grammar construction defect
    #[error("invalid grammar definition: {0}")]
    Config(#[from] ConfigError),
    /// Alternate-format serialization failures
    #[error(transparent)]
    Serialization(#[from] crate::utils::ser::Error),
}

/// Cif21 Library-Wide Result Type
pub type CifResult<T> = Result<T, CifError>;

// Serialization to and from JSON, YAML, and TOML files
impl SerdeFile for CifFile {}
impl SerdeFile for CifReadOptions {}
