//!
//! # Cif Reading Module
//!
//! Facilities for reading CIF content from file, string, or bytes.
//! Includes the byte-level [CifLexer], the per-command [CifParser],
//! and the [CifLoader] which sequences validation and parsing.
//!

// Std-Lib
use std::path::Path;

// Crates.io Imports
use tracing::{debug, trace, warn};

// Local imports
use super::data::*;
use super::fsm::CharClass;
use super::validate::Validator;
use super::utils::EnumStr;

/// Parse CIF content from file `fname`, with default [CifReadOptions]
pub fn parse_file(fname: impl AsRef<Path>) -> CifResult<CifFile> {
    CifLoader::default().load_file(fname)
}
/// Parse CIF content `src` from string, with default [CifReadOptions]
pub fn parse_str(src: &str) -> CifResult<CifFile> {
    CifLoader::default().load_bytes(src.as_bytes())
}

/// Parse a fragment of CIF text with parser-function `f`.
/// Fails if anything other than blanks remains after `f` completes.
pub(crate) fn parse_fragment<'src, T>(
    src: &'src str,
    f: impl FnOnce(&mut CifParser<'src>) -> CifResult<T>,
) -> CifResult<T> {
    let mut parser = CifParser::new(src.as_bytes());
    let rv = f(&mut parser)?;
    parser.lex.skip(CharClass::BlankChar);
    if !parser.lex.at_end() {
        return Err(CifError::Trailing {
            pos: parser.lex.pos(),
        });
    }
    Ok(rv)
}

/// # Cif Lexer
///
/// Byte-level cursor over CIF source.
/// Rather than a separate token stream, the [CifParser] pulls from it
/// class-by-class, since CIF's separators (which include upper-case letters)
/// can only be told apart from keywords in the context of each command.
#[derive(Debug, Clone)]
pub struct CifLexer<'src> {
    /// Source bytes
    src: &'src [u8],
    /// Active byte index
    pos: usize,
    /// Active line number
    line: usize,
}
impl<'src> CifLexer<'src> {
    pub(crate) fn new(src: &'src [u8]) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
        }
    }
    /// Active byte index
    pub fn pos(&self) -> usize {
        self.pos
    }
    /// Active line number
    pub fn line(&self) -> usize {
        self.line
    }
    /// Boolean indication of whether all input has been consumed
    pub fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }
    /// Peek at our next byte, without advancing
    #[inline(always)]
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }
    /// Get and return our next byte, updating our position along the way
    fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }
    /// Accept a byte if it meets predicate-function `f`
    fn accept(&mut self, f: impl Fn(u8) -> bool) -> bool {
        match self.peek() {
            Some(b) if f(b) => {
                self.next_byte();
                true
            }
            _ => false,
        }
    }
    /// Accept a single-byte match
    fn accept_byte(&mut self, c: u8) -> bool {
        self.accept(|b| b == c)
    }
    /// Accept a byte of [CharClass] `class`
    fn accept_class(&mut self, class: CharClass) -> bool {
        self.accept(|b| class.contains(b))
    }
    /// Skip over all bytes of [CharClass] `class`
    fn skip(&mut self, class: CharClass) {
        while self.accept_class(class) {
            continue;
        }
    }
    /// Accept a run of bytes of `class`, returning the run as a slice
    fn run(&mut self, class: CharClass) -> &'src [u8] {
        let start = self.pos;
        self.skip(class);
        &self.src[start..self.pos]
    }
}

/// # Cif Parser
///
/// Reads [CifCommand]s from CIF source, one command at a time.
/// Each `parse_*` method starts at its command's keyword and
/// consumes exactly through its terminating semicolon.
pub struct CifParser<'src> {
    /// Lexer
    lex: CifLexer<'src>,
    /// Context stack of commands being parsed, for error reporting
    ctx: Vec<CifCommandType>,
    /// Set once the End command has been parsed
    done: bool,
}
impl<'src> CifParser<'src> {
    /// Construct a [CifParser] of source bytes `src`
    pub fn new(src: &'src [u8]) -> Self {
        Self {
            lex: CifLexer::new(src),
            ctx: Vec::new(),
            done: false,
        }
    }
    /// Active byte index
    pub fn pos(&self) -> usize {
        self.lex.pos()
    }
    /// Parse the next command, dispatching on its leading keyword.
    /// Returns `None` at end of input, or after the End command.
    pub fn parse_command(&mut self) -> CifResult<Option<CifCommand>> {
        if self.done {
            return Ok(None);
        }
        self.ctx.clear();
        self.lex.skip(CharClass::BlankChar);
        let cmd: CifCommand = match self.lex.peek() {
            None => return Ok(None),
            Some(b'P') => self.parse_polygon()?.into(),
            Some(b'B') => self.parse_box()?.into(),
            Some(b'R') => self.parse_round_flash()?.into(),
            Some(b'W') => self.parse_wire()?.into(),
            Some(b'L') => self.parse_layer()?.into(),
            Some(b'D') => match self.peek_definition_kind() {
                Some(b'S') => self.parse_definition_start()?.into(),
                Some(b'F') => {
                    self.parse_definition_finish()?;
                    CifCommand::DefinitionFinish
                }
                Some(b'D') => self.parse_definition_delete()?.into(),
                _ => return self.fail_unsupported(),
            },
            Some(b'C') => self.parse_call()?.into(),
            Some(b'(') => self.parse_comment()?.into(),
            Some(b'E') => {
                self.parse_end()?;
                CifCommand::End
            }
            Some(b) if b.is_ascii_digit() => self.parse_user_extension()?.into(),
            Some(_) => return self.fail_unsupported(),
        };
        trace!(
            command = cmd.command_type().to_str(),
            line = self.lex.line(),
            "parsed CIF command"
        );
        Ok(Some(cmd))
    }
    /// Skip past the remainder of the current command, through its semicolon.
    /// Used to resynchronize after errors.
    pub fn skip_command(&mut self) {
        self.ctx.clear();
        while let Some(b) = self.lex.next_byte() {
            if b == b';' {
                break;
            }
        }
    }
    /// Peek at the sub-keyword following a `D`, without advancing
    fn peek_definition_kind(&self) -> Option<u8> {
        let mut lex = self.lex.clone();
        lex.next_byte(); // The `D`
        lex.skip(CharClass::BlankChar);
        lex.peek()
    }
    /// Parse a [CifPolygon]: `P` path `;`
    pub fn parse_polygon(&mut self) -> CifResult<CifPolygon> {
        self.ctx.push(CifCommandType::Polygon);
        self.expect_keyword(b'P')?;
        let points = self.parse_path()?;
        self.ctx.pop();
        Ok(CifPolygon { points })
    }
    /// Parse a [CifBox]: `B` length width center [direction] `;`
    pub fn parse_box(&mut self) -> CifResult<CifBox> {
        self.ctx.push(CifCommandType::Box);
        self.expect_keyword(b'B')?;
        let size = self.parse_size()?;
        let position = self.parse_point("position")?;
        // The rotation is optional. Probe for the terminating semicolon.
        let rotation = if self.peek_semi() {
            CifBox::DEFAULT_ROTATION
        } else {
            self.parse_point("rotation")?
        };
        self.expect_semi(CharClass::SeparatorChar)?;
        self.ctx.pop();
        Ok(CifBox {
            size,
            position,
            rotation,
        })
    }
    /// Parse a [CifRoundFlash]: `R` diameter center `;`
    pub fn parse_round_flash(&mut self) -> CifResult<CifRoundFlash> {
        self.ctx.push(CifCommandType::RoundFlash);
        self.expect_keyword(b'R')?;
        let diameter = self.parse_unsigned("diameter")?;
        let position = self.parse_point("position")?;
        self.expect_semi(CharClass::SeparatorChar)?;
        self.ctx.pop();
        Ok(CifRoundFlash { diameter, position })
    }
    /// Parse a [CifWire]: `W` width path `;`
    pub fn parse_wire(&mut self) -> CifResult<CifWire> {
        self.ctx.push(CifCommandType::Wire);
        self.expect_keyword(b'W')?;
        let width = self.parse_unsigned("width")?;
        let points = self.parse_path()?;
        self.ctx.pop();
        Ok(CifWire { width, points })
    }
    /// Parse a [CifLayer]: `L` shortname `;`
    pub fn parse_layer(&mut self) -> CifResult<CifLayer> {
        self.ctx.push(CifCommandType::Layer);
        self.expect_keyword(b'L')?;
        self.lex.skip(CharClass::BlankChar);
        let name = self.lex.run(CharClass::LayerNameChar);
        if name.is_empty() {
            return self.fail_field("name");
        }
        // Layer-name bytes are all ASCII
        let name = String::from_utf8_lossy(name).into_owned();
        self.expect_semi(CharClass::BlankChar)?;
        self.ctx.pop();
        Ok(CifLayer { name })
    }
    /// Parse a [CifDefinitionStart]: `DS` integer [a b] `;`
    pub fn parse_definition_start(&mut self) -> CifResult<CifDefinitionStart> {
        self.ctx.push(CifCommandType::DefinitionStart);
        self.expect_keyword(b'D')?;
        self.expect_keyword(b'S')?;
        let id = self.parse_unsigned("id")?;
        let scale = if self.peek_semi() {
            None
        } else {
            let a = self.parse_unsigned("scale.a")?;
            let b = self.parse_unsigned("scale.b")?;
            Some(CifScale { a, b })
        };
        self.expect_semi(CharClass::SeparatorChar)?;
        self.ctx.pop();
        Ok(CifDefinitionStart { id, scale })
    }
    /// Parse a definition finish: `DF` `;`
    pub fn parse_definition_finish(&mut self) -> CifResult<()> {
        self.ctx.push(CifCommandType::DefinitionFinish);
        self.expect_keyword(b'D')?;
        self.expect_keyword(b'F')?;
        self.expect_semi(CharClass::BlankChar)?;
        self.ctx.pop();
        Ok(())
    }
    /// Parse a [CifDefinitionDelete]: `DD` integer `;`
    pub fn parse_definition_delete(&mut self) -> CifResult<CifDefinitionDelete> {
        self.ctx.push(CifCommandType::DefinitionDelete);
        self.expect_keyword(b'D')?;
        self.expect_keyword(b'D')?;
        let id = self.parse_unsigned("id")?;
        self.expect_semi(CharClass::SeparatorChar)?;
        self.ctx.pop();
        Ok(CifDefinitionDelete { id })
    }
    /// Parse a [CifCall]: `C` integer {transformation} `;`
    pub fn parse_call(&mut self) -> CifResult<CifCall> {
        self.ctx.push(CifCommandType::Call);
        self.expect_keyword(b'C')?;
        let id = self.parse_unsigned("id")?;
        let mut transforms = Vec::new();
        loop {
            self.lex.skip(CharClass::BlankChar);
            let transform = match self.lex.peek() {
                Some(b';') => {
                    self.lex.next_byte();
                    break;
                }
                Some(b'T') => {
                    self.lex.next_byte();
                    CifTransform::Translate(self.parse_point("translation")?)
                }
                Some(b'M') => {
                    self.lex.next_byte();
                    self.lex.skip(CharClass::BlankChar);
                    let axis = self.lex.peek().and_then(|b| {
                        let txt = [b];
                        CifAxis::from_str(std::str::from_utf8(&txt).ok()?)
                    });
                    match axis {
                        Some(axis) => {
                            self.lex.next_byte();
                            CifTransform::Mirror(axis)
                        }
                        None => return self.fail_field("mirror"),
                    }
                }
                Some(b'R') => {
                    self.lex.next_byte();
                    CifTransform::Rotate(self.parse_point("rotation")?)
                }
                _ => return self.fail_field("transformation"),
            };
            transforms.push(transform);
        }
        self.ctx.pop();
        Ok(CifCall { id, transforms })
    }
    /// Parse a [CifComment]: `(` commentText `)` `;`
    pub fn parse_comment(&mut self) -> CifResult<CifComment> {
        self.ctx.push(CifCommandType::Comment);
        self.expect_keyword(b'(')?;
        let start = self.lex.pos();
        while self.lex.accept(|b| b != b')') {
            continue;
        }
        let text = self.parse_text(start)?;
        if !self.lex.accept_byte(b')') {
            return self.fail_field("text");
        }
        self.expect_semi(CharClass::BlankChar)?;
        self.ctx.pop();
        Ok(CifComment { text })
    }
    /// Parse a [CifUserExtension]: digit userText `;`
    pub fn parse_user_extension(&mut self) -> CifResult<CifUserExtension> {
        self.ctx.push(CifCommandType::UserExtension);
        let code = match self.lex.peek() {
            Some(b) if b.is_ascii_digit() => {
                self.lex.next_byte();
                b - b'0'
            }
            _ => return self.fail_field("code"),
        };
        let start = self.lex.pos();
        self.lex.skip(CharClass::UserChar);
        let text = self.parse_text(start)?.trim_end().to_string();
        if !self.lex.accept_byte(b';') {
            return self.fail_field("terminator");
        }
        self.ctx.pop();
        Ok(CifUserExtension { code, text })
    }
    /// Parse the End command: `E` {blank}
    pub fn parse_end(&mut self) -> CifResult<()> {
        self.ctx.push(CifCommandType::End);
        self.expect_keyword(b'E')?;
        self.lex.skip(CharClass::BlankChar);
        if !self.lex.at_end() {
            warn!(pos = self.lex.pos(), "ignoring content after CIF End command");
        }
        self.done = true;
        self.ctx.pop();
        Ok(())
    }
    /// Convert the opaque text from `start` to the current position.
    /// Bytes which are not valid UTF-8 fail rather than being replaced, so that text
    /// is always written back exactly as read.
    fn parse_text(&self, start: usize) -> CifResult<String> {
        match std::str::from_utf8(&self.lex.src[start..self.lex.pos()]) {
            Ok(text) => Ok(text.to_string()),
            Err(e) => self.fail_field_at("text", start + e.valid_up_to()),
        }
    }
    /// Parse a path: one or more points, through the terminating semicolon
    fn parse_path(&mut self) -> CifResult<Vec<CifPoint>> {
        let mut points = Vec::new();
        loop {
            if self.peek_semi() {
                break;
            }
            if self.lex.at_end() {
                return self.fail_field("terminator");
            }
            points.push(self.parse_point("path")?);
        }
        if points.is_empty() {
            return self.fail_field("path");
        }
        self.expect_semi(CharClass::SeparatorChar)?;
        Ok(points)
    }
    /// Parse a [CifPoint]: two signed integers
    pub(crate) fn parse_point(&mut self, field: &'static str) -> CifResult<CifPoint> {
        let x = self.parse_signed(field)?;
        let y = self.parse_signed(field)?;
        Ok(CifPoint { x, y })
    }
    /// Parse a [CifSize]: two unsigned integers
    pub(crate) fn parse_size(&mut self) -> CifResult<CifSize> {
        let width = self.parse_unsigned("size.width")?;
        let height = self.parse_unsigned("size.height")?;
        Ok(CifSize { width, height })
    }
    /// Parse a signed integer, after any separators
    fn parse_signed(&mut self, field: &'static str) -> CifResult<i64> {
        self.lex.skip(CharClass::SeparatorChar);
        let start = self.lex.pos();
        self.lex.accept_byte(b'-');
        self.parse_digits(start, field)
    }
    /// Parse an unsigned integer, after any separators
    fn parse_unsigned(&mut self, field: &'static str) -> CifResult<u64> {
        self.lex.skip(CharClass::SeparatorChar);
        let start = self.lex.pos();
        self.parse_digits(start, field)
    }
    /// Parse a run of digits, and convert the text from `start` into a number
    fn parse_digits<T: std::str::FromStr>(
        &mut self,
        start: usize,
        field: &'static str,
    ) -> CifResult<T> {
        if self.lex.run(CharClass::Digit).is_empty() {
            return self.fail_field(field);
        }
        let txt = std::str::from_utf8(&self.lex.src[start..self.lex.pos()]).ok();
        match txt.and_then(|t| t.parse::<T>().ok()) {
            Some(num) => Ok(num),
            // Out of range for the target integer type
            None => self.fail_field_at(field, start),
        }
    }
    /// Assert the next byte (after any blanks) is keyword `kw`, and consume it
    fn expect_keyword(&mut self, kw: u8) -> CifResult<()> {
        self.lex.skip(CharClass::BlankChar);
        if self.lex.accept_byte(kw) {
            Ok(())
        } else {
            self.fail_field("keyword")
        }
    }
    /// Probe whether the next byte after any separators is a semicolon.
    /// Separators are consumed, the semicolon is not.
    fn peek_semi(&mut self) -> bool {
        self.lex.skip(CharClass::SeparatorChar);
        self.lex.peek() == Some(b';')
    }
    /// Assert the next byte after any bytes of `skip` is a semicolon, and consume it
    fn expect_semi(&mut self, skip: CharClass) -> CifResult<()> {
        self.lex.skip(skip);
        if self.lex.accept_byte(b';') {
            Ok(())
        } else {
            self.fail_field("terminator")
        }
    }
    /// Error-Generation Helper. Fail on `field` at the current position.
    pub(crate) fn fail_field<T>(&self, field: &'static str) -> CifResult<T> {
        self.fail_field_at(field, self.lex.pos())
    }
    /// Error-Generation Helper. Fail on `field` at position `pos`.
    fn fail_field_at<T>(&self, field: &'static str, pos: usize) -> CifResult<T> {
        Err(CifError::MalformedField {
            command: self.ctx.last().copied(),
            field,
            pos,
            found: self.lex.src.get(pos).copied(),
        })
    }
    /// Error-Generation Helper. Fail on an unknown command keyword.
    fn fail_unsupported<T>(&self) -> CifResult<T> {
        let pos = self.lex.pos();
        match self.lex.peek() {
            Some(keyword) => Err(CifError::Unsupported { keyword, pos }),
            None => self.fail_field("keyword"),
        }
    }
}

/// # Cif Loader
///
/// Sequences the reading of a CIF file: open, validate, then build commands.
/// Collects human-readable diagnostic messages along the way.
#[derive(Debug, Default)]
pub struct CifLoader {
    /// Reader options
    options: CifReadOptions,
    /// Messages generated by the last load
    messages: Vec<String>,
}
impl CifLoader {
    /// Create a new [CifLoader] with `options`
    pub fn new(options: CifReadOptions) -> Self {
        Self {
            options,
            messages: Vec::new(),
        }
    }
    /// Get our [CifReadOptions]
    pub fn options(&self) -> &CifReadOptions {
        &self.options
    }
    /// Messages generated during the last load
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
    /// Load a [CifFile] from file `fname`
    pub fn load_file(&mut self, fname: impl AsRef<Path>) -> CifResult<CifFile> {
        self.messages.clear();
        let fname = fname.as_ref();
        debug!(path = %fname.display(), "loading CIF file");
        let src = match std::fs::read(fname) {
            Ok(src) => src,
            Err(e) => {
                self.note(format!(
                    "open: error: can't open input file {}: {}",
                    fname.display(),
                    e
                ));
                return Err(e.into());
            }
        };
        self.load(&src)
    }
    /// Load a [CifFile] from bytes `src`
    pub fn load_bytes(&mut self, src: &[u8]) -> CifResult<CifFile> {
        self.messages.clear();
        self.load(src)
    }
    /// Validate if enabled, then build commands
    fn load(&mut self, src: &[u8]) -> CifResult<CifFile> {
        if self.options.validate {
            let outcome = Validator::shared().validate(src.iter().copied());
            for msg in outcome.messages() {
                self.note(msg);
            }
            outcome.into_result()?;
        }
        self.load_commands(src)
    }
    /// Build the [CifCommand]s of `src`
    fn load_commands(&mut self, src: &[u8]) -> CifResult<CifFile> {
        let mut parser = CifParser::new(src);
        let mut commands = Vec::new();
        loop {
            match parser.parse_command() {
                Ok(Some(cmd)) => commands.push(cmd),
                Ok(None) => break,
                Err(e @ CifError::Unsupported { .. })
                    if self.options.unsupported == UnsupportedPolicy::Skip =>
                {
                    self.note(format!("load: warning: skipping {}", e));
                    parser.skip_command();
                }
                Err(e) => {
                    self.note(format!("load: error: {}", e));
                    return Err(e);
                }
            }
        }
        debug!(commands = commands.len(), "loaded CIF commands");
        Ok(CifFile { commands })
    }
    /// Record a diagnostic message
    fn note(&mut self, msg: String) {
        warn!("{}", msg);
        self.messages.push(msg);
    }
}
