//!
//! # Cif Writer Module
//!
//! Each command prints in a single canonical form,
//! which is always accepted by the validator and read back unchanged.
//!

// Std-Lib
use std::fmt;
use std::io::Write;
use std::path::Path;

// Crates.io Imports
use tracing::debug;

// Local imports
use super::data::*;

/// Write a [CifFile] to file `fname`.
/// An End command is appended if `file` does not already end with one.
pub fn save(file: &CifFile, fname: impl AsRef<Path>) -> CifResult<()> {
    let f = std::fs::File::create(fname)?;
    CifWriter::new(std::io::BufWriter::new(f)).write_file(file)
}
/// Write a [CifFile] to CIF-format [String]
pub fn to_string(file: &CifFile) -> CifResult<String> {
    let mut buf = Vec::new();
    CifWriter::new(&mut buf).write_file(file)?;
    let rv = String::from_utf8(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(rv)
}

/// # Cif Writing Helper
pub struct CifWriter<'wr> {
    /// Write Destination
    dest: Box<dyn Write + 'wr>,
}
impl<'wr> CifWriter<'wr> {
    /// Create a new [CifWriter] to destination `dest`.
    /// Destination is boxed internally.
    pub fn new(dest: impl Write + 'wr) -> Self {
        Self {
            dest: Box::new(dest),
        }
    }
    /// Write a [CifFile], one command per line
    pub fn write_file(&mut self, file: &CifFile) -> CifResult<()> {
        for cmd in file.commands.iter() {
            self.write_command(cmd)?;
        }
        if file.commands.last() != Some(&CifCommand::End) {
            self.write_command(&CifCommand::End)?;
        }
        self.dest.flush()?;
        debug!(commands = file.commands.len(), "wrote CIF content");
        Ok(())
    }
    /// Write a single [CifCommand] and its line-break
    pub fn write_command(&mut self, cmd: &CifCommand) -> CifResult<()> {
        writeln!(self.dest, "{}", cmd)?;
        Ok(())
    }
}

impl fmt::Display for CifPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}
impl fmt::Display for CifSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.width, self.height)
    }
}
/// Write the space-prefixed points of a path
fn write_path(f: &mut fmt::Formatter, points: &[CifPoint]) -> fmt::Result {
    for p in points {
        write!(f, " {}", p)?;
    }
    Ok(())
}
impl fmt::Display for CifPolygon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "P")?;
        write_path(f, &self.points)?;
        write!(f, " ;")
    }
}
impl fmt::Display for CifBox {
    /// Rotation is always written, including the default
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "B {} {} {} ;", self.size, self.position, self.rotation)
    }
}
impl fmt::Display for CifRoundFlash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "R {} {} ;", self.diameter, self.position)
    }
}
impl fmt::Display for CifWire {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "W {}", self.width)?;
        write_path(f, &self.points)?;
        write!(f, " ;")
    }
}
impl fmt::Display for CifLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L {} ;", self.name)
    }
}
impl fmt::Display for CifDefinitionStart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.scale {
            Some(CifScale { a, b }) => write!(f, "D S {} {} {} ;", self.id, a, b),
            None => write!(f, "D S {} ;", self.id),
        }
    }
}
impl fmt::Display for CifDefinitionDelete {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "D D {} ;", self.id)
    }
}
impl fmt::Display for CifTransform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Translate(p) => write!(f, "T {}", p),
            Self::Mirror(axis) => write!(f, "M {}", axis),
            Self::Rotate(p) => write!(f, "R {}", p),
        }
    }
}
impl fmt::Display for CifCall {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "C {}", self.id)?;
        for t in self.transforms.iter() {
            write!(f, " {}", t)?;
        }
        write!(f, " ;")
    }
}
impl fmt::Display for CifComment {
    /// Text containing `)` does not print as valid CIF
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}) ;", self.text)
    }
}
impl fmt::Display for CifUserExtension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{} ;", self.code, self.text)
    }
}
impl fmt::Display for CifCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Polygon(p) => fmt::Display::fmt(p, f),
            Self::Box(b) => fmt::Display::fmt(b, f),
            Self::RoundFlash(r) => fmt::Display::fmt(r, f),
            Self::Wire(w) => fmt::Display::fmt(w, f),
            Self::Layer(l) => fmt::Display::fmt(l, f),
            Self::DefinitionStart(d) => fmt::Display::fmt(d, f),
            Self::DefinitionFinish => write!(f, "D F ;"),
            Self::DefinitionDelete(d) => fmt::Display::fmt(d, f),
            Self::Call(c) => fmt::Display::fmt(c, f),
            Self::Comment(c) => fmt::Display::fmt(c, f),
            Self::UserExtension(u) => fmt::Display::fmt(u, f),
            Self::End => write!(f, "E"),
        }
    }
}
