use std::fmt;
use std::io::{self, Read};
use std::path::Path;

use crate::presenter::TextureData;

use super::{BinaryReader, Endian};

/// Error returned when loading a packed font file.
#[derive(Debug)]
pub enum FontDataError {
    Io(io::Error),
    /// A glyph table entry points outside the pixel block.
    BadGlyphTable { index: usize },
}

impl fmt::Display for FontDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontDataError::Io(e) => write!(f, "font data read error: {e}"),
            FontDataError::BadGlyphTable { index } => {
                write!(f, "font data glyph {index} points outside the pixel block")
            }
        }
    }
}

impl std::error::Error for FontDataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontDataError::Io(e) => Some(e),
            FontDataError::BadGlyphTable { .. } => None,
        }
    }
}

impl From<io::Error> for FontDataError {
    fn from(e: io::Error) -> Self {
        FontDataError::Io(e)
    }
}

struct GlyphInfo {
    offset: u32,
    width: u8,
    height: u8,
}

/// One glyph's bitmap, borrowed from the container.
///
/// `alpha` holds `width * height` coverage bytes, row-major.
#[derive(Debug, Copy, Clone)]
pub struct Glyph<'a> {
    pub width: u32,
    pub height: u32,
    pub alpha: &'a [u8],
}

impl Glyph<'_> {
    /// Expands the coverage bitmap into the RGBA8 layout render resources
    /// take: white pixels carrying the glyph coverage in the alpha channel.
    pub fn to_rgba(&self) -> TextureData {
        let mut pixels = Vec::with_capacity(self.alpha.len() * 4);
        for &a in self.alpha {
            pixels.extend_from_slice(&[0xFF, 0xFF, 0xFF, a]);
        }
        TextureData {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Packed bitmap-font container.
///
/// Layout (integers in the file's declared byte order):
/// - glyph count: u32
/// - per glyph: byte offset u32, width u8, height u8
/// - pixel block length: u32, then that many raw coverage bytes
///
/// Glyph offsets index into the pixel block; the table is validated once at
/// load so `glyph()` can hand out slices without re-checking bounds.
pub struct FontData {
    glyphs: Vec<GlyphInfo>,
    pixels: Vec<u8>,
}

impl FontData {
    /// Opens a packed font file (pack tooling writes little-endian).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FontDataError> {
        let mut reader = BinaryReader::open(path, Endian::Little)?;
        Self::read_from(&mut reader)
    }

    /// Reads a packed font from an already-open binary reader.
    pub fn read_from<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self, FontDataError> {
        let glyph_count = reader.read_u32()? as usize;

        let mut glyphs = Vec::with_capacity(glyph_count);
        for _ in 0..glyph_count {
            let offset = reader.read_u32()?;
            let width = reader.read_u8()?;
            let height = reader.read_u8()?;
            glyphs.push(GlyphInfo { offset, width, height });
        }

        let pixel_len = reader.read_u32()? as usize;
        let pixels = reader.read_bytes(pixel_len)?;

        for (index, info) in glyphs.iter().enumerate() {
            let end = info.offset as usize + info.width as usize * info.height as usize;
            if end > pixels.len() {
                return Err(FontDataError::BadGlyphTable { index });
            }
        }

        Ok(Self { glyphs, pixels })
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Returns the bitmap for `index`, or `None` when out of range.
    pub fn glyph(&self, index: usize) -> Option<Glyph<'_>> {
        let info = self.glyphs.get(index)?;
        let start = info.offset as usize;
        let len = info.width as usize * info.height as usize;
        Some(Glyph {
            width: info.width as u32,
            height: info.height as u32,
            alpha: &self.pixels[start..start + len],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Builds a little-endian font blob with the given glyph table entries
    /// and pixel block.
    fn font_blob(entries: &[(u32, u8, u8)], pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        for &(offset, w, h) in entries {
            out.extend_from_slice(&offset.to_le_bytes());
            out.push(w);
            out.push(h);
        }
        out.extend_from_slice(&(pixels.len() as u32).to_le_bytes());
        out.extend_from_slice(pixels);
        out
    }

    fn load(blob: Vec<u8>) -> Result<FontData, FontDataError> {
        let mut reader = BinaryReader::new(Cursor::new(blob), Endian::Little);
        FontData::read_from(&mut reader)
    }

    #[test]
    fn loads_glyphs_in_table_order() {
        let blob = font_blob(&[(0, 2, 1), (2, 1, 2)], &[10, 20, 30, 40]);
        let font = load(blob).unwrap();

        assert_eq!(font.glyph_count(), 2);

        let g0 = font.glyph(0).unwrap();
        assert_eq!((g0.width, g0.height), (2, 1));
        assert_eq!(g0.alpha, &[10, 20]);

        let g1 = font.glyph(1).unwrap();
        assert_eq!((g1.width, g1.height), (1, 2));
        assert_eq!(g1.alpha, &[30, 40]);
    }

    #[test]
    fn out_of_range_glyph_is_none() {
        let blob = font_blob(&[(0, 1, 1)], &[255]);
        let font = load(blob).unwrap();
        assert!(font.glyph(1).is_none());
    }

    #[test]
    fn bad_table_entry_is_rejected_at_load() {
        let blob = font_blob(&[(3, 2, 2)], &[0, 0, 0, 0]);
        match load(blob) {
            Err(FontDataError::BadGlyphTable { index: 0 }) => {}
            other => panic!("expected BadGlyphTable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn truncated_pixel_block_is_io_error() {
        let mut blob = font_blob(&[(0, 1, 1)], &[1]);
        blob.pop();
        assert!(matches!(load(blob), Err(FontDataError::Io(_))));
    }

    #[test]
    fn rgba_expansion_keeps_dimensions_and_coverage() {
        let blob = font_blob(&[(0, 2, 1)], &[0, 128]);
        let font = load(blob).unwrap();
        let tex = font.glyph(0).unwrap().to_rgba();

        assert_eq!((tex.width, tex.height), (2, 1));
        assert_eq!(tex.pixels, vec![255, 255, 255, 0, 255, 255, 255, 128]);
    }
}
