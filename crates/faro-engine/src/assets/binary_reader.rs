use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Byte order of a binary asset file.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of the host.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Endian = Endian::Little;
    #[cfg(target_endian = "big")]
    pub const NATIVE: Endian = Endian::Big;
}

/// Reader decoding fixed-width integers from a byte stream in a declared
/// byte order.
///
/// Asset files record their endianness out of band (pack tooling writes
/// little-endian by default); the reader decodes accordingly regardless of
/// the host's byte order.
pub struct BinaryReader<R> {
    inner: R,
    endian: Endian,
}

impl BinaryReader<BufReader<File>> {
    /// Opens a file for buffered reading in the given byte order.
    pub fn open(path: impl AsRef<Path>, endian: Endian) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), endian))
    }
}

impl<R: Read> BinaryReader<R> {
    pub fn new(inner: R, endian: Endian) -> Self {
        Self { inner, endian }
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        self.inner.read_exact(&mut buf)?;
        Ok(match self.endian {
            Endian::Little => u16::from_le_bytes(buf),
            Endian::Big => u16::from_be_bytes(buf),
        })
    }

    pub fn read_u32(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(match self.endian {
            Endian::Little => u32::from_le_bytes(buf),
            Endian::Big => u32::from_be_bytes(buf),
        })
    }

    /// Reads exactly `len` raw bytes (no byte-order interpretation).
    pub fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: &[u8], endian: Endian) -> BinaryReader<Cursor<Vec<u8>>> {
        BinaryReader::new(Cursor::new(bytes.to_vec()), endian)
    }

    #[test]
    fn little_endian_decoding() {
        let mut r = reader(&[0x01, 0x02, 0x03, 0x04], Endian::Little);
        assert_eq!(r.read_u32().unwrap(), 0x0403_0201);
    }

    #[test]
    fn big_endian_decoding() {
        let mut r = reader(&[0x01, 0x02, 0x03, 0x04], Endian::Big);
        assert_eq!(r.read_u32().unwrap(), 0x0102_0304);
    }

    #[test]
    fn u16_respects_declared_order() {
        let mut r = reader(&[0xAB, 0xCD], Endian::Little);
        assert_eq!(r.read_u16().unwrap(), 0xCDAB);

        let mut r = reader(&[0xAB, 0xCD], Endian::Big);
        assert_eq!(r.read_u16().unwrap(), 0xABCD);
    }

    #[test]
    fn u8_is_order_independent() {
        let mut r = reader(&[0x7F], Endian::Big);
        assert_eq!(r.read_u8().unwrap(), 0x7F);
    }

    #[test]
    fn sequential_reads_advance() {
        let mut r = reader(&[1, 0, 2, 0, 0, 0, 3], Endian::Little);
        assert_eq!(r.read_u16().unwrap(), 1);
        assert_eq!(r.read_u32().unwrap(), 2);
        assert_eq!(r.read_u8().unwrap(), 3);
    }

    #[test]
    fn short_stream_reports_eof() {
        let mut r = reader(&[0x01, 0x02], Endian::Little);
        let err = r.read_u32().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
