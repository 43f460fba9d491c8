//! zlib framing for stored objects

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// deflate `data` into a zlib stream at the given level (0-9)
pub fn compress(data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}

/// inflate a whole zlib stream
pub fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_roundtrip() {
        let data = b"blob 6\0hello\n".repeat(50);
        for level in [0, 1, 6, 9] {
            let packed = compress(&data, level).unwrap();
            assert_eq!(decompress(&packed).unwrap(), data);
        }
    }

    #[test]
    fn test_zlib_header() {
        let packed = compress(b"x", 6).unwrap();
        // CMF byte for deflate with a 32K window
        assert_eq!(packed[0], 0x78);
    }

    #[test]
    fn test_decompress_garbage() {
        assert!(decompress(b"definitely not zlib").is_err());
    }
}
