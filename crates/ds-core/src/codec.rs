//! Room blob codec.
//!
//! A room blob is a zlib stream wrapping:
//!
//! ```text
//! magic    4 bytes  "DSVX"
//! version  u8       FORMAT_VERSION
//! width    u16 LE
//! height   u16 LE
//! depth    u16 LE
//! cells    width * height * depth bytes, x fastest, then z, then y
//! ```
//!
//! Every cell is a palette code (see [`crate::palette`]).

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::CatalogError;
use crate::voxel::{GridDims, RoomVoxelGrid};

/// Payload magic
pub const MAGIC: &[u8; 4] = b"DSVX";

/// Current payload version
pub const FORMAT_VERSION: u8 = 1;

/// Header length in bytes (magic + version + three dimensions)
pub const HEADER_LEN: usize = 4 + 1 + 3 * 2;

/// Decode a compressed room blob.
///
/// `path` only labels errors. Any structural deviation yields
/// [`CatalogError::MalformedRoomData`]. The header is decoded first and at
/// most one byte past the declared grid is inflated, so a blob cannot
/// expand beyond the size it claims.
pub fn decode_room(compressed: &[u8], path: &str) -> Result<RoomVoxelGrid, CatalogError> {
    let inflate_failed =
        |e: std::io::Error| CatalogError::malformed(path, format!("decompression failed: {e}"));
    let mut decoder = ZlibDecoder::new(compressed);

    let mut header = Vec::with_capacity(HEADER_LEN);
    decoder
        .by_ref()
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)
        .map_err(inflate_failed)?;
    let dims = decode_header(&header, path)?;

    let volume = dims.volume();
    let mut cells = Vec::new();
    decoder
        .take(volume as u64 + 1)
        .read_to_end(&mut cells)
        .map_err(inflate_failed)?;
    if cells.len() != volume {
        let found = if cells.len() > volume {
            "trailing data".to_string()
        } else {
            cells.len().to_string()
        };
        return Err(CatalogError::malformed(
            path,
            format!("{dims} grid needs {volume} cells, found {found}"),
        ));
    }

    RoomVoxelGrid::from_cells(dims, cells).map_err(|e| CatalogError::malformed(path, e))
}

fn decode_header(header: &[u8], path: &str) -> Result<GridDims, CatalogError> {
    let mut buf = header;
    if buf.remaining() < HEADER_LEN {
        return Err(CatalogError::malformed(
            path,
            format!("payload of {} bytes is shorter than the header", header.len()),
        ));
    }

    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if &magic != MAGIC {
        return Err(CatalogError::malformed(path, "bad magic"));
    }

    let version = buf.get_u8();
    if version != FORMAT_VERSION {
        return Err(CatalogError::malformed(
            path,
            format!("unsupported format version {version}"),
        ));
    }

    Ok(GridDims::new(buf.get_u16_le(), buf.get_u16_le(), buf.get_u16_le()))
}

/// Encode a grid into a compressed room blob.
pub fn encode_room(grid: &RoomVoxelGrid) -> Result<Vec<u8>, CatalogError> {
    let dims = grid.dims();
    let mut payload = BytesMut::with_capacity(HEADER_LEN + dims.volume());
    payload.put_slice(MAGIC);
    payload.put_u8(FORMAT_VERSION);
    payload.put_u16_le(dims.width);
    payload.put_u16_le(dims.height);
    payload.put_u16_le(dims.depth);
    payload.put_slice(grid.cells());

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&payload)?;
    Ok(encoder.finish()?)
}
