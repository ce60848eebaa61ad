//! Wire framing for registry-encoded payloads.
//!
//! Format: `[magic_byte(1)][schema_id(4)][records(N)]`
//!
//! The schema id is a big-endian signed 32-bit integer, compatible with the
//! Confluent wire format. Records follow back-to-back with no length prefix.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, TransformError};

/// Magic byte indicating a schema id follows
pub const MAGIC_BYTE: u8 = 0x00;

/// Size of the `[magic][schema_id]` header
pub const HEADER_LEN: usize = 5;

pub type SchemaId = i32;

/// Split a framed payload into its schema id and record stream.
pub fn parse_frame(payload: &[u8]) -> Result<(SchemaId, &[u8])> {
    if payload.len() < HEADER_LEN {
        return Err(TransformError::Framing(format!(
            "data too short to contain schema id ({} bytes)",
            payload.len()
        )));
    }

    if payload[0] != MAGIC_BYTE {
        return Err(TransformError::Framing(format!(
            "bad magic byte: expected 0x00, got 0x{:02x}",
            payload[0]
        )));
    }

    let mut id_bytes = &payload[1..HEADER_LEN];
    let schema_id = id_bytes.get_i32();

    Ok((schema_id, &payload[HEADER_LEN..]))
}

/// Prefix an encoded record stream with the frame header.
pub fn encode_frame(schema_id: SchemaId, records: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + records.len());
    buf.put_u8(MAGIC_BYTE);
    buf.put_i32(schema_id);
    buf.put_slice(records);
    buf.freeze()
}
