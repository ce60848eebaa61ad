//! Repeated decoding of a back-to-back Avro record stream.

use apache_avro::Schema;

use crate::value::Value;

/// Result of consuming one record stream.
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    /// Records in stream order.
    pub records: Vec<Value>,
    /// Trailing bytes left behind when a decode attempt failed.
    pub discarded: usize,
}

/// Decode records from the front of `buffer` until it is empty.
///
/// The stream carries no length prefixes, so record boundaries are only known
/// by decoding. A failed decode ends the stream: whatever has not been consumed
/// is dropped and reported through `discarded`, never as an error. A decode
/// that consumes nothing also ends the stream.
pub fn decode_all(schema: &Schema, buffer: &[u8]) -> DecodeOutcome {
    let mut outcome = DecodeOutcome::default();
    let mut remaining = buffer;

    while !remaining.is_empty() {
        let before = remaining.len();
        let mut reader = remaining;

        match apache_avro::from_avro_datum(schema, &mut reader, None) {
            Ok(datum) if reader.len() < before => {
                outcome.records.push(Value::from(datum));
                remaining = reader;
            }
            Ok(_) => {
                tracing::debug!(left = before, "Decoded record consumed no bytes, stopping");
                outcome.discarded = before;
                break;
            }
            Err(e) => {
                tracing::debug!(
                    left = before,
                    decoded = outcome.records.len(),
                    error = %e,
                    "Stop decoding record stream"
                );
                outcome.discarded = before;
                break;
            }
        }
    }

    outcome
}
