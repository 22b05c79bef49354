use crate::counter::Tally;

/// Chunk size used when the store splits a sequence payload.
pub const DEFAULT_CHUNK_SIZE: usize = 80;

/// Sequences containing any unknown base are not stored.
pub fn is_unknown(sequence: &str) -> bool {
    sequence.contains('N')
}

/// Returns the payload to store for a record's sequence, if any.
///
/// Every call is counted, including sequences that are filtered out.
pub fn extract_sequence(sequence: &str, sequences_added: &mut Tally) -> Option<String> {
    sequences_added.increment();
    (!is_unknown(sequence)).then(|| sequence.to_string())
}

/// Splits a payload into consecutive chunks of at most `chunk_size` bytes.
pub fn chunks(payload: &str, chunk_size: usize) -> impl Iterator<Item = &[u8]> {
    payload.as_bytes().chunks(chunk_size.max(1))
}
