//! Short hex checksum used for the `tasks` array and the sequence counter
//! (spec §3: "a short hex digest of the tasks array content").

/// Number of hex characters kept from the full BLAKE3 digest.
const CHECKSUM_LEN: usize = 16;

/// Compute a short, stable checksum of `bytes`.
#[must_use]
pub fn compute(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hash.to_hex()[..CHECKSUM_LEN].to_string()
}

/// Compute the checksum of a serializable value using its RFC 8785
/// canonical JSON representation so the checksum is stable regardless of
/// field insertion order.
pub fn compute_of<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json_canonicalizer::to_vec(value).map_err(serde::ser::Error::custom)?;
    Ok(compute(&bytes))
}
