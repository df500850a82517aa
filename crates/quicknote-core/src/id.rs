use ulid::Ulid;

/// Generate a fresh opaque id.
///
/// The id is a ULID: a millisecond timestamp followed by 80 random bits,
/// rendered as lowercase Crockford base32. No central counter is needed.
pub fn generate_id() -> String {
    Ulid::new().to_string().to_lowercase()
}
