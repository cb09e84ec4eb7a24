/// Substring that marks an object as temporary and eligible for eviction.
pub const TEMP_MARKER: &str = "temp";

pub fn is_temp_key(key: &str) -> bool {
    key.contains(TEMP_MARKER)
}

/// Decodes a key as it appears in bucket notifications: `+` is a space and
/// `%xx` sequences are UTF-8 bytes. Invalid UTF-8 becomes U+FFFD.
pub fn decode_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// `bucket/key` value for a server-side copy request, key URL-encoded.
pub fn copy_source(bucket: &str, key: &str) -> String {
    format!("{bucket}/{}", urlencoding::encode(key))
}
