use serde::{Deserialize, Deserializer};

/// Normalizes free text typed by the user by stripping surrounding
/// whitespace and composing it into Unicode Normalization Form C.
///
/// ```
/// use proofing::normalization::normalize_text;
/// assert_eq!(normalize_text(" hard T\u{301} "), "hard T\u{301}");
/// assert_eq!(normalize_text(" cafe\u{301} "), "caf\u{e9}");
/// ```
pub fn normalize_text(text: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    text.as_ref().trim().nfc().collect()
}

/// Deserializes a `String` after running it through `normalize_text`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    let s = String::deserialize(deserializer)?;
    Ok(normalize_text(s))
}

/// Deserializes an optional `String` after running it through
/// `normalize_text`, treating `null` as empty.
pub fn deserialize_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    let o = Option::<String>::deserialize(deserializer)?;
    Ok(o.map(normalize_text).unwrap_or_default())
}
