const UNIT_WORDS: [&str; 4] = ["flat", "apartment", "apt", "unit"];

/// Canonical form used to pair EPC certificates with recorded sales.
///
/// Lowercases, strips BOM/zero-width characters and punctuation, drops unit
/// words such as "flat" and collapses whitespace.
pub(crate) fn normalize_address(value: &str) -> String {
    let cleaned: String = value
        .replace(['\u{feff}', '\u{200b}'], "")
        .to_lowercase()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch.is_whitespace() || ch == '_' {
                ch
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !UNIT_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_unit_words_and_punctuation() {
        assert_eq!(
            normalize_address("\u{feff}Flat 2,  14 Lord Street"),
            "2 14 lord street"
        );
        assert_eq!(
            normalize_address("Apartment 2 14 LORD STREET."),
            "2 14 lord street"
        );
    }

    #[test]
    fn keeps_words_containing_unit_terms() {
        assert_eq!(normalize_address("Flatt House, Unity Road"), "flatt house unity road");
    }
}
