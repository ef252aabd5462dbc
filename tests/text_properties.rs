//! Property tests for normalization, escaping and fuzzy matching.

use proptest::prelude::*;
use vitae::text::{escape_strict, normalize, partial_ratio};

proptest! {
    #[test]
    fn normalize_is_idempotent(s in r"[a-zA-Z0-9 &%$#_{}|\\•.,'-]{0,40}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_drops_whitespace_and_case(s in "[a-zA-Z ]{0,40}") {
        let expected: String = s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
        prop_assert_eq!(normalize(&s), expected);
    }

    #[test]
    fn escaped_specials_are_always_preceded_by_backslash(s in "[a-z &%$#_]{0,40}") {
        let escaped = escape_strict(&s);
        let chars: Vec<char> = escaped.chars().collect();
        for (i, c) in chars.iter().enumerate() {
            if "&%$#_".contains(*c) {
                prop_assert!(i > 0 && chars[i - 1] == '\\', "unescaped {:?} in {:?}", c, escaped);
            }
        }
    }

    #[test]
    fn escape_leaves_ordinary_text_alone(s in "[a-eg-z0-9 .,]{0,40}") {
        prop_assert_eq!(escape_strict(&s), s);
    }

    #[test]
    fn partial_ratio_finds_embedded_needle(
        needle in "[a-z]{1,12}",
        before in "[a-z ]{0,20}",
        after in "[a-z ]{0,20}",
    ) {
        let hay = format!("{}{}{}", before, needle, after);
        prop_assert_eq!(partial_ratio(&needle, &hay), 100.0);
    }

    #[test]
    fn partial_ratio_is_bounded(a in "[a-z ]{0,20}", b in "[a-z ]{0,20}") {
        let score = partial_ratio(&a, &b);
        prop_assert!((0.0..=100.0).contains(&score));
    }
}
