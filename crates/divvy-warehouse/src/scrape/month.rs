/// English month names as the source prints them, with their ordinal.
const MONTHS: [(&str, &str, u32); 12] = [
    ("jan", "january", 1),
    ("feb", "february", 2),
    ("mar", "march", 3),
    ("apr", "april", 4),
    ("may", "may", 5),
    ("jun", "june", 6),
    ("jul", "july", 7),
    ("aug", "august", 8),
    ("sep", "september", 9),
    ("oct", "october", 10),
    ("nov", "november", 11),
    ("dec", "december", 12),
];

/// Resolve a month token (`"Jan"`, `"january"`, `"Sept."`) to its ordinal, 1-12.
///
/// Matching ignores case and a trailing period. `None` is a parse failure for
/// the caller, never a row to skip.
pub fn resolve(token: &str) -> Option<u32> {
    let token = token.trim().trim_end_matches('.').to_ascii_lowercase();
    if token == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .find(|(abbr, full, _)| token == *abbr || token == *full)
        .map(|(_, _, ordinal)| *ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_resolve_to_ordinals() {
        let abbrs = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        for (i, abbr) in abbrs.iter().enumerate() {
            assert_eq!(resolve(abbr), Some(i as u32 + 1), "{abbr}");
        }
    }

    #[test]
    fn full_names_and_case_are_tolerated() {
        assert_eq!(resolve("JANUARY"), Some(1));
        assert_eq!(resolve("september"), Some(9));
        assert_eq!(resolve("Sept."), Some(9));
        assert_eq!(resolve("dEc"), Some(12));
    }

    #[test]
    fn unknown_tokens_are_not_found() {
        for token in ["Foo", "", "Ja", "13", "Janu", "Dividend"] {
            assert_eq!(resolve(token), None, "{token:?}");
        }
    }
}
