//! Author list splitting
//!
//! Publisher listings deliver authors as one delimited string: commas,
//! standalone "and", sometimes an ampersand, and an optional "others" tail
//! that some markups place first ("others, Name" has been observed in the
//! wild). Order is semantically meaningful, so splitting preserves the
//! left-to-right sequence and only the "others" sentinel is repositioned.

/// Sentinel author entry standing in for truncated author lists
pub const OTHERS: &str = "others";

/// Splits a delimited author string into ordered author names
///
/// Splits on commas, standalone "and", and "&". Tokens that are bare
/// initials ("J.", "A.-B.") are re-joined to the preceding surname so
/// "Smith, J., Doe, A." stays two authors. A "others" token is extracted
/// and appended as the final entry wherever it appeared.
pub fn split_authors(input: &str) -> Vec<String> {
    let prepared = input.replace(" and ", ", ").replace('&', ", ");

    let mut names: Vec<String> = Vec::new();
    let mut has_others = false;

    for part in prepared.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if part.eq_ignore_ascii_case(OTHERS) {
            has_others = true;
            continue;
        }

        if is_initials(part) {
            match names.last_mut() {
                Some(last) => {
                    last.push_str(", ");
                    last.push_str(part);
                }
                // Leading initials with no surname to attach to; keep as-is
                None => names.push(part.to_string()),
            }
        } else {
            names.push(part.to_string());
        }
    }

    if has_others {
        names.push(OTHERS.to_string());
    }

    names
}

/// Whether a token is a bare initials fragment rather than a name
///
/// Initials tokens contain only uppercase letters, dots, and hyphens, with
/// at most three letters ("J.", "A", "J.-P."). Anything with lowercase or
/// more letters is treated as a full name.
fn is_initials(token: &str) -> bool {
    let letters = token.chars().filter(|c| c.is_ascii_alphabetic()).count();
    letters >= 1
        && letters <= 3
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_separated_full_names() {
        assert_eq!(
            split_authors("Alice Zhang, Bob Li, Carol Stone"),
            vec!["Alice Zhang", "Bob Li", "Carol Stone"]
        );
    }

    #[test]
    fn test_and_separated_names() {
        assert_eq!(
            split_authors("Alice Zhang and Bob Li"),
            vec!["Alice Zhang", "Bob Li"]
        );
    }

    #[test]
    fn test_surname_initial_pairs_stay_joined() {
        assert_eq!(
            split_authors("Smith, J., Doe, A. and others"),
            vec!["Smith, J.", "Doe, A.", "others"]
        );
    }

    #[test]
    fn test_leading_others_moves_last() {
        assert_eq!(split_authors("others, Lee, K."), vec!["Lee, K.", "others"]);
    }

    #[test]
    fn test_trailing_and_others() {
        assert_eq!(
            split_authors("Alice Zhang and Bob Li and others"),
            vec!["Alice Zhang", "Bob Li", "others"]
        );
    }

    #[test]
    fn test_others_case_insensitive() {
        assert_eq!(split_authors("Alice Zhang and Others"), vec!["Alice Zhang", "others"]);
    }

    #[test]
    fn test_ampersand_delimiter() {
        assert_eq!(
            split_authors("Alice Zhang & Bob Li"),
            vec!["Alice Zhang", "Bob Li"]
        );
    }

    #[test]
    fn test_hyphenated_initials() {
        assert_eq!(
            split_authors("Dupont, J.-P., Meyer, K."),
            vec!["Dupont, J.-P.", "Meyer, K."]
        );
    }

    #[test]
    fn test_single_author() {
        assert_eq!(split_authors("Jane Doe"), vec!["Jane Doe"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_authors("").is_empty());
        assert!(split_authors("  ,  , ").is_empty());
    }

    #[test]
    fn test_only_others() {
        assert_eq!(split_authors("others"), vec!["others"]);
    }
}
