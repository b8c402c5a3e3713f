//! Post-processing of completion output.
//!
//! The transform is deliberately crude: emphasis markers are stripped
//! character-by-character without parsing markdown structure, so a
//! legitimate `*` or `_` anywhere in the text is stripped too. That is
//! a documented limitation of the memo format, not a bug to fix here.

/// Heading that introduces the financial subsection of a memo.
pub const FINANCIAL_MARKER: &str = "Updated Financial Information:";

/// Bullet used for net-worth lines in the financial subsection.
const BULLET: &str = "\u{2022} ";

/// Cleans raw completion text for display and export.
///
/// Removes every `*` and `_`, then reformats the text after
/// [`FINANCIAL_MARKER`] (if present) as a block where blank lines are
/// dropped, lines mentioning "Net Worth" are bulleted, and every other
/// line is indented by two spaces. Without the marker, the text is
/// returned whitespace-trimmed and otherwise unchanged.
///
/// This is a pure function; equal inputs always produce equal outputs.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|&c| c != '*' && c != '_').collect();

    let Some(marker_at) = stripped.find(FINANCIAL_MARKER) else {
        return stripped.trim().to_string();
    };

    let before = stripped[..marker_at].trim();
    let financial = stripped[marker_at + FINANCIAL_MARKER.len()..].trim();

    let reformatted: Vec<String> = financial
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.contains("Net Worth") {
                format!("{BULLET}{line}")
            } else {
                format!("  {line}")
            }
        })
        .collect();

    format!(
        "{before}\n\n{FINANCIAL_MARKER}\n\n{}\n",
        reformatted.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_memo_reformatting() {
        let input = "Background.\n\nUpdated Financial Information:\nNet Worth: 100\nOther line";
        let expected =
            "Background.\n\nUpdated Financial Information:\n\n\u{2022} Net Worth: 100\n  Other line\n";
        assert_eq!(clean_text(input), expected);
    }

    #[test]
    fn test_strips_all_emphasis_markers() {
        let inputs = [
            "**Background** with _emphasis_ and snake_case_names",
            "*",
            "a*b_c",
            "Updated Financial Information:\n*Net Worth*: _1_",
        ];
        for input in inputs {
            let cleaned = clean_text(input);
            assert!(!cleaned.contains('*'), "asterisk survived in {cleaned:?}");
            assert!(!cleaned.contains('_'), "underscore survived in {cleaned:?}");
        }
    }

    #[test]
    fn test_no_marker_returns_trimmed_unchanged() {
        assert_eq!(clean_text("  plain memo text \n"), "plain memo text");
        assert_eq!(clean_text("line one\nline two"), "line one\nline two");
    }

    #[test]
    fn test_idempotent_without_marker() {
        let inputs = [
            "Simple **memo** body",
            "  padded\ninterior\n",
            "",
            "no financial section here",
        ];
        for input in inputs {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once);
        }
    }

    #[test]
    fn test_blank_lines_dropped_in_financial_block() {
        let input = "Intro\nUpdated Financial Information:\n\nNet Worth: 5\n\n\nTotal assets up";
        let cleaned = clean_text(input);
        assert_eq!(
            cleaned,
            "Intro\n\nUpdated Financial Information:\n\n\u{2022} Net Worth: 5\n  Total assets up\n"
        );
    }

    #[test]
    fn test_marker_with_empty_before_section() {
        let cleaned = clean_text("Updated Financial Information:\nNet Worth: 1");
        assert_eq!(
            cleaned,
            "\n\nUpdated Financial Information:\n\n\u{2022} Net Worth: 1\n"
        );
    }

    #[test]
    fn test_emphasis_stripped_before_marker_lookup() {
        // The marker is only found after the asterisks are removed
        let input = "**Updated Financial Information:**\nNet Worth: 7";
        let cleaned = clean_text(input);
        assert!(cleaned.contains("\u{2022} Net Worth: 7"));
    }

    #[test]
    fn test_deterministic() {
        let input = "Background\nUpdated Financial Information:\nNet Worth: 3";
        assert_eq!(clean_text(input), clean_text(input));
    }
}
