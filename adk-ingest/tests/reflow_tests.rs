//! Property tests for cross-page reflow.

use adk_ingest::reflow;
use proptest::prelude::*;

/// Generate a page-like fragment: words with optional punctuation and padding.
fn arb_fragment() -> impl Strategy<Value = String> {
    "[ \\n]{0,2}[A-Za-z][a-z ,]{0,20}[.!?:;]?[ \\n]{0,2}"
}

fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// **Property 1: Reflow preserves text and order**
/// *For any* ordered list of fragments, concatenating the passages produced by
/// reflow SHALL yield the concatenation of the non-blank fragments, modulo
/// whitespace, and no passage SHALL be blank or carry surrounding whitespace.
mod prop_reflow_preserves_text {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn concatenation_matches_input(
            fragments in proptest::collection::vec(arb_fragment(), 0..30),
        ) {
            let passages = reflow(&fragments);

            let expected: String = fragments.iter().map(String::as_str).map(squash).collect();
            let actual: String = passages.iter().map(|p| squash(&p.text)).collect();
            prop_assert_eq!(actual, expected);

            for passage in &passages {
                prop_assert!(!passage.text.is_empty());
                prop_assert_eq!(passage.text.trim(), passage.text.as_str());
            }
        }

        #[test]
        fn never_more_passages_than_fragments(
            fragments in proptest::collection::vec(arb_fragment(), 0..30),
        ) {
            let non_blank = fragments.iter().filter(|f| !f.trim().is_empty()).count();
            prop_assert!(reflow(&fragments).len() <= non_blank);
        }
    }
}

/// **Property 2: Reflow boundaries**
/// *For any* single fragment, reflow SHALL return it trimmed as one passage,
/// and fragments that each end with terminal punctuation SHALL never merge.
mod prop_reflow_boundaries {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn single_fragment_is_one_trimmed_passage(fragment in arb_fragment()) {
            let passages = reflow([fragment.as_str()]);
            prop_assert_eq!(passages.len(), 1);
            prop_assert_eq!(passages[0].text.as_str(), fragment.trim());
        }

        #[test]
        fn terminated_fragments_are_never_merged(
            words in proptest::collection::vec("[a-z]{1,10}", 1..20),
        ) {
            let fragments: Vec<String> = words.iter().map(|w| format!("{w}.")).collect();
            let passages = reflow(&fragments);
            prop_assert_eq!(passages.len(), fragments.len());
        }
    }
}

#[test]
fn page_break_inside_sentence_is_joined() {
    let pages = [
        "Enrolment rose sharply in the",
        "northern districts during 2021.",
        "Retention remained flat",
        "across all regions;",
        "Dropout fell.",
    ];
    let texts: Vec<_> = reflow(pages).into_iter().map(|p| p.text).collect();
    assert_eq!(
        texts,
        [
            "Enrolment rose sharply in the northern districts during 2021.",
            "Retention remained flat across all regions;",
            "Dropout fell.",
        ]
    );
}
