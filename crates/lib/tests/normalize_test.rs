//! # Normalizer Tests
//!
//! Verifies character folding, filler removal, validation, truncation,
//! idempotence, and the paraphrase invariance of the canonical form.

mod common;

use crate::common::setup_tracing;
use porseman::normalize::normalize;
use porseman::AgentError;

#[test]
fn test_folds_arabic_characters_to_persian() {
    setup_tracing();

    // Arabic yeh and kaf in the input, Persian code points in the output.
    let result = normalize("قيمت كالا", 1000).expect("normalize failed");
    assert_eq!(result.normalized, "قیمت کالا");
}

#[test]
fn test_removes_fillers_and_collapses_whitespace() {
    setup_tracing();

    let result = normalize("لطفاً   قیمت   را بگویید!!", 1000).expect("normalize failed");
    // The filler word (with its diacritic folded away) is gone, punctuation
    // runs collapse, and whitespace is single-spaced.
    assert_eq!(result.normalized, "قیمت را بگویید");
}

#[test]
fn test_question_marks_survive_normalization() {
    setup_tracing();

    let result = normalize("قیمت چند است؟؟؟", 1000).expect("normalize failed");
    assert_eq!(result.normalized, "قیمت چند است؟");
}

#[test]
fn test_empty_input_is_rejected() {
    setup_tracing();

    let error = normalize("   \t  ", 1000).expect_err("whitespace-only input must fail");
    assert!(
        matches!(error, AgentError::Validation(_)),
        "Expected a validation error, got {error:?}"
    );
}

#[test]
fn test_overlong_input_is_truncated_not_rejected() {
    setup_tracing();

    let input = "چطور ".repeat(100);
    let result = normalize(&input, 20).expect("truncation must not reject");
    assert!(result.truncated);
    assert!(result.normalized.chars().count() <= 20);
}

#[test]
fn test_normalization_is_idempotent() {
    setup_tracing();

    let first = normalize("لطفاً قيمت محصولات چقدر است؟", 1000).expect("normalize failed");
    let second = normalize(&first.normalized, 1000).expect("re-normalize failed");

    assert_eq!(first.normalized, second.normalized);
    assert_eq!(first.canonical, second.canonical);
}

#[test]
fn test_paraphrases_share_the_canonical_form() {
    setup_tracing();

    let a = normalize("قیمت چقدر است؟", 1000).expect("normalize failed");
    let b = normalize("چقدر قیمت دارد؟", 1000).expect("normalize failed");

    assert!(!a.canonical.is_empty());
    assert_eq!(
        a.canonical, b.canonical,
        "word-order paraphrases must converge to one canonical string"
    );
}

#[test]
fn test_colloquial_forms_fold_into_canonical() {
    setup_tracing();

    let colloquial = normalize("هزینه محصولات چقدره؟", 1000).expect("normalize failed");
    let formal = normalize("هزینه محصولات چقدر است؟", 1000).expect("normalize failed");

    assert_eq!(colloquial.canonical, formal.canonical);
}
