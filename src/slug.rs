//! Slug, excerpt and reading time derivation
//!
//! Everything a post needs computed at publish time.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Maximum length of a derived slug
const MAX_SLUG_LENGTH: usize = 100;

/// Base slug when a title yields nothing usable
pub const FALLBACK_SLUG: &str = "untitled";

/// Maximum length of a derived excerpt
const MAX_EXCERPT_LENGTH: usize = 160;

/// Average reading speed used for the reading time estimate
const WORDS_PER_MINUTE: usize = 200;

/// Derive a URL-safe slug from a title
///
/// Lowercases, strips diacritics through NFD decomposition, collapses runs
/// of anything non-alphanumeric into single hyphens and caps the length.
/// Can come out empty for titles with no ASCII alphanumerics; callers fall
/// back to [`FALLBACK_SLUG`].
pub fn slugify(title: &str) -> String {
    let normalized = title
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>();

    let mut slug = String::with_capacity(normalized.len());
    let mut pending_hyphen = false;

    for c in normalized.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);

    slug.trim_end_matches('-').to_string()
}

/// Make a slug unique within a set of already taken slugs
///
/// Appends `-2`, `-3`, ... until the candidate is free. The suffix space is
/// unbounded and the taken set is finite, so this always terminates.
pub fn make_slug_unique(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    let mut suffix = 2;
    loop {
        let candidate = format!("{base}-{suffix}");

        if !taken.contains(&candidate) {
            return candidate;
        }

        suffix += 1;
    }
}

/// Strip anything that looks like markup tags from a text
fn strip_markup(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => plain.push(c),
            _ => {}
        }
    }

    plain
}

/// Estimate reading time in whole minutes
///
/// Word count over [`WORDS_PER_MINUTE`], rounded up, never less than a
/// minute.
pub fn reading_time(text: &str) -> i32 {
    let words = strip_markup(text).split_whitespace().count();

    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);

    i32::try_from(minutes).unwrap_or(i32::MAX)
}

/// Derive an excerpt from a body text
///
/// Strips markup, collapses whitespace and truncates to
/// [`MAX_EXCERPT_LENGTH`] characters. The cut prefers the last word
/// boundary, unless that boundary sits before 70% of the limit -- then the
/// word is split rather than losing a third of the excerpt.
pub fn excerpt(text: &str) -> String {
    let plain = strip_markup(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let chars = plain.chars().collect::<Vec<_>>();

    if chars.len() <= MAX_EXCERPT_LENGTH {
        return plain;
    }

    let truncated = &chars[..MAX_EXCERPT_LENGTH];
    let last_space = truncated.iter().rposition(|c| *c == ' ');

    #[allow(clippy::cast_precision_loss)]
    let word_boundary_cutoff = MAX_EXCERPT_LENGTH as f64 * 0.7;

    match last_space {
        Some(position) if position as f64 > word_boundary_cutoff => {
            let mut excerpt = truncated[..position].iter().collect::<String>();
            excerpt.push_str("...");
            excerpt
        }
        _ => {
            let mut excerpt = truncated.iter().collect::<String>();
            excerpt.push_str("...");
            excerpt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!("hello-world-2024", slugify("Hello, World! 2024"));
        assert_eq!("cafe-creme", slugify("Café crème"));
        assert_eq!("a-b-c", slugify("  a   b --- c  "));
        assert_eq!("", slugify("!!! ???"));
        assert_eq!("", slugify("안녕하세요"));
    }

    #[test]
    fn test_slugify_caps_length() {
        let title = "a".repeat(250);
        assert_eq!(100, slugify(&title).chars().count());
    }

    #[test]
    fn test_slugify_no_trailing_hyphen_after_cap() {
        // the cap lands exactly on the joining hyphen
        let title = format!("{} {}", "a".repeat(99), "tail");
        let slug = slugify(&title);

        assert!(!slug.ends_with('-'));
        assert_eq!("a".repeat(99), slug);
    }

    #[test]
    fn test_make_slug_unique() {
        let mut taken = HashSet::new();
        assert_eq!("hello-world-2024", make_slug_unique("hello-world-2024", &taken));

        taken.insert("hello-world-2024".to_string());
        assert_eq!("hello-world-2024-2", make_slug_unique("hello-world-2024", &taken));

        taken.insert("hello-world-2024-2".to_string());
        assert_eq!("hello-world-2024-3", make_slug_unique("hello-world-2024", &taken));
    }

    #[test]
    fn test_reading_time() {
        let four_hundred_words = vec!["word"; 400].join(" ");
        assert_eq!(2, reading_time(&four_hundred_words));

        let word_count_over_boundary = vec!["word"; 401].join(" ");
        assert_eq!(3, reading_time(&word_count_over_boundary));

        assert_eq!(1, reading_time("word"));
        assert_eq!(1, reading_time(""));
        assert_eq!(1, reading_time("<p></p>"));
    }

    #[test]
    fn test_reading_time_strips_markup() {
        let text = format!("<article>{}</article>", vec!["word"; 200].join(" "));
        assert_eq!(1, reading_time(&text));
    }

    #[test]
    fn test_excerpt_short_text_untouched() {
        assert_eq!("a short body", excerpt("a short body"));
    }

    #[test]
    fn test_excerpt_collapses_whitespace_and_markup() {
        assert_eq!("a short body", excerpt("<p>a\n  short\t body</p>"));
    }

    #[test]
    fn test_excerpt_cuts_at_word_boundary() {
        let body = vec!["word"; 40].join(" ");

        let excerpt = excerpt(&body);
        assert!(excerpt.chars().count() <= MAX_EXCERPT_LENGTH + 3);
        assert!(excerpt.ends_with("..."));
        assert!(!excerpt.trim_end_matches("...").ends_with("wor"));
        assert!(excerpt.trim_end_matches("...").ends_with("word"));
    }

    #[test]
    fn test_excerpt_hard_cut_without_early_space() {
        // single space at position 3, far before 70% of the limit
        let body = format!("one {}", "x".repeat(300));

        let excerpt = excerpt(&body);
        assert_eq!(MAX_EXCERPT_LENGTH + 3, excerpt.chars().count());
        assert!(excerpt.ends_with("..."));
    }
}
