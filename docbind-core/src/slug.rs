//! Identity generation for document graph nodes.
//!
//! A node's identity is a string key: an explicit `_id` attribute wins,
//! otherwise the model's key fields are slugified ("Picadilly Circus"
//! becomes "picadilly-circus"), otherwise a fresh UUID is generated.

use uuid::Uuid;

/// Converts arbitrary text into a lowercase, hyphen-separated slug.
///
/// Runs of non-alphanumeric characters collapse into a single hyphen and
/// leading/trailing hyphens are stripped, so `"Picadilly Circus"` slugs to
/// `"picadilly-circus"` and `"  Flat 4, King St.  "` to `"flat-4-king-st"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Generates a random identity for documents with no usable key fields.
pub(crate) fn generated_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_multi_word_values() {
        assert_eq!(slugify("Picadilly Circus"), "picadilly-circus");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(slugify("Flat 4, King St."), "flat-4-king-st");
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(slugify("  Sir  "), "sir");
    }

    #[test]
    fn empty_input_yields_empty_slug() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generated_id(), generated_id());
    }
}
