//! Naming-convention transformation.
//!
//! API field names arrive in camelCase (`createdAt`, `authorId`); the
//! underlying columns use snake_case (`created_at`, `author_id`). Every
//! identifier that is spliced into generated SQL (filter keys, selected
//! columns, the vector column itself) passes through [`column_name`].
//!
//! The transform also sanitizes: anything that is not an ASCII letter, digit,
//! or underscore is dropped or folded into a separator, so the output is
//! always a safe SQL identifier regardless of what the caller supplied.
//! Identifiers are never interpolated from caller-controlled strings without
//! passing through here.

/// Convert an API field name to its underlying column identifier.
///
/// Handles camelCase, PascalCase, kebab-case, and space-separated input:
///
/// - `createdAt` → `created_at`
/// - `HTMLContent` → `html_content`
/// - `author-id` → `author_id`
/// - `display name` → `display_name`
///
/// The result contains only `[a-z0-9_]`, never starts with a digit, and is
/// never empty.
pub fn column_name(field: &str) -> String {
    let chars: Vec<char> = field.chars().collect();
    let mut out = String::with_capacity(field.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower_or_digit = i > 0
                && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
            // Acronym boundary: "HTMLContent" breaks between "HTML" and "Content"
            let acronym_end = i > 0
                && chars[i - 1].is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());

            if (prev_lower_or_digit || acronym_end) && !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if matches!(c, '-' | ' ' | '.' | '_') {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
        }
        // Anything else (quotes, semicolons, non-ASCII) is dropped.
    }

    let trimmed = out.trim_end_matches('_');
    let mut result = trimmed.to_string();

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    if result.is_empty() {
        result.push('_');
    }
    result
}
