//! LIKE pattern helpers.
//!
//! User input embedded into a LIKE pattern is escaped so `%`, `_` and `\`
//! match literally under Postgres' default escape character.

pub(crate) fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Split a raw list value on `,`, keeping empty elements so callers can reject them.
pub(crate) fn split_list(input: &str) -> impl Iterator<Item = &str> {
    input.split(',')
}
