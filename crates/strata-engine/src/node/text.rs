//! Character-offset helpers. Offsets into text leaves count Unicode scalar values, so
//! every slice of a leaf goes through these instead of byte indexing.

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the character at `offset`, clamped to the end of the string.
pub fn byte_index(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map_or(s.len(), |(index, _)| index)
}

/// The characters in `[start, end)`.
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let from = byte_index(s, start);
    let to = byte_index(s, end.max(start));
    &s[from..to]
}

/// Split into the first `offset` characters and the rest.
pub fn split_at_char(s: &str, offset: usize) -> (&str, &str) {
    s.split_at(byte_index(s, offset))
}

/// Insert `insert` before the character at `offset`.
pub fn insert_at_char(s: &mut String, offset: usize, insert: &str) {
    let index = byte_index(s, offset);
    s.insert_str(index, insert);
}

/// Remove `count` characters starting at `offset`.
pub fn remove_chars(s: &mut String, offset: usize, count: usize) {
    let from = byte_index(s, offset);
    let to = byte_index(s, offset + count);
    s.replace_range(from..to, "");
}
