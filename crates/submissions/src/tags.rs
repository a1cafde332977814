/// Bracketed tags at the start of a submission title, e.g.
/// `"[Testing][v2] Title"` gives `["Testing", "v2"]`.
///
/// Titles not starting with `[` have no tags. Only the first `]` after each
/// `[` closes a tag, and a trailing `[` without a `]` yields nothing.
#[must_use]
pub fn extract_tags(title: &str) -> Vec<String> {
    if !title.starts_with('[') {
        return Vec::new();
    }

    let mut tags = Vec::new();
    let mut open = 0;
    let mut closed = false;
    for (index, c) in title.char_indices() {
        match c {
            ']' => {
                if !closed {
                    tags.push(title[open + 1..index].to_string());
                }
                closed = true;
            },
            '[' => {
                closed = false;
                open = index;
            },
            _ => {},
        }
    }
    tags
}
