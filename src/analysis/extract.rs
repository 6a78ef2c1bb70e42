//! Locating a JSON object inside free-form model output
//!
//! The reasoning service may wrap its answer in prose or markdown fences
//! despite instructions. `extract_json_object` returns the first top-level
//! brace-balanced block. If the model emits an example object before the real
//! answer, the example is what gets selected; callers treat a parse failure
//! of that block as malformed output rather than searching further.

/// First top-level `{ ... }` block in `raw`, braces inside strings ignored
///
/// Returns `None` when there is no `{` or the first block never closes.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&raw[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}
