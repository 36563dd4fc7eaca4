use crate::error::{Result, TaskError};

/// The one placeholder a prompt template may contain.
const PLACEHOLDER: &str = "content";

/// Cut `content` to fit a `max_len` budget for the given template.
///
/// The budget is `max_len` minus the character count of the *unformatted*
/// template (placeholder text included), clamped at zero. A non-positive
/// `max_len` disables truncation. Lengths are counted in chars, not bytes.
pub fn truncate_content<'a>(content: &'a str, template: &str, max_len: i64) -> &'a str {
    if max_len <= 0 {
        return content;
    }
    let template_len = i64::try_from(template.chars().count()).unwrap_or(i64::MAX);
    let budget = usize::try_from(max_len.saturating_sub(template_len)).unwrap_or(0);
    match content.char_indices().nth(budget) {
        Some((end, _)) => &content[..end],
        None => content,
    }
}

/// Substitute `content` into every `{content}` placeholder of `template`.
///
/// The grammar is narrower than Python's `str.format`: `{{` and `}}` render
/// as literal braces, and `{content}` is the only field. Format specs and
/// conversions (`{content:.200}`, `{content!r}`), any other `{name}` and
/// unmatched braces are errors.
pub fn render(template: &str, content: &str) -> Result<String> {
    let mut out = String::with_capacity(template.len() + content.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(TaskError::Template(
                                "unmatched '{' in prompt".to_string(),
                            ));
                        }
                        Some(ch) => name.push(ch),
                    }
                }
                if let Some(rest) = name.strip_prefix(PLACEHOLDER)
                    && (rest.starts_with(':') || rest.starts_with('!'))
                {
                    return Err(TaskError::Template(format!(
                        "format specs and conversions are not supported: {{{name}}}"
                    )));
                }
                if name != PLACEHOLDER {
                    return Err(TaskError::Template(format!(
                        "unknown placeholder {{{name}}}, only {{{PLACEHOLDER}}} is supported"
                    )));
                }
                out.push_str(content);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(TaskError::Template(
                    "single '}' encountered in prompt".to_string(),
                ));
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
