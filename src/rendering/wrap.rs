//! Greedy word wrapping with mid-word splitting.
//!
//! The wrapper never touches a canvas: callers inject the width of a string
//! in the active font, which keeps it testable with plain closures.

/// Break `text` into at most `max_lines` lines no wider than `max_width`.
///
/// Words are accumulated greedily. A word that alone is wider than the box is
/// split into character chunks that fit; a chunk always holds at least one
/// character, so a single glyph wider than the box is emitted on its own line.
/// Lines past `max_lines` are dropped without any marker.
pub fn wrap<F>(text: &str, measure: F, max_width: f32, max_lines: usize) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines: Vec<String> = Vec::new();
    if max_lines == 0 {
        return lines;
    }

    let mut line = String::new();
    for word in text.split_whitespace() {
        if lines.len() >= max_lines {
            break;
        }

        if !line.is_empty() {
            let candidate = format!("{} {}", line, word);
            if measure(&candidate) <= max_width {
                line = candidate;
                continue;
            }
            lines.push(std::mem::take(&mut line));
            if lines.len() >= max_lines {
                break;
            }
        }

        if measure(word) <= max_width {
            line.push_str(word);
            continue;
        }

        let mut chunks = split_word(word, &measure, max_width);
        // The tail chunk stays open so following words can join it.
        let tail = chunks.pop().unwrap_or_default();
        for chunk in chunks {
            lines.push(chunk);
            if lines.len() >= max_lines {
                break;
            }
        }
        line = tail;
    }

    if !line.is_empty() && lines.len() < max_lines {
        lines.push(line);
    }
    lines.truncate(max_lines);
    lines
}

/// Split one word into chunks that each fit `max_width`, never emitting an
/// empty chunk.
fn split_word<F>(word: &str, measure: &F, max_width: f32) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    for ch in word.chars() {
        chunk.push(ch);
        if measure(&chunk) > max_width && chunk.chars().count() > 1 {
            chunk.pop();
            chunks.push(std::mem::take(&mut chunk));
            chunk.push(ch);
        }
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}
