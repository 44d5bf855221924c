use serde::Serialize;

/// Greedy word wrap by character count.
///
/// Words are never split: a word longer than `max_chars` gets a line of its
/// own. Runs of whitespace collapse to a single space.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn advance_cursor(current_y: f32, line_height: f32, line_spacing: f32) -> f32 {
    current_y + line_height + line_spacing
}

/// Lines placed on the card, top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    /// `(line, baseline_y)` pairs.
    pub lines: Vec<(String, f32)>,
    /// Cursor after the last line.
    pub end_y: f32,
}

impl TextBlock {
    /// Stacks `lines` from `top`, advancing by `line_height + spacing` each.
    /// Baselines sit `ascent` below each line's top.
    pub fn flow(lines: Vec<String>, top: f32, ascent: f32, line_height: f32, spacing: f32) -> Self {
        let mut cursor = top;
        let mut placed = Vec::with_capacity(lines.len());
        for line in lines {
            placed.push((line, cursor + ascent));
            cursor = advance_cursor(cursor, line_height, spacing);
        }
        Self {
            lines: placed,
            end_y: cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Text of the effect block, or `None` when the card has no effect.
pub fn effect_text(effect: Option<&str>) -> Option<String> {
    effect
        .map(str::trim)
        .filter(|effect| !effect.is_empty())
        .map(|effect| format!("Effect: {effect}"))
}
