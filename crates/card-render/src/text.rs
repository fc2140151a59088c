//! Text layout for text nodes.
//!
//! Greedy word wrap inside the node's width, with alignment, line height,
//! letter spacing, decoration lines and an optional drop shadow. Glyph
//! shaping belongs to the host; layout only needs advance widths, which come
//! from a `TextMeasure`.

use card_core::{Shadow, TextAlign, TextDecoration, TextProps};
use kurbo::{Line, Point};

/// Advance-width source for layout.
pub trait TextMeasure {
    /// Advance of one character, without letter spacing.
    fn advance(&self, ch: char, props: &TextProps) -> f64;

    /// Width of a run including letter spacing after every character.
    fn run_width(&self, run: &str, props: &TextProps) -> f64 {
        run.chars()
            .map(|c| self.advance(c, props) + props.letter_spacing as f64)
            .sum()
    }
}

/// Width classes scaled by font size. Good enough for wrapping and overlay
/// sizing when no font backend is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMetrics;

impl TextMeasure for ApproxMetrics {
    fn advance(&self, ch: char, props: &TextProps) -> f64 {
        let em = props.font_size as f64;
        let factor = match ch {
            ' ' => 0.28,
            'i' | 'l' | 'j' | '.' | ',' | '\'' | '!' | '|' | ':' | ';' => 0.28,
            'f' | 't' | 'r' | 'I' => 0.38,
            'm' | 'w' | 'M' | 'W' => 0.85,
            c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.64,
            _ => 0.55,
        };
        let weight = if props.font_style.bold { 1.06 } else { 1.0 };
        em * factor * weight
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Left edge of the line inside the node box.
    pub x: f64,
    pub baseline: f64,
    pub width: f64,
    /// Extra advance added to each space (justified lines only).
    pub word_gap: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<TextLine>,
    pub line_height: f64,
    /// Total laid-out height: line count × line height.
    pub height: f64,
    pub decorations: Vec<Line>,
    pub decoration_thickness: f64,
    pub shadow: Option<Shadow>,
}

impl TextLayout {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Lay out `props.text` inside a box `box_width` wide.
pub fn layout_text(props: &TextProps, box_width: f64, measure: &dyn TextMeasure) -> TextLayout {
    let font_size = props.font_size.max(1.0) as f64;
    let line_height = font_size * props.line_height.max(0.1) as f64;
    let box_width = box_width.max(0.0);

    let mut raw: Vec<(String, bool)> = Vec::new();
    for paragraph in props.text.split('\n') {
        let wrapped = wrap_paragraph(paragraph, box_width, props, measure);
        let last = wrapped.len().saturating_sub(1);
        raw.extend(wrapped.into_iter().enumerate().map(|(i, l)| (l, i == last)));
    }

    let ascent = font_size * 0.8;
    let half_leading = (line_height - font_size) / 2.0;
    let mut lines = Vec::with_capacity(raw.len());
    let mut decorations = Vec::new();

    for (i, (text, paragraph_end)) in raw.into_iter().enumerate() {
        let width = measure.run_width(&text, props);
        let spaces = text.chars().filter(|c| *c == ' ').count();
        let (x, word_gap) = match props.align {
            TextAlign::Left => (0.0, 0.0),
            TextAlign::Center => ((box_width - width) / 2.0, 0.0),
            TextAlign::Right => (box_width - width, 0.0),
            TextAlign::Justify if !paragraph_end && spaces > 0 => {
                (0.0, ((box_width - width) / spaces as f64).max(0.0))
            }
            TextAlign::Justify => (0.0, 0.0),
        };
        let baseline = i as f64 * line_height + half_leading + ascent;
        let painted = width + word_gap * spaces as f64;

        let decoration_y = match props.decoration {
            TextDecoration::None => None,
            TextDecoration::Underline => Some(baseline + font_size * 0.1),
            TextDecoration::LineThrough => Some(baseline - font_size * 0.3),
        };
        if let Some(y) = decoration_y
            && painted > 0.0
        {
            decorations.push(Line::new(Point::new(x, y), Point::new(x + painted, y)));
        }

        lines.push(TextLine {
            text,
            x,
            baseline,
            width,
            word_gap,
        });
    }

    let height = lines.len() as f64 * line_height;
    TextLayout {
        lines,
        line_height,
        height,
        decorations,
        decoration_thickness: (font_size / 15.0).max(1.0),
        shadow: props.shadow,
    }
}

fn wrap_paragraph(
    paragraph: &str,
    box_width: f64,
    props: &TextProps,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    if paragraph.is_empty() {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in paragraph.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || measure.run_width(&candidate, props) <= box_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }

        // A single word wider than the box breaks between characters.
        while measure.run_width(&current, props) > box_width && current.chars().count() > 1 {
            let mut head = String::new();
            for ch in current.chars() {
                head.push(ch);
                if measure.run_width(&head, props) > box_width {
                    head.pop();
                    break;
                }
            }
            if head.is_empty() {
                head = current.chars().take(1).collect();
            }
            let rest = current[head.len()..].to_string();
            lines.push(head);
            current = rest;
        }
    }
    lines.push(current);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Every character is 10 units wide.
    struct Mono;

    impl TextMeasure for Mono {
        fn advance(&self, _ch: char, _props: &TextProps) -> f64 {
            10.0
        }
    }

    fn props(text: &str) -> TextProps {
        TextProps {
            text: text.into(),
            font_size: 20.0,
            line_height: 1.5,
            ..TextProps::default()
        }
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let layout = layout_text(&props("hello big world"), 95.0, &Mono);
        let texts: Vec<_> = layout.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["hello big", "world"]);
        assert_eq!(layout.height, 60.0);
    }

    #[test]
    fn explicit_line_breaks_are_kept() {
        let layout = layout_text(&props("a\n\nb"), 500.0, &Mono);
        assert_eq!(layout.line_count(), 3);
        assert_eq!(layout.lines[1].text, "");
    }

    #[test]
    fn long_words_break_between_characters() {
        let layout = layout_text(&props("abcdefgh"), 35.0, &Mono);
        let texts: Vec<_> = layout.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn alignment_offsets() {
        let mut p = props("abcd");
        p.align = TextAlign::Center;
        assert_eq!(layout_text(&p, 100.0, &Mono).lines[0].x, 30.0);
        p.align = TextAlign::Right;
        assert_eq!(layout_text(&p, 100.0, &Mono).lines[0].x, 60.0);
    }

    #[test]
    fn justify_spreads_all_but_last_line() {
        let mut p = props("aa bb cc dd");
        p.align = TextAlign::Justify;
        let layout = layout_text(&p, 70.0, &Mono);
        assert_eq!(layout.lines[0].text, "aa bb");
        assert_eq!(layout.lines[0].word_gap, 20.0);
        assert_eq!(layout.lines[1].word_gap, 0.0);
    }

    #[test]
    fn letter_spacing_widens_runs() {
        let mut p = props("abc");
        p.letter_spacing = 2.0;
        assert_eq!(layout_text(&p, 500.0, &Mono).lines[0].width, 36.0);
    }

    #[test]
    fn underline_sits_below_baseline() {
        let mut p = props("abc");
        p.decoration = TextDecoration::Underline;
        let layout = layout_text(&p, 500.0, &Mono);
        let line = layout.decorations[0];
        assert!(line.p0.y > layout.lines[0].baseline);
        assert_eq!(line.p1.x - line.p0.x, 30.0);
    }
}
