//! Metrics and encoding for the two standard Type 1 faces used in reports.
//!
//! Standard 14 fonts are not embedded, so widths come from the Adobe AFM
//! tables and text is encoded as WinAnsi.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
}

impl FontFace {
    /// Key of the face in the page resource dictionary.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
        }
    }

    fn ascii_widths(&self) -> &'static [u16; 95] {
        match self {
            FontFace::Regular => &HELVETICA_WIDTHS,
            FontFace::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

// Glyph widths for U+0020..=U+007E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn glyph_width(ch: char, face: FontFace) -> u16 {
    match ch {
        ' '..='~' => face.ascii_widths()[ch as usize - 0x20],
        '—' | '…' => 1000,
        '•' => 350,
        '‘' | '’' | '‚' => match face {
            FontFace::Regular => 222,
            FontFace::Bold => 278,
        },
        '“' | '”' | '„' => match face {
            FontFace::Regular => 333,
            FontFace::Bold => 500,
        },
        '\u{00A0}' => 278,
        _ => 556,
    }
}

/// Width of `text` in points when set in `face` at `size`.
pub fn text_width(text: &str, face: FontFace, size: f32) -> f32 {
    let units: u32 = text.chars().map(|ch| glyph_width(ch, face) as u32).sum();
    units as f32 * size / 1000.0
}

/// Encodes `text` as WinAnsi bytes; unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => ch as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap to `max_width`. Explicit `\n` always breaks, and a word
/// wider than the line is split by character.
pub fn wrap(text: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if text_width(&candidate, face, size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if text_width(word, face, size) <= max_width {
                line = word.to_string();
            } else {
                let mut pieces = split_long_word(word, face, size, max_width);
                line = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(line);
    }
    lines
}

fn split_long_word(word: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if text_width(&current, face, size) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    pieces.push(current);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(text_width("0", FontFace::Regular, 1000.0), 556.0);
        assert_eq!(text_width("il", FontFace::Regular, 10.0), 4.44);
        assert!(text_width("Região", FontFace::Bold, 12.0) > text_width("Região", FontFace::Regular, 12.0));
    }

    #[test]
    fn test_win_ansi_keeps_latin1_and_dashes() {
        assert_eq!(encode_win_ansi("Região"), vec![b'R', b'e', b'g', b'i', 0xE3, b'o']);
        assert_eq!(encode_win_ansi("a—b–c"), vec![b'a', 0x97, b'b', 0x96, b'c']);
        assert_eq!(encode_win_ansi("中"), vec![b'?']);
    }

    #[test]
    fn test_wrap_honours_newlines_and_width() {
        assert_eq!(wrap("LMR\n(mg/kg)", FontFace::Bold, 14.0, 500.0), vec!["LMR", "(mg/kg)"]);

        let lines = wrap("aaaa bbbb cccc", FontFace::Regular, 10.0, 50.0);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
        for line in &lines {
            assert!(text_width(line, FontFace::Regular, 10.0) <= 50.0);
        }
    }

    #[test]
    fn test_wrap_splits_words_wider_than_the_line() {
        let lines = wrap("0123456789", FontFace::Regular, 10.0, 20.0);
        assert_eq!(lines, vec!["012", "345", "678", "9"]);
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        assert_eq!(wrap("", FontFace::Regular, 12.0, 100.0), vec![String::new()]);
    }
}
