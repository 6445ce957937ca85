// src/transform/rtf.rs - Rich-text reading and layout
//! Rich-text rendering.
//!
//! Reads the text-bearing subset of RTF (paragraph and line breaks, tabs,
//! font sizes, `\'hh` and `\uN` escapes, ignorable destinations) and lays it
//! out into lines no wider than the page. Glyph metrics are approximated
//! with a fixed average advance per point of font size, which is enough for
//! the job to size and place the surface.

use spoolprep_shared::{Charset, ElementKind};

use super::RtfLayout;
use crate::error::PrepareError;
use crate::output::{RenderedSurface, SurfaceLine};

const AVG_ADVANCE: f32 = 0.5;
const LINE_SPACING: f32 = 1.2;
const TAB_WIDTH: usize = 4;

// Destinations whose content never reaches the page.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl", "colortbl", "stylesheet", "info", "pict", "object", "header", "headerl", "headerr",
    "headerf", "footer", "footerl", "footerr", "footerf", "footnote", "listtable",
    "listoverridetable", "rsidtbl", "generator", "xmlnstbl", "themedata", "colorschememapping",
    "datastore", "latentstyles", "filetbl", "revtbl",
];

type Glyph = (char, f32);

pub fn render(source: &str, layout: &RtfLayout) -> Result<RenderedSurface, PrepareError> {
    let paragraphs = Reader::new(layout.default_font_size_pt).read(source)?;
    let mut lines = Vec::new();
    for paragraph in &paragraphs {
        wrap(paragraph, layout, &mut lines);
    }
    let width = lines.iter().map(|l| l.width_pt).fold(0.0f32, f32::max);
    let height: f32 = lines.iter().map(|l| l.font_size_pt * LINE_SPACING).sum();
    Ok(RenderedSurface {
        lines,
        width: width.ceil() as u32,
        height: height.ceil() as u32,
    })
}

fn invalid(reason: impl Into<String>) -> PrepareError {
    PrepareError::invalid_source(ElementKind::Rtf, reason)
}

#[derive(Debug, Clone, Copy)]
struct Group {
    skip: bool,
    font_size: f32,
    unicode_skip: usize,
}

struct Reader {
    default_font_size: f32,
    stack: Vec<Group>,
    codepage: Charset,
    pending_bytes: Vec<u8>,
    fallback_left: usize,
    paragraphs: Vec<Vec<Glyph>>,
    current: Vec<Glyph>,
}

impl Reader {
    fn new(default_font_size: f32) -> Self {
        Self {
            default_font_size,
            stack: Vec::new(),
            codepage: Charset::from(encoding_rs::WINDOWS_1252),
            pending_bytes: Vec::new(),
            fallback_left: 0,
            paragraphs: Vec::new(),
            current: Vec::new(),
        }
    }

    fn read(mut self, source: &str) -> Result<Vec<Vec<Glyph>>, PrepareError> {
        let body = source.trim_start();
        if !body.starts_with("{\\rtf") {
            return Err(invalid("missing {\\rtf header"));
        }
        let mut chars = body.chars().peekable();
        let mut closed = false;
        while let Some(c) = chars.next() {
            if c != '\\' || chars.peek() != Some(&'\'') {
                self.flush_bytes();
            }
            match c {
                '{' => {
                    self.fallback_left = 0;
                    let inherited = self.stack.last().copied().unwrap_or(Group {
                        skip: false,
                        font_size: self.default_font_size,
                        unicode_skip: 1,
                    });
                    self.stack.push(inherited);
                }
                '}' => {
                    // a \uN fallback never outlives its group
                    self.fallback_left = 0;
                    self.stack.pop().ok_or_else(|| invalid("unbalanced closing brace"))?;
                    if self.stack.is_empty() {
                        closed = true;
                        break;
                    }
                }
                '\\' => self.control(&mut chars)?,
                '\r' | '\n' => {}
                other => self.text(other),
            }
        }
        if !closed {
            return Err(invalid("document ends inside an open group"));
        }
        self.flush_bytes();
        self.paragraphs.push(std::mem::take(&mut self.current));
        while self.paragraphs.len() > 1 && self.paragraphs.last().is_some_and(|p| p.is_empty()) {
            self.paragraphs.pop();
        }
        Ok(self.paragraphs)
    }

    fn group(&mut self) -> Result<&mut Group, PrepareError> {
        self.stack.last_mut().ok_or_else(|| invalid("control word outside of a group"))
    }

    fn skipping(&self) -> bool {
        self.stack.last().is_some_and(|g| g.skip)
    }

    fn control(&mut self, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<(), PrepareError> {
        let Some(next) = chars.next() else {
            return Err(invalid("dangling backslash"));
        };
        match next {
            '\\' | '{' | '}' => self.text(next),
            '~' => self.text(' '),
            '_' => self.text('-'),
            '-' => {}
            '*' => self.group()?.skip = true,
            '\r' | '\n' => self.paragraph_break(),
            '\'' => {
                let hex: String = chars.by_ref().take(2).collect();
                let byte = u8::from_str_radix(&hex, 16).map_err(|_| invalid(format!("bad hex escape \\'{}", hex)))?;
                if self.fallback_left > 0 {
                    self.fallback_left -= 1;
                } else if !self.skipping() {
                    self.pending_bytes.push(byte);
                }
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                let mut digits = String::new();
                if chars.peek() == Some(&'-') {
                    digits.push('-');
                    chars.next();
                }
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    digits.push(c);
                    chars.next();
                }
                if chars.peek() == Some(&' ') {
                    chars.next();
                }
                let param = digits.parse::<i32>().ok();
                // A control word ends any pending \uN fallback.
                self.fallback_left = 0;
                self.word(&word, param)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn word(&mut self, word: &str, param: Option<i32>) -> Result<(), PrepareError> {
        if SKIPPED_DESTINATIONS.contains(&word) {
            self.group()?.skip = true;
            return Ok(());
        }
        match word {
            "par" | "line" | "sect" | "page" | "row" => self.paragraph_break(),
            "tab" | "cell" => {
                for _ in 0..TAB_WIDTH {
                    self.text(' ');
                }
            }
            "fs" => {
                let half_points = param.unwrap_or(24).max(1);
                self.group()?.font_size = half_points as f32 / 2.0;
            }
            "plain" => {
                let default = self.default_font_size;
                self.group()?.font_size = default;
            }
            "uc" => self.group()?.unicode_skip = param.unwrap_or(1).max(0) as usize,
            "u" => {
                let code = param.unwrap_or(0);
                let code = if code < 0 { code + 65536 } else { code };
                if !self.skipping() {
                    if let Some(ch) = char::from_u32(code as u32) {
                        self.push(ch);
                    }
                }
                self.fallback_left = self.stack.last().map_or(1, |g| g.unicode_skip);
            }
            "ansicpg" => {
                if let Some(page) = param {
                    if let Some(charset) =
                        Charset::for_label(&format!("windows-{}", page)).or_else(|| Charset::for_label(&format!("cp{}", page)))
                    {
                        self.codepage = charset;
                    }
                }
            }
            "emdash" => self.text('\u{2014}'),
            "endash" => self.text('\u{2013}'),
            "bullet" => self.text('\u{2022}'),
            "lquote" => self.text('\u{2018}'),
            "rquote" => self.text('\u{2019}'),
            "ldblquote" => self.text('\u{201C}'),
            "rdblquote" => self.text('\u{201D}'),
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, c: char) {
        if self.fallback_left > 0 {
            self.fallback_left -= 1;
            return;
        }
        if !self.skipping() {
            self.push(c);
        }
    }

    fn push(&mut self, c: char) {
        let size = self.stack.last().map_or(self.default_font_size, |g| g.font_size);
        self.current.push((c, size));
    }

    fn paragraph_break(&mut self) {
        if !self.skipping() {
            self.paragraphs.push(std::mem::take(&mut self.current));
        }
    }

    fn flush_bytes(&mut self) {
        if self.pending_bytes.is_empty() {
            return;
        }
        let bytes = std::mem::take(&mut self.pending_bytes);
        let (decoded, _) = self.codepage.encoding().decode_without_bom_handling(&bytes);
        for c in decoded.chars() {
            self.push(c);
        }
    }
}

fn advance(glyph: &Glyph) -> f32 {
    glyph.1 * AVG_ADVANCE
}

/// Greedy word wrap of one paragraph. Words wider than the page are broken
/// between characters.
fn wrap(paragraph: &[Glyph], layout: &RtfLayout, lines: &mut Vec<SurfaceLine>) {
    let max_width = layout.page_width_pt;
    let mut line: Vec<Glyph> = Vec::new();
    let mut line_width = 0.0f32;

    if paragraph.is_empty() {
        lines.push(finish_line(&[], layout.default_font_size_pt));
        return;
    }

    for segment in segments(paragraph) {
        let visible_len = segment.iter().rposition(|g| g.0 != ' ').map_or(0, |i| i + 1);
        let visible: f32 = segment[..visible_len].iter().map(advance).sum();
        if !line.is_empty() && line_width + visible > max_width {
            lines.push(finish_line(&line, layout.default_font_size_pt));
            line.clear();
            line_width = 0.0;
        }
        if line.is_empty() && visible > max_width {
            for glyph in &segment[..visible_len] {
                if !line.is_empty() && line_width + advance(glyph) > max_width {
                    lines.push(finish_line(&line, layout.default_font_size_pt));
                    line.clear();
                    line_width = 0.0;
                }
                line.push(*glyph);
                line_width += advance(glyph);
            }
            continue;
        }
        line.extend_from_slice(segment);
        line_width += segment.iter().map(advance).sum::<f32>();
    }
    if !line.is_empty() {
        lines.push(finish_line(&line, layout.default_font_size_pt));
    }
}

/// Split into runs of non-space glyphs followed by their trailing spaces.
/// Leading spaces form their own segment.
fn segments(paragraph: &[Glyph]) -> Vec<&[Glyph]> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..paragraph.len() {
        if paragraph[i - 1].0 == ' ' && paragraph[i].0 != ' ' {
            out.push(&paragraph[start..i]);
            start = i;
        }
    }
    if start < paragraph.len() {
        out.push(&paragraph[start..]);
    }
    out
}

fn finish_line(glyphs: &[Glyph], default_font_size: f32) -> SurfaceLine {
    let end = glyphs.iter().rposition(|g| g.0 != ' ').map_or(0, |i| i + 1);
    let glyphs = &glyphs[..end];
    let font_size_pt = if glyphs.is_empty() {
        default_font_size
    } else {
        glyphs.iter().map(|g| g.1).fold(0.0f32, f32::max)
    };
    SurfaceLine {
        text: glyphs.iter().map(|g| g.0).collect(),
        font_size_pt,
        width_pt: glyphs.iter().map(advance).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: f32) -> RtfLayout {
        RtfLayout {
            page_width_pt: width,
            default_font_size_pt: 12.0,
        }
    }

    #[test]
    fn extracts_text_and_skips_tables() {
        let rtf = r"{\rtf1\ansi{\fonttbl{\f0 Arial;}}{\colortbl;\red0\green0\blue0;}\f0 Hello\par World}";
        let surface = render(rtf, &layout(576.0)).unwrap();
        assert_eq!(surface.text(), "Hello\nWorld");
        // 5 glyphs * 12pt * 0.5
        assert_eq!(surface.width, 30);
        // two 12pt lines at 1.2 spacing
        assert_eq!(surface.height, 29);
    }

    #[test]
    fn font_size_drives_line_metrics() {
        let surface = render(r"{\rtf1 {\fs48 Big}\par small}", &layout(576.0)).unwrap();
        assert_eq!(surface.lines[0].font_size_pt, 24.0);
        assert_eq!(surface.lines[0].width_pt, 36.0);
        assert_eq!(surface.lines[1].font_size_pt, 12.0);
    }

    #[test]
    fn escapes_and_unicode() {
        let rtf = r"{\rtf1\ansi\ansicpg1252 caf\'e9 \u8364? \{x\}\~y}";
        let surface = render(rtf, &layout(576.0)).unwrap();
        assert_eq!(surface.text(), "caf\u{e9} \u{20ac} {x} y");
    }

    #[test]
    fn unicode_fallback_stops_at_group_end() {
        let surface = render(r"{\rtf1 {\u8364}xyz}", &layout(576.0)).unwrap();
        assert_eq!(surface.text(), "\u{20ac}xyz");
    }

    #[test]
    fn unicode_fallback_stops_at_control_word() {
        let surface = render(r"{\rtf1\uc1 A\u8364\par B}", &layout(576.0)).unwrap();
        assert_eq!(surface.text(), "A\u{20ac}\nB");

        // the fallback is still skipped when it is plain text or a hex escape
        let surface = render(r"{\rtf1\uc1 A\u8364\'80B}", &layout(576.0)).unwrap();
        assert_eq!(surface.text(), "A\u{20ac}B");
    }

    #[test]
    fn ignorable_destinations_are_dropped() {
        let rtf = r"{\rtf1 {\*\generator Writer;}{\*\unknowndest junk}Body}";
        assert_eq!(render(rtf, &layout(576.0)).unwrap().text(), "Body");
    }

    #[test]
    fn wraps_at_page_width() {
        // each glyph is 6pt wide, so 60pt fits ten
        let surface = render(r"{\rtf1 alpha beta gamma}", &layout(60.0)).unwrap();
        assert_eq!(surface.text(), "alpha beta\ngamma");
        assert!(surface.width <= 60);

        let surface = render(r"{\rtf1 abcdefghijklmnop}", &layout(60.0)).unwrap();
        assert_eq!(surface.text(), "abcdefghij\nklmnop");
    }

    #[test]
    fn malformed_documents_are_rejected() {
        for rtf in [r"plain text", r"{\rtf1 never closed", r"{\rtf1 bad \'zz}"] {
            let err = render(rtf, &layout(576.0)).unwrap_err();
            assert!(matches!(err, PrepareError::InvalidSourceData { kind: ElementKind::Rtf, .. }), "{}", rtf);
        }
    }
}
