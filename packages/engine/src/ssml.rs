//! Lightweight SSML processor.
//!
//! Pure and synchronous: generates single-voice markup units, extracts
//! the document language, and flattens a unit into plain text plus a
//! sequence of offset-addressed [`Mark`]s. No I/O, no allocs beyond the
//! output buffers.

use read_aloud_domain::{Mark, MarkupUnit};

/// Result of flattening one markup unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUnit {
    /// The unit's flattened plain-text representation.
    pub plain_text: String,
    /// Marks in document order, strictly increasing by offset.
    pub marks: Vec<Mark>,
    /// Document-level language of the unit.
    pub language: String,
}

/// ISO 639-2/B and /T three-letter codes to two-letter codes.
const LANG_3_TO_2: &[(&str, &str)] = &[
    ("eng", "en"),
    ("fra", "fr"),
    ("fre", "fr"),
    ("deu", "de"),
    ("ger", "de"),
    ("spa", "es"),
    ("ita", "it"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("zho", "zh"),
    ("chi", "zh"),
    ("rus", "ru"),
    ("por", "pt"),
    ("nld", "nl"),
    ("dut", "nl"),
    ("ara", "ar"),
    ("tur", "tr"),
    ("pol", "pl"),
    ("swe", "sv"),
];

/// Wrap plain text in a single-voice, single-prosody markup unit.
///
/// A leading `<break .../>` directive in `text` is stripped to avoid a
/// duplicate pause when the caller already inserts one.
pub fn generate(lang: &str, text: &str, voice_id: &str, rate: f32) -> MarkupUnit {
    let text = strip_leading_break(text);
    MarkupUnit::new(format!(
        "<speak xml:lang=\"{lang}\"><voice name=\"{voice_id}\"><prosody rate=\"{rate}\">\
         <mark name=\"0\"/>{}</prosody></voice></speak>",
        escape_text(text),
    ))
}

/// Extract the document-level language of a unit.
///
/// A successfully parsed `xml:lang` on the root tag wins unless it
/// conflicts with `primary_lang_hint`, in which case the hint wins.
/// With neither available, the language is inferred from Unicode script
/// ranges present in the unit, defaulting to `"en"`. Never fails.
pub fn parse_language(unit: &MarkupUnit, primary_lang_hint: Option<&str>) -> String {
    let parsed = root_lang(unit.as_str()).map(normalize_lang);
    match (parsed, primary_lang_hint) {
        (Some(lang), None) => lang,
        (Some(lang), Some(hint)) if primary(&lang) == primary(hint) => lang,
        (_, Some(hint)) => hint.to_owned(),
        (None, None) => infer_script(unit.as_str()).unwrap_or("en").to_owned(),
    }
}

/// Flatten a unit into plain text and its marks.
///
/// Single pass over the unit body with a tag/text tokenizer: nested
/// `<lang>` tags push/pop a language stack (underflow falls back to the
/// unit's top-level language), `<mark name=".."/>` sets the active mark,
/// and cleaned text runs accumulate into `plain_text`, extending or
/// starting a [`Mark`] whenever text arrives while a mark is active.
/// Text outside any mark still contributes to `plain_text`.
pub fn parse_marks(unit: &MarkupUnit, primary_lang_hint: Option<&str>) -> ParsedUnit {
    let language = parse_language(unit, primary_lang_hint);
    let mut scanner = Scanner {
        plain_text: String::new(),
        char_len: 0,
        marks: Vec::new(),
        lang_stack: Vec::new(),
        active_mark: None,
        top_lang: language.clone(),
    };

    let mut rest = strip_wrapper(unit.as_str());
    while !rest.is_empty() {
        match rest.find('<') {
            Some(tag_start) => {
                if tag_start > 0 {
                    scanner.text(&rest[..tag_start]);
                }
                match rest[tag_start..].find('>') {
                    Some(rel_end) => {
                        let tag_end = tag_start + rel_end;
                        scanner.tag(&rest[tag_start..=tag_end]);
                        rest = &rest[tag_end + 1..];
                    }
                    None => {
                        // Unterminated tag: nothing more to scan.
                        break;
                    }
                }
            }
            None => {
                scanner.text(rest);
                break;
            }
        }
    }

    ParsedUnit {
        plain_text: scanner.plain_text,
        marks: scanner.marks,
        language,
    }
}

/// Binary search for the last mark whose `offset <= char_index`.
pub fn find_mark_at(char_index: usize, marks: &[Mark]) -> Option<&Mark> {
    let idx = marks.partition_point(|m| m.offset <= char_index);
    if idx == 0 { None } else { Some(&marks[idx - 1]) }
}

struct Scanner {
    plain_text: String,
    char_len: usize,
    marks: Vec<Mark>,
    lang_stack: Vec<String>,
    active_mark: Option<String>,
    top_lang: String,
}

impl Scanner {
    fn text(&mut self, run: &str) {
        let cleaned: String = run
            .chars()
            .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
            .collect();
        let cleaned = decode_entities(&cleaned);
        let text = if self.plain_text.is_empty() {
            cleaned.trim_start()
        } else {
            cleaned.as_str()
        };
        if text.is_empty() {
            return;
        }

        let offset = self.char_len;
        self.plain_text.push_str(text);
        self.char_len += text.chars().count();

        let Some(name) = self.active_mark.clone() else {
            return;
        };
        match self.marks.last_mut() {
            // Consecutive runs under the same active mark extend it.
            Some(last) if last.name == name => last.text.push_str(text),
            _ => {
                let lang = self
                    .lang_stack
                    .last()
                    .cloned()
                    .unwrap_or_else(|| self.top_lang.clone());
                self.marks.push(Mark::new(offset, name, text, lang));
            }
        }
    }

    fn tag(&mut self, tag: &str) {
        if let Some(closing) = tag.strip_prefix("</") {
            if tag_name(closing) == "lang" {
                self.lang_stack.pop();
            }
            return;
        }
        let inner = tag.trim_start_matches('<');
        match tag_name(inner) {
            "lang" => {
                let lang = attr(tag, "xml:lang")
                    .map(normalize_lang)
                    .unwrap_or_else(|| self.top_lang.clone());
                self.lang_stack.push(lang);
            }
            "mark" => {
                if let Some(name) = attr(tag, "name") {
                    self.active_mark = Some(name.to_owned());
                }
            }
            _ => {}
        }
    }
}

fn tag_name(inner: &str) -> &str {
    inner
        .split(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or("")
}

/// Extract an attribute value from a raw tag string.
fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    for quote in ['"', '\''] {
        let needle = format!("{name}={quote}");
        if let Some(start) = tag.find(&needle) {
            let rest = &tag[start + needle.len()..];
            if let Some(end) = rest.find(quote) {
                return Some(&rest[..end]);
            }
        }
    }
    None
}

fn root_lang(unit: &str) -> Option<&str> {
    let start = unit.find("<speak")?;
    let end = unit[start..].find('>')?;
    attr(&unit[start..=start + end], "xml:lang").filter(|l| !l.is_empty())
}

/// Strip the outer `<speak>` wrapper, returning the body to scan.
fn strip_wrapper(unit: &str) -> &str {
    let Some(start) = unit.find("<speak") else {
        return unit;
    };
    let Some(open_end) = unit[start..].find('>') else {
        return unit;
    };
    let body_start = start + open_end + 1;
    let body_end = unit.rfind("</speak>").unwrap_or(unit.len());
    if body_end <= body_start {
        return "";
    }
    &unit[body_start..body_end]
}

/// Normalize a language tag: lowercase primary subtag, 3-letter codes
/// mapped to 2-letter codes, region subtag preserved as given.
fn normalize_lang(tag: &str) -> String {
    let mut parts = tag.split(['-', '_']);
    let raw = parts.next().unwrap_or(tag).to_ascii_lowercase();
    let primary = LANG_3_TO_2
        .iter()
        .find(|(three, _)| *three == raw)
        .map(|(_, two)| (*two).to_owned())
        .unwrap_or(raw);
    match parts.next() {
        Some(region) if !region.is_empty() => format!("{primary}-{region}"),
        _ => primary,
    }
}

fn primary(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .to_ascii_lowercase()
}

/// Infer a language from the Unicode script blocks present in the unit.
///
/// Checked in fixed precedence: CJK ideographs, Hangul, Arabic,
/// Cyrillic. Has final say over a generic "en" default only.
fn infer_script(unit: &str) -> Option<&'static str> {
    let mut cjk = false;
    let mut hangul = false;
    let mut arabic = false;
    let mut cyrillic = false;
    for c in unit.chars() {
        match c as u32 {
            0x4E00..=0x9FFF | 0x3400..=0x4DBF => cjk = true,
            0xAC00..=0xD7AF | 0x1100..=0x11FF => hangul = true,
            0x0600..=0x06FF => arabic = true,
            0x0400..=0x04FF => cyrillic = true,
            _ => {}
        }
    }
    if cjk {
        Some("zh")
    } else if hangul {
        Some("ko")
    } else if arabic {
        Some("ar")
    } else if cyrillic {
        Some("ru")
    } else {
        None
    }
}

fn strip_leading_break(text: &str) -> &str {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<break") {
        if let Some(end) = rest.find("/>") {
            return rest[end + 2..].trim_start();
        }
    }
    text
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
