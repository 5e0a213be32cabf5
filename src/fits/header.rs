//! FITS header cards.
//!
//! A header is an ordered list of 80-column cards. Keyword lookup returns
//! the first card carrying that keyword; commentary cards (`COMMENT`,
//! `HISTORY`, blank keyword) keep their position and text.

use crate::error::{FitsErrorKind, GviewError, Result};
use indexmap::IndexMap;
use std::fmt;

/// Length of a single header card.
pub const CARD_LEN: usize = 80;

/// Keywords whose cards carry free text rather than a value.
const COMMENTARY_KEYWORDS: &[&str] = &["COMMENT", "HISTORY", ""];

/// Value of a header card.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Str(String),
    Logical(bool),
    Int(i64),
    Float(f64),
    Complex(f64, f64),
    Undefined,
}

impl HeaderValue {
    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Logical(b) => Some(*b),
            _ => None,
        }
    }

    /// Render the value the way it appears in the value field of a card.
    fn to_card_field(&self) -> String {
        match self {
            Self::Str(s) => {
                let quoted = format!("'{:<8}'", s.replace('\'', "''"));
                format!("{quoted:<20}")
            }
            Self::Logical(b) => format!("{:>20}", if *b { "T" } else { "F" }),
            Self::Int(i) => format!("{i:>20}"),
            Self::Float(f) => format!("{:>20}", card_float(*f)),
            Self::Complex(re, im) => {
                format!("{:>20}", format!("({}, {})", card_float(*re), card_float(*im)))
            }
            Self::Undefined => " ".repeat(20),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Logical(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{}", display_float(*v)),
            Self::Complex(re, im) => write!(f, "({}, {})", display_float(*re), display_float(*im)),
            Self::Undefined => Ok(()),
        }
    }
}

fn display_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn card_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v:E}")
    }
}

/// A single header card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub keyword: String,
    /// `None` for commentary cards.
    pub value: Option<HeaderValue>,
    /// Comment text, or the body of a commentary card.
    pub comment: Option<String>,
}

impl Card {
    pub fn new(keyword: impl Into<String>, value: HeaderValue, comment: Option<&str>) -> Self {
        Self {
            keyword: keyword.into().to_uppercase(),
            value: Some(value),
            comment: comment.map(str::to_string),
        }
    }

    pub fn commentary(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().to_uppercase(),
            value: None,
            comment: Some(text.into()),
        }
    }

    #[must_use]
    pub fn is_commentary(&self) -> bool {
        self.value.is_none()
    }

    /// Text shown for this card by the `head` command.
    #[must_use]
    pub fn display_value(&self) -> String {
        match &self.value {
            Some(v) => v.to_string(),
            None => self.comment.clone().unwrap_or_default(),
        }
    }

    /// Parse one 80-column card.
    pub fn parse(raw: &str) -> Result<Self> {
        let keyword: String = raw.chars().take(8).collect::<String>().trim_end().to_string();
        let rest: String = raw.chars().skip(8).collect();

        if COMMENTARY_KEYWORDS.contains(&keyword.as_str()) || !rest.starts_with("= ") {
            let text = rest.trim_end();
            return Ok(Self {
                keyword,
                value: None,
                comment: Some(text.strip_prefix(' ').unwrap_or(text).to_string()),
            });
        }

        let field = &rest[2..];
        let (value, comment) = parse_value_field(field).map_err(|message| {
            GviewError::fits(
                "parsing header card",
                FitsErrorKind::BadCard {
                    keyword: keyword.clone(),
                    message,
                },
            )
        })?;

        Ok(Self {
            keyword,
            value: Some(value),
            comment,
        })
    }

    /// Format as an 80-column card.
    #[must_use]
    pub fn to_card_string(&self) -> String {
        let mut card = match &self.value {
            Some(value) => {
                let mut s = format!("{:<8}= {}", self.keyword, value.to_card_field());
                if let Some(comment) = &self.comment {
                    s.push_str(" / ");
                    s.push_str(comment);
                }
                s
            }
            None => format!(
                "{:<8}{}",
                self.keyword,
                self.comment.as_deref().unwrap_or_default()
            ),
        };
        card.retain(|c| c.is_ascii() && !c.is_ascii_control());
        card.truncate(CARD_LEN);
        format!("{card:<CARD_LEN$}")
    }
}

/// Split a value field into its value and trailing comment.
fn parse_value_field(field: &str) -> std::result::Result<(HeaderValue, Option<String>), String> {
    let trimmed = field.trim_start();

    if let Some(body) = trimmed.strip_prefix('\'') {
        let mut value = String::new();
        let mut chars = body.char_indices().peekable();
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if matches!(chars.peek(), Some((_, '\''))) {
                    value.push('\'');
                    chars.next();
                } else {
                    end = Some(i + 1);
                    break;
                }
            } else {
                value.push(c);
            }
        }
        let end = end.ok_or_else(|| "unterminated string".to_string())?;
        let comment = split_comment(&body[end..]);
        return Ok((HeaderValue::Str(value.trim_end().to_string()), comment));
    }

    let (value_text, comment) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], split_comment(&trimmed[idx..])),
        None => (trimmed, None),
    };
    let value_text = value_text.trim();

    let value = if value_text.is_empty() {
        HeaderValue::Undefined
    } else if value_text == "T" {
        HeaderValue::Logical(true)
    } else if value_text == "F" {
        HeaderValue::Logical(false)
    } else if let Some(inner) = value_text.strip_prefix('(') {
        let inner = inner
            .strip_suffix(')')
            .ok_or_else(|| "unterminated complex value".to_string())?;
        let mut parts = inner.split(',');
        let re = parts.next().and_then(parse_float);
        let im = parts.next().and_then(parse_float);
        match (re, im) {
            (Some(re), Some(im)) => HeaderValue::Complex(re, im),
            _ => return Err(format!("bad complex value {value_text:?}")),
        }
    } else if let Ok(i) = value_text.parse::<i64>() {
        HeaderValue::Int(i)
    } else if let Some(f) = parse_float(value_text) {
        HeaderValue::Float(f)
    } else {
        return Err(format!("unparseable value {value_text:?}"));
    };

    Ok((value, comment))
}

fn parse_float(text: &str) -> Option<f64> {
    text.trim().replace(['D', 'd'], "E").parse().ok()
}

fn split_comment(text: &str) -> Option<String> {
    let text = text.trim();
    let comment = text.strip_prefix('/')?.trim();
    (!comment.is_empty()).then(|| comment.to_string())
}

/// An ordered FITS header.
#[derive(Debug, Clone, Default)]
pub struct Header {
    cards: Vec<Card>,
    index: IndexMap<String, usize>,
}

impl Header {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a card. `CONTINUE` cards extend the previous long string.
    pub fn push(&mut self, card: Card) {
        if card.keyword == "CONTINUE" && self.extend_long_string(&card) {
            return;
        }
        if !card.is_commentary() && !self.index.contains_key(&card.keyword) {
            self.index.insert(card.keyword.clone(), self.cards.len());
        }
        self.cards.push(card);
    }

    fn extend_long_string(&mut self, card: &Card) -> bool {
        let Some(text) = card.comment.as_deref() else {
            return false;
        };
        let Ok((HeaderValue::Str(more), _)) = parse_value_field(text) else {
            return false;
        };
        let Some(HeaderValue::Str(prev)) = self.cards.last_mut().and_then(|c| c.value.as_mut())
        else {
            return false;
        };
        match prev.strip_suffix('&') {
            Some(stripped) => {
                *prev = format!("{stripped}{more}");
                true
            }
            None => false,
        }
    }

    /// Set a keyword, replacing the first existing card or appending.
    pub fn set(&mut self, keyword: &str, value: HeaderValue, comment: Option<&str>) {
        let keyword = keyword.to_uppercase();
        match self.index.get(&keyword) {
            Some(&idx) => {
                let card = &mut self.cards[idx];
                card.value = Some(value);
                if comment.is_some() {
                    card.comment = comment.map(str::to_string);
                }
            }
            None => self.push(Card::new(keyword, value, comment)),
        }
    }

    #[must_use]
    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.card(keyword).and_then(|c| c.value.as_ref())
    }

    #[must_use]
    pub fn card(&self, keyword: &str) -> Option<&Card> {
        let idx = *self.index.get(keyword.to_uppercase().as_str())?;
        self.cards.get(idx)
    }

    #[must_use]
    pub fn contains(&self, keyword: &str) -> bool {
        self.index.contains_key(keyword.to_uppercase().as_str())
    }

    #[must_use]
    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(HeaderValue::as_f64)
    }

    #[must_use]
    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(HeaderValue::as_i64)
    }

    #[must_use]
    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(HeaderValue::as_str)
    }

    /// Integer keyword that must be present.
    pub fn require_i64(&self, keyword: &str) -> Result<i64> {
        self.get_i64(keyword).ok_or_else(|| {
            GviewError::fits(
                "reading header",
                FitsErrorKind::MissingKeyword(keyword.to_string()),
            )
        })
    }

    /// All cards in file order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(text: &str) -> String {
        format!("{text:<80}")
    }

    #[test]
    fn test_parse_value_kinds() {
        let c = Card::parse(&card("NAXIS1  =                  512 / length of axis 1")).unwrap();
        assert_eq!(c.keyword, "NAXIS1");
        assert_eq!(c.value, Some(HeaderValue::Int(512)));
        assert_eq!(c.comment.as_deref(), Some("length of axis 1"));

        let c = Card::parse(&card("SIMPLE  =                    T")).unwrap();
        assert_eq!(c.value, Some(HeaderValue::Logical(true)));

        let c = Card::parse(&card("EXPTIME =              1.5D+01")).unwrap();
        assert_eq!(c.value, Some(HeaderValue::Float(15.0)));

        let c = Card::parse(&card("CVAL    = (1.0, -2.5)")).unwrap();
        assert_eq!(c.value, Some(HeaderValue::Complex(1.0, -2.5)));

        let c = Card::parse(&card("BLANKV  =")).unwrap();
        assert_eq!(c.value, Some(HeaderValue::Undefined));
    }

    #[test]
    fn test_parse_string_with_quotes_and_slash() {
        let c = Card::parse(&card("OBJECT  = 'M31 / O''Neil  ' / target")).unwrap();
        assert_eq!(c.value, Some(HeaderValue::Str("M31 / O'Neil".to_string())));
        assert_eq!(c.comment.as_deref(), Some("target"));
    }

    #[test]
    fn test_commentary_card() {
        let c = Card::parse(&card("HISTORY reduced with gview")).unwrap();
        assert!(c.is_commentary());
        assert_eq!(c.display_value(), "reduced with gview");
    }

    #[test]
    fn test_bad_card_is_error() {
        assert!(Card::parse(&card("BROKEN  = 'no end")).is_err());
        assert!(Card::parse(&card("BROKEN  = 12abc")).is_err());
    }

    #[test]
    fn test_card_string_reparses() {
        let original = Card::new("OBJECT", HeaderValue::Str("NGC 253".into()), Some("name"));
        let text = original.to_card_string();
        assert_eq!(text.len(), CARD_LEN);
        assert_eq!(Card::parse(&text).unwrap(), original);

        let float = Card::new("CDELT1", HeaderValue::Float(-2.5e-5), None);
        let parsed = Card::parse(&float.to_card_string()).unwrap();
        assert_eq!(parsed.value, Some(HeaderValue::Float(-2.5e-5)));
    }

    #[test]
    fn test_header_lookup_first_card_wins() {
        let mut header = Header::new();
        header.push(Card::new("EQUINOX", HeaderValue::Float(2000.0), None));
        header.push(Card::new("EQUINOX", HeaderValue::Float(1950.0), None));
        header.push(Card::commentary("COMMENT", "first"));
        header.push(Card::commentary("COMMENT", "second"));

        assert_eq!(header.get_f64("equinox"), Some(2000.0));
        assert_eq!(header.len(), 4);
        assert!(!header.contains("COMMENT"));
    }

    #[test]
    fn test_continue_long_string() {
        let mut header = Header::new();
        header.push(Card::parse(&card("LONGSTR = 'part one &'")).unwrap());
        header.push(Card::parse(&card("CONTINUE  ' part two'")).unwrap());
        assert_eq!(header.get_str("LONGSTR"), Some("part one  part two"));
        assert_eq!(header.len(), 1);
    }

    #[test]
    fn test_display_matches_python_repr() {
        assert_eq!(HeaderValue::Float(2000.0).to_string(), "2000.0");
        assert_eq!(HeaderValue::Logical(false).to_string(), "False");
    }
}
