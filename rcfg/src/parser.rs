//! Recursive-descent JSON parser with eight configurable dialect
//! extensions. See [`DialectSettings`] for the flags and [`parse`] for
//! the entry point.
use allocator_api2::alloc::Allocator;

use crate::config_data::ConfigData;
use crate::error::{Found, ParseError};
use crate::loc::Loc;

/// The eight independent relaxations this parser can apply on top of
/// strict JSON. All default to `false`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DialectSettings {
    /// Object keys may be a bare `[A-Za-z0-9_-]+` run instead of a
    /// quoted string.
    pub unquoted_keys: bool,
    /// `// ...` to end of line, and `/* ... */`, are treated as
    /// whitespace.
    pub c_comments: bool,
    /// If the top-level input does not start with `{`, parse it as a
    /// member list and synthesize an Object root.
    pub implicit_root_object: bool,
    /// Commas between array elements and object members are optional.
    pub optional_commas: bool,
    /// `=` is accepted in place of `:` between an object key and value.
    pub equals_for_colon: bool,
    /// A string opening with three consecutive `"` is read raw (including
    /// newlines) until the next run of three quotes not itself followed
    /// by a quote.
    pub python_multiline_strings: bool,
    /// Within a quoted string, `\` is a literal character rather than an
    /// escape introducer.
    pub skip_escape_sequences: bool,
    /// Within a quoted string, bytes below `0x20` are accepted literally
    /// instead of raising `ControlCharacterInString`.
    pub allow_control_characters: bool,
}

impl DialectSettings {
    /// All eight flags enabled at once. A convenience for callers that
    /// want "accept anything reasonable"; scenarios that only need a
    /// few flags should build a `DialectSettings` struct literal instead.
    pub fn relaxed() -> DialectSettings {
        DialectSettings {
            unquoted_keys: true,
            c_comments: true,
            implicit_root_object: true,
            optional_commas: true,
            equals_for_colon: true,
            python_multiline_strings: true,
            skip_escape_sequences: true,
            allow_control_characters: true,
        }
    }
}

/// Byte cursor over the source, tracking a 1-based line number for
/// diagnostics. Advancing past the end of input is a no-op; callers
/// detect end-of-input via `peek() == None`.
struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a [u8]) -> Cursor<'a> {
        Cursor { src, pos: 0, line: 1 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(b) = self.peek() {
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        let src = self.src;
        &src[start..end]
    }

    fn err_unexpected(&self) -> ParseError {
        match self.peek() {
            Some(c) => ParseError::UnexpectedCharacter {
                line: self.line,
                found: c as char,
            },
            None => ParseError::UnexpectedEof { line: self.line },
        }
    }

    fn err_expected(&self, expected: char, found: Found) -> ParseError {
        ParseError::ExpectedCharacter {
            line: self.line,
            expected,
            found,
        }
    }

    fn err_eof(&self) -> ParseError {
        ParseError::UnexpectedEof { line: self.line }
    }
}

fn is_bareword_char(b: Option<u8>) -> bool {
    matches!(b, Some(c) if c.is_ascii_alphanumeric() || c == b'_' || c == b'-')
}

/// Render a byte found at an error site: printable ASCII as `Found::Char`,
/// anything else (control bytes, high bytes of a multi-byte UTF-8
/// sequence) as `Found::Byte`, which `Display`s as `\xNN`.
fn found_for_byte(b: u8) -> Found {
    if b.is_ascii() && !b.is_ascii_control() {
        Found::Char(b as char)
    } else {
        Found::Byte(b)
    }
}

struct Parser<'a, 'b, A: Allocator> {
    cur: Cursor<'a>,
    data: &'b mut ConfigData<A>,
    settings: &'b DialectSettings,
}

impl<'a, 'b, A: Allocator> Parser<'a, 'b, A> {
    fn parse_document(&mut self) -> Result<Loc, ParseError> {
        self.skip_ws();
        if self.settings.implicit_root_object && self.cur.peek() != Some(b'{') {
            return self.parse_object_members(None);
        }
        self.parse_value()
    }

    fn skip_ws(&mut self) {
        loop {
            match self.cur.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => self.cur.advance(),
                Some(b',') if self.settings.optional_commas => self.cur.advance(),
                Some(b'/') if self.settings.c_comments && self.cur.peek_at(1) == Some(b'/') => {
                    self.cur.advance();
                    self.cur.advance();
                    while !matches!(self.cur.peek(), None | Some(b'\n')) {
                        self.cur.advance();
                    }
                }
                Some(b'/') if self.settings.c_comments && self.cur.peek_at(1) == Some(b'*') => {
                    self.cur.advance();
                    self.cur.advance();
                    loop {
                        match self.cur.peek() {
                            None => break,
                            Some(b'*') if self.cur.peek_at(1) == Some(b'/') => {
                                self.cur.advance();
                                self.cur.advance();
                                break;
                            }
                            Some(_) => self.cur.advance(),
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn parse_value(&mut self) -> Result<Loc, ParseError> {
        self.skip_ws();
        match self.cur.peek() {
            Some(b'"') => {
                let s = self.parse_string()?;
                Ok(self.data.add_string(&s))
            }
            Some(b'{') => {
                self.cur.advance();
                self.parse_object_members(Some(b'}'))
            }
            Some(b'[') => {
                self.cur.advance();
                self.parse_array()
            }
            Some(b't') => self.parse_literal("true", Loc::TRUE),
            Some(b'f') => self.parse_literal("false", Loc::FALSE),
            Some(b'n') => self.parse_literal("null", Loc::NULL),
            // A leading `.` is not a legal number start either, but it
            // belongs to the number grammar rather than being some other
            // kind of unexpected character; route it into `parse_number`
            // so it reports `BadNumberFormat` like the spec's other
            // illegal leading forms (`00`, `0e`, ...) instead of
            // `UnexpectedCharacter`.
            Some(c) if c == b'-' || c == b'.' || c.is_ascii_digit() => self.parse_number(),
            Some(_) => Err(self.cur.err_unexpected()),
            None => Err(self.cur.err_eof()),
        }
    }

    fn parse_literal(&mut self, word: &str, result: Loc) -> Result<Loc, ParseError> {
        for expected in word.chars() {
            match self.cur.peek() {
                Some(b) if b as char == expected => self.cur.advance(),
                Some(b) => return Err(self.cur.err_expected(expected, found_for_byte(b))),
                None => return Err(self.cur.err_expected(expected, Found::Eof)),
            }
        }
        Ok(result)
    }

    fn parse_array(&mut self) -> Result<Loc, ParseError> {
        let arr = self.data.add_array(0);
        loop {
            self.skip_ws();
            if self.cur.peek() == Some(b']') {
                self.cur.advance();
                return Ok(arr);
            }
            let v = self.parse_value()?;
            self.data.push(arr, v);
            self.skip_ws();
            if self.cur.peek() == Some(b']') {
                self.cur.advance();
                return Ok(arr);
            }
            if self.cur.peek() == Some(b',') {
                self.cur.advance();
            } else if !self.settings.optional_commas {
                return Err(self.cur.err_expected(',', self.found_here()));
            }
        }
    }

    /// Parse a sequence of `key (:|=) value` members. `closing`, if
    /// given, is the byte that ends the sequence (consumed); `None`
    /// means read members until end of input (the `implicit_root_object`
    /// top-level case).
    fn parse_object_members(&mut self, closing: Option<u8>) -> Result<Loc, ParseError> {
        let obj = self.data.add_object(0);
        loop {
            self.skip_ws();
            match closing {
                Some(c) => {
                    if self.cur.peek() == Some(c) {
                        self.cur.advance();
                        return Ok(obj);
                    }
                }
                None => {
                    if self.cur.peek().is_none() {
                        return Ok(obj);
                    }
                }
            }
            let key = self.parse_key()?;
            self.expect_separator()?;
            let value = self.parse_value()?;
            self.data.set_loc(obj, key, value);
            self.skip_ws();
            match closing {
                Some(c) => {
                    if self.cur.peek() == Some(c) {
                        self.cur.advance();
                        return Ok(obj);
                    }
                }
                None => {
                    if self.cur.peek().is_none() {
                        return Ok(obj);
                    }
                }
            }
            if self.cur.peek() == Some(b',') {
                self.cur.advance();
            } else if !self.settings.optional_commas {
                return Err(self.cur.err_expected(',', self.found_here()));
            }
        }
    }

    fn parse_key(&mut self) -> Result<Loc, ParseError> {
        self.skip_ws();
        if self.settings.unquoted_keys
            && self.cur.peek() != Some(b'"')
            && is_bareword_char(self.cur.peek())
        {
            let start = self.cur.pos;
            while is_bareword_char(self.cur.peek()) {
                self.cur.advance();
            }
            let s = std::str::from_utf8(self.cur.slice(start, self.cur.pos)).unwrap_or("");
            return Ok(self.data.add_string(s));
        }
        if self.cur.peek() != Some(b'"') {
            return Err(self.cur.err_unexpected());
        }
        let s = self.parse_string()?;
        Ok(self.data.add_string(&s))
    }

    fn expect_separator(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        match self.cur.peek() {
            Some(b':') => {
                self.cur.advance();
                Ok(())
            }
            Some(b'=') if self.settings.equals_for_colon => {
                self.cur.advance();
                Ok(())
            }
            _ => Err(self.cur.err_expected(':', self.found_here())),
        }
    }

    fn found_here(&self) -> Found {
        match self.cur.peek() {
            Some(b) => found_for_byte(b),
            None => Found::Eof,
        }
    }

    fn parse_number(&mut self) -> Result<Loc, ParseError> {
        let line = self.cur.line;
        let sign: f64 = if self.cur.peek() == Some(b'-') {
            self.cur.advance();
            -1.0
        } else {
            1.0
        };
        let int_start = self.cur.pos;
        match self.cur.peek() {
            Some(b'0') => {
                self.cur.advance();
                if matches!(self.cur.peek(), Some(c) if c.is_ascii_digit()) {
                    return Err(ParseError::BadNumberFormat { line });
                }
            }
            Some(c) if c.is_ascii_digit() => {
                while matches!(self.cur.peek(), Some(c) if c.is_ascii_digit()) {
                    self.cur.advance();
                }
            }
            _ => return Err(ParseError::BadNumberFormat { line }),
        }
        let int_part = self
            .cur
            .slice(int_start, self.cur.pos)
            .iter()
            .fold(0f64, |acc, &b| acc * 10.0 + (b - b'0') as f64);

        let mut frac_part = 0f64;
        let mut frac_divisor = 1f64;
        if self.cur.peek() == Some(b'.') {
            self.cur.advance();
            let frac_start = self.cur.pos;
            while matches!(self.cur.peek(), Some(c) if c.is_ascii_digit()) {
                self.cur.advance();
            }
            if self.cur.pos == frac_start {
                return Err(ParseError::BadNumberFormat { line });
            }
            for &b in self.cur.slice(frac_start, self.cur.pos) {
                frac_part = frac_part * 10.0 + (b - b'0') as f64;
                frac_divisor *= 10.0;
            }
        }

        let mut exp_sign: i32 = 1;
        let mut exp: i32 = 0;
        if matches!(self.cur.peek(), Some(b'e') | Some(b'E')) {
            self.cur.advance();
            match self.cur.peek() {
                Some(b'+') => self.cur.advance(),
                Some(b'-') => {
                    exp_sign = -1;
                    self.cur.advance();
                }
                _ => {}
            }
            let exp_start = self.cur.pos;
            while matches!(self.cur.peek(), Some(c) if c.is_ascii_digit()) {
                self.cur.advance();
            }
            if self.cur.pos == exp_start {
                return Err(ParseError::BadNumberFormat { line });
            }
            for &b in self.cur.slice(exp_start, self.cur.pos) {
                // Saturate rather than overflow on a pathologically long
                // exponent digit run; `powi` on a saturated exponent
                // still yields a sensible (if extreme) f64 rather than
                // panicking on the accumulation itself.
                exp = exp.saturating_mul(10).saturating_add((b - b'0') as i32);
            }
        }

        let value = sign * (int_part + frac_part / frac_divisor) * 10f64.powi(exp_sign * exp);
        Ok(self.data.add_number(value))
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        debug_assert_eq!(self.cur.peek(), Some(b'"'));
        self.cur.advance();
        if self.settings.python_multiline_strings
            && self.cur.peek() == Some(b'"')
            && self.cur.peek_at(1) == Some(b'"')
        {
            self.cur.advance();
            self.cur.advance();
            return self.parse_multiline_string_body();
        }
        let mut out: Vec<u8> = Vec::new();
        loop {
            match self.cur.peek() {
                None => return Err(self.cur.err_eof()),
                Some(b'"') => {
                    self.cur.advance();
                    return Ok(String::from_utf8(out).unwrap_or_default());
                }
                Some(b'\\') if !self.settings.skip_escape_sequences => {
                    self.cur.advance();
                    self.parse_escape(&mut out)?;
                }
                Some(b) if b < 0x20 && !self.settings.allow_control_characters => {
                    return Err(ParseError::ControlCharacterInString { line: self.cur.line });
                }
                Some(b) => {
                    out.push(b);
                    self.cur.advance();
                }
            }
        }
    }

    fn parse_multiline_string_body(&mut self) -> Result<String, ParseError> {
        let mut out: Vec<u8> = Vec::new();
        loop {
            match self.cur.peek() {
                None => return Err(self.cur.err_eof()),
                Some(b'"')
                    if self.cur.peek_at(1) == Some(b'"')
                        && self.cur.peek_at(2) == Some(b'"')
                        && self.cur.peek_at(3) != Some(b'"') =>
                {
                    self.cur.advance();
                    self.cur.advance();
                    self.cur.advance();
                    return Ok(String::from_utf8(out).unwrap_or_default());
                }
                Some(b) => {
                    out.push(b);
                    self.cur.advance();
                }
            }
        }
    }

    fn parse_escape(&mut self, out: &mut Vec<u8>) -> Result<(), ParseError> {
        let line = self.cur.line;
        match self.cur.peek() {
            Some(b'"') => {
                out.push(b'"');
                self.cur.advance();
            }
            Some(b'\\') => {
                out.push(b'\\');
                self.cur.advance();
            }
            Some(b'/') => {
                out.push(b'/');
                self.cur.advance();
            }
            Some(b'b') => {
                out.push(0x08);
                self.cur.advance();
            }
            Some(b'f') => {
                out.push(0x0C);
                self.cur.advance();
            }
            Some(b'n') => {
                out.push(b'\n');
                self.cur.advance();
            }
            Some(b'r') => {
                out.push(b'\r');
                self.cur.advance();
            }
            Some(b't') => {
                out.push(b'\t');
                self.cur.advance();
            }
            Some(b'u') => {
                self.cur.advance();
                let cp = self.parse_hex4()?;
                match char::from_u32(cp) {
                    Some(ch) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    }
                    None => {
                        return Err(ParseError::InvalidUnicodeCodepoint {
                            line: self.cur.line,
                            codepoint: cp,
                        })
                    }
                }
            }
            Some(c) => {
                return Err(ParseError::UnexpectedCharacter {
                    line,
                    found: c as char,
                })
            }
            None => return Err(ParseError::UnexpectedEof { line }),
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u32, ParseError> {
        let line = self.cur.line;
        let mut v: u32 = 0;
        for _ in 0..4 {
            let c = self.cur.peek().ok_or(ParseError::UnexpectedEof { line })?;
            let digit = (c as char)
                .to_digit(16)
                .ok_or(ParseError::UnexpectedCharacter { line, found: c as char })?;
            v = v * 16 + digit;
            self.cur.advance();
        }
        Ok(v)
    }
}

/// Parse `src` as JSON (plus whatever `settings` relaxes) into `data`,
/// setting its root to the parsed value.
///
/// On success, `data.root()` is the parsed value. On failure, `data`'s
/// root is set to a fresh empty object so later reads see a well-formed
/// (if meaningless) document rather than a half-built one.
pub fn parse<A: Allocator>(
    src: &str,
    data: &mut ConfigData<A>,
    settings: &DialectSettings,
) -> Result<(), ParseError> {
    let mut parser = Parser {
        cur: Cursor::new(src.as_bytes()),
        data,
        settings,
    };
    match parser.parse_document() {
        Ok(root) => {
            parser.data.set_root(root);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "parse failed, resetting root to an empty object");
            let empty = parser.data.add_object(0);
            parser.data.set_root(empty);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::Kind;

    fn parse_ok(src: &str, settings: &DialectSettings) -> ConfigData {
        let mut data = ConfigData::new();
        parse(src, &mut data, settings).expect("parse should succeed");
        data
    }

    #[test]
    fn null_literal() {
        let data = parse_ok("null", &DialectSettings::default());
        assert_eq!(data.root().kind(), Kind::Null);
    }

    #[test]
    fn bad_literal_reports_expected_character() {
        let mut data = ConfigData::new();
        let err = parse("\n\nfulse", &mut data, &DialectSettings::default()).unwrap_err();
        assert_eq!(err.line(), 3);
        assert_eq!(err.to_string(), "3: Expected `a`, saw `u`");
    }

    #[test]
    fn negative_exponent_number() {
        let data = parse_ok("-3.14e-1", &DialectSettings::default());
        let n = data.to_number(data.root()).unwrap();
        assert!((n - (-0.314)).abs() < 1e-7);
    }

    #[test]
    fn array_with_loose_spacing() {
        let data = parse_ok("[1,2, 3 ,4 , 5 ]", &DialectSettings::default());
        let arr = data.root();
        assert_eq!(data.array_len(arr), 5);
        for i in 0..5 {
            assert_eq!(data.to_number(data.array_item(arr, i)), Some((i + 1) as f64));
        }
    }

    #[test]
    fn object_with_string_and_number_members() {
        let data = parse_ok(
            "{\"name\" : \"Niklas\", \"age\" : 41}",
            &DialectSettings::default(),
        );
        let obj = data.root();
        assert_eq!(data.to_str(data.object_lookup(obj, "name")), Some("Niklas"));
        assert_eq!(data.to_number(data.object_lookup(obj, "age")), Some(41.0));
        assert_eq!(data.to_str(data.object_key_loc(obj, 1)), Some("age"));
    }

    #[test]
    fn unicode_escape_is_encoded_independently_per_unit() {
        let data = parse_ok("\"\\u00e4\\u6176\"", &DialectSettings::default());
        let s = data.to_str(data.root()).unwrap();
        // U+00E4 is 2 UTF-8 bytes, U+6176 is 3 (it's above U+07FF): 5 total.
        assert_eq!(s.as_bytes().len(), 5);
        assert_eq!(s, "\u{e4}\u{6176}");
    }

    #[test]
    fn relaxed_dialect_combo() {
        let settings = DialectSettings {
            unquoted_keys: true,
            c_comments: true,
            implicit_root_object: true,
            optional_commas: true,
            equals_for_colon: true,
            ..DialectSettings::default()
        };
        let data = parse_ok("// c\na=10 b=20", &settings);
        let obj = data.root();
        assert_eq!(data.kind(obj), Kind::Object);
        assert_eq!(data.to_number(data.object_lookup(obj, "a")), Some(10.0));
        assert_eq!(data.to_number(data.object_lookup(obj, "b")), Some(20.0));
    }

    #[test]
    fn python_multiline_string() {
        let settings = DialectSettings {
            python_multiline_strings: true,
            ..DialectSettings::default()
        };
        let data = parse_ok("\"\"\" Bla \" Bla \"\"\"", &settings);
        assert_eq!(data.to_str(data.root()), Some(" Bla \" Bla "));
    }

    #[test]
    fn empty_input_with_implicit_root_object_yields_empty_object() {
        let data = parse_ok("", &DialectSettings {
            implicit_root_object: true,
            ..DialectSettings::default()
        });
        assert_eq!(data.kind(data.root()), Kind::Object);
        assert_eq!(data.object_len(data.root()), 0);
    }

    #[test]
    fn whitespace_only_strict_input_is_an_error() {
        let mut data = ConfigData::new();
        let err = parse("   \n  ", &mut data, &DialectSettings::default());
        assert!(err.is_err());
    }

    #[test]
    fn bad_number_formats_are_rejected() {
        for bad in ["--1", ".1", "-.1", "00", "0e", "0.", "0.e1", "0.0ee"] {
            let mut data = ConfigData::new();
            let err = parse(bad, &mut data, &DialectSettings::default());
            assert!(
                matches!(err, Err(ParseError::BadNumberFormat { .. })),
                "expected {bad:?} to be rejected as BadNumberFormat, got {err:?}"
            );
        }
    }

    #[test]
    fn control_character_in_string_is_rejected_unless_allowed() {
        let mut data = ConfigData::new();
        let err = parse("\"a\tb\"", &mut data, &DialectSettings::default());
        assert!(matches!(err, Err(ParseError::ControlCharacterInString { .. })));

        let settings = DialectSettings {
            allow_control_characters: true,
            ..DialectSettings::default()
        };
        let data = parse_ok("\"a\tb\"", &settings);
        assert_eq!(data.to_str(data.root()), Some("a\tb"));
    }

    #[test]
    fn control_byte_at_error_site_renders_as_hex_escape() {
        let mut data = ConfigData::new();
        let err = parse("tru\x01", &mut data, &DialectSettings::default()).unwrap_err();
        assert_eq!(err.to_string(), "1: Expected `e`, saw \\x01");
    }

    #[test]
    fn long_string_round_trips() {
        let long = "x".repeat(200);
        let src = format!("\"{long}\"");
        let data = parse_ok(&src, &DialectSettings::default());
        assert_eq!(data.to_str(data.root()), Some(long.as_str()));
    }
}
