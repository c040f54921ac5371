//! Decoding of backslash escapes in source text.
//!
//! Two passes exist: [`unescape_codepoints`] rewrites only numeric `\uXXXX` and
//! `\UXXXXXXXX` escapes and is meant to run over a whole input before it is
//! scanned, while [`unescape_string`] additionally decodes the single character
//! escapes and is applied to the text of individual tokens.

use std::borrow::Cow;

/// Parses exactly `len` hex digits at the start of `src` into a `char`.
fn hex_char(src: &str, len: usize) -> Option<char> {
    let digits = src.get(..len)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    char::from_u32(value)
}

/// Attempts to decode a numeric escape at the start of `src`, which must begin with a backslash.
/// Returns the character and the number of bytes consumed.
fn codepoint_escape(src: &str) -> Option<(char, usize)> {
    match src.as_bytes().get(1)? {
        b'u' => hex_char(&src[2..], 4).map(|c| (c, 6)),
        b'U' => hex_char(&src[2..], 8).map(|c| (c, 10)),
        _ => None,
    }
}

fn char_escape(byte: u8) -> Option<char> {
    let c = match byte {
        b't' => '\t',
        b'b' => '\u{8}',
        b'n' => '\n',
        b'r' => '\r',
        b'f' => '\u{c}',
        b'"' => '"',
        b'\'' => '\'',
        b'\\' => '\\',
        _ => return None,
    };
    Some(c)
}

fn unescape_with(src: &str, single_char: bool) -> Cow<'_, str> {
    let Some(first) = src.find('\\') else {
        return Cow::Borrowed(src);
    };

    let mut out = String::with_capacity(src.len());
    out.push_str(&src[..first]);

    let mut rest = &src[first..];
    while let Some(index) = rest.find('\\') {
        out.push_str(&rest[..index]);
        rest = &rest[index..];

        if let Some((c, len)) = codepoint_escape(rest) {
            out.push(c);
            rest = &rest[len..];
            continue;
        }

        if single_char {
            if let Some(c) = rest.as_bytes().get(1).copied().and_then(char_escape) {
                out.push(c);
                rest = &rest[2..];
                continue;
            }
        }

        // not an escape we understand, keep the backslash verbatim
        out.push('\\');
        rest = &rest[1..];
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Replaces `\uXXXX` and `\UXXXXXXXX` escapes by the characters they denote.
///
/// Escapes of values which are not valid scalar values (surrogates, values above
/// `U+10FFFF`) are left as written.
pub fn unescape_codepoints(src: &str) -> Cow<'_, str> {
    unescape_with(src, false)
}

/// Decodes numeric escapes and the character escapes `\t \b \n \r \f \" \' \\`.
///
/// Unknown escapes are left as written.
pub fn unescape_string(src: &str) -> Cow<'_, str> {
    unescape_with(src, true)
}
