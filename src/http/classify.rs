//! Byte classes used by the line and field tokenizers.
//!
//! All predicates are pure and operate on single octets; nothing here
//! assumes the input is valid UTF-8.

/// Returns true for SP, HT, LF, VT, FF and CR.
///
/// Start line fields are separated by runs of these.
#[inline]
pub fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Returns true for linear whitespace (SP or HT).
#[inline]
pub fn is_lws(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Returns true if `c` may appear in a header field name.
///
/// ```text
/// token      = 1*<any CHAR except CTLs or separators>
/// separators = "(" | ")" | "<" | ">" | "@" | "," | ";" | ":" | "\" | <">
///            | "/" | "[" | "]" | "?" | "=" | "{" | "}" | SP | HT
/// ```
#[inline]
pub fn is_token(c: u8) -> bool {
    if c <= 32 || c >= 127 {
        return false;
    }

    !matches!(
        c,
        b'(' | b')'
            | b'<'
            | b'>'
            | b'@'
            | b','
            | b';'
            | b':'
            | b'\\'
            | b'"'
            | b'/'
            | b'['
            | b']'
            | b'?'
            | b'='
            | b'{'
            | b'}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_class_includes_line_terminators() {
        for c in [b' ', b'\t', b'\n', b'\r', 0x0b, 0x0c] {
            assert!(is_space(c), "{c:#04x}");
        }
        assert!(!is_space(b'a'));
        assert!(!is_space(0x00));
    }

    #[test]
    fn lws_is_only_space_and_tab() {
        assert!(is_lws(b' '));
        assert!(is_lws(b'\t'));
        assert!(!is_lws(b'\r'));
        assert!(!is_lws(b'\n'));
    }

    #[test]
    fn token_rejects_separators_and_controls() {
        for c in b"Content-Type_x!#$%&'*+.^`|~09azAZ" {
            assert!(is_token(*c), "{}", *c as char);
        }
        for c in b"()<>@,;:\\\"/[]?={} \t" {
            assert!(!is_token(*c), "{}", *c as char);
        }
        assert!(!is_token(0x00));
        assert!(!is_token(0x7f));
        assert!(!is_token(0xc3));
    }
}
