//! Rune predicates used by the scanner's states.

/// A matcher decides whether the scanner should accept a single rune.
pub type Matcher = fn(char) -> bool;

/// Unicode whitespace.
#[must_use]
pub fn whitespace(c: char) -> bool {
    c.is_whitespace()
}

/// ASCII decimal digit.
#[must_use]
pub fn digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// ASCII hex digit.
#[must_use]
pub fn hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// First rune of a regular identifier: `[A-Za-z_]`.
#[must_use]
pub fn identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Subsequent rune of a regular identifier: `[A-Za-z0-9_]`.
#[must_use]
pub fn identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_matchers() {
        assert!(identifier_start('a'));
        assert!(identifier_start('_'));
        assert!(!identifier_start('1'));
        assert!(identifier_part('1'));
        assert!(!identifier_part('.'));
    }

    #[test]
    fn digit_matchers() {
        assert!(digit('0'));
        assert!(!digit('a'));
        assert!(hex_digit('a'));
        assert!(hex_digit('F'));
        assert!(!hex_digit('g'));
    }
}
