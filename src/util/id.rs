use ::uuid::Uuid;

/// Generate a random RFC 4122 version 4 identifier.
///
/// Always 36 lowercase characters in the `8-4-4-4-12` layout, with the
/// version nibble `4` at index 14.
pub fn uuid() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let id = uuid();
        assert_eq!(id.len(), 36);
        for (i, c) in id.chars().enumerate() {
            match i {
                8 | 13 | 18 | 23 => assert_eq!(c, '-'),
                14 => assert_eq!(c, '4'),
                _ => assert!(c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
            }
        }
        assert!(matches!(id.as_bytes()[19], b'8' | b'9' | b'a' | b'b'));
    }

    #[test]
    fn distinct() {
        assert_ne!(uuid(), uuid());
    }
}
