//! Username validation
//!
//! Accepted iff 1-20 characters from `[A-Za-z0-9_-]` and free of reserved
//! words (case-insensitive substring match).

use crate::consts::USERNAME_MAX_LEN;
use crate::error::UsernameError;

/// Reserved/placeholder words no username may contain
pub const RESERVED_WORDS: [&str; 7] = ["admin", "root", "test", "null", "undefined", "bot", "system"];

pub fn validate_username(username: &str) -> Result<(), UsernameError> {
    if username.is_empty() {
        return Err(UsernameError::Empty);
    }

    let len = username.chars().count();
    if len > USERNAME_MAX_LEN {
        return Err(UsernameError::TooLong {
            len,
            max: USERNAME_MAX_LEN,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(UsernameError::InvalidCharacters);
    }

    let lower = username.to_ascii_lowercase();
    if let Some(word) = RESERVED_WORDS.iter().find(|w| lower.contains(**w)) {
        return Err(UsernameError::Reserved { word: *word });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        for name in ["Player_1", "kiro", "a", "x-y_z", "ABCDEFGHIJ0123456789"] {
            assert_eq!(validate_username(name), Ok(()), "{name} should pass");
        }
    }

    #[test]
    fn test_rejects_reserved_words() {
        assert_eq!(
            validate_username("admin"),
            Err(UsernameError::Reserved { word: "admin" })
        );
        assert_eq!(
            validate_username("root2"),
            Err(UsernameError::Reserved { word: "root" })
        );
        assert_eq!(
            validate_username("MyROBOTic"),
            Err(UsernameError::Reserved { word: "bot" })
        );
        assert!(validate_username("TeSt_user").is_err());
        assert!(validate_username("nullptr").is_err());
        assert!(validate_username("undefined").is_err());
        assert!(validate_username("System-7").is_err());
    }

    #[test]
    fn test_rejects_bad_shape() {
        assert_eq!(validate_username(""), Err(UsernameError::Empty));
        assert_eq!(
            validate_username("a b"),
            Err(UsernameError::InvalidCharacters)
        );
        assert_eq!(
            validate_username(&"a".repeat(21)),
            Err(UsernameError::TooLong { len: 21, max: 20 })
        );
        assert_eq!(
            validate_username("kiro!"),
            Err(UsernameError::InvalidCharacters)
        );
        assert_eq!(
            validate_username("café"),
            Err(UsernameError::InvalidCharacters)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            UsernameError::Reserved { word: "bot" }.to_string(),
            "Username cannot contain 'bot'"
        );
        assert_eq!(
            UsernameError::Empty.to_string(),
            "Username must be 1-20 characters long"
        );
    }
}
