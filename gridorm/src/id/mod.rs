use crate::error::{OrmError, Result};

const ALPHABET: [char; 62] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j',
    'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1',
    '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Generate a record id of exactly `len` characters from `[A-Za-z0-9]`.
pub fn generate_id(len: i64) -> Result<String> {
    if len <= 0 {
        return Err(OrmError::Configuration(format!(
            "Identifier length must be positive, got {len}"
        )));
    }
    let len = usize::try_from(len)
        .map_err(|_| OrmError::Configuration(format!("Identifier length {len} is too large")))?;
    Ok(nanoid::nanoid!(len, &ALPHABET))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_alphabet() {
        for len in [1, 8, 21, 64] {
            let id = generate_id(len).unwrap();
            assert_eq!(id.chars().count(), len as usize);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()), "bad id {id}");
        }
    }

    #[test]
    fn test_non_positive_length_rejected() {
        assert!(matches!(generate_id(0), Err(OrmError::Configuration(_))));
        assert!(matches!(generate_id(-1), Err(OrmError::Configuration(_))));
    }

    #[test]
    fn test_ids_differ() {
        let a = generate_id(16).unwrap();
        let b = generate_id(16).unwrap();
        assert_ne!(a, b);
    }
}
