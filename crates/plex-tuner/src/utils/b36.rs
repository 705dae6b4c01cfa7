//! Base36 encoding for the `?ptnonce=` cache-buster appended to lineup stream URLs.

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn encode_nanos() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    encode(nanos)
}

pub fn encode(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let rem = (value % 36) as usize;
        digits.push(ALPHABET[rem]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("alphabet is ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_values() {
        assert_eq!(encode(0), "0");
        assert_eq!(encode(35), "z");
        assert_eq!(encode(36), "10");
        assert_eq!(encode(1_296), "100");
    }

    #[test]
    fn encode_nanos_is_nonempty_and_lowercase_alphanumeric() {
        let nonce = encode_nanos();
        assert!(!nonce.is_empty());
        assert!(nonce.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
