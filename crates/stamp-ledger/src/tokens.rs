//! Identifier and bearer token minting.
//!
//! Tokens are opaque: 256 bits from the OS RNG, URL-safe base64 without
//! padding. They carry no structure and are only ever compared for
//! equality against stored values.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use stamp_types::{ID_BYTES, TOKEN_BYTES};

/// Mint a fresh bearer token.
pub fn mint_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Mint a fresh entity identifier (lowercase hex).
pub fn new_id() -> String {
    let mut bytes = [0u8; ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_shape() {
        let token = mint_token();
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_unique() {
        let tokens: HashSet<String> = (0..256).map(|_| mint_token()).collect();
        assert_eq!(tokens.len(), 256);
    }

    #[test]
    fn test_id_shape() {
        let id = new_id();
        assert_eq!(id.len(), ID_BYTES * 2);
        assert!(hex::decode(&id).is_ok());
    }
}
