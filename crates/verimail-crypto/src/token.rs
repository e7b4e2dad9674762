use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};
use rand::TryRngCore;
use rand::rngs::OsRng;

/// Entropy of a verification token.
pub const TOKEN_BYTES: usize = 32;

/// Generate a fresh verification token.
/// No uniqueness check: collisions are bounded only by the 256-bit space.
pub fn generate_verification_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| anyhow!("OS random source failed: {}", e))?;
    Ok(BASE64URL.encode(bytes))
}
