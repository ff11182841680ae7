// keylock - license key generation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes in a license key (256 bits).
pub const KEY_BYTES: usize = 32;

/// Generates a new license key from the operating system's secure RNG.
///
/// Keys are URL-safe base64 without padding, 43 characters long, so they can
/// be passed as query parameters unescaped.
pub fn generate_license_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
