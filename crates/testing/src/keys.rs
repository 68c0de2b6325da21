/// Deterministic 32-byte ed25519 secret.
pub fn secret(seed: u8) -> [u8; 32] {
    let mut out = [0u8; 32];

    for (i, byte) in out.iter_mut().enumerate() {
        *byte = seed.wrapping_mul(31).wrapping_add(i as u8);
    }

    out
}

/// A `cardano-cli` style payment signing key file for the given secret.
pub fn skey_envelope(secret: &[u8; 32]) -> String {
    format!(
        r#"{{
    "type": "PaymentSigningKeyShelley_ed25519",
    "description": "Payment Signing Key",
    "cborHex": "5820{}"
}}"#,
        hex::encode(secret)
    )
}

/// An extended signing key file: 64-byte secret, 32-byte public key and
/// 32-byte chain code, in that order.
pub fn extended_skey_envelope(
    extended: &[u8; 64],
    public: &[u8; 32],
    chain_code: &[u8; 32],
) -> String {
    format!(
        r#"{{
    "type": "PaymentExtendedSigningKeyShelley_ed25519_bip32",
    "description": "Payment Signing Key",
    "cborHex": "5880{}{}{}"
}}"#,
        hex::encode(extended),
        hex::encode(public),
        hex::encode(chain_code)
    )
}

/// A verification key file, which the loader must not mistake for a
/// signing key.
pub fn vkey_envelope(public: &[u8; 32]) -> String {
    format!(
        r#"{{
    "type": "PaymentVerificationKeyShelley_ed25519",
    "description": "Payment Verification Key",
    "cborHex": "5820{}"
}}"#,
        hex::encode(public)
    )
}
