// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-191 (`personal_sign`) signature recovery.

use alloy::primitives::{Address, Signature};

use crate::error::{AgentError, AgentResult};

/// Interpret a message argument: `0x`-prefixed valid hex is raw bytes,
/// anything else is UTF-8 text.
pub fn decode_message(raw: &str) -> Vec<u8> {
    if let Some(hex) = raw.strip_prefix("0x") {
        if let Ok(bytes) = alloy::hex::decode(hex) {
            return bytes;
        }
    }
    raw.as_bytes().to_vec()
}

/// Recover the signer address of an EIP-191 signature over `message`.
pub fn recover_personal_sign(message: &[u8], signature_hex: &str) -> AgentResult<Address> {
    let bytes = alloy::hex::decode(signature_hex.trim())
        .map_err(|_| AgentError::InvalidSignature("signature is not valid hex".to_string()))?;
    if bytes.len() != 65 {
        return Err(AgentError::InvalidSignature(format!(
            "expected a 65-byte signature, got {} bytes",
            bytes.len()
        )));
    }

    let signature = Signature::try_from(bytes.as_slice())
        .map_err(|e| AgentError::InvalidSignature(e.to_string()))?;

    signature
        .recover_address_from_msg(message)
        .map_err(|e| AgentError::InvalidSignature(e.to_string()))
}

/// Require that `signature_hex` is `expected`'s signature over `message`.
pub fn verify_personal_sign(
    expected: Address,
    message: &[u8],
    signature_hex: &str,
) -> AgentResult<()> {
    let recovered = recover_personal_sign(message, signature_hex)?;
    if recovered != expected {
        return Err(AgentError::InvalidSignature(format!(
            "signature was produced by {recovered}, not {expected}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SessionKey;

    #[test]
    fn decode_message_handles_hex_and_text() {
        assert_eq!(decode_message("0xdeadbeef"), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_message("hello"), b"hello".to_vec());
        // Not valid hex, treated as text.
        assert_eq!(decode_message("0xzz"), b"0xzz".to_vec());
    }

    #[test]
    fn recovers_signer_of_personal_sign() {
        let key = SessionKey::generate();
        let signature = key.sign_message(b"hello enclave").unwrap();
        let hex = format!("0x{}", alloy::hex::encode(signature));

        let recovered = recover_personal_sign(b"hello enclave", &hex).unwrap();
        assert_eq!(recovered, key.address());
        assert!(verify_personal_sign(key.address(), b"hello enclave", &hex).is_ok());
    }

    #[test]
    fn rejects_signature_over_different_message() {
        let key = SessionKey::generate();
        let signature = key.sign_message(b"original").unwrap();
        let hex = alloy::hex::encode(signature);

        let err = verify_personal_sign(key.address(), b"tampered", &hex).unwrap_err();
        assert!(matches!(err, AgentError::InvalidSignature(_)));
    }

    #[test]
    fn rejects_malformed_signatures() {
        assert!(matches!(
            recover_personal_sign(b"m", "0x1234"),
            Err(AgentError::InvalidSignature(_))
        ));
        assert!(matches!(
            recover_personal_sign(b"m", "not hex"),
            Err(AgentError::InvalidSignature(_))
        ));
    }
}
