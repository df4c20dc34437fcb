//! Signing key management.
//!
//! Security notes:
//! - The private key is held in a `PrivateKeySigner`, loaded once at startup;
//!   no runtime key rotation.
//! - Raw key bytes pass through `Zeroizing` buffers only.
//! - Never log private key material; the key leaves the process only inside
//!   signed transaction payloads.

use std::path::PathBuf;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use thiserror::Error;
use zeroize::Zeroizing;

/// Source of the private key.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

/// Key management errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Holds the agent's signing key and derived address.
///
/// `Debug` goes through `PrivateKeySigner`, which does not print key
/// material.
#[derive(Debug)]
pub struct KeyManager {
    signer: PrivateKeySigner,
    address: Address,
}

impl KeyManager {
    /// Load the signing key from the given source and verify the derived
    /// address when an expectation is configured.
    ///
    /// # Errors
    /// Returns `KeyError` if:
    /// - Environment variable not found
    /// - File read fails
    /// - Hex decoding fails
    /// - Private key is invalid
    /// - Address mismatch
    pub fn load(source: KeySource, expected_address: Option<Address>) -> Result<Self, KeyError> {
        // Parse hex key from string (supports 0x prefix and whitespace trimming)
        fn parse_hex_key(hex_str: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
            let trimmed = hex_str.trim().trim_start_matches("0x");
            Ok(Zeroizing::new(hex::decode(trimmed)?))
        }

        let secret_bytes: Zeroizing<Vec<u8>> = match source {
            KeySource::EnvVar { ref var_name } => {
                let hex =
                    std::env::var(var_name).map_err(|_| KeyError::EnvVarNotFound(var_name.clone()))?;
                parse_hex_key(&hex)?
            }
            KeySource::File { ref path } => {
                let content = std::fs::read_to_string(path)?;
                parse_hex_key(&content)?
            }
        };

        let signer = PrivateKeySigner::from_slice(&secret_bytes)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        if let Some(expected) = expected_address {
            if signer.address() != expected {
                return Err(KeyError::AddressMismatch {
                    expected,
                    actual: signer.address(),
                });
            }
        }

        Ok(Self {
            address: signer.address(),
            signer,
        })
    }

    /// Load from raw bytes (test-only, no environment variable dependency).
    #[cfg(test)]
    pub fn from_bytes(
        secret_bytes: &[u8],
        expected_address: Option<Address>,
    ) -> Result<Self, KeyError> {
        let signer = PrivateKeySigner::from_slice(secret_bytes)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        if let Some(expected) = expected_address {
            if signer.address() != expected {
                return Err(KeyError::AddressMismatch {
                    expected,
                    actual: signer.address(),
                });
            }
        }

        Ok(Self {
            address: signer.address(),
            signer,
        })
    }

    /// The loaded signer.
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Address derived from the loaded key.
    pub fn address(&self) -> Address {
        self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known anvil/hardhat dev key #0; the derived address is fixed.
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_from_bytes_derives_address() {
        let bytes = hex::decode(DEV_KEY).unwrap();
        let manager = KeyManager::from_bytes(&bytes, None).unwrap();
        assert_eq!(manager.address(), DEV_ADDR.parse::<Address>().unwrap());
    }

    #[test]
    fn test_address_verification_passes() {
        let bytes = hex::decode(DEV_KEY).unwrap();
        let expected: Address = DEV_ADDR.parse().unwrap();
        assert!(KeyManager::from_bytes(&bytes, Some(expected)).is_ok());
    }

    #[test]
    fn test_address_mismatch_rejected() {
        let bytes = hex::decode(DEV_KEY).unwrap();
        let wrong = Address::repeat_byte(0x11);
        let err = KeyManager::from_bytes(&bytes, Some(wrong)).unwrap_err();
        assert!(matches!(err, KeyError::AddressMismatch { .. }));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let err = KeyManager::from_bytes(&[0u8; 3], None).unwrap_err();
        assert!(matches!(err, KeyError::InvalidKey(_)));
    }

    #[test]
    fn test_debug_form_names_the_type() {
        // `unwrap_err` on `Result<KeyManager, _>` needs this to hold.
        let bytes = hex::decode(DEV_KEY).unwrap();
        let manager = KeyManager::from_bytes(&bytes, None).unwrap();
        let rendered = format!("{manager:?}");
        assert!(rendered.contains("KeyManager"));
        assert!(!rendered.contains(DEV_KEY));
    }

    #[test]
    fn test_env_var_not_found() {
        let source = KeySource::EnvVar {
            var_name: "AURUM_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
        };
        let err = KeyManager::load(source, None).unwrap_err();
        assert!(matches!(err, KeyError::EnvVarNotFound(_)));
    }
}
