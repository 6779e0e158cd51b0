// ABOUTME: AES-256-GCM cipher for provider credentials stored on sync configurations
// ABOUTME: Implements the secret decryption contract used by the sync executor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::warn;
use zeroize::Zeroizing;

use crate::config::{Environment, SyncEngineConfig};
use crate::errors::SyncError;

/// Length in bytes of an AES-256 key
pub const KEY_LEN: usize = 32;

/// Recovers plaintext provider secrets from their stored form
pub trait SecretDecryptor: Send + Sync {
    /// Decrypt a stored secret
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Decryption`] if the secret cannot be recovered
    fn decrypt(&self, encrypted: &str) -> Result<Zeroizing<String>, SyncError>;
}

/// AES-256-GCM cipher over base64 `[nonce][ciphertext + tag]` blobs
pub struct AesGcmSecretCipher {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl fmt::Debug for AesGcmSecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmSecretCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl AesGcmSecretCipher {
    /// Build a cipher from raw key bytes
    #[must_use]
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Build a cipher from a base64-encoded 32-byte key
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not base64 or not exactly 32 bytes
    pub fn from_base64_key(encoded: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| anyhow!("secret key is not base64: {e}"))?,
        );
        let key: [u8; KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            anyhow!(
                "secret key must be {KEY_LEN} bytes, got {} bytes",
                bytes.len()
            )
        })?;
        Ok(Self::new(key))
    }

    /// Generate a fresh random key
    ///
    /// # Errors
    ///
    /// Returns an error if the system random source fails
    pub fn generate() -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| anyhow!("system random source unavailable"))?;
        Ok(Self::new(key))
    }

    /// Load the key from configuration, generating one outside production
    ///
    /// # Errors
    ///
    /// Returns an error if the configured key is malformed, or if no key is
    /// configured in production
    pub fn load_or_generate(config: &SyncEngineConfig) -> Result<Self> {
        match (&config.secret_key, config.environment) {
            (Some(encoded), _) => Self::from_base64_key(encoded),
            (None, Environment::Production) => Err(anyhow!(
                "CGM_SECRET_KEY must be set in production"
            )),
            (None, _) => {
                warn!("Generating an ephemeral secret key; secrets encrypted now will not survive a restart");
                Self::generate()
            }
        }
    }

    fn sealing_key(&self) -> Option<LessSafeKey> {
        UnboundKey::new(&AES_256_GCM, self.key.as_slice())
            .ok()
            .map(LessSafeKey::new)
    }

    /// Encrypt a plaintext secret for storage
    ///
    /// # Errors
    ///
    /// Returns an error if the random source or the cipher fails
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut nonce_bytes)
            .map_err(|_| anyhow!("system random source unavailable"))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);
        let key = self
            .sealing_key()
            .ok_or_else(|| anyhow!("secret key rejected by cipher"))?;

        let mut data = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut data)
            .map_err(|_| anyhow!("sealing secret failed"))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(data);
        Ok(general_purpose::STANDARD.encode(combined))
    }
}

impl SecretDecryptor for AesGcmSecretCipher {
    fn decrypt(&self, encrypted: &str) -> Result<Zeroizing<String>, SyncError> {
        // Upstream decode errors are not echoed: their text could trip the failure classifier.
        let combined = general_purpose::STANDARD
            .decode(encrypted.trim())
            .map_err(|_| SyncError::Decryption("stored secret is not base64".to_owned()))?;
        if combined.len() <= NONCE_LEN {
            return Err(SyncError::Decryption("stored secret is too short".to_owned()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| SyncError::Decryption("stored secret has a malformed nonce".to_owned()))?;
        let key = self
            .sealing_key()
            .ok_or_else(|| SyncError::Decryption("secret key rejected by cipher".to_owned()))?;

        let mut data = Zeroizing::new(ciphertext.to_vec());
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), data.as_mut_slice())
            .map_err(|_| SyncError::Decryption("stored secret failed to open".to_owned()))?;
        let text = String::from_utf8(plaintext.to_vec())
            .map_err(|_| SyncError::Decryption("stored secret is not UTF-8".to_owned()))?;
        Ok(Zeroizing::new(text))
    }
}
