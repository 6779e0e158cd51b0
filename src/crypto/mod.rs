// ABOUTME: Cryptography module protecting provider credentials at rest
// ABOUTME: Exposes the secret decryption contract and its AES-256-GCM implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Secret storage for provider credentials

/// AES-256-GCM secret cipher
pub mod secrets;

pub use secrets::{AesGcmSecretCipher, SecretDecryptor, KEY_LEN};
