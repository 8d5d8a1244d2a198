// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Loading of elliptic curve private keys from PEM armored PKCS8 files, and randomized ECDSA
//! signing with them.
//!
//! # Example
//! ```rust
//! # use time_sign::key::{Curve, EcPrivateKey};
//! use p256::pkcs8::{EncodePrivateKey, LineEnding};
//! use rand::rngs::OsRng;
//! let pem = p256::SecretKey::random(&mut OsRng).to_pkcs8_pem(LineEnding::LF).unwrap();
//! let key = EcPrivateKey::from_pem(pem.as_bytes()).unwrap();
//! assert_eq!(key.curve(), Curve::P256);
//! let signature = key.sign(&mut OsRng, b"Hello, world!").unwrap();
//! assert_eq!(signature[0], 0x30);
//! ```

use crate::error::{TimeSignError, TimeSignResult};
use p256::elliptic_curve::ALGORITHM_OID as EC_PUBLIC_KEY_OID;
use pkcs8::der::pem::PemLabel;
use pkcs8::{AssociatedOid, DecodePrivateKey, ObjectIdentifier, PrivateKeyInfo, SecretDocument};
use rand::{CryptoRng, RngCore};
use signature::RandomizedSigner;
use std::fmt::{self, Display};
use std::path::Path;

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

const PEM_BEGIN: &[u8] = b"-----BEGIN ";
const PEM_END: &[u8] = b"-----END ";
const PEM_DASHES: &[u8] = b"-----";

/// Curves a private key may be defined over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    P224,
    P256,
    P384,
    P521,
    Secp256k1,
}

impl Curve {
    fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        if oid == p224::NistP224::OID {
            Some(Curve::P224)
        } else if oid == p256::NistP256::OID {
            Some(Curve::P256)
        } else if oid == p384::NistP384::OID {
            Some(Curve::P384)
        } else if oid == p521::NistP521::OID {
            Some(Curve::P521)
        } else if oid == k256::Secp256k1::OID {
            Some(Curve::Secp256k1)
        } else {
            None
        }
    }
}

impl Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::P224 => write!(f, "P-224"),
            Curve::P256 => write!(f, "P-256"),
            Curve::P384 => write!(f, "P-384"),
            Curve::P521 => write!(f, "P-521"),
            Curve::Secp256k1 => write!(f, "secp256k1"),
        }
    }
}

/// An elliptic curve private key. The message digest used when signing is the one associated
/// with the curve: SHA-224 for P-224, SHA-256 for P-256 and secp256k1, SHA-384 for P-384 and
/// SHA-512 for P-521.
pub enum EcPrivateKey {
    P224(p224::ecdsa::SigningKey),
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    P521(p521::ecdsa::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcPrivateKey({}, <elided>)", self.curve())
    }
}

impl EcPrivateKey {
    /// Read and parse the key file at `path`.
    pub fn from_file(path: &Path) -> TimeSignResult<Self> {
        let contents = std::fs::read(path).map_err(|source| TimeSignError::Open {
            role: "key",
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(&contents)
    }

    /// Parse the first PEM block in `contents` as a PKCS8 elliptic curve private key. Bytes
    /// outside that block need not be text.
    pub fn from_pem(contents: &[u8]) -> TimeSignResult<Self> {
        let block = std::str::from_utf8(first_pem_block(contents)?)
            .map_err(|e| TimeSignError::Pem(e.to_string()))?;
        let (label, document) =
            SecretDocument::from_pem(block).map_err(|e| TimeSignError::Pem(e.to_string()))?;
        if label != PrivateKeyInfo::PEM_LABEL {
            return Err(TimeSignError::PemLabel(label.to_string()));
        }
        Self::from_pkcs8_der(document.as_bytes())
    }

    /// Parse a DER encoded PKCS8 structure.
    pub fn from_pkcs8_der(der: &[u8]) -> TimeSignResult<Self> {
        let info =
            PrivateKeyInfo::try_from(der).map_err(|e| TimeSignError::Pkcs8(e.to_string()))?;

        let algorithm = info.algorithm.oid;
        if algorithm != EC_PUBLIC_KEY_OID {
            return Err(TimeSignError::NotEcKey(algorithm_name(algorithm)));
        }

        let curve_oid = info
            .algorithm
            .parameters_oid()
            .map_err(|e| TimeSignError::Pkcs8(e.to_string()))?;
        let curve = Curve::from_oid(curve_oid)
            .ok_or_else(|| TimeSignError::UnsupportedCurve(curve_oid.to_string()))?;

        let pkcs8_err = |e: pkcs8::Error| TimeSignError::Pkcs8(e.to_string());
        Ok(match curve {
            Curve::P224 => EcPrivateKey::P224(
                p224::ecdsa::SigningKey::from_pkcs8_der(der).map_err(pkcs8_err)?,
            ),
            Curve::P256 => EcPrivateKey::P256(
                p256::ecdsa::SigningKey::from_pkcs8_der(der).map_err(pkcs8_err)?,
            ),
            Curve::P384 => EcPrivateKey::P384(
                p384::ecdsa::SigningKey::from_pkcs8_der(der).map_err(pkcs8_err)?,
            ),
            Curve::P521 => {
                let secret = p521::SecretKey::from_pkcs8_der(der).map_err(pkcs8_err)?;
                EcPrivateKey::P521(
                    p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
                        .map_err(|e| TimeSignError::Pkcs8(e.to_string()))?,
                )
            }
            Curve::Secp256k1 => EcPrivateKey::Secp256k1(
                k256::ecdsa::SigningKey::from_pkcs8_der(der).map_err(pkcs8_err)?,
            ),
        })
    }

    pub fn curve(&self) -> Curve {
        match self {
            EcPrivateKey::P224(_) => Curve::P224,
            EcPrivateKey::P256(_) => Curve::P256,
            EcPrivateKey::P384(_) => Curve::P384,
            EcPrivateKey::P521(_) => Curve::P521,
            EcPrivateKey::Secp256k1(_) => Curve::Secp256k1,
        }
    }

    /// The compressed SEC1 encoding of the public key.
    pub fn public_key_sec1(&self) -> Vec<u8> {
        let point = match self {
            EcPrivateKey::P224(sk) => sk.verifying_key().to_encoded_point(true).to_bytes(),
            EcPrivateKey::P256(sk) => sk.verifying_key().to_encoded_point(true).to_bytes(),
            EcPrivateKey::P384(sk) => sk.verifying_key().to_encoded_point(true).to_bytes(),
            EcPrivateKey::P521(sk) => p521::ecdsa::VerifyingKey::from(sk).to_encoded_point(true).to_bytes(),
            EcPrivateKey::Secp256k1(sk) => sk.verifying_key().to_encoded_point(true).to_bytes(),
        };
        point.into_vec()
    }

    /// Sign `msg` with a fresh nonce drawn from `rng` and return the DER encoding of (r, s).
    pub fn sign<R>(&self, rng: &mut R, msg: &[u8]) -> TimeSignResult<Vec<u8>>
    where
        R: CryptoRng + RngCore,
    {
        Ok(match self {
            EcPrivateKey::P224(sk) => {
                let sig: p224::ecdsa::Signature = sk.try_sign_with_rng(rng, msg)?;
                sig.to_der().as_bytes().to_vec()
            }
            EcPrivateKey::P256(sk) => {
                let sig: p256::ecdsa::Signature = sk.try_sign_with_rng(rng, msg)?;
                sig.to_der().as_bytes().to_vec()
            }
            EcPrivateKey::P384(sk) => {
                let sig: p384::ecdsa::Signature = sk.try_sign_with_rng(rng, msg)?;
                sig.to_der().as_bytes().to_vec()
            }
            EcPrivateKey::P521(sk) => {
                let sig: p521::ecdsa::Signature = sk.try_sign_with_rng(rng, msg)?;
                sig.to_der().as_bytes().to_vec()
            }
            EcPrivateKey::Secp256k1(sk) => {
                let sig: k256::ecdsa::Signature = sk.try_sign_with_rng(rng, msg)?;
                sig.to_der().as_bytes().to_vec()
            }
        })
    }
}

/// Cut the first `-----BEGIN ...-----` / `-----END ...-----` block out of `contents`. Anything
/// before or after it (comments, an EC PARAMETERS block, binary junk) is ignored.
fn first_pem_block(contents: &[u8]) -> TimeSignResult<&[u8]> {
    let start = find(contents, PEM_BEGIN)
        .ok_or_else(|| TimeSignError::Pem("no PEM block found".to_string()))?;
    let end_marker = find(&contents[start..], PEM_END)
        .map(|offset| start + offset)
        .ok_or_else(|| TimeSignError::Pem("PEM block is not terminated".to_string()))?;
    let after_label = end_marker + PEM_END.len();
    let end = find(&contents[after_label..], PEM_DASHES)
        .map(|offset| after_label + offset + PEM_DASHES.len())
        .ok_or_else(|| TimeSignError::Pem("PEM end line is malformed".to_string()))?;
    Ok(&contents[start..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn algorithm_name(oid: ObjectIdentifier) -> String {
    if oid == RSA_ENCRYPTION_OID {
        format!("rsaEncryption {}", oid)
    } else if oid == ED25519_OID {
        format!("Ed25519 {}", oid)
    } else {
        oid.to_string()
    }
}
