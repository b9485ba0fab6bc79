//! Signing and encryption of parts through injected providers.
//!
//! The crate implements no cryptography. A [`KeystoreResolver`] turns a
//! keystore id into a [`Keystore`], the keystore turns aliases into
//! [`Certificate`]s, and a [`CryptoProvider`] produces the wrapped part.
//! [`CryptoBridge`] enforces the argument and resolution rules around them.

use crate::error::{Error, Result};
use crate::header::Header;
use crate::part::Part;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Signature algorithms a provider may be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureAlgorithm {
    /// SHA-1 with RSA.
    Sha1WithRsa,
    /// SHA-224 with RSA.
    Sha224WithRsa,
    /// SHA-256 with RSA.
    Sha256WithRsa,
    /// SHA-384 with RSA.
    Sha384WithRsa,
    /// SHA-512 with RSA.
    #[default]
    Sha512WithRsa,
}

impl SignatureAlgorithm {
    /// Returns the `micalg` parameter value (RFC 5751).
    pub fn micalg(self) -> &'static str {
        match self {
            Self::Sha1WithRsa => "sha-1",
            Self::Sha224WithRsa => "sha-224",
            Self::Sha256WithRsa => "sha-256",
            Self::Sha384WithRsa => "sha-384",
            Self::Sha512WithRsa => "sha-512",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha1WithRsa => "SHA1withRSA",
            Self::Sha224WithRsa => "SHA224withRSA",
            Self::Sha256WithRsa => "SHA256withRSA",
            Self::Sha384WithRsa => "SHA384withRSA",
            Self::Sha512WithRsa => "SHA512withRSA",
        };
        f.write_str(name)
    }
}

/// An opaque certificate as stored in a keystore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    alias: String,
    der: Bytes,
}

impl Certificate {
    /// Creates a certificate from its DER encoding.
    pub fn new(alias: impl Into<String>, der: impl Into<Bytes>) -> Self {
        Self {
            alias: alias.into(),
            der: der.into(),
        }
    }

    /// Returns the alias the certificate was resolved from.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns the DER encoding.
    pub fn der(&self) -> &Bytes {
        &self.der
    }
}

/// A keystore holding certificates and, for signing, private keys.
pub trait Keystore: Send + Sync {
    /// Returns the certificate stored under `alias`.
    fn certificate(&self, alias: &str) -> Option<Certificate>;
}

/// Looks up keystores by id.
pub trait KeystoreResolver: Send + Sync {
    /// Returns the keystore registered under `keystore_id`.
    fn resolve(&self, keystore_id: &str) -> Option<Arc<dyn Keystore>>;
}

/// The cryptographic primitives.
pub trait CryptoProvider: Send + Sync {
    /// Signs `part` with the keys of `signers`, returning the signed envelope.
    fn sign(
        &self,
        part: Part,
        algorithm: SignatureAlgorithm,
        keystore: &dyn Keystore,
        signers: &[Certificate],
    ) -> Result<Part>;

    /// Encrypts `part` for `recipients`, returning the encrypted envelope.
    fn encrypt(&self, part: Part, recipients: &[Certificate]) -> Result<Part>;
}

/// Resolves certificates and delegates signing and encryption to a provider.
pub struct CryptoBridge<R, P> {
    resolver: R,
    provider: P,
}

impl<R, P> CryptoBridge<R, P>
where
    R: KeystoreResolver,
    P: CryptoProvider,
{
    /// Creates a bridge over a keystore resolver and a crypto provider.
    pub fn new(resolver: R, provider: P) -> Self {
        Self { resolver, provider }
    }

    /// Signs a part with the certificates stored under `aliases`.
    ///
    /// The algorithm defaults to SHA-512 with RSA. Fails with
    /// [`Error::InvalidArgument`] when no alias is given and with
    /// [`Error::KeyResolution`] when the keystore or an alias is unknown.
    pub fn sign<S: AsRef<str>>(
        &self,
        part: Part,
        algorithm: Option<SignatureAlgorithm>,
        keystore_id: &str,
        aliases: &[S],
    ) -> Result<Part> {
        let algorithm = algorithm.unwrap_or_default();
        let (keystore, signers) = self.resolve(keystore_id, aliases)?;
        tracing::debug!(%algorithm, keystore_id, signers = signers.len(), "signing part");
        self.provider.sign(part, algorithm, keystore.as_ref(), &signers)
    }

    /// Encrypts a part for the certificates stored under `aliases`.
    ///
    /// Fails like [`sign`](Self::sign) on missing or unknown aliases.
    pub fn encrypt<S: AsRef<str>>(
        &self,
        part: Part,
        keystore_id: &str,
        aliases: &[S],
    ) -> Result<Part> {
        let (_, recipients) = self.resolve(keystore_id, aliases)?;
        tracing::debug!(keystore_id, recipients = recipients.len(), "encrypting part");
        self.provider.encrypt(part, &recipients)
    }

    fn resolve<S: AsRef<str>>(
        &self,
        keystore_id: &str,
        aliases: &[S],
    ) -> Result<(Arc<dyn Keystore>, Vec<Certificate>)> {
        if aliases.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one certificate alias is required".to_string(),
            ));
        }

        let keystore = self
            .resolver
            .resolve(keystore_id)
            .ok_or_else(|| Error::KeyResolution(format!("invalid keystore id: {}", keystore_id)))?;

        let certificates = aliases
            .iter()
            .map(|alias| {
                let alias = alias.as_ref();
                keystore.certificate(alias).ok_or_else(|| {
                    Error::KeyResolution(format!("could not find certificate for alias: {}", alias))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((keystore, certificates))
    }
}

/// Wraps content and a detached signature in a `multipart/signed` envelope (RFC 5751).
pub fn signed_envelope(
    content: Part,
    signature: impl Into<Bytes>,
    algorithm: SignatureAlgorithm,
) -> Result<Part> {
    let signature = Part::bytes(
        signature,
        vec![
            Header::with_comments(
                "Content-Type",
                "application/pkcs7-signature",
                ["name=smime.p7s"],
            )?,
            Header::new("Content-Transfer-Encoding", "base64")?,
            Header::with_comments("Content-Disposition", "attachment", ["filename=smime.p7s"])?,
        ],
    );

    Ok(Part::multi(
        vec![content, signature],
        vec![Header::with_comments(
            "Content-Type",
            "multipart/signed",
            [
                "protocol=\"application/pkcs7-signature\"".to_string(),
                format!("micalg={}", algorithm.micalg()),
            ],
        )?],
    ))
}

/// Wraps ciphertext in an `application/pkcs7-mime` enveloped-data part (RFC 5751).
pub fn enveloped_part(ciphertext: impl Into<Bytes>) -> Result<Part> {
    Ok(Part::bytes(
        ciphertext,
        vec![
            Header::with_comments(
                "Content-Type",
                "application/pkcs7-mime",
                ["smime-type=enveloped-data", "name=smime.p7m"],
            )?,
            Header::new("Content-Transfer-Encoding", "base64")?,
            Header::with_comments("Content-Disposition", "attachment", ["filename=smime.p7m"])?,
        ],
    ))
}
