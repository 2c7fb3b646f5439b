//! Firefox `logins.json` field decryption.
//!
//! Each encrypted field is base64 of a DER structure:
//!
//! ```text
//! SEQUENCE {
//!   OCTET STRING      key id
//!   SEQUENCE { OBJECT IDENTIFIER cipher, OCTET STRING iv }
//!   OCTET STRING      ciphertext
//! }
//! ```
//!
//! Only AES-256-CBC envelopes are supported; the master key is the 32-byte
//! key already unwrapped from `key4.db` by the caller.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::SourceError;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const TAG_OCTET_STRING: u8 = 0x04;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

/// 2.16.840.1.101.3.4.1.42
const OID_AES256_CBC: &[u8] = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x2A];
/// 1.2.840.113549.3.7
const OID_DES_EDE3_CBC: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x03, 0x07];

/// Decoded login envelope.
#[derive(Debug, PartialEq, Eq)]
pub struct LoginEnvelope<'a> {
    pub key_id: &'a [u8],
    pub cipher_oid: &'a [u8],
    pub iv: &'a [u8],
    pub ciphertext: &'a [u8],
}

/// Decrypt one base64 field from `logins.json`.
pub fn decrypt_login_field(master_key: &[u8], field: &str) -> Result<String, SourceError> {
    let der = STANDARD.decode(field.trim())?;
    let envelope = parse_envelope(&der)?;
    let plain = decrypt_envelope(master_key, &envelope)?;
    Ok(String::from_utf8_lossy(&plain).into_owned())
}

pub fn decrypt_envelope(master_key: &[u8], envelope: &LoginEnvelope<'_>) -> Result<Vec<u8>, SourceError> {
    if envelope.cipher_oid == OID_DES_EDE3_CBC {
        return Err(SourceError::Decrypt(
            "unsupported login cipher des-ede3-cbc".to_string(),
        ));
    }
    if envelope.cipher_oid != OID_AES256_CBC {
        return Err(SourceError::Decrypt("unknown login cipher".to_string()));
    }

    let key = master_key.get(..32).ok_or_else(|| {
        SourceError::Decrypt(format!("master key too short: {} bytes", master_key.len()))
    })?;
    let cipher = Aes256CbcDec::new_from_slices(key, envelope.iv)
        .map_err(|_| SourceError::Decrypt(format!("invalid IV length {}", envelope.iv.len())))?;

    let mut buf = envelope.ciphertext.to_vec();
    let plain = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|e| SourceError::Decrypt(format!("AES-CBC decryption failed: {:?}", e)))?;
    Ok(plain.to_vec())
}

pub fn parse_envelope(der: &[u8]) -> Result<LoginEnvelope<'_>, SourceError> {
    let (outer, _) = read_tlv(der, TAG_SEQUENCE)?;
    let (key_id, rest) = read_tlv(outer, TAG_OCTET_STRING)?;
    let (algo, rest) = read_tlv(rest, TAG_SEQUENCE)?;
    let (ciphertext, _) = read_tlv(rest, TAG_OCTET_STRING)?;

    let (cipher_oid, algo_rest) = read_tlv(algo, TAG_OID)?;
    let (iv, _) = read_tlv(algo_rest, TAG_OCTET_STRING)?;

    Ok(LoginEnvelope {
        key_id,
        cipher_oid,
        iv,
        ciphertext,
    })
}

/// Read one DER element with the expected tag; returns (content, remainder).
fn read_tlv(input: &[u8], tag: u8) -> Result<(&[u8], &[u8]), SourceError> {
    let malformed = |what: &str| SourceError::Decrypt(format!("malformed DER: {}", what));

    let (&actual, rest) = input.split_first().ok_or_else(|| malformed("truncated tag"))?;
    if actual != tag {
        return Err(malformed(&format!("expected tag {:#04x}, found {:#04x}", tag, actual)));
    }

    let (&first, mut rest) = rest.split_first().ok_or_else(|| malformed("truncated length"))?;
    let len = if first & 0x80 == 0 {
        usize::from(first)
    } else {
        let count = usize::from(first & 0x7F);
        if count == 0 || count > std::mem::size_of::<usize>() || rest.len() < count {
            return Err(malformed("bad length"));
        }
        let (bytes, tail) = rest.split_at(count);
        rest = tail;
        bytes.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b))
    };

    if rest.len() < len {
        return Err(malformed("content exceeds input"));
    }
    Ok(rest.split_at(len))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use aes::cipher::BlockEncryptMut;

    type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

    fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        let len = content.len();
        if len < 0x80 {
            out.push(len as u8);
        } else if len <= 0xFF {
            out.extend_from_slice(&[0x81, len as u8]);
        } else {
            out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]);
        }
        out.extend_from_slice(content);
        out
    }

    pub fn encrypt_login_field(master_key: &[u8], plain: &str) -> String {
        let iv = [5u8; 16];
        let mut buf = vec![0u8; plain.len() + 16];
        let ct = Aes256CbcEnc::new_from_slices(&master_key[..32], &iv)
            .unwrap()
            .encrypt_padded_b2b_mut::<Pkcs7>(plain.as_bytes(), &mut buf)
            .unwrap()
            .to_vec();

        let algo = [tlv(TAG_OID, OID_AES256_CBC), tlv(TAG_OCTET_STRING, &iv)].concat();
        let body = [
            tlv(TAG_OCTET_STRING, &[0xF8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
            tlv(TAG_SEQUENCE, &algo),
            tlv(TAG_OCTET_STRING, &ct),
        ]
        .concat();
        STANDARD.encode(tlv(TAG_SEQUENCE, &body))
    }

    pub fn des_envelope() -> String {
        let algo = [tlv(TAG_OID, OID_DES_EDE3_CBC), tlv(TAG_OCTET_STRING, &[1u8; 8])].concat();
        let body = [
            tlv(TAG_OCTET_STRING, &[1u8; 16]),
            tlv(TAG_SEQUENCE, &algo),
            tlv(TAG_OCTET_STRING, &[2u8; 16]),
        ]
        .concat();
        STANDARD.encode(tlv(TAG_SEQUENCE, &body))
    }
}
