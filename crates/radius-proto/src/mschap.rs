//! MS-CHAP v1/v2 challenge-response cryptography (RFC 2433, RFC 2759)
//!
//! All functions are pure. The ident byte that correlates MS-CHAP request and
//! response attributes comes from an [`IdSequence`](crate::sequence::IdSequence)
//! owned by the caller.

use des::Des;
use des::cipher::{BlockEncrypt, KeyInit, generic_array::GenericArray};
use md4::{Digest, Md4};
use sha1::Sha1;

/// RFC 2759 "Magic server to client signing constant"
pub const MAGIC1: &[u8] = b"Magic server to client signing constant";
/// RFC 2759 "Pad to make it do more than one iteration"
pub const MAGIC2: &[u8] = b"Pad to make it do more than one iteration";

/// MD4 over the UTF-16LE encoding of the password (no byte order mark)
pub fn nt_password_hash(password: &str) -> [u8; 16] {
    let mut md4 = Md4::new();
    for unit in password.encode_utf16() {
        md4.update(unit.to_le_bytes());
    }
    md4.finalize().into()
}

fn hash_nt_password_hash(password_hash: &[u8; 16]) -> [u8; 16] {
    Md4::digest(password_hash).into()
}

/// First 8 bytes of SHA-1(peer challenge | authenticator challenge | user name)
pub fn challenge_hash(peer_challenge: &[u8; 16], auth_challenge: &[u8; 16], user_name: &str) -> [u8; 8] {
    let mut sha = Sha1::new();
    sha.update(peer_challenge);
    sha.update(auth_challenge);
    sha.update(user_name.as_bytes());
    let digest = sha.finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Spread 56 key bits over 8 bytes, setting the low (parity) bit of each.
fn des_key(key7: &[u8]) -> [u8; 8] {
    let mut key = [0u8; 8];
    let mut rest = 0u8;
    for (i, &byte) in key7.iter().enumerate().take(7) {
        key[i] = (byte >> i) | rest | 1;
        rest = byte << (7 - i);
    }
    key[7] = rest | 1;
    key
}

fn des_encrypt(clear: &[u8; 8], key7: &[u8]) -> [u8; 8] {
    let key = des_key(key7);
    let cipher = Des::new(GenericArray::from_slice(&key));
    let mut block = GenericArray::clone_from_slice(clear);
    cipher.encrypt_block(&mut block);
    block.into()
}

/// DES-encrypt `challenge` with three keys cut from the zero-extended hash.
pub fn challenge_response(challenge: &[u8; 8], password_hash: &[u8; 16]) -> [u8; 24] {
    let mut zpassword = [0u8; 21];
    zpassword[..16].copy_from_slice(password_hash);

    let mut response = [0u8; 24];
    for (part, key) in response.chunks_exact_mut(8).zip(zpassword.chunks_exact(7)) {
        part.copy_from_slice(&des_encrypt(challenge, key));
    }
    response
}

/// MS-CHAPv1 NT-Response for an 8-byte authenticator challenge
pub fn nt_response_v1(auth_challenge: &[u8; 8], password: &str) -> [u8; 24] {
    challenge_response(auth_challenge, &nt_password_hash(password))
}

/// MS-CHAPv2 NT-Response
pub fn nt_response_v2(
    auth_challenge: &[u8; 16],
    peer_challenge: &[u8; 16],
    user_name: &str,
    password: &str,
) -> [u8; 24] {
    let challenge = challenge_hash(peer_challenge, auth_challenge, user_name);
    challenge_response(&challenge, &nt_password_hash(password))
}

/// MS-CHAPv2 authenticator response, rendered as `S=` and 40 upper-case hex
/// digits.
pub fn authenticator_response(
    password: &str,
    nt_response: &[u8; 24],
    peer_challenge: &[u8; 16],
    auth_challenge: &[u8; 16],
    user_name: &str,
) -> String {
    let password_hash_hash = hash_nt_password_hash(&nt_password_hash(password));

    let mut sha = Sha1::new();
    sha.update(password_hash_hash);
    sha.update(nt_response);
    sha.update(MAGIC1);
    let digest = sha.finalize();

    let challenge = challenge_hash(peer_challenge, auth_challenge, user_name);
    let mut sha = Sha1::new();
    sha.update(digest);
    sha.update(challenge);
    sha.update(MAGIC2);
    let result = sha.finalize();

    format!("S={}", hex::encode_upper(result))
}

/// Equality that does not short-circuit on the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
