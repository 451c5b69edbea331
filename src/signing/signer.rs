use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use snafu::prelude::*;

use crate::common::{Result, SigningSnafu};

type HmacSha1 = Hmac<Sha1>;

/// Standard base64 (RFC 4648 alphabet, '=' padded) of the raw digest.
pub fn encode_signature(digest: &[u8]) -> String {
    STANDARD.encode(digest)
}

/// HMAC-SHA1 of `string_to_sign` keyed with `secret_key`, base64 encoded.
pub fn sign(string_to_sign: &str, secret_key: &str) -> Result<String> {
    ensure!(
        !secret_key.is_empty(),
        SigningSnafu {
            message: "secret key is empty",
        }
    );

    let mut mac = HmacSha1::new_from_slice(secret_key.as_bytes()).map_err(|err| {
        SigningSnafu {
            message: format!("invalid secret key: {err}"),
        }
        .build()
    })?;
    mac.update(string_to_sign.as_bytes());

    Ok(encode_signature(&mac.finalize().into_bytes()))
}
