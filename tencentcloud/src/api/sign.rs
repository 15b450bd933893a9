//! TC3-HMAC-SHA256 request signing

use super::error::ApiError;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host";

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct Credential {
    pub secret_id: String,
    pub secret_key: String,
    pub token: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>, ApiError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ApiError::Signing(format!("invalid signing key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// UTC date of a unix timestamp, as used in the credential scope
fn scope_date(timestamp: i64) -> Result<String, ApiError> {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .ok_or_else(|| ApiError::Signing(format!("timestamp {} out of range", timestamp)))
}

fn canonical_request(host: &str, payload: &str) -> String {
    format!(
        "POST\n/\n\ncontent-type:{}\nhost:{}\n\n{}\n{}",
        CONTENT_TYPE,
        host,
        SIGNED_HEADERS,
        sha256_hex(payload.as_bytes())
    )
}

/// Value of the Authorization header for one POST request
pub fn authorization(
    credential: &Credential,
    service: &str,
    host: &str,
    timestamp: i64,
    payload: &str,
) -> Result<String, ApiError> {
    let date = scope_date(timestamp)?;
    let scope = format!("{}/{}/tc3_request", date, service);

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        timestamp,
        scope,
        sha256_hex(canonical_request(host, payload).as_bytes())
    );

    let secret_date = hmac_sha256(format!("TC3{}", credential.secret_key).as_bytes(), &date)?;
    let secret_service = hmac_sha256(&secret_date, service)?;
    let secret_signing = hmac_sha256(&secret_service, "tc3_request")?;
    let signature = hex::encode(hmac_sha256(&secret_signing, &string_to_sign)?);

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credential.secret_id, scope, SIGNED_HEADERS, signature
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential {
            secret_id: "AKIDEXAMPLE".to_string(),
            secret_key: "secretEXAMPLE".to_string(),
            token: None,
        }
    }

    #[test]
    fn canonical_request_hash_matches_reference() {
        let canonical = canonical_request("vpc.tencentcloudapi.com", r#"{"FlowLogIds":["fl-1"]}"#);
        assert_eq!(
            sha256_hex(canonical.as_bytes()),
            "b8a646d035e6d7ee02de2c7347224eb4db0de90f09a8735b4dd40bfc23e19876"
        );
    }

    #[test]
    fn authorization_matches_reference_signature() {
        let header = authorization(
            &credential(),
            "vpc",
            "vpc.tencentcloudapi.com",
            1_700_000_000,
            r#"{"FlowLogIds":["fl-1"]}"#,
        )
        .unwrap();

        assert_eq!(
            header,
            "TC3-HMAC-SHA256 Credential=AKIDEXAMPLE/2023-11-14/vpc/tc3_request, \
             SignedHeaders=content-type;host, \
             Signature=c8ac83e5f20702163b8e88b9c12d98836c2ea9f4d4af91f70e8d24d2b42f9093"
        );
    }

    #[test]
    fn signature_depends_on_payload() {
        let a = authorization(&credential(), "vpc", "h", 1_700_000_000, "{}").unwrap();
        let b = authorization(&credential(), "vpc", "h", 1_700_000_000, "{ }").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn debug_hides_secrets() {
        let text = format!("{:?}", credential());
        assert!(!text.contains("secretEXAMPLE"));
    }
}
