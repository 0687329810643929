//! Google Sheets record store adapter.
//!
//! One worksheet, one row per member, columns A..E =
//! {identifier, username, full name, paid flag, expiry date}. Row 1 is the
//! header. Reads and appends go through the Sheets REST v4 API with a
//! service-account bearer token minted locally (RS256 assertion exchanged at
//! the key's token endpoint) and cached until shortly before it expires.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{MembershipError, MembershipResult};
use crate::record::{MemberRecord, NewMemberRecord};
use crate::store::{RecordStore, RowRef};

const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Tokens are refreshed this long before their reported expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The subset of the service-account JSON key file the adapter uses.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Record store backed by one worksheet of a Google spreadsheet.
pub struct SheetsStore {
    http: reqwest::Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    spreadsheet_id: String,
    sheet_name: String,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl SheetsStore {
    /// Loads the service-account key file and prepares the signing key.
    pub fn from_key_file(
        http: reqwest::Client,
        key_path: impl AsRef<Path>,
        spreadsheet_id: String,
        sheet_name: String,
    ) -> MembershipResult<Self> {
        let raw = std::fs::read_to_string(key_path.as_ref()).map_err(|e| {
            MembershipError::Config(format!(
                "Failed to read service account file {}: {}",
                key_path.as_ref().display(),
                e
            ))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
            MembershipError::Config(format!("Malformed service account file: {}", e))
        })?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| MembershipError::Auth(format!("Unusable private key: {}", e)))?;
        Ok(Self {
            http,
            key,
            signing_key,
            spreadsheet_id,
            sheet_name,
            base_url: SHEETS_ENDPOINT.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Returns a bearer token, exchanging a fresh assertion when the cached
    /// one is missing or about to expire.
    async fn bearer_token(&self) -> MembershipResult<String> {
        let mut slot = self.token.lock().await;
        if let Some(cached) = slot.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < cached.expires_at {
                return Ok(cached.value.clone());
            }
        }
        let fresh = self.exchange_token().await?;
        debug!(expires_in = fresh.expires_in, "refreshed sheets access token");
        let value = fresh.access_token.clone();
        *slot = Some(CachedToken {
            value: fresh.access_token,
            expires_at: Instant::now() + Duration::from_secs(fresh.expires_in),
        });
        Ok(value)
    }

    async fn exchange_token(&self) -> MembershipResult<TokenResponse> {
        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| MembershipError::Auth(format!("Failed to sign assertion: {}", e)))?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MembershipError::Auth(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(MembershipError::Auth(format!(
                "Token endpoint error ({}): {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MembershipError::Auth(format!("Malformed token response: {}", e)))
    }

    /// Reads the whole value grid of the worksheet (header included).
    async fn fetch_values(&self) -> MembershipResult<Vec<Vec<String>>> {
        let url = format!(
            "{}/{}/values/{}",
            self.base_url, self.spreadsheet_id, self.sheet_name
        );
        let range = self.get_range(&url).await?;
        Ok(range.values)
    }

    async fn get_range(&self, url: &str) -> MembershipResult<ValueRange> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| MembershipError::Store(format!("Failed to read sheet: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(MembershipError::Store(format!(
                "Sheets API error ({}): {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MembershipError::Store(format!("Malformed sheet response: {}", e)))
    }
}

/// Drops the header row and every row without a usable identifier.
fn records_from_values(values: &[Vec<String>]) -> Vec<MemberRecord> {
    values
        .iter()
        .skip(1)
        .filter_map(|row| MemberRecord::from_cells(row))
        .collect()
}

#[async_trait]
impl RecordStore for SheetsStore {
    async fn find_row(&self, member_id: i64) -> MembershipResult<Option<RowRef>> {
        let needle = member_id.to_string();
        let values = self.fetch_values().await?;
        for (idx, row) in values.iter().enumerate() {
            let id_cell = row.first().map_or("", |s| s.trim());
            if id_cell == needle {
                // Sheet rows are 1-based.
                return Ok(Some(RowRef(idx as u32 + 1)));
            }
        }
        Ok(None)
    }

    async fn read_row(&self, row: RowRef) -> MembershipResult<MemberRecord> {
        let url = format!(
            "{}/{}/values/{}!A{}:E{}",
            self.base_url, self.spreadsheet_id, self.sheet_name, row.0, row.0
        );
        let range = self.get_range(&url).await?;
        let cells = range.values.into_iter().next().unwrap_or_default();
        MemberRecord::from_cells(&cells).ok_or_else(|| {
            MembershipError::Store(format!("Row {} has no usable member id", row.0))
        })
    }

    async fn append_row(&self, record: &NewMemberRecord) -> MembershipResult<()> {
        let url = format!(
            "{}/{}/values/{}:append",
            self.base_url, self.spreadsheet_id, self.sheet_name
        );
        let token = self.bearer_token().await?;
        let body = serde_json::json!({ "values": [record.to_cells()] });
        let response = self
            .http
            .post(&url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| MembershipError::Store(format!("Failed to append row: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(MembershipError::Store(format!(
                "Sheets append error ({}): {}",
                status, error_body
            )));
        }
        Ok(())
    }

    async fn list_rows(&self) -> MembershipResult<Vec<MemberRecord>> {
        let values = self.fetch_values().await?;
        Ok(records_from_values(&values))
    }
}

#[cfg(test)]
impl SheetsStore {
    /// Store wired to a local mock server with a pre-seeded token, so tests
    /// exercise the wire protocol without the signing flow.
    fn for_tests(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            key: ServiceAccountKey {
                client_email: "svc@test.iam.gserviceaccount.com".to_string(),
                private_key: String::new(),
                token_uri: "http://127.0.0.1:0/token".to_string(),
            },
            signing_key: EncodingKey::from_secret(b"unused"),
            spreadsheet_id: "sheet-1".to_string(),
            sheet_name: "Members".to_string(),
            base_url,
            token: Mutex::new(Some(CachedToken {
                value: "test-token".to_string(),
                expires_at: Instant::now() + Duration::from_secs(3600),
            })),
        }
    }
}
