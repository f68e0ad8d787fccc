//! Persisted sign-in session.
//!
//! The session file holds the latest token set, the identity service it
//! came from, and the active organization context. Child commands receive
//! its path in `KAP_CREDENTIALS` and may read it themselves.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{KapError, Result};

use super::http::ServiceEndpoint;
use super::identity::Membership;
use super::token::{decode_claims, TokenResponse};

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// What happens to the organization context when a token is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPolicy {
    /// Reset to acting as the individual (fresh sign-in).
    Clear,
    /// Keep the active context (token refresh).
    Preserve,
}

/// On-disk session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Epoch millis after which the access token is stale.
    #[serde(default)]
    pub expire_time: i64,

    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub client_id: String,

    /// Active organization membership; `null` when acting as the individual.
    #[serde(default)]
    pub context: Option<Membership>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Loads, updates and persists the session file.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    record: Option<SessionRecord>,
    identity_id: Option<String>,
}

impl SessionStore {
    /// Load the session at `path`. A missing file means signed out.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let record = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => None,
            Ok(content) => Some(serde_json::from_str::<SessionRecord>(&content).map_err(
                |e| KapError::ManifestParse {
                    path: path.clone(),
                    message: e.to_string(),
                },
            )?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let identity_id = record.as_ref().and_then(|r| subject_of(&r.access_token));

        Ok(Self {
            path,
            record,
            identity_id,
        })
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }

    /// Whether a session has been loaded or saved.
    pub fn is_authenticated(&self) -> bool {
        self.record.is_some()
    }

    /// Whether the access token is still fresh.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_millis())
    }

    /// Whether the access token is fresh at `now` (epoch millis).
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.record.as_ref().is_some_and(|r| now < r.expire_time)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.record
            .as_ref()
            .and_then(|r| r.refresh_token.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// Identity service the session belongs to, if recorded.
    pub fn endpoint(&self) -> Option<ServiceEndpoint> {
        let record = self.record.as_ref()?;
        if record.base_url.is_empty() {
            return None;
        }
        Some(ServiceEndpoint::new(&record.base_url, &record.client_id))
    }

    /// Active organization context.
    pub fn context(&self) -> Option<&Membership> {
        self.record.as_ref().and_then(|r| r.context.as_ref())
    }

    /// Subject of the current access token.
    pub fn current_identity_id(&self) -> Result<&str> {
        self.identity_id
            .as_deref()
            .ok_or(KapError::NotAuthenticated)
    }

    /// Merge a new token set into the session and persist it.
    ///
    /// `endpoint` stamps the service the token came from; when `None` the
    /// previously recorded service is kept.
    pub fn save(
        &mut self,
        token: TokenResponse,
        endpoint: Option<&ServiceEndpoint>,
        policy: ContextPolicy,
    ) -> Result<()> {
        self.save_at(token, endpoint, policy, now_millis())
    }

    /// [`save`](Self::save) with an explicit issue time.
    pub fn save_at(
        &mut self,
        token: TokenResponse,
        endpoint: Option<&ServiceEndpoint>,
        policy: ContextPolicy,
        issued_at: i64,
    ) -> Result<()> {
        let expire_time = token.expire_time(issued_at);
        let previous = self.record.take();

        let (base_url, client_id) = match (endpoint, previous.as_ref()) {
            (Some(endpoint), _) => (endpoint.base_url.clone(), endpoint.client_id.clone()),
            (None, Some(prev)) => (prev.base_url.clone(), prev.client_id.clone()),
            (None, None) => (String::new(), String::new()),
        };

        let context = match policy {
            ContextPolicy::Clear => None,
            ContextPolicy::Preserve => previous.as_ref().and_then(|p| p.context.clone()),
        };

        let mut extra = previous.as_ref().map(|p| p.extra.clone()).unwrap_or_default();
        extra.extend(token.extra);

        // A refresh response may omit the refresh token; keep the old one
        let refresh_token = token
            .refresh_token
            .or_else(|| previous.as_ref().and_then(|p| p.refresh_token.clone()));

        let record = SessionRecord {
            access_token: token.access_token,
            refresh_token,
            token_type: token.token_type,
            expire_time,
            base_url,
            client_id,
            context,
            extra,
        };

        self.identity_id = subject_of(&record.access_token);
        self.record = Some(record);
        self.persist()
    }

    /// Switch back to acting as the individual.
    pub fn clear_context(&mut self) -> Result<()> {
        self.update_context(None)
    }

    /// Act on behalf of an organization.
    pub fn set_context(&mut self, membership: Membership) -> Result<()> {
        self.update_context(Some(membership))
    }

    fn update_context(&mut self, context: Option<Membership>) -> Result<()> {
        let record = self.record.as_mut().ok_or(KapError::NotAuthenticated)?;
        record.context = context;
        self.persist()
    }

    /// Remove the session file. Returns whether there was one.
    pub fn delete(&mut self) -> Result<bool> {
        self.record = None;
        self.identity_id = None;

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self) -> Result<()> {
        let Some(record) = &self.record else {
            return Ok(());
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| KapError::Other(anyhow::anyhow!("Failed to serialize session: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        restrict_permissions(&temp_path)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

fn subject_of(access_token: &str) -> Option<String> {
    match decode_claims(access_token) {
        Ok(claims) => claims.sub,
        Err(e) => {
            tracing::debug!("Could not read access token claims: {}", e);
            None
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::make_jwt;
    use serde_json::json;
    use tempfile::TempDir;

    fn token(sub: &str, refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: make_jwt(&json!({ "sub": sub })),
            refresh_token: refresh.map(String::from),
            token_type: Some("Bearer".into()),
            expires_in: Some(60),
            extra: Map::new(),
        }
    }

    fn membership(handle: &str) -> Membership {
        serde_json::from_value(json!({
            "identity": { "id": format!("id-{handle}"), "handle": handle, "type": "organization" }
        }))
        .unwrap()
    }

    fn endpoint() -> ServiceEndpoint {
        ServiceEndpoint::new("https://auth.example.test", "client-1")
    }

    #[test]
    fn missing_file_is_unauthenticated() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::load(temp.path().join("authentication.json")).unwrap();

        assert!(!store.is_authenticated());
        assert!(!store.is_valid());
        assert!(matches!(
            store.current_identity_id(),
            Err(KapError::NotAuthenticated)
        ));
    }

    #[test]
    fn staleness_boundaries() {
        let temp = TempDir::new().unwrap();
        let mut store = SessionStore::load(temp.path().join("auth.json")).unwrap();
        store
            .save_at(token("u1", None), Some(&endpoint()), ContextPolicy::Clear, 0)
            .unwrap();
        let expire = store.record().unwrap().expire_time;

        assert_eq!(expire, 60_000);
        assert!(!store.is_valid_at(expire + 1));
        assert!(!store.is_valid_at(expire));
        assert!(store.is_valid_at(expire - 60_000));
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("auth.json");
        let mut store = SessionStore::load(&path).unwrap();
        store
            .save(token("user-7", Some("r1")), Some(&endpoint()), ContextPolicy::Clear)
            .unwrap();

        let loaded = SessionStore::load(&path).unwrap();

        assert_eq!(loaded.current_identity_id().unwrap(), "user-7");
        assert_eq!(loaded.refresh_token(), Some("r1"));
        assert_eq!(
            loaded.endpoint().unwrap().base_url,
            "https://auth.example.test"
        );
        assert!(loaded.is_valid());

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["context"].is_null());
        assert!(raw["expire_time"].is_i64());
    }

    #[test]
    fn refresh_preserves_context_and_service() {
        let temp = TempDir::new().unwrap();
        let mut store = SessionStore::load(temp.path().join("auth.json")).unwrap();
        store
            .save(token("u1", Some("r1")), Some(&endpoint()), ContextPolicy::Clear)
            .unwrap();
        store.set_context(membership("acme")).unwrap();

        store
            .save(token("u1", None), None, ContextPolicy::Preserve)
            .unwrap();

        assert_eq!(store.context().unwrap().handle(), "acme");
        assert_eq!(store.refresh_token(), Some("r1"));
        assert_eq!(store.endpoint().unwrap().client_id, "client-1");
    }

    #[test]
    fn login_clears_context() {
        let temp = TempDir::new().unwrap();
        let mut store = SessionStore::load(temp.path().join("auth.json")).unwrap();
        store
            .save(token("u1", None), Some(&endpoint()), ContextPolicy::Clear)
            .unwrap();
        store.set_context(membership("acme")).unwrap();

        store
            .save(token("u2", None), Some(&endpoint()), ContextPolicy::Clear)
            .unwrap();

        assert!(store.context().is_none());
        assert_eq!(store.current_identity_id().unwrap(), "u2");
    }

    #[test]
    fn unknown_token_fields_are_preserved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("auth.json");
        let mut response = token("u1", None);
        response.extra.insert("scope".into(), json!("openid"));

        let mut store = SessionStore::load(&path).unwrap();
        store
            .save(response, Some(&endpoint()), ContextPolicy::Clear)
            .unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["scope"], "openid");
    }

    #[test]
    fn context_changes_persist() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("auth.json");
        let mut store = SessionStore::load(&path).unwrap();
        store
            .save(token("u1", None), Some(&endpoint()), ContextPolicy::Clear)
            .unwrap();

        store.set_context(membership("acme")).unwrap();
        assert_eq!(
            SessionStore::load(&path).unwrap().context().unwrap().handle(),
            "acme"
        );

        store.clear_context().unwrap();
        assert!(SessionStore::load(&path).unwrap().context().is_none());
    }

    #[test]
    fn context_requires_a_session() {
        let temp = TempDir::new().unwrap();
        let mut store = SessionStore::load(temp.path().join("auth.json")).unwrap();
        assert!(matches!(
            store.set_context(membership("acme")),
            Err(KapError::NotAuthenticated)
        ));
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("auth.json");
        let mut store = SessionStore::load(&path).unwrap();
        store
            .save(token("u1", None), Some(&endpoint()), ContextPolicy::Clear)
            .unwrap();

        assert!(store.delete().unwrap());
        assert!(!path.exists());
        assert!(!store.delete().unwrap());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn malformed_session_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("auth.json");
        fs::write(&path, "{ nope").unwrap();

        assert!(matches!(
            SessionStore::load(&path),
            Err(KapError::ManifestParse { .. })
        ));
    }
}
