//! Authentication client.
//!
//! Ties the session file to the identity service: sign-in through the
//! device flow, token refresh, service credentials from the environment,
//! and identity and organization lookups.

use reqwest::blocking::Client;

use crate::config::Settings;
use crate::error::{KapError, Result};

use super::device::{Clock, DeviceAuthorization, DeviceFlow, SystemClock, TokenExchange};
use super::http::{build_client, ApiClient, ServiceEndpoint};
use super::identity::{Identity, Membership};
use super::session::{ContextPolicy, SessionStore};
use super::token::{decode_claims, Grant, ServiceCredentials, TokenResponse};

/// Signs in, keeps tokens fresh and queries the identity service.
pub struct AuthClient {
    http: Client,
    configured: ServiceEndpoint,
    session: SessionStore,
    credentials: Option<ServiceCredentials>,
    service_token: Option<TokenResponse>,
}

impl AuthClient {
    /// Build a client from settings, the session file and the environment.
    pub fn from_settings(settings: &Settings, session: SessionStore) -> Result<Self> {
        let configured = ServiceEndpoint::new(&settings.base_url, &settings.client_id);
        Self::new(configured, session, ServiceCredentials::from_env()?)
    }

    pub fn new(
        configured: ServiceEndpoint,
        session: SessionStore,
        credentials: Option<ServiceCredentials>,
    ) -> Result<Self> {
        Ok(Self {
            http: build_client()?,
            configured,
            session,
            credentials,
            service_token: None,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Whether service credentials from the environment are in use.
    pub fn uses_service_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Endpoint for requests on behalf of the current credential.
    ///
    /// Service credentials may name their own service; otherwise the
    /// service recorded in the session wins over configuration.
    pub fn endpoint(&self) -> ServiceEndpoint {
        if let Some(credentials) = &self.credentials {
            return ServiceEndpoint::new(
                credentials
                    .base_url
                    .clone()
                    .unwrap_or_else(|| self.configured.base_url.clone()),
                credentials
                    .client_id
                    .clone()
                    .unwrap_or_else(|| self.configured.client_id.clone()),
            );
        }

        self.session
            .endpoint()
            .unwrap_or_else(|| self.configured.clone())
    }

    fn api(&self, endpoint: ServiceEndpoint) -> ApiClient {
        ApiClient::with_client(self.http.clone(), endpoint)
    }

    /// Sign in interactively with the device flow.
    ///
    /// `on_code` is called once with the code the user has to confirm.
    pub fn login<F>(&mut self, on_code: F) -> Result<()>
    where
        F: FnOnce(&DeviceAuthorization),
    {
        let api = self.api(self.configured.clone());
        self.login_with(&api, &SystemClock, on_code)
    }

    /// Device flow sign-in against an explicit endpoint and clock.
    pub fn login_with<E, C, F>(&mut self, exchange: &E, clock: &C, on_code: F) -> Result<()>
    where
        E: TokenExchange + ?Sized,
        C: Clock + ?Sized,
        F: FnOnce(&DeviceAuthorization),
    {
        let mut flow = DeviceFlow::new(exchange, clock);
        let authorization = flow.request_code()?;
        on_code(&authorization);

        let token = flow.poll(&authorization)?;
        tracing::debug!("Device flow completed after {} attempt(s)", flow.attempts());

        self.session
            .save(token, Some(&self.configured), ContextPolicy::Clear)
    }

    /// A usable access token, refreshing or exchanging as needed.
    pub fn ensure_access_token(&mut self) -> Result<String> {
        if let Some(credentials) = &self.credentials {
            if let Some(token) = &self.service_token {
                return Ok(token.access_token.clone());
            }

            let grant = Grant::JwtBearer {
                assertion: credentials.token.clone(),
            };
            tracing::debug!("Exchanging service credentials for an access token");
            let token = self.api(self.endpoint()).exchange(&grant)?;
            let access_token = token.access_token.clone();
            self.service_token = Some(token);
            return Ok(access_token);
        }

        if !self.session.is_authenticated() {
            return Err(KapError::NotAuthenticated);
        }

        if !self.session.is_valid() {
            self.refresh()?;
        }

        self.session
            .access_token()
            .map(String::from)
            .ok_or(KapError::NotAuthenticated)
    }

    /// Refresh a stale session. Returns whether a refresh happened.
    ///
    /// Signed-out users and service credentials are left alone.
    pub fn refresh_if_stale(&mut self) -> Result<bool> {
        if self.credentials.is_some()
            || !self.session.is_authenticated()
            || self.session.is_valid()
        {
            return Ok(false);
        }

        self.refresh()?;
        Ok(true)
    }

    fn refresh(&mut self) -> Result<()> {
        let refresh_token = self
            .session
            .refresh_token()
            .map(String::from)
            .ok_or(KapError::NotAuthenticated)?;

        tracing::debug!("Access token is stale, refreshing");
        let grant = Grant::RefreshToken { refresh_token };
        let token = match self.api(self.endpoint()).exchange(&grant) {
            Ok(token) => token,
            Err(KapError::Service { error, .. }) => {
                tracing::warn!("Refresh token rejected ({}); sign in again", error);
                return Err(KapError::NotAuthenticated);
            }
            Err(KapError::NotFound { .. }) => return Err(KapError::NotAuthenticated),
            Err(e) => return Err(e),
        };

        self.session.save(token, None, ContextPolicy::Preserve)
    }

    /// Identity id of the current credential.
    pub fn current_identity_id(&mut self) -> Result<String> {
        if self.credentials.is_some() {
            let token = self.ensure_access_token()?;
            return decode_claims(&token)?
                .sub
                .ok_or(KapError::NotAuthenticated);
        }

        self.session.current_identity_id().map(String::from)
    }

    fn get<T: serde::de::DeserializeOwned>(&mut self, path: &str) -> Result<Option<T>> {
        let token = self.ensure_access_token()?;
        self.api(self.endpoint()).get_json(path, &token)
    }

    /// Look up an identity by id.
    pub fn identity(&mut self, id: &str) -> Result<Option<Identity>> {
        self.get(&format!("/api/identities/{}", urlencoding::encode(id)))
    }

    /// The signed-in identity.
    pub fn current_identity(&mut self) -> Result<Identity> {
        let id = self.current_identity_id()?;
        self.identity(&id)?
            .ok_or_else(|| KapError::not_found(format!("identity {}", id)))
    }

    /// Organizations the signed-in identity belongs to.
    pub fn memberships(&mut self) -> Result<Vec<Membership>> {
        let id = self.current_identity_id()?;
        let path = format!(
            "/api/identities/{}/memberships?type=organization",
            urlencoding::encode(&id)
        );
        Ok(self.get(&path)?.unwrap_or_default())
    }

    /// Membership of the signed-in identity in the organization `handle`.
    pub fn get_by_handle(&mut self, handle: &str) -> Result<Option<Membership>> {
        self.get(&format!(
            "/api/identities/by-handle/{}/as-member",
            urlencoding::encode(handle)
        ))
    }

    /// Active organization context.
    pub fn current_context(&self) -> Option<&Membership> {
        self.session.context()
    }

    /// Act on behalf of the organization `handle`.
    pub fn switch_context_to(&mut self, handle: &str) -> Result<Membership> {
        let membership = self
            .get_by_handle(handle)?
            .ok_or_else(|| KapError::OrganizationNotFound {
                handle: handle.to_string(),
            })?;

        self.session.set_context(membership.clone())?;
        Ok(membership)
    }

    /// Go back to acting as the individual.
    pub fn remove_context(&mut self) -> Result<()> {
        self.session.clear_context()
    }

    /// Forget the session. Returns whether one existed.
    pub fn logout(&mut self) -> Result<bool> {
        self.session.delete()
    }
}
