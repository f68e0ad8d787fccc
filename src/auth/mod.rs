//! Sign-in and identity.
//!
//! - [`SessionStore`] owns `~/.kapeta/authentication.json`
//! - [`DeviceFlow`] runs the OAuth2 device authorization grant
//! - [`AuthClient`] refreshes tokens and talks to the identity API
//!
//! Automation can skip the interactive flow by setting
//! `KAP_CREDENTIALS_TOKEN` to base-64 encoded JSON holding a signed
//! assertion; see [`ServiceCredentials`].

pub mod client;
pub mod device;
pub mod http;
pub mod identity;
pub mod session;
pub mod token;

pub use client::AuthClient;
pub use device::{
    Clock, DeviceAuthorization, DeviceFlow, DeviceFlowState, SystemClock, TokenExchange,
};
pub use http::{ApiClient, ServiceEndpoint};
pub use identity::{Identity, Membership};
pub use session::{ContextPolicy, SessionRecord, SessionStore};
pub use token::{Claims, Grant, ServiceCredentials, TokenResponse, CREDENTIALS_TOKEN_ENV};
