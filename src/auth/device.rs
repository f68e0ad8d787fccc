//! OAuth2 device authorization flow.
//!
//! ```text
//! Idle -> CodeRequested -> AwaitingVerification -> Polling
//!                                                    |-> Authenticated
//!                                                    |-> Expired
//!                                                    '-> Failed
//! ```
//!
//! Polling is bounded by the deadline the service hands out, not by an
//! attempt count.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{KapError, Result};

use super::session::now_millis;
use super::token::{Grant, TokenResponse};

/// Smallest polling interval honoured, in seconds.
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;

/// Added to the interval when the service answers `slow_down`.
const SLOW_DOWN_STEP_SECS: u64 = 5;

/// Answer to a device code request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,

    /// Verification URI with the user code already filled in.
    #[serde(default)]
    pub verification_uri_complete: Option<String>,

    /// Requested polling interval in seconds.
    #[serde(default)]
    pub interval: Option<u64>,

    /// Seconds until the device code expires.
    pub expires_in: u64,
}

impl DeviceAuthorization {
    /// URI to show the user, preferring the pre-filled variant.
    pub fn browser_uri(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .unwrap_or(&self.verification_uri)
    }

    /// Polling interval with the floor applied.
    pub fn poll_interval(&self) -> Duration {
        let secs = self
            .interval
            .unwrap_or(MIN_POLL_INTERVAL_SECS)
            .max(MIN_POLL_INTERVAL_SECS);
        Duration::from_secs(secs)
    }
}

/// Source of time for polling.
pub trait Clock {
    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Token endpoint operations the flow depends on.
pub trait TokenExchange {
    /// Start a device authorization.
    fn request_device_code(&self) -> Result<DeviceAuthorization>;

    /// Exchange a grant for a token set.
    fn exchange(&self, grant: &Grant) -> Result<TokenResponse>;
}

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFlowState {
    Idle,
    CodeRequested,
    AwaitingVerification,
    Polling,
    Authenticated,
    Expired,
    Failed,
}

/// Drives one device authorization from code request to token.
pub struct DeviceFlow<'a, E: TokenExchange + ?Sized, C: Clock + ?Sized> {
    exchange: &'a E,
    clock: &'a C,
    state: DeviceFlowState,
    requested_at: Option<i64>,
    attempts: u32,
}

impl<'a, E: TokenExchange + ?Sized, C: Clock + ?Sized> DeviceFlow<'a, E, C> {
    pub fn new(exchange: &'a E, clock: &'a C) -> Self {
        Self {
            exchange,
            clock,
            state: DeviceFlowState::Idle,
            requested_at: None,
            attempts: 0,
        }
    }

    pub fn state(&self) -> DeviceFlowState {
        self.state
    }

    /// Number of token exchanges attempted so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Request a device code. The caller shows it to the user.
    pub fn request_code(&mut self) -> Result<DeviceAuthorization> {
        self.state = DeviceFlowState::CodeRequested;
        self.requested_at = Some(self.clock.now_millis());

        match self.exchange.request_device_code() {
            Ok(authorization) => {
                tracing::debug!(
                    "Device code issued, expires in {}s, interval {:?}",
                    authorization.expires_in,
                    authorization.interval
                );
                self.state = DeviceFlowState::AwaitingVerification;
                Ok(authorization)
            }
            Err(e) => {
                self.state = DeviceFlowState::Failed;
                Err(e)
            }
        }
    }

    /// Poll until the user approves, the code expires, or the service fails.
    pub fn poll(&mut self, authorization: &DeviceAuthorization) -> Result<TokenResponse> {
        let requested_at = match (self.state, self.requested_at) {
            (DeviceFlowState::AwaitingVerification, Some(at)) => at,
            _ => {
                return Err(KapError::Other(anyhow::anyhow!(
                    "Device flow polled in state {:?}",
                    self.state
                )))
            }
        };

        let expires_in_millis = i64::try_from(authorization.expires_in)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000);
        let deadline = requested_at.saturating_add(expires_in_millis);
        let mut interval = authorization.poll_interval();
        let grant = Grant::DeviceCode {
            device_code: authorization.device_code.clone(),
        };

        self.state = DeviceFlowState::Polling;

        loop {
            self.clock.sleep(interval);

            if self.clock.now_millis() > deadline {
                self.state = DeviceFlowState::Expired;
                return Err(KapError::VerificationTimeout);
            }

            self.attempts += 1;
            match self.exchange.exchange(&grant) {
                Ok(token) => {
                    self.state = DeviceFlowState::Authenticated;
                    return Ok(token);
                }
                Err(e) if e.is_authorization_pending() => {
                    tracing::trace!("Authorization pending (attempt {})", self.attempts);
                }
                Err(e) if e.is_slow_down() => {
                    interval += Duration::from_secs(SLOW_DOWN_STEP_SECS);
                    tracing::debug!("Service asked to slow down, polling every {:?}", interval);
                }
                Err(e) => {
                    self.state = DeviceFlowState::Failed;
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Clock that advances only when slept on.
    pub struct FakeClock {
        now: Cell<i64>,
        pub sleeps: RefCell<Vec<Duration>>,
    }

    impl FakeClock {
        pub fn at(now: i64) -> Self {
            Self {
                now: Cell::new(now),
                sleeps: RefCell::new(Vec::new()),
            }
        }
    }

    impl Clock for FakeClock {
        fn now_millis(&self) -> i64 {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
            self.now.set(self.now.get() + duration.as_millis() as i64);
        }
    }

    pub fn service_error(error: &str) -> KapError {
        KapError::Service {
            status: 400,
            error: error.to_string(),
            description: None,
        }
    }

    /// Token endpoint replaying scripted answers.
    pub struct ScriptedExchange {
        pub authorization: DeviceAuthorization,
        pub answers: RefCell<VecDeque<Result<TokenResponse>>>,
        pub calls: Cell<u32>,
    }

    impl ScriptedExchange {
        pub fn new(expires_in: u64, interval: Option<u64>) -> Self {
            Self {
                authorization: DeviceAuthorization {
                    device_code: "dev-123".into(),
                    user_code: "ABCD-EFGH".into(),
                    verification_uri: "https://auth.example.test/device".into(),
                    verification_uri_complete: None,
                    interval,
                    expires_in,
                },
                answers: RefCell::new(VecDeque::new()),
                calls: Cell::new(0),
            }
        }

        pub fn then(self, answer: Result<TokenResponse>) -> Self {
            self.answers.borrow_mut().push_back(answer);
            self
        }
    }

    impl TokenExchange for ScriptedExchange {
        fn request_device_code(&self) -> Result<DeviceAuthorization> {
            Ok(self.authorization.clone())
        }

        fn exchange(&self, _grant: &Grant) -> Result<TokenResponse> {
            self.calls.set(self.calls.get() + 1);
            self.answers
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(service_error("authorization_pending")))
        }
    }
}
