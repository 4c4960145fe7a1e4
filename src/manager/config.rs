// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration types for the registry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;
use crate::session::Credentials;

const DEFAULT_SESSION_RETRY_ATTEMPTS: u32 = 8;
const DEFAULT_SESSION_BACKOFF_FACTOR: f64 = 0.1;
const DEFAULT_SOCKET_RECONNECT_ATTEMPTS: u32 = 3;
const DEFAULT_SOCKET_BACKOFF_FACTOR: f64 = 0.1;

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use smartbox_lib::manager::{AwayPresetPolicy, SmartboxConfig};
///
/// let config: SmartboxConfig = serde_json::from_str(r#"{
///     "basic_auth_creds": "Y2xpZW50OnNlY3JldA==",
///     "accounts": [{
///         "api_name": "api-example",
///         "username": "me@example.com",
///         "password": "hunter2",
///         "device_ids": ["0123456789abcdef"]
///     }]
/// }"#).unwrap();
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.away_preset, AwayPresetPolicy::DeviceAway);
/// assert_eq!(config.accounts[0].session_retry_attempts, 8);
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartboxConfig {
    /// Accounts to set up.
    pub accounts: Vec<AccountConfig>,
    /// Client basic auth credentials for the vendor API.
    pub basic_auth_creds: String,
    /// How the away and home presets behave.
    #[serde(default)]
    pub away_preset: AwayPresetPolicy,
}

impl SmartboxConfig {
    /// Checks the configuration for values no session could work with.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidConfiguration`] describing the first
    /// problem found.
    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.accounts.is_empty() {
            return Err(invalid("no accounts configured"));
        }
        if self.basic_auth_creds.is_empty() {
            return Err(invalid("basic_auth_creds is empty"));
        }
        for account in &self.accounts {
            account.validate()?;
        }
        Ok(())
    }
}

/// How `Away` and `Home` presets on a node are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwayPresetPolicy {
    /// Selecting `Away` or `Home` sets or clears the device away flag.
    #[default]
    DeviceAway,
    /// `Away` and `Home` are rejected as presets; the away flag is only
    /// changed through the device.
    SwitchOnly,
}

/// Configuration for one vendor account.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Vendor API name.
    pub api_name: String,
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Devices to set up. Devices of the account not listed here are ignored.
    pub device_ids: Vec<String>,
    /// Attempts for each session request.
    #[serde(default = "default_session_retry_attempts")]
    pub session_retry_attempts: u32,
    /// Backoff factor between session request attempts, in seconds.
    #[serde(default = "default_session_backoff_factor")]
    pub session_backoff_factor: f64,
    /// Reconnect attempts for the push socket.
    #[serde(default = "default_socket_reconnect_attempts")]
    pub socket_reconnect_attempts: u32,
    /// Backoff factor between push socket reconnects, in seconds.
    #[serde(default = "default_socket_backoff_factor")]
    pub socket_backoff_factor: f64,
}

fn default_session_retry_attempts() -> u32 {
    DEFAULT_SESSION_RETRY_ATTEMPTS
}

fn default_session_backoff_factor() -> f64 {
    DEFAULT_SESSION_BACKOFF_FACTOR
}

fn default_socket_reconnect_attempts() -> u32 {
    DEFAULT_SOCKET_RECONNECT_ATTEMPTS
}

fn default_socket_backoff_factor() -> f64 {
    DEFAULT_SOCKET_BACKOFF_FACTOR
}

impl AccountConfig {
    /// Creates an account configuration with default retry settings.
    #[must_use]
    pub fn new(
        api_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        device_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            api_name: api_name.into(),
            username: username.into(),
            password: password.into(),
            device_ids: device_ids.into_iter().map(Into::into).collect(),
            session_retry_attempts: DEFAULT_SESSION_RETRY_ATTEMPTS,
            session_backoff_factor: DEFAULT_SESSION_BACKOFF_FACTOR,
            socket_reconnect_attempts: DEFAULT_SOCKET_RECONNECT_ATTEMPTS,
            socket_backoff_factor: DEFAULT_SOCKET_BACKOFF_FACTOR,
        }
    }

    /// Returns true if `dev_id` is one of the configured devices.
    #[must_use]
    pub fn is_configured(&self, dev_id: &str) -> bool {
        self.device_ids.iter().any(|id| id == dev_id)
    }

    /// Retry policy for session requests.
    #[must_use]
    pub fn session_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.session_retry_attempts, self.session_backoff_factor)
    }

    /// Reconnect policy for the push socket.
    #[must_use]
    pub fn socket_reconnect(&self) -> RetryPolicy {
        RetryPolicy::new(self.socket_reconnect_attempts, self.socket_backoff_factor)
    }

    /// Builds session credentials for this account.
    #[must_use]
    pub fn credentials(&self, basic_auth_creds: &str) -> Credentials {
        Credentials {
            api_name: self.api_name.clone(),
            basic_auth_creds: basic_auth_creds.to_string(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    fn validate(&self) -> Result<(), DeviceError> {
        for (field, value) in [
            ("api_name", &self.api_name),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.is_empty() {
                return Err(invalid(&format!("{field} is empty for account {}", self.api_name)));
            }
        }
        if self.device_ids.is_empty() {
            return Err(invalid(&format!(
                "no device_ids configured for account {}",
                self.username
            )));
        }
        for (field, factor) in [
            ("session_backoff_factor", self.session_backoff_factor),
            ("socket_backoff_factor", self.socket_backoff_factor),
        ] {
            if !factor.is_finite() || factor < 0.0 {
                return Err(invalid(&format!("{field} must be a non-negative number")));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SmartboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartboxConfig")
            .field("accounts", &self.accounts)
            .field("away_preset", &self.away_preset)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("api_name", &self.api_name)
            .field("username", &self.username)
            .field("device_ids", &self.device_ids)
            .field("session_retry_attempts", &self.session_retry_attempts)
            .field("session_backoff_factor", &self.session_backoff_factor)
            .field("socket_reconnect_attempts", &self.socket_reconnect_attempts)
            .field("socket_backoff_factor", &self.socket_backoff_factor)
            .finish_non_exhaustive()
    }
}

fn invalid(reason: &str) -> DeviceError {
    DeviceError::InvalidConfiguration(reason.to_string())
}

/// Retry settings handed to the vendor session and push socket.
///
/// Delays grow exponentially: the first attempt is immediate, attempt `n`
/// waits `backoff_factor * 2^(n-1)` seconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use smartbox_lib::manager::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, 0.5);
/// assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(1));
/// assert!(policy.should_retry(2));
/// assert!(!policy.should_retry(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts.
    pub max_attempts: u32,
    /// Backoff factor in seconds.
    pub backoff_factor: f64,
}

impl RetryPolicy {
    /// Creates a retry policy.
    #[must_use]
    pub const fn new(max_attempts: u32, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            backoff_factor,
        }
    }

    /// Calculates the delay before a given attempt (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let secs = self.backoff_factor * 2f64.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Returns true if attempt number `attempt` (0-based) is allowed.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_RETRY_ATTEMPTS, DEFAULT_SESSION_BACKOFF_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmartboxConfig {
        SmartboxConfig {
            accounts: vec![AccountConfig::new("api", "user", "pass", ["dev1"])],
            basic_auth_creds: "creds".to_string(),
            away_preset: AwayPresetPolicy::default(),
        }
    }

    #[test]
    fn account_defaults_from_json() {
        let account: AccountConfig = serde_json::from_str(
            r#"{"api_name": "api", "username": "u", "password": "p", "device_ids": ["d"]}"#,
        )
        .unwrap();
        assert_eq!(account.session_retry_attempts, 8);
        assert!((account.session_backoff_factor - 0.1).abs() < f64::EPSILON);
        assert_eq!(account.socket_reconnect_attempts, 3);
        assert!((account.socket_backoff_factor - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn away_preset_policy_parses_snake_case() {
        let config: SmartboxConfig = serde_json::from_str(
            r#"{"accounts": [], "basic_auth_creds": "c", "away_preset": "switch_only"}"#,
        )
        .unwrap();
        assert_eq!(config.away_preset, AwayPresetPolicy::SwitchOnly);
    }

    #[test]
    fn debug_output_omits_secrets() {
        let debug = format!("{:?}", config());
        assert!(debug.contains("api"));
        assert!(!debug.contains("creds"));
        assert!(!debug.contains("pass"));
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_accounts() {
        let mut config = config();
        config.accounts.clear();
        assert!(matches!(
            config.validate(),
            Err(DeviceError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn validate_rejects_empty_credentials() {
        let mut config = config();
        config.accounts[0].password.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("password"));

        let mut config = self::config();
        config.basic_auth_creds.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_devices_and_negative_backoff() {
        let mut config = config();
        config.accounts[0].device_ids.clear();
        assert!(config.validate().is_err());

        let mut config = self::config();
        config.accounts[0].socket_backoff_factor = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("socket_backoff_factor"));
    }

    #[test]
    fn account_policies_and_credentials() {
        let account = AccountConfig::new("api", "user", "pass", ["dev1", "dev2"]);
        assert_eq!(account.session_retry(), RetryPolicy::new(8, 0.1));
        assert_eq!(account.socket_reconnect(), RetryPolicy::new(3, 0.1));
        assert!(account.is_configured("dev2"));
        assert!(!account.is_configured("dev3"));

        let creds = account.credentials("basic");
        assert_eq!(creds.api_name, "api");
        assert_eq!(creds.basic_auth_creds, "basic");
    }

    #[test]
    fn account_debug_hides_password() {
        let account = AccountConfig::new("api", "user", "hunter2", ["dev1"]);
        assert!(!format!("{account:?}").contains("hunter2"));
    }

    #[test]
    fn retry_delay_doubles() {
        let policy = RetryPolicy::new(5, 0.1);
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs_f64(0.1));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs_f64(0.4));
    }

    #[test]
    fn retry_policy_limits_attempts() {
        let policy = RetryPolicy::new(0, 0.1);
        assert!(!policy.should_retry(0));
        assert!(RetryPolicy::default().should_retry(7));
        assert!(!RetryPolicy::default().should_retry(8));
    }
}
