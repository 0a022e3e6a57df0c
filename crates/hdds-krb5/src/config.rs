// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Kerberos token configuration
//!
//! Credentials are supplied once by the membership layer, either through the
//! builder or as key/value properties:
//!
//! | key | required | effect |
//! |-----|----------|--------|
//! | `client_principal_name` | yes | local identity used to log in |
//! | `client_password` | yes | secret paired with the principal |
//! | `service_principal_name` | yes | target principal outbound tickets are bound to |
//! | `peer_principal_name` | no | principal peers must assert (default: `client_principal_name`) |
//! | `security_config_name` | no | login configuration handed to the provider |

use std::collections::HashMap;
use std::fmt;

use zeroize::Zeroizing;

use crate::error::AuthError;

/// Property key for the local client principal.
pub const CLIENT_PRINCIPAL_NAME: &str = "client_principal_name";
/// Property key for the client password.
pub const CLIENT_PASSWORD: &str = "client_password";
/// Property key for the target service principal.
pub const SERVICE_PRINCIPAL_NAME: &str = "service_principal_name";
/// Property key overriding the principal peers are expected to assert.
pub const PEER_PRINCIPAL_NAME: &str = "peer_principal_name";
/// Property key for the login configuration name.
pub const SECURITY_CONFIG_NAME: &str = "security_config_name";

/// Login configuration name used when none is configured.
pub const DEFAULT_SECURITY_CONFIG_NAME: &str = "HddsKrb5TokenSecurityConf";

/// Credentials for a [`Krb5Token`](crate::Krb5Token).
///
/// Immutable after construction. The password is wiped from memory on drop
/// and never appears in `Debug` output.
#[derive(Clone)]
pub struct Krb5Config {
    client_principal_name: String,
    client_password: Zeroizing<String>,
    service_principal_name: String,
    peer_principal_name: Option<String>,
    security_config_name: String,
}

impl Krb5Config {
    /// Create a new configuration builder
    pub fn builder() -> Krb5ConfigBuilder {
        Krb5ConfigBuilder::default()
    }

    /// Build a configuration from membership-layer properties.
    ///
    /// Every recognised key is removed from `properties`; unrelated keys are
    /// left in place for other consumers.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if a required key is missing or empty.
    /// Recognised keys are consumed even on failure.
    pub fn from_properties(properties: &mut HashMap<String, String>) -> Result<Self, AuthError> {
        let mut builder = Self::builder();

        if let Some(value) = properties.remove(CLIENT_PRINCIPAL_NAME) {
            builder = builder.client_principal_name(value);
        }
        if let Some(value) = properties.remove(CLIENT_PASSWORD) {
            builder = builder.client_password(value);
        }
        if let Some(value) = properties.remove(SERVICE_PRINCIPAL_NAME) {
            builder = builder.service_principal_name(value);
        }
        if let Some(value) = properties.remove(PEER_PRINCIPAL_NAME) {
            builder = builder.peer_principal_name(value);
        }
        if let Some(value) = properties.remove(SECURITY_CONFIG_NAME) {
            builder = builder.security_config_name(value);
        }

        builder.build()
    }

    /// Local identity principal
    pub fn client_principal_name(&self) -> &str {
        &self.client_principal_name
    }

    /// Secret paired with the client principal
    pub fn client_password(&self) -> &str {
        &self.client_password
    }

    /// Principal outbound tickets are bound to
    pub fn service_principal_name(&self) -> &str {
        &self.service_principal_name
    }

    /// Principal a peer's validated ticket must assert.
    ///
    /// Falls back to the client principal: group members sharing one identity
    /// is the default deployment.
    pub fn expected_peer_principal(&self) -> &str {
        self.peer_principal_name
            .as_deref()
            .unwrap_or(&self.client_principal_name)
    }

    /// Login configuration name handed to the security context provider
    pub fn security_config_name(&self) -> &str {
        &self.security_config_name
    }
}

impl fmt::Debug for Krb5Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Krb5Config")
            .field("client_principal_name", &self.client_principal_name)
            .field("client_password", &"<redacted>")
            .field("service_principal_name", &self.service_principal_name)
            .field("peer_principal_name", &self.peer_principal_name)
            .field("security_config_name", &self.security_config_name)
            .finish()
    }
}

/// Fluent builder for [`Krb5Config`].
///
/// # Required Fields
///
/// - [`client_principal_name`](Self::client_principal_name)
/// - [`client_password`](Self::client_password)
/// - [`service_principal_name`](Self::service_principal_name)
///
/// # Example
///
/// ```
/// use hdds_krb5::Krb5Config;
///
/// let config = Krb5Config::builder()
///     .client_principal_name("hdds/node@EXAMPLE.COM")
///     .client_password("s3cret")
///     .service_principal_name("hdds/group@EXAMPLE.COM")
///     .build()
///     .expect("all required fields set");
///
/// assert_eq!(config.expected_peer_principal(), "hdds/node@EXAMPLE.COM");
/// ```
#[derive(Default)]
pub struct Krb5ConfigBuilder {
    client_principal_name: Option<String>,
    client_password: Option<Zeroizing<String>>,
    service_principal_name: Option<String>,
    peer_principal_name: Option<String>,
    security_config_name: Option<String>,
}

impl Krb5ConfigBuilder {
    /// Set the local client principal
    pub fn client_principal_name<S: Into<String>>(mut self, name: S) -> Self {
        self.client_principal_name = Some(name.into());
        self
    }

    /// Set the client password
    pub fn client_password<S: Into<String>>(mut self, password: S) -> Self {
        self.client_password = Some(Zeroizing::new(password.into()));
        self
    }

    /// Set the target service principal
    pub fn service_principal_name<S: Into<String>>(mut self, name: S) -> Self {
        self.service_principal_name = Some(name.into());
        self
    }

    /// Expect peers to assert `name` instead of the local client principal
    pub fn peer_principal_name<S: Into<String>>(mut self, name: S) -> Self {
        self.peer_principal_name = Some(name.into());
        self
    }

    /// Set the login configuration name (default: [`DEFAULT_SECURITY_CONFIG_NAME`])
    pub fn security_config_name<S: Into<String>>(mut self, name: S) -> Self {
        self.security_config_name = Some(name.into());
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] naming the first missing or empty
    /// required field.
    pub fn build(self) -> Result<Krb5Config, AuthError> {
        let client_principal_name = required(self.client_principal_name, CLIENT_PRINCIPAL_NAME)?;
        let service_principal_name =
            required(self.service_principal_name, SERVICE_PRINCIPAL_NAME)?;

        let client_password = self
            .client_password
            .filter(|password| !password.is_empty())
            .ok_or_else(|| missing(CLIENT_PASSWORD))?;

        let peer_principal_name = self.peer_principal_name.filter(|name| !name.is_empty());

        Ok(Krb5Config {
            client_principal_name,
            client_password,
            service_principal_name,
            peer_principal_name,
            security_config_name: self
                .security_config_name
                .unwrap_or_else(|| DEFAULT_SECURITY_CONFIG_NAME.to_string()),
        })
    }
}

impl fmt::Debug for Krb5ConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Krb5ConfigBuilder")
            .field("client_principal_name", &self.client_principal_name)
            .field(
                "client_password",
                &self.client_password.as_ref().map(|_| "<redacted>"),
            )
            .field("service_principal_name", &self.service_principal_name)
            .field("peer_principal_name", &self.peer_principal_name)
            .field("security_config_name", &self.security_config_name)
            .finish()
    }
}

fn required(value: Option<String>, key: &str) -> Result<String, AuthError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| missing(key))
}

fn missing(key: &str) -> AuthError {
    AuthError::Config(format!("missing required property '{}'", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_builder_defaults() {
        let config = Krb5Config::builder()
            .client_principal_name("alice")
            .client_password("pw")
            .service_principal_name("svc")
            .build()
            .expect("build should succeed");

        assert_eq!(config.client_principal_name(), "alice");
        assert_eq!(config.client_password(), "pw");
        assert_eq!(config.service_principal_name(), "svc");
        assert_eq!(config.expected_peer_principal(), "alice");
        assert_eq!(config.security_config_name(), DEFAULT_SECURITY_CONFIG_NAME);
    }

    #[test]
    fn test_builder_missing_fields() {
        let result = Krb5Config::builder()
            .client_password("pw")
            .service_principal_name("svc")
            .build();
        assert_eq!(
            result.expect_err("principal missing"),
            AuthError::Config("missing required property 'client_principal_name'".to_string())
        );

        let result = Krb5Config::builder()
            .client_principal_name("alice")
            .service_principal_name("svc")
            .build();
        assert!(result.is_err(), "Should fail when password is missing");

        let result = Krb5Config::builder()
            .client_principal_name("alice")
            .client_password("pw")
            .build();
        assert!(result.is_err(), "Should fail when service principal is missing");
    }

    #[test]
    fn test_builder_rejects_empty_password() {
        let result = Krb5Config::builder()
            .client_principal_name("alice")
            .client_password("")
            .service_principal_name("svc")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_peer_principal_override() {
        let config = Krb5Config::builder()
            .client_principal_name("svcA")
            .client_password("pw")
            .service_principal_name("svcA")
            .peer_principal_name("alice")
            .build()
            .expect("build should succeed");

        assert_eq!(config.client_principal_name(), "svcA");
        assert_eq!(config.expected_peer_principal(), "alice");
    }

    #[test]
    fn test_from_properties_consumes_known_keys() {
        let mut props = properties(&[
            (CLIENT_PRINCIPAL_NAME, "alice"),
            (CLIENT_PASSWORD, "pw"),
            (SERVICE_PRINCIPAL_NAME, "svc"),
            (SECURITY_CONFIG_NAME, "CustomConf"),
            ("auth_value", "unrelated"),
        ]);

        let config = Krb5Config::from_properties(&mut props).expect("complete properties");

        assert_eq!(config.client_principal_name(), "alice");
        assert_eq!(config.security_config_name(), "CustomConf");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("auth_value").map(String::as_str), Some("unrelated"));
    }

    #[test]
    fn test_from_properties_missing_password() {
        let mut props = properties(&[
            (CLIENT_PRINCIPAL_NAME, "alice"),
            (SERVICE_PRINCIPAL_NAME, "svc"),
        ]);

        let result = Krb5Config::from_properties(&mut props);
        assert!(matches!(result, Err(AuthError::Config(_))));
        assert!(props.is_empty(), "recognised keys are consumed even on failure");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Krb5Config::builder()
            .client_principal_name("alice")
            .client_password("hunter2")
            .service_principal_name("svc")
            .build()
            .expect("build should succeed");

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));

        let builder = Krb5Config::builder().client_password("hunter2");
        assert!(!format!("{:?}", builder).contains("hunter2"));
    }
}
