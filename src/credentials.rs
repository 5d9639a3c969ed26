//! Access key provider chain
//!
//! Each provider either yields a complete key pair or nothing. The chain
//! returns the first complete pair and `None` once every provider is
//! exhausted; the caller decides what that means.

use std::fmt;

pub const ACCESS_KEY_ENV: &str = "BCE_ACCESS_KEY_ID";
pub const SECRET_KEY_ENV: &str = "BCE_SECRET_ACCESS_KEY";

/// Access key pair
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new<A: Into<String>, S: Into<String>>(access_key: A, secret_key: S) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Both halves present
    pub fn is_complete(&self) -> bool {
        !self.access_key.trim().is_empty() && !self.secret_key.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"******")
            .finish()
    }
}

/// A source of credentials
pub trait CredentialProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn credentials(&self) -> Option<Credentials>;
}

/// Keys given on the command line
pub struct StaticProvider {
    access_key: Option<String>,
    secret_key: Option<String>,
}

impl StaticProvider {
    pub fn new(access_key: Option<String>, secret_key: Option<String>) -> Self {
        Self { access_key, secret_key }
    }
}

impl CredentialProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "command line"
    }

    fn credentials(&self) -> Option<Credentials> {
        let credentials = Credentials::new(
            self.access_key.clone().unwrap_or_default(),
            self.secret_key.clone().unwrap_or_default(),
        );
        credentials.is_complete().then_some(credentials)
    }
}

/// Keys from environment variables
pub struct EnvProvider {
    access_key_var: String,
    secret_key_var: String,
}

impl EnvProvider {
    pub fn new<A: Into<String>, S: Into<String>>(access_key_var: A, secret_key_var: S) -> Self {
        Self {
            access_key_var: access_key_var.into(),
            secret_key_var: secret_key_var.into(),
        }
    }
}

impl Default for EnvProvider {
    fn default() -> Self {
        Self::new(ACCESS_KEY_ENV, SECRET_KEY_ENV)
    }
}

impl CredentialProvider for EnvProvider {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn credentials(&self) -> Option<Credentials> {
        let access_key = std::env::var(&self.access_key_var).ok()?;
        let secret_key = std::env::var(&self.secret_key_var).ok()?;
        let credentials = Credentials::new(access_key.trim(), secret_key.trim());
        credentials.is_complete().then_some(credentials)
    }
}

/// Ordered list of providers
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command-line keys first, then the environment
    pub fn standard(access_key: Option<String>, secret_key: Option<String>) -> Self {
        Self::new()
            .with(StaticProvider::new(access_key, secret_key))
            .with(EnvProvider::default())
    }

    pub fn with<P: CredentialProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// First complete pair, with the name of the provider that supplied it
    pub fn resolve(&self) -> Option<(Credentials, &'static str)> {
        self.providers
            .iter()
            .find_map(|p| p.credentials().map(|c| (c, p.name())))
    }
}
