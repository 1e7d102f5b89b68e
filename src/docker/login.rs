//! Registry credentials and login.
//!
//! Credentials are a scoped object acquired once per run and passed
//! explicitly to whoever needs them, never ambient process state. The
//! password travels to the login command over stdin only: it must never
//! appear in argv, in the log, or as an image build argument.

use crate::error::{ConfigurationError, ReleaseError, Result};
use crate::runner::{CommandRequest, CommandRunner};
use std::fmt;

/// Environment variable holding the registry username
pub const USERNAME_VAR: &str = "REGISTRY_USERNAME";

/// Environment variable holding the registry token or password
pub const PASSWORD_VAR: &str = "REGISTRY_PASSWORD";

/// Scoped registry credentials for one release run.
#[derive(Clone)]
pub struct RegistryCredentials {
    username: String,
    password: String,
}

impl RegistryCredentials {
    /// Build credentials from explicit values
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|variable| std::env::var(variable).ok())
    }

    /// Read credentials through an arbitrary lookup, for testability
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let username = lookup(USERNAME_VAR)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigurationError::MissingCredential {
                variable: USERNAME_VAR.to_string(),
            })?;
        let password = lookup(PASSWORD_VAR)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigurationError::MissingCredential {
                variable: PASSWORD_VAR.to_string(),
            })?;
        Ok(Self { username, password })
    }

    /// Registry account name
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Authenticate the docker client against the registry.
    ///
    /// Runs once per release run, before any variant starts. A failure here
    /// aborts the entire run: no variant may build toward a push that cannot
    /// happen.
    pub async fn login(&self, runner: &dyn CommandRunner) -> Result<()> {
        let request = CommandRequest::new("docker")
            .args(["login", "--username"])
            .arg(&self.username)
            .arg("--password-stdin")
            .stdin_bytes(self.password.clone().into_bytes());

        let output = runner.run(request).await.map_err(|e| ReleaseError::Auth {
            reason: e.to_string(),
        })?;

        if output.success {
            log::info!("registry login succeeded for '{}'", self.username);
            Ok(())
        } else {
            Err(ReleaseError::Auth {
                reason: format!(
                    "docker login exited with code {:?}: {}",
                    output.code,
                    output.stderr.trim()
                ),
            })
        }
    }
}

// The password never renders, not even length.
impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
