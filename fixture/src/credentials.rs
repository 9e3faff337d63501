//! Scoped credential handling for fixture runs. `CredentialScope` swaps the
//! process credential environment for a throwaway profile and restores the
//! prior state on every exit path, panics included.

use std::{env, ffi::OsString, fs, path::Path};

use secrecy::{ExposeSecret, SecretString};
use tempfile::TempDir;

pub const CONFIG_FILE_VAR: &str = "REGSYNC_CONFIG_FILE";
pub const SHARED_CREDENTIALS_FILE_VAR: &str = "REGSYNC_SHARED_CREDENTIALS_FILE";
pub const PROFILE_VAR: &str = "REGSYNC_PROFILE";
pub const DEFAULT_REGION_VAR: &str = "REGSYNC_DEFAULT_REGION";

const DEFAULT_PROFILE: &str = "default";

const SCOPED_VARS: [&str; 4] = [
    CONFIG_FILE_VAR,
    SHARED_CREDENTIALS_FILE_VAR,
    PROFILE_VAR,
    DEFAULT_REGION_VAR,
];

pub struct CredentialProfile {
    pub profile: String,
    pub region: String,
    pub access_key_id: SecretString,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
}

/// Holds the swapped-in credential environment. Dropping the scope restores
/// every variable to its prior value (set or unset) and removes the backing
/// files. Environment mutation is process-global: fixture setup runs
/// single-threaded, and scopes must not be nested or held concurrently.
pub struct CredentialScope {
    saved: Vec<(&'static str, Option<OsString>)>,
    dir: TempDir,
}

impl CredentialScope {
    pub fn acquire(profile: &CredentialProfile) -> crate::Result<Self> {
        let dir = tempfile::tempdir()?;

        let config_path = dir.path().join("config");
        fs::write(&config_path, Self::config_contents(profile))?;

        let credentials_path = dir.path().join("credentials");
        fs::write(&credentials_path, Self::credential_contents(profile))?;

        let saved = SCOPED_VARS
            .iter()
            .map(|name| (*name, env::var_os(name)))
            .collect();

        // SAFETY: scopes are acquired from single-threaded fixture setup
        // only; no other thread reads the environment while one is live.
        unsafe {
            env::set_var(CONFIG_FILE_VAR, &config_path);
            env::set_var(SHARED_CREDENTIALS_FILE_VAR, &credentials_path);
            env::set_var(PROFILE_VAR, &profile.profile);
            env::set_var(DEFAULT_REGION_VAR, &profile.region);
        }

        tracing::debug!(
            config = %config_path.display(),
            credentials = %credentials_path.display(),
            "acquired credential scope"
        );

        Ok(Self { saved, dir })
    }

    pub fn config_file(&self) -> std::path::PathBuf {
        self.dir.path().join("config")
    }

    pub fn credentials_file(&self) -> std::path::PathBuf {
        self.dir.path().join("credentials")
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    fn config_contents(profile: &CredentialProfile) -> String {
        if profile.profile == DEFAULT_PROFILE {
            format!(
                "[{}]\noutput = json\nregion = {}\n",
                profile.profile, profile.region
            )
        } else {
            format!(
                "[profile {}]\noutput = json\nregion = {}\n",
                profile.profile, profile.region
            )
        }
    }

    fn credential_contents(profile: &CredentialProfile) -> String {
        let mut contents = Self::credential_section(DEFAULT_PROFILE, profile);
        if profile.profile != DEFAULT_PROFILE {
            contents.push('\n');
            contents.push_str(&Self::credential_section(&profile.profile, profile));
        }
        contents
    }

    fn credential_section(
        name: &str,
        profile: &CredentialProfile,
    ) -> String {
        let mut section = format!(
            "[{}]\naccess_key_id = {}\nsecret_access_key = {}\n",
            name,
            profile.access_key_id.expose_secret(),
            profile.secret_access_key.expose_secret(),
        );
        if let Some(token) = &profile.session_token {
            section.push_str(&format!("session_token = {}\n", token.expose_secret()));
        }
        section
    }
}

impl Drop for CredentialScope {
    fn drop(&mut self) {
        for (name, value) in self.saved.drain(..) {
            // SAFETY: same single-threaded contract as acquire.
            unsafe {
                match value {
                    Some(value) => env::set_var(name, value),
                    None => env::remove_var(name),
                }
            }
        }
    }
}
