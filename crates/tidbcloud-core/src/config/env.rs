//! Environment overrides and final connection resolution

use std::collections::HashMap;

use super::config::Profile;
use super::error::{ConfigError, Result};
use super::settings::Settings;
use crate::client::{ApiClient, ApiClientBuilder, Credentials, DEFAULT_API_URL};

pub const PUBLIC_KEY_ENV: &str = "TIDBCLOUD_PUBLIC_KEY";
pub const PRIVATE_KEY_ENV: &str = "TIDBCLOUD_PRIVATE_KEY";
pub const API_URL_ENV: &str = "TIDBCLOUD_API_URL";
pub const PROJECT_ID_ENV: &str = "DEDICATED_PROJECT_ID";
pub const CLUSTER_ID_ENV: &str = "DEDICATED_CLUSTER_ID";

/// Source of environment variables
pub trait EnvLookup {
    fn var(&self, name: &str) -> Option<String>;

    /// The variable's value unless it is unset or blank
    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Everything needed to talk to the API, merged from profile and environment
#[derive(Debug, Clone)]
pub struct Connection {
    /// Name of the profile that contributed, if any
    pub profile: Option<String>,
    pub credentials: Credentials,
    pub api_url: String,
    pub project_id: Option<u64>,
    pub cluster_id: Option<u64>,
    pub settings: Settings,
}

impl Connection {
    /// Merge `profile` with the environment; environment values win.
    ///
    /// Fails before any network activity when either key is missing or an
    /// id variable is present but not numeric.
    pub fn resolve(profile: Option<(&str, &Profile)>, env: &impl EnvLookup) -> Result<Self> {
        let (name, profile) = match profile {
            Some((name, profile)) => (Some(name.to_string()), Some(profile)),
            None => (None, None),
        };

        let from_profile = |pick: fn(&Profile) -> &str| {
            profile
                .map(pick)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let public_key = env
            .non_empty(PUBLIC_KEY_ENV)
            .or_else(|| from_profile(|p| p.public_key.as_str()));
        let private_key = env
            .non_empty(PRIVATE_KEY_ENV)
            .or_else(|| from_profile(|p| p.private_key.as_str()));

        let (Some(public_key), Some(private_key)) = (public_key, private_key) else {
            return Err(ConfigError::Missing {
                what: "API credentials".to_string(),
                suggestion: format!(
                    "Set {} and {}, or configure a profile with 'tidbcloud profile set'",
                    PUBLIC_KEY_ENV, PRIVATE_KEY_ENV
                ),
            });
        };
        let credentials = Credentials::new(public_key, private_key).map_err(|e| {
            ConfigError::Missing {
                what: "API credentials".to_string(),
                suggestion: e.to_string(),
            }
        })?;

        let api_url = env
            .non_empty(API_URL_ENV)
            .or_else(|| from_profile(|p| p.api_url.as_str()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let project_id = match parse_id(env, PROJECT_ID_ENV)? {
            Some(id) => Some(id),
            None => profile.and_then(|p| p.project_id),
        };
        let cluster_id = match parse_id(env, CLUSTER_ID_ENV)? {
            Some(id) => Some(id),
            None => profile.and_then(|p| p.cluster_id),
        };

        Ok(Self {
            profile: name,
            credentials,
            api_url,
            project_id,
            cluster_id,
            settings: profile.map(|p| p.settings.clone()).unwrap_or_default(),
        })
    }

    /// Builder pre-filled with credentials, base URL, and request timeout
    pub fn client_builder(&self) -> ApiClientBuilder {
        ApiClient::builder()
            .credentials(self.credentials.clone())
            .base_url(self.api_url.clone())
            .timeout(self.settings.request_timeout())
    }

    pub fn require_project_id(&self) -> Result<u64> {
        self.project_id.ok_or_else(|| ConfigError::Missing {
            what: "project id".to_string(),
            suggestion: format!(
                "Pass --project-id, set {}, or add project_id to the profile",
                PROJECT_ID_ENV
            ),
        })
    }

    pub fn require_cluster_id(&self) -> Result<u64> {
        self.cluster_id.ok_or_else(|| ConfigError::Missing {
            what: "cluster id".to_string(),
            suggestion: format!(
                "Pass --cluster-id, set {}, or add cluster_id to the profile",
                CLUSTER_ID_ENV
            ),
        })
    }
}

fn parse_id(env: &impl EnvLookup, name: &str) -> Result<Option<u64>> {
    env.non_empty(name)
        .map(|value| {
            value.parse().map_err(|_| ConfigError::InvalidId {
                name: name.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn profile() -> Profile {
        let mut profile = Profile::new("profile-pub", "profile-priv");
        profile.project_id = Some(11);
        profile.cluster_id = Some(22);
        profile
    }

    #[test]
    fn test_env_only() {
        let vars = env(&[
            (PUBLIC_KEY_ENV, "pub"),
            (PRIVATE_KEY_ENV, "priv"),
            (PROJECT_ID_ENV, "1372813089189561287"),
        ]);
        let conn = Connection::resolve(None, &vars).unwrap();
        assert_eq!(conn.credentials.public_key(), "pub");
        assert_eq!(conn.api_url, DEFAULT_API_URL);
        assert_eq!(conn.project_id, Some(1_372_813_089_189_561_287));
        assert_eq!(conn.cluster_id, None);
        assert!(conn.profile.is_none());
    }

    #[test]
    fn test_env_overrides_profile() {
        let profile = profile();
        let vars = env(&[(PUBLIC_KEY_ENV, "env-pub"), (CLUSTER_ID_ENV, "99")]);
        let conn = Connection::resolve(Some(("dev", &profile)), &vars).unwrap();

        assert_eq!(conn.credentials.public_key(), "env-pub");
        assert_eq!(conn.credentials.private_key(), "profile-priv");
        assert_eq!(conn.project_id, Some(11));
        assert_eq!(conn.cluster_id, Some(99));
        assert_eq!(conn.profile.as_deref(), Some("dev"));
    }

    #[test]
    fn test_missing_credentials() {
        let vars = env(&[(PUBLIC_KEY_ENV, "pub"), (PRIVATE_KEY_ENV, "  ")]);
        let err = Connection::resolve(None, &vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
        assert!(err.to_string().contains(PRIVATE_KEY_ENV));
    }

    #[test]
    fn test_non_numeric_id_rejected() {
        let vars = env(&[
            (PUBLIC_KEY_ENV, "pub"),
            (PRIVATE_KEY_ENV, "priv"),
            (CLUSTER_ID_ENV, "my-cluster"),
        ]);
        let err = Connection::resolve(None, &vars).unwrap_err();
        match err {
            ConfigError::InvalidId { name, value } => {
                assert_eq!(name, CLUSTER_ID_ENV);
                assert_eq!(value, "my-cluster");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_require_ids() {
        let vars = env(&[(PUBLIC_KEY_ENV, "pub"), (PRIVATE_KEY_ENV, "priv")]);
        let conn = Connection::resolve(None, &vars).unwrap();
        assert!(conn.require_project_id().is_err());
        assert!(conn.require_cluster_id().is_err());

        let profile = profile();
        let conn = Connection::resolve(Some(("dev", &profile)), &vars).unwrap();
        assert_eq!(conn.require_project_id().unwrap(), 11);
        assert_eq!(conn.require_cluster_id().unwrap(), 22);
    }

    #[test]
    fn test_client_builder_uses_api_url() {
        let vars = env(&[
            (PUBLIC_KEY_ENV, "pub"),
            (PRIVATE_KEY_ENV, "priv"),
            (API_URL_ENV, "http://127.0.0.1:9999/"),
        ]);
        let conn = Connection::resolve(None, &vars).unwrap();
        let client = conn.client_builder().build().unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9999");
    }
}
