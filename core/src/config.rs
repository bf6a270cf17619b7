//! Configuration shared by every Mantaray client
//!
//! Configuration files use the INI layout of the network's reference
//! tooling: a `[keeper-contracts]` section for the ledger node and a
//! `[resources]` section for the off-chain services. Keys missing from a
//! file fall back to the local development defaults.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use config::{Config, File, FileFormat};
use ethers::types::Address;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::Credential;
use crate::parse_address;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "OCEAN_CONFIG_PATH";

/// Environment variable selecting the Kubernetes deployment
pub const K8S_ENV: &str = "USE_K8S_CLUSTER";

/// Environment variable naming the deployment type
pub const DEPLOYMENT_ENV: &str = "DEPLOYMENT_TYPE";

/// Where the tooling runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentType {
    /// Local development network
    Local,

    /// Services deployed to a Kubernetes cluster
    Kubernetes,

    /// Hosted notebook environment
    JupyterHub,
}

impl DeploymentType {
    /// Resolve from the environment
    pub fn from_env() -> Self {
        Self::resolve(env::var(K8S_ENV).ok().as_deref(), env::var(DEPLOYMENT_ENV).ok().as_deref())
    }

    fn resolve(use_k8s: Option<&str>, deployment: Option<&str>) -> Self {
        if let Some(deployment) = deployment {
            match deployment.to_ascii_lowercase().as_str() {
                "jupyterhub" | "jupyter" => return DeploymentType::JupyterHub,
                "kubernetes" | "k8s" => return DeploymentType::Kubernetes,
                "local" => return DeploymentType::Local,
                _ => {}
            }
        }
        match use_k8s.map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "true" || v == "1" => DeploymentType::Kubernetes,
            _ => DeploymentType::Local,
        }
    }

    /// Default configuration file for the deployment
    pub fn default_config_file(&self) -> &'static str {
        match self {
            DeploymentType::Local => "config_local.ini",
            DeploymentType::Kubernetes | DeploymentType::JupyterHub => "config_k8s_deployed.ini",
        }
    }
}

/// Configuration file to load: `OCEAN_CONFIG_PATH` wins, otherwise the
/// deployment's default file under `project_dir`
pub fn config_file_path(project_dir: &Path) -> PathBuf {
    match env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => project_dir.join(DeploymentType::from_env().default_config_file()),
    }
}

/// Ledger node settings (`[keeper-contracts]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    /// JSON-RPC endpoint of the ledger node
    #[serde(rename = "keeper.url")]
    pub url: String,

    /// Directory holding contract artifacts
    #[serde(rename = "keeper.path")]
    pub artifacts_path: PathBuf,

    /// Secret store endpoint
    #[serde(rename = "secret_store.url")]
    pub secret_store_url: String,

    /// Parity node endpoint
    #[serde(rename = "parity.url")]
    pub parity_url: String,

    /// Main account address
    #[serde(rename = "parity.address")]
    pub parity_address: String,

    /// Main account password
    #[serde(rename = "parity.password")]
    pub parity_password: String,

    /// Seconds between receipt polls
    #[serde(rename = "keeper.poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds to wait for a transaction receipt
    #[serde(rename = "keeper.confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".to_string(),
            artifacts_path: PathBuf::from("artifacts"),
            secret_store_url: "http://localhost:12001".to_string(),
            parity_url: "http://localhost:8545".to_string(),
            parity_address: String::new(),
            parity_password: String::new(),
            poll_interval_secs: 1,
            confirmation_timeout_secs: 120,
        }
    }
}

/// Off-chain services (`[resources]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Metadata store endpoint
    #[serde(rename = "aquarius.url")]
    pub aquarius_url: String,

    /// Access agent endpoint
    #[serde(rename = "brizo.url")]
    pub brizo_url: String,

    /// Local database for pending agreements
    #[serde(rename = "storage.path")]
    pub storage_path: PathBuf,

    /// Where consumed files are written
    #[serde(rename = "downloads.path")]
    pub downloads_path: PathBuf,

    /// CSV of simulated account passwords
    #[serde(rename = "passwords.path")]
    pub passwords_path: Option<PathBuf>,

    /// Seconds before an HTTP request is abandoned
    #[serde(rename = "request.timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            aquarius_url: "http://localhost:5000".to_string(),
            brizo_url: "http://localhost:8030".to_string(),
            storage_path: PathBuf::from("squid_py.db"),
            downloads_path: PathBuf::from("consume-downloads"),
            passwords_path: None,
            request_timeout_secs: 30,
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MantarayConfig {
    /// Ledger node
    #[serde(rename = "keeper-contracts")]
    pub keeper: KeeperConfig,

    /// Off-chain services
    pub resources: ResourcesConfig,
}

impl MantarayConfig {
    /// Local development defaults
    pub fn local() -> Self {
        Self::default()
    }

    /// Short timeouts for tests
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.keeper.poll_interval_secs = 0;
        config.keeper.confirmation_timeout_secs = 5;
        config.resources.request_timeout_secs = 5;
        config
    }

    /// Load an INI file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::Config(format!("{} does not exist", path.display())));
        }
        debug!("Loading configuration from {}", path.display());
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parse INI text
    pub fn from_ini_str(text: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Ini))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Main account and its credential, when both are configured
    pub fn main_account(&self) -> Result<Option<(Address, Option<Credential>)>> {
        if self.keeper.parity_address.trim().is_empty() {
            return Ok(None);
        }
        let address = parse_address(&self.keeper.parity_address)?;
        Ok(Some((address, Credential::new(self.keeper.parity_password.clone()))))
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.resources.request_timeout_secs)
    }

    /// Receipt polling interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.keeper.poll_interval_secs)
    }

    /// Receipt wait limit
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.keeper.confirmation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const NILE_INI: &str = "\
[keeper-contracts]
keeper.url = https://nile.dev-ocean.com
keeper.path = artifacts
secret_store.url = https://secret-store.dev-ocean.com
parity.url = https://nile.dev-ocean.com
parity.address = 0x413c9ba0a05b8a600899b41b0c62dd661e689354
parity.password = ocean_secret

[resources]
aquarius.url = https://nginx-aquarius.dev-ocean.com
brizo.url = https://nginx-brizo.dev-ocean.com
storage.path = squid_py.db
downloads.path = consume-downloads
";

    #[test]
    fn test_default_config() {
        let config = MantarayConfig::default();

        assert_eq!(config.keeper.url, "http://localhost:8545");
        assert_eq!(config.resources.aquarius_url, "http://localhost:5000");
        assert_eq!(config.resources.brizo_url, "http://localhost:8030");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.main_account().unwrap().is_none());
    }

    #[test]
    fn test_testing_config() {
        let config = MantarayConfig::for_testing();

        assert_eq!(config.poll_interval(), Duration::ZERO);
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_ini() {
        let config = MantarayConfig::from_ini_str(NILE_INI).unwrap();

        assert_eq!(config.keeper.url, "https://nile.dev-ocean.com");
        assert_eq!(config.keeper.artifacts_path, PathBuf::from("artifacts"));
        assert_eq!(config.resources.aquarius_url, "https://nginx-aquarius.dev-ocean.com");
        // Not in the file
        assert_eq!(config.keeper.confirmation_timeout_secs, 120);
        assert!(config.resources.passwords_path.is_none());

        let (address, credential) = config.main_account().unwrap().unwrap();
        assert_eq!(address, parse_address("0x413c9ba0a05b8a600899b41b0c62dd661e689354").unwrap());
        assert_eq!(credential.unwrap().expose(), "ocean_secret");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", NILE_INI).unwrap();
        writeln!(file, "request.timeout = 12").unwrap();
        file.flush().unwrap();

        let config = MantarayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.resources.brizo_url, "https://nginx-brizo.dev-ocean.com");
        assert_eq!(config.request_timeout(), Duration::from_secs(12));
    }

    #[test]
    fn test_missing_file() {
        let result = MantarayConfig::from_file("/definitely/not/here.ini");
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_bad_main_account() {
        let mut config = MantarayConfig::default();
        config.keeper.parity_address = "0xnope".to_string();
        assert!(matches!(config.main_account(), Err(CoreError::InvalidAddress(_))));
    }

    #[test]
    fn test_deployment_resolution() {
        assert_eq!(DeploymentType::resolve(None, None), DeploymentType::Local);
        assert_eq!(DeploymentType::resolve(Some("true"), None), DeploymentType::Kubernetes);
        assert_eq!(DeploymentType::resolve(Some("false"), None), DeploymentType::Local);
        assert_eq!(
            DeploymentType::resolve(Some("true"), Some("JupyterHub")),
            DeploymentType::JupyterHub
        );
        assert_eq!(DeploymentType::resolve(None, Some("something-else")), DeploymentType::Local);
        assert_eq!(DeploymentType::Local.default_config_file(), "config_local.ini");
        assert_eq!(DeploymentType::Kubernetes.default_config_file(), "config_k8s_deployed.ini");
    }

    // The only test touching the process environment
    #[test]
    fn test_config_path_from_environment() {
        let project = Path::new("/opt/mantaray");
        for var in [CONFIG_PATH_ENV, K8S_ENV, DEPLOYMENT_ENV] {
            env::remove_var(var);
        }

        assert_eq!(DeploymentType::from_env(), DeploymentType::Local);
        assert_eq!(config_file_path(project), project.join("config_local.ini"));

        env::set_var(K8S_ENV, "true");
        assert_eq!(DeploymentType::from_env(), DeploymentType::Kubernetes);
        assert_eq!(config_file_path(project), project.join("config_k8s_deployed.ini"));

        env::set_var(DEPLOYMENT_ENV, "jupyterhub");
        assert_eq!(DeploymentType::from_env(), DeploymentType::JupyterHub);

        env::set_var(CONFIG_PATH_ENV, "/etc/ocean/config_nile.ini");
        assert_eq!(config_file_path(project), PathBuf::from("/etc/ocean/config_nile.ini"));

        env::set_var(CONFIG_PATH_ENV, "  ");
        assert_eq!(config_file_path(project), project.join("config_k8s_deployed.ini"));

        for var in [CONFIG_PATH_ENV, K8S_ENV, DEPLOYMENT_ENV] {
            env::remove_var(var);
        }
    }
}
