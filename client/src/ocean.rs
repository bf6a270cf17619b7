//! Connection to a deployed network
//!
//! `Ocean` owns the configured ledger and metadata store clients and hands
//! out the account and asset services over them.

use std::sync::Arc;
use log::{debug, info};
use mantaray_core::{MantarayConfig, PasswordMap, ServiceDescriptor};

use crate::accounts::AccountService;
use crate::aquarius::AquariusClient;
use crate::assets::AssetService;
use crate::brizo::BrizoEndpoints;
use crate::error::Result;
use crate::keeper::KeeperClient;

/// Entry point to one deployment
#[derive(Debug, Clone)]
pub struct Ocean {
    config: MantarayConfig,
    keeper: Arc<KeeperClient>,
    aquarius: Arc<AquariusClient>,
    brizo: BrizoEndpoints,
}

impl Ocean {
    /// Connect to the ledger node and metadata store named in the configuration
    pub async fn connect(config: MantarayConfig) -> Result<Self> {
        let keeper = KeeperClient::connect(&config).await?;

        let mut aquarius = AquariusClient::new(&config.resources.aquarius_url);
        aquarius.set_timeout(config.request_timeout());
        info!("Using metadata store at {}", aquarius.base_url());

        let brizo = BrizoEndpoints::new(&config.resources.brizo_url);

        Ok(Self {
            config,
            keeper: Arc::new(keeper),
            aquarius: Arc::new(aquarius),
            brizo,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &MantarayConfig {
        &self.config
    }

    /// Ledger client
    pub fn keeper(&self) -> &KeeperClient {
        &self.keeper
    }

    /// Account operations
    pub fn accounts(&self) -> AccountService<KeeperClient> {
        AccountService::new(self.keeper.clone())
    }

    /// Asset operations
    pub fn assets(&self) -> AssetService<KeeperClient, AquariusClient> {
        AssetService::new(self.keeper.clone(), self.aquarius.clone())
    }

    /// Access agent endpoints
    pub fn brizo(&self) -> &BrizoEndpoints {
        &self.brizo
    }

    /// Access service served by the configured agent
    pub fn access_service(&self, price: u64, timeout: u64) -> ServiceDescriptor {
        self.brizo.access_service(price, timeout)
    }

    /// Passwords from the configured file plus the main account
    pub fn credentials(&self) -> Result<PasswordMap> {
        load_credentials(&self.config)
    }
}

/// Passwords from the configured file plus the main account
pub fn load_credentials(config: &MantarayConfig) -> Result<PasswordMap> {
    let mut passwords = match &config.resources.passwords_path {
        Some(path) => PasswordMap::from_csv_file(path)?,
        None => PasswordMap::new(),
    };

    if let Some((address, Some(credential))) = config.main_account()? {
        debug!("Adding main account {:?}", address);
        passwords.insert(address, credential);
    }

    Ok(passwords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mantaray_core::{parse_address, CredentialSource};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MAIN: &str = "0x00bd138abd70e2f00903268f3db08f2d25677c9e";

    #[test]
    fn test_credentials_from_file_and_main_account() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "address,password").unwrap();
        writeln!(file, "0x068ed00cf0441e4829d9784fcbe7b9e26d4bd8d0,secret").unwrap();

        let mut config = MantarayConfig::for_testing();
        config.resources.passwords_path = Some(file.path().to_path_buf());
        config.keeper.parity_address = MAIN.to_string();
        config.keeper.parity_password = "node0".to_string();

        let passwords = load_credentials(&config).unwrap();

        assert_eq!(passwords.len(), 2);
        let main = passwords.credential_for(&parse_address(MAIN).unwrap()).unwrap();
        assert_eq!(main.expose(), "node0");
    }

    #[test]
    fn test_credentials_without_sources() {
        let mut config = MantarayConfig::for_testing();
        config.resources.passwords_path = None;
        config.keeper.parity_address = String::new();

        assert!(load_credentials(&config).unwrap().is_empty());
    }

    #[test]
    fn test_missing_password_file() {
        let mut config = MantarayConfig::for_testing();
        config.resources.passwords_path = Some("/nonexistent/passwords.csv".into());

        assert!(load_credentials(&config).is_err());
    }
}
