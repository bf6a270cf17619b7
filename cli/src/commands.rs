//! Subcommand implementations

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use mantaray_client::{LedgerClient, Ocean};
use mantaray_core::models::format_tokens;
use mantaray_core::{
    parse_address, AssetQuery, AssetRecord, Did, MantarayConfig, Metadata, NameGenerator, Role,
    UserRegistry,
};

async fn connect(config: MantarayConfig) -> Result<Ocean> {
    Ocean::connect(config)
        .await
        .context("Cannot connect to the network")
}

async fn load_registry(ocean: &Ocean) -> Result<UserRegistry> {
    let credentials = ocean.credentials()?;
    let registry = ocean
        .accounts()
        .load_users(&credentials, &mut NameGenerator::new())
        .await?;
    Ok(registry)
}

/// Print the configuration and the node's accounts
pub async fn check(config: MantarayConfig) -> Result<()> {
    println!("Keeper node:     {}", config.keeper.url);
    println!("Artifacts:       {}", config.keeper.artifacts_path.display());
    println!("Metadata store:  {}", config.resources.aquarius_url);
    println!("Access agent:    {}", config.resources.brizo_url);
    match &config.resources.passwords_path {
        Some(path) => println!("Passwords:       {}", path.display()),
        None => println!("Passwords:       (none)"),
    }

    let ocean = connect(config).await?;
    let contracts = ocean.keeper().contracts();
    println!("Dispenser:       {:?}", contracts.dispenser);
    println!("Token:           {:?}", contracts.token);
    println!("DID registry:    {:?}", contracts.did_registry);
    ocean.keeper().verify_contracts().await?;
    println!("Contract code found at every address");

    let accounts = ocean.keeper().accounts().await?;
    println!("{} accounts on the node", accounts.len());
    for address in accounts {
        println!("  {:?}", address);
    }
    Ok(())
}

/// Print every simulated user with its balances
pub async fn users(config: MantarayConfig) -> Result<()> {
    let ocean = connect(config).await?;
    let registry = load_registry(&ocean).await?;
    let accounts = ocean.accounts();

    println!(
        "{:<24} {:<15} {:<44} {:>12} {:>12}  {}",
        "NAME", "ROLE", "ADDRESS", "OCN", "ETH", "PASSWORD"
    );
    for user in registry.users() {
        let balance = accounts.balance(user.address()).await?;
        println!(
            "{:<24} {:<15} {:<44} {:>12} {:>12}  {}",
            user.name(),
            user.role().label(),
            format!("{:?}", user.address()),
            format_tokens(balance.ocn),
            format_tokens(balance.eth),
            if user.is_unlocked() { "yes" } else { "no" },
        );
    }
    Ok(())
}

/// Fund every unlocked user holding no tokens
pub async fn fund(config: MantarayConfig, max_amount: u64) -> Result<()> {
    let ocean = connect(config).await?;
    let registry = load_registry(&ocean).await?;

    let outcomes = ocean
        .accounts()
        .fund_users(registry.users(), max_amount, &mut rand::thread_rng())
        .await?;

    for outcome in &outcomes {
        match outcome.requested {
            Some(amount) if outcome.confirmed => {
                println!("{}: received {} tokens", outcome.name, amount)
            }
            Some(amount) => println!("{}: request for {} tokens failed", outcome.name, amount),
            None => println!("{}: already funded", outcome.name),
        }
    }
    info!("Processed {} unlocked users", outcomes.len());
    Ok(())
}

/// Request tokens for one account
pub async fn request_tokens(config: MantarayConfig, address: &str, amount: u64) -> Result<()> {
    let address = parse_address(address)?;
    let ocean = connect(config).await?;
    let registry = load_registry(&ocean).await?;
    let user = registry
        .get(&address)
        .ok_or_else(|| anyhow!("{:?} is not an account on this node", address))?;

    let accounts = ocean.accounts();
    if !accounts.request_tokens(user, amount).await? {
        bail!("Token request for {} was not confirmed", user.name());
    }

    let balance = accounts.balance(address).await?;
    println!("{} now holds {}", user.name(), balance);
    Ok(())
}

/// Sample metadata with the given overrides
pub fn publish_metadata(
    name: Option<String>,
    description: Option<String>,
    price: Option<u64>,
) -> Metadata {
    let mut metadata = Metadata::example();
    if let Some(name) = name {
        metadata.base.name = name;
    }
    if let Some(description) = description {
        metadata.base.description = description;
    }
    if let Some(price) = price {
        metadata.base.price = price;
    }
    metadata
}

/// Register an asset with one access service
pub async fn publish(
    config: MantarayConfig,
    metadata: Metadata,
    timeout: u64,
    owner: Option<&str>,
) -> Result<()> {
    let ocean = connect(config).await?;
    let registry = load_registry(&ocean).await?;

    let owner = match owner {
        Some(address) => {
            let address = parse_address(address)?;
            registry
                .get(&address)
                .ok_or_else(|| anyhow!("{:?} is not an account on this node", address))?
        }
        None => registry
            .with_role(Role::DataOwner)
            .into_iter()
            .find(|u| u.is_unlocked())
            .or_else(|| registry.random_unlocked(&mut rand::thread_rng()))
            .ok_or_else(|| anyhow!("No unlocked account to publish with"))?,
    };

    let services = vec![ocean.access_service(metadata.price(), timeout)];
    let record = ocean.assets().register_asset(metadata, owner, services).await?;

    println!("Published {} as {}", record.metadata.name(), record.did);
    Ok(())
}

/// Build a query from the command line options
///
/// Filters given as options replace filters of the same kind in the raw query.
pub fn build_query(
    raw: Option<&str>,
    price_min: Option<u64>,
    price_max: Option<u64>,
    text: &[String],
    offset: usize,
    page: usize,
) -> Result<AssetQuery> {
    if page > 0 && offset == 0 {
        bail!("--page needs --offset");
    }

    let mut query = match raw {
        Some(raw) => AssetQuery::parse(raw).context("Invalid --query")?,
        None => AssetQuery::all(),
    };

    if price_min.is_some() || price_max.is_some() {
        query = query.with_price(price_min.unwrap_or(0), price_max.unwrap_or(u64::MAX))?;
    }
    if !text.is_empty() {
        query = query.with_text(text.iter().cloned())?;
    }
    if offset > 0 {
        query = query.paged(offset, page);
    }
    Ok(query)
}

fn print_records(records: &[AssetRecord]) {
    println!("{:<74} {:>8}  {}", "DID", "PRICE", "NAME");
    for record in records {
        println!("{:<74} {:>8}  {}", record.did, record.metadata.price(), record.metadata.name());
    }
}

/// Search the metadata store
pub async fn search(config: MantarayConfig, query: AssetQuery) -> Result<()> {
    let ocean = connect(config).await?;
    let results = ocean.assets().query_assets(&query).await?;
    print_records(&results);
    println!("{} assets", results.len());
    Ok(())
}

/// Print every registered DID
pub async fn list(config: MantarayConfig) -> Result<()> {
    let ocean = connect(config).await?;
    let dids = ocean.assets().list_dids().await?;
    for did in &dids {
        println!("{}", did);
    }
    println!("{} assets", dids.len());
    Ok(())
}

/// Print one record
pub async fn show(config: MantarayConfig, did: &str) -> Result<()> {
    let did = Did::parse(did)?;
    let ocean = connect(config).await?;
    let record = ocean
        .assets()
        .resolve(&did)
        .await?
        .ok_or_else(|| anyhow!("{} is not registered", did))?;

    println!("DID:      {}", record.did);
    if let Some(owner) = record.owner {
        println!("Owner:    {:?}", owner);
    }
    if let Some(created) = record.created {
        println!("Created:  {}", created.to_rfc3339());
    }
    println!("{}", serde_json::to_string_pretty(&record.metadata)?);
    for service in &record.services {
        println!(
            "Service {}: price {}, timeout {}s, {}",
            service.service_definition_id, service.price, service.timeout, service.service_endpoint
        );
    }
    Ok(())
}

/// Remove an asset's metadata record
pub async fn retire(config: MantarayConfig, did: &str) -> Result<()> {
    let did = Did::parse(did)?;
    let ocean = connect(config).await?;
    ocean.assets().retire_asset(&did).await?;
    println!("Retired {}", did);
    Ok(())
}
