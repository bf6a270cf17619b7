//! User registry
//!
//! Builds simulated users from the ledger's address list. Roles alternate
//! by position, names come from a [`NameGenerator`] and credentials from a
//! [`CredentialSource`]. The resulting [`UserRegistry`] is a plain value
//! handed to whoever needs it.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use ethers::types::Address;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Credential, Role, User};
use crate::parse_address;

/// Lookup of account passwords
pub trait CredentialSource {
    /// Credential for an address, if known
    fn credential_for(&self, address: &Address) -> Option<Credential>;
}

impl CredentialSource for HashMap<Address, Credential> {
    fn credential_for(&self, address: &Address) -> Option<Credential> {
        self.get(address).cloned()
    }
}

/// No credentials at all
impl CredentialSource for () {
    fn credential_for(&self, _address: &Address) -> Option<Credential> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct PasswordRow {
    address: String,
    password: String,
}

/// Address to password map, usually loaded from `passwords.csv`
#[derive(Debug, Clone, Default)]
pub struct PasswordMap {
    passwords: HashMap<Address, Credential>,
}

impl PasswordMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a CSV file with an `address,password` header
    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;
        Self::from_csv_reader(reader)
    }

    /// Load CSV text with an `address,password` header
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        Self::from_csv_reader(reader)
    }

    fn from_csv_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let mut map = Self::new();
        for row in reader.deserialize() {
            let row: PasswordRow = row?;
            let address = parse_address(&row.address)?;
            match Credential::new(row.password) {
                Some(credential) => map.insert(address, credential),
                None => warn!("Ignoring blank password for {:?}", address),
            }
        }
        debug!("Loaded {} account passwords", map.len());
        Ok(map)
    }

    /// Add or replace a password
    pub fn insert(&mut self, address: Address, credential: Credential) {
        self.passwords.insert(address, credential);
    }

    /// Number of known passwords
    pub fn len(&self) -> usize {
        self.passwords.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty()
    }
}

impl CredentialSource for PasswordMap {
    fn credential_for(&self, address: &Address) -> Option<Credential> {
        self.passwords.get(address).cloned()
    }
}

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Donald", "Edsger", "Frances", "Grace", "Hedy", "Ivan",
    "John", "Katherine", "Leslie", "Margaret", "Niklaus", "Radia", "Shafi", "Tim", "Whitfield",
    "Yukihiro",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Backus", "Codd", "Dijkstra", "Engelbart", "Floyd", "Goldwasser", "Hopper", "Iverson",
    "Johnson", "Knuth", "Lamport", "Liskov", "Hamilton", "Perlman", "Ritchie", "Shannon",
    "Thompson", "Turing", "Wirth",
];

/// Random full names, unique within one generator
#[derive(Debug)]
pub struct NameGenerator {
    rng: StdRng,
    used: HashSet<String>,
}

impl NameGenerator {
    /// Generator seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            used: HashSet::new(),
        }
    }

    /// Deterministic generator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            used: HashSet::new(),
        }
    }

    /// Next unused full name
    pub fn next_name(&mut self) -> String {
        for _ in 0..32 {
            let first = FIRST_NAMES[self.rng.gen_range(0..FIRST_NAMES.len())];
            let last = LAST_NAMES[self.rng.gen_range(0..LAST_NAMES.len())];
            let name = format!("{} {}", first, last);
            if self.used.insert(name.clone()) {
                return name;
            }
        }

        // Random picks keep colliding once most combinations are taken
        let base = format!(
            "{} {}",
            FIRST_NAMES[self.rng.gen_range(0..FIRST_NAMES.len())],
            LAST_NAMES[self.rng.gen_range(0..LAST_NAMES.len())]
        );
        let mut suffix = 2;
        loop {
            let name = format!("{} {}", base, suffix);
            if self.used.insert(name.clone()) {
                return name;
            }
            suffix += 1;
        }
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Build one user per address, in order
///
/// Even positions become data scientists, odd positions data owners. A
/// missing credential is not an error; the user is simply locked.
pub fn build_users(
    addresses: &[Address],
    credentials: &dyn CredentialSource,
    names: &mut NameGenerator,
) -> Vec<User> {
    addresses
        .iter()
        .enumerate()
        .map(|(i, address)| {
            User::new(
                names.next_name(),
                Role::for_index(i),
                *address,
                credentials.credential_for(address),
            )
        })
        .collect()
}

/// Users holding a credential, in input order
pub fn filter_unlocked(users: &[User]) -> Vec<User> {
    users.iter().filter(|u| u.is_unlocked()).cloned().collect()
}

/// The simulated users of one session
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: Vec<User>,
}

impl UserRegistry {
    /// Registry over prepared users
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Build users for an address list
    pub fn from_addresses(
        addresses: &[Address],
        credentials: &dyn CredentialSource,
        names: &mut NameGenerator,
    ) -> Self {
        let registry = Self::new(build_users(addresses, credentials, names));
        debug!(
            "Built {} users, {} unlocked",
            registry.len(),
            registry.unlocked().len()
        );
        registry
    }

    /// All users in ledger order
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// First user with the address
    pub fn get(&self, address: &Address) -> Option<&User> {
        self.users.iter().find(|u| u.address() == *address)
    }

    /// Users holding a credential
    pub fn unlocked(&self) -> Vec<User> {
        filter_unlocked(&self.users)
    }

    /// Users with the role
    pub fn with_role(&self, role: Role) -> Vec<&User> {
        self.users.iter().filter(|u| u.role() == role).collect()
    }

    /// A random unlocked user
    pub fn random_unlocked<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&User> {
        let unlocked: Vec<&User> = self.users.iter().filter(|u| u.is_unlocked()).collect();
        unlocked.choose(rng).copied()
    }

    /// Number of users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether there are no users
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
