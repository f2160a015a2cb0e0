//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup. Secrets come from the environment (Cloud Run
//! secret bindings in production, `.env` for local development).

use std::env;

/// Minimum length of the session signing key in bytes.
const MIN_SIGNING_KEY_LEN: usize = 32;

const DEFAULT_PLAN_PRICES: &str = "Strength=1500,Strength+Cardio=2000";

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    /// In-process store; data is lost on restart.
    Memory,
}

/// A subscription plan and its price per subscription term.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub name: String,
    pub price: u64,
}

/// The fixed set of plans an admin can assign.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    /// Parse `Name=price` pairs separated by commas.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut plans = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, price) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::Invalid("PLAN_PRICES", entry.to_string()))?;
            let name = name.trim();
            let price = price
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("PLAN_PRICES", entry.to_string()))?;
            if name.is_empty() || plans.iter().any(|p: &Plan| p.name == name) {
                return Err(ConfigError::Invalid("PLAN_PRICES", entry.to_string()));
            }
            plans.push(Plan {
                name: name.to_string(),
                price,
            });
        }
        if plans.is_empty() {
            return Err(ConfigError::Invalid("PLAN_PRICES", raw.to_string()));
        }
        Ok(Self { plans })
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Price for a plan; plans no longer in the catalogue count as zero.
    pub fn price_of(&self, name: &str) -> u64 {
        self.get(name).map(|p| p.price).unwrap_or(0)
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::parse(DEFAULT_PLAN_PRICES).unwrap_or_else(|_| Self::new(Vec::new()))
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashing {
    /// Memory in KiB
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashing {
    fn default() -> Self {
        Self {
            memory_cost: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Admin account created at startup when it does not exist yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Storage backend selection
    pub storage: StorageBackend,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Session token lifetime in days
    pub session_ttl_days: i64,
    /// Plans and their prices
    pub plans: PlanCatalog,
    /// Password hash cost
    pub password_hashing: PasswordHashing,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Optional first admin account
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_lowercase()
            .as_str()
        {
            "firestore" => StorageBackend::Firestore,
            "memory" => StorageBackend::Memory,
            other => return Err(ConfigError::Invalid("STORAGE_BACKEND", other.to_string())),
        };

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .trim()
            .as_bytes()
            .to_vec();
        if jwt_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid(
                "JWT_SIGNING_KEY",
                format!("must be at least {} bytes", MIN_SIGNING_KEY_LEN),
            ));
        }

        let session_ttl_days = match env::var("SESSION_TTL_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or(ConfigError::Invalid("SESSION_TTL_DAYS", raw))?,
            Err(_) => 30,
        };

        let plans = PlanCatalog::parse(
            &env::var("PLAN_PRICES").unwrap_or_else(|_| DEFAULT_PLAN_PRICES.to_string()),
        )?;

        let defaults = PasswordHashing::default();
        let password_hashing = PasswordHashing {
            memory_cost: parse_u32_var("ARGON2_MEMORY_KIB", defaults.memory_cost)?,
            iterations: parse_u32_var("ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: defaults.parallelism,
        };

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_EMAIL"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin {
                name: env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
                email: email.trim().to_string(),
                password,
            }),
            (Ok(_), Err(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            _ => None,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            storage,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            session_ttl_days,
            plans,
            password_hashing,
            jwt_signing_key,
            bootstrap_admin,
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            storage: StorageBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            session_ttl_days: 30,
            plans: PlanCatalog::default(),
            // Cheapest valid parameters; hashing cost is irrelevant in tests.
            password_hashing: PasswordHashing {
                memory_cost: 1024,
                iterations: 1,
                parallelism: 1,
            },
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            bootstrap_admin: None,
        }
    }
}

fn parse_u32_var(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or(ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_catalog() {
        let plans = PlanCatalog::default();
        assert_eq!(plans.plans().len(), 2);
        assert_eq!(plans.price_of("Strength"), 1500);
        assert_eq!(plans.price_of("Strength+Cardio"), 2000);
        assert!(!plans.contains("strength"));
    }

    #[test]
    fn test_plan_catalog_rejects_malformed_entries() {
        assert!(PlanCatalog::parse("Strength").is_err());
        assert!(PlanCatalog::parse("Strength=abc").is_err());
        assert!(PlanCatalog::parse("Strength=1,Strength=2").is_err());
        assert!(PlanCatalog::parse(" , ").is_err());
    }

    #[test]
    fn test_plan_catalog_trims_whitespace() {
        let plans = PlanCatalog::parse(" Yoga = 800 , Boxing=1200 ").unwrap();
        assert_eq!(plans.price_of("Yoga"), 800);
        assert_eq!(plans.price_of("Boxing"), 1200);
        assert_eq!(plans.price_of("Unknown"), 0);
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!!");
        env::set_var("STORAGE_BACKEND", "memory");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!!");
        assert!(config.session_ttl_days > 0);
    }
}
