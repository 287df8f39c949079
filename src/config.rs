// ============================================================================
// Configuration
// ============================================================================
// Configuration par variables d'environnement, avec des valeurs par défaut
// raisonnables. dotenvy charge un éventuel fichier .env sans écraser les
// variables déjà définies.
//
// Variables reconnues :
// - LAZYCOINS_ENDPOINT         : URL de l'endpoint de marché
// - LAZYCOINS_POLL_INTERVAL_MS : intervalle de polling (défaut 2000)
// - LAZYCOINS_CACHE_TTL_SECS   : TTL du cache côté client (défaut 60)
// - LAZYCOINS_MOCK_FALLBACK    : batch de secours sur échec upstream
//                                (défaut activé ; "0" ou "false" désactive)
// ============================================================================

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::api::DEFAULT_MARKETS_URL;

/// Configuration de l'application
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint de marché (JSON : tableau de CoinData)
    pub endpoint: String,

    /// Intervalle entre deux polls
    pub poll_interval: Duration,

    /// Fenêtre de validité du cache de batch
    pub cache_ttl: Duration,

    /// Sert le batch de secours quand l'upstream échoue
    pub mock_fallback: bool,
}

impl Config {
    /// Charge la configuration depuis l'environnement
    ///
    /// Une valeur absente ou illisible retombe sur le défaut : la
    /// configuration ne fait jamais échouer le démarrage.
    pub fn from_env() -> Self {
        // Charge .env s'il existe, sans écraser l'environnement
        dotenvy::dotenv().ok();

        let endpoint = env::var("LAZYCOINS_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_MARKETS_URL.to_string());

        let poll_interval = Duration::from_millis(parse_or(
            "LAZYCOINS_POLL_INTERVAL_MS",
            env::var("LAZYCOINS_POLL_INTERVAL_MS").ok(),
            2000,
        ));

        let cache_ttl = Duration::from_secs(parse_or(
            "LAZYCOINS_CACHE_TTL_SECS",
            env::var("LAZYCOINS_CACHE_TTL_SECS").ok(),
            60,
        ));

        let mock_fallback = flag_or(env::var("LAZYCOINS_MOCK_FALLBACK").ok(), true);

        Self {
            endpoint,
            poll_interval,
            cache_ttl,
            mock_fallback,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MARKETS_URL.to_string(),
            poll_interval: Duration::from_millis(2000),
            cache_ttl: Duration::from_secs(60),
            mock_fallback: true,
        }
    }
}

/// Parse un entier, retombe sur le défaut si absent ou illisible
fn parse_or(name: &str, raw: Option<String>, default: u64) -> u64 {
    match raw {
        None => default,
        Some(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(var = name, value = %value, default, "Unparseable config value, using default");
                default
            }
        },
    }
}

/// Parse un booléen permissif : "0" et "false" désactivent, le reste active
fn flag_or(raw: Option<String>, default: bool) -> bool {
    match raw {
        None => default,
        Some(value) => {
            let value = value.to_lowercase();
            value != "0" && value != "false"
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_defaults() {
        assert_eq!(parse_or("X", None, 2000), 2000);
        assert_eq!(parse_or("X", Some("500".to_string()), 2000), 500);
        // Valeur illisible : défaut, pas de panique
        assert_eq!(parse_or("X", Some("vite".to_string()), 2000), 2000);
    }

    #[test]
    fn test_flag_or() {
        assert!(flag_or(None, true));
        assert!(!flag_or(Some("0".to_string()), true));
        assert!(!flag_or(Some("false".to_string()), true));
        assert!(!flag_or(Some("FALSE".to_string()), true));
        assert!(flag_or(Some("1".to_string()), false));
        assert!(flag_or(Some("yes".to_string()), false));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert!(config.mock_fallback);
        assert!(config.endpoint.contains("coins/markets"));
    }
}
