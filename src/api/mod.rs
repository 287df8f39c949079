// ============================================================================
// Module : api
// ============================================================================
// Ce module contient le client API pour récupérer les données de marché
// (format CoinGecko), avec cache court et batch de secours.
// ============================================================================

pub mod coins;  // Client API de marché

// Re-export des éléments principaux
pub use coins::{fallback_coins, fetch_markets, CoinClient, DEFAULT_MARKETS_URL};
