// ============================================================================
// API Client : marché crypto (format CoinGecko)
// ============================================================================
// Récupère le batch de monnaies depuis l'endpoint de marché configuré.
//
// CoinClient reprend la sémantique du proxy d'origine :
// - cache à TTL court (60s par défaut) devant l'upstream
// - en cas d'échec upstream, un petit batch de secours fixe est servi à la
//   place de l'erreur (désactivable pour laisser l'erreur remonter)
// ============================================================================

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::models::CoinData;

/// Endpoint par défaut : top 250 par capitalisation, en USD
pub const DEFAULT_MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets\
?vs_currency=usd&order=market_cap_desc&per_page=250&page=1&sparkline=false";

// ============================================================================
// Fetch brut
// ============================================================================

/// Récupère le batch de monnaies depuis l'endpoint
///
/// CONCEPT RUST : #[instrument]
/// - Macro tracing qui ajoute automatiquement un span
/// - Tous les logs à l'intérieur auront le contexte de l'appel
///
/// # Arguments
/// * `client` - Client HTTP réutilisé entre les polls
/// * `url` - Endpoint de marché (JSON : tableau de CoinData)
#[instrument(skip(client, url))]
pub async fn fetch_markets(client: &reqwest::Client, url: &str) -> Result<Vec<CoinData>> {
    debug!("Sending HTTP request to markets endpoint");
    let response = client
        .get(url)
        .send()
        .await
        .context("Échec de la requête HTTP vers l'API de marché")?;

    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    // Vérifie que la réponse est un succès HTTP (200-299)
    if !status.is_success() {
        error!(status = %status, "Markets endpoint returned error status");
        anyhow::bail!("L'API de marché a retourné une erreur : HTTP {}", status);
    }

    // CONCEPT RUST : Serde deserialization
    // - .json::<T>() désérialise automatiquement le JSON vers le type T
    debug!("Parsing JSON response");
    let coins: Vec<CoinData> = response
        .json()
        .await
        .context("Échec du parsing JSON de la réponse marché")?;

    info!(count = coins.len(), "Successfully fetched market data");
    Ok(coins)
}

/// Batch de secours servi quand l'upstream est injoignable
///
/// Valeurs fixes, juste de quoi garder le dashboard fonctionnel.
pub fn fallback_coins() -> Vec<CoinData> {
    vec![
        CoinData {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            image: "https://coin-images.coingecko.com/coins/images/1/large/bitcoin.png"
                .to_string(),
            current_price: 50000.0,
            price_change_percentage_24h: 2.5,
            total_volume: 30_000_000_000.0,
            market_cap: 950_000_000_000.0,
        },
        CoinData {
            id: "ethereum".to_string(),
            symbol: "eth".to_string(),
            name: "Ethereum".to_string(),
            image: "https://coin-images.coingecko.com/coins/images/279/large/ethereum.png"
                .to_string(),
            current_price: 3000.0,
            price_change_percentage_24h: -1.2,
            total_volume: 15_000_000_000.0,
            market_cap: 360_000_000_000.0,
        },
        CoinData {
            id: "binancecoin".to_string(),
            symbol: "bnb".to_string(),
            name: "BNB".to_string(),
            image: "https://coin-images.coingecko.com/coins/images/825/large/bnb-icon2_2x.png"
                .to_string(),
            current_price: 400.0,
            price_change_percentage_24h: 0.8,
            total_volume: 1_500_000_000.0,
            market_cap: 60_000_000_000.0,
        },
    ]
}

// ============================================================================
// Structure : CoinClient
// ============================================================================

/// Client de marché avec cache court et batch de secours
pub struct CoinClient {
    http: reqwest::Client,
    url: String,
    cache_ttl: Duration,
    mock_fallback: bool,

    /// Dernier batch servi avec succès et son horodatage
    cache: Option<(Instant, Vec<CoinData>)>,
}

impl CoinClient {
    /// Construit le client HTTP (User-Agent desktop pour éviter les blocages)
    pub fn new(url: String, cache_ttl: Duration, mock_fallback: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            http,
            url,
            cache_ttl,
            mock_fallback,
            cache: None,
        })
    }

    /// Retourne le batch courant : cache frais, fetch, ou batch de secours
    pub async fn coins(&mut self) -> Result<Vec<CoinData>> {
        if let Some((cached_at, cached)) = &self.cache {
            if cache_is_fresh(*cached_at, self.cache_ttl, Instant::now()) {
                debug!(count = cached.len(), "Serving cached market batch");
                return Ok(cached.clone());
            }
        }

        match fetch_markets(&self.http, &self.url).await {
            Ok(coins) => {
                self.cache = Some((Instant::now(), coins.clone()));
                Ok(coins)
            }
            Err(e) => {
                if self.mock_fallback {
                    // Le poll reste fonctionnel, le dashboard affiche
                    // le batch de secours
                    warn!(error = ?e, "Upstream fetch failed, serving fallback batch");
                    Ok(fallback_coins())
                } else {
                    Err(e)
                }
            }
        }
    }
}

/// Vérifie si une entrée de cache est encore dans sa fenêtre de validité
fn cache_is_fresh(cached_at: Instant, ttl: Duration, now: Instant) -> bool {
    now.duration_since(cached_at) < ttl
}

// ============================================================================
// Tests unitaires
// ============================================================================
