// ============================================================================
// Structure : CoinData
// ============================================================================
// Représente une cryptomonnaie telle que retournée par l'API de marché
// (format CoinGecko /coins/markets). Les noms de champs correspondent
// exactement au JSON pour que serde désérialise sans mapping.
//
// Cycle de vie : chaque poll remplace le batch entier, jamais de merge.
// ============================================================================

use serde::{Deserialize, Serialize};

/// Une cryptomonnaie avec ses données de marché courantes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinData {
    /// Identifiant unique dans le batch (ex: "bitcoin")
    pub id: String,

    /// Symbole court (ex: "btc")
    pub symbol: String,

    /// Nom complet (ex: "Bitcoin")
    pub name: String,

    /// URL de l'icône de la monnaie
    pub image: String,

    /// Prix actuel en USD
    pub current_price: f64,

    /// Variation sur 24h en pourcentage (signée)
    pub price_change_percentage_24h: f64,

    /// Volume échangé sur 24h en USD
    pub total_volume: f64,

    /// Capitalisation de marché en USD
    pub market_cap: f64,
}

impl CoinData {
    /// Vérifie si la variation 24h est positive (ou nulle)
    ///
    /// Utilisé pour choisir la couleur d'affichage (vert/rouge)
    pub fn is_positive(&self) -> bool {
        self.price_change_percentage_24h >= 0.0
    }
}

// ============================================================================
// Formatage pour l'affichage
// ============================================================================
// Reproduit le format "en-US" classique des dashboards de marché :
// - format_currency : $50,000.00
// - format_large_number : $30.00B (volume, market cap)
// - format_percentage : +2.50% / -1.20%
// ============================================================================

/// Formate un montant en USD avec séparateurs de milliers
///
/// # Exemple
/// assert_eq!(format_currency(50000.0), "$50,000.00");
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    // Arrondi au cent pour éviter les erreurs d'affichage des f64
    let cents = (value.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let frac = cents % 100;

    format!(
        "{}${}.{:02}",
        if negative { "-" } else { "" },
        group_thousands(whole),
        frac
    )
}

/// Formate un grand montant avec suffixe T/B/M
///
/// En dessous du million, retombe sur format_currency.
pub fn format_large_number(value: f64) -> String {
    const TRILLION: f64 = 1_000_000_000_000.0;
    const BILLION: f64 = 1_000_000_000.0;
    const MILLION: f64 = 1_000_000.0;

    if value >= TRILLION {
        format!("${:.2}T", value / TRILLION)
    } else if value >= BILLION {
        format!("${:.2}B", value / BILLION)
    } else if value >= MILLION {
        format!("${:.2}M", value / MILLION)
    } else {
        format_currency(value)
    }
}

/// Formate une variation en pourcentage, signe toujours affiché
pub fn format_percentage(value: f64) -> String {
    let sign = if value >= 0.0 { "+" } else { "-" };
    format!("{}{:.2}%", sign, value.abs())
}

/// Insère les séparateurs de milliers dans la partie entière
fn group_thousands(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }

    // Collecte les groupes de 3 chiffres en partant de la droite
    let mut groups = Vec::new();
    while value > 0 {
        groups.push(value % 1000);
        value /= 1000;
    }

    let mut out = String::new();
    for (i, group) in groups.iter().rev().enumerate() {
        if i == 0 {
            out.push_str(&group.to_string());
        } else {
            out.push_str(&format!(",{:03}", group));
        }
    }
    out
}

// ============================================================================
// Tests unitaires
// ============================================================================
