// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod coin;  // Déclaration du module coin (fichier coin.rs)

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use lazycoins::models::coin::CoinData;
// On peut faire : use lazycoins::models::CoinData;
pub use coin::{format_currency, format_large_number, format_percentage, CoinData};
