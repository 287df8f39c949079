// ============================================================================
// LazyCoins - Library
// ============================================================================
// Expose les modules publics pour les exemples et tests
// ============================================================================

pub mod api;     // Client API de marché (CoinGecko)
pub mod app;     // État de l'application
pub mod config;  // Configuration par variables d'environnement
pub mod market;  // État du polling de données de marché
pub mod models;  // Structures de données
pub mod store;   // Persistance des favoris
pub mod ui;      // Interface utilisateur
pub mod view;    // Pipeline de vue (filtres + tri)
