// ============================================================================
// État du polling de données de marché
// ============================================================================
// Le worker de polling (voir main.rs) envoie des PollUpdate numérotés sur un
// channel ; MarketState les applique côté UI.
//
// Politique "stale-but-available" : un échec de refresh lève le flag error
// mais ne touche pas au dernier batch reçu. L'UI distingue "jamais chargé"
// (is_loading) de "chargé, dernier refresh en erreur".
//
// Politique "last-write-wins" déterministe : chaque requête porte un numéro
// de séquence strictement croissant, et une réponse n'est appliquée que si
// son numéro dépasse le plus haut déjà appliqué. Une requête lente partie
// plus tôt ne peut donc pas écraser une réponse plus récente.
// ============================================================================

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::models::CoinData;

// ============================================================================
// Commandes et résultats du worker
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker renvoie des PollUpdate numérotés
// ============================================================================

/// Commandes envoyées au worker de polling
#[derive(Debug, Clone)]
pub enum PollCommand {
    /// Déclenche un poll immédiat sans attendre le prochain tick (touche 'r')
    RefreshNow,
}

/// Résultat d'un poll, numéroté pour le last-write-wins
#[derive(Debug)]
pub enum PollUpdate {
    /// Batch reçu avec succès : remplace les données en entier
    Batch {
        seq: u64,
        coins: Vec<CoinData>,
        fetched_at: DateTime<Local>,
    },

    /// Échec du fetch : les données précédentes restent valables
    Failed { seq: u64, error: String },
}

impl PollUpdate {
    fn seq(&self) -> u64 {
        match self {
            PollUpdate::Batch { seq, .. } | PollUpdate::Failed { seq, .. } => *seq,
        }
    }
}

// ============================================================================
// Structure : MarketState
// ============================================================================

/// Dernier état connu du marché côté UI
pub struct MarketState {
    /// Dernier batch appliqué (remplacé en entier, jamais mergé)
    pub coins: Vec<CoinData>,

    /// True tant qu'aucun update (succès ou échec) n'est arrivé
    pub is_loading: bool,

    /// True si le dernier refresh a échoué (les données restent affichées)
    pub error: bool,

    /// Horodatage du dernier batch appliqué avec succès
    pub last_updated: Option<DateTime<Local>>,

    /// Plus haut numéro de séquence appliqué (les séquences partent à 1)
    last_seq: u64,
}

impl MarketState {
    pub fn new() -> Self {
        Self {
            coins: Vec::new(),
            is_loading: true,
            error: false,
            last_updated: None,
            last_seq: 0,
        }
    }

    /// Applique un update si son numéro de séquence est le plus haut vu
    ///
    /// Retourne true si l'update a été appliqué, false s'il était périmé.
    pub fn apply(&mut self, update: PollUpdate) -> bool {
        let seq = update.seq();
        if seq <= self.last_seq {
            // Réponse en retard d'une requête plus ancienne : on jette
            warn!(seq, last_seq = self.last_seq, "Discarding stale poll update");
            return false;
        }

        self.last_seq = seq;
        self.is_loading = false;

        match update {
            PollUpdate::Batch { coins, fetched_at, .. } => {
                debug!(seq, count = coins.len(), "Applying market batch");
                self.coins = coins;
                self.error = false;
                self.last_updated = Some(fetched_at);
            }
            PollUpdate::Failed { error, .. } => {
                // Stale-but-available : coins reste tel quel
                warn!(seq, error = %error, "Poll failed, keeping previous data");
                self.error = true;
            }
        }

        true
    }

    /// Vérifie si au moins un batch a déjà été appliqué
    pub fn has_data(&self) -> bool {
        !self.coins.is_empty()
    }
}

impl Default for MarketState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
