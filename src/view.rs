// ============================================================================
// Pipeline de vue : scope -> recherche -> tri
// ============================================================================
// Fonctions pures qui transforment le batch de monnaies en la liste affichée.
// Les trois étapes sont appliquées dans un ordre fixe :
//   1. Filtre de scope (tous / favoris uniquement)
//   2. Filtre texte (sous-chaîne insensible à la casse sur nom OU symbole)
//   3. Tri stable par le champ sélectionné
//
// Tout est déterministe : mêmes entrées, même liste dérivée. L'état
// (scope, terme, champ de tri) vit dans App ; ici il n'y a que du calcul.
// ============================================================================

use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::Range;

use crate::models::CoinData;

// ============================================================================
// Enums d'état de vue
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul scope / champ de tri / sens actif à la fois
// - Le compilateur force à gérer tous les cas (exhaustivité)
// ============================================================================

/// Onglet actif : toutes les monnaies ou seulement les favoris
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Favorite,
}

impl Scope {
    /// Libellé affiché dans l'onglet
    pub fn label(&self) -> &'static str {
        match self {
            Scope::All => "All",
            Scope::Favorite => "My favorite",
        }
    }

    /// Bascule vers l'autre onglet (touche Tab)
    pub fn toggled(&self) -> Self {
        match self {
            Scope::All => Scope::Favorite,
            Scope::Favorite => Scope::All,
        }
    }
}

/// Champ de tri, un par colonne numérique du tableau
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Change24h,
    Volume,
    MarketCap,
}

impl SortField {
    /// Libellé de la colonne
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Price => "Price",
            SortField::Change24h => "24h Change",
            SortField::Volume => "24h Volume",
            SortField::MarketCap => "Market Cap",
        }
    }

    /// Valeur numérique de ce champ pour une monnaie donnée
    pub fn value(&self, coin: &CoinData) -> f64 {
        match self {
            SortField::Price => coin.current_price,
            SortField::Change24h => coin.price_change_percentage_24h,
            SortField::Volume => coin.total_volume,
            SortField::MarketCap => coin.market_cap,
        }
    }
}

/// Sens du tri
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Sens inverse (clic sur la colonne déjà active)
    pub fn flipped(&self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Indicateur affiché dans l'en-tête de colonne
    pub fn arrow(&self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

// ============================================================================
// Étapes du pipeline
// ============================================================================

/// Étape 1 : filtre de scope
///
/// En scope Favorite, ne garde que les monnaies dont l'id est dans le set.
/// En scope All, passe tout sans modification.
pub fn filter_by_scope(coins: &[CoinData], scope: Scope, favorites: &HashSet<String>) -> Vec<CoinData> {
    match scope {
        Scope::All => coins.to_vec(),
        Scope::Favorite => coins
            .iter()
            .filter(|coin| favorites.contains(&coin.id))
            .cloned()
            .collect(),
    }
}

/// Étape 2 : filtre texte
///
/// Terme vide : passe tout. Sinon, garde les monnaies dont le nom OU le
/// symbole contient le terme, insensible à la casse ("BTC" matche "btc").
pub fn filter_by_search(coins: Vec<CoinData>, search_term: &str) -> Vec<CoinData> {
    if search_term.is_empty() {
        return coins;
    }

    let needle = search_term.to_lowercase();
    coins
        .into_iter()
        .filter(|coin| {
            coin.name.to_lowercase().contains(&needle)
                || coin.symbol.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Étape 3 : tri stable par le champ sélectionné
///
/// Le comparateur retourne Equal pour les valeurs égales et sort_by est
/// stable : les ex-aequo conservent leur ordre d'entrée. Les NaN éventuels
/// sont traités comme égaux plutôt que de paniquer.
pub fn sort_coins(mut coins: Vec<CoinData>, field: SortField, order: SortOrder) -> Vec<CoinData> {
    coins.sort_by(|a, b| {
        let cmp = field
            .value(a)
            .partial_cmp(&field.value(b))
            .unwrap_or(Ordering::Equal);

        match order {
            SortOrder::Asc => cmp,
            SortOrder::Desc => cmp.reverse(),
        }
    });
    coins
}

/// Compose les trois étapes dans l'ordre fixe scope -> texte -> tri
///
/// C'est la seule fonction que l'App appelle pour recalculer la vue dérivée.
pub fn build_view(
    coins: &[CoinData],
    scope: Scope,
    favorites: &HashSet<String>,
    search_term: &str,
    field: SortField,
    order: SortOrder,
) -> Vec<CoinData> {
    let scoped = filter_by_scope(coins, scope, favorites);
    let filtered = filter_by_search(scoped, search_term);
    sort_coins(filtered, field, order)
}

// ============================================================================
// Fenêtrage (virtualisation)
// ============================================================================
// Le tableau ne construit que les lignes visibles : pour un batch de ~250
// monnaies, on ne formate que viewport_rows lignes par frame, quel que soit
// le total. La fenêtre suit la sélection (scrolling centré).
// ============================================================================

/// Calcule la plage d'indices à afficher
///
/// Invariants :
/// - la plage ne déborde jamais de [0, total)
/// - la sélection est toujours dans la plage (si total > 0)
/// - la plage fait au plus viewport_rows éléments
pub fn visible_window(selected: usize, viewport_rows: usize, total: usize) -> Range<usize> {
    if total == 0 || viewport_rows == 0 {
        return 0..0;
    }

    // Centre la fenêtre sur la sélection, puis recale sur les bords
    let selected = selected.min(total - 1);
    let start = selected
        .saturating_sub(viewport_rows / 2)
        .min(total.saturating_sub(viewport_rows));
    let end = (start + viewport_rows).min(total);

    start..end
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoinData;

    fn coin(id: &str, symbol: &str, name: &str, price: f64) -> CoinData {
        CoinData {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            image: String::new(),
            current_price: price,
            price_change_percentage_24h: 0.0,
            total_volume: 0.0,
            market_cap: 0.0,
        }
    }

    fn sample_batch() -> Vec<CoinData> {
        vec![
            coin("bitcoin", "btc", "Bitcoin", 50000.0),
            coin("ethereum", "eth", "Ethereum", 3000.0),
            coin("binancecoin", "bnb", "BNB", 400.0),
        ]
    }

    #[test]
    fn test_scope_all_passes_through() {
        let batch = sample_batch();
        let favorites = HashSet::new();

        let result = filter_by_scope(&batch, Scope::All, &favorites);
        assert_eq!(result, batch);
    }

    #[test]
    fn test_scope_favorite_with_empty_set_is_empty() {
        let batch = sample_batch();
        let favorites = HashSet::new();

        let result = filter_by_scope(&batch, Scope::Favorite, &favorites);
        assert!(result.is_empty());
    }

    #[test]
    fn test_scope_favorite_keeps_only_favorites() {
        let batch = sample_batch();
        let favorites: HashSet<String> = ["bitcoin".to_string()].into();

        // Indépendant du terme de recherche : vide ou non, bitcoin reste seul
        let view = build_view(&batch, Scope::Favorite, &favorites, "", SortField::Price, SortOrder::Desc);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "bitcoin");

        let view = build_view(&batch, Scope::Favorite, &favorites, "bit", SortField::Price, SortOrder::Desc);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "bitcoin");
    }

    #[test]
    fn test_search_is_case_insensitive_on_name_and_symbol() {
        let batch = sample_batch();

        // "BTC" doit matcher le symbole "btc"
        let result = filter_by_search(batch.clone(), "BTC");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "bitcoin");

        // "eth" matche Ethereum par nom ET symbole, pas Bitcoin
        let result = filter_by_search(batch.clone(), "eth");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "ethereum");

        // Terme vide : tout passe
        let result = filter_by_search(batch.clone(), "");
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_sort_desc_by_price() {
        // Scénario de référence : bitcoin avant ethereum en desc
        let batch = vec![
            coin("ethereum", "eth", "Ethereum", 3000.0),
            coin("bitcoin", "btc", "Bitcoin", 50000.0),
        ];

        let sorted = sort_coins(batch, SortField::Price, SortOrder::Desc);
        assert_eq!(sorted[0].id, "bitcoin");
        assert_eq!(sorted[1].id, "ethereum");
    }

    #[test]
    fn test_sort_asc_reverses() {
        let sorted = sort_coins(sample_batch(), SortField::Price, SortOrder::Asc);
        let ids: Vec<&str> = sorted.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["binancecoin", "ethereum", "bitcoin"]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        // Trois monnaies au même prix : l'ordre d'entrée doit être conservé,
        // en ascendant comme en descendant
        let batch = vec![
            coin("a", "aaa", "Alpha", 100.0),
            coin("b", "bbb", "Beta", 100.0),
            coin("c", "ccc", "Gamma", 100.0),
        ];

        let asc = sort_coins(batch.clone(), SortField::Price, SortOrder::Asc);
        let ids: Vec<&str> = asc.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);

        let desc = sort_coins(batch, SortField::Price, SortOrder::Desc);
        let ids: Vec<&str> = desc.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_build_view_is_permutation_of_filtered_input() {
        let batch = sample_batch();
        let favorites = HashSet::new();

        let view = build_view(&batch, Scope::All, &favorites, "", SortField::MarketCap, SortOrder::Asc);

        // Même contenu que l'entrée filtrée, ordre mis à part
        assert_eq!(view.len(), batch.len());
        for coin in &batch {
            assert!(view.iter().any(|c| c.id == coin.id));
        }
    }

    #[test]
    fn test_build_view_applies_stages_in_order() {
        let mut batch = sample_batch();
        batch[0].price_change_percentage_24h = 2.5;
        batch[1].price_change_percentage_24h = -1.2;
        batch[2].price_change_percentage_24h = 0.8;
        let favorites: HashSet<String> =
            ["bitcoin".to_string(), "binancecoin".to_string()].into();

        // Scope favoris + tri par variation asc : bnb (0.8) avant btc (2.5)
        let view = build_view(&batch, Scope::Favorite, &favorites, "", SortField::Change24h, SortOrder::Asc);
        let ids: Vec<&str> = view.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["binancecoin", "bitcoin"]);
    }

    #[test]
    fn test_visible_window_bounds() {
        // Fenêtre plus grande que la liste : tout est visible
        assert_eq!(visible_window(0, 20, 5), 0..5);

        // Liste vide ou viewport nul : plage vide
        assert_eq!(visible_window(0, 10, 0), 0..0);
        assert_eq!(visible_window(3, 0, 10), 0..0);
    }

    #[test]
    fn test_visible_window_follows_selection() {
        // 250 lignes, 20 visibles : la sélection est toujours dans la fenêtre
        for selected in [0, 9, 10, 125, 240, 249] {
            let window = visible_window(selected, 20, 250);
            assert!(window.contains(&selected), "selection {} hors fenêtre {:?}", selected, window);
            assert_eq!(window.len(), 20);
            assert!(window.end <= 250);
        }

        // En haut de liste : la fenêtre colle au bord
        assert_eq!(visible_window(0, 20, 250), 0..20);
        // En bas de liste : la fenêtre colle à la fin
        assert_eq!(visible_window(249, 20, 250), 230..250);
    }

    #[test]
    fn test_sort_order_and_scope_toggles() {
        assert_eq!(SortOrder::Desc.flipped(), SortOrder::Asc);
        assert_eq!(SortOrder::Asc.flipped(), SortOrder::Desc);
        assert_eq!(Scope::All.toggled(), Scope::Favorite);
        assert_eq!(Scope::Favorite.toggled(), Scope::All);
    }
}
