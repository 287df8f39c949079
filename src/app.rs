// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Garantit la cohérence de l'état
//
// La vue dérivée (scope -> recherche -> tri) est mémoïsée : elle n'est
// recalculée que si une de ses entrées a changé depuis le dernier calcul
// (flag view_dirty levé par chaque chemin de mutation).
// ============================================================================

use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::market::{MarketState, PollUpdate};
use crate::models::CoinData;
use crate::store::FavoritesStore;
use crate::view::{self, Scope, SortField, SortOrder};

/// Durée d'affichage d'un toast avant auto-effacement
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

// ============================================================================
// Enum : Screen
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul écran actif à la fois
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : tableau des monnaies
    Dashboard,

    /// Mode saisie du terme de recherche (filtrage en direct)
    Search,
}

// ============================================================================
// Toast : notification éphémère
// ============================================================================
// Au plus un message visible à la fois. Un nouveau show remplace l'ancien
// message ET son échéance : l'ancienne échéance ne peut pas effacer le
// nouveau message (chaque toast possède sa propre deadline).
// ============================================================================

/// Variante visuelle du toast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Message éphémère avec sa propre échéance
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    deadline: Instant,
}

impl Toast {
    /// Crée un toast dont l'échéance court à partir de `now`
    pub fn shown_at(message: impl Into<String>, kind: ToastKind, now: Instant) -> Self {
        Self {
            message: message.into(),
            kind,
            deadline: now + TOAST_DURATION,
        }
    }

    /// Vérifie si l'échéance est atteinte
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

// ============================================================================
// Structure : App
// ============================================================================

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Dernier état connu du marché (alimenté par le worker de polling)
    pub market: MarketState,

    /// Set de favoris persisté
    pub favorites: FavoritesStore,

    /// Onglet actif : All / My favorite
    pub scope: Scope,

    /// Terme de recherche courant (appliqué en direct pendant la saisie)
    pub search_term: String,

    /// Colonne de tri active
    pub sort_field: SortField,

    /// Sens du tri
    pub sort_order: SortOrder,

    /// Index de la ligne sélectionnée dans la vue dérivée
    pub selected_index: usize,

    /// Toast actif (au plus un)
    pub toast: Option<Toast>,

    /// Indique si l'utilisateur a demandé à quitter (attend confirmation)
    /// Two-step quit pour éviter les sorties accidentelles
    pub confirm_quit: bool,

    /// Vue dérivée mémoïsée
    derived: Vec<CoinData>,

    /// True si une entrée de la vue a changé depuis le dernier calcul
    view_dirty: bool,
}

impl App {
    /// Crée l'état initial : scope All, tri prix descendant
    pub fn new(favorites: FavoritesStore) -> Self {
        Self {
            running: true,
            current_screen: Screen::Dashboard,
            market: MarketState::new(),
            favorites,
            scope: Scope::All,
            search_term: String::new(),
            sort_field: SortField::Price,
            sort_order: SortOrder::Desc,
            selected_index: 0,
            toast: None,
            confirm_quit: false,
            derived: Vec::new(),
            view_dirty: true,
        }
    }

    // ========================================================================
    // Cycle de vie
    // ========================================================================

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Demande la confirmation de quitter (première pression de 'q')
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit (toute autre touche)
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// Efface le toast arrivé à échéance et recalcule la vue dérivée si
    /// nécessaire, avant le rendu de la frame.
    pub fn tick(&mut self) {
        self.expire_toast_at(Instant::now());
        self.refresh_view();
    }

    // ========================================================================
    // Données de marché
    // ========================================================================

    /// Applique un update du worker (last-write-wins via MarketState)
    pub fn apply_poll(&mut self, update: PollUpdate) {
        if self.market.apply(update) {
            self.view_dirty = true;
        }
    }

    // ========================================================================
    // Vue dérivée
    // ========================================================================

    /// La vue dérivée courante (scope + recherche + tri appliqués)
    pub fn derived(&self) -> &[CoinData] {
        &self.derived
    }

    /// Monnaie actuellement sélectionnée
    pub fn selected_coin(&self) -> Option<&CoinData> {
        self.derived.get(self.selected_index)
    }

    /// Recalcule la vue dérivée si une entrée a changé
    pub fn refresh_view(&mut self) {
        if !self.view_dirty {
            return;
        }

        self.derived = view::build_view(
            &self.market.coins,
            self.scope,
            self.favorites.set(),
            &self.search_term,
            self.sort_field,
            self.sort_order,
        );
        self.view_dirty = false;

        // La liste a pu rétrécir : recale la sélection
        if self.selected_index >= self.derived.len() {
            self.selected_index = self.derived.len().saturating_sub(1);
        }

        debug!(rows = self.derived.len(), "Derived view recomputed");
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// CONCEPT RUST : Saturating arithmetic, pas de panic sur unsigned
    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.derived.len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    // ========================================================================
    // Scope et tri
    // ========================================================================

    /// Bascule All <-> My favorite, sélection remise en haut
    pub fn toggle_scope(&mut self) {
        self.scope = self.scope.toggled();
        self.selected_index = 0;
        self.view_dirty = true;
        info!(scope = self.scope.label(), "Scope switched");
    }

    /// Politique des en-têtes de colonne : re-cliquer la colonne active
    /// inverse le sens ; une autre colonne devient active en descendant
    pub fn sort_by(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_field = field;
            self.sort_order = SortOrder::Desc;
        }

        self.view_dirty = true;
        debug!(field = field.label(), order = ?self.sort_order, "Sort changed");
    }

    // ========================================================================
    // Mode recherche
    // ========================================================================
    // Saisie modale (Vim-like) mais filtrage en direct : chaque caractère
    // tapé modifie le terme et donc la vue dérivée.
    // ========================================================================

    /// Entre en mode recherche ('/')
    pub fn start_search(&mut self) {
        self.current_screen = Screen::Search;
    }

    /// Valide la recherche : le terme reste appliqué (Enter)
    pub fn confirm_search(&mut self) {
        self.current_screen = Screen::Dashboard;
    }

    /// Annule la recherche : terme effacé, tout réapparaît (ESC)
    pub fn cancel_search(&mut self) {
        self.current_screen = Screen::Dashboard;
        if !self.search_term.is_empty() {
            self.search_term.clear();
            self.view_dirty = true;
        }
    }

    /// Ajoute un caractère au terme de recherche
    pub fn push_search_char(&mut self, c: char) {
        self.search_term.push(c);
        self.selected_index = 0;
        self.view_dirty = true;
    }

    /// Supprime le dernier caractère du terme
    pub fn pop_search_char(&mut self) {
        if self.search_term.pop().is_some() {
            self.selected_index = 0;
            self.view_dirty = true;
        }
    }

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    pub fn is_in_search_mode(&self) -> bool {
        self.current_screen == Screen::Search
    }

    // ========================================================================
    // Favoris
    // ========================================================================

    /// Bascule le favori de la ligne sélectionnée et affiche un toast
    ///
    /// Ignoré tant que le chargement initial des favoris n'a pas eu lieu
    /// (évite de muter un set pas encore hydraté).
    pub fn toggle_selected_favorite(&mut self) {
        if !self.favorites.is_loaded() {
            debug!("Favorites not hydrated yet, ignoring toggle");
            return;
        }

        let Some(coin_id) = self.selected_coin().map(|coin| coin.id.clone()) else {
            return;
        };

        match self.favorites.toggle(&coin_id) {
            Ok(true) => self.show_toast("Successfully added!", ToastKind::Success),
            Ok(false) => self.show_toast("Successfully deleted!", ToastKind::Success),
            Err(e) => {
                error!(coin_id = %coin_id, error = ?e, "Failed to persist favorites");
                self.show_toast("Failed to save favorites", ToastKind::Error);
            }
        }

        self.view_dirty = true;
    }

    // ========================================================================
    // Toast
    // ========================================================================

    /// Affiche un toast, en remplaçant l'éventuel toast courant
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.show_toast_at(message, kind, Instant::now());
    }

    /// Efface le toast immédiatement (fermeture explicite)
    pub fn dismiss_toast(&mut self) {
        self.toast = None;
    }

    /// Variante à horloge injectée, pour les tests
    fn show_toast_at(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        // Remplacement instantané : l'ancienne échéance est invalidée avec
        // l'ancien toast, pas de timer empilé
        self.toast = Some(Toast::shown_at(message, kind, now));
    }

    /// Efface le toast si son échéance est atteinte
    fn expire_toast_at(&mut self, now: Instant) {
        if let Some(toast) = &self.toast {
            if toast.is_expired(now) {
                self.toast = None;
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::PollUpdate;
    use crate::store::FavoritesBackend;
    use anyhow::Result;
    use chrono::Local;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryBackend {
        cell: Rc<RefCell<Option<String>>>,
    }

    impl FavoritesBackend for MemoryBackend {
        fn read(&self) -> Result<Option<String>> {
            Ok(self.cell.borrow().clone())
        }

        fn write(&self, payload: &str) -> Result<()> {
            *self.cell.borrow_mut() = Some(payload.to_string());
            Ok(())
        }
    }

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

    /// App hydratée avec un batch de trois monnaies
    fn app_with_batch() -> App {
        let mut favorites = FavoritesStore::new(Box::new(MemoryBackend::default()));
        favorites.load();

        let mut app = App::new(favorites);
        app.apply_poll(PollUpdate::Batch {
            seq: 1,
            coins: vec![
                coin("bitcoin", "btc", "Bitcoin", 50000.0),
                coin("ethereum", "eth", "Ethereum", 3000.0),
                coin("binancecoin", "bnb", "BNB", 400.0),
            ],
            fetched_at: Local::now(),
        });
        app.refresh_view();
        app
    }

    #[test]
    fn test_initial_state() {
        let mut favorites = FavoritesStore::new(Box::new(MemoryBackend::default()));
        favorites.load();
        let app = App::new(favorites);

        assert!(app.is_running());
        assert_eq!(app.scope, Scope::All);
        assert_eq!(app.sort_field, SortField::Price);
        assert_eq!(app.sort_order, SortOrder::Desc);
        assert!(app.derived().is_empty());
    }

    #[test]
    fn test_derived_view_sorted_price_desc_by_default() {
        let app = app_with_batch();
        let ids: Vec<&str> = app.derived().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["bitcoin", "ethereum", "binancecoin"]);
    }

    #[test]
    fn test_sort_header_policy() {
        let mut app = app_with_batch();

        // Re-cliquer la colonne active inverse le sens
        app.sort_by(SortField::Price);
        assert_eq!(app.sort_field, SortField::Price);
        assert_eq!(app.sort_order, SortOrder::Asc);

        // Une autre colonne devient active, sens remis en descendant
        app.sort_by(SortField::Volume);
        assert_eq!(app.sort_field, SortField::Volume);
        assert_eq!(app.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_search_filters_live() {
        let mut app = app_with_batch();

        app.start_search();
        assert!(app.is_in_search_mode());

        app.push_search_char('e');
        app.push_search_char('t');
        app.push_search_char('h');
        app.refresh_view();

        let ids: Vec<&str> = app.derived().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["ethereum"]);

        // ESC : terme effacé, tout réapparaît
        app.cancel_search();
        app.refresh_view();
        assert!(app.is_on_dashboard());
        assert_eq!(app.derived().len(), 3);
    }

    #[test]
    fn test_navigation_clamps_to_view() {
        let mut app = app_with_batch();

        app.navigate_up();
        assert_eq!(app.selected_index, 0);

        app.navigate_down();
        app.navigate_down();
        app.navigate_down();  // Au-delà du dernier : reste au dernier
        assert_eq!(app.selected_index, 2);
    }

    #[test]
    fn test_selection_reclamped_when_view_shrinks() {
        let mut app = app_with_batch();
        app.selected_index = 2;

        // La recherche réduit la vue à une seule ligne
        app.push_search_char('b');
        app.push_search_char('t');
        app.push_search_char('c');
        app.refresh_view();

        assert_eq!(app.derived().len(), 1);
        assert!(app.selected_index < app.derived().len());
    }

    #[test]
    fn test_toggle_favorite_shows_toast_and_scopes() {
        let mut app = app_with_batch();

        // Sélection = bitcoin (prix desc) : ajout
        app.toggle_selected_favorite();
        assert!(app.favorites.is_favorite("bitcoin"));
        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.message, "Successfully added!");
        assert_eq!(toast.kind, ToastKind::Success);

        // Scope favoris : seul bitcoin reste
        app.toggle_scope();
        app.refresh_view();
        let ids: Vec<&str> = app.derived().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["bitcoin"]);

        // Second toggle : retrait + toast de suppression
        app.toggle_selected_favorite();
        assert!(!app.favorites.is_favorite("bitcoin"));
        assert_eq!(app.toast.as_ref().unwrap().message, "Successfully deleted!");
    }

    #[test]
    fn test_toggle_ignored_before_hydration() {
        let favorites = FavoritesStore::new(Box::new(MemoryBackend::default()));
        // Pas de load() : le store n'est pas hydraté
        let mut app = App::new(favorites);
        app.apply_poll(PollUpdate::Batch {
            seq: 1,
            coins: vec![coin("bitcoin", "btc", "Bitcoin", 50000.0)],
            fetched_at: Local::now(),
        });
        app.refresh_view();

        app.toggle_selected_favorite();
        assert!(app.toast.is_none());
        assert!(!app.favorites.is_favorite("bitcoin"));
    }

    #[test]
    fn test_toast_expires_after_duration() {
        let mut app = app_with_batch();
        let t0 = Instant::now();

        app.show_toast_at("Successfully added!", ToastKind::Success, t0);

        // Avant l'échéance : toujours visible
        app.expire_toast_at(t0 + Duration::from_secs(2));
        assert!(app.toast.is_some());

        // Échéance atteinte : effacé
        app.expire_toast_at(t0 + TOAST_DURATION);
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_toast_preempted_by_new_show() {
        let mut app = app_with_batch();
        let t0 = Instant::now();

        app.show_toast_at("Successfully added!", ToastKind::Success, t0);
        app.show_toast_at("Successfully deleted!", ToastKind::Success, t0 + Duration::from_secs(2));

        // L'échéance du premier toast (t0+3s) ne doit pas effacer le second
        app.expire_toast_at(t0 + Duration::from_secs(3));
        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.message, "Successfully deleted!");

        // Le second expire sur sa propre échéance (t0+5s)
        app.expire_toast_at(t0 + Duration::from_secs(5));
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_toast_dismiss_is_final() {
        let mut app = app_with_batch();
        let t0 = Instant::now();

        app.show_toast_at("Successfully added!", ToastKind::Success, t0);
        app.dismiss_toast();
        assert!(app.toast.is_none());

        // Pas de réapparition quand l'ancienne échéance passe
        app.expire_toast_at(t0 + TOAST_DURATION);
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = app_with_batch();

        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        assert!(app.is_running());

        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());

        app.quit();
        assert!(!app.is_running());
    }
}
