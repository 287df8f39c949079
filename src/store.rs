// ============================================================================
// Persistance des favoris
// ============================================================================
// Un set d'identifiants de monnaies, chargé au démarrage et réécrit en
// entier à chaque toggle (clé unique, valeur = tableau JSON d'ids).
//
// Le backend de stockage est injectable via un trait : fichier sur disque
// en production, mémoire dans les tests. Une erreur de parsing au chargement
// est seulement loggée et traitée comme "pas encore de favoris".
// ============================================================================

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

/// Nom du fichier de favoris (l'équivalent de la clé du key-value store)
const FAVORITES_FILE: &str = "coin-favorites.json";

// ============================================================================
// Trait FavoritesBackend
// ============================================================================
// CONCEPT RUST : Trait comme couture de test
// - Le store ne connaît que read/write sur une clé unique
// - FileBackend en production, MemoryBackend dans les tests
// ============================================================================

/// Backend key-value synchrone à clé unique
pub trait FavoritesBackend {
    /// Lit le payload stocké, None si la clé n'existe pas encore
    fn read(&self) -> Result<Option<String>>;

    /// Écrit le payload complet (remplace la valeur précédente)
    fn write(&self, payload: &str) -> Result<()>;
}

/// Backend fichier : un JSON dans le répertoire de données de la plateforme
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Chemin par défaut :
    /// - Linux/WSL : ~/.local/share/lazycoins/coin-favorites.json
    /// - macOS : ~/Library/Application Support/lazycoins/coin-favorites.json
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Impossible de déterminer le répertoire de données")?;
        Ok(data_dir.join("lazycoins").join(FAVORITES_FILE))
    }
}

impl FavoritesBackend for FileBackend {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let payload = fs::read_to_string(&self.path)
            .with_context(|| format!("Échec de la lecture de {}", self.path.display()))?;
        Ok(Some(payload))
    }

    fn write(&self, payload: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Échec de la création de {}", parent.display()))?;
        }

        fs::write(&self.path, payload)
            .with_context(|| format!("Échec de l'écriture de {}", self.path.display()))
    }
}

// ============================================================================
// Structure : FavoritesStore
// ============================================================================

/// Set de favoris en mémoire, synchronisé avec le backend à chaque mutation
pub struct FavoritesStore {
    backend: Box<dyn FavoritesBackend>,
    favorites: HashSet<String>,

    /// False tant que le chargement initial n'a pas eu lieu : l'UI peut
    /// éviter d'afficher un faux "pas favori" avant hydratation
    loaded: bool,
}

impl FavoritesStore {
    pub fn new(backend: Box<dyn FavoritesBackend>) -> Self {
        Self {
            backend,
            favorites: HashSet::new(),
            loaded: false,
        }
    }

    /// Charge le set depuis le backend
    ///
    /// Absence de données ou payload illisible : set vide, erreur seulement
    /// loggée (jamais remontée à l'utilisateur). Le flag loaded passe à true
    /// dans tous les cas.
    pub fn load(&mut self) {
        match self.backend.read() {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<String>>(&payload) {
                Ok(ids) => {
                    self.favorites = ids.into_iter().collect();
                    info!(count = self.favorites.len(), "Favorites loaded");
                }
                Err(e) => {
                    error!(error = %e, "Failed to parse favorites, starting empty");
                }
            },
            Ok(None) => {
                debug!("No stored favorites yet");
            }
            Err(e) => {
                error!(error = ?e, "Failed to read favorites, starting empty");
            }
        }

        self.loaded = true;
    }

    /// Vérifie si le chargement initial a eu lieu
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Bascule l'appartenance d'un id et persiste le set complet
    ///
    /// Retourne true si l'id vient d'être ajouté, false s'il vient d'être
    /// retiré. Deux toggles successifs restaurent l'état initial.
    ///
    /// La mutation en mémoire est optimiste : elle reste acquise même si la
    /// persistance échoue (l'erreur est remontée pour que l'UI la signale).
    pub fn toggle(&mut self, coin_id: &str) -> Result<bool> {
        let added = !self.favorites.contains(coin_id);
        if added {
            self.favorites.insert(coin_id.to_string());
        } else {
            self.favorites.remove(coin_id);
        }

        debug!(coin_id = %coin_id, added, count = self.favorites.len(), "Favorite toggled");
        self.persist()?;
        Ok(added)
    }

    /// Lookup pur, sans effet de bord
    pub fn is_favorite(&self, coin_id: &str) -> bool {
        self.favorites.contains(coin_id)
    }

    /// Le set complet, pour le filtre de scope
    pub fn set(&self) -> &HashSet<String> {
        &self.favorites
    }

    /// Sérialise et écrit le set complet (l'ordre n'a pas de sémantique)
    fn persist(&self) -> Result<()> {
        let ids: Vec<&String> = self.favorites.iter().collect();
        let payload =
            serde_json::to_string(&ids).context("Échec de la sérialisation des favoris")?;
        self.backend.write(&payload)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Double de test : la "clé" est une cellule partagée, inspectable
    /// après que le backend a été move dans le store
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

    /// Backend dont l'écriture échoue toujours
    struct BrokenBackend;

    impl FavoritesBackend for BrokenBackend {
        fn read(&self) -> Result<Option<String>> {
            Ok(None)
        }

        fn write(&self, _payload: &str) -> Result<()> {
            anyhow::bail!("disque plein")
        }
    }

    fn stored_ids(backend: &MemoryBackend) -> Vec<String> {
        let payload = backend.cell.borrow().clone().expect("rien n'a été persisté");
        serde_json::from_str(&payload).expect("payload illisible")
    }

    #[test]
    fn test_load_without_stored_data() {
        let backend = MemoryBackend::default();
        let mut store = FavoritesStore::new(Box::new(backend));

        assert!(!store.is_loaded());
        store.load();

        assert!(store.is_loaded());
        assert!(store.set().is_empty());
    }

    #[test]
    fn test_load_with_unparseable_payload_yields_empty_set() {
        let backend = MemoryBackend::default();
        *backend.cell.borrow_mut() = Some("pas du json {{{".to_string());

        let mut store = FavoritesStore::new(Box::new(backend.clone()));
        store.load();

        // Erreur absorbée : set vide mais chargé quand même
        assert!(store.is_loaded());
        assert!(store.set().is_empty());
    }

    #[test]
    fn test_toggle_adds_then_persists() {
        let backend = MemoryBackend::default();
        let mut store = FavoritesStore::new(Box::new(backend.clone()));
        store.load();

        let added = store.toggle("bitcoin").unwrap();
        assert!(added);
        assert!(store.is_favorite("bitcoin"));
        assert_eq!(stored_ids(&backend), vec!["bitcoin".to_string()]);
    }

    #[test]
    fn test_toggle_twice_is_idempotent() {
        let backend = MemoryBackend::default();
        let mut store = FavoritesStore::new(Box::new(backend.clone()));
        store.load();

        assert!(store.toggle("ethereum").unwrap());
        assert!(!store.toggle("ethereum").unwrap());

        // Retour à l'état initial, ET l'état final est celui persisté
        assert!(!store.is_favorite("ethereum"));
        assert!(stored_ids(&backend).is_empty());
    }

    #[test]
    fn test_load_roundtrip() {
        let backend = MemoryBackend::default();
        {
            let mut store = FavoritesStore::new(Box::new(backend.clone()));
            store.load();
            store.toggle("bitcoin").unwrap();
            store.toggle("ethereum").unwrap();
        }

        // Nouvelle session : le set survit
        let mut store = FavoritesStore::new(Box::new(backend));
        store.load();
        assert!(store.is_favorite("bitcoin"));
        assert!(store.is_favorite("ethereum"));
        assert!(!store.is_favorite("binancecoin"));
    }

    #[test]
    fn test_persist_failure_keeps_memory_state() {
        let mut store = FavoritesStore::new(Box::new(BrokenBackend));
        store.load();

        // Mutation optimiste : l'erreur remonte mais le set est modifié
        let result = store.toggle("bitcoin");
        assert!(result.is_err());
        assert!(store.is_favorite("bitcoin"));
    }
}
