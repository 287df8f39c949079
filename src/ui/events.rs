// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching avec matches! pour identifier les touches
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

use crate::view::SortField;

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (rafraîchissement de frame)
    Tick,
}

/// Gestionnaire d'événements
///
/// Stateless : un seul handler pour toute l'application
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(250ms) : si pas d'événement, retourne Ok(Event::Tick)
    /// - Filtre sur KeyEventKind::Press : certains OS envoient aussi Release
    pub fn next(&self) -> Result<Event> {
        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                CrosstermEvent::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        Ok(Event::Key(key))
                    } else {
                        // Ignore Release, retourne Tick
                        Ok(Event::Tick)
                    }
                }

                // Autres événements (resize, mouse, etc.) : simple re-render
                _ => Ok(Event::Tick),
            }
        } else {
            // Timeout : pas d'événement, retourne Tick
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : identifier les touches
// ============================================================================

/// Vérifie si l'événement est la touche 'q' (quitter)
pub fn is_quit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Échap
pub fn is_escape_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Esc)
    } else {
        false
    }
}

/// Vérifie si l'événement est Entrée
pub fn is_enter_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Enter)
    } else {
        false
    }
}

/// Vérifie si l'événement est la flèche vers le haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    } else {
        false
    }
}

/// Vérifie si l'événement est la flèche vers le bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Tab (bascule All / My favorite)
pub fn is_tab_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Tab)
    } else {
        false
    }
}

/// Vérifie si l'événement est '/' (entrer en mode recherche)
pub fn is_search_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('/'))
    } else {
        false
    }
}

/// Vérifie si l'événement est 'f' ou Espace (basculer le favori)
pub fn is_favorite_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(
            key.code,
            KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::Char(' ')
        )
    } else {
        false
    }
}

/// Vérifie si l'événement est 'r' (poll immédiat)
pub fn is_refresh_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('r') | KeyCode::Char('R'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Backspace
pub fn is_backspace_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Backspace)
    } else {
        false
    }
}

/// Associe une touche de colonne à son champ de tri
///
/// [p] Price  [c] 24h Change  [v] 24h Volume  [m] Market Cap
pub fn sort_field_from_event(event: &Event) -> Option<SortField> {
    let Event::Key(key) = event else {
        return None;
    };

    match key.code {
        KeyCode::Char('p') | KeyCode::Char('P') => Some(SortField::Price),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(SortField::Change24h),
        KeyCode::Char('v') | KeyCode::Char('V') => Some(SortField::Volume),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(SortField::MarketCap),
        _ => None,
    }
}

/// Vérifie si l'événement est un caractère saisissable dans la recherche
pub fn is_search_char_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char(c) if !c.is_control())
    } else {
        false
    }
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    if let Event::Key(key) = event {
        if let KeyCode::Char(c) = key.code {
            return Some(c);
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), event::KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key('q')));
        assert!(is_quit_event(&key('Q')));
        assert!(!is_quit_event(&key('a')));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_sort_field_from_event() {
        assert_eq!(sort_field_from_event(&key('p')), Some(SortField::Price));
        assert_eq!(sort_field_from_event(&key('c')), Some(SortField::Change24h));
        assert_eq!(sort_field_from_event(&key('v')), Some(SortField::Volume));
        assert_eq!(sort_field_from_event(&key('M')), Some(SortField::MarketCap));
        assert_eq!(sort_field_from_event(&key('z')), None);
        assert_eq!(sort_field_from_event(&Event::Tick), None);
    }

    #[test]
    fn test_favorite_and_search_events() {
        assert!(is_favorite_event(&key('f')));
        assert!(is_favorite_event(&key(' ')));
        assert!(is_search_event(&key('/')));
        assert!(!is_search_event(&key('s')));
    }

    #[test]
    fn test_search_char_event() {
        assert!(is_search_char_event(&key('b')));
        assert!(is_search_char_event(&key(' ')));
        assert_eq!(get_char_from_event(&key('b')), Some('b'));
        assert_eq!(get_char_from_event(&Event::Tick), None);
    }
}
