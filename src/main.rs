// ============================================================================
// LazyCoins - Dashboard crypto dans le terminal
// ============================================================================
// Liste les cryptomonnaies (prix, variation 24h, volume, market cap) avec
// recherche, tri, onglet favoris persistés et polling automatique.
//
// Architecture :
// - Un worker thread polle l'endpoint de marché et envoie des PollUpdate
//   numérotés sur un channel (last-write-wins côté UI)
// - L'event loop draine les updates, met à jour l'état, dessine, lit l'input
// - Le terminal est toujours restauré avant de quitter, même en erreur
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info};

use lazycoins::api::CoinClient;
use lazycoins::app::App;
use lazycoins::config::Config;
use lazycoins::market::{PollCommand, PollUpdate};
use lazycoins::store::{FavoritesStore, FileBackend};
use lazycoins::ui::{events::EventHandler, render};

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier avec rotation quotidienne.
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans :
/// - Linux/WSL : ~/.local/share/lazycoins/logs/lazycoins.log
/// - macOS : ~/Library/Application Support/lazycoins/logs/lazycoins.log
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/lazycoins/logs/lazycoins.log
///
/// # Contrôler le niveau de log
/// RUST_LOG=debug cargo run
/// RUST_LOG=lazycoins=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = dirs::data_local_dir()
        .map(|dir| dir.join("lazycoins").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"));

    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    // Rotation quotidienne : lazycoins.log.2024-01-15, etc.
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "lazycoins.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: lazycoins::api::coins)
                .with_thread_ids(true) // Inclut l'ID du thread (utile pour le worker)
                .with_line_number(true), // Inclut le numéro de ligne
        )
        .with(
            // Par défaut : debug pour lazycoins, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazycoins=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // Logging d'abord : si l'init échoue, on continue quand même
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("LazyCoins starting up");

    let config = Config::from_env();
    info!(?config, "Configuration loaded");

    // Charge les favoris persistés (absence ou erreur de parsing = set vide)
    let favorites_path = FileBackend::default_path()?;
    debug!(path = %favorites_path.display(), "Loading favorites");
    let mut favorites = FavoritesStore::new(Box::new(FileBackend::new(favorites_path)));
    favorites.load();

    let mut app = App::new(favorites);

    // Setup du terminal en mode TUI
    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    // Channels de communication avec le worker de polling
    // - command_tx/rx : UI -> worker (RefreshNow)
    // - update_tx/rx : worker -> UI (batchs numérotés)
    let (command_tx, command_rx) = mpsc::channel::<PollCommand>();
    let (update_tx, update_rx) = mpsc::channel::<PollUpdate>();

    info!("Spawning market poller thread");
    spawn_market_poller(command_rx, update_tx, config);

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, command_tx, update_rx);

    // Restaure le terminal (même en cas d'erreur). Le Sender de commandes
    // a été droppé en sortant de run() : le worker se termine tout seul.
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Worker de polling
// ============================================================================
// Thread séparé avec son propre runtime tokio : les fetchs ne bloquent
// jamais l'UI. Chaque poll porte un numéro de séquence strictement
// croissant pour le last-write-wins côté UI.
// ============================================================================

/// Lance le thread qui polle l'endpoint de marché
///
/// Le worker vit tant que le Sender de commandes existe : quand l'UI le
/// droppe (teardown), recv_timeout retourne Disconnected et la boucle sort.
fn spawn_market_poller(
    command_rx: mpsc::Receiver<PollCommand>,
    update_tx: mpsc::Sender<PollUpdate>,
    config: Config,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create tokio runtime, poller disabled");
                return;
            }
        };

        let mut client = match CoinClient::new(
            config.endpoint.clone(),
            config.cache_ttl,
            config.mock_fallback,
        ) {
            Ok(client) => client,
            Err(e) => {
                error!(error = ?e, "Failed to create HTTP client, poller disabled");
                return;
            }
        };

        let mut seq: u64 = 0;

        loop {
            seq += 1;
            debug!(seq, "Polling markets endpoint");

            // block_on bloque le thread worker, pas l'UI
            let update = match runtime.block_on(client.coins()) {
                Ok(coins) => {
                    info!(seq, count = coins.len(), "Market batch fetched");
                    PollUpdate::Batch {
                        seq,
                        coins,
                        fetched_at: Local::now(),
                    }
                }
                Err(e) => {
                    error!(seq, error = ?e, "Market fetch failed");
                    PollUpdate::Failed {
                        seq,
                        error: e.to_string(),
                    }
                }
            };

            if update_tx.send(update).is_err() {
                info!("Poller exiting (UI gone)");
                break;
            }

            // Attend le prochain tick d'intervalle, ou une commande
            match command_rx.recv_timeout(config.poll_interval) {
                Ok(PollCommand::RefreshNow) => {
                    debug!("Manual refresh requested");
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    // Tick normal : on repart poller
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    info!("Poller exiting (channel closed)");
                    break;
                }
            }
        }
    });
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   1. Draine les updates du worker (last-write-wins via MarketState)
//   2. Tick : expire le toast, recalcule la vue dérivée si besoin
//   3. Render
//   4. Input (poll 250ms)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: mpsc::Sender<PollCommand>,
    update_rx: mpsc::Receiver<PollUpdate>,
) -> Result<()> {
    loop {
        if !app.is_running() {
            break;
        }

        // 1. UPDATES : draine tout ce que le worker a envoyé
        loop {
            match update_rx.try_recv() {
                Ok(update) => app.apply_poll(update),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    // Worker mort : l'UI reste utilisable avec les données
                    // en place, plus aucun refresh n'arrivera
                    error!("Poller thread disconnected");
                    break;
                }
            }
        }

        // 2. UPDATE : toast et vue dérivée
        app.tick();

        // 3. RENDER
        terminal.draw(|frame| render(frame, app))?;

        // 4. INPUT
        match events.next() {
            Ok(event) => handle_event(app, event, &command_tx),
            Err(e) => {
                error!(error = ?e, "Failed to read terminal event");
            }
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================
// Guards par écran : en mode recherche, les caractères vont au terme de
// recherche ; sur le dashboard ils déclenchent les raccourcis.
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
fn handle_event(app: &mut App, event: lazycoins::ui::events::Event, command_tx: &mpsc::Sender<PollCommand>) {
    use lazycoins::ui::events::{
        get_char_from_event, is_backspace_event, is_down_event, is_enter_event, is_escape_event,
        is_favorite_event, is_quit_event, is_refresh_event, is_search_char_event, is_search_event,
        is_tab_event, is_up_event, sort_field_from_event, Event,
    };

    match event {
        // ========================================
        // Mode recherche : la saisie passe en premier
        // ========================================

        // ESC : annule la recherche (terme effacé)
        Event::Key(_) if is_escape_event(&event) && app.is_in_search_mode() => {
            info!("User cleared search");
            app.cancel_search();
        }

        // Enter : valide la recherche (terme conservé)
        Event::Key(_) if is_enter_event(&event) && app.is_in_search_mode() => {
            info!(term = %app.search_term, "User confirmed search");
            app.confirm_search();
        }

        // Backspace : supprime le dernier caractère
        Event::Key(_) if is_backspace_event(&event) && app.is_in_search_mode() => {
            app.pop_search_char();
        }

        // Caractères : filtrage en direct
        Event::Key(_) if is_search_char_event(&event) && app.is_in_search_mode() => {
            if let Some(c) = get_char_from_event(&event) {
                app.push_search_char(c);
            }
        }

        // ========================================
        // Dashboard
        // ========================================

        // 'q' : quit confirmation two-step
        Event::Key(_) if is_quit_event(&event) && app.is_on_dashboard() => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        // Tab : bascule All / My favorite
        Event::Key(_) if is_tab_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.toggle_scope();
        }

        // Navigation dans le tableau
        Event::Key(_) if is_up_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.navigate_down();
        }

        // '/' : entre en mode recherche
        Event::Key(_) if is_search_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            debug!("User entered search mode");
            app.start_search();
        }

        // 'f' ou Espace : bascule le favori de la ligne sélectionnée
        Event::Key(_) if is_favorite_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.toggle_selected_favorite();
        }

        // 'r' : poll immédiat sans attendre le prochain tick
        Event::Key(_) if is_refresh_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            info!("User requested manual refresh");
            let _ = command_tx.send(PollCommand::RefreshNow);
        }

        // 'p' / 'c' / 'v' / 'm' : tri par colonne
        // Re-cliquer la colonne active inverse le sens
        Event::Key(_) if sort_field_from_event(&event).is_some() && app.is_on_dashboard() => {
            app.cancel_quit();
            if let Some(field) = sort_field_from_event(&event) {
                app.sort_by(field);
            }
        }

        // ESC : ferme le toast actif
        Event::Key(_) if is_escape_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.dismiss_toast();
        }

        Event::Tick => {
            // Tick régulier : rien à faire, le tick d'App est dans run()
        }

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation de quit si active
            app.cancel_quit();
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// Raw mode + alternate screen. IMPORTANT : toujours restaurer le terminal
// avant de quitter, même en cas d'erreur.
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    Ok(())
}
