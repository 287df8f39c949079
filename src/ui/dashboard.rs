// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine le tableau de marché avec les widgets de ratatui.
//
// Le tableau est fenêtré : seules les lignes de la fenêtre visible sont
// construites (voir view::visible_window), le coût de rendu reste borné
// quel que soit le nombre de monnaies du batch (~250).
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, Toast, ToastKind};
use crate::models::{format_currency, format_large_number, format_percentage};
use crate::view::{visible_window, Scope, SortField};

/// Dessine l'interface complète
///
/// Les deux écrans (dashboard et saisie de recherche) partagent le même
/// layout, seul le footer change. Le toast éventuel est dessiné par-dessus.
pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let chunks = create_layout(size);

    render_header(frame, app, chunks[0]);
    render_controls(frame, app, chunks[1]);
    render_table(frame, app, chunks[2]);

    if app.is_in_search_mode() {
        render_search_footer(frame, app, chunks[3]);
    } else {
        render_footer(frame, app, chunks[3]);
    }

    if let Some(toast) = &app.toast {
        render_toast(frame, toast, size);
    }
}

/// Crée le layout principal (header, contrôles, tableau, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header : titre
            Constraint::Length(3),  // Contrôles : onglets + recherche + statut
            Constraint::Min(0),     // Tableau : tout le reste
            Constraint::Length(3),  // Footer : raccourcis
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : Titre et statut de rafraîchissement
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" LazyCoins ")
        .title_alignment(Alignment::Center);

    // Statut à droite du titre : erreur persistante, ou heure du dernier
    // batch appliqué (politique stale-but-available : les données restent
    // affichées sous la bannière d'erreur)
    let status = if app.market.error {
        Span::styled(
            "Error loading coins data",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if let Some(updated) = app.market.last_updated {
        Span::styled(
            format!("Updated {}", updated.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled("Waiting for data...", Style::default().fg(Color::DarkGray))
    };

    let text = vec![Line::from(vec![
        Span::styled(
            "🚀 Crypto Market Dashboard",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        status,
    ])];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Contrôles : onglets de scope et recherche
// ============================================================================

fn render_controls(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let tab_style = |scope: Scope| {
        if app.scope == scope {
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::Gray)
        }
    };

    let search_display = if app.search_term.is_empty() && !app.is_in_search_mode() {
        Span::styled(
            "Search something... (BTC, Bitcoin, B...)",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled(&app.search_term, Style::default().fg(Color::White))
    };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(format!(" {} ", Scope::All.label()), tab_style(Scope::All)),
        Span::raw(" "),
        Span::styled(
            format!(" {} ", Scope::Favorite.label()),
            tab_style(Scope::Favorite),
        ),
        Span::raw("   🔍 "),
        search_display,
    ];

    // Curseur de saisie en mode recherche
    if app.is_in_search_mode() {
        spans.push(Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    let paragraph = Paragraph::new(vec![Line::from(spans)])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tableau : la vue dérivée, fenêtrée
// ============================================================================

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.derived();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" 📊 Coin List ({}) ", view.len()));

    // État initial : rien reçu et favoris pas encore hydratés
    if app.market.is_loading || !app.favorites.is_loaded() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Loading market data...",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
        return;
    }

    // Vue dérivée vide : placeholder explicite au lieu du tableau
    if view.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No coins found",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
        return;
    }

    // En-têtes de colonnes, flèche sur le champ de tri actif
    let sort_label = |field: SortField, key: &str| {
        if app.sort_field == field {
            format!("[{}] {} {}", key, field.label(), app.sort_order.arrow())
        } else {
            format!("[{}] {}", key, field.label())
        }
    };

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from(Line::from(sort_label(SortField::Price, "p")).alignment(Alignment::Right)),
        Cell::from(Line::from(sort_label(SortField::Change24h, "c")).alignment(Alignment::Right)),
        Cell::from(Line::from(sort_label(SortField::Volume, "v")).alignment(Alignment::Right)),
        Cell::from(Line::from(sort_label(SortField::MarketCap, "m")).alignment(Alignment::Right)),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    // Fenêtrage : 2 lignes de bordure + 1 ligne d'en-tête
    let viewport_rows = area.height.saturating_sub(3) as usize;
    let window = visible_window(app.selected_index, viewport_rows, view.len());

    let rows: Vec<Row> = window
        .map(|index| {
            let coin = &view[index];
            let favorite = app.favorites.is_favorite(&coin.id);
            let star = if favorite { "★" } else { "☆" };

            let change_style = if coin.is_positive() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };

            let name_cell = Cell::from(Line::from(vec![
                Span::styled(
                    format!(" {} ", star),
                    if favorite {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    },
                ),
                Span::styled(
                    format!("{:<6}", coin.symbol.to_uppercase()),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {}", coin.name), Style::default().fg(Color::Gray)),
            ]));

            let mut row = Row::new(vec![
                name_cell,
                Cell::from(
                    Line::from(format_currency(coin.current_price)).alignment(Alignment::Right),
                ),
                Cell::from(
                    Line::from(Span::styled(
                        format_percentage(coin.price_change_percentage_24h),
                        change_style,
                    ))
                    .alignment(Alignment::Right),
                ),
                Cell::from(
                    Line::from(format_large_number(coin.total_volume))
                        .alignment(Alignment::Right),
                ),
                Cell::from(
                    Line::from(format_large_number(coin.market_cap)).alignment(Alignment::Right),
                ),
            ]);

            if index == app.selected_index {
                row = row.style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::REVERSED),
                );
            }

            row
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(28),     // Name (étoile + symbole + nom)
            Constraint::Length(16),  // Price
            Constraint::Length(14),  // 24h Change
            Constraint::Length(14),  // 24h Volume
            Constraint::Length(14),  // Market Cap
        ],
    )
    .header(header)
    .block(block);

    frame.render_widget(table, area);
}

// ============================================================================
// Footer : raccourcis et confirmation de quit
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        // Message de confirmation de quit (two-step)
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Quit  "),
            Span::styled("[↑↓ / j k]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Navigate  "),
            Span::styled("[Tab]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Tabs  "),
            Span::styled("[/]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Search  "),
            Span::styled("[f]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Favorite  "),
            Span::styled("[p c v m]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Sort  "),
            Span::styled("[r]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Refresh"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Footer en mode recherche : rappel des touches de saisie
fn render_search_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));  // Vert : mode saisie

    let input_line = Line::from(vec![
        Span::styled(
            "Search: ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(&app.search_term, Style::default().fg(Color::White)),
        Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
        Span::raw("   "),
        Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Keep  "),
        Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Clear"),
    ]);

    let paragraph = Paragraph::new(vec![input_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Toast : notification éphémère par-dessus le dashboard
// ============================================================================

fn render_toast(frame: &mut Frame, toast: &Toast, size: Rect) {
    let width = (toast.message.len() as u16 + 6).min(size.width);
    let area = Rect {
        x: size.width.saturating_sub(width) / 2,
        y: 1,
        width,
        height: 3.min(size.height),
    };

    let (border_color, icon) = match toast.kind {
        ToastKind::Success => (Color::Green, "✓"),
        ToastKind::Error => (Color::Red, "✗"),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let line = Line::from(vec![
        Span::styled(
            format!("{} ", icon),
            Style::default().fg(border_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(&toast.message, Style::default().add_modifier(Modifier::BOLD)),
    ]);

    // Clear efface la zone avant de dessiner par-dessus le tableau
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(vec![line])
            .block(block)
            .alignment(Alignment::Center),
        area,
    );
}
