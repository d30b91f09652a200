use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table};

use crate::api::DnsBackend;
use crate::app::{App, ConfirmDelete, Field, Focus, Mode, RecordForm, Tone};
use crate::classify::EffectiveType;
use crate::format::{format_content, format_name, format_ttl};

const HELP: &str = "q quit • Tab focus • Enter select zone • r reload • n new • e edit • d delete • / search • t/T type filter • z change zone • k token";

pub fn draw<B: DnsBackend>(frame: &mut Frame<'_>, app: &mut App<B>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(5)])
        .split(frame.size());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(chunks[0]);

    draw_zones(frame, body[0], app);
    draw_records_and_routes(frame, body[1], app);
    draw_status(frame, chunks[1], app);

    match &app.mode {
        Mode::TokenEntry(token) => draw_token_form(frame, token),
        Mode::RecordForm(form) => draw_record_form(frame, form, app.zone_name()),
        Mode::ConfirmDelete(confirm) => draw_confirm_delete(frame, confirm),
        Mode::Searching(text) => draw_search_overlay(frame, text),
        Mode::Normal => {}
    }

    if app.is_loading() {
        draw_loading(frame);
    }
}

fn focus_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_zones<B: DnsBackend>(frame: &mut Frame<'_>, area: Rect, app: &App<B>) {
    let current_id = app.current_zone.as_ref().map(|z| z.id.as_str());
    let items: Vec<ListItem> = app
        .zones
        .iter()
        .map(|zone| {
            let marker = if Some(zone.id.as_str()) == current_id {
                "● "
            } else {
                "  "
            };
            ListItem::new(format!("{marker}{}", zone.label()))
        })
        .collect();

    let mut state = ListState::default();
    if !app.zones.is_empty() {
        state.select(Some(app.selected_zone));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Zones")
                .border_style(focus_style(app.focus == Focus::Zones)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_records_and_routes<B: DnsBackend>(frame: &mut Frame<'_>, area: Rect, app: &mut App<B>) {
    let route_height = if app.routes.is_empty() {
        0
    } else {
        (app.routes.len() as u16 + 2).min(8)
    };
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(route_height),
        ])
        .split(area);

    app.update_record_page_size(vertical[0].height);

    let zone_name = app.zone_name().to_string();
    let start_index = app.record_page * app.page_size();
    let rows: Vec<Row> = app
        .paged_records()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let record = row.record;
            let mut table_row = Row::new(vec![
                Span::styled(
                    row.effective.to_string(),
                    Style::default().fg(type_color(&row.effective)),
                ),
                Span::raw(format_name(&record.name, &zone_name)),
                Span::raw(format_content(record, &row.effective)),
                Span::raw(format_ttl(record.ttl)),
                Span::raw(if record.is_proxied() { "CDN" } else { "" }),
            ]);
            if app.focus == Focus::Records && start_index + i == app.selected_record {
                table_row = table_row.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            table_row
        })
        .collect();

    let title = if zone_name.is_empty() {
        "DNS Records".to_string()
    } else {
        format!("DNS Records - {zone_name}")
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Length(11),
            Constraint::Length(4),
        ],
    )
    .header(
        Row::new(vec!["Type", "Name", "Content", "TTL", ""]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app.focus == Focus::Records))
            .title(title),
    )
    .column_spacing(1);

    frame.render_widget(table, vertical[0]);

    let detail = app.detail_line().unwrap_or_default();
    frame.render_widget(
        Paragraph::new(detail).block(Block::default().borders(Borders::ALL).title("Details")),
        vertical[1],
    );

    if !app.routes.is_empty() {
        let items: Vec<ListItem> = app
            .routes
            .iter()
            .map(|route| {
                let (state, color) = if route.is_enabled() {
                    ("enabled", Color::Green)
                } else {
                    ("disabled", Color::DarkGray)
                };
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{}  → ", route.pattern)),
                    Span::raw(route.script.clone().unwrap_or_else(|| "none".to_string())),
                    Span::raw("  "),
                    Span::styled(state, Style::default().fg(color)),
                ]))
            })
            .collect();
        frame.render_widget(
            List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Worker routes"),
            ),
            vertical[2],
        );
    }
}

fn type_color(kind: &EffectiveType) -> Color {
    match kind.as_str() {
        "A" => Color::Blue,
        "AAAA" => Color::LightBlue,
        "CNAME" => Color::Green,
        "TXT" => Color::Yellow,
        "MX" => Color::Magenta,
        "NS" => Color::Cyan,
        "CAA" | "CERT" | "DNSKEY" | "DS" | "SMIMEA" | "SSHFP" | "TLSA" => Color::LightRed,
        "SRV" | "URI" | "NAPTR" => Color::LightMagenta,
        "HTTPS" | "SVCB" => Color::LightGreen,
        "LOC" | "SPF" | "PTR" => Color::LightCyan,
        "WORKER" => Color::Rgb(243, 128, 32),
        _ => Color::DarkGray,
    }
}

fn draw_status<B: DnsBackend>(frame: &mut Frame<'_>, area: Rect, app: &App<B>) {
    let message = match app.message() {
        Some(message) => {
            let color = match message.tone {
                Tone::Info => Color::White,
                Tone::Success => Color::Green,
                Tone::Error => Color::Red,
            };
            Line::from(Span::styled(message.text.clone(), Style::default().fg(color)))
        }
        None => Line::raw(""),
    };
    let footer = Paragraph::new(vec![Line::raw(HELP), Line::raw(app.status_line()), message])
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(footer, area);
}

fn draw_token_form(frame: &mut Frame<'_>, token: &str) {
    let area = centered_rect(70, 30, frame.size());
    let masked = if token.is_empty() {
        "<required>".to_string()
    } else {
        "•".repeat(token.chars().count())
    };
    let lines = vec![
        Line::from(Span::styled(
            "Cloudflare API token",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("Needs Zone:Read and DNS:Edit permissions"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Token: ", Style::default().fg(Color::Yellow)),
            Span::raw(masked),
        ]),
        Line::from(""),
        Line::from("Enter to save and load zones • Esc to cancel"),
    ];
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("API token"));
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn draw_record_form(frame: &mut Frame<'_>, form: &RecordForm, zone_name: &str) {
    let area = centered_rect(70, 60, frame.size());
    let heading = if form.is_edit() {
        format!("Edit {} record", form.draft.record_type)
    } else {
        format!("New record in {zone_name}")
    };

    let mut lines = vec![
        Line::from(Span::styled(
            heading,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("Enter to advance/submit • Tab to move • ←/→ change type • Space toggles proxy • Esc to cancel"),
        Line::from(""),
    ];

    let active = form.active_field();
    for field in form.fields() {
        let value = match field {
            Field::Type => format!("◀ {} ▶", form.draft.record_type),
            Field::Name if form.draft.name.is_empty() => "@".to_string(),
            Field::Name => form.draft.name.clone(),
            Field::Content if form.draft.content.is_empty() => "<required>".to_string(),
            Field::Content => form.draft.content.clone(),
            Field::Ttl => form.draft.ttl.clone(),
            Field::Priority if form.draft.priority.is_empty() => "<required>".to_string(),
            Field::Priority => form.draft.priority.clone(),
            Field::Proxied => {
                if form.draft.proxied {
                    "[x] CDN".to_string()
                } else {
                    "[ ] DNS only".to_string()
                }
            }
        };
        let style = if field == active {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", field.label()), style),
            Span::styled(value, style),
        ]));
    }

    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(
        if form.is_edit() {
            "Edit record"
        } else {
            "Add record"
        },
    ));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn draw_confirm_delete(frame: &mut Frame<'_>, confirm: &ConfirmDelete) {
    let area = centered_rect(60, 30, frame.size());
    let lines = vec![
        Line::from(Span::styled(
            format!("Delete this {} record?", confirm.record_type),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Name: {}", confirm.name)),
        Line::from(format!("Content: {}", confirm.content)),
        Line::from(""),
        Line::from("y/Enter to confirm • n/Esc to cancel"),
    ];
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Delete record"),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn draw_search_overlay(frame: &mut Frame<'_>, text: &str) {
    let area = centered_rect(60, 20, frame.size());
    let lines = vec![
        Line::from("Filter records by name or content"),
        Line::from(vec![
            Span::styled("/ ", Style::default().fg(Color::Yellow)),
            Span::raw(text),
        ]),
        Line::from("Enter to keep • Esc to close"),
    ];
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Search"));
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn draw_loading(frame: &mut Frame<'_>) {
    let area = centered_rect(30, 15, frame.size());
    let paragraph = Paragraph::new(Line::from(Span::styled(
        "Loading…",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
