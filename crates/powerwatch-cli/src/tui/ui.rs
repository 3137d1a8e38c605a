//! TUI rendering — dashboard over the monitor state.
//!
//! ┌──────────────────────────────────────────────┐
//! │  ⚡ powerwatch   SÉCURISÉ   00:12:07   s=5   │
//! ├──────────┬──────────┬──────────┬─────────────┤
//! │ Batterie │   CPU    │   RAM    │  Incidents  │
//! │  82 % ⚡ │  14 %    │  41 %    │      0      │
//! ├──────────┴──────────┴──────────┴─────────────┤
//! │  Journal                                     │
//! │  14:02:11  INFO     Système de surveillance… │
//! │  14:09:54  ALERT    ALERTE DE SÉCURITÉ: …    │
//! ├──────────────────────────────────────────────┤
//! │  Sensibilité 5 (seuil 60 %)                  │
//! │  space: surveillance  d: alerte  q: quitter  │
//! └──────────────────────────────────────────────┘

use ratatui::{prelude::*, widgets::*};

use powerwatch_core::{LogLevel, SecurityStatus};

use super::app::{App, Modal};

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(5), // metric cards
            Constraint::Min(6),    // journal
            Constraint::Length(1), // notice
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_cards(f, rows[1], app);
    draw_journal(f, rows[2], app);
    draw_notice(f, rows[3], app);
    draw_keys(f, rows[4], app);

    match app.modal() {
        Modal::Quit => draw_modal(
            f,
            "Quitter",
            "La surveillance est active. Quitter quand même ? (o/n)",
        ),
        Modal::Clear => draw_modal(f, "Effacer", "Effacer le journal affiché ? (o/n)"),
        Modal::None => {}
    }
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let (status_label, status_style) = match app.status() {
        SecurityStatus::Secure => ("SÉCURISÉ", Style::default().bold().fg(Color::Green)),
        SecurityStatus::Compromised => {
            // Alert banner flashes while armed.
            if app.alert_active() && app.flash_on() {
                ("COMPROMIS", Style::default().bold().fg(Color::Black).bg(Color::Red))
            } else {
                ("COMPROMIS", Style::default().bold().fg(Color::Red))
            }
        }
    };

    let monitoring = if app.monitoring_active() {
        format!("surveillance {}", format_elapsed(app))
    } else {
        "arrêté".to_string()
    };
    let sound = if app.sound_enabled() { "" } else { "  🔇" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" ⚡ powerwatch ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(status_label, status_style),
            Span::styled(
                format!("  {monitoring}  s={}{sound} ", app.sensitivity().level()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    f.render_widget(block, area);
}

fn draw_cards(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    draw_battery_card(f, cols[0], app);
    draw_gauge_card(f, cols[1], "CPU", app.latest().map(|s| s.cpu_percent));
    draw_gauge_card(f, cols[2], "RAM", app.latest().map(|s| s.memory_percent));
    draw_incidents_card(f, cols[3], app);
}

fn draw_battery_card(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title(" Batterie ");

    let Some(battery) = app.latest().and_then(|s| s.battery) else {
        let p = Paragraph::new("aucune batterie")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    };

    let threshold = app.sensitivity().threshold();
    let color = if !battery.plugged || battery.percent < threshold {
        Color::Red
    } else if battery.percent < threshold + 15.0 {
        Color::Yellow
    } else {
        Color::Green
    };
    let plug = if battery.plugged { "⚡ secteur" } else { "sur batterie" };

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color))
        .ratio(f64::from(battery.percent.clamp(0.0, 100.0)) / 100.0)
        .label(format!("{:.0} %  {plug}", battery.percent));
    f.render_widget(gauge, area);
}

fn draw_gauge_card(f: &mut Frame, area: Rect, title: &str, percent: Option<f32>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {title} "));

    match percent {
        Some(p) => {
            let gauge = Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(Color::Cyan))
                .ratio(f64::from(p.clamp(0.0, 100.0)) / 100.0)
                .label(format!("{p:.1} %"));
            f.render_widget(gauge, area);
        }
        None => {
            let p = Paragraph::new("--")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(p, area);
        }
    }
}

fn draw_incidents_card(f: &mut Frame, area: Rect, app: &App) {
    let incidents = app.incidents();
    let style = if incidents == 0 {
        Style::default().bold().fg(Color::Green)
    } else {
        Style::default().bold().fg(Color::Red)
    };
    let p = Paragraph::new(format!("\n{incidents}"))
        .style(style)
        .centered()
        .block(Block::default().borders(Borders::ALL).title(" Incidents "));
    f.render_widget(p, area);
}

fn draw_journal(f: &mut Frame, area: Rect, app: &App) {
    let entries = app.journal_entries();
    let visible = area.height.saturating_sub(2) as usize;
    let skip = entries.len().saturating_sub(visible);

    let lines: Vec<Line> = entries
        .iter()
        .skip(skip)
        .map(|entry| {
            let style = match entry.level {
                LogLevel::Info => Style::default().fg(Color::Green),
                LogLevel::Warning => Style::default().fg(Color::Yellow),
                LogLevel::Alert => Style::default().bold().fg(Color::Red),
            };
            Line::from(vec![
                Span::styled(entry.clock(), Style::default().fg(Color::DarkGray)),
                Span::raw("  "),
                Span::styled(format!("{:<7}", entry.level.label()), style),
                Span::raw("  "),
                Span::styled(entry.message.clone(), style),
            ])
        })
        .collect();

    let mut block = Block::default().borders(Borders::ALL).title(" Journal ");
    if app.alert_active() && app.flash_on() {
        block = block.border_style(Style::default().fg(Color::Red)).style(Style::default().bg(Color::Rgb(60, 0, 0)));
    }
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_notice(f: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(notice) = app.notice() {
        Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(error) = app.last_error() {
        Line::from(Span::styled(
            format!(" Erreur de surveillance: {error}"),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            format!(
                " Sensibilité {} (seuil {:.0} %)",
                app.sensitivity().level(),
                app.sensitivity().threshold()
            ),
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_keys(f: &mut Frame, area: Rect, app: &App) {
    let toggle = if app.monitoring_active() { "arrêter" } else { "démarrer" };
    let bar = Paragraph::new(format!(
        " space: {toggle}   d: couper l'alerte   m: son   ↑↓ sensibilité   e: exporter   c: effacer   q: quitter"
    ))
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

fn draw_modal(f: &mut Frame, title: &str, text: &str) {
    let area = centered_rect(46, 5, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {title} "));
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .centered()
        .block(block);
    f.render_widget(p, area);
}

fn centered_rect(width: u16, height: u16, frame: Rect) -> Rect {
    let x = frame.x + frame.width.saturating_sub(width) / 2;
    let y = frame.y + frame.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(frame.width),
        height: height.min(frame.height),
    }
}

fn format_elapsed(app: &App) -> String {
    let secs = app.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
