use chainviz_core::{validation::ValidationIssue, BlockReport};
use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Rect},
    prelude::*,
    widgets::*,
    Frame,
};

use crate::app::{App, MiningStatus, Tab, MAX_UI_DIFFICULTY, MIN_UI_DIFFICULTY};
use crate::theme::Palette;

const HASH_PREVIEW_LEN: usize = 10;

fn truncate_hash(h: &str) -> String {
    match h.char_indices().nth(HASH_PREVIEW_LEN) {
        Some((cut, _)) => format!("{}...", &h[..cut]),
        None => h.to_string(),
    }
}

fn report_style(report: Option<&BlockReport>, p: &Palette) -> Style {
    match report {
        Some(r) if r.has(ValidationIssue::HashMismatch) || r.has(ValidationIssue::LinkMismatch) => {
            Style::default().fg(p.error)
        }
        Some(r) if !r.is_ok() => Style::default().fg(p.warning),
        _ => Style::default().fg(p.text),
    }
}

fn report_codes(report: Option<&BlockReport>) -> String {
    match report {
        Some(r) if !r.is_ok() => r
            .issues
            .iter()
            .map(|i| i.code())
            .collect::<Vec<_>>()
            .join(","),
        _ => "OK".into(),
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let p = app.theme.palette();
    let size = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(p.background).fg(p.text)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(size);

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(20)])
        .split(chunks[0]);

    let titles = Tab::ALL
        .iter()
        .map(|t| Line::from(t.title()))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .select(app.tab as usize)
        .block(Block::default().borders(Borders::ALL).title("chainviz"))
        .style(Style::default().fg(p.secondary))
        .highlight_style(Style::default().fg(p.accent).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, header[0]);

    let (label, color) = if app.is_valid() {
        ("● Chain Valid", p.success)
    } else {
        ("● Chain Invalid", p.error)
    };
    let indicator = Paragraph::new(label)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(indicator, header[1]);

    match app.tab {
        Tab::Chain => render_chain(f, chunks[1], app, &p),
        Tab::Mine => render_mine(f, chunks[1], app, &p),
        Tab::AutoMine => render_auto_mine(f, chunks[1], app, &p),
        Tab::Tamper => render_tamper(f, chunks[1], app, &p),
        Tab::Ledger => render_ledger(f, chunks[1], app, &p),
        Tab::HashDemo => render_hashdemo(f, chunks[1], app, &p),
    }

    let help = Paragraph::new(
        "ESC quit • TAB prev/next tab • ^T theme • ^R reset chain • ^X cancel mining • Chain: ↑/↓ select, p details • Mine: ←/→ difficulty, Enter mine • Tamper: ←/→ field, Enter overwrite")
        .style(Style::default().fg(p.secondary))
        .block(Block::default().borders(Borders::ALL).title("help"));
    f.render_widget(help, chunks[2]);
}

fn render_chain(f: &mut Frame, area: Rect, app: &mut App, p: &Palette) {
    let rows = app.chain.blocks().iter().enumerate().map(|(i, b)| {
        let report = app.reports.get(i);
        Row::new(vec![
            Cell::from(b.index().to_string()),
            Cell::from(b.timestamp().to_string()),
            Cell::from(b.data().to_string()),
            Cell::from(b.nonce().to_string()),
            Cell::from(truncate_hash(b.hash())),
            Cell::from(truncate_hash(b.previous_hash())),
            Cell::from(report_codes(report)),
        ])
        .style(if i == app.cursor {
            report_style(report, p).add_modifier(Modifier::REVERSED)
        } else {
            report_style(report, p)
        })
    });
    let table = Table::new(
        rows,
        vec![
            Constraint::Length(6),
            Constraint::Length(14),
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(28),
        ],
    )
    .header(
        Row::new(vec!["idx", "ts (ms)", "data", "nonce", "hash", "prev", "status"])
            .style(Style::default().fg(p.secondary).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Blocks (difficulty {})", app.chain.difficulty())),
    );
    f.render_stateful_widget(table, area, &mut app.table_state);
    f.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        area,
        &mut app.scroll,
    );

    if app.popup {
        let popup = Block::bordered()
            .style(Style::default().bg(p.background).fg(p.accent))
            .title("Block details")
            .title_style(Style::new().fg(p.accent).bold())
            .border_style(Style::new().fg(p.error).bold());
        let mut items = match app.chain.block(app.cursor as u64) {
            None => vec!["No block selected".to_string()],
            Some(b) => vec![
                format!(" Index     : {}", b.index()),
                format!(" Timestamp : {}", b.timestamp()),
                format!(" Data      : {}", b.data()),
                format!(" Nonce     : {}", b.nonce()),
                format!(" Hash      : {}", b.hash()),
                format!(" Prev hash : {}", b.previous_hash()),
                format!(" Recomputed: {}", b.calculate_hash()),
            ],
        };
        if let Some(reason) = app.reports.get(app.cursor).and_then(|r| r.reason()) {
            items.push(format!(" Problem   : {reason}"));
        }
        let list = List::new(items).block(popup.clone());
        let popup_area = centered_area(area, 80, 50);
        // clears out any background in the area before rendering the popup
        f.render_widget(Clear, popup_area);
        f.render_widget(popup, popup_area);
        f.render_widget(list, popup_area);
    }
}

fn mining_line(app: &App) -> String {
    match (&app.job, app.mine_status) {
        (Some(job), _) => format!(
            "Mining... {} attempts, {}ms",
            job.control.attempts(),
            job.started.elapsed().as_millis()
        ),
        (None, MiningStatus::Mined { elapsed_ms, .. }) => format!("Mined in {elapsed_ms}ms"),
        _ => String::new(),
    }
}

fn render_mine(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let difficulty = app.chain.difficulty();
    let top = Paragraph::new(format!(
        "Difficulty: {difficulty} (hash starts with \"{}\")   ←/→ to adjust {MIN_UI_DIFFICULTY}-{MAX_UI_DIFFICULTY}",
        difficulty.target_prefix()
    ))
    .style(Style::default().fg(if app.is_mining() { p.secondary } else { p.text }))
    .block(Block::default().borders(Borders::ALL).title("Difficulty"));
    f.render_widget(top, chunks[0]);

    let placeholder = app.mine_data.is_empty();
    let data = Paragraph::new(if placeholder {
        "e.g. Alice pays Bob 10".to_string()
    } else {
        app.mine_data.clone()
    })
    .style(Style::default().fg(if placeholder { p.secondary } else { p.text }))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Block data (type, Backspace, Enter to mine)"),
    );
    f.render_widget(data, chunks[1]);

    let lines = vec![
        Line::from(mining_line(app)).style(Style::default().fg(p.accent)),
        Line::from(app.status.clone().unwrap_or_default()),
    ];
    let status =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[2]);
}

fn render_auto_mine(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let count = Paragraph::new(format!(
        "Blocks to mine: {}   (←/→ to adjust, Enter to start)",
        app.auto_count
    ))
    .block(Block::default().borders(Borders::ALL).title("Auto-mine"));
    f.render_widget(count, chunks[0]);

    let (done, total) = app
        .job
        .as_ref()
        .and_then(|j| j.progress)
        .unwrap_or((0, app.auto_count));
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(p.accent))
        .ratio(done as f64 / total.max(1) as f64)
        .label(format!("{done} / {total}"));
    f.render_widget(gauge, chunks[1]);

    let status = Paragraph::new(vec![
        Line::from(mining_line(app)),
        Line::from(app.status.clone().unwrap_or_default()),
    ])
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[2]);
}

fn render_tamper(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let block_lines = match app.chain.block(app.cursor as u64) {
        None => vec![Line::from("No block selected")],
        Some(b) => {
            let prev_ok = app
                .reports
                .get(app.cursor)
                .map_or(true, |r| !r.has(ValidationIssue::LinkMismatch));
            vec![
                Line::from(format!("Block #{}   (↑/↓ to choose)", b.index())),
                Line::from(format!("timestamp     : {}", b.timestamp())),
                Line::from(format!("data          : {}", b.data())),
                Line::from(vec![
                    Span::raw("previous hash : "),
                    Span::styled(
                        format!(
                            "{}{}",
                            truncate_hash(b.previous_hash()),
                            if prev_ok { "" } else { " (does not match)" }
                        ),
                        Style::default().fg(if prev_ok { p.success } else { p.error }),
                    ),
                ]),
                Line::from(format!("nonce         : {}", b.nonce())),
                Line::from(format!("hash          : {}", b.hash())),
                Line::from(format!("recomputed    : {}", b.calculate_hash())),
            ]
        }
    };
    let details = Paragraph::new(block_lines)
        .style(report_style(app.reports.get(app.cursor), p))
        .block(Block::default().borders(Borders::ALL).title("Selected block"));
    f.render_widget(details, chunks[0]);

    let editor = Paragraph::new(app.edit_buffer.clone()).block(
        Block::default().borders(Borders::ALL).title(format!(
            "Overwrite {} (←/→ field, Enter to apply, no re-mining)",
            app.edit_field.label()
        )),
    );
    f.render_widget(editor, chunks[1]);

    let reason = app
        .reports
        .get(app.cursor)
        .and_then(|r| r.reason())
        .unwrap_or_else(|| "Block is intact".into());
    let status = Paragraph::new(vec![
        Line::from(reason),
        Line::from(app.status.clone().unwrap_or_default()),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title("Validation"));
    f.render_widget(status, chunks[2]);
}

fn render_ledger(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let entries = app.chain.ledger();
    let items: Vec<ListItem> = if entries.is_empty() {
        vec![ListItem::new("No blocks mined yet").style(Style::default().fg(p.secondary))]
    } else {
        entries
            .into_iter()
            .map(|e| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("Block {}: ", e.index),
                        Style::default().fg(p.secondary),
                    ),
                    Span::styled(e.data, Style::default().fg(p.text)),
                ]))
            })
            .collect()
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Transaction Ledger"),
    );
    f.render_widget(list, area);
}

fn render_hashdemo(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(area);

    let input = Paragraph::new(app.hash_input.clone())
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Input"));
    f.render_widget(input, chunks[0]);

    let out = Paragraph::new(format!(
        "sha256: {}\nleading zero chars: {}",
        app.hash_output, app.hash_leading_zeros
    ))
    .style(Style::default().fg(p.accent))
    .block(Block::default().borders(Borders::ALL).title("Output"));
    f.render_widget(out, chunks[1]);

    let help = Paragraph::new(
        "Type to update the hash. Difficulty N needs N leading zero characters.",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, chunks[2]);
}

/// Create a centered rect using the given percentage of the available rect
fn centered_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let [area] = vertical.areas(area);

    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = horizontal.areas(area);

    area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_long_and_short_hashes() {
        assert_eq!(truncate_hash("0123456789abcdef"), "0123456789...");
        assert_eq!(truncate_hash("0"), "0");
        assert_eq!(truncate_hash("0123456789"), "0123456789");
    }

    #[test]
    fn codes_for_clean_and_broken_blocks() {
        let clean = BlockReport {
            index: 1,
            issues: vec![],
        };
        let broken = BlockReport {
            index: 2,
            issues: vec![ValidationIssue::HashMismatch, ValidationIssue::LinkMismatch],
        };
        assert_eq!(report_codes(Some(&clean)), "OK");
        assert_eq!(report_codes(Some(&broken)), "HASH_MISMATCH,LINK_MISMATCH");
    }
}
