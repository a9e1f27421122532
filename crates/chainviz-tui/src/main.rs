//! Terminal visualizer for the toy proof-of-work chain.
mod app;
mod theme;
mod ui;

use std::{io, time::Duration};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event as CEvent, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, prelude::Backend, Terminal};
use tracing_subscriber::{fmt, EnvFilter};

use app::{App, Tab};
use theme::Theme;

#[derive(Parser, Debug, Clone)]
struct Args {
    /// Leading zero hex characters each mined block needs (1-4)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=4))]
    difficulty: u32,

    /// Colour theme
    #[arg(long, value_enum, default_value_t = Theme::Dark)]
    theme: Theme,
}

#[tokio::main]
async fn main() -> Result<()> {
    // tracing
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut app = App::new(args)?;

    // terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    // restore
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.cancel_mining();
    res
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if crossterm::event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if handle_key(app, key).await? {
                    break;
                }
            }
        }

        app.poll_mining().await;
        app.tick();
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<bool> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => return Ok(true),
        KeyCode::Esc => return Ok(true),
        KeyCode::Char('t') if ctrl => app.theme = app.theme.toggled(),
        KeyCode::Char('r') if ctrl => app.reset(),
        KeyCode::Char('x') if ctrl => app.cancel_mining(),
        KeyCode::Tab => app.tab = app.tab.next(),
        KeyCode::BackTab => app.tab = app.tab.previous(),
        _ => match app.tab {
            Tab::Chain => match key.code {
                KeyCode::Down => app.select(true),
                KeyCode::Up => app.select(false),
                KeyCode::Char('p') => app.popup = !app.popup,
                _ => {}
            },
            Tab::Mine => match key.code {
                KeyCode::Left => app.step_difficulty(false),
                KeyCode::Right => app.step_difficulty(true),
                KeyCode::Char(c) if !c.is_control() && !app.is_mining() => app.mine_data.push(c),
                KeyCode::Backspace => {
                    app.mine_data.pop();
                }
                KeyCode::Enter => app.start_mining(),
                _ => {}
            },
            Tab::AutoMine => match key.code {
                KeyCode::Left | KeyCode::Down => app.step_auto_count(false),
                KeyCode::Right | KeyCode::Up => app.step_auto_count(true),
                KeyCode::Enter => app.start_auto_mine(),
                _ => {}
            },
            Tab::Tamper => match key.code {
                KeyCode::Down => app.select(true),
                KeyCode::Up => app.select(false),
                KeyCode::Left => app.step_edit_field(false),
                KeyCode::Right => app.step_edit_field(true),
                KeyCode::Char(c) if !c.is_control() => app.edit_buffer.push(c),
                KeyCode::Backspace => {
                    app.edit_buffer.pop();
                }
                KeyCode::Enter => app.apply_edit(),
                _ => {}
            },
            Tab::Ledger => {}
            Tab::HashDemo => match key.code {
                KeyCode::Char(c) if !c.is_control() => {
                    app.hash_input.push(c);
                    app.update_hash_demo();
                }
                KeyCode::Backspace => {
                    app.hash_input.pop();
                    app.update_hash_demo();
                }
                _ => {}
            },
        },
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            kind: event::KeyEventKind::Press,
            state: event::KeyEventState::NONE,
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..press(KeyCode::Char(c))
        }
    }

    fn new_app() -> App {
        App::new(Args {
            difficulty: 1,
            theme: Theme::Dark,
        })
        .unwrap()
    }

    async fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            handle_key(app, press(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_tab_transitions_via_handle_key() {
        let mut app = new_app();
        assert_eq!(app.tab, Tab::Chain);

        let _ = handle_key(&mut app, press(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.tab, Tab::Mine);

        let _ = handle_key(&mut app, press(KeyCode::BackTab)).await.unwrap();
        assert_eq!(app.tab, Tab::Chain);

        let _ = handle_key(&mut app, press(KeyCode::BackTab)).await.unwrap();
        assert_eq!(app.tab, Tab::HashDemo);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = new_app();
        assert!(handle_key(&mut app, press(KeyCode::Esc)).await.unwrap());
        assert!(handle_key(&mut app, ctrl('c')).await.unwrap());
        assert!(!handle_key(&mut app, press(KeyCode::Char('c'))).await.unwrap());
    }

    #[tokio::test]
    async fn test_theme_toggle() {
        let mut app = new_app();
        handle_key(&mut app, ctrl('t')).await.unwrap();
        assert_eq!(app.theme, Theme::Light);
        handle_key(&mut app, ctrl('t')).await.unwrap();
        assert_eq!(app.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_mine_via_keys() {
        let mut app = new_app();
        app.tab = Tab::Mine;
        handle_key(&mut app, press(KeyCode::Right)).await.unwrap();
        assert_eq!(app.chain.difficulty().get(), 2);
        handle_key(&mut app, press(KeyCode::Left)).await.unwrap();

        type_str(&mut app, "Alice pays Bob 10").await;
        assert_eq!(app.mine_data, "Alice pays Bob 10");
        handle_key(&mut app, press(KeyCode::Enter)).await.unwrap();
        assert!(app.is_mining());

        while app.is_mining() {
            app.poll_mining().await;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(app.chain.len(), 2);
        assert!(app.chain.latest_block().hash().starts_with('0'));

        handle_key(&mut app, ctrl('r')).await.unwrap();
        assert_eq!(app.chain.len(), 1);
    }

    #[tokio::test]
    async fn test_tamper_via_keys() {
        let mut app = new_app();
        app.chain.append_block("original");
        app.refresh_validation();
        app.tab = Tab::Tamper;

        handle_key(&mut app, press(KeyCode::Down)).await.unwrap();
        for _ in 0.."original".len() {
            handle_key(&mut app, press(KeyCode::Backspace)).await.unwrap();
        }
        type_str(&mut app, "forged").await;
        handle_key(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.chain.latest_block().data(), "forged");
        assert!(!app.is_valid());
    }

    #[tokio::test]
    async fn test_update_hash_demo_via_keys() {
        let mut app = new_app();
        app.tab = Tab::HashDemo;
        type_str(&mut app, "abc").await;
        assert_eq!(
            app.hash_output,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(app.hash_leading_zeros, 0);
    }
}
