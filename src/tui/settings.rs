use crossterm::event::{KeyCode, KeyEvent};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};
use ratatui::Frame;

use crate::config::Config;
use crate::tui::render::centered_rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    None,
    Changed,
    Close,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPanelState {
    pub selected_row: usize,
}

const SETTINGS_ROW_COUNT: usize = 5;

const SPACING_MIN: u16 = 1;
const LEAF_SPACING_MAX: u16 = 10;
const LEVEL_SPACING_MAX: u16 = 48;

pub fn handle_key(
    key: KeyEvent,
    state: &mut SettingsPanelState,
    config: &mut Config,
) -> SettingsEvent {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') | KeyCode::Char('s') => {
            SettingsEvent::Close
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected_row = state.selected_row.saturating_sub(1);
            SettingsEvent::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected_row = (state.selected_row + 1).min(SETTINGS_ROW_COUNT - 1);
            SettingsEvent::None
        }
        KeyCode::Left | KeyCode::Char('h') => adjust(config, state.selected_row, -1),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
            adjust(config, state.selected_row, 1)
        }
        _ => SettingsEvent::None,
    }
}

fn adjust(config: &mut Config, row: usize, delta: i32) -> SettingsEvent {
    match row {
        0 => config.slow_motion = !config.slow_motion,
        1 => config.show_tooltip = !config.show_tooltip,
        2 => config.truncate_labels = !config.truncate_labels,
        3 => {
            config.leaf_spacing = step(config.leaf_spacing, delta, SPACING_MIN, LEAF_SPACING_MAX)
        }
        4 => {
            config.level_spacing =
                step(config.level_spacing, delta, SPACING_MIN, LEVEL_SPACING_MAX)
        }
        _ => return SettingsEvent::None,
    }
    SettingsEvent::Changed
}

fn step(value: u16, delta: i32, min: u16, max: u16) -> u16 {
    let next = i32::from(value) + delta;
    next.clamp(i32::from(min), i32::from(max)) as u16
}

pub fn draw(frame: &mut Frame, state: &SettingsPanelState, config: &Config) {
    let area = centered_rect(frame.area(), 54, 48);
    frame.render_widget(Clear, area);

    let title = Line::from(vec![
        Span::styled(
            "Setup",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("[Esc] close", Style::default().fg(Color::Gray)),
    ]);

    let selected = state.selected_row.min(SETTINGS_ROW_COUNT - 1);
    let lines = vec![
        bool_row(selected == 0, "slow-motion animations", config.slow_motion),
        bool_row(selected == 1, "hover tooltip", config.show_tooltip),
        bool_row(selected == 2, "truncate long labels", config.truncate_labels),
        value_row(selected == 3, "leaf spacing", config.leaf_spacing),
        value_row(selected == 4, "level spacing", config.level_spacing),
        Line::from(""),
        Line::from(Span::styled(
            "Use arrows/hjkl; Enter/Space toggles, ←/→ adjusts.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Changes write to taxtree.conf immediately.",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .padding(Padding::new(1, 1, 1, 0)),
    );
    frame.render_widget(panel, area);
}

fn bool_row(selected: bool, label: &str, value: bool) -> Line<'static> {
    row(selected, label, if value { "on" } else { "off" }.to_string())
}

fn value_row(selected: bool, label: &str, value: u16) -> Line<'static> {
    row(selected, label, format!("◂ {value} ▸"))
}

fn row(selected: bool, label: &str, value: String) -> Line<'static> {
    let marker = if selected { "▸ " } else { "  " };
    let style = if selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{marker}{label:<24}"), style),
        Span::styled(value, style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn toggling_a_bool_row_reports_changed() {
        let mut state = SettingsPanelState::default();
        let mut config = Config::default();
        let event = handle_key(key(KeyCode::Enter), &mut state, &mut config);
        assert_eq!(event, SettingsEvent::Changed);
        assert!(config.slow_motion);
    }

    #[test]
    fn selection_clamps_to_the_row_count() {
        let mut state = SettingsPanelState::default();
        let mut config = Config::default();
        for _ in 0..20 {
            handle_key(key(KeyCode::Down), &mut state, &mut config);
        }
        assert_eq!(state.selected_row, SETTINGS_ROW_COUNT - 1);
        for _ in 0..20 {
            handle_key(key(KeyCode::Up), &mut state, &mut config);
        }
        assert_eq!(state.selected_row, 0);
    }

    #[test]
    fn spacing_rows_step_and_clamp() {
        let mut state = SettingsPanelState {
            selected_row: 3,
        };
        let mut config = Config::default();
        let before = config.leaf_spacing;
        handle_key(key(KeyCode::Right), &mut state, &mut config);
        assert_eq!(config.leaf_spacing, before + 1);
        for _ in 0..50 {
            handle_key(key(KeyCode::Left), &mut state, &mut config);
        }
        assert_eq!(config.leaf_spacing, SPACING_MIN);
        for _ in 0..50 {
            handle_key(key(KeyCode::Right), &mut state, &mut config);
        }
        assert_eq!(config.leaf_spacing, LEAF_SPACING_MAX);
    }

    #[test]
    fn escape_closes_the_panel() {
        let mut state = SettingsPanelState::default();
        let mut config = Config::default();
        assert_eq!(
            handle_key(key(KeyCode::Esc), &mut state, &mut config),
            SettingsEvent::Close
        );
    }
}
