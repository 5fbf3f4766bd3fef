//! Interactive viewer: application state, event loop, mouse hover/click.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Frame, Terminal};

use crate::config::{self, Config};
use crate::layout::TreeLayout;
use crate::taxonomy::hierarchy::{Hierarchy, ROOT};
use crate::taxonomy::model;
use crate::tui::input::{self, Action, Direction};
use crate::tui::render::{self, DiagramRenderData, Tooltip};
use crate::tui::scene::Scene;
use crate::tui::settings::{self, SettingsEvent, SettingsPanelState};

const NORMAL_DURATION: Duration = Duration::from_millis(250);
/// Slow-motion duration, selected with Alt at toggle time.
const SLOW_DURATION: Duration = Duration::from_millis(2500);

/// Poll timeout while a transition is live vs. idle.
const ANIMATING_POLL: Duration = Duration::from_millis(33);
const IDLE_POLL: Duration = Duration::from_millis(200);

#[derive(Debug)]
struct AppState {
    hierarchy: Hierarchy,
    scene: Scene,
    config: Config,
    config_path: Option<PathBuf>,
    focused: usize,
    hovered: Option<usize>,
    pointer: Option<(u16, u16)>,
    show_help: bool,
    show_settings: bool,
    settings_state: SettingsPanelState,
    status_message: Option<String>,
    /// Full terminal area from the last draw; mouse events hit-test
    /// against it.
    last_area: Rect,
    demo: bool,
}

impl AppState {
    fn load(file: Option<&Path>, demo: bool, open_settings: bool) -> Result<Self> {
        let record = if demo {
            model::parse(DEMO_TAXONOMY)?
        } else {
            let path = file.ok_or_else(|| anyhow::anyhow!("no taxonomy file given"))?;
            model::load(path)?
        };
        let hierarchy = Hierarchy::build(&record)?;

        let config_path = config::config_path(Path::new("."));
        let cfg = if !demo && config_path.exists() {
            config::parse(&fs::read_to_string(&config_path)?)?
        } else {
            Config::default()
        };

        let mut app = Self {
            hierarchy,
            scene: Scene::new(),
            config: cfg,
            config_path: (!demo).then_some(config_path),
            focused: ROOT,
            hovered: None,
            pointer: None,
            show_help: false,
            show_settings: open_settings,
            settings_state: SettingsPanelState::default(),
            status_message: demo.then(|| "demo taxonomy: settings are in-memory only".to_string()),
            last_area: Rect::default(),
            demo,
        };
        // first cycle: everything enters from the root's origin anchor
        let layout = app.layout();
        app.scene
            .advance(&mut app.hierarchy, &layout, ROOT, NORMAL_DURATION, Instant::now());
        Ok(app)
    }

    fn layout(&self) -> TreeLayout {
        TreeLayout::new(
            f64::from(self.config.leaf_spacing),
            f64::from(self.config.level_spacing),
        )
    }

    fn duration(&self, slow: bool) -> Duration {
        if slow || self.config.slow_motion {
            SLOW_DURATION
        } else {
            NORMAL_DURATION
        }
    }

    /// Toggle a node's subtree and run a render cycle anchored on it.
    fn toggle_node(&mut self, idx: usize, slow: bool) {
        let layout = self.layout();
        let duration = self.duration(slow);
        self.hierarchy.toggle(idx);
        self.scene
            .advance(&mut self.hierarchy, &layout, idx, duration, Instant::now());
        if !self.hierarchy.visible().contains(&self.focused) {
            self.focused = idx;
        }
        if let Some(hovered) = self.hovered {
            if !self.hierarchy.visible().contains(&hovered) {
                self.hovered = None;
            }
        }
    }

    /// Re-run the current cycle after a spacing change, anchored on focus.
    fn refresh_layout(&mut self) {
        let layout = self.layout();
        self.scene.advance(
            &mut self.hierarchy,
            &layout,
            self.focused,
            NORMAL_DURATION,
            Instant::now(),
        );
    }

    /// Visible nodes ordered along the sibling axis, for up/down movement.
    fn sibling_order(&self) -> Vec<usize> {
        let mut order = self.hierarchy.visible();
        order.sort_by(|&a, &b| {
            let na = &self.hierarchy.nodes[a];
            let nb = &self.hierarchy.nodes[b];
            na.x.partial_cmp(&nb.x)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(na.y.partial_cmp(&nb.y).unwrap_or(std::cmp::Ordering::Equal))
        });
        order
    }

    fn move_focus(&mut self, direction: Direction) {
        match direction {
            Direction::Up | Direction::Down => {
                let order = self.sibling_order();
                let Some(pos) = order.iter().position(|&idx| idx == self.focused) else {
                    return;
                };
                let next = match direction {
                    Direction::Up => pos.checked_sub(1),
                    _ => (pos + 1 < order.len()).then_some(pos + 1),
                };
                if let Some(next) = next {
                    self.focused = order[next];
                }
            }
            Direction::Left => {
                if let Some(parent) = self.hierarchy.nodes[self.focused].parent {
                    self.focused = parent;
                }
            }
            Direction::Right => {
                if let Some(children) = &self.hierarchy.nodes[self.focused].visible_children {
                    if let Some(&first) = children.first() {
                        self.focused = first;
                    }
                }
            }
        }
    }

    fn next_node(&mut self) {
        let order = self.hierarchy.visible();
        let pos = order
            .iter()
            .position(|&idx| idx == self.focused)
            .unwrap_or(0);
        self.focused = order[(pos + 1) % order.len()];
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.show_settings {
            match settings::handle_key(key, &mut self.settings_state, &mut self.config) {
                SettingsEvent::Changed => {
                    self.persist_config()?;
                    self.refresh_layout();
                }
                SettingsEvent::Close => self.show_settings = false,
                SettingsEvent::None => {}
            }
            return Ok(false);
        }
        if self.show_help {
            self.show_help = false;
            return Ok(false);
        }

        match input::action_for_key(key) {
            Action::Move(direction) => self.move_focus(direction),
            Action::Toggle { slow } => self.toggle_node(self.focused, slow),
            Action::NextNode => self.next_node(),
            Action::ToggleHelp => self.show_help = true,
            Action::OpenSettings => self.show_settings = true,
            Action::Quit => return Ok(true),
            Action::Noop => {}
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.show_settings || self.show_help {
            return;
        }
        match mouse.kind {
            MouseEventKind::Moved => {
                self.pointer = Some((mouse.column, mouse.row));
                self.hovered = self.hit(mouse.column, mouse.row);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(idx) = self.hit(mouse.column, mouse.row) {
                    self.focused = idx;
                    let slow = mouse
                        .modifiers
                        .contains(crossterm::event::KeyModifiers::ALT);
                    self.toggle_node(idx, slow);
                }
            }
            _ => {}
        }
    }

    fn hit(&mut self, column: u16, row: u16) -> Option<usize> {
        let frame = self.scene.frame(Instant::now());
        render::hit_test(
            &frame,
            &self.hierarchy,
            self.last_area,
            column,
            row,
            self.config.truncate_labels,
        )
    }

    fn mode_label(&self) -> &'static str {
        if self.show_settings {
            "Setup"
        } else if self.show_help {
            "Help"
        } else {
            "Tree"
        }
    }

    fn hints(&self) -> &'static str {
        if self.show_settings {
            "[j/k or arrows] select  [h/l or Enter] change  [Esc] close"
        } else {
            "[j/k/↑↓] move  [Enter] fold/unfold  [Alt+Enter] slow  [click/hover] mouse  [s] setup  [q] quit"
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.last_area = frame.area();
        let scene_frame = self.scene.frame(Instant::now());

        let tooltip = match (self.hovered, self.pointer) {
            (Some(node), Some((column, row)))
                if self.config.show_tooltip && !self.show_settings && !self.show_help =>
            {
                Some(Tooltip { node, column, row })
            }
            _ => None,
        };

        let data = DiagramRenderData {
            frame: &scene_frame,
            hierarchy: &self.hierarchy,
            focused: self.focused,
            hovered: self.hovered,
            tooltip,
            truncate_labels: self.config.truncate_labels,
            mode_label: self.mode_label(),
            hints: self.hints(),
            message: self.status_message.as_deref(),
            show_help: self.show_help,
        };
        render::draw(frame, &data);

        if self.show_settings {
            settings::draw(frame, &self.settings_state, &self.config);
        }
    }

    fn persist_config(&self) -> Result<()> {
        if self.demo {
            return Ok(());
        }
        if let Some(path) = &self.config_path {
            fs::write(path, config::serialize(&self.config))?;
        }
        Ok(())
    }
}

pub fn run(file: Option<&Path>, demo: bool, open_settings: bool) -> Result<()> {
    let mut app = AppState::load(file, demo, open_settings)?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        terminal.draw(|f| app.draw(f))?;
        let timeout = if app.scene.is_animating(Instant::now()) {
            ANIMATING_POLL
        } else {
            IDLE_POLL
        };
        if !event::poll(timeout)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if matches!(key.kind, KeyEventKind::Release | KeyEventKind::Repeat) {
                    continue;
                }
                if app.handle_key(key)? {
                    break;
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            _ => {}
        }
    }
    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
    }
}

/// Built-in sample for `--demo`: a small slice of a lung-tumour
/// classification, enough to exercise truncation and the NSCLC flag.
const DEMO_TAXONOMY: &str = r#"{
    "id": "C34",
    "name": "Malignant neoplasm of bronchus and lung",
    "attr": {"class": "site", "topography_code": "C34"},
    "children": [
        {
            "id": "8046/3",
            "name": "Non-small cell carcinoma",
            "attr": {"class": "morphology", "morphology_code": "8046/3", "topography_code": "C34", "NSCLC": true},
            "children": [
                {
                    "id": "8140/3",
                    "name": "Adenocarcinoma, NOS",
                    "attr": {"class": "morphology", "morphology_code": "8140/3", "topography_code": "C34", "NSCLC": true},
                    "children": [
                        {
                            "id": "8551/3",
                            "name": "Acinar adenocarcinoma, predominantly mucinous",
                            "attr": {"class": "morphology", "morphology_code": "8551/3", "topography_code": "C34", "NSCLC": true}
                        },
                        {
                            "id": "8265/3",
                            "name": "Micropapillary adenocarcinoma",
                            "attr": {"class": "morphology", "morphology_code": "8265/3", "topography_code": "C34", "NSCLC": true}
                        }
                    ]
                },
                {
                    "id": "8070/3",
                    "name": "Squamous cell carcinoma, NOS",
                    "attr": {"class": "morphology", "morphology_code": "8070/3", "topography_code": "C34", "NSCLC": true}
                },
                {
                    "id": "8012/3",
                    "name": "Large cell carcinoma, NOS",
                    "attr": {"class": "morphology", "morphology_code": "8012/3", "topography_code": "C34", "NSCLC": true}
                }
            ]
        },
        {
            "id": "8041/3",
            "name": "Small cell carcinoma, NOS",
            "attr": {"class": "morphology", "morphology_code": "8041/3", "topography_code": "C34"}
        },
        {
            "id": "carcinoid",
            "name": "Carcinoid tumours",
            "attr": {"class": "group"},
            "children": [
                {
                    "id": "8240/3",
                    "name": "Carcinoid tumour, NOS",
                    "attr": {"class": "morphology", "morphology_code": "8240/3", "topography_code": "C34"}
                }
            ]
        }
    ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_app() -> AppState {
        let mut app = AppState::load(None, true, false).unwrap();
        app.last_area = Rect::new(0, 0, 120, 40);
        app
    }

    fn index_of(app: &AppState, id: &str) -> usize {
        app.hierarchy
            .nodes
            .iter()
            .position(|n| n.id == id)
            .expect("node must exist in demo taxonomy")
    }

    fn moved(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Moved,
            column,
            row,
            modifiers: crossterm::event::KeyModifiers::NONE,
        }
    }

    #[test]
    fn demo_taxonomy_loads_with_unique_ids() {
        let app = demo_app();
        assert!(app.hierarchy.len() >= 10);
    }

    #[test]
    fn collapsing_moves_focus_out_of_the_hidden_subtree() {
        let mut app = demo_app();
        let nsclc = index_of(&app, "8046/3");
        let leaf = index_of(&app, "8551/3");
        app.focused = leaf;

        app.toggle_node(nsclc, false);
        assert_eq!(app.focused, nsclc, "focus falls back to the toggled node");
        assert!(app.hierarchy.visible().contains(&app.focused));
    }

    #[test]
    fn collapsing_clears_a_hover_inside_the_hidden_subtree() {
        let mut app = demo_app();
        let nsclc = index_of(&app, "8046/3");
        app.hovered = Some(index_of(&app, "8140/3"));
        app.toggle_node(nsclc, false);
        assert_eq!(app.hovered, None);
    }

    #[test]
    fn alt_or_config_selects_slow_motion() {
        let mut app = demo_app();
        assert_eq!(app.duration(false), NORMAL_DURATION);
        assert_eq!(app.duration(true), SLOW_DURATION);
        app.config.slow_motion = true;
        assert_eq!(app.duration(false), SLOW_DURATION);
    }

    #[test]
    fn hover_enter_move_leave_round_trip() {
        let mut app = demo_app();
        // settle the entering animation so sprites sit at rest positions
        let layout = app.layout();
        app.scene
            .advance(&mut app.hierarchy, &layout, ROOT, Duration::ZERO, Instant::now());

        // find a cell that actually hits the root node
        let frame = app.scene.frame(Instant::now());
        let bounds = render::world_bounds(&frame);
        let area = render::diagram_rect(app.last_area);
        let root_sprite = frame.nodes.iter().find(|s| s.idx == ROOT).unwrap();
        let (col, row) = render::node_cell(root_sprite, bounds, area).unwrap();

        app.handle_mouse(moved(col, row));
        assert_eq!(app.hovered, Some(ROOT), "enter");
        app.handle_mouse(moved(col + 1, row));
        assert_eq!(app.hovered, Some(ROOT), "move stays on the label span");
        app.handle_mouse(moved(0, 0));
        assert_eq!(app.hovered, None, "leave restores the default state");
    }

    #[test]
    fn focus_navigation_stays_within_visible_nodes() {
        let mut app = demo_app();
        for _ in 0..50 {
            app.move_focus(Direction::Down);
        }
        assert!(app.hierarchy.visible().contains(&app.focused));
        for _ in 0..50 {
            app.next_node();
        }
        assert!(app.hierarchy.visible().contains(&app.focused));
    }

    #[test]
    fn settings_change_persists_nothing_in_demo_mode() {
        let app = demo_app();
        assert!(app.config_path.is_none());
        assert!(app.persist_config().is_ok());
    }
}
