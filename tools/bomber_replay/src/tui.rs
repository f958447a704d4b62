use crate::errors::ReplayError;
use crate::observer::Observer;
use crate::replay::scene::{Agent, Board, Bomb};
use crate::runtime::{Clock, Terminal};
use ratatui::backend::TestBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use std::time::Duration;

/// Cell codes as recorded by the game.
pub fn cell_glyph(code: u8) -> char {
    match code {
        0 => '.',
        1 => '#',
        2 => '+',
        3 => 'o',
        4 => '*',
        5 => '~',
        6 => 'b',
        7 => 'r',
        8 => 'k',
        10..=13 => char::from(b'0' + (code - 10)),
        _ => '?',
    }
}

fn cell_style(code: u8) -> Style {
    match code {
        1 => Style::default().fg(Color::DarkGray),
        2 => Style::default().fg(Color::Yellow),
        3 => Style::default().fg(Color::Red),
        4 => Style::default().fg(Color::LightRed),
        6..=8 => Style::default().fg(Color::Green),
        10..=13 => Style::default().fg(Color::Cyan),
        _ => Style::default(),
    }
}

pub struct SceneView<'a> {
    pub step: usize,
    pub board: &'a Board,
    pub agents: &'a [Agent],
    pub bombs: &'a [Bomb],
}

fn draw_scene(
    terminal: &mut ratatui::Terminal<TestBackend>,
    view: &SceneView<'_>,
) -> Result<String, ReplayError> {
    terminal
        .draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(5)])
                .split(frame.area());
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[1]);

            let (rows, cols) = view.board.shape();
            let alive = view.agents.iter().filter(|a| a.state.is_alive).count();
            let summary = Paragraph::new(format!(
                "step={} board={rows}x{cols} alive={alive}/{} bombs={}",
                view.step,
                view.agents.len(),
                view.bombs.len()
            ))
            .block(Block::default().borders(Borders::ALL).title("Replay"));
            frame.render_widget(summary, chunks[0]);

            let board_lines = view
                .board
                .rows()
                .map(|row| {
                    Line::from(
                        row.iter()
                            .map(|code| {
                                Span::styled(format!("{} ", cell_glyph(*code)), cell_style(*code))
                            })
                            .collect::<Vec<_>>(),
                    )
                })
                .collect::<Vec<_>>();
            frame.render_widget(
                Paragraph::new(board_lines)
                    .block(Block::default().borders(Borders::ALL).title("Board")),
                body[0],
            );

            let mut entities = view
                .agents
                .iter()
                .map(|agent| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("agent {}", agent.id),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::raw(format!(
                            " {} ammo={} blast={} kick={} {}",
                            agent.position,
                            agent.state.ammo,
                            agent.state.blast_strength,
                            agent.state.can_kick,
                            if agent.state.is_alive { "alive" } else { "dead" }
                        )),
                    ]))
                })
                .collect::<Vec<_>>();
            entities.extend(view.bombs.iter().map(|bomb| {
                ListItem::new(Line::from(vec![
                    Span::styled("bomb", Style::default().fg(Color::Red)),
                    Span::raw(format!(
                        " {} owner={} life={} blast={}",
                        bomb.position, bomb.owner, bomb.life, bomb.blast_strength
                    )),
                ]))
            }));
            frame.render_widget(
                List::new(entities).block(Block::default().borders(Borders::ALL).title("Entities")),
                body[1],
            );
        })
        .map_err(|e| ReplayError::Io(e.to_string()))?;

    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    let mut out = String::new();
    for y in 0..area.height {
        for x in 0..area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    Ok(out)
}

/// Renders one frame of a scene into a `width` x `height` text grid.
pub fn render_scene(view: &SceneView<'_>, width: u16, height: u16) -> Result<String, ReplayError> {
    let mut terminal = ratatui::Terminal::new(TestBackend::new(width, height))
        .map_err(|e| ReplayError::Io(e.to_string()))?;
    draw_scene(&mut terminal, view)
}

/// Draws every simulated scene to a [`Terminal`], pausing `pace` after each
/// frame. The off-screen viewer is created at the first frame and dropped
/// with the renderer.
pub struct TerminalRenderer<'a> {
    terminal: &'a dyn Terminal,
    clock: &'a dyn Clock,
    pace: Duration,
    width: u16,
    height: u16,
    viewer: Option<ratatui::Terminal<TestBackend>>,
    bombs: Vec<Bomb>,
}

impl<'a> TerminalRenderer<'a> {
    pub fn new(
        terminal: &'a dyn Terminal,
        clock: &'a dyn Clock,
        pace: Duration,
        width: u16,
        height: u16,
    ) -> Self {
        Self {
            terminal,
            clock,
            pace,
            width,
            height,
            viewer: None,
            bombs: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.viewer.is_some()
    }
}

impl Observer for TerminalRenderer<'_> {
    fn show_bombs(&mut self, bombs: &[Bomb]) -> Result<(), ReplayError> {
        self.bombs = bombs.to_vec();
        Ok(())
    }

    fn show(&mut self, step: usize, board: &Board, agents: &[Agent]) -> Result<(), ReplayError> {
        let viewer = match self.viewer.as_mut() {
            Some(viewer) => viewer,
            None => self.viewer.insert(
                ratatui::Terminal::new(TestBackend::new(self.width, self.height))
                    .map_err(|e| ReplayError::Io(e.to_string()))?,
            ),
        };
        let frame = draw_scene(
            viewer,
            &SceneView {
                step,
                board,
                agents,
                bombs: &self.bombs,
            },
        )?;
        self.terminal.draw(&frame)?;
        if !self.pace.is_zero() {
            self.clock.sleep_until(self.clock.now() + self.pace)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{cell_glyph, render_scene, SceneView, TerminalRenderer};
    use crate::errors::Location;
    use crate::observer::Observer;
    use crate::replay::scene::{Agent, AgentState, Board, Bomb};
    use crate::runtime::{FakeClock, FakeTerminal};
    use crate::types::Position;
    use std::time::{Duration, SystemTime};

    fn agent() -> Agent {
        Agent::new(
            0,
            Position::new(0, 1),
            AgentState {
                ammo: 1,
                is_alive: true,
                blast_strength: 2,
                can_kick: false,
            },
        )
    }

    fn board() -> Board {
        Board::from_rows(&[vec![1, 10, 0], vec![2, 3, 6]], Location::default()).expect("board")
    }

    #[test]
    fn glyphs_cover_walls_agents_and_unknown_codes() {
        assert_eq!(cell_glyph(0), '.');
        assert_eq!(cell_glyph(1), '#');
        assert_eq!(cell_glyph(11), '1');
        assert_eq!(cell_glyph(13), '3');
        assert_eq!(cell_glyph(200), '?');
    }

    #[test]
    fn frame_shows_step_board_and_entities() {
        let agents = [agent()];
        let bombs = [Bomb::new(&agents[0], Position::new(1, 1), 9, 2, None)];
        let frame = render_scene(
            &SceneView {
                step: 7,
                board: &board(),
                agents: &agents,
                bombs: &bombs,
            },
            80,
            12,
        )
        .expect("render");
        assert!(frame.contains("Replay"));
        assert!(frame.contains("step=7 board=2x3 alive=1/1 bombs=1"));
        assert!(frame.contains("# 0 ."));
        assert!(frame.contains("agent 0"));
        assert!(frame.contains("bomb (1, 1) owner=0 life=9"));
    }

    #[test]
    fn renderer_opens_lazily_and_paces_through_the_clock() {
        let terminal = FakeTerminal::new(false);
        let clock = FakeClock::default();
        let mut renderer =
            TerminalRenderer::new(&terminal, &clock, Duration::from_millis(100), 80, 12);
        assert!(!renderer.is_open());

        let agents = [agent()];
        renderer
            .show_bombs(&[Bomb::new(&agents[0], Position::new(1, 1), 4, 2, None)])
            .expect("bombs");
        renderer.show(0, &board(), &agents).expect("show");
        renderer.show(1, &board(), &agents).expect("show");

        assert!(renderer.is_open());
        let frames = terminal.drawn_frames();
        assert_eq!(frames.len(), 2);
        assert!(frames[1].contains("step=1"));
        assert!(frames[1].contains("bomb (1, 1) owner=0 life=4"));
        assert_eq!(
            clock.sleeps(),
            vec![
                SystemTime::UNIX_EPOCH + Duration::from_millis(100),
                SystemTime::UNIX_EPOCH + Duration::from_millis(200),
            ]
        );
    }

    #[test]
    fn zero_pace_never_sleeps() {
        let terminal = FakeTerminal::new(false);
        let clock = FakeClock::default();
        let mut renderer = TerminalRenderer::new(&terminal, &clock, Duration::ZERO, 60, 10);
        renderer.show(0, &board(), &[agent()]).expect("show");
        assert!(clock.sleeps().is_empty());
        assert_eq!(terminal.drawn_frames().len(), 1);
    }
}
