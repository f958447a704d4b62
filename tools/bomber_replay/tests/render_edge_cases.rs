use bomber_replay::errors::Location;
use bomber_replay::replay::scene::{Agent, AgentState, Board, Bomb};
use bomber_replay::tui::{render_scene, SceneView};
use bomber_replay::types::{Direction, Position};

fn agent(id: usize, row: usize, col: usize, is_alive: bool) -> Agent {
    Agent::new(
        id,
        Position::new(row, col),
        AgentState {
            ammo: 1,
            is_alive,
            blast_strength: 2,
            can_kick: true,
        },
    )
}

fn board(rows: usize, cols: usize) -> Board {
    Board::from_rows(&vec![vec![1; cols]; rows], Location::default()).expect("board")
}

#[test]
fn zero_sized_frame_is_empty() {
    let frame = render_scene(
        &SceneView {
            step: 0,
            board: &board(2, 2),
            agents: &[],
            bombs: &[],
        },
        0,
        0,
    )
    .expect("render");
    assert!(frame.is_empty());
}

#[test]
fn one_by_one_frame_does_not_panic() {
    let frame = render_scene(
        &SceneView {
            step: 3,
            board: &board(2, 2),
            agents: &[agent(0, 0, 0, true)],
            bombs: &[],
        },
        1,
        1,
    )
    .expect("render");
    assert_eq!(frame.lines().count(), 1);
}

#[test]
fn board_larger_than_the_frame_is_clipped() {
    let frame = render_scene(
        &SceneView {
            step: 99,
            board: &board(11, 11),
            agents: &[agent(0, 0, 0, true)],
            bombs: &[],
        },
        24,
        8,
    )
    .expect("render");
    assert_eq!(frame.lines().count(), 8);
    assert!(frame.lines().all(|line| line.chars().count() == 24));
}

#[test]
fn empty_board_still_shows_the_summary() {
    let empty = Board::from_rows(&[], Location::default()).expect("empty board");
    let frame = render_scene(
        &SceneView {
            step: 1,
            board: &empty,
            agents: &[],
            bombs: &[],
        },
        60,
        8,
    )
    .expect("render");
    assert!(frame.contains("board=0x0 alive=0/0 bombs=0"));
}

#[test]
fn dead_agents_and_moving_bombs_are_listed() {
    let agents = [agent(0, 1, 1, true), agent(1, 2, 2, false)];
    let bombs = [Bomb::new(
        &agents[0],
        Position::new(1, 2),
        3,
        4,
        Some(Direction::Left),
    )];
    let frame = render_scene(
        &SceneView {
            step: 5,
            board: &board(4, 4),
            agents: &agents,
            bombs: &bombs,
        },
        100,
        12,
    )
    .expect("render");
    assert!(frame.contains("alive=1/2"));
    assert!(frame.contains("agent 1 (2, 2) ammo=1 blast=2 kick=true dead"));
    assert!(frame.contains("bomb (1, 2) owner=0 life=3 blast=4"));
}
