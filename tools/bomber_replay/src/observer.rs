//! Display sinks fed by the replay loop.
//!
//! Observers never influence the replay: the loop calls them in a fixed
//! order and only propagates their I/O errors.

use crate::errors::ReplayError;
use crate::logging::{JsonlLogger, LogEvent};
use crate::replay::scene::{Agent, Board, Bomb};
use crate::runtime::Terminal;
use crate::types::ActionVector;
use serde_json::json;

/// Per step the loop calls `on_step_start`, runs the forward model, then
/// `show_bombs` followed by `show` with the simulated scene. `on_finish`
/// runs once after the last step of a run that did not diverge.
pub trait Observer {
    fn on_step_start(
        &mut self,
        _step: usize,
        _actions: &ActionVector,
        _board: &Board,
    ) -> Result<(), ReplayError> {
        Ok(())
    }

    /// Sinks that can draw bombs override this; the rest ignore them.
    fn show_bombs(&mut self, _bombs: &[Bomb]) -> Result<(), ReplayError> {
        Ok(())
    }

    fn show(&mut self, step: usize, board: &Board, agents: &[Agent]) -> Result<(), ReplayError>;

    fn on_finish(&mut self, _last_step: usize, _board: &Board) -> Result<(), ReplayError> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn show(&mut self, _: usize, _: &Board, _: &[Agent]) -> Result<(), ReplayError> {
        Ok(())
    }
}

/// Prints the step, its actions and the board it starts from.
pub struct VerbosePrinter<'a> {
    terminal: &'a dyn Terminal,
}

impl<'a> VerbosePrinter<'a> {
    pub fn new(terminal: &'a dyn Terminal) -> Self {
        Self { terminal }
    }

    fn print_board(&self, board: &Board) -> Result<(), ReplayError> {
        for line in board.to_string().lines() {
            self.terminal.write_line(line)?;
        }
        Ok(())
    }
}

impl Observer for VerbosePrinter<'_> {
    fn on_step_start(
        &mut self,
        step: usize,
        actions: &ActionVector,
        board: &Board,
    ) -> Result<(), ReplayError> {
        self.terminal
            .write_line(&format!("Step: {step} Action: {:?}", actions.codes()))?;
        self.print_board(board)
    }

    fn show(&mut self, _: usize, _: &Board, _: &[Agent]) -> Result<(), ReplayError> {
        Ok(())
    }

    fn on_finish(&mut self, last_step: usize, board: &Board) -> Result<(), ReplayError> {
        self.terminal.write_line(&format!("Step: {last_step}"))?;
        self.print_board(board)
    }
}

/// Appends a `step` event per transition to the run log.
pub struct StepLog<'a> {
    logger: &'a JsonlLogger,
}

impl<'a> StepLog<'a> {
    pub fn new(logger: &'a JsonlLogger) -> Self {
        Self { logger }
    }
}

impl Observer for StepLog<'_> {
    fn on_step_start(
        &mut self,
        step: usize,
        actions: &ActionVector,
        _: &Board,
    ) -> Result<(), ReplayError> {
        self.logger.append(&LogEvent::info(
            "step",
            json!({
                "step": step,
                "actions": actions.0.iter().map(|action| action.as_str()).collect::<Vec<_>>(),
            }),
        ))
    }

    fn show(&mut self, step: usize, board: &Board, agents: &[Agent]) -> Result<(), ReplayError> {
        let (rows, cols) = board.shape();
        self.logger.append(&LogEvent::info(
            "step_simulated",
            json!({
                "step": step,
                "board": [rows, cols],
                "alive": agents.iter().filter(|agent| agent.state.is_alive).count(),
            }),
        ))
    }
}

/// Forwards every call to each observer in order.
#[derive(Default)]
pub struct Observers<'a> {
    sinks: Vec<Box<dyn Observer + 'a>>,
}

impl<'a> Observers<'a> {
    pub fn push(&mut self, observer: impl Observer + 'a) {
        self.sinks.push(Box::new(observer));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Observer for Observers<'_> {
    fn on_step_start(
        &mut self,
        step: usize,
        actions: &ActionVector,
        board: &Board,
    ) -> Result<(), ReplayError> {
        self.sinks
            .iter_mut()
            .try_for_each(|sink| sink.on_step_start(step, actions, board))
    }

    fn show_bombs(&mut self, bombs: &[Bomb]) -> Result<(), ReplayError> {
        self.sinks
            .iter_mut()
            .try_for_each(|sink| sink.show_bombs(bombs))
    }

    fn show(&mut self, step: usize, board: &Board, agents: &[Agent]) -> Result<(), ReplayError> {
        self.sinks
            .iter_mut()
            .try_for_each(|sink| sink.show(step, board, agents))
    }

    fn on_finish(&mut self, last_step: usize, board: &Board) -> Result<(), ReplayError> {
        self.sinks
            .iter_mut()
            .try_for_each(|sink| sink.on_finish(last_step, board))
    }
}

#[cfg(test)]
mod tests {
    use super::{Observer, Observers, StepLog, VerbosePrinter};
    use crate::errors::Location;
    use crate::logging::JsonlLogger;
    use crate::replay::scene::Board;
    use crate::runtime::FakeTerminal;
    use crate::types::ActionVector;
    use serde_json::json;

    #[test]
    fn verbose_printer_writes_step_actions_and_board() {
        let terminal = FakeTerminal::new(false);
        let board = Board::from_rows(&[vec![0, 1], vec![10, 2]], Location::default()).expect("board");
        let actions: ActionVector = serde_json::from_value(json!([1, 5])).expect("actions");

        let mut observers = Observers::default();
        observers.push(VerbosePrinter::new(&terminal));
        assert_eq!(observers.len(), 1);
        observers.on_step_start(0, &actions, &board).expect("start");
        observers.show(0, &board, &[]).expect("show");
        observers.on_finish(1, &board).expect("finish");

        assert_eq!(
            terminal.written_lines(),
            vec![
                "Step: 0 Action: [1, 5]".to_string(),
                "[ 0  1]".to_string(),
                "[10  2]".to_string(),
                "Step: 1".to_string(),
                "[ 0  1]".to_string(),
                "[10  2]".to_string(),
            ]
        );
    }

    #[test]
    fn step_log_appends_one_event_per_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let logger = JsonlLogger::new(dir.path().join("run.jsonl"));
        let board = Board::from_rows(&[vec![0, 0]], Location::default()).expect("board");
        let actions: ActionVector = serde_json::from_value(json!([0, 4])).expect("actions");

        let mut log = StepLog::new(&logger);
        log.on_step_start(2, &actions, &board).expect("start");
        log.show(2, &board, &[]).expect("show");

        let text = std::fs::read_to_string(&logger.path).expect("read");
        let events = text
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).expect("json"))
            .collect::<Vec<_>>();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event_type"], json!("step"));
        assert_eq!(events[0]["payload"]["actions"], json!(["stop", "right"]));
        assert_eq!(events[1]["payload"]["board"], json!([1, 2]));
    }
}
