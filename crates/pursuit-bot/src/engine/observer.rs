use pursuit_core::game::{BoardSnapshot, RunReport};

/// Read-only consumer of per-sub-turn board state.
pub trait TurnObserver {
    fn on_sub_turn(&mut self, snapshot: &BoardSnapshot);

    fn on_finish(&mut self, _report: &RunReport) {}
}

/// Keeps every snapshot in order, for replay or rendering.
#[derive(Debug, Default)]
pub struct SnapshotRecorder {
    pub snapshots: Vec<BoardSnapshot>,
    pub report: Option<RunReport>,
}

impl TurnObserver for SnapshotRecorder {
    fn on_sub_turn(&mut self, snapshot: &BoardSnapshot) {
        self.snapshots.push(snapshot.clone());
    }

    fn on_finish(&mut self, report: &RunReport) {
        self.report = Some(*report);
    }
}
