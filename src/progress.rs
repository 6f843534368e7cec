//! Progress streaming for long generation runs.

/// Which stage of a run a tick belongs to. `Preparing` counts bitmap
/// loads against the deduplicated URL total; `Generating` counts emitted
/// records against the estimated output total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Preparing,
    Generating,
}

/// Receives `(current, total)` ticks during a run. Ticks arrive from
/// whichever thread drives the phase, so implementations must be `Send`
/// and should stay cheap.
pub trait ProgressSink: Send {
    fn progress(&mut self, phase: Phase, current: usize, total: usize);
}

/// Discards every tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn progress(&mut self, _phase: Phase, _current: usize, _total: usize) {}
}

/// Records every tick in order.
#[derive(Debug, Default)]
pub struct CollectProgress {
    pub events: Vec<(Phase, usize, usize)>,
}

impl ProgressSink for CollectProgress {
    fn progress(&mut self, phase: Phase, current: usize, total: usize) {
        self.events.push((phase, current, total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_keeps_tick_order() {
        let mut sink = CollectProgress::default();
        sink.progress(Phase::Preparing, 1, 2);
        sink.progress(Phase::Preparing, 2, 2);
        sink.progress(Phase::Generating, 1, 4);
        assert_eq!(
            sink.events,
            vec![
                (Phase::Preparing, 1, 2),
                (Phase::Preparing, 2, 2),
                (Phase::Generating, 1, 4),
            ]
        );
    }
}
