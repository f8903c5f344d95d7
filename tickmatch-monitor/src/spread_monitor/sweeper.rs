use std::time::Duration;

use tickmatch_data::shared::subscription_models::Instrument;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/*----- */
// Sweep tick
/*----- */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepTick {
    pub instrument: Instrument,
    pub generation: u64,
}

/*----- */
// Sweeper handle
/*----- */
// Owns the timer task that feeds sweep ticks for one instrument. The task
// never touches instrument state itself, it only sends ticks back to the
// owner's event loop. Dropping the handle aborts the timer; the generation
// stamp lets the receiver discard ticks still in flight from a timer that
// was already replaced.
#[derive(Debug)]
pub struct SweeperHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn spawn(
        instrument: Instrument,
        generation: u64,
        period_ms: u64,
        ticks: mpsc::UnboundedSender<SweepTick>,
    ) -> Self {
        let task = tokio::spawn(async move {
            // Guard against a zero period from an unvalidated update, and
            // swallow the immediate first fire so the first sweep lands one
            // full period after start.
            let mut interval = tokio::time::interval(Duration::from_millis(period_ms.max(1)));
            interval.tick().await;

            loop {
                interval.tick().await;

                let tick = SweepTick {
                    instrument: instrument.clone(),
                    generation,
                };

                if ticks.send(tick).is_err() {
                    break;
                }
            }
        });

        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/*----- */
// Test
/*----- */
