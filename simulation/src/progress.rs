//! Campaign progress derived from scheduler events.

use hive_invasion_core::{Event, WaveNumber, WaveTable};

/// Progress of a single wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveReport {
    /// Wave described by the report.
    pub wave: WaveNumber,
    /// Units the wave table asks for.
    pub planned: u32,
    /// Units that actually entered the world.
    pub spawned: u32,
    /// Whether the wave has started.
    pub started: bool,
    /// Whether every unit of the wave has been dispatched.
    pub completed: bool,
}

/// Per-wave bookkeeping for progress displays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveProgress {
    reports: Vec<WaveReport>,
    current: Option<WaveNumber>,
}

impl WaveProgress {
    pub(crate) fn new(table: &WaveTable) -> Self {
        let reports = table
            .enemy_counts()
            .into_iter()
            .map(|(wave, planned)| WaveReport {
                wave,
                planned,
                spawned: 0,
                started: false,
                completed: false,
            })
            .collect();
        Self {
            reports,
            current: None,
        }
    }

    pub(crate) fn record(&mut self, event: &Event) {
        match event {
            Event::WaveStarted { wave } => {
                self.current = Some(*wave);
                if let Some(report) = self.report_mut(*wave) {
                    report.started = true;
                }
            }
            Event::WaveCompleted { wave } => {
                if let Some(report) = self.report_mut(*wave) {
                    report.completed = true;
                }
            }
            Event::AgentSpawned { wave, .. } => {
                if let Some(report) = self.report_mut(*wave) {
                    report.spawned += 1;
                }
            }
            _ => {}
        }
    }

    /// Most recently started wave.
    #[must_use]
    pub fn current(&self) -> Option<WaveNumber> {
        self.current
    }

    /// Reports in wave order.
    #[must_use]
    pub fn reports(&self) -> &[WaveReport] {
        &self.reports
    }

    /// Number of completed waves.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.reports.iter().filter(|report| report.completed).count()
    }

    fn report_mut(&mut self, wave: WaveNumber) -> Option<&mut WaveReport> {
        self.reports.iter_mut().find(|report| report.wave == wave)
    }
}
