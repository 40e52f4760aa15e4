#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave-by-wave spawning driven by a virtual clock.

use std::{collections::VecDeque, time::Duration};

use hive_invasion_core::{
    Event, SpawnError, SpawnItem, UnitFactory, WaveNumber, WaveSpec, WaveTable, WorldPoint,
};
use hive_invasion_system_encounter_scaling::EncounterScaling;
use hive_invasion_system_wave_composition::WaveComposer;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

const DEFAULT_INTER_ENEMY_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_INTER_WAVE_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_SWARM_JITTER: f32 = 1.0;

/// Configuration parameters required to construct the spawn scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    spawn_point: Option<WorldPoint>,
    initial_offset: Duration,
    inter_enemy_delay: Duration,
    inter_wave_delay: Duration,
    swarm_jitter: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration with the default campaign pacing.
    ///
    /// Without a spawn point every spawn is skipped with a warning.
    #[must_use]
    pub const fn new(spawn_point: Option<WorldPoint>, rng_seed: u64) -> Self {
        Self {
            spawn_point,
            initial_offset: Duration::ZERO,
            inter_enemy_delay: DEFAULT_INTER_ENEMY_DELAY,
            inter_wave_delay: DEFAULT_INTER_WAVE_DELAY,
            swarm_jitter: DEFAULT_SWARM_JITTER,
            rng_seed,
        }
    }

    /// Delay before the first wave starts.
    #[must_use]
    pub const fn with_initial_offset(mut self, offset: Duration) -> Self {
        self.initial_offset = offset;
        self
    }

    /// Pause after every spawn instruction.
    #[must_use]
    pub const fn with_inter_enemy_delay(mut self, delay: Duration) -> Self {
        self.inter_enemy_delay = delay;
        self
    }

    /// Pause between a completed wave and the start of the next.
    #[must_use]
    pub const fn with_inter_wave_delay(mut self, delay: Duration) -> Self {
        self.inter_wave_delay = delay;
        self
    }

    /// Maximum offset of swarm units from the spawn point on each axis.
    #[must_use]
    pub const fn with_swarm_jitter(mut self, jitter: f32) -> Self {
        self.swarm_jitter = jitter;
        self
    }
}

#[derive(Debug)]
enum Phase {
    /// Waiting for the wave at `wave_index` to start.
    Delaying { wave_index: usize },
    Spawning {
        wave_index: usize,
        items: VecDeque<SpawnItem>,
    },
    Finished,
}

/// Sequences waves, spawning composed units at a configured pace.
///
/// Waiting is expressed as a resume-at timestamp on the scheduler's own
/// clock; a large `dt` resolves every step that became due, in order.
#[derive(Debug)]
pub struct SpawnScheduler {
    config: Config,
    table: WaveTable,
    composer: WaveComposer,
    scaling: EncounterScaling,
    jitter_rng: ChaCha8Rng,
    clock: Duration,
    resume_at: Duration,
    phase: Phase,
    current_wave: Option<WaveNumber>,
}

impl SpawnScheduler {
    /// Creates a scheduler that will walk `table` from its first wave.
    #[must_use]
    pub fn new(
        table: WaveTable,
        composer: WaveComposer,
        scaling: EncounterScaling,
        config: Config,
    ) -> Self {
        Self {
            jitter_rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            resume_at: config.initial_offset,
            config,
            table,
            composer,
            scaling,
            clock: Duration::ZERO,
            phase: Phase::Delaying { wave_index: 0 },
            current_wave: None,
        }
    }

    /// Advances the scheduler by `dt`, spawning through `factory` and
    /// emitting wave and spawn events into `out`.
    pub fn handle<F>(&mut self, dt: Duration, factory: &mut F, out: &mut Vec<Event>)
    where
        F: UnitFactory + ?Sized,
    {
        self.clock = self.clock.saturating_add(dt);

        while self.resume_at <= self.clock {
            match std::mem::replace(&mut self.phase, Phase::Finished) {
                Phase::Finished => break,
                Phase::Delaying { wave_index } => self.begin_wave(wave_index, out),
                Phase::Spawning {
                    wave_index,
                    mut items,
                } => match items.pop_front() {
                    Some(item) => {
                        self.spawn_item(wave_index, item, factory, out);
                        self.resume_at += self.config.inter_enemy_delay;
                        self.phase = Phase::Spawning { wave_index, items };
                    }
                    None => self.complete_wave(wave_index, out),
                },
            }
        }
    }

    /// Wave currently spawning, or the last wave that started.
    #[must_use]
    pub fn current_wave(&self) -> Option<WaveNumber> {
        self.current_wave
    }

    /// Reports whether every wave has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Wave table the scheduler walks.
    #[must_use]
    pub fn table(&self) -> &WaveTable {
        &self.table
    }

    fn begin_wave(&mut self, wave_index: usize, out: &mut Vec<Event>) {
        let Some(spec) = self.table.get(wave_index) else {
            info!("wave table exhausted");
            return;
        };
        let wave = spec.wave();
        let items = self.composer.compose(spec);
        info!(
            wave = wave.get(),
            enemies = spec.enemy_count(),
            instructions = items.len(),
            "wave started"
        );

        self.current_wave = Some(wave);
        out.push(Event::WaveStarted { wave });
        self.phase = Phase::Spawning {
            wave_index,
            items: items.into(),
        };
    }

    fn complete_wave(&mut self, wave_index: usize, out: &mut Vec<Event>) {
        let Some(wave) = self.table.get(wave_index).map(WaveSpec::wave) else {
            return;
        };
        info!(wave = wave.get(), "wave completed");
        out.push(Event::WaveCompleted { wave });

        let next = wave_index + 1;
        if next < self.table.len() {
            self.resume_at += self.config.inter_wave_delay;
            self.phase = Phase::Delaying { wave_index: next };
        }
    }

    fn spawn_item<F>(
        &mut self,
        wave_index: usize,
        item: SpawnItem,
        factory: &mut F,
        out: &mut Vec<Event>,
    ) where
        F: UnitFactory + ?Sized,
    {
        let Some(wave) = self.table.get(wave_index).map(WaveSpec::wave) else {
            return;
        };
        let archetype = item.archetype();
        let Some(origin) = self.config.spawn_point else {
            let error = SpawnError::MissingSpawnPoint;
            warn!(wave = wave.get(), archetype = archetype.label(), %error, "spawn skipped");
            return;
        };

        let scaling = self.scaling.scaling_for(wave);
        for _ in 0..item.count() {
            let position = match item {
                SpawnItem::Single(_) => origin,
                SpawnItem::SwarmGroup(_) => self.jittered(origin),
            };
            match factory.spawn(archetype, position) {
                Ok(agent) => {
                    factory.scale(agent, scaling);
                    out.push(Event::AgentSpawned {
                        agent,
                        archetype,
                        position,
                        wave,
                    });
                }
                Err(error) => {
                    warn!(wave = wave.get(), archetype = archetype.label(), %error, "spawn skipped");
                    return;
                }
            }
        }
    }

    fn jittered(&mut self, origin: WorldPoint) -> WorldPoint {
        let jitter = self.config.swarm_jitter;
        if !jitter.is_finite() || jitter <= 0.0 {
            return origin;
        }
        let dx = self.jitter_rng.gen_range(-jitter..=jitter);
        let dz = self.jitter_rng.gen_range(-jitter..=jitter);
        origin.offset(dx, dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_invasion_core::{AgentId, Archetype, StatScaling};
    use hive_invasion_system_wave_composition::{Config as ComposerConfig, SwarmBounds};

    #[derive(Default)]
    struct CountingFactory {
        spawned: u32,
        positions: Vec<WorldPoint>,
    }

    impl UnitFactory for CountingFactory {
        fn spawn(&mut self, _: Archetype, position: WorldPoint) -> Result<AgentId, SpawnError> {
            self.spawned += 1;
            self.positions.push(position);
            Ok(AgentId::new(self.spawned))
        }

        fn scale(&mut self, _: AgentId, _: StatScaling) {}
    }

    fn scheduler(config: Config) -> SpawnScheduler {
        SpawnScheduler::new(
            WaveTable::standard(),
            WaveComposer::new(ComposerConfig::new(7, SwarmBounds::STANDARD)),
            EncounterScaling::default(),
            config,
        )
    }

    #[test]
    fn initial_offset_delays_first_wave() {
        let config = Config::new(Some(WorldPoint::new(0.0, 0.0)), 1)
            .with_initial_offset(Duration::from_secs(2));
        let mut scheduler = scheduler(config);
        let mut factory = CountingFactory::default();
        let mut events = Vec::new();

        scheduler.handle(Duration::from_millis(1_500), &mut factory, &mut events);
        assert!(events.is_empty());
        assert_eq!(scheduler.current_wave(), None);

        scheduler.handle(Duration::from_millis(500), &mut factory, &mut events);
        assert_eq!(events.first(), Some(&Event::WaveStarted { wave: WaveNumber::FIRST }));
        assert_eq!(scheduler.current_wave(), Some(WaveNumber::FIRST));
    }

    #[test]
    fn missing_spawn_point_skips_spawns_but_keeps_pacing() {
        let mut scheduler = scheduler(Config::new(None, 1));
        let mut factory = CountingFactory::default();
        let mut events = Vec::new();

        scheduler.handle(Duration::from_secs(3_600), &mut factory, &mut events);
        assert!(scheduler.is_finished());
        assert_eq!(factory.spawned, 0);
        let completed = events
            .iter()
            .filter(|event| matches!(event, Event::WaveCompleted { .. }))
            .count();
        assert_eq!(completed, scheduler.table().len());
    }

    #[test]
    fn non_finite_jitter_spawns_swarms_on_the_spawn_point() {
        let origin = WorldPoint::new(0.0, -40.0);
        for jitter in [f32::INFINITY, f32::NAN] {
            let config = Config::new(Some(origin), 1).with_swarm_jitter(jitter);
            let mut scheduler = scheduler(config);
            let mut factory = CountingFactory::default();
            let mut events = Vec::new();

            scheduler.handle(Duration::ZERO, &mut factory, &mut events);
            assert_eq!(factory.spawned, 3, "first wave is one swarm group");
            assert!(factory.positions.iter().all(|position| *position == origin));
        }
    }
}
