//! Shared simulation state and the two-activity locking discipline.
//!
//! Lock order: `grid` may be held while taking `pacer` or `rules`, never the
//! reverse. The input buffer lock is never held together with any other.
//! Only the simulation activity (the thread running [`Engine::run`]) writes
//! to the grid; the interactive activity reads snapshots and queues edits.

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::evolution::next_generation;
use crate::grid::{Cell, GridSnapshot, SparseGrid};
use crate::pacing::{Channel, Pacer, RatePreset};
use crate::pending::{line_cells, InputBuffer};
use crate::rules::{GameRules, Pattern};

/// Longest the simulation loop sleeps between iterations, so edits are
/// merged and shutdown is seen promptly even at 1 Hz.
const MAX_IDLE: Duration = Duration::from_millis(4);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub rules: GameRules,
    /// Where the restart pattern is placed.
    pub seed_origin: Cell,
    pub seed_pattern: Pattern,
    pub tick_rate: RatePreset,
    pub frame_rate: RatePreset,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::conway(),
            seed_origin: Cell::new(0, 0),
            seed_pattern: Pattern::Seed,
            tick_rate: RatePreset::default(),
            frame_rate: RatePreset::default(),
        }
    }
}

/// Outcome of one simulation-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStep {
    /// Shutdown was requested; the loop must stop.
    Exit,
    /// The grid was reset to the seed pattern.
    Restarted,
    /// A new generation was swapped in.
    Advanced,
    /// The tick fired but evolution is paused.
    Paused,
    /// The tick was not due yet.
    Idle,
}

/// Values for the status panel and title bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub generation: u64,
    pub population: usize,
    pub ticks_per_second: u32,
    pub frames_per_second: u32,
    pub paused: bool,
    pub tick_rate: RatePreset,
    pub frame_rate: RatePreset,
    pub rules: GameRules,
}

pub struct Engine {
    grid: Mutex<SparseGrid>,
    pending: InputBuffer,
    pacer: Mutex<Pacer>,
    rules: Mutex<GameRules>,
    generation: AtomicU64,

    paused: AtomicBool,
    shutdown: AtomicBool,
    restart: AtomicBool,
    redraw: AtomicBool,

    seed_origin: Cell,
    seed_pattern: Pattern,
    clock: Instant,
}

impl Engine {
    /// Engine whose grid starts with the seed pattern.
    pub fn new(config: EngineConfig) -> Self {
        let seed = config.seed_pattern.cells(config.seed_origin);
        Self::from_cells(config, seed)
    }

    /// Engine whose grid starts with `cells`. Restarts still use the seed.
    pub fn from_cells<I>(config: EngineConfig, cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        let mut grid = SparseGrid::new();
        grid.insert_all(cells);

        Self {
            grid: Mutex::new(grid),
            pending: InputBuffer::new(),
            pacer: Mutex::new(Pacer::new(config.tick_rate, config.frame_rate)),
            rules: Mutex::new(config.rules),
            generation: AtomicU64::new(0),
            paused: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            restart: AtomicBool::new(false),
            redraw: AtomicBool::new(true),
            seed_origin: config.seed_origin,
            seed_pattern: config.seed_pattern,
            clock: Instant::now(),
        }
    }

    fn lock_grid(&self) -> MutexGuard<'_, SparseGrid> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pacer(&self) -> MutexGuard<'_, Pacer> {
        self.pacer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_rules(&self) -> MutexGuard<'_, GameRules> {
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Milliseconds since the engine was created.
    pub fn now_ms(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    // ---------------------------------------------------------------------
    // Interactive side
    // ---------------------------------------------------------------------

    /// Queue a cell to be made alive on the next loop iteration.
    pub fn paint(&self, cell: Cell) {
        self.pending.append(cell);
    }

    /// Queue every cell on the segment `from -> to`.
    pub fn paint_line(&self, from: Cell, to: Cell) {
        self.pending.extend(line_cells(from, to));
    }

    pub fn paint_all<I>(&self, cells: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        self.pending.extend(cells);
    }

    pub fn pending_edits(&self) -> usize {
        self.pending.len()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
        self.request_redraw();
        log::debug!("Simulation {}", if paused { "paused" } else { "resumed" });
    }

    /// Flip the pause flag, returning the new state.
    pub fn toggle_pause(&self) -> bool {
        let paused = !self.paused.fetch_xor(true, Ordering::AcqRel);
        self.request_redraw();
        log::debug!("Simulation {}", if paused { "paused" } else { "resumed" });
        paused
    }

    /// Ask the simulation activity to reset the grid to the seed pattern.
    ///
    /// Ignored once shutdown has been requested; returns whether the request
    /// was accepted.
    pub fn request_restart(&self) -> bool {
        if self.is_shutdown_requested() {
            log::debug!("Ignoring restart request during shutdown");
            return false;
        }
        self.restart.store(true, Ordering::Release);
        true
    }

    /// One-way: the simulation loop exits at its next check.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn set_tick_rate(&self, preset: RatePreset) {
        self.lock_pacer().set_rate(Channel::Tick, preset);
        log::debug!("Target tick rate set to {} Hz", preset.hz());
    }

    pub fn set_frame_rate(&self, preset: RatePreset) {
        self.lock_pacer().set_rate(Channel::Frame, preset);
        log::debug!("Target frame rate set to {} Hz", preset.hz());
    }

    pub fn tick_rate(&self) -> RatePreset {
        self.lock_pacer().channel(Channel::Tick).preset()
    }

    pub fn frame_rate(&self) -> RatePreset {
        self.lock_pacer().channel(Channel::Frame).preset()
    }

    /// Swap the rule used from the next generation on.
    pub fn set_rules(&self, rules: GameRules) {
        *self.lock_rules() = rules;
        log::info!("Rules changed to {}", rules);
    }

    pub fn rules(&self) -> GameRules {
        *self.lock_rules()
    }

    /// Force the next [`Engine::poll_frame`] to redraw regardless of pacing.
    pub fn request_redraw(&self) {
        self.redraw.store(true, Ordering::Release);
    }

    /// The latest fully swapped generation.
    pub fn snapshot(&self) -> GridSnapshot {
        self.lock_grid().snapshot()
    }

    /// Whether the interactive activity should draw now.
    pub fn poll_frame(&self) -> bool {
        self.poll_frame_at(self.now_ms())
    }

    pub fn poll_frame_at(&self, now_ms: u64) -> bool {
        let urgent = self.redraw.swap(false, Ordering::AcqRel);
        self.lock_pacer().should_fire_frame(now_ms, urgent)
    }

    /// Time until the frame channel is next due.
    pub fn time_until_frame(&self) -> Duration {
        let wait = self
            .lock_pacer()
            .channel(Channel::Frame)
            .time_until_due(self.now_ms());
        Duration::from_millis(wait)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> EngineStats {
        let population = self.lock_grid().len();
        let pacer = self.lock_pacer().clone();
        EngineStats {
            generation: self.generation(),
            population,
            ticks_per_second: pacer.channel(Channel::Tick).observed_rate(),
            frames_per_second: pacer.channel(Channel::Frame).observed_rate(),
            paused: self.is_paused(),
            tick_rate: pacer.channel(Channel::Tick).preset(),
            frame_rate: pacer.channel(Channel::Frame).preset(),
            rules: self.rules(),
        }
    }

    // ---------------------------------------------------------------------
    // Simulation side
    // ---------------------------------------------------------------------

    /// One iteration of the simulation loop.
    pub fn step(&self) -> LoopStep {
        self.step_at(self.now_ms())
    }

    pub fn step_at(&self, now_ms: u64) -> LoopStep {
        // Edits are merged every iteration, paused or not.
        let edits = self.pending.drain_all();
        if !edits.is_empty() {
            self.lock_grid().insert_all(edits);
            self.request_redraw();
        }

        if self.is_shutdown_requested() {
            return LoopStep::Exit;
        }
        if self.restart.swap(false, Ordering::AcqRel) {
            self.restart_now(now_ms);
            return LoopStep::Restarted;
        }

        if !self.lock_pacer().should_fire(Channel::Tick, now_ms) {
            return LoopStep::Idle;
        }
        if self.is_paused() {
            return LoopStep::Paused;
        }

        let current = self.snapshot();
        let rules = self.rules();
        let started = Instant::now();
        let next = next_generation(current.as_set(), &rules);
        log::trace!(
            "Generation {} computed in {:?} ({} -> {} cells)",
            self.generation() + 1,
            started.elapsed(),
            current.len(),
            next.len()
        );

        // Requests that arrived mid-computation win over its result.
        if self.is_shutdown_requested() {
            return LoopStep::Exit;
        }
        if self.restart.swap(false, Ordering::AcqRel) {
            self.restart_now(now_ms);
            return LoopStep::Restarted;
        }

        self.swap_generation(&current, next);
        LoopStep::Advanced
    }

    fn swap_generation(&self, base: &GridSnapshot, next: HashSet<Cell>) {
        let mut grid = self.lock_grid();
        debug_assert!(grid.is_current(base), "grid written outside the simulation loop");
        grid.replace(next);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn restart_now(&self, now_ms: u64) {
        let mut grid = self.lock_grid();
        grid.clear();
        grid.insert_all(self.seed_pattern.cells(self.seed_origin));
        self.lock_pacer().reset(now_ms);
        self.generation.store(0, Ordering::Release);
        drop(grid);
        self.request_redraw();
        log::info!("Simulation restarted");
    }

    /// Run the simulation loop on the current thread until shutdown.
    pub fn run(&self) {
        log::info!("Simulation loop started");
        while self.step() != LoopStep::Exit {
            let wait = self
                .lock_pacer()
                .channel(Channel::Tick)
                .time_until_due(self.now_ms());
            if wait > 0 {
                thread::sleep(Duration::from_millis(wait).min(MAX_IDLE));
            }
        }
        log::info!("Simulation loop stopped after {} generations", self.generation());
    }

    /// Start the simulation loop on its own thread.
    pub fn spawn(engine: Arc<Engine>) -> io::Result<SimulationHandle> {
        let worker = Arc::clone(&engine);
        let thread = thread::Builder::new()
            .name("simulation".into())
            .spawn(move || worker.run())?;
        Ok(SimulationHandle {
            engine,
            thread: Some(thread),
        })
    }
}

/// Owns the simulation thread. Shutting down (or dropping) requests shutdown
/// and waits for the loop to exit.
pub struct SimulationHandle {
    engine: Arc<Engine>,
    thread: Option<JoinHandle<()>>,
}

impl SimulationHandle {
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.engine.request_shutdown();
            if thread.join().is_err() {
                log::error!("Simulation thread panicked");
            }
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::View;

    fn config(tick: RatePreset) -> EngineConfig {
        EngineConfig {
            seed_origin: Cell::new(100, 100),
            tick_rate: tick,
            frame_rate: RatePreset::Hz1,
            ..EngineConfig::default()
        }
    }

    fn blinker() -> Vec<Cell> {
        vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)]
    }

    fn sorted(snapshot: &GridSnapshot) -> Vec<Cell> {
        let mut cells: Vec<Cell> = snapshot.iter().copied().collect();
        cells.sort();
        cells
    }

    #[test]
    fn test_new_engine_holds_seed() {
        let engine = Engine::new(config(RatePreset::Hz10));
        let expected: HashSet<Cell> = Pattern::Seed.cells(Cell::new(100, 100)).into_iter().collect();
        assert_eq!(engine.snapshot().as_set(), &expected);
    }

    #[test]
    fn test_step_waits_for_tick() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), blinker());
        assert_eq!(engine.step_at(50), LoopStep::Idle);
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.step_at(100), LoopStep::Advanced);
        assert_eq!(engine.generation(), 1);
        assert!(engine.snapshot().contains(Cell::new(1, -1)));
    }

    #[test]
    fn test_blinker_returns_after_two_ticks() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), blinker());
        assert_eq!(engine.step_at(100), LoopStep::Advanced);
        assert_eq!(engine.step_at(200), LoopStep::Advanced);
        assert_eq!(sorted(&engine.snapshot()), blinker());
    }

    #[test]
    fn test_pause_still_merges_edits() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), blinker());
        assert!(engine.toggle_pause());
        engine.paint(Cell::new(-50, -50));

        assert_eq!(engine.step_at(100), LoopStep::Paused);
        let snap = engine.snapshot();
        assert!(snap.contains(Cell::new(-50, -50)));
        assert_eq!(snap.len(), 4);
        assert_eq!(engine.generation(), 0);

        assert!(!engine.toggle_pause());
        assert_eq!(engine.step_at(200), LoopStep::Advanced);
    }

    #[test]
    fn test_edits_merged_before_evolution() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), Vec::new());
        engine.paint_line(Cell::new(0, 0), Cell::new(2, 0));
        assert_eq!(engine.step_at(100), LoopStep::Advanced);
        assert_eq!(
            sorted(&engine.snapshot()),
            vec![Cell::new(1, -1), Cell::new(1, 0), Cell::new(1, 1)]
        );
    }

    #[test]
    fn test_shutdown_prevents_further_swaps() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), blinker());
        engine.request_shutdown();
        engine.paint(Cell::new(9, 9));
        assert_eq!(engine.step_at(1_000), LoopStep::Exit);
        assert_eq!(engine.generation(), 0);
        // Queued edits are still merged on the way out.
        assert!(engine.snapshot().contains(Cell::new(9, 9)));
    }

    #[test]
    fn test_restart_resets_to_seed() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), blinker());
        assert_eq!(engine.step_at(100), LoopStep::Advanced);
        assert!(engine.request_restart());

        assert_eq!(engine.step_at(200), LoopStep::Restarted);
        let expected: HashSet<Cell> = Pattern::Seed.cells(Cell::new(100, 100)).into_iter().collect();
        assert_eq!(engine.snapshot().as_set(), &expected);
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.stats().ticks_per_second, 0);
        // Pacing restarted from the restart time.
        assert_eq!(engine.step_at(250), LoopStep::Idle);
        assert_eq!(engine.step_at(300), LoopStep::Advanced);
    }

    #[test]
    fn test_restart_ignored_after_shutdown() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), blinker());
        engine.request_shutdown();
        assert!(!engine.request_restart());
        assert_eq!(engine.step_at(100), LoopStep::Exit);
        assert_eq!(sorted(&engine.snapshot()), blinker());
    }

    #[test]
    fn test_frame_rate_does_not_touch_grid() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), blinker());
        let before = sorted(&engine.snapshot());
        for preset in RatePreset::ALL {
            engine.set_frame_rate(preset);
            engine.poll_frame_at(5_000);
        }
        assert_eq!(sorted(&engine.snapshot()), before);
        assert_eq!(engine.tick_rate(), RatePreset::Hz10);
        assert_eq!(engine.frame_rate(), RatePreset::Hz144);
    }

    #[test]
    fn test_tick_rate_does_not_touch_view_or_grid() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), blinker());
        let mut view = View::default();
        view.pan(7, -3);
        let view_before = view;
        let before = sorted(&engine.snapshot());
        for preset in RatePreset::ALL {
            engine.set_tick_rate(preset);
        }
        assert_eq!(view, view_before);
        assert_eq!(sorted(&engine.snapshot()), before);
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.tick_rate(), RatePreset::Hz144);
        assert_eq!(engine.frame_rate(), RatePreset::Hz1);
    }

    #[test]
    fn test_generations_do_not_bypass_frame_gate() {
        let engine = Engine::from_cells(config(RatePreset::Hz144), blinker());
        // Initial draw is always requested.
        assert!(engine.poll_frame_at(1));

        let mut frames = 1;
        let mut advanced = 0;
        for now in (7..1_000).step_by(6) {
            if engine.step_at(now) == LoopStep::Advanced {
                advanced += 1;
            }
            if engine.poll_frame_at(now) {
                frames += 1;
            }
        }
        assert!(advanced > 100);
        assert!(frames <= 2, "drew {frames} frames at a 1 Hz target");
    }

    #[test]
    fn test_edits_request_urgent_redraw() {
        let engine = Engine::from_cells(config(RatePreset::Hz10), blinker());
        assert!(engine.poll_frame_at(1));
        assert!(!engine.poll_frame_at(2));
        engine.paint(Cell::new(50, 50));
        engine.step_at(3);
        assert!(engine.poll_frame_at(4));
        assert!(!engine.poll_frame_at(5));
    }

    #[test]
    fn test_rule_change_applies_next_generation() {
        let center = Cell::new(0, 0);
        let six: Vec<Cell> = crate::evolution::neighbors(center).take(6).collect();
        let engine = Engine::from_cells(config(RatePreset::Hz10), six);
        engine.set_rules(GameRules::high_life());
        assert_eq!(engine.step_at(100), LoopStep::Advanced);
        assert!(engine.snapshot().contains(center));
    }

    #[test]
    fn test_concurrent_painting_loses_nothing() {
        const WRITERS: i32 = 4;
        const PER_WRITER: i32 = 500;

        let engine = Arc::new(Engine::from_cells(config(RatePreset::Hz144), Vec::new()));
        engine.set_paused(true);
        let handle = Engine::spawn(Arc::clone(&engine)).unwrap();

        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        engine.paint(Cell::new(w * 10_000, i));
                        if i % 50 == 0 {
                            engine.paint(Cell::new(w * 10_000, i));
                        }
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        handle.shutdown();
        // Anything queued after the loop's last drain is merged here.
        assert_eq!(engine.step_at(engine.now_ms()), LoopStep::Exit);

        let snap = engine.snapshot();
        assert_eq!(snap.len(), (WRITERS * PER_WRITER) as usize);
        for w in 0..WRITERS {
            for i in 0..PER_WRITER {
                assert!(snap.contains(Cell::new(w * 10_000, i)));
            }
        }
    }

    #[test]
    fn test_spawned_loop_advances_and_stops() {
        let engine = Arc::new(Engine::from_cells(config(RatePreset::Hz144), blinker()));
        let handle = Engine::spawn(Arc::clone(&engine)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while engine.generation() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        drop(handle);
        assert!(engine.is_shutdown_requested());
        assert!(engine.generation() >= 3);

        let generation = engine.generation();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(engine.generation(), generation);
    }
}
