//! Seeded random driver and the run / replay / dump loop
//!
//! A [`Fuzzer`] owns the host and a PRNG. Each test resets the host to a
//! random [`InitialLayout`], then executes randomly chosen operations,
//! checking the host's sanity after every executed step. Everything that
//! ran is appended to a [`ReplayLog`]; on failure that log, plus the host's
//! final layout, is dumped so the run can be replayed without the seed.
//!
//! ```ignore
//! let config = FuzzerConfig::default().with_seed(7).with_dump_dir("dumps");
//! let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);
//!
//! let cancel = CancellationToken::new();
//! match fuzzer.fuzz(&cancel).await {
//!     Ok(summary) => println!("{} operations executed", summary.executed),
//!     Err(failure) => eprintln!("{failure}"),
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::FuzzerConfig;
use crate::driver::Driver;
use crate::error::OperationError;
use crate::host::{DockHost, DockWidgetInfo, InitialLayout};
use crate::location::{AddingOptions, Location};
use crate::operation::{Operation, StepOutcome};
use crate::oplog::OperationLog;
use crate::params::AddDockWidgetParams;
use crate::replay::ReplayLog;

/// Entries printed from the operation log when a run fails
const FAILURE_CONTEXT: usize = 10;

/// Outcome of one successful test or replay
#[derive(Debug, Clone)]
pub struct RunReport {
    pub executed: usize,
    pub skipped: usize,
    /// Stopped early by the cancellation token
    pub cancelled: bool,
    pub log: ReplayLog,
}

/// Totals over a whole campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzSummary {
    pub seed: u64,
    pub tests: usize,
    pub executed: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

/// A run that hit a hard failure
#[derive(Debug)]
pub struct FuzzFailure {
    /// Index of the failing test within the campaign
    pub test: usize,
    /// Index of the failing step within the test
    pub step: usize,
    pub error: OperationError,
    /// Everything that ran, the failing operation last, with the final
    /// layout attached
    pub log: ReplayLog,
    pub dump_path: Option<PathBuf>,
}

impl fmt::Display for FuzzFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "test {} failed at step {}: {}",
            self.test, self.step, self.error
        )?;
        if let Some(path) = &self.dump_path {
            write!(f, " (dumped to {})", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for FuzzFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The concrete random driver
pub struct Fuzzer<H> {
    host: H,
    config: FuzzerConfig,
    seed: u64,
    rng: StdRng,
    last_saved_layout: Option<Vec<u8>>,
    log: OperationLog,
}

impl<H: DockHost> Fuzzer<H> {
    pub fn new(host: H, config: FuzzerConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let log = OperationLog::new(config.log.clone());
        Self {
            host,
            seed,
            rng: StdRng::seed_from_u64(seed),
            last_saved_layout: None,
            log,
            config,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &FuzzerConfig {
        &self.config
    }

    pub fn operation_log(&self) -> &OperationLog {
        &self.log
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// `MyMainWindow-N` main windows and `DockWidget-N` dock widgets, each
    /// widget visible with probability one half
    pub fn generate_initial_layout(&mut self) -> InitialLayout {
        let main_windows = self.rng.gen_range(1..=self.config.max_main_windows.max(1));
        let dock_widgets = self.rng.gen_range(1..=self.config.max_dock_widgets.max(1));

        let mut layout = InitialLayout::new();
        for i in 0..main_windows {
            layout = layout.main_window(format!("MyMainWindow-{i}"));
        }
        for i in 0..dock_widgets {
            let visible = self.rng.gen_bool(0.5);
            layout = layout.dock_widget(format!("DockWidget-{i}"), visible);
        }
        layout
    }

    /// A fresh operation of a weighted random kind, `None` when every kind
    /// is disabled
    pub fn random_operation(&mut self) -> Option<Operation> {
        let total = self.config.weights.total();
        if total == 0 {
            return None;
        }

        let mut roll = self.rng.gen_range(0..total);
        for (kind, weight) in self.config.weights.enabled() {
            let weight = u64::from(weight);
            if roll < weight {
                return Operation::new(kind);
            }
            roll -= weight;
        }
        None
    }

    /// Run one test from a fresh random layout
    pub async fn run_test(&mut self, cancel: &CancellationToken) -> Result<RunReport, FuzzFailure> {
        let layout = self.generate_initial_layout();
        let mut report = self.start(layout, Some(self.seed))?;

        for step in 0..self.config.operations_per_test {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let Some(operation) = self.random_operation() else {
                tracing::warn!("every operation kind has weight zero");
                break;
            };
            self.step(operation, step, &mut report).await?;
        }

        tracing::info!(
            executed = report.executed,
            skipped = report.skipped,
            "test finished"
        );
        Ok(report)
    }

    /// Re-run a recorded log against a host reset to its initial layout.
    ///
    /// Records that do not deserialize, or deserialize without params, are
    /// skipped with a warning; nothing is generated during a replay.
    pub async fn replay(
        &mut self,
        log: &ReplayLog,
        cancel: &CancellationToken,
    ) -> Result<RunReport, FuzzFailure> {
        let mut report = self.start(log.initial_layout.clone(), log.seed)?;

        for (step, map) in log.operations.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let Some(operation) = Operation::from_map(map) else {
                tracing::warn!(step, "Skipping unreadable record");
                continue;
            };
            if !operation.has_params() {
                tracing::warn!(step, operation = operation.name(), "Skipping record without params");
                continue;
            }
            self.step(operation, step, &mut report).await?;
        }

        Ok(report)
    }

    /// Run every configured test, stopping at the first failure
    pub async fn fuzz(&mut self, cancel: &CancellationToken) -> Result<FuzzSummary, FuzzFailure> {
        tracing::info!(seed = self.seed, tests = self.config.tests, "fuzzing");

        let mut summary = FuzzSummary {
            seed: self.seed,
            tests: 0,
            executed: 0,
            skipped: 0,
            cancelled: false,
        };

        for test in 0..self.config.tests {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let run = self.run_test(cancel);
            match run.instrument(tracing::info_span!("test", test)).await {
                Ok(report) => {
                    summary.tests += 1;
                    summary.executed += report.executed;
                    summary.skipped += report.skipped;
                    if report.cancelled {
                        summary.cancelled = true;
                        break;
                    }
                }
                Err(mut failure) => {
                    failure.test = test;
                    failure.dump_path = self.dump(&failure);
                    return Err(failure);
                }
            }
        }

        Ok(summary)
    }

    fn start(&mut self, layout: InitialLayout, seed: Option<u64>) -> Result<RunReport, FuzzFailure> {
        self.last_saved_layout = None;
        self.log.clear();

        let mut log = ReplayLog::new(layout);
        log.seed = seed;

        if let Err(e) = self.host.reset(&log.initial_layout) {
            return Err(self.fail(0, e.into(), log));
        }
        tracing::debug!(
            main_windows = log.initial_layout.main_windows.len(),
            dock_widgets = log.initial_layout.dock_widgets.len(),
            "host reset"
        );

        Ok(RunReport {
            executed: 0,
            skipped: 0,
            cancelled: false,
            log,
        })
    }

    async fn step(
        &mut self,
        mut operation: Operation,
        step: usize,
        report: &mut RunReport,
    ) -> Result<(), FuzzFailure> {
        let outcome = match operation.execute(self).await {
            Ok(outcome) => outcome,
            Err(e) => {
                report.log.push(&operation);
                self.log.record(&operation, StepOutcome::Executed);
                let log = std::mem::take(&mut report.log);
                return Err(self.fail(step, e, log));
            }
        };

        self.log.record(&operation, outcome);
        if outcome == StepOutcome::Skipped {
            report.skipped += 1;
            return Ok(());
        }

        report.executed += 1;
        report.log.push(&operation);
        self.host.process_events().await;

        if let Err(e) = self.host.check_sanity() {
            let log = std::mem::take(&mut report.log);
            return Err(self.fail(step, OperationError::Sanity(e), log));
        }
        Ok(())
    }

    fn fail(&self, step: usize, error: OperationError, mut log: ReplayLog) -> FuzzFailure {
        log.final_layout = Some(self.host.serialize_layout());

        tracing::error!(step, error = %error, "run failed");
        for entry in self.log.recent(FAILURE_CONTEXT) {
            tracing::error!(sequence = entry.sequence, outcome = ?entry.outcome, "{}", entry.summary);
        }

        FuzzFailure {
            test: 0,
            step,
            error,
            log,
            dump_path: None,
        }
    }

    fn dump(&self, failure: &FuzzFailure) -> Option<PathBuf> {
        let dir = self.config.dump_dir.as_ref()?;
        if let Err(e) = fs::create_dir_all(dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "Cannot create dump directory");
            return None;
        }

        let path = dir.join(format!("fuzz-{}-{}.json", self.seed, failure.test));
        match failure.log.save(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "failure dumped");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot write dump");
                None
            }
        }
    }
}

impl<H: DockHost> Driver for Fuzzer<H> {
    type Host = H;

    fn host(&self) -> &H {
        &self.host
    }

    fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn random_dock_widget(
        &mut self,
        filter: &dyn Fn(&DockWidgetInfo) -> bool,
        exclude: &[String],
    ) -> Option<String> {
        let candidates: Vec<String> = self
            .host
            .dock_widgets()
            .into_iter()
            .filter(|dw| filter(dw) && !exclude.contains(&dw.name))
            .map(|dw| dw.name)
            .collect();
        candidates.choose(&mut self.rng).cloned()
    }

    fn random_add_dock_widget_params(&mut self) -> Option<AddDockWidgetParams> {
        let main_window = self.host.main_windows().choose(&mut self.rng).cloned()?;
        let dock_widgets = self.host.dock_widgets();
        let dock_widget = dock_widgets.choose(&mut self.rng)?.name.clone();
        let location = *Location::all().choose(&mut self.rng)?;

        let mut params = AddDockWidgetParams::new(main_window, dock_widget, location);

        if self.rng.gen_bool(0.5) {
            let window = self.host.main_window_id(&params.main_window_name);
            let docked: Vec<&str> = dock_widgets
                .iter()
                .filter(|dw| {
                    dw.name != params.dock_widget_name && !dw.floating && dw.window == window
                })
                .map(|dw| dw.name.as_str())
                .collect();
            if let Some(relative_to) = docked.choose(&mut self.rng) {
                params = params.relative_to(*relative_to);
            }
        }

        if self.rng.gen_bool(self.config.start_hidden_probability()) {
            params = params.with_option(AddingOptions::START_HIDDEN);
        }

        Some(params)
    }

    fn set_last_saved_layout(&mut self, blob: Vec<u8>) {
        self.last_saved_layout = Some(blob);
    }

    fn last_saved_layout(&self) -> Option<&[u8]> {
        self.last_saved_layout.as_deref()
    }

    fn teardown_timeout(&self) -> Duration {
        self.config.teardown_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperationWeights;
    use crate::kind::OperationKind;
    use crate::sim::SimulatedDockHost;

    fn fuzzer(seed: u64) -> Fuzzer<SimulatedDockHost> {
        let config = FuzzerConfig::default()
            .with_seed(seed)
            .with_tests(3)
            .with_operations_per_test(40)
            .with_max_main_windows(2)
            .with_max_dock_widgets(5);
        Fuzzer::new(SimulatedDockHost::new(), config)
    }

    #[test]
    fn test_initial_layout_naming() {
        let mut fuzzer = fuzzer(1);
        let layout = fuzzer.generate_initial_layout();

        assert!((1..=2).contains(&layout.main_windows.len()));
        assert!((1..=5).contains(&layout.dock_widgets.len()));
        assert_eq!(layout.main_windows[0], "MyMainWindow-0");
        assert_eq!(layout.dock_widgets[0].name, "DockWidget-0");
    }

    #[test]
    fn test_nan_start_hidden_ratio_never_hides() {
        let config = FuzzerConfig {
            start_hidden_ratio: f64::NAN,
            ..FuzzerConfig::default().with_seed(5)
        };
        let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);
        let layout = fuzzer.generate_initial_layout();
        fuzzer.host.reset(&layout).unwrap();

        for _ in 0..50 {
            let params = fuzzer.random_add_dock_widget_params().unwrap();
            assert!(!params.adding_option.contains(AddingOptions::START_HIDDEN));
        }
    }

    #[test]
    fn test_random_operation_respects_weights() {
        let config = FuzzerConfig::default()
            .with_seed(3)
            .with_weights(OperationWeights::none().with(OperationKind::SaveLayout, 1));
        let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);

        for _ in 0..20 {
            assert_eq!(
                fuzzer.random_operation().unwrap().kind(),
                OperationKind::SaveLayout
            );
        }

        let config = FuzzerConfig::default().with_weights(OperationWeights::none());
        let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);
        assert!(fuzzer.random_operation().is_none());
    }

    #[tokio::test]
    async fn test_same_seed_same_run() {
        let cancel = CancellationToken::new();

        let mut a = fuzzer(1234);
        let mut b = fuzzer(1234);
        let report_a = a.run_test(&cancel).await.unwrap();
        let report_b = b.run_test(&cancel).await.unwrap();

        assert_eq!(report_a.log, report_b.log);
        assert_eq!(
            a.host().serialize_layout(),
            b.host().serialize_layout()
        );
    }

    #[tokio::test]
    async fn test_replay_reproduces_final_layout() {
        let cancel = CancellationToken::new();
        // Layout snapshots are not part of the log, so keep them out of the run
        let config = FuzzerConfig::default()
            .with_seed(99)
            .with_operations_per_test(60)
            .with_weights(
                OperationWeights::default()
                    .with(OperationKind::SaveLayout, 0)
                    .with(OperationKind::RestoreLayout, 0),
            );
        let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);
        let report = fuzzer.run_test(&cancel).await.unwrap();
        let expected = fuzzer.host().serialize_layout();

        let mut replayer = Fuzzer::new(SimulatedDockHost::new(), FuzzerConfig::default());
        let replayed = replayer.replay(&report.log, &cancel).await.unwrap();

        assert_eq!(replayed.executed, report.log.len());
        assert_eq!(replayer.host().serialize_layout(), expected);
    }

    #[tokio::test]
    async fn test_fuzz_summary() {
        let cancel = CancellationToken::new();
        let mut fuzzer = fuzzer(5);
        let summary = fuzzer.fuzz(&cancel).await.unwrap();

        assert_eq!(summary.seed, 5);
        assert_eq!(summary.tests, 3);
        assert!(!summary.cancelled);
        assert_eq!(summary.executed + summary.skipped, 120);
    }

    #[tokio::test]
    async fn test_cancel_stops_between_steps() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut fuzzer = fuzzer(5);
        let summary = fuzzer.fuzz(&cancel).await.unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.tests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_hang_is_dumped() {
        let dir = tempfile::tempdir().unwrap();
        let config = FuzzerConfig::default()
            .with_seed(11)
            .with_tests(1)
            .with_operations_per_test(200)
            .with_max_dock_widgets(4)
            .with_teardown_timeout(Duration::from_millis(50))
            .with_weights(
                OperationWeights::none()
                    .with(OperationKind::CloseViaDockWidgetApi, 1)
                    .with(OperationKind::ShowViaDockWidgetApi, 1),
            )
            .with_dump_dir(dir.path());

        let mut host = SimulatedDockHost::new();
        host.set_stall_teardown(true);
        let mut fuzzer = Fuzzer::new(host, config);

        let failure = fuzzer
            .fuzz(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(failure.error, OperationError::TeardownTimeout { .. }));

        let path = failure.dump_path.clone().unwrap();
        assert_eq!(path, dir.path().join("fuzz-11-0.json"));

        let dumped = ReplayLog::load(&path).unwrap();
        assert_eq!(dumped.seed, Some(11));
        assert!(dumped.final_layout.is_some());
        assert_eq!(dumped.operations.last(), failure.log.operations.last());
        assert_eq!(dumped.operations.last().unwrap()["type"], serde_json::json!(1));
    }
}
