//! In-process shell harness for command tests.

use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use chrono::{TimeZone, Utc};
use subtrack_core::{FixedClock, RateFetchError, RateProvider};
use tempfile::TempDir;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::{CliMode, Services, ShellContext};

/// Answers with fixed USD-based rates and counts how often it was asked.
struct StubRates {
    calls: Arc<AtomicUsize>,
}

impl RateProvider for StubRates {
    fn fetch_latest(&self) -> Result<HashMap<String, f64>, RateFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok([("USD", 1.0), ("EUR", 0.92), ("JPY", 149.5), ("GBP", 0.79)]
            .into_iter()
            .map(|(code, rate)| (code.to_string(), rate))
            .collect())
    }
}

/// Script-mode context over a private data directory, clock fixed at 2024-06-01 12:00 UTC.
pub(crate) struct TestShell {
    pub context: ShellContext,
    dir: Arc<TempDir>,
    clock: Arc<FixedClock>,
    calls: Arc<AtomicUsize>,
}

impl TestShell {
    pub fn new() -> Self {
        let dir = Arc::new(tempfile::tempdir().expect("create temp dir"));
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        Self::open(dir, clock)
    }

    fn open(dir: Arc<TempDir>, clock: Arc<FixedClock>) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let services = Services {
            clock: clock.clone(),
            rate_provider: Box::new(StubRates {
                calls: calls.clone(),
            }),
            icon_probe: None,
        };
        let context =
            ShellContext::with_services(CliMode::Script, dir.path().to_path_buf(), services)
                .expect("build shell context");
        Self {
            context,
            dir,
            clock,
            calls,
        }
    }

    /// A fresh context over the same directory, as after a restart.
    pub fn reopen(&self) -> Self {
        Self::open(self.dir.clone(), self.clock.clone())
    }

    pub fn run(&mut self, line: &str) -> CommandResult {
        self.context.process_line(line).map(|_| ())
    }

    pub fn rate_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn base_dir(&self) -> &Path {
        self.dir.path()
    }
}
