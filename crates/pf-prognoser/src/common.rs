//! Common prognoser: configuration, history and the prognostics loop.

use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pf_config::ConfigMap;
use pf_results::{HistoryFile, ProgData};

use crate::data::{DataSource, SensorView, TagMap};
use crate::error::{PrognoserError, PrognoserResult};
use crate::prognoser::Prognoser;

pub const DEFAULT_INTERVAL_DELAY_MS: u64 = 100;
pub const DEFAULT_SAVE_INTERVAL: u64 = 60;

/// Settings shared by every prognoser.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonSettings {
    pub prognoser_type: String,
    pub name: String,
    pub id: String,
    pub interval_delay: Duration,
    /// Save every N loops when saving is enabled
    pub save_interval: u64,
    pub save_enable: bool,
    pub hist_path: PathBuf,
    pub reset_hist: bool,
    pub tags: TagMap,
}

impl CommonSettings {
    /// Keys `type`, `name`, `id` are required; `intervalDelay`,
    /// `saveInterval`, `saveEnable`, `histPath`, `resetHist` and `inTags`
    /// are optional.
    pub fn from_config(config: &ConfigMap) -> PrognoserResult<Self> {
        config.check_required(&["type", "name", "id"])?;
        let save_interval = config.u64_or("saveInterval", DEFAULT_SAVE_INTERVAL)?;
        if save_interval == 0 {
            return Err(PrognoserError::InvalidInput {
                what: "saveInterval must be positive".to_string(),
            });
        }
        Ok(Self {
            prognoser_type: config.first("type")?.to_string(),
            name: config.first("name")?.to_string(),
            id: config.first("id")?.to_string(),
            interval_delay: Duration::from_millis(
                config.u64_or("intervalDelay", DEFAULT_INTERVAL_DELAY_MS)?,
            ),
            save_interval,
            save_enable: config.bool_or("saveEnable", false)?,
            hist_path: PathBuf::from(config.str_or("histPath", ".")?),
            reset_hist: config.bool_or("resetHist", false)?,
            tags: TagMap::from_config(config)?,
        })
    }

    /// Name used in log output, e.g. `battery1 ModelBasedPrognoser Prognoser`.
    pub fn module_name(&self) -> String {
        format!("{} {} Prognoser", self.name, self.prognoser_type)
    }

    /// Empty results carrying this prognoser's identity.
    pub fn new_results(&self) -> ProgData {
        ProgData::new(&self.prognoser_type, &self.name, &self.id)
    }

    pub fn history_file(&self) -> PrognoserResult<HistoryFile> {
        Ok(HistoryFile::for_prognoser(
            &self.hist_path,
            &self.prognoser_type,
            &self.id,
        )?)
    }
}

/// Lifecycle state of a running prognoser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Spawned but not yet started; loops without stepping
    Paused,
    Started,
    Stopped,
}

#[derive(Debug)]
struct Control {
    state: Mutex<LifecycleState>,
    wake: Condvar,
}

impl Control {
    fn new() -> Self {
        Self {
            state: Mutex::new(LifecycleState::Paused),
            wake: Condvar::new(),
        }
    }

    fn get(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, state: LifecycleState) {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // Stopped is final
        if *current != LifecycleState::Stopped {
            *current = state;
        }
        self.wake.notify_all();
    }

    /// Sleep for `delay` or until stopped; returns the state afterwards.
    fn wait(&self, delay: Duration) -> LifecycleState {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .wake
            .wait_timeout_while(guard, delay, |s| *s != LifecycleState::Stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Drives a [`Prognoser`] with the common loop.
pub struct CommonPrognoser {
    settings: CommonSettings,
    prognoser: Box<dyn Prognoser>,
    source: Arc<dyn DataSource>,
    history: HistoryFile,
    module: String,
}

impl CommonPrognoser {
    pub fn new(
        config: &ConfigMap,
        prognoser: Box<dyn Prognoser>,
        source: Arc<dyn DataSource>,
    ) -> PrognoserResult<Self> {
        let settings = CommonSettings::from_config(config)?;
        let history = settings.history_file()?;
        let module = settings.module_name();
        tracing::debug!(module = %module, "read configuration");

        if settings.reset_hist {
            match history.reset() {
                Ok(Some(path)) => {
                    tracing::debug!(module = %module, moved_to = %path.display(), "history reset")
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(module = %module, error = %e, "could not rename history file")
                }
            }
        }

        Ok(Self {
            settings,
            prognoser,
            source,
            history,
            module,
        })
    }

    pub fn settings(&self) -> &CommonSettings {
        &self.settings
    }

    pub fn results(&self) -> &ProgData {
        self.prognoser.results()
    }

    pub fn history(&self) -> &HistoryFile {
        &self.history
    }

    /// Hand the last saved results to the prognoser. Missing or unreadable
    /// history is logged and otherwise ignored.
    pub fn load_history(&mut self) {
        match self.history.load_last() {
            Ok(Some(entry)) => {
                tracing::trace!(module = %self.module, saved_at = %entry.saved_at, "loading history");
                if let Err(e) = self.prognoser.set_history(&entry.data) {
                    tracing::error!(module = %self.module, error = %e, "error restoring prognoser history, skipping");
                }
            }
            Ok(None) => tracing::info!(
                module = %self.module,
                path = %self.history.path().display(),
                "prognostic history file does not exist yet"
            ),
            Err(e) => {
                tracing::error!(module = %self.module, error = %e, "error loading prognoser history, skipping")
            }
        }
    }

    /// One monitoring cycle: validity check, step when there is enough
    /// data, result check.
    pub fn run_cycle(&mut self) -> PrognoserResult<()> {
        let sensors = SensorView::new(&self.settings.tags, self.source.as_ref());
        self.prognoser.check_input_validity(&sensors)?;
        if self.prognoser.is_enough_data(&sensors) {
            tracing::trace!(module = %self.module, "has enough data, starting monitor step");
            self.prognoser.step(&sensors)?;
        }
        self.prognoser.check_result_validity()
    }

    pub fn save_state(&self) -> PrognoserResult<()> {
        tracing::debug!(module = %self.module, "saving state to file");
        self.history.append(self.prognoser.results())?;
        Ok(())
    }

    fn save_logged(&self) {
        if let Err(e) = self.save_state() {
            tracing::error!(module = %self.module, error = %e, "could not save state");
        }
    }

    fn run_loop(&mut self, control: &Control) {
        self.load_history();
        tracing::info!(module = %self.module, "starting prognostics loop");

        let mut loop_counter: u64 = 0;
        loop {
            let state = control.get();
            if state == LifecycleState::Stopped {
                break;
            }
            tracing::trace!(module = %self.module, loop_counter, "loop");
            if state == LifecycleState::Started {
                if let Err(e) = self.run_cycle() {
                    tracing::error!(module = %self.module, error = %e, "error in prognoser loop, skipping step");
                }
                if self.settings.save_enable && loop_counter % self.settings.save_interval == 0 {
                    self.save_logged();
                }
            }
            if control.wait(self.settings.interval_delay) == LifecycleState::Stopped {
                break;
            }
            loop_counter += 1;
        }

        tracing::info!(module = %self.module, "cleaning up");
        self.save_logged();
    }

    /// Run the loop on its own thread. The prognoser starts paused.
    pub fn spawn(self) -> PrognoserResult<PrognoserHandle> {
        let control = Arc::new(Control::new());
        let thread_control = Arc::clone(&control);
        let name = self.module.clone();
        let thread = thread::Builder::new().name(name.clone()).spawn(move || {
            let mut prognoser = self;
            prognoser.run_loop(&thread_control);
            prognoser
        })?;
        Ok(PrognoserHandle {
            name,
            control,
            thread,
        })
    }
}

impl std::fmt::Debug for CommonPrognoser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonPrognoser")
            .field("settings", &self.settings)
            .field("history", &self.history)
            .finish()
    }
}

/// Control over a spawned prognoser.
#[derive(Debug)]
pub struct PrognoserHandle {
    name: String,
    control: Arc<Control>,
    thread: JoinHandle<CommonPrognoser>,
}

impl PrognoserHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.control.get()
    }

    pub fn start(&self) {
        tracing::info!(module = %self.name, "starting");
        self.control.set(LifecycleState::Started);
    }

    pub fn pause(&self) {
        tracing::info!(module = %self.name, "pausing");
        self.control.set(LifecycleState::Paused);
    }

    pub fn stop(&self) {
        tracing::info!(module = %self.name, "stopping");
        self.control.set(LifecycleState::Stopped);
    }

    /// Stop the loop and wait for the final save; returns the last results.
    pub fn join(self) -> PrognoserResult<ProgData> {
        self.stop();
        let prognoser = self
            .thread
            .join()
            .map_err(|_| PrognoserError::ThreadPanicked)?;
        Ok(prognoser.results().clone())
    }
}
