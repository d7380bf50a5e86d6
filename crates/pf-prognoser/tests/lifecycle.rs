//! Prognoser lifecycle on a real thread and the model-based prognoser.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use pf_config::ConfigMap;
use pf_prognoser::*;
use pf_results::HistoryFile;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn empty_config(hist: &std::path::Path) -> ConfigMap {
    let mut config = ConfigMap::new();
    config.set("type", "Empty");
    config.set("name", "pump1");
    config.set("id", "p1");
    config.set("intervalDelay", "1");
    config.set("histPath", hist.to_string_lossy().to_string());
    config
}

fn battery_config(hist: &std::path::Path) -> ConfigMap {
    let mut config = ConfigMap::parse(
        "type:ModelBasedPrognoser\n\
         name:battery1\n\
         id:b1\n\
         model:Battery\n\
         intervalDelay:1\n\
         inTags:power:bat1_power,temperature:bat1_temp,voltage:bat1_v\n\
         Predictor.numSamples:4\n\
         Predictor.horizon:6000\n\
         Predictor.seed:1\n\
         LoadEstimator.loading:8\n",
    )
    .unwrap();
    config.set("histPath", hist.to_string_lossy().to_string());
    config
}

fn publish_battery(store: &DataStore, t: f64) {
    store.set("bat1_power", 8.0, t);
    store.set("bat1_temp", 20.0, t);
    store.set("bat1_v", 4.1, t);
}

#[test]
fn started_prognoser_steps_and_saves() {
    let dir = unique_temp_dir("pf_prognoser_started");
    let mut config = empty_config(&dir);
    config.set("saveEnable", "true");
    config.set("saveInterval", "1");

    let factory = PrognoserFactory::with_builtins();
    let source: Arc<dyn DataSource> = Arc::new(DataStore::new());
    let handle = factory.build(&config, Arc::clone(&source)).unwrap().spawn().unwrap();
    assert_eq!(handle.state(), LifecycleState::Paused);
    handle.start();
    thread::sleep(Duration::from_millis(50));
    let results = handle.join().unwrap();

    let steps = results.internals.get("steps").copied().unwrap_or(0.0);
    assert!(steps >= 1.0, "steps = {steps}");

    let history = HistoryFile::for_prognoser(&dir, "Empty", "p1").unwrap();
    assert!(history.load_all().unwrap().len() >= 2);

    // A new prognoser picks up where the last one stopped
    let mut restored = factory.build(&config, source).unwrap();
    restored.load_history();
    assert_eq!(restored.results().internals.get("steps"), Some(&steps));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn paused_prognoser_never_steps() {
    let dir = unique_temp_dir("pf_prognoser_paused");
    let config = empty_config(&dir);
    let handle = PrognoserFactory::with_builtins()
        .build(&config, Arc::new(DataStore::new()))
        .unwrap()
        .spawn()
        .unwrap();
    thread::sleep(Duration::from_millis(20));
    handle.pause();
    let results = handle.join().unwrap();
    assert!(results.internals.get("steps").is_none());

    // The final state is saved even with saving disabled
    let history = HistoryFile::for_prognoser(&dir, "Empty", "p1").unwrap();
    assert_eq!(history.load_all().unwrap().len(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn reset_hist_moves_old_history() {
    let dir = unique_temp_dir("pf_prognoser_reset");
    let mut config = empty_config(&dir);
    let history = HistoryFile::for_prognoser(&dir, "Empty", "p1").unwrap();
    history
        .append(&pf_results::ProgData::new("Empty", "pump1", "p1"))
        .unwrap();

    config.set("resetHist", "true");
    let prognoser = PrognoserFactory::with_builtins()
        .build(&config, Arc::new(DataStore::new()))
        .unwrap();
    assert!(!prognoser.history().exists());
    let moved = std::fs::read_dir(&dir).unwrap().count();
    assert_eq!(moved, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn model_based_prognoser_predicts_eod() {
    let dir = unique_temp_dir("pf_prognoser_battery");
    let config = battery_config(&dir);
    let store = Arc::new(DataStore::new());
    let mut prognoser = PrognoserFactory::with_builtins()
        .build(&config, store.clone())
        .unwrap();

    // Nothing to do until every tag has data
    prognoser.run_cycle().unwrap();
    assert!(prognoser.results().events.is_empty());

    publish_battery(&store, 0.0);
    prognoser.run_cycle().unwrap();
    let eod = prognoser.results().event("EOD").unwrap();
    assert_eq!(eod.time_of_event.len(), 4);
    assert_eq!(eod.probability, 1.0);
    assert!(eod.event_state > 0.95);
    for toe in eod.reached() {
        assert!(toe > 1000.0 && toe < 5000.0, "toe = {toe}");
    }
    assert_eq!(prognoser.results().state.len(), 8);
    assert!(prognoser.results().trajectories.contains_key("SOC"));

    publish_battery(&store, 10.0);
    prognoser.run_cycle().unwrap();
    assert_eq!(prognoser.results().time, 10.0);
    let later = prognoser.results().event("EOD").unwrap();
    for toe in later.reached() {
        assert!(toe > 10.0);
    }

    prognoser.save_state().unwrap();
    let mut restored = PrognoserFactory::with_builtins()
        .build(&config, store.clone())
        .unwrap();
    restored.load_history();
    assert_eq!(restored.results().time, 10.0);
    assert_eq!(restored.results().state, prognoser.results().state);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn non_finite_sensor_values_are_rejected() {
    let dir = unique_temp_dir("pf_prognoser_nan");
    let store = Arc::new(DataStore::new());
    let mut prognoser = PrognoserFactory::with_builtins()
        .build(&battery_config(&dir), store.clone())
        .unwrap();
    publish_battery(&store, 0.0);
    store.set("bat1_v", f64::NAN, 0.0);
    assert!(matches!(
        prognoser.run_cycle(),
        Err(PrognoserError::InvalidInput { .. })
    ));
    assert!(prognoser.results().events.is_empty());
}

#[test]
fn model_based_prognoser_requires_model() {
    let dir = unique_temp_dir("pf_prognoser_no_model");
    let mut config = battery_config(&dir);
    config.set("model", "Pump");
    assert!(matches!(
        ModelBasedPrognoser::new(&config),
        Err(PrognoserError::Model(_))
    ));
}
