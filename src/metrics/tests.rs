//! Tests for the CSV run logger.

use std::fs;

use tempfile::tempdir;

use super::*;
use crate::error::HarnessError;

fn quiet_config(dir: &std::path::Path) -> RunLoggerConfig {
    RunLoggerConfig::new("HalfCheetah", dir).with_display(false)
}

fn read_lines(logger: &RunLogger) -> Vec<String> {
    fs::read_to_string(logger.config().csv_path())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_config_defaults() {
    let config = RunLoggerConfig::new("HalfCheetah", "/tmp/run");
    assert_eq!(config.file_name, "log.csv");
    assert!(config.display);
    assert!(!config.graph);
    assert_eq!(config.csv_path(), std::path::PathBuf::from("/tmp/run/log.csv"));
    assert!(config.validate().is_ok());

    let config = config.with_file_name("");
    assert!(matches!(
        config.validate(),
        Err(HarnessError::InvalidConfig { field: "file_name", .. })
    ));
}

#[test]
fn test_creates_missing_directory() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let logger = RunLogger::create(quiet_config(&nested)).unwrap();
    assert!(logger.config().csv_path().exists());
}

#[test]
fn test_header_written_once_in_insertion_order() {
    let dir = tempdir().unwrap();
    let mut logger = RunLogger::create(quiet_config(dir.path())).unwrap();

    logger
        .log([("_MeanReward", LogValue::from(12.5)), ("Steps", LogValue::from(1000))])
        .unwrap();
    logger.log([("_Episode", 20)]).unwrap();
    logger.write().unwrap();

    logger
        .log([("_MeanReward", LogValue::from(-3.0)), ("Steps", LogValue::from(2000))])
        .unwrap();
    logger.log([("_Episode", 40)]).unwrap();
    logger.write().unwrap();
    logger.close().unwrap();

    let lines = {
        let path = dir.path().join("log.csv");
        fs::read_to_string(path).unwrap()
    };
    let lines: Vec<&str> = lines.lines().collect();
    assert_eq!(lines, vec!["_MeanReward,Steps,_Episode", "12.5,1000,20", "-3,2000,40"]);
}

#[test]
fn test_later_values_overwrite() {
    let dir = tempdir().unwrap();
    let mut logger = RunLogger::create(quiet_config(dir.path())).unwrap();

    logger.log([("loss", 1.0)]).unwrap();
    logger.log([("loss", 0.25)]).unwrap();
    assert_eq!(logger.value("loss"), Some(&LogValue::Float(0.25)));
    logger.write().unwrap();
    logger.close().unwrap();

    let dir_path = dir.path().join("log.csv");
    let text = fs::read_to_string(dir_path).unwrap();
    assert_eq!(text, "loss\n0.25\n");
}

#[test]
fn test_missing_fields_left_empty() {
    let dir = tempdir().unwrap();
    let mut logger = RunLogger::create(quiet_config(dir.path())).unwrap();

    logger.log([("a", 1), ("b", 2)]).unwrap();
    logger.write().unwrap();
    logger.log([("b", 3)]).unwrap();
    logger.write().unwrap();
    logger.close().unwrap();

    assert_eq!(read_lines(&logger), vec!["a,b", "1,2", ",3"]);
}

#[test]
fn test_unknown_field_rejected() {
    let dir = tempdir().unwrap();
    let mut logger = RunLogger::create(quiet_config(dir.path())).unwrap();

    logger.log([("a", 1)]).unwrap();
    logger.write().unwrap();
    logger.log([("a", 2), ("z", 9)]).unwrap();

    let err = logger.write().unwrap_err();
    assert!(err.is_invalid_input());
    // Entry is kept so the caller can inspect it
    assert_eq!(logger.value("z"), Some(&LogValue::Int(9)));
}

#[test]
fn test_fields_are_quoted() {
    let dir = tempdir().unwrap();
    let mut logger = RunLogger::create(quiet_config(dir.path())).unwrap();

    logger
        .log([("note", LogValue::from("fast, \"stable\"")), ("n", LogValue::from(1))])
        .unwrap();
    logger.write().unwrap();
    logger.close().unwrap();

    assert_eq!(read_lines(&logger), vec!["note,n", "\"fast, \"\"stable\"\"\",1"]);
}

#[test]
fn test_episode_tracks_reward_history() {
    let dir = tempdir().unwrap();
    let mut logger = RunLogger::create(quiet_config(dir.path())).unwrap();

    logger.log([("_MeanReward", 10.0)]).unwrap();
    logger.log([("_Episode", 20)]).unwrap();
    logger.write().unwrap();

    // Same call carrying both keys
    logger
        .log([("_MeanReward", LogValue::from(30.0)), ("_Episode", LogValue::from(40))])
        .unwrap();
    logger.write().unwrap();

    assert_eq!(logger.episodes(), &[20.0, 40.0]);
    assert_eq!(logger.mean_rewards(), &[10.0, 30.0]);
}

#[test]
fn test_episode_requires_mean_reward() {
    let dir = tempdir().unwrap();
    let mut logger = RunLogger::create(quiet_config(dir.path())).unwrap();

    assert!(logger.log([("_Episode", 1)]).unwrap_err().is_invalid_input());
    assert!(logger
        .log([("_Episode", LogValue::from("first")), ("Steps", LogValue::from(5))])
        .unwrap_err()
        .is_invalid_input());

    // Rejected calls leave the pending entry untouched
    assert_eq!(logger.value("_Episode"), None);
    assert_eq!(logger.value("Steps"), None);
    assert!(logger.episodes().is_empty());

    logger.log([("Steps", 5)]).unwrap();
    logger.write().unwrap();
    logger.close().unwrap();
    assert_eq!(read_lines(&logger), vec!["Steps", "5"]);
}

#[cfg(feature = "plot")]
#[test]
fn test_graph_writes_chart() {
    let dir = tempdir().unwrap();
    let config = quiet_config(dir.path()).with_graph(true);
    let mut logger = RunLogger::create(config).unwrap();

    for (episode, reward) in [(20, -5.0), (40, 12.5)] {
        logger
            .log([("_MeanReward", LogValue::from(reward)), ("_Episode", LogValue::from(episode))])
            .unwrap();
        logger.write().unwrap();
    }
    logger.close().unwrap();

    assert_eq!(logger.episodes(), &[20.0, 40.0]);
    let chart = logger.config().plot_path();
    assert!(chart.exists());
    assert!(fs::metadata(chart).unwrap().len() > 0);
}

#[test]
fn test_write_after_close_fails() {
    let dir = tempdir().unwrap();
    let mut logger = RunLogger::create(quiet_config(dir.path())).unwrap();

    logger.close().unwrap();
    assert!(logger.is_closed());
    logger.log([("a", 1)]).unwrap();
    assert!(matches!(logger.write(), Err(HarnessError::Closed)));
    // Closing twice is harmless
    logger.close().unwrap();
}

#[test]
fn test_display_does_not_disturb_rows() {
    let dir = tempdir().unwrap();
    let config = RunLoggerConfig::new("HalfCheetah", dir.path()).with_display(true);
    let mut logger = RunLogger::create(config).unwrap();

    logger
        .log([("_MeanReward", LogValue::from(1.25)), ("Steps", LogValue::from(5))])
        .unwrap();
    logger.log([("_Episode", 1)]).unwrap();
    logger.write().unwrap();
    logger.close().unwrap();

    assert_eq!(read_lines(&logger), vec!["_MeanReward,Steps,_Episode", "1.25,5,1"]);
}

#[test]
fn test_log_value_display() {
    assert_eq!(LogValue::Int(3).to_string(), "3");
    assert_eq!(LogValue::Float(2.5).to_string(), "2.5");
    assert_eq!(format!("{:.1}", LogValue::Float(2.26)), "2.3");
    assert_eq!(LogValue::from("x").to_string(), "x");
    assert_eq!(LogValue::Float(1.5).as_f64(), Some(1.5));
    assert_eq!(LogValue::Text("x".into()).as_f64(), None);
}
