use super::*;
use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn lookup(vars: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |name| vars.get(name).cloned()
}

#[test]
fn missing_queue_name_is_rejected() {
    let vars = env(&[("WORKER_COMMAND", "/usr/bin/worker")]);
    let err = from_lookup(lookup(vars)).unwrap_err();
    assert!(matches!(err, ConfigLoadError::Missing("QUEUE_NAME")));
}

#[test]
fn missing_worker_command_is_rejected() {
    let vars = env(&[("QUEUE_NAME", "jobs")]);
    let err = from_lookup(lookup(vars)).unwrap_err();
    assert!(matches!(err, ConfigLoadError::Missing("WORKER_COMMAND")));
}

#[test]
fn worker_command_is_split_into_program_and_args() {
    let vars = env(&[("QUEUE_NAME", "jobs"), ("WORKER_COMMAND", "/usr/bin/worker --flag value")]);
    let cfg = from_lookup(lookup(vars)).unwrap();
    assert_eq!(cfg.worker_command.program, std::path::PathBuf::from("/usr/bin/worker"));
    assert_eq!(cfg.worker_command.args, vec!["--flag", "value"]);
}

#[test]
fn unset_numeric_vars_fall_back_to_defaults() {
    let vars = env(&[("QUEUE_NAME", "jobs"), ("WORKER_COMMAND", "/usr/bin/worker")]);
    let cfg = from_lookup(lookup(vars)).unwrap();
    assert_eq!(cfg.min_processes, 1);
    assert_eq!(cfg.max_processes, 10);
    assert_eq!(cfg.scale_up_multiplier, 5.0);
    assert_eq!(cfg.scale_down_multiplier, 2.5);
    assert_eq!(cfg.broker.host, "127.0.0.1");
    assert_eq!(cfg.broker.port, 6379);
    assert_eq!(cfg.broker.password, None);
}

#[test]
fn malformed_numeric_var_is_rejected() {
    let vars = env(&[("QUEUE_NAME", "jobs"), ("WORKER_COMMAND", "/usr/bin/worker"), ("MIN_PROCESSES", "not-a-number")]);
    let err = from_lookup(lookup(vars)).unwrap_err();
    assert!(matches!(err, ConfigLoadError::Invalid("MIN_PROCESSES", _)));
}

#[test]
fn invariant_violations_surface_as_configerror() {
    let vars = env(&[
        ("QUEUE_NAME", "jobs"),
        ("WORKER_COMMAND", "/usr/bin/worker"),
        ("MIN_PROCESSES", "10"),
        ("MAX_PROCESSES", "2"),
    ]);
    let err = from_lookup(lookup(vars)).unwrap_err();
    assert!(matches!(err, ConfigLoadError::Invariant(ConfigError::MinExceedsMax { min: 10, max: 2 })));
}

#[test]
fn empty_password_is_treated_as_absent() {
    let vars = env(&[("QUEUE_NAME", "jobs"), ("WORKER_COMMAND", "/usr/bin/worker"), ("BROKER_PASSWORD", "")]);
    let cfg = from_lookup(lookup(vars)).unwrap();
    assert_eq!(cfg.broker.password, None);
}
