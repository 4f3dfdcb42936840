use std::fs;

use super::*;

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(&dir.path().join("absent.toml")).expect("settings");
    if std::env::var_os("APP__BIND_ADDR").is_none() {
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR);
    }
    if std::env::var_os("APP__QUESTIONS_PATH").is_none() {
        assert!(settings.questions_path.is_none());
    }
}

#[test]
fn file_values_are_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("evaluator.toml");
    fs::write(
        &path,
        "bind_addr = \"0.0.0.0:9100\"\nquestions_path = \"data/custom.json\"\n",
    )
    .expect("write settings");

    let settings = load_settings_from(&path).expect("settings");
    if std::env::var_os("APP__BIND_ADDR").is_none() {
        assert_eq!(settings.bind_addr, "0.0.0.0:9100");
    }
    if std::env::var_os("APP__QUESTIONS_PATH").is_none() {
        assert_eq!(
            settings.questions_path.as_deref(),
            Some(Path::new("data/custom.json"))
        );
    }
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("evaluator.toml");
    fs::write(&path, "bind_addr = [").expect("write settings");
    assert!(load_settings_from(&path).is_err());
}
