use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |var: &str| map.get(var).cloned()
}

#[test]
fn from_lookup_defaults_when_unset() {
    let cfg = StoreConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg, StoreConfig::default());
    assert_eq!(cfg.storage_key, "newtube-layout-storage");
    assert_eq!(cfg.user_id, "current-user");
    assert_eq!(cfg.storage_dir, PathBuf::from(".newtube"));
}

#[test]
fn from_lookup_reads_overrides() {
    let cfg = StoreConfig::from_lookup(lookup_from(&[
        ("NEWTUBE_STORAGE_KEY", "alt-key"),
        ("NEWTUBE_USER_ID", "user-42"),
        ("NEWTUBE_STORAGE_DIR", "/tmp/newtube"),
    ]))
    .unwrap();
    assert_eq!(cfg.storage_key, "alt-key");
    assert_eq!(cfg.user_id, "user-42");
    assert_eq!(cfg.storage_dir, PathBuf::from("/tmp/newtube"));
}

#[test]
fn from_lookup_rejects_empty_values() {
    let err = StoreConfig::from_lookup(lookup_from(&[("NEWTUBE_USER_ID", "  ")])).unwrap_err();
    assert_eq!(err, ConfigError::Empty { var: "NEWTUBE_USER_ID" });
    assert_eq!(err.error_code(), "E_CONFIG");
}

#[test]
fn from_lookup_rejects_key_with_separator() {
    let err = StoreConfig::from_lookup(lookup_from(&[("NEWTUBE_STORAGE_KEY", "../escape")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidKey { var: "NEWTUBE_STORAGE_KEY", .. }));
}

#[test]
fn read_var_distinguishes_unset_from_non_unicode() {
    assert_eq!(read_var(ENV_USER_ID, Ok("u".into())).unwrap(), Some("u".to_owned()));
    assert_eq!(read_var(ENV_USER_ID, Err(VarError::NotPresent)).unwrap(), None);
    let err = read_var(ENV_USER_ID, Err(VarError::NotUnicode(std::ffi::OsString::from("x")))).unwrap_err();
    assert_eq!(err, ConfigError::NotUnicode { var: "NEWTUBE_USER_ID" });
    assert_eq!(err.error_code(), "E_CONFIG");
}
