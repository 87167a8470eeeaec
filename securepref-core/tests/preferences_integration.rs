//! End-to-end behaviour of the typed preference API.

mod common;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use securepref_core::marshal::SEPARATOR;
use securepref_core::{
    BackingStore, FileBackingStore, Json, PrefValue, PrefsConfig, PrefsError, Preferences,
    StaticIdentity, TypeDescriptor,
};
use serde::{Deserialize, Serialize};

use common::{memory_prefs, memory_prefs_with, secure_key, RecordingCodec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Account {
    id: u64,
    email: String,
    roles: Vec<String>,
}

#[test]
fn test_primitive_roundtrips() {
    let (_, prefs) = memory_prefs();
    prefs.set("bool", &true).unwrap();
    prefs.set("int", &-17_i32).unwrap();
    prefs.set("long", &(i64::from(i32::MAX) + 1)).unwrap();
    prefs.set("float", &0.25_f32).unwrap();
    prefs.set("double", &1e-300_f64).unwrap();
    prefs.set("string", &"ünïcödé ✓".to_string()).unwrap();

    assert_eq!(prefs.get::<bool>("bool").unwrap(), Some(true));
    assert_eq!(prefs.get::<i32>("int").unwrap(), Some(-17));
    assert_eq!(prefs.get::<i64>("long").unwrap(), Some(2_147_483_648));
    assert_eq!(prefs.get::<f32>("float").unwrap(), Some(0.25));
    assert_eq!(prefs.get::<f64>("double").unwrap(), Some(1e-300));
    assert_eq!(prefs.get::<String>("string").unwrap().as_deref(), Some("ünïcödé ✓"));
}

#[test]
fn test_set_bool_writes_encrypted_value_under_transformed_key() {
    let (backing, prefs) = memory_prefs();
    prefs.set("k", &true).expect("set");

    let store = prefs.store();
    let raw = backing.snapshot();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw.get(&store.to_key("k")), Some(&store.codec().encrypt_str("true")));
    assert!(!raw.contains_key("k"));
}

#[test]
fn test_missing_key_is_never_an_error() {
    let (_, prefs) = memory_prefs();
    assert!(!prefs.get_or("k", false).unwrap());
    assert_eq!(prefs.get_or("n", 42_i64).unwrap(), 42);
    assert_eq!(prefs.get::<Vec<i32>>("list").unwrap(), None);
    assert_eq!(prefs.get::<HashMap<String, i32>>("map").unwrap(), None);
}

#[test]
fn test_blank_values() {
    let (_, prefs) = memory_prefs();
    prefs.set_str("array", "").unwrap();
    prefs.set_str("number", "").unwrap();
    prefs.set_str("text", "").unwrap();
    prefs.set_str("object", "").unwrap();

    assert_eq!(prefs.get::<Vec<i32>>("array").unwrap(), Some(Vec::new()));
    assert_eq!(prefs.get::<i32>("number").unwrap(), None);
    assert_eq!(prefs.get_or("number", 3).unwrap(), 3);
    assert_eq!(prefs.get::<String>("text").unwrap(), Some(String::new()));
    assert_eq!(prefs.get::<Json<Account>>("object").unwrap(), None);
    assert!(prefs.contains("number").unwrap());
}

#[test]
fn test_format_errors_carry_the_key() {
    let (_, prefs) = memory_prefs();
    prefs.set_str("count", "twelve").unwrap();
    match prefs.get::<i32>("count") {
        Err(PrefsError::Format { key, type_name, .. }) => {
            assert_eq!(key, "count");
            assert_eq!(type_name, "int");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    prefs.set_str("flag", "True").unwrap();
    assert!(matches!(prefs.get::<bool>("flag"), Err(PrefsError::Format { .. })));
}

#[test]
fn test_corrupt_ciphertext_self_heals() {
    let (backing, prefs) = memory_prefs();
    prefs.set("token", &"abc".to_string()).unwrap();
    let raw_key = prefs.store().to_key("token");
    backing.put_string(&raw_key, "%%not-a-ciphertext%%").unwrap();

    assert_eq!(prefs.get::<String>("token").unwrap(), None);
    assert!(!prefs.contains("token").unwrap());
    assert!(backing.is_empty());
}

#[test]
fn test_mutable_list_writes_back_on_push() {
    let (backing, prefs) = memory_prefs();
    prefs.set("ids", &vec![1, 2, 3]).unwrap();

    let mut ids = prefs
        .get_mutable_list::<i32>("ids")
        .unwrap()
        .expect("list present");
    ids.push(4).unwrap();

    let store = prefs.store();
    let stored = backing.get_string(&store.to_key("ids")).unwrap().unwrap();
    assert_eq!(
        store.codec().decrypt_str(&stored).unwrap(),
        format!("1{SEPARATOR}2{SEPARATOR}3{SEPARATOR}4")
    );
    assert_eq!(prefs.get::<Vec<i32>>("ids").unwrap(), Some(vec![1, 2, 3, 4]));
}

#[test]
fn test_mutable_containers_are_fresh_and_absent_is_none() {
    let (_, prefs) = memory_prefs();
    assert!(prefs.get_mutable_list::<String>("missing").unwrap().is_none());

    prefs.set("names", &vec!["a".to_string()]).unwrap();
    let mut first = prefs.get_mutable_list::<String>("names").unwrap().unwrap();
    let second = prefs.get_mutable_list::<String>("names").unwrap().unwrap();
    first.push("b".into()).unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(
        prefs.get_mutable_list::<String>("names").unwrap().unwrap().len(),
        2
    );
}

#[test]
fn test_mutable_map_views_write_back() {
    let (_, prefs) = memory_prefs();
    let initial: HashMap<String, i32> = HashMap::from([("a".into(), 1), ("b".into(), 2)]);
    prefs.set("scores", &initial).unwrap();

    let mut scores = prefs
        .get_mutable_map::<String, i32>("scores")
        .unwrap()
        .unwrap();
    scores.insert("c".into(), 3).unwrap();
    scores.keys_view().remove("a").unwrap();
    scores.entries_view().set_value("b", 20).unwrap();

    let stored: HashMap<String, i32> = prefs.require("scores").unwrap();
    assert_eq!(stored, HashMap::from([("b".into(), 20), ("c".into(), 3)]));
}

#[test]
fn test_mutable_set_writes_back() {
    let (_, prefs) = memory_prefs();
    prefs.set("tags", &HashSet::from(["x".to_string()])).unwrap();
    let mut tags = prefs.get_mutable_set::<String>("tags").unwrap().unwrap();
    tags.remove("x").unwrap();
    tags.insert("y".into()).unwrap();
    assert_eq!(
        prefs.get::<HashSet<String>>("tags").unwrap(),
        Some(HashSet::from(["y".to_string()]))
    );
}

#[test]
fn test_structured_values_go_through_the_codec() {
    let backing = Arc::new(securepref_core::MemoryBackingStore::new());
    let codec = Arc::new(RecordingCodec::default());
    let prefs = Preferences::open_with_codec(
        backing,
        &secure_key(),
        &PrefsConfig::default(),
        codec.clone(),
    );

    let account = Account {
        id: 7,
        email: "ada@example.com".into(),
        roles: vec!["admin".into()],
    };
    prefs.set("account", &Json(account.clone())).unwrap();
    assert_eq!(codec.to_json_count(), 1);

    let loaded: Json<Account> = prefs.require("account").unwrap();
    assert_eq!(loaded.into_inner(), account);
    assert_eq!(codec.from_json_count(), 1);

    prefs.set("flag", &true).unwrap();
    prefs.set("list", &vec![1, 2]).unwrap();
    assert_eq!(codec.to_json_count(), 1);
}

#[test]
fn test_structured_value_typed_by_full_generic_type() {
    let (_, prefs) = memory_prefs();
    let mut groups = BTreeMap::new();
    groups.insert("ops".to_string(), vec![1_u32, 2]);
    prefs.set("groups", &groups).unwrap();

    let loaded: BTreeMap<String, Vec<u32>> = prefs.require("groups").unwrap();
    assert_eq!(loaded, groups);
    assert!(matches!(
        prefs.get::<BTreeMap<String, String>>("groups"),
        Err(PrefsError::Codec { .. })
    ));
}

#[test]
fn test_dynamic_access() {
    let (_, prefs) = memory_prefs();
    let value = PrefValue::Array(vec![PrefValue::Double(1.5), PrefValue::Double(-2.0)]);
    prefs.set_value("weights", &value).unwrap();
    assert_eq!(
        prefs
            .get_value("weights", &TypeDescriptor::parse("double[]"))
            .unwrap(),
        Some(value)
    );

    match prefs.get_value("weights", &TypeDescriptor::parse("parcel[]")) {
        Err(PrefsError::UnsupportedType { type_name, key }) => {
            assert_eq!(type_name, "parcel");
            assert_eq!(key, "weights");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_listener_gets_plaintext_key() {
    let (_, prefs) = memory_prefs();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    prefs.register_listener(
        "theme",
        Arc::new(move |key: &str| sink.lock().unwrap().push(key.to_string())),
    );

    prefs.set("theme", &"dark".to_string()).unwrap();
    prefs.set("other", &1).unwrap();
    prefs.remove("theme").unwrap();
    prefs.unregister_listener("theme");
    prefs.set("theme", &"light".to_string()).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["theme", "theme"]);
}

#[test]
fn test_keys_and_clear() {
    let (backing, prefs) = memory_prefs();
    prefs.set("a", &1).unwrap();
    prefs.set("b", &2).unwrap();
    let mut keys = prefs.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a", "b"]);

    prefs.clear().unwrap();
    assert!(backing.is_empty());
    assert!(prefs.keys().unwrap().is_empty());
}

#[test]
fn test_plain_key_mode_keeps_key_names_readable() {
    let (backing, prefs) = memory_prefs_with(&PrefsConfig::default().with_encrypt_keys(false));
    prefs.set("visible", &1).unwrap();
    assert!(backing.contains("visible").unwrap());
    assert_eq!(prefs.get::<i32>("visible").unwrap(), Some(1));
}

#[test]
fn test_same_device_identity_reads_back_values() {
    let backing = Arc::new(securepref_core::MemoryBackingStore::new());
    let identity = StaticIdentity::hardware("8af3c2e1d4b5a697");
    let config = PrefsConfig::default();

    let writer = Preferences::for_device(backing.clone(), &identity, &config).unwrap();
    writer.set("pin", &1234).unwrap();

    let reader = Preferences::for_device(backing.clone(), &identity, &config).unwrap();
    assert_eq!(reader.get::<i32>("pin").unwrap(), Some(1234));

    let stranger = Preferences::for_device(
        backing.clone(),
        &StaticIdentity::hardware("another-device"),
        &PrefsConfig::default().with_encrypt_keys(false),
    )
    .unwrap();
    assert_eq!(stranger.get::<i32>("pin").unwrap(), None);
    assert_eq!(stranger.keys().unwrap().len(), 1);
}

#[test]
fn test_foreign_value_under_same_key_self_heals() {
    let backing = Arc::new(securepref_core::MemoryBackingStore::new());
    let config = PrefsConfig::default().with_encrypt_keys(false);
    let writer = Preferences::for_device(backing.clone(), &StaticIdentity::hardware("device-a"), &config).unwrap();
    writer.set("pin", &1234).unwrap();

    let reader = Preferences::for_device(backing.clone(), &StaticIdentity::hardware("device-b"), &config).unwrap();
    match reader.get::<i32>("pin") {
        Ok(None) => assert!(!backing.contains("pin").unwrap()),
        // A wrong key can still produce valid padding; the garbage then fails to parse.
        Err(PrefsError::Format { .. }) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_file_backed_preferences_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    {
        let backing = Arc::new(FileBackingStore::open(&path).unwrap());
        let prefs = Preferences::open(backing, &secure_key(), &PrefsConfig::named("settings"));
        prefs.set("recent", &vec!["a.txt".to_string(), "b.txt".to_string()]).unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(!contents.contains("recent"));
    assert!(!contents.contains("a.txt"));

    let backing = Arc::new(FileBackingStore::open(&path).unwrap());
    let prefs = Preferences::open(backing, &secure_key(), &PrefsConfig::named("settings"));
    assert_eq!(
        prefs.get::<Vec<String>>("recent").unwrap(),
        Some(vec!["a.txt".to_string(), "b.txt".to_string()])
    );
}

#[test]
fn test_nested_lists_are_rejected_before_storage() {
    let (backing, prefs) = memory_prefs();
    match prefs.set("grid", &vec![vec![1, 2], vec![3]]) {
        Err(PrefsError::UnsupportedType { type_name, key }) => {
            assert_eq!(type_name, "int[][]");
            assert_eq!(key, "grid");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(backing.is_empty());

    prefs.set("grid", &vec![1, 2, 3]).unwrap();
    assert!(matches!(
        prefs.get::<Vec<Vec<i32>>>("grid"),
        Err(PrefsError::UnsupportedType { .. })
    ));
    assert!(matches!(
        prefs.get_value("grid", &TypeDescriptor::parse("int[][]")),
        Err(PrefsError::UnsupportedType { .. })
    ));
}

#[test]
fn test_file_backed_listener_sees_set_and_remove() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backing = Arc::new(FileBackingStore::open(dir.path().join("prefs.json")).unwrap());
    let prefs = Preferences::open(backing, &secure_key(), &PrefsConfig::default());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    prefs.register_listener(
        "token",
        Arc::new(move |key: &str| sink.lock().unwrap().push(key.to_string())),
    );

    prefs.remove("token").unwrap();
    assert!(seen.lock().unwrap().is_empty());

    prefs.set_str("token", "abc").unwrap();
    prefs.remove("token").unwrap();
    prefs.remove("token").unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["token", "token"]);
}
