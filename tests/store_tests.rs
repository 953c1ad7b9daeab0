//! Integration tests for the store: create/open, hierarchy, edits and deletes.

use std::path::{Path, PathBuf};

use securedata::crypto::KdfParams;
use securedata::errors::SecureDataError;
use securedata::store::{DataBase, Kind, Record};
use tempfile::TempDir;

/// Cheapest accepted Argon2d settings, to keep tests fast.
fn fast() -> KdfParams {
    KdfParams {
        time_cost: 1,
        memory_kib: 8_192,
        parallelism: 1,
    }
}

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("secure.sdb")
}

fn create(path: &Path) -> DataBase {
    let mut db = DataBase::open(path).unwrap();
    db.create("alice", b"p1", fast()).unwrap();
    db
}

fn reopen(path: &Path) -> DataBase {
    let mut db = DataBase::open(path).unwrap();
    assert!(db.try_init(b"p1").unwrap(), "correct password must open");
    db
}

fn folder(name: &str, parent: u32) -> Record {
    let mut r = Record::folder(name).unwrap();
    r.set_parent(parent).unwrap();
    r
}

fn account(name: &str, parent: u32, login: &str, password: &str) -> Record {
    let mut r = Record::account(name).unwrap();
    r.set_login(login).unwrap();
    r.set_password(password).unwrap();
    r.set_parent(parent).unwrap();
    r
}

// ---------------------------------------------------------------------------
// Create / open
// ---------------------------------------------------------------------------

#[test]
fn work_folder_with_gmail_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut db = create(&path);
    let work = db.add_data(folder("Work", 0)).unwrap();
    db.add_data(account("gmail", work, "a@x.com", "secret")).unwrap();
    db.close().unwrap();

    let mut db = reopen(&path);
    assert_eq!(db.login(), "alice");
    assert_eq!(db.version(), 1);
    assert_eq!(db.kdf_params(), &fast());

    let root = db.root();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].name().unwrap(), "Work");
    assert_eq!(root[0].kind(), Kind::Folder);

    let children = db.children(work).unwrap();
    assert_eq!(children.len(), 1);
    let gmail = children[0].id();
    assert!(!db.get(gmail).unwrap().is_loaded());

    db.load_sensitive(gmail).unwrap();
    let gmail = db.get(gmail).unwrap();
    assert_eq!(gmail.name().unwrap(), "gmail");
    assert_eq!(gmail.login().unwrap(), "a@x.com");
    assert_eq!(gmail.password().unwrap(), "secret");
}

#[test]
fn wrong_password_returns_false_and_indexes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut db = create(&path);
    let work = db.add_data(folder("Work", 0)).unwrap();
    db.add_data(account("gmail", work, "a@x.com", "secret")).unwrap();
    db.close().unwrap();

    let mut db = DataBase::open(&path).unwrap();
    assert!(!db.try_init(b"wrong").unwrap());
    assert!(!db.is_open());
    assert!(db.is_empty());
    assert!(db.root().is_empty());

    // A failed attempt does not poison the handle.
    assert!(db.try_init(b"p1").unwrap());
    assert_eq!(db.len(), 2);
}

#[test]
fn empty_store_still_checks_the_password() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    create(&path).close().unwrap();

    let mut db = DataBase::open(&path).unwrap();
    assert!(!db.try_init(b"nope").unwrap());
    assert!(db.try_init(b"p1").unwrap());
    assert!(db.is_empty());
}

#[test]
fn second_try_init_is_invalid_state() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    create(&path).close().unwrap();

    let mut db = reopen(&path);
    assert!(matches!(
        db.try_init(b"p1"),
        Err(SecureDataError::InvalidState(_))
    ));
}

#[test]
fn tampered_data_region_fails_the_file_tag() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut db = create(&path);
    db.add_data(account("bank", 0, "me", "pin")).unwrap();
    db.close().unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    std::fs::write(&path, &bytes).unwrap();

    let mut db = DataBase::open(&path).unwrap();
    assert!(!db.try_init(b"p1").unwrap());
}

#[test]
fn file_ending_mid_record_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut db = create(&path);
    db.add_data(folder("Work", 0)).unwrap();
    db.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 16]).unwrap();

    // Truncation breaks the tag before the scan ever runs.
    let mut db = DataBase::open(&path).unwrap();
    assert!(!db.try_init(b"p1").unwrap());
}

#[test]
fn runaway_kdf_cost_in_header_is_corruption() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    create(&path).close().unwrap();

    // Header bytes [36, 40) hold the Argon2d memory cost.
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[36..40].copy_from_slice(&u32::MAX.to_le_bytes());
    std::fs::write(&path, &bytes).unwrap();

    let mut db = DataBase::open(&path).unwrap();
    assert!(matches!(
        db.try_init(b"p1"),
        Err(SecureDataError::Corrupted(_))
    ));
    assert!(!db.is_open());
}

#[test]
fn create_refuses_runaway_kdf_cost() {
    let dir = TempDir::new().unwrap();
    let mut db = DataBase::open(&store_path(&dir)).unwrap();
    let heavy = KdfParams {
        parallelism: 1_000,
        ..fast()
    };
    assert!(matches!(
        db.create("alice", b"p1", heavy),
        Err(SecureDataError::KeyDerivationFailed(_))
    ));
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

#[test]
fn every_child_is_linked_exactly_once() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut db = create(&path);
    let a = db.add_data(folder("a", 0)).unwrap();
    let b = db.add_data(folder("b", a)).unwrap();
    let c = db.add_data(folder("c", 0)).unwrap();
    db.add_data(account("x", b, "x", "1")).unwrap();
    db.add_data(account("y", c, "y", "2")).unwrap();
    db.add_data(account("z", 0, "z", "3")).unwrap();
    db.close().unwrap();

    let db = reopen(&path);
    let ids: Vec<u32> = db.index().ids().collect();
    assert_eq!(ids.len(), 6);

    for &id in &ids {
        let record = db.get(id).unwrap();
        let holders = ids
            .iter()
            .filter(|&&f| db.get(f).unwrap().children().contains(&id))
            .count();
        if record.parent_id() == 0 {
            assert_eq!(holders, 0);
            assert!(db.root().iter().any(|r| r.id() == id));
        } else {
            assert_eq!(holders, 1, "record {id} must have exactly one parent");
            assert!(db.get(record.parent_id()).unwrap().is_folder());
        }
        assert_eq!(record.parent_layers(), 0);
    }
}

#[test]
fn path_and_descendants_follow_the_tree() {
    let dir = TempDir::new().unwrap();
    let mut db = create(&store_path(&dir));
    let a = db.add_data(folder("a", 0)).unwrap();
    let b = db.add_data(folder("b", a)).unwrap();
    let x = db.add_data(account("x", b, "x", "1")).unwrap();
    let y = db.add_data(account("y", a, "y", "2")).unwrap();

    assert_eq!(db.path(x).unwrap(), vec![a, b, x]);
    assert_eq!(db.path(a).unwrap(), vec![a]);
    let mut below = db.descendants(a).unwrap();
    below.sort_unstable();
    assert_eq!(below, vec![b, x, y]);
    assert!(matches!(db.get(99), Err(SecureDataError::NotFound(99))));
}

#[test]
fn adding_under_an_account_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut db = create(&store_path(&dir));
    let acct = db.add_data(account("bank", 0, "me", "pin")).unwrap();

    let before = std::fs::metadata(db.file_path()).unwrap().len();
    assert!(matches!(
        db.add_data(folder("inner", acct)),
        Err(SecureDataError::InvalidState(_))
    ));
    assert_eq!(std::fs::metadata(db.file_path()).unwrap().len(), before);
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn modify_rewrites_in_place_and_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut db = create(&path);
    let id = db.add_data(account("bank", 0, "me", "pin")).unwrap();
    let len = std::fs::metadata(&path).unwrap().len();

    let changed = db
        .modify_data(id, |r| {
            r.set_name("bank-2")?;
            r.set_description("checking")?;
            r.set_password("new-pin")
        })
        .unwrap();
    assert!(changed);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), len);
    db.close().unwrap();

    let mut db = reopen(&path);
    db.load_sensitive(id).unwrap();
    let r = db.get(id).unwrap();
    assert_eq!(r.name().unwrap(), "bank-2");
    assert_eq!(r.description().unwrap(), "checking");
    assert_eq!(r.login().unwrap(), "me");
    assert_eq!(r.password().unwrap(), "new-pin");
    assert!(r.last_edit().unwrap() >= r.created_at().unwrap());
}

#[test]
fn empty_edit_reports_no_change() {
    let dir = TempDir::new().unwrap();
    let mut db = create(&store_path(&dir));
    let id = db.add_data(folder("Work", 0)).unwrap();
    let hash = db.get(id).unwrap().hash().to_vec();

    assert!(!db.modify_data(id, |_| Ok(())).unwrap());
    assert_eq!(db.get(id).unwrap().hash(), hash.as_slice());
}

#[test]
fn failed_edit_leaves_record_untouched() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let mut db = create(&path);
    let id = db.add_data(folder("Work", 0)).unwrap();
    let before = std::fs::read(&path).unwrap();

    let result = db.modify_data(id, |r| {
        r.set_description("first")?;
        r.set_name(&"n".repeat(200))
    });
    assert!(matches!(
        result,
        Err(SecureDataError::FieldTooLong { field: "name", .. })
    ));
    assert_eq!(db.get(id).unwrap().description().unwrap(), "");
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn setters_outside_an_edit_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut db = create(&store_path(&dir));
    let id = db.add_data(folder("Work", 0)).unwrap();

    let mut copy = db.get(id).unwrap().clone();
    assert!(!copy.is_mutable());
    assert!(matches!(
        copy.set_name("x"),
        Err(SecureDataError::InvalidState(_))
    ));
}

#[test]
fn moving_a_record_relinks_it() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut db = create(&path);
    let x = db.add_data(folder("x", 0)).unwrap();
    let y = db.add_data(folder("y", 0)).unwrap();
    let acct = db.add_data(account("bank", x, "me", "pin")).unwrap();

    assert!(db.modify_data(acct, |r| r.set_parent(y)).unwrap());
    assert!(db.get(x).unwrap().children().is_empty());
    assert_eq!(db.get(y).unwrap().children(), &[acct]);

    assert!(db.modify_data(y, |r| r.set_parent(x)).unwrap());
    assert_eq!(db.path(acct).unwrap(), vec![x, y, acct]);
    db.close().unwrap();

    let mut db = reopen(&path);
    assert_eq!(db.path(acct).unwrap(), vec![x, y, acct]);
    assert_eq!(db.root().len(), 1);
    db.load_sensitive(acct).unwrap();
    assert_eq!(db.get(acct).unwrap().password().unwrap(), "pin");
}

#[test]
fn moving_into_own_subtree_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let mut db = create(&path);
    let a = db.add_data(folder("a", 0)).unwrap();
    let b = db.add_data(folder("b", a)).unwrap();
    let before = std::fs::read(&path).unwrap();

    assert!(matches!(
        db.modify_data(a, |r| r.set_parent(b)),
        Err(SecureDataError::InvalidState(_))
    ));
    assert!(db.modify_data(a, |r| r.set_parent(a)).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(db.get(a).unwrap().parent_id(), 0);
}

// ---------------------------------------------------------------------------
// Deleting
// ---------------------------------------------------------------------------

#[test]
fn deleting_a_folder_removes_its_subtree() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut db = create(&path);
    let a = db.add_data(folder("a", 0)).unwrap();
    let b = db.add_data(folder("b", a)).unwrap();
    db.add_data(account("c", b, "c", "3")).unwrap();
    let keep = db.add_data(account("keep", 0, "k", "4")).unwrap();

    assert_eq!(db.delete_data(a).unwrap(), 3);
    assert_eq!(db.len(), 1);
    assert!(matches!(db.get(b), Err(SecureDataError::NotFound(_))));
    db.close().unwrap();

    let mut db = reopen(&path);
    assert_eq!(db.len(), 1);
    assert_eq!(db.root()[0].id(), keep);
    // Ids of deleted records are never reused.
    assert_eq!(db.add_data(folder("new", 0)).unwrap(), 5);
}

#[test]
fn deleting_a_child_unlinks_it_from_the_parent() {
    let dir = TempDir::new().unwrap();
    let mut db = create(&store_path(&dir));
    let a = db.add_data(folder("a", 0)).unwrap();
    let x = db.add_data(account("x", a, "x", "1")).unwrap();
    let y = db.add_data(account("y", a, "y", "2")).unwrap();

    assert_eq!(db.delete_data(x).unwrap(), 1);
    assert_eq!(db.get(a).unwrap().children(), &[y]);
}

#[test]
fn deleting_an_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    let mut db = create(&store_path(&dir));
    assert!(matches!(
        db.delete_data(42),
        Err(SecureDataError::NotFound(42))
    ));
}

// ---------------------------------------------------------------------------
// Sensitive cache
// ---------------------------------------------------------------------------

#[test]
fn sensitive_bytes_are_cached_as_ciphertext() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let mut db = create(&path);
    let id = db.add_data(account("bank", 0, "me", "pin")).unwrap();
    db.close().unwrap();

    let mut db = reopen(&path);
    assert!(!db.index().is_cached(id));
    db.load_sensitive(id).unwrap();
    assert!(db.index().is_cached(id));
    assert_eq!(db.get(id).unwrap().login().unwrap(), "me");

    // Loading again is a no-op.
    db.load_sensitive(id).unwrap();
    assert!(db.get(id).unwrap().is_loaded());
}

#[test]
fn folders_need_no_loading() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let mut db = create(&path);
    let id = db.add_data(folder("Work", 0)).unwrap();
    db.close().unwrap();

    let mut db = reopen(&path);
    assert!(db.get(id).unwrap().is_loaded());
    db.load_sensitive(id).unwrap();
    assert!(!db.index().is_cached(id));
}
