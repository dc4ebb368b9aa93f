use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use ndb::constraints::*;
use ndb::db::*;
use ndb::document::*;
use ndb::error::ndb_string_free;
use ndb::metadata::*;
use ndb::results::*;
use ndb::sources::*;
use ndb::{NdbDocument, NdbHandle, NdbMetadataList, NdbQueryResults};
use tempfile::TempDir;

const NDB_TYPE_BOOL: i32 = 0;
const NDB_TYPE_INT: i32 = 1;
const NDB_TYPE_FLOAT: i32 = 2;
const NDB_TYPE_STR: i32 = 3;
const NDB_OP_GT: i32 = 2;

fn c(s: &str) -> CString {
    CString::new(s).unwrap()
}

/// Reads and releases an error slot, resetting it to null.
fn take_err(err: &mut *mut c_char) -> Option<String> {
    if err.is_null() {
        return None;
    }
    let message = unsafe { CStr::from_ptr(*err) }.to_str().unwrap().to_string();
    unsafe { ndb_string_free(*err) };
    *err = ptr::null_mut();
    Some(message)
}

fn read(p: *const c_char) -> String {
    assert!(!p.is_null());
    unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string()
}

fn open(path: &Path) -> *mut NdbHandle {
    let mut err = ptr::null_mut();
    let db = unsafe { ndb_open(c(path.to_str().unwrap()).as_ptr(), &mut err) };
    assert_eq!(take_err(&mut err), None);
    assert!(!db.is_null());
    db
}

fn new_document(doc_id: &str, chunks: &[&str]) -> *mut NdbDocument {
    let mut err = ptr::null_mut();
    let name = c(&format!("{doc_id}.txt"));
    let id = c(doc_id);
    let doc = unsafe { ndb_document_new(name.as_ptr(), id.as_ptr(), &mut err) };
    assert!(!doc.is_null());
    for chunk in chunks {
        assert!(unsafe { ndb_document_add_chunk(doc, c(chunk).as_ptr(), &mut err) });
    }
    assert_eq!(take_err(&mut err), None);
    doc
}

fn insert(db: *mut NdbHandle, doc: *mut NdbDocument) {
    let mut err = ptr::null_mut();
    let ok = unsafe { ndb_insert(db, doc, &mut err) };
    assert_eq!(take_err(&mut err), None);
    assert!(ok);
    unsafe { ndb_document_free(doc) };
}

fn query(db: *const NdbHandle, text: &str, top_k: usize) -> *mut NdbQueryResults {
    let mut err = ptr::null_mut();
    let results = unsafe { ndb_query(db, c(text).as_ptr(), top_k, &mut err) };
    assert_eq!(take_err(&mut err), None);
    assert!(!results.is_null());
    results
}

#[test]
fn round_trip_through_the_c_surface() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    insert(db, new_document("doc1", &["alpha", "beta"]));

    let results = query(db, "alpha", 1);
    let mut err = ptr::null_mut();
    unsafe {
        assert_eq!(ndb_query_results_len(results), 1);
        assert_eq!(read(ndb_query_results_text(results, 0, &mut err)), "alpha");
        assert_eq!(read(ndb_query_results_doc_id(results, 0, &mut err)), "doc1");
        assert_eq!(read(ndb_query_results_document(results, 0, &mut err)), "doc1.txt");
        assert_eq!(ndb_query_results_doc_version(results, 0, &mut err), 1);
        assert_eq!(ndb_query_results_id(results, 0, &mut err), 0);
        assert!(ndb_query_results_score(results, 0, &mut err) > 0.0);
    }
    assert_eq!(take_err(&mut err), None);

    unsafe {
        ndb_query_results_free(results);
        ndb_close(db);
    }
}

#[test]
fn metadata_of_every_kind_round_trips() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    let doc = new_document("doc1", &["tagged chunk"]);
    let mut err = ptr::null_mut();
    unsafe {
        assert!(ndb_document_set_metadata_bool(doc, 0, c("flag").as_ptr(), true, &mut err));
        assert!(ndb_document_set_metadata_int(doc, 0, c("count").as_ptr(), -7, &mut err));
        assert!(ndb_document_set_metadata_float(doc, 0, c("ratio").as_ptr(), 2.5, &mut err));
        assert!(ndb_document_set_metadata_str(doc, 0, c("lang").as_ptr(), c("en").as_ptr(), &mut err));
    }
    assert_eq!(take_err(&mut err), None);
    insert(db, doc);

    let results = query(db, "tagged", 3);
    let list = unsafe { ndb_query_results_metadata(results, 0, &mut err) };
    assert_eq!(take_err(&mut err), None);
    // The snapshot is independent of the collection it came from.
    unsafe { ndb_query_results_free(results) };

    let len = unsafe { ndb_metadata_list_len(list) };
    assert_eq!(len, 4);
    let mut seen = 0;
    for i in 0..len {
        let key = read(unsafe { ndb_metadata_list_key(list, i, &mut err) });
        let tag = unsafe { ndb_metadata_list_type(list, i, &mut err) };
        unsafe {
            match key.as_str() {
                "flag" => {
                    assert_eq!(tag, NDB_TYPE_BOOL);
                    assert!(ndb_metadata_list_bool(list, i, &mut err));
                }
                "count" => {
                    assert_eq!(tag, NDB_TYPE_INT);
                    assert_eq!(ndb_metadata_list_int(list, i, &mut err), -7);
                }
                "ratio" => {
                    assert_eq!(tag, NDB_TYPE_FLOAT);
                    assert_eq!(ndb_metadata_list_float(list, i, &mut err), 2.5);
                }
                "lang" => {
                    assert_eq!(tag, NDB_TYPE_STR);
                    assert_eq!(read(ndb_metadata_list_str(list, i, &mut err)), "en");
                }
                other => panic!("unexpected key {other}"),
            }
        }
        assert_eq!(take_err(&mut err), None, "key {key}");
        seen += 1;
    }
    assert_eq!(seen, 4);

    unsafe {
        ndb_metadata_list_free(list);
        ndb_close(db);
    }
}

#[test]
fn explicit_version_is_reported() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    let doc = new_document("doc1", &["pinned one", "pinned two"]);
    let mut err = ptr::null_mut();
    assert!(unsafe { ndb_document_set_version(doc, 3, &mut err) });
    assert!(unsafe { ndb_document_set_version(doc, 7, &mut err) });
    insert(db, doc);

    let results = query(db, "pinned", 10);
    let n = unsafe { ndb_query_results_len(results) };
    assert_eq!(n, 2);
    for i in 0..n {
        assert_eq!(unsafe { ndb_query_results_doc_version(results, i, &mut err) }, 7);
    }
    assert_eq!(take_err(&mut err), None);
    unsafe {
        ndb_query_results_free(results);
        ndb_close(db);
    }
}

#[test]
fn scores_are_non_increasing() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    insert(db, new_document("doc1", &["disk disk disk", "disk cache", "cache", "network"]));

    let results = query(db, "disk cache", 10);
    let mut err = ptr::null_mut();
    let n = unsafe { ndb_query_results_len(results) };
    assert_eq!(n, 3);
    let scores: Vec<f32> = (0..n).map(|i| unsafe { ndb_query_results_score(results, i, &mut err) }).collect();
    assert_eq!(take_err(&mut err), None);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
    unsafe {
        ndb_query_results_free(results);
        ndb_close(db);
    }
}

#[test]
fn empty_index_gives_an_empty_collection() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    let results = query(db, "anything", 5);
    assert_eq!(unsafe { ndb_query_results_len(results) }, 0);
    let zero = query(db, "anything", 0);
    assert_eq!(unsafe { ndb_query_results_len(zero) }, 0);
    unsafe {
        ndb_query_results_free(results);
        ndb_query_results_free(zero);
        ndb_close(db);
    }
}

#[test]
fn open_failure_returns_null_and_a_message() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "file").unwrap();
    let path = c(blocker.join("index").to_str().unwrap());

    let mut err = ptr::null_mut();
    let db = unsafe { ndb_open(path.as_ptr(), &mut err) };
    assert!(db.is_null());
    let message = take_err(&mut err).expect("error written");
    assert!(message.starts_with("Failed to open engine:"), "{message}");
}

#[test]
fn out_of_range_accessors_report_errors() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    insert(db, new_document("doc1", &["alpha"]));
    let results = query(db, "alpha", 5);
    let len = unsafe { ndb_query_results_len(results) };
    assert_eq!(len, 1);

    let mut err = ptr::null_mut();
    unsafe {
        assert!(ndb_query_results_text(results, len, &mut err).is_null());
        assert!(take_err(&mut err).unwrap().contains("out of range"));
        assert_eq!(ndb_query_results_id(results, len, &mut err), 0);
        assert!(take_err(&mut err).is_some());
        assert!(ndb_query_results_score(results, len, &mut err).is_nan());
        assert!(take_err(&mut err).is_some());
        assert!(ndb_query_results_metadata(results, len, &mut err).is_null());
        assert!(take_err(&mut err).is_some());

        let list: *mut NdbMetadataList = ndb_query_results_metadata(results, 0, &mut err);
        assert_eq!(take_err(&mut err), None);
        assert_eq!(ndb_metadata_list_len(list), 0);
        assert!(ndb_metadata_list_key(list, 0, &mut err).is_null());
        assert!(take_err(&mut err).unwrap().contains("out of range"));
        assert_eq!(ndb_metadata_list_type(list, 0, &mut err), -1);
        assert!(take_err(&mut err).is_some());

        ndb_metadata_list_free(list);
        ndb_query_results_free(results);
        ndb_close(db);
    }
}

#[test]
fn mismatched_metadata_accessor_reports_type_error() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    let doc = new_document("doc1", &["alpha"]);
    let mut err = ptr::null_mut();
    assert!(unsafe { ndb_document_set_metadata_int(doc, 0, c("n").as_ptr(), 5, &mut err) });
    insert(db, doc);

    let results = query(db, "alpha", 1);
    let list = unsafe { ndb_query_results_metadata(results, 0, &mut err) };
    unsafe {
        assert!(ndb_metadata_list_str(list, 0, &mut err).is_null());
        let message = take_err(&mut err).unwrap();
        assert!(message.contains("expected str, found int"), "{message}");
        assert!(!ndb_metadata_list_bool(list, 0, &mut err));
        assert!(take_err(&mut err).is_some());
        assert!(ndb_metadata_list_float(list, 0, &mut err).is_nan());
        assert!(take_err(&mut err).is_some());
        assert_eq!(ndb_metadata_list_int(list, 0, &mut err), 5);
        assert_eq!(take_err(&mut err), None);

        ndb_metadata_list_free(list);
        ndb_query_results_free(results);
        ndb_close(db);
    }
}

#[test]
fn document_builder_faults() {
    let mut err = ptr::null_mut();
    let doc = new_document("doc1", &["only chunk"]);
    unsafe {
        assert!(!ndb_document_set_metadata_bool(doc, 1, c("k").as_ptr(), true, &mut err));
        assert!(take_err(&mut err).unwrap().contains("Index 1 out of range for length 1"));
        assert!(!ndb_document_add_chunk(doc, ptr::null(), &mut err));
        assert!(take_err(&mut err).unwrap().contains("chunk text is null"));
        assert_eq!(ndb_document_len(doc), 1);

        let bad_utf8 = [0xff_u8, 0xfe, 0x00];
        assert!(!ndb_document_add_chunk(doc, bad_utf8.as_ptr().cast(), &mut err));
        assert!(take_err(&mut err).unwrap().contains("not valid UTF-8"));
        ndb_document_free(doc);

        assert!(ndb_document_new(ptr::null(), c("id").as_ptr(), &mut err).is_null());
        assert!(take_err(&mut err).is_some());
    }
}

#[test]
fn inserted_document_cannot_be_reused() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    let doc = new_document("doc1", &["alpha"]);
    let mut err = ptr::null_mut();
    unsafe {
        assert!(ndb_insert(db, doc, &mut err));
        assert_eq!(ndb_document_len(doc), 0);

        assert!(!ndb_insert(db, doc, &mut err));
        assert!(take_err(&mut err).unwrap().contains("already inserted"));
        assert!(!ndb_document_add_chunk(doc, c("beta").as_ptr(), &mut err));
        assert!(take_err(&mut err).is_some());

        ndb_document_free(doc);
        ndb_close(db);
    }
}

#[test]
fn failed_insert_reports_insert_error() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    let mut err = ptr::null_mut();

    let first = new_document("doc1", &["alpha"]);
    assert!(unsafe { ndb_document_set_version(first, 4, &mut err) });
    insert(db, first);

    let duplicate = new_document("doc1", &["alpha again"]);
    unsafe {
        assert!(ndb_document_set_version(duplicate, 4, &mut err));
        assert!(!ndb_insert(db, duplicate, &mut err));
        ndb_document_free(duplicate);
    }
    let message = take_err(&mut err).unwrap();
    assert!(message.starts_with("Insert failed:"), "{message}");

    let results = query(db, "alpha", 10);
    assert_eq!(unsafe { ndb_query_results_len(results) }, 1);
    unsafe {
        ndb_query_results_free(results);
        ndb_close(db);
    }
}

#[test]
fn null_handles_are_invalid_arguments() {
    let mut err = ptr::null_mut();
    unsafe {
        assert!(ndb_query(ptr::null(), c("x").as_ptr(), 1, &mut err).is_null());
        assert!(take_err(&mut err).unwrap().contains("engine handle is null"));
        assert!(!ndb_save(ptr::null(), c("/tmp").as_ptr(), &mut err));
        assert!(take_err(&mut err).is_some());
        assert!(!ndb_insert(ptr::null_mut(), ptr::null_mut(), &mut err));
        assert!(take_err(&mut err).is_some());
        assert_eq!(ndb_query_results_len(ptr::null()), 0);
        assert!(ndb_query_results_text(ptr::null(), 0, &mut err).is_null());
        assert!(take_err(&mut err).is_some());

        ndb_close(ptr::null_mut());
        ndb_document_free(ptr::null_mut());
        ndb_query_results_free(ptr::null_mut());
        ndb_metadata_list_free(ptr::null_mut());
        ndb_string_free(ptr::null_mut());
    }
}

#[test]
fn constraints_filter_through_the_c_surface() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    let doc = new_document("doc1", &["quarterly report", "quarterly summary"]);
    let mut err = ptr::null_mut();
    unsafe {
        ndb_document_set_metadata_int(doc, 0, c("year").as_ptr(), 2019, &mut err);
        ndb_document_set_metadata_int(doc, 1, c("year").as_ptr(), 2024, &mut err);
    }
    insert(db, doc);

    let set = ndb_constraints_new();
    unsafe {
        assert!(ndb_constraints_add_int(set, c("year").as_ptr(), NDB_OP_GT, 2020, &mut err));
        assert!(!ndb_constraints_add_int(set, c("year").as_ptr(), 9, 2020, &mut err));
        assert!(take_err(&mut err).unwrap().contains("unknown constraint operator 9"));

        let results = ndb_query_with_constraints(db, c("quarterly").as_ptr(), 10, set, &mut err);
        assert_eq!(take_err(&mut err), None);
        assert_eq!(ndb_query_results_len(results), 1);
        assert_eq!(read(ndb_query_results_text(results, 0, &mut err)), "quarterly summary");

        ndb_query_results_free(results);
        ndb_constraints_free(set);
        ndb_close(db);
    }
}

#[test]
fn saved_state_survives_close_and_reopen() {
    let tmp = TempDir::new().unwrap();
    let live = tmp.path().join("live");
    let copy = tmp.path().join("copy");

    let db = open(&live);
    insert(db, new_document("doc1", &["persisted chunk"]));
    insert(db, new_document("doc2", &["transient chunk"]));
    let mut err = ptr::null_mut();
    unsafe {
        assert!(ndb_delete(db, c("doc2").as_ptr(), false, &mut err));
        assert!(ndb_save(db, c(copy.to_str().unwrap()).as_ptr(), &mut err));
        ndb_close(db);
    }
    assert_eq!(take_err(&mut err), None);

    for path in [&live, &copy] {
        let db = open(path);
        let results = query(db, "chunk", 10);
        unsafe {
            assert_eq!(ndb_query_results_len(results), 1);
            assert_eq!(read(ndb_query_results_text(results, 0, &mut err)), "persisted chunk");
            ndb_query_results_free(results);
            ndb_close(db);
        }
    }
}

#[test]
fn sources_list_stored_versions() {
    let tmp = TempDir::new().unwrap();
    let db = open(tmp.path());
    insert(db, new_document("zeta", &["last by name"]));
    insert(db, new_document("alpha", &["first by name"]));
    insert(db, new_document("alpha", &["second version"]));

    let mut err = ptr::null_mut();
    let sources = unsafe { ndb_sources(db, &mut err) };
    assert_eq!(take_err(&mut err), None);
    assert!(!sources.is_null());
    let len = unsafe { ndb_sources_len(sources) };
    assert_eq!(len, 3);

    let listed: Vec<(String, String, u32)> = (0..len)
        .map(|i| unsafe {
            (
                read(ndb_sources_document(sources, i, &mut err)),
                read(ndb_sources_doc_id(sources, i, &mut err)),
                ndb_sources_version(sources, i, &mut err),
            )
        })
        .collect();
    assert_eq!(take_err(&mut err), None);
    assert_eq!(
        listed,
        vec![
            ("alpha.txt".to_string(), "alpha".to_string(), 1),
            ("alpha.txt".to_string(), "alpha".to_string(), 2),
            ("zeta.txt".to_string(), "zeta".to_string(), 1),
        ]
    );

    unsafe {
        assert!(ndb_sources_document(sources, len, &mut err).is_null());
        assert!(take_err(&mut err).unwrap().contains("out of range"));
        assert_eq!(ndb_sources_version(sources, len, &mut err), 0);
        assert!(take_err(&mut err).is_some());

        assert!(ndb_sources(ptr::null(), &mut err).is_null());
        let message = take_err(&mut err).unwrap();
        assert!(message.contains("engine handle is null"), "{message}");
        assert_eq!(ndb_sources_len(ptr::null()), 0);

        ndb_sources_free(sources);
        ndb_sources_free(ptr::null_mut());
        ndb_close(db);
    }
}
