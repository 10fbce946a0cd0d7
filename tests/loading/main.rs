//! Collection loading through the engine entry point

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;

fn fetched(state: &LoadState) -> (&CollectionInfo, &[Item], bool) {
    match state {
        LoadState::Result {
            info,
            items,
            installed,
        } => (info, items, *installed),
        other => panic!("expected a result, got {:?}", other),
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn fetching_precedes_cached_result_exactly_once() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    let (info, items) = cats_response().decode();
    stockpile.install_collection(&info, &items).unwrap();

    let load = Recorder::start(&stockpile.load_collection(by_id(7)));
    let states = load.values();

    assert_eq!(states.len(), 2);
    assert_eq!(states[0], LoadState::Fetching);
    assert_eq!(
        states.iter().filter(|s| **s == LoadState::Fetching).count(),
        1
    );
    let (stored, stored_items, installed) = fetched(&states[1]);
    assert_eq!(stored, &info);
    assert_eq!(stored_items, items.as_slice());
    assert!(installed);
    assert!(remote.requests().is_empty());
}

#[test]
fn empty_response_for_unknown_id() {
    let remote = FakeRemote::new();
    remote.answer(
        InputCollection::Id {
            id: 42,
            access_hash: 0,
        },
        None,
    );
    let stockpile = stockpile_with(&remote);

    let load = Recorder::start(&stockpile.load_collection(by_id(42)));

    assert_eq!(load.values(), vec![LoadState::Fetching, LoadState::Empty]);
    assert!(load.is_completed());
    assert_eq!(stockpile.store().version(), 0);
}

#[test]
fn remote_failure_ends_empty() {
    let remote = FakeRemote::new();
    remote.fail(
        InputCollection::ShortName("dogs".to_string()),
        RemoteError::Transport("connection reset".to_string()),
    );
    let stockpile = stockpile_with(&remote);

    let load = Recorder::start(&stockpile.load_collection(by_name("dogs")));
    assert_eq!(load.values(), vec![LoadState::Fetching, LoadState::Empty]);
    assert!(load.errors().is_empty());
}

#[test]
fn loading_is_lazy() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);

    let signal = stockpile.load_collection(by_name("cats"));
    assert!(remote.requests().is_empty());

    let _load = Recorder::start(&signal);
    let _again = Recorder::start(&signal);
    assert_eq!(remote.requests().len(), 2);
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn labels_attach_by_item_id() {
    let remote = FakeRemote::new();
    remote.answer(
        InputCollection::ShortName("cats".to_string()),
        Some(cats_response()),
    );
    let stockpile = stockpile_with(&remote);

    let load = Recorder::start(&stockpile.load_collection(by_name("cats")));
    let states = load.values();
    let (info, items, installed) = fetched(&states[1]);

    assert_eq!(info.short_name, "cats");
    assert_eq!(
        info.id.namespace,
        namespaces::item_collection::CLOUD_STICKER_PACKS
    );
    assert!(!installed);

    let meow = LabelKey::from("meow");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].labels, vec![meow.clone()]);
    assert_eq!(items[1].labels, vec![meow]);
    assert!(items[2].labels.is_empty());
}

#[test]
fn labels_follow_ids_not_positions() {
    let response = CollectionResponse {
        set: sticker_set(9, "mixed", 0, 3),
        packs: vec![pack("woof", &[302]), pack("meow", &[300, 302])],
        documents: vec![document(300), document(301), document(302)],
    };
    let (_, items) = response.decode();

    assert_eq!(items[0].labels, vec![LabelKey::from("meow")]);
    assert!(items[1].labels.is_empty());
    assert_eq!(
        items[2].labels,
        vec![LabelKey::from("woof"), LabelKey::from("meow")]
    );
}

#[test]
fn undecodable_documents_take_no_ordinal() {
    let response = CollectionResponse {
        set: sticker_set(9, "gaps", STICKER_SET_FLAG_MASKS, 3),
        packs: vec![],
        documents: vec![document(1), ApiDocument::Empty { id: 2 }, document(3)],
    };
    let (info, items) = response.decode();

    assert_eq!(info.id.namespace, namespaces::item_collection::CLOUD_MASK_PACKS);
    let ordinals: Vec<(i32, i64)> = items.iter().map(|i| (i.index.index, i.index.id)).collect();
    assert_eq!(ordinals, vec![(0, 1), (1, 3)]);
}

// ============================================================================
// Installation
// ============================================================================

#[test]
fn installing_flips_installed() {
    let remote = FakeRemote::new();
    remote.answer(
        InputCollection::ShortName("cats".to_string()),
        Some(cats_response()),
    );
    let stockpile = stockpile_with(&remote);
    let load = Recorder::start(&stockpile.load_collection(by_name("cats")));
    assert!(!fetched(&load.values()[1]).2);

    let (info, items) = cats_response().decode();
    stockpile.install_collection(&info, &items).unwrap();
    let states = load.values();
    assert_eq!(states.len(), 3);
    assert!(fetched(&states[2]).2);

    assert!(stockpile.uninstall_collection(info.id).unwrap());
    let states = load.values();
    assert_eq!(states.len(), 4);
    let (shown, shown_items, installed) = fetched(&states[3]);
    assert!(!installed);
    assert_eq!(shown, &info);
    assert_eq!(shown_items.len(), 3);
}

#[test]
fn by_name_load_reports_installed_collection() {
    let remote = FakeRemote::new();
    remote.answer(
        InputCollection::ShortName("cats".to_string()),
        Some(cats_response()),
    );
    let stockpile = stockpile_with(&remote);
    let (info, items) = cats_response().decode();
    stockpile.install_collection(&info, &items).unwrap();

    let load = Recorder::start(&stockpile.load_collection(by_name("cats")));

    assert_eq!(remote.requests().len(), 1);
    assert!(fetched(&load.values()[1]).2);
}

#[test]
fn cached_load_follows_reinstall() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    let (info, items) = cats_response().decode();
    stockpile.install_collection(&info, &items).unwrap();

    let load = Recorder::start(&stockpile.load_collection(by_id(7)));
    stockpile.install_collection(&info, &items[..1]).unwrap();

    let states = load.values();
    assert_eq!(states.len(), 3);
    assert_eq!(fetched(&states[2]).1.len(), 1);
}

#[test]
fn search_finds_installed_labels() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    let (info, items) = cats_response().decode();
    stockpile.install_collection(&info, &items).unwrap();

    let found = stockpile.search_items(&LabelKey::from("meow")).unwrap();
    let ids: Vec<i64> = found.iter().map(|i| i.index.id).collect();
    assert_eq!(ids, vec![100, 101]);

    stockpile.uninstall_collection(info.id).unwrap();
    assert!(stockpile.search_items(&LabelKey::from("meow")).unwrap().is_empty());
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn dispose_before_response_delivers_nothing() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);

    let load = Recorder::start(&stockpile.load_collection(by_name("cats")));
    assert_eq!(load.values(), vec![LoadState::Fetching]);
    assert_eq!(remote.pending_count(), 1);

    load.dispose();
    let was_cancelled = remote.respond(Some(cats_response()));

    assert!(was_cancelled);
    assert_eq!(load.values(), vec![LoadState::Fetching]);
    assert_eq!(stockpile.store().version(), 0);
    assert_eq!(stockpile.store().stats().observers, 0);
}

#[test]
fn late_response_after_dispose_ignores_later_installs() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);

    let load = Recorder::start(&stockpile.load_collection(by_name("cats")));
    remote.respond(Some(cats_response()));
    assert_eq!(load.values().len(), 2);

    load.dispose();
    let (info, items) = cats_response().decode();
    stockpile.install_collection(&info, &items).unwrap();
    assert_eq!(load.values().len(), 2);
}

// ============================================================================
// Store failures
// ============================================================================

#[test]
fn busy_store_fails_try_load() {
    let remote = FakeRemote::new();
    let store = Store::with_timeout(Duration::from_millis(20));
    let stockpile = Stockpile::new(
        store.clone(),
        Arc::clone(&remote) as Arc<dyn RemoteService>,
        Arc::new(ImmediateScheduler),
    );

    let (strict, lenient) = store
        .transaction(|_txn| {
            let strict = Recorder::start(&stockpile.try_load_collection(by_id(1)));
            let lenient = Recorder::start(&stockpile.load_collection(by_id(1)));
            Ok((strict, lenient))
        })
        .unwrap();

    assert_eq!(strict.values(), vec![LoadState::Fetching]);
    let errors = strict.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_unavailable());

    assert_eq!(lenient.values(), vec![LoadState::Fetching, LoadState::Empty]);
    assert!(lenient.is_completed());
    assert!(remote.requests().is_empty());
}

#[test]
fn closed_store_fails_try_load() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    stockpile.close();

    let load = Recorder::start(&stockpile.try_load_collection(by_name("cats")));
    assert_eq!(load.values(), vec![LoadState::Fetching]);
    assert!(matches!(
        load.errors().as_slice(),
        [StoreError::StoreUnavailable(_)]
    ));
}

#[test]
fn closed_store_load_reports_fetching_then_empty() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    stockpile.close();

    let load = Recorder::start(&stockpile.load_collection(by_id(42)));
    assert_eq!(load.values(), vec![LoadState::Fetching, LoadState::Empty]);
    assert!(load.is_completed());
    assert!(remote.requests().is_empty());
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn slot_applies_values_on_frames() {
    let remote = FakeRemote::new();
    remote.answer(
        InputCollection::ShortName("cats".to_string()),
        Some(cats_response()),
    );
    let scheduler = Arc::new(ManualScheduler::new());
    let stockpile = Stockpile::new(
        Store::new(),
        Arc::clone(&remote) as Arc<dyn RemoteService>,
        scheduler.clone(),
    );

    let slot = stockpile.collection_slot(by_name("cats"));
    assert!(slot.contents().is_none());
    assert!(scheduler.has_pending_frame());

    // Both states were queued within one frame
    assert_eq!(scheduler.advance_frame(), 2);
    assert!(matches!(slot.contents(), Some(LoadState::Result { .. })));

    let (info, items) = cats_response().decode();
    stockpile.install_collection(&info, &items).unwrap();
    assert!(!fetched(&slot.contents().unwrap()).2);
    scheduler.advance_frame();
    assert!(fetched(&slot.contents().unwrap()).2);
}
