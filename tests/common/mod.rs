//! Shared test utilities for all integration test suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

use parking_lot::Mutex;
pub use stockpile::*;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Install a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// FakeRemote - controllable remote service
// ============================================================================

type CollectionAnswer = std::result::Result<Option<CollectionResponse>, RemoteError>;

/// A collection request the fake has not answered yet
struct PendingRequest {
    subscriber: Arc<Subscriber<Option<CollectionResponse>, RemoteError>>,
    cancelled: Arc<AtomicBool>,
}

#[derive(Default)]
struct FakeState {
    answers: Vec<(InputCollection, CollectionAnswer)>,
    users: Vec<ApiUser>,
    requests: Vec<InputCollection>,
    user_requests: Vec<Vec<i32>>,
    pending: Vec<PendingRequest>,
}

/// Remote service answering from canned responses.
///
/// Inputs with a canned answer are answered synchronously when the request
/// starts. Other inputs stay pending until [`FakeRemote::respond`].
#[derive(Default)]
pub struct FakeRemote {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `input` with `response` from now on
    pub fn answer(&self, input: InputCollection, response: Option<CollectionResponse>) {
        self.state.lock().answers.push((input, Ok(response)));
    }

    /// Fail requests for `input` from now on
    pub fn fail(&self, input: InputCollection, error: RemoteError) {
        self.state.lock().answers.push((input, Err(error)));
    }

    /// Users available to user requests
    pub fn answer_users(&self, users: Vec<ApiUser>) {
        self.state.lock().users = users;
    }

    /// Every collection request started so far
    pub fn requests(&self) -> Vec<InputCollection> {
        self.state.lock().requests.clone()
    }

    /// Every user request started so far
    pub fn user_requests(&self) -> Vec<Vec<i32>> {
        self.state.lock().user_requests.clone()
    }

    /// Number of unanswered requests
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Answer the oldest pending request. Returns whether its requester
    /// had already cancelled.
    pub fn respond(&self, response: Option<CollectionResponse>) -> bool {
        let request = self.state.lock().pending.remove(0);
        request.subscriber.put_next(response);
        request.subscriber.put_completion();
        request.cancelled.load(Ordering::SeqCst)
    }
}

impl RemoteService for FakeRemote {
    fn get_collection(
        &self,
        input: InputCollection,
    ) -> Signal<Option<CollectionResponse>, RemoteError> {
        let state = Arc::clone(&self.state);
        Signal::new(move |subscriber| {
            let answer = {
                let mut state = state.lock();
                state.requests.push(input.clone());
                state
                    .answers
                    .iter()
                    .rev()
                    .find(|(known, _)| *known == input)
                    .map(|(_, answer)| answer.clone())
            };
            match answer {
                Some(Ok(response)) => {
                    subscriber.put_next(response);
                    subscriber.put_completion();
                    Arc::new(EmptyDisposable) as Arc<dyn Disposable>
                }
                Some(Err(e)) => {
                    subscriber.put_error(e);
                    Arc::new(EmptyDisposable) as Arc<dyn Disposable>
                }
                None => {
                    let cancelled = Arc::new(AtomicBool::new(false));
                    state.lock().pending.push(PendingRequest {
                        subscriber,
                        cancelled: Arc::clone(&cancelled),
                    });
                    Arc::new(ActionDisposable::new(move || {
                        cancelled.store(true, Ordering::SeqCst)
                    })) as Arc<dyn Disposable>
                }
            }
        })
    }

    fn get_users(&self, ids: Vec<i32>) -> Signal<Vec<ApiUser>, RemoteError> {
        let state = Arc::clone(&self.state);
        Signal::new(move |subscriber| {
            let users = {
                let mut state = state.lock();
                state.user_requests.push(ids.clone());
                state
                    .users
                    .iter()
                    .filter(|user| ids.contains(&user.peer_id().id))
                    .cloned()
                    .collect()
            };
            subscriber.put_next(users);
            subscriber.put_completion();
            Arc::new(EmptyDisposable) as Arc<dyn Disposable>
        })
    }
}

// ============================================================================
// Recorder - collects everything a signal delivers
// ============================================================================

/// Values, errors and completion observed on one subscription
pub struct Recorder<T, E> {
    values: Arc<Mutex<Vec<T>>>,
    errors: Arc<Mutex<Vec<E>>>,
    completed: Arc<AtomicBool>,
    handle: Arc<dyn Disposable>,
}

impl<T: Clone + Send + 'static, E: Clone + Send + 'static> Recorder<T, E> {
    /// Start `signal` and record what it delivers
    pub fn start(signal: &Signal<T, E>) -> Self {
        let values = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::new(AtomicBool::new(false));
        let (v, e, c) = (
            Arc::clone(&values),
            Arc::clone(&errors),
            Arc::clone(&completed),
        );
        let handle = signal.start(
            move |value| v.lock().push(value),
            move |error| e.lock().push(error),
            move || c.store(true, Ordering::SeqCst),
        );
        Self {
            values,
            errors,
            completed,
            handle,
        }
    }

    pub fn values(&self) -> Vec<T> {
        self.values.lock().clone()
    }

    pub fn errors(&self) -> Vec<E> {
        self.errors.lock().clone()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn dispose(&self) {
        self.handle.dispose();
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn sticker_set(id: i64, short_name: &str, flags: i32, count: i32) -> ApiStickerSet {
    ApiStickerSet {
        flags,
        id,
        access_hash: id * 10,
        title: short_name.to_uppercase(),
        short_name: short_name.to_string(),
        count,
        hash: 0,
    }
}

pub fn document(id: i64) -> ApiDocument {
    ApiDocument::Document {
        id,
        access_hash: id + 1,
        mime_type: "image/webp".to_string(),
        size: 512,
        file_name: Some(format!("{}.webp", id)),
    }
}

pub fn pack(emoticon: &str, documents: &[i64]) -> ApiStickerPack {
    ApiStickerPack {
        emoticon: emoticon.to_string(),
        documents: documents.to_vec(),
    }
}

/// The "cats" collection: three documents, the first two labelled "meow"
pub fn cats_response() -> CollectionResponse {
    CollectionResponse {
        set: sticker_set(7, "cats", 0, 3),
        packs: vec![pack("meow", &[100, 101])],
        documents: vec![document(100), document(101), document(102)],
    }
}

pub fn by_id(id: i64) -> Reference {
    Reference::Id { id, access_hash: 0 }
}

pub fn by_name(name: &str) -> Reference {
    Reference::Name(name.to_string())
}

/// Engine over a fresh store, answering from `remote`
pub fn stockpile_with(remote: &Arc<FakeRemote>) -> Stockpile {
    init_tracing();
    Stockpile::new(
        Store::new(),
        Arc::clone(remote) as Arc<dyn RemoteService>,
        Arc::new(ImmediateScheduler),
    )
}

pub fn api_user(id: i32, access_hash: Option<i64>, flags: i32, username: Option<&str>) -> ApiUser {
    ApiUser::User {
        flags,
        id,
        access_hash,
        first_name: Some(format!("First{}", id)),
        last_name: Some(format!("Last{}", id)),
        username: username.map(str::to_string),
        phone: Some(format!("555{:04}", id)),
        photo: None,
        bot_inline_placeholder: None,
    }
}
