//! Remote user updates applied through the engine entry point

#[path = "../common/mod.rs"]
mod common;

use std::num::NonZeroI64;

use common::*;
use proptest::prelude::*;

const BOT: i32 = 1 << 14;
const BOT_HISTORY: i32 = 1 << 15;
const BOT_NO_GROUPS: i32 = 1 << 16;
const VERIFIED: i32 = 1 << 17;
const BOT_NO_GEO: i32 = 1 << 21;

fn peer(id: i32) -> PeerId {
    PeerId::new(namespaces::peer::CLOUD_USER, id)
}

#[test]
fn inverted_bot_bits() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);

    let stored = stockpile
        .apply_remote_users(&[api_user(1, Some(5), BOT | BOT_HISTORY, None)])
        .unwrap();
    let bot = stored[0].bot_info.clone().unwrap();
    assert_eq!(
        bot.flags,
        BotUserInfoFlags::HAS_ACCESS_TO_CHAT_HISTORY
            | BotUserInfoFlags::WORKS_WITH_GROUPS
            | BotUserInfoFlags::REQUIRES_GEOLOCATION_FOR_INLINE_REQUESTS
    );

    let stored = stockpile
        .apply_remote_users(&[api_user(1, Some(5), BOT | BOT_NO_GROUPS | BOT_NO_GEO, None)])
        .unwrap();
    assert_eq!(stored[0].bot_info.clone().unwrap().flags, BotUserInfoFlags::empty());
}

#[test]
fn non_bot_ignores_bot_bits() {
    let (flags, bot) = parse_user_flags(VERIFIED | BOT_HISTORY, None);
    assert_eq!(flags, UserInfoFlags::VERIFIED);
    assert!(bot.is_none());
}

#[test]
fn partial_update_keeps_identity_and_contact() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    stockpile
        .apply_remote_users(&[api_user(3, Some(33), VERIFIED, Some("old"))])
        .unwrap();

    let partial = ApiUser::User {
        flags: 0,
        id: 3,
        access_hash: None,
        first_name: Some("Other".to_string()),
        last_name: None,
        username: Some("new".to_string()),
        phone: None,
        photo: None,
        bot_inline_placeholder: None,
    };
    stockpile.apply_remote_users(&[partial]).unwrap();

    let user = stockpile.peer(peer(3)).unwrap().unwrap();
    assert_eq!(user.username.as_deref(), Some("new"));
    assert_eq!(user.access_hash, NonZeroI64::new(33));
    assert_eq!(user.first_name.as_deref(), Some("First3"));
    assert_eq!(user.phone.as_deref(), Some("5550003"));
    // Flags come from the update, not the stored record
    assert_eq!(user.flags, UserInfoFlags::empty());
}

#[test]
fn partial_update_without_name_keeps_stored_name() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    stockpile
        .apply_remote_users(&[api_user(4, Some(44), 0, Some("keep"))])
        .unwrap();
    stockpile
        .apply_remote_users(&[api_user(4, None, 0, None)])
        .unwrap();

    let user = stockpile.peer(peer(4)).unwrap().unwrap();
    assert_eq!(user.username.as_deref(), Some("keep"));
}

#[test]
fn partial_update_without_base_is_fabricated() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    let stored = stockpile
        .apply_remote_users(&[api_user(6, None, 0, Some("fresh"))])
        .unwrap();

    assert_eq!(stored[0].access_hash, None);
    assert_eq!(stored[0].username.as_deref(), Some("fresh"));
    assert_eq!(stockpile.peer(peer(6)).unwrap(), Some(stored[0].clone()));
}

#[test]
fn zero_credential_user_survives_store_round_trip() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    let stored = stockpile
        .apply_remote_users(&[api_user(13, Some(0), VERIFIED, Some("zero"))])
        .unwrap();

    assert!(!stored[0].is_authoritative());
    let reread = stockpile.peer(peer(13)).unwrap().unwrap();
    assert_eq!(reread, stored[0]);
    assert_eq!(decode_from_slice::<User>(&encode_to_vec(&reread)).unwrap(), reread);
}

#[test]
fn stored_user_survives_codec() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);
    let stored = stockpile
        .apply_remote_users(&[
            api_user(8, Some(1), BOT, Some("bot")),
            ApiUser::Empty { id: 9 },
        ])
        .unwrap();

    for user in &stored {
        let bytes = encode_to_vec(user);
        assert_eq!(&decode_from_slice::<User>(&bytes).unwrap(), user);
    }
    assert_eq!(stockpile.peer(peer(9)).unwrap(), Some(User::empty(peer(9))));
}

#[test]
fn refresh_users_stores_remote_answer() {
    let remote = FakeRemote::new();
    remote.answer_users(vec![
        api_user(10, Some(100), 0, Some("ten")),
        api_user(11, Some(110), 0, Some("eleven")),
    ]);
    let stockpile = stockpile_with(&remote);

    let refresh = Recorder::start(&stockpile.refresh_users(vec![10]));
    let emitted = refresh.values();

    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].len(), 1);
    assert_eq!(remote.user_requests(), vec![vec![10]]);
    assert!(refresh.is_completed());
    assert!(stockpile.peer(peer(10)).unwrap().is_some());
    assert!(stockpile.peer(peer(11)).unwrap().is_none());
}

#[test]
fn refresh_with_no_ids_skips_remote() {
    let remote = FakeRemote::new();
    let stockpile = stockpile_with(&remote);

    let refresh = Recorder::start(&stockpile.refresh_users(Vec::new()));
    assert_eq!(refresh.values(), vec![Vec::<User>::new()]);
    assert!(remote.user_requests().is_empty());
}

proptest! {
    #[test]
    fn applying_partial_update_twice_equals_once(
        flags in any::<i32>(),
        username in proptest::option::of("[a-z]{1,8}"),
    ) {
        let remote = FakeRemote::new();
        let stockpile = stockpile_with(&remote);
        stockpile
            .apply_remote_users(&[api_user(12, Some(120), VERIFIED, Some("base"))])
            .unwrap();

        let update = api_user(12, None, flags, username.as_deref());
        let once = stockpile.apply_remote_users(&[update.clone()]).unwrap();
        let twice = stockpile.apply_remote_users(&[update]).unwrap();
        prop_assert_eq!(once, twice);
    }
}
