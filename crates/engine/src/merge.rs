//! Reconciling remote user updates with stored records
//!
//! The remote sends two kinds of user updates:
//! - authoritative: carries a nonzero access credential and every field; it
//!   replaces the stored record outright
//! - partial: no credential, or a zero one; only the address name and the capability
//!   flags are meaningful
//!
//! A partial update never touches identity, credential, names, phone or
//! photo of an existing record. Flags and bot info are recomputed from the
//! update's raw flags on every merge, so merging is idempotent.

use stockpile_core::{parse_user_flags, User};
use tracing::debug;

use crate::remote::ApiUser;

/// Merge `update` into `existing`, producing the record to store.
pub fn merge_user(existing: Option<&User>, update: &ApiUser) -> User {
    match update {
        ApiUser::Empty { .. } => update.to_user(),
        ApiUser::User { .. } if update.credential().is_some() => update.to_user(),
        ApiUser::User {
            flags,
            username,
            bot_inline_placeholder,
            ..
        } => match existing {
            Some(existing) => {
                let (flags, bot_info) = parse_user_flags(*flags, bot_inline_placeholder.clone());
                debug!(
                    target: "stockpile::merge",
                    peer = %existing.id,
                    username_updated = username.is_some(),
                    "partial user update over stored record"
                );
                User {
                    username: username.clone().or_else(|| existing.username.clone()),
                    bot_info,
                    flags,
                    ..existing.clone()
                }
            }
            None => {
                debug!(target: "stockpile::merge", peer = %update.peer_id(), "partial user update without stored record");
                update.to_user()
            }
        },
    }
}
