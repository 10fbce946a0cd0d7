//! User profile records
//!
//! # Flag Layout
//!
//! Remote user records carry a raw 32-bit flag word. Only a few bits are
//! read, and two of the bot bits have inverted polarity on the wire:
//!
//! ```text
//! bit 14  set   -> record is a bot (bot info is present)
//! bit 15  set   -> bot has access to chat history
//! bit 16  CLEAR -> bot works with groups
//! bit 17  set   -> verified
//! bit 21  CLEAR -> bot requires geolocation for inline requests
//! ```
//!
//! [`parse_user_flags`] is the only place that reads these bits.
//!
//! Locally the flags are stored in their own, denser layout
//! ([`UserInfoFlags`], [`BotUserInfoFlags`]), which is part of the
//! persisted format.

use std::num::NonZeroI64;

use bitflags::bitflags;
use stockpile_codec::{Coding, CodecError, Decoder, Encoder};

use crate::types::PeerId;

bitflags! {
    /// Stored user flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UserInfoFlags: i32 {
        /// Account is verified
        const VERIFIED = 1 << 0;
    }
}

bitflags! {
    /// Stored bot capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BotUserInfoFlags: i32 {
        /// Bot can read the full chat history
        const HAS_ACCESS_TO_CHAT_HISTORY = 1 << 0;
        /// Bot can be added to groups
        const WORKS_WITH_GROUPS = 1 << 1;
        /// Inline requests to this bot carry the sender's location
        const REQUIRES_GEOLOCATION_FOR_INLINE_REQUESTS = 1 << 2;
    }
}

const RAW_BOT: i32 = 1 << 14;
const RAW_BOT_CHAT_HISTORY: i32 = 1 << 15;
const RAW_BOT_NO_CHATS: i32 = 1 << 16;
const RAW_VERIFIED: i32 = 1 << 17;
const RAW_BOT_INLINE_GEO: i32 = 1 << 21;

/// Convert raw wire flags into stored user flags and optional bot info.
///
/// Bot info is produced only when bit 14 is set; `inline_placeholder` is
/// attached to it and dropped otherwise.
pub fn parse_user_flags(
    raw: i32,
    inline_placeholder: Option<String>,
) -> (UserInfoFlags, Option<BotInfo>) {
    let mut flags = UserInfoFlags::empty();
    if raw & RAW_VERIFIED != 0 {
        flags.insert(UserInfoFlags::VERIFIED);
    }

    if raw & RAW_BOT == 0 {
        return (flags, None);
    }

    let mut bot_flags = BotUserInfoFlags::empty();
    if raw & RAW_BOT_CHAT_HISTORY != 0 {
        bot_flags.insert(BotUserInfoFlags::HAS_ACCESS_TO_CHAT_HISTORY);
    }
    // Inverted on the wire
    if raw & RAW_BOT_NO_CHATS == 0 {
        bot_flags.insert(BotUserInfoFlags::WORKS_WITH_GROUPS);
    }
    // Inverted on the wire
    if raw & RAW_BOT_INLINE_GEO == 0 {
        bot_flags.insert(BotUserInfoFlags::REQUIRES_GEOLOCATION_FOR_INLINE_REQUESTS);
    }

    (
        flags,
        Some(BotInfo {
            flags: bot_flags,
            inline_placeholder,
        }),
    )
}

/// Bot-specific profile data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BotInfo {
    /// Capability flags
    pub flags: BotUserInfoFlags,
    /// Placeholder shown in the input field for inline queries
    pub inline_placeholder: Option<String>,
}

impl Coding for BotInfo {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.encode_i32("f", self.flags.bits());
        encoder.encode_optional_str("ip", self.inline_placeholder.as_deref());
    }

    fn decode(decoder: &Decoder<'_>) -> stockpile_codec::Result<Self> {
        Ok(Self {
            flags: BotUserInfoFlags::from_bits_retain(decoder.decode_i32_or("f", 0)),
            inline_placeholder: decoder.decode_optional_string("ip"),
        })
    }
}

/// One size of a profile photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageRepresentation {
    /// Pixel width
    pub width: i32,
    /// Pixel height
    pub height: i32,
    /// Datacenter holding the file
    pub datacenter_id: i32,
    /// Remote volume id
    pub volume_id: i64,
    /// Id within the volume
    pub local_id: i32,
    /// Access secret
    pub secret: i64,
}

impl Coding for ImageRepresentation {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.encode_i32("w", self.width);
        encoder.encode_i32("h", self.height);
        encoder.encode_i32("dc", self.datacenter_id);
        encoder.encode_i64("v", self.volume_id);
        encoder.encode_i32("l", self.local_id);
        encoder.encode_i64("s", self.secret);
    }

    fn decode(decoder: &Decoder<'_>) -> stockpile_codec::Result<Self> {
        Ok(Self {
            width: decoder.decode_i32_or("w", 0),
            height: decoder.decode_i32_or("h", 0),
            datacenter_id: decoder.decode_i32_or("dc", 0),
            volume_id: decoder.decode_i64_or("v", 0),
            local_id: decoder.decode_i32_or("l", 0),
            secret: decoder.decode_i64_or("s", 0),
        })
    }
}

/// User profile
///
/// A record is authoritative when it carries an access hash. Equality is
/// structural over every field, including photo order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Identity
    pub id: PeerId,
    /// Access credential; zero is not a credential
    pub access_hash: Option<NonZeroI64>,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Public address name
    pub username: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Photo sizes, smallest first
    pub photo: Vec<ImageRepresentation>,
    /// Present for bots
    pub bot_info: Option<BotInfo>,
    /// Stored user flags
    pub flags: UserInfoFlags,
}

impl User {
    /// Empty record for an id; every other field is unset
    pub fn empty(id: PeerId) -> Self {
        Self {
            id,
            access_hash: None,
            first_name: None,
            last_name: None,
            username: None,
            phone: None,
            photo: Vec::new(),
            bot_info: None,
            flags: UserInfoFlags::empty(),
        }
    }

    /// Whether the record carries an access credential
    pub fn is_authoritative(&self) -> bool {
        self.access_hash.is_some()
    }

    /// "First Last", whichever part exists, or an empty string
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }

    /// Name parts used for search indexing: first, last, address name, phone
    pub fn index_name(&self) -> (&str, &str, Option<&str>, Option<&str>) {
        (
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or(""),
            self.username.as_deref(),
            self.phone.as_deref(),
        )
    }

    /// Copy with a different address name
    pub fn with_updated_username(&self, username: Option<String>) -> Self {
        Self {
            username,
            ..self.clone()
        }
    }

    /// Copy with different name parts
    pub fn with_updated_names(&self, first_name: Option<String>, last_name: Option<String>) -> Self {
        Self {
            first_name,
            last_name,
            ..self.clone()
        }
    }

    /// Copy with a different phone number
    pub fn with_updated_phone(&self, phone: String) -> Self {
        Self {
            phone: Some(phone),
            ..self.clone()
        }
    }

    /// Copy with different photo sizes
    pub fn with_updated_photo(&self, photo: Vec<ImageRepresentation>) -> Self {
        Self {
            photo,
            ..self.clone()
        }
    }
}

impl Coding for User {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.encode_i64("i", self.id.to_i64());
        if let Some(access_hash) = self.access_hash {
            encoder.encode_i64("ah", access_hash.get());
        }
        encoder.encode_optional_str("fn", self.first_name.as_deref());
        encoder.encode_optional_str("ln", self.last_name.as_deref());
        encoder.encode_optional_str("un", self.username.as_deref());
        encoder.encode_optional_str("p", self.phone.as_deref());
        encoder.encode_object_array("ph", &self.photo);
        encoder.encode_optional_object("bi", self.bot_info.as_ref());
        encoder.encode_i32("fl", self.flags.bits());
    }

    fn decode(decoder: &Decoder<'_>) -> stockpile_codec::Result<Self> {
        let id = decoder
            .decode_optional_i64("i")
            .ok_or(CodecError::MissingField("i"))?;
        let access_hash = NonZeroI64::new(decoder.decode_i64_or("ah", 0));
        Ok(Self {
            id: PeerId::from_i64(id),
            access_hash,
            first_name: decoder.decode_optional_string("fn"),
            last_name: decoder.decode_optional_string("ln"),
            username: decoder.decode_optional_string("un"),
            phone: decoder.decode_optional_string("p"),
            photo: decoder.decode_object_array("ph")?,
            bot_info: decoder.decode_object("bi")?,
            flags: UserInfoFlags::from_bits_retain(decoder.decode_i32_or("fl", 0)),
        })
    }
}
