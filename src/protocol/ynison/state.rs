//! Player state frames of the Ynison state service.
//!
//! Two shapes travel over the `PutYnisonState` socket:
//!
//! * [`PutYnisonState`] - sent by us, announcing a *shadow* device with an
//!   empty queue. A shadow device is a passive observer: the service
//!   answers with the state of the account's real active device instead
//!   of starting a new playback session.
//! * [`PlayerStateSnapshot`] - the authoritative state broadcast back.
//!
//! The announcement must match what the web player sends, down to the enum
//! literals and the request id, or the service rejects the frame or answers
//! with an empty default state. All of those constants live in this module.
//!
//! # Number Handling
//!
//! The service follows the protobuf JSON mapping: 64-bit integers arrive as
//! strings and fields holding their default value are omitted. Incoming
//! numbers therefore accept both forms and missing scalars default.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use uuid::Uuid;

use super::device::{DeviceId, DeviceIdentity};

/// Queue repeat mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepeatMode {
    None,
    One,
    All,
}

/// Kind of entity a queue was started from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Various,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityContext {
    BasedOnEntityByDefault,
}

/// Whether this update may take over playback from the active device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityInterceptionType {
    DoNotInterceptByDefault,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Web,
}

/// Version stamp attached to the queue and to the playback status.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub device_id: DeviceId,
    pub version: i64,
    pub timestamp_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueOptions {
    pub repeat_mode: RepeatMode,
}

/// The (empty) queue of the shadow device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncedQueue {
    pub current_playable_index: i32,
    pub entity_id: String,
    pub entity_type: EntityType,
    pub playable_list: Vec<serde_json::Value>,
    pub options: QueueOptions,
    pub entity_context: EntityContext,
    pub version: Version,
    pub from_optional: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnouncedStatus {
    pub duration_ms: i64,
    pub paused: bool,
    pub playback_speed: u32,
    pub progress_ms: i64,
    pub version: Version,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncedPlayerState {
    pub player_queue: AnnouncedQueue,
    pub status: AnnouncedStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_be_player: bool,
    pub can_be_remote_controller: bool,
    pub volume_granularity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnouncedDeviceInfo {
    pub device_id: DeviceId,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub title: String,
    pub app_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub volume: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnouncedDevice {
    pub capabilities: Capabilities,
    pub info: AnnouncedDeviceInfo,
    pub volume_info: VolumeInfo,
    pub is_shadow: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFullState {
    pub player_state: AnnouncedPlayerState,
    pub device: AnnouncedDevice,
    pub is_currently_active: bool,
}

/// The client state announcement sent on the state socket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutYnisonState {
    pub update_full_state: UpdateFullState,
    pub rid: Uuid,
    pub player_action_timestamp_ms: i64,
    pub activity_interception_type: ActivityInterceptionType,
}

impl PutYnisonState {
    /// Request correlation id the web player uses for its first update.
    pub const RID: Uuid = Uuid::from_u128(0xac28_1c26_a047_4419_ad00_e4fb_fda1_cba3);

    /// Queue version stamp of the announcement.
    pub const QUEUE_VERSION: i64 = 9_021_243_204_784_341_000;

    /// Playback status version stamp of the announcement.
    pub const STATUS_VERSION: i64 = 8_321_822_175_199_937_000;

    /// Device title shown to other Ynison clients.
    pub const DEVICE_TITLE: &'static str = "Chrome Browser";

    pub const VOLUME_GRANULARITY: u32 = 16;

    /// Builds the announcement of a shadow device with an empty queue.
    ///
    /// `identity` must be the identity used in the protocol header of the
    /// same socket: the service ignores announcements whose device id does
    /// not match.
    #[must_use]
    pub fn shadow(identity: &DeviceIdentity) -> Self {
        let device_id = &identity.device_id;
        let version = |version| Version {
            device_id: device_id.clone(),
            version,
            timestamp_ms: 0,
        };

        Self {
            update_full_state: UpdateFullState {
                player_state: AnnouncedPlayerState {
                    player_queue: AnnouncedQueue {
                        current_playable_index: -1,
                        entity_id: String::new(),
                        entity_type: EntityType::Various,
                        playable_list: Vec::new(),
                        options: QueueOptions {
                            repeat_mode: RepeatMode::None,
                        },
                        entity_context: EntityContext::BasedOnEntityByDefault,
                        version: version(Self::QUEUE_VERSION),
                        from_optional: String::new(),
                    },
                    status: AnnouncedStatus {
                        duration_ms: 0,
                        paused: true,
                        playback_speed: 1,
                        progress_ms: 0,
                        version: version(Self::STATUS_VERSION),
                    },
                },
                device: AnnouncedDevice {
                    capabilities: Capabilities {
                        can_be_player: true,
                        can_be_remote_controller: false,
                        volume_granularity: Self::VOLUME_GRANULARITY,
                    },
                    info: AnnouncedDeviceInfo {
                        device_id: device_id.clone(),
                        device_type: DeviceType::Web,
                        title: Self::DEVICE_TITLE.to_owned(),
                        app_name: identity.info.app_name.clone(),
                    },
                    volume_info: VolumeInfo { volume: 0 },
                    is_shadow: true,
                },
                is_currently_active: false,
            },
            rid: Self::RID,
            player_action_timestamp_ms: 0,
            activity_interception_type: ActivityInterceptionType::DoNotInterceptByDefault,
        }
    }
}

/// Authoritative player state broadcast by the state service.
///
/// Only the parts needed to find the current track are modelled; devices,
/// timestamps and the like are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PlayerStateSnapshot {
    pub player_state: PlayerState,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PlayerState {
    #[serde(default)]
    pub status: Status,
    pub player_queue: PlayerQueue,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub paused: bool,

    #[serde(default)]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub duration_ms: i64,

    #[serde(default)]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub progress_ms: i64,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PlayerQueue {
    /// Index into `playable_list`. May be negative or out of range.
    #[serde(default)]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub current_playable_index: i64,

    #[serde(default)]
    pub entity_id: String,

    /// Kept verbatim: the service knows more entity types than we announce.
    #[serde(default)]
    pub entity_type: String,

    #[serde(default)]
    pub playable_list: Vec<Playable>,
}

impl PlayerQueue {
    /// The entry at `current_playable_index`, if there is one.
    ///
    /// Returns `None` for an empty queue and for an index that is negative
    /// or past the end of the queue: nothing is playing.
    #[must_use]
    pub fn current(&self) -> Option<&Playable> {
        usize::try_from(self.current_playable_index)
            .ok()
            .and_then(|index| self.playable_list.get(index))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Playable {
    pub playable_id: String,

    /// `TRACK`, `LOCAL_TRACK`, `INFINITE`, ...
    #[serde(default)]
    pub playable_type: Option<String>,

    #[serde(default)]
    pub album_id_optional: Option<String>,
}
