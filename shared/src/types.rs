use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Lenient field decoding
// ============================================================================

/// Booleans arrive as `true`, `1` or `"1"` depending on the endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl BoolLike {
    fn truthy(self) -> bool {
        match self {
            BoolLike::Bool(b) => b,
            BoolLike::Int(n) => n != 0,
            BoolLike::Text(s) => matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        }
    }
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BoolLike>::deserialize(deserializer)?
        .map(BoolLike::truthy)
        .unwrap_or(false))
}

fn flexible_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BoolLike>::deserialize(deserializer)?.map(BoolLike::truthy))
}

/// Text fields that some rows send as `null`.
fn flexible_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Counters arrive as numbers, numeric strings or `null`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CountLike {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CountLike {
    fn count(self) -> u32 {
        let n = match self {
            CountLike::Int(n) => n,
            CountLike::Float(f) if f.is_finite() => f as i64,
            CountLike::Float(_) => 0,
            CountLike::Text(s) => s.trim().parse().unwrap_or(0),
        };
        u32::try_from(n.max(0)).unwrap_or(u32::MAX)
    }
}

fn flexible_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<CountLike>::deserialize(deserializer)?
        .map(CountLike::count)
        .unwrap_or(0))
}

// ============================================================================
// Content Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Announcement,
    CalendarEvent,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Announcement => "announcement",
            ContentKind::CalendarEvent => "calendar_event",
        }
    }
}

/// Identifies one piece of content across both sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey {
    pub kind: ContentKind,
    pub id: i64,
}

impl ContentKey {
    pub fn announcement(id: i64) -> Self {
        Self {
            kind: ContentKind::Announcement,
            id,
        }
    }

    pub fn calendar_event(id: i64) -> Self {
        Self {
            kind: ContentKind::CalendarEvent,
            id,
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

// ============================================================================
// Announcement Types
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementStatus {
    Draft,
    Pending,
    #[default]
    Published,
    Rejected,
    Archived,
    #[serde(other)]
    Unknown,
}

impl AnnouncementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementStatus::Draft => "draft",
            AnnouncementStatus::Pending => "pending",
            AnnouncementStatus::Published => "published",
            AnnouncementStatus::Rejected => "rejected",
            AnnouncementStatus::Archived => "archived",
            AnnouncementStatus::Unknown => "unknown",
        }
    }
}

impl FromStr for AnnouncementStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(AnnouncementStatus::Draft),
            "pending" => Ok(AnnouncementStatus::Pending),
            "published" => Ok(AnnouncementStatus::Published),
            "rejected" => Ok(AnnouncementStatus::Rejected),
            "archived" => Ok(AnnouncementStatus::Archived),
            _ => Err(()),
        }
    }
}

/// Image attached to an announcement or event. Paths are relative to the
/// asset base from [`crate::config::BoardConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub file_path: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    #[serde(default, deserialize_with = "flexible_string")]
    pub title: String,
    #[serde(default, deserialize_with = "flexible_string")]
    pub content: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub subcategory_name: Option<String>,
    #[serde(default)]
    pub grade_level: Option<i32>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub status: AnnouncementStatus,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_alert: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_pinned: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub allow_comments: bool,
    #[serde(default)]
    pub visibility_start_at: Option<String>,
    #[serde(default)]
    pub visibility_end_at: Option<String>,
    #[serde(default, deserialize_with = "flexible_string")]
    pub created_at: String,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default, deserialize_with = "flexible_count")]
    pub reaction_count: u32,
    #[serde(default, deserialize_with = "flexible_opt_bool")]
    pub user_reaction: Option<bool>,
    #[serde(default)]
    pub attachments: Vec<ImageRef>,
}

impl Announcement {
    pub fn key(&self) -> ContentKey {
        ContentKey::announcement(self.id)
    }

    /// Archived and soft-deleted announcements never reach any feed.
    pub fn is_withdrawn(&self) -> bool {
        self.status == AnnouncementStatus::Archived || has_value(&self.deleted_at)
    }
}

// ============================================================================
// Calendar Event Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub calendar_id: i64,
    #[serde(default, deserialize_with = "flexible_string")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "flexible_string")]
    pub event_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_alert: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_holiday: bool,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub allow_comments: bool,
    #[serde(default, deserialize_with = "flexible_count")]
    pub reaction_count: u32,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub user_has_reacted: bool,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

fn default_true() -> bool {
    true
}

impl CalendarEvent {
    pub fn key(&self) -> ContentKey {
        ContentKey::calendar_event(self.calendar_id)
    }

    pub fn is_deleted(&self) -> bool {
        has_value(&self.deleted_at)
    }

    /// Last day of the event; single-day events end on their start date.
    pub fn effective_end(&self) -> &str {
        non_blank(&self.end_date).unwrap_or(&self.event_date)
    }
}

/// Treats `None` and blank strings alike as "unset".
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn has_value(value: &Option<String>) -> bool {
    non_blank(value).is_some()
}

// ============================================================================
// Viewer Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Student => "student",
        }
    }

    pub fn can_control_tv(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "student" => Ok(UserRole::Student),
            _ => Err(()),
        }
    }
}

/// The signed-in user looking at the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user_id: i64,
    pub role: UserRole,
}

// ============================================================================
// Push Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    AnnouncementCreated {
        id: i64,
    },
    AnnouncementUpdated {
        id: i64,
    },
    AnnouncementDeleted {
        id: i64,
    },
    AnnouncementReactionUpdated {
        announcement_id: i64,
        user_id: i64,
        user_role: UserRole,
        reaction_count: u32,
        liked: bool,
    },
    CalendarReactionUpdated {
        event_id: i64,
        user_id: i64,
        user_role: UserRole,
        reaction_count: u32,
        liked: bool,
    },
    CalendarEventChanged {
        id: i64,
    },
    EmergencyBroadcast {
        message: String,
    },
    EmergencyCleared,
}

/// Messages the client sends over the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    Authenticate { token: String },
}

/// Event names as they appear on the wire, used as subscription keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardEventKind {
    AnnouncementCreated,
    AnnouncementUpdated,
    AnnouncementDeleted,
    AnnouncementReactionUpdated,
    CalendarReactionUpdated,
    CalendarEventChanged,
    EmergencyBroadcast,
    EmergencyCleared,
}

impl BoardEventKind {
    /// Events after which the feed sources should be re-pulled.
    pub const CONTENT_CHANGES: [BoardEventKind; 4] = [
        BoardEventKind::AnnouncementCreated,
        BoardEventKind::AnnouncementUpdated,
        BoardEventKind::AnnouncementDeleted,
        BoardEventKind::CalendarEventChanged,
    ];

    pub const REACTIONS: [BoardEventKind; 2] = [
        BoardEventKind::AnnouncementReactionUpdated,
        BoardEventKind::CalendarReactionUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BoardEventKind::AnnouncementCreated => "announcement_created",
            BoardEventKind::AnnouncementUpdated => "announcement_updated",
            BoardEventKind::AnnouncementDeleted => "announcement_deleted",
            BoardEventKind::AnnouncementReactionUpdated => "announcement_reaction_updated",
            BoardEventKind::CalendarReactionUpdated => "calendar_reaction_updated",
            BoardEventKind::CalendarEventChanged => "calendar_event_changed",
            BoardEventKind::EmergencyBroadcast => "emergency_broadcast",
            BoardEventKind::EmergencyCleared => "emergency_cleared",
        }
    }
}

impl FromStr for BoardEventKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "announcement_created" => Ok(BoardEventKind::AnnouncementCreated),
            "announcement_updated" => Ok(BoardEventKind::AnnouncementUpdated),
            "announcement_deleted" => Ok(BoardEventKind::AnnouncementDeleted),
            "announcement_reaction_updated" => Ok(BoardEventKind::AnnouncementReactionUpdated),
            "calendar_reaction_updated" => Ok(BoardEventKind::CalendarReactionUpdated),
            "calendar_event_changed" => Ok(BoardEventKind::CalendarEventChanged),
            "emergency_broadcast" => Ok(BoardEventKind::EmergencyBroadcast),
            "emergency_cleared" => Ok(BoardEventKind::EmergencyCleared),
            _ => Err(()),
        }
    }
}

impl BoardEvent {
    pub fn kind(&self) -> BoardEventKind {
        match self {
            BoardEvent::AnnouncementCreated { .. } => BoardEventKind::AnnouncementCreated,
            BoardEvent::AnnouncementUpdated { .. } => BoardEventKind::AnnouncementUpdated,
            BoardEvent::AnnouncementDeleted { .. } => BoardEventKind::AnnouncementDeleted,
            BoardEvent::AnnouncementReactionUpdated { .. } => {
                BoardEventKind::AnnouncementReactionUpdated
            }
            BoardEvent::CalendarReactionUpdated { .. } => BoardEventKind::CalendarReactionUpdated,
            BoardEvent::CalendarEventChanged { .. } => BoardEventKind::CalendarEventChanged,
            BoardEvent::EmergencyBroadcast { .. } => BoardEventKind::EmergencyBroadcast,
            BoardEvent::EmergencyCleared => BoardEventKind::EmergencyCleared,
        }
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub success: bool,
    #[serde(default)]
    pub reaction_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTimeResponse {
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyBroadcastRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_status_from_str() {
        assert_eq!("published".parse(), Ok(AnnouncementStatus::Published));
        assert_eq!("ARCHIVED".parse(), Ok(AnnouncementStatus::Archived));
        assert_eq!("Draft".parse(), Ok(AnnouncementStatus::Draft));
        assert!("invalid".parse::<AnnouncementStatus>().is_err());
    }

    #[test]
    fn test_user_role_permissions() {
        assert!(UserRole::Admin.can_control_tv());
        assert!(!UserRole::Student.can_control_tv());
        assert_eq!("ADMIN".parse(), Ok(UserRole::Admin));
        assert!("principal".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_announcement_accepts_numeric_flags() {
        let json = r#"{
            "id": 7,
            "title": "Assembly",
            "is_alert": 1,
            "is_pinned": "0",
            "allow_comments": true,
            "status": "published",
            "created_at": "2024-01-01 08:00:00",
            "user_reaction": 1
        }"#;
        let announcement: Announcement = serde_json::from_str(json).unwrap();

        assert!(announcement.is_alert);
        assert!(!announcement.is_pinned);
        assert!(announcement.allow_comments);
        assert_eq!(announcement.user_reaction, Some(true));
        assert_eq!(announcement.reaction_count, 0);
        assert!(announcement.attachments.is_empty());
    }

    #[test]
    fn test_unknown_status_does_not_fail_decoding() {
        let json = r#"{"id": 1, "title": "x", "status": "scheduled"}"#;
        let announcement: Announcement = serde_json::from_str(json).unwrap();
        assert_eq!(announcement.status, AnnouncementStatus::Unknown);
    }

    #[test]
    fn test_withdrawn_announcement() {
        let json = r#"{"id": 1, "title": "x", "deleted_at": "2024-01-01"}"#;
        let deleted: Announcement = serde_json::from_str(json).unwrap();
        assert!(deleted.is_withdrawn());

        let json = r#"{"id": 2, "title": "x", "status": "archived"}"#;
        let archived: Announcement = serde_json::from_str(json).unwrap();
        assert!(archived.is_withdrawn());

        let json = r#"{"id": 3, "title": "x", "deleted_at": ""}"#;
        let live: Announcement = serde_json::from_str(json).unwrap();
        assert!(!live.is_withdrawn());
    }

    #[test]
    fn test_calendar_event_defaults() {
        let json = r#"{"calendar_id": 4, "title": "Field trip", "event_date": "2024-03-01"}"#;
        let event: CalendarEvent = serde_json::from_str(json).unwrap();

        assert!(event.is_active);
        assert!(!event.is_holiday);
        assert_eq!(event.effective_end(), "2024-03-01");
        assert_eq!(event.key(), ContentKey::calendar_event(4));
    }

    #[test]
    fn test_null_fields_stay_inside_their_row() {
        let json = r#"{"items": [
            {"id": 1, "title": "ok", "created_at": "2024-01-01", "reaction_count": "4"},
            {"id": 2, "title": "no date", "created_at": null},
            {"id": 3, "title": null, "created_at": "2024-01-02", "reaction_count": null}
        ], "total": 3}"#;
        let list: ListResponse<Announcement> = serde_json::from_str(json).unwrap();

        assert_eq!(list.items.len(), 3);
        assert_eq!(list.items[0].reaction_count, 4);
        assert_eq!(list.items[1].created_at, "");
        assert_eq!(list.items[2].title, "");
        assert_eq!(list.items[2].reaction_count, 0);

        let json = r#"{"items": [
            {"calendar_id": 1, "title": "Fair", "event_date": "2024-03-01", "reaction_count": 2},
            {"calendar_id": 2, "title": "Drill", "event_date": null, "reaction_count": -1}
        ]}"#;
        let list: ListResponse<CalendarEvent> = serde_json::from_str(json).unwrap();

        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].reaction_count, 2);
        assert_eq!(list.items[1].event_date, "");
        assert_eq!(list.items[1].reaction_count, 0);
    }

    #[test]
    fn test_board_event_wire_format() {
        let json = r#"{
            "type": "announcement_reaction_updated",
            "announcement_id": 3,
            "user_id": 9,
            "user_role": "student",
            "reaction_count": 5,
            "liked": true
        }"#;
        let event: BoardEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), BoardEventKind::AnnouncementReactionUpdated);

        let cleared: BoardEvent = serde_json::from_str(r#"{"type": "emergency_cleared"}"#).unwrap();
        assert_eq!(cleared, BoardEvent::EmergencyCleared);
    }

    #[test]
    fn test_board_event_kind_names() {
        for kind in BoardEventKind::CONTENT_CHANGES
            .iter()
            .chain(BoardEventKind::REACTIONS.iter())
        {
            assert_eq!(kind.as_str().parse(), Ok(*kind));
        }
        assert!("chat_message".parse::<BoardEventKind>().is_err());
    }

    #[test]
    fn test_api_success() {
        let success = ApiSuccess::new("test data");
        assert_eq!(success.data, "test data");
    }
}
