use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Event Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Appointment,
    Activity,
    School,
    Birthday,
    Meeting,
    Playdate,
    Vacation,
    Reminder,
    Task,
    General,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Appointment => "appointment",
            EventType::Activity => "activity",
            EventType::School => "school",
            EventType::Birthday => "birthday",
            EventType::Meeting => "meeting",
            EventType::Playdate => "playdate",
            EventType::Vacation => "vacation",
            EventType::Reminder => "reminder",
            EventType::Task => "task",
            EventType::General => "general",
        }
    }
}

impl FromStr for EventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "appointment" => Ok(EventType::Appointment),
            "activity" => Ok(EventType::Activity),
            "school" => Ok(EventType::School),
            "birthday" => Ok(EventType::Birthday),
            "meeting" => Ok(EventType::Meeting),
            "playdate" => Ok(EventType::Playdate),
            "vacation" => Ok(EventType::Vacation),
            "reminder" => Ok(EventType::Reminder),
            "task" => Ok(EventType::Task),
            "general" => Ok(EventType::General),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Confirmed => "confirmed",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for EventStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" => Ok(EventStatus::Confirmed),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// Denormalized attendee reference carried on an event (not a foreign key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
}

/// Denormalized link to a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub family_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_type: EventType,
    pub status: EventStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// IANA timezone label the instants were entered in (e.g. "Europe/Berlin").
    pub timezone: String,
    pub child_id: Option<Uuid>,
    pub child_name: Option<String>,
    pub attending_parent_id: Option<Uuid>,
    pub attendees: Vec<Attendee>,
    pub linked_documents: Vec<DocumentRef>,
    pub created_by: Uuid,
    pub last_modified_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The closed set of date/time input shapes accepted by event creation.
///
/// Clients historically sent three shapes: an RFC3339/ISO string, a split
/// date + optional time, and a `{seconds, nanoseconds}` wrapper from the
/// previous storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateTimeInput {
    Iso(String),
    LegacyTimestamp { seconds: i64, nanoseconds: u32 },
    Parts { date: NaiveDate, time: Option<NaiveTime> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_type: Option<EventType>,
    pub start: DateTimeInput,
    pub end: Option<DateTimeInput>,
    /// IANA timezone label; server default applies when absent.
    pub timezone: Option<String>,
    pub child_id: Option<Uuid>,
    pub child_name: Option<String>,
    pub attending_parent_id: Option<Uuid>,
    pub attendees: Option<Vec<Attendee>>,
    pub linked_documents: Option<Vec<DocumentRef>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub start: Option<DateTimeInput>,
    pub end: Option<DateTimeInput>,
    pub timezone: Option<String>,
    pub child_id: Option<Uuid>,
    pub child_name: Option<String>,
    pub attending_parent_id: Option<Uuid>,
    pub attendees: Option<Vec<Attendee>>,
    pub linked_documents: Option<Vec<DocumentRef>>,
}

/// Optional post-filters applied to range queries and feed subscriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilters {
    pub child_id: Option<Uuid>,
    pub event_type: Option<EventType>,
}

impl EventFilters {
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(child_id) = self.child_id {
            if event.child_id != Some(child_id) {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        true
    }
}

/// Delta delivered alongside every feed snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventChanges {
    pub added: Vec<Event>,
    pub modified: Vec<Event>,
    pub removed: Vec<Uuid>,
}

// ============================================================================
// Event Feed Protocol (WebSocket)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedClientMessage {
    Subscribe {
        family_id: Uuid,
        #[serde(default)]
        filters: EventFilters,
        range_start: Option<DateTime<Utc>>,
        range_end: Option<DateTime<Utc>>,
    },
    Unsubscribe,
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedServerMessage {
    Subscribed {
        family_id: Uuid,
    },
    Update {
        snapshot: Vec<Event>,
        changes: EventChanges,
    },
    Unsubscribed,
    Pong,
    Error {
        code: String,
        message: String,
    },
}

// ============================================================================
// Chore Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Anytime,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Anytime => "anytime",
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" => Ok(TimeOfDay::Morning),
            "afternoon" => Ok(TimeOfDay::Afternoon),
            "evening" => Ok(TimeOfDay::Evening),
            "anytime" => Ok(TimeOfDay::Anytime),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
    Weekdays,
    AsNeeded,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Weekdays => "weekdays",
            Recurrence::AsNeeded => "as_needed",
        }
    }
}

impl FromStr for Recurrence {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "weekdays" => Ok(Recurrence::Weekdays),
            "as_needed" | "asneeded" => Ok(Recurrence::AsNeeded),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreTemplate {
    pub id: Uuid,
    pub family_id: Uuid,
    pub title: String,
    pub description: String,
    pub time_of_day: TimeOfDay,
    pub bucks_reward: i64,
    pub required: bool,
    pub recurrence: Recurrence,
    /// Explicit day-of-week set (0 = Sunday .. 6 = Saturday) overriding the
    /// recurrence default.
    pub days_of_week: Option<Vec<u8>>,
    pub assigned_child_ids: Vec<Uuid>,
    pub icon_url: Option<String>,
    pub active: bool,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChoreTemplateRequest {
    pub title: String,
    pub description: Option<String>,
    pub time_of_day: TimeOfDay,
    pub bucks_reward: i64,
    pub required: Option<bool>,
    pub recurrence: Recurrence,
    pub days_of_week: Option<Vec<u8>>,
    pub assigned_child_ids: Option<Vec<Uuid>>,
    pub icon_url: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChoreTemplateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_of_day: Option<TimeOfDay>,
    pub bucks_reward: Option<i64>,
    pub required: Option<bool>,
    pub recurrence: Option<Recurrence>,
    pub days_of_week: Option<Vec<u8>>,
    pub assigned_child_ids: Option<Vec<Uuid>>,
    pub icon_url: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreSchedule {
    pub id: Uuid,
    pub family_id: Uuid,
    pub template_id: Uuid,
    pub child_id: Uuid,
    /// Concrete day-of-week set (0 = Sunday .. 6 = Saturday).
    pub days_of_week: Vec<u8>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoreStatus {
    Pending,
    Completed,
    Approved,
    Rejected,
}

impl ChoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChoreStatus::Pending => "pending",
            ChoreStatus::Completed => "completed",
            ChoreStatus::Approved => "approved",
            ChoreStatus::Rejected => "rejected",
        }
    }

    /// Completed and approved both count as done; chores are auto-approved
    /// and paid on completion, approval is only revisited on rejection.
    pub fn is_done(&self) -> bool {
        matches!(self, ChoreStatus::Completed | ChoreStatus::Approved)
    }
}

impl FromStr for ChoreStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ChoreStatus::Pending),
            "completed" => Ok(ChoreStatus::Completed),
            "approved" => Ok(ChoreStatus::Approved),
            "rejected" => Ok(ChoreStatus::Rejected),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreInstance {
    pub id: Uuid,
    pub family_id: Uuid,
    pub template_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub child_id: Uuid,
    pub date: NaiveDate,
    pub status: ChoreStatus,
    /// Actual bucks credited; may diverge from the template default through
    /// manual adjustment.
    pub bucks_awarded: i64,
    pub mood: Option<String>,
    pub effort: Option<i32>,
    pub photo_url: Option<String>,
    pub note: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteChoreRequest {
    pub mood: Option<String>,
    pub effort: Option<i32>,
    pub photo_url: Option<String>,
    pub note: Option<String>,
    /// Overrides the template's bucks value for this completion.
    pub bucks_override: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreInstanceWithTemplate {
    pub instance: ChoreInstance,
    pub template: ChoreTemplate,
}

// ============================================================================
// Reward Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardCategory {
    Items,
    Activities,
    Privileges,
    SpecialEvents,
}

impl RewardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardCategory::Items => "items",
            RewardCategory::Activities => "activities",
            RewardCategory::Privileges => "privileges",
            RewardCategory::SpecialEvents => "special_events",
        }
    }
}

impl FromStr for RewardCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "items" => Ok(RewardCategory::Items),
            "activities" => Ok(RewardCategory::Activities),
            "privileges" => Ok(RewardCategory::Privileges),
            "special_events" | "specialevents" => Ok(RewardCategory::SpecialEvents),
            _ => Err(()),
        }
    }
}

/// Sentinel quantity meaning "unlimited stock".
pub const UNLIMITED_QUANTITY: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardTemplate {
    pub id: Uuid,
    pub family_id: Uuid,
    pub title: String,
    pub description: String,
    pub bucks_price: i64,
    pub category: RewardCategory,
    /// Remaining stock; -1 means unlimited.
    pub quantity: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    /// Child ids the reward is offered to; empty means everyone.
    pub available_to: Vec<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RewardTemplate {
    pub fn is_unlimited(&self) -> bool {
        self.quantity == UNLIMITED_QUANTITY
    }

    pub fn in_stock(&self) -> bool {
        self.is_unlimited() || self.quantity > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRewardTemplateRequest {
    pub title: String,
    pub description: Option<String>,
    pub bucks_price: i64,
    pub category: RewardCategory,
    pub quantity: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub available_to: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRewardTemplateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub bucks_price: Option<i64>,
    pub category: Option<RewardCategory>,
    pub quantity: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub available_to: Option<Vec<Uuid>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardStatus {
    Requested,
    Approved,
    Rejected,
    Fulfilled,
}

impl RewardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardStatus::Requested => "requested",
            RewardStatus::Approved => "approved",
            RewardStatus::Rejected => "rejected",
            RewardStatus::Fulfilled => "fulfilled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RewardStatus::Rejected | RewardStatus::Fulfilled)
    }
}

impl FromStr for RewardStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" => Ok(RewardStatus::Requested),
            "approved" => Ok(RewardStatus::Approved),
            "rejected" => Ok(RewardStatus::Rejected),
            "fulfilled" => Ok(RewardStatus::Fulfilled),
            _ => Err(()),
        }
    }
}

/// Photos, notes and a rating attached after a reward is fulfilled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardMemories {
    pub photo_urls: Vec<String>,
    pub notes: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardInstance {
    pub id: Uuid,
    pub family_id: Uuid,
    pub template_id: Uuid,
    pub child_id: Uuid,
    pub status: RewardStatus,
    /// Price captured at request time; later template edits don't change it.
    pub bucks_price: i64,
    pub request_notes: String,
    pub requested_at: DateTime<Utc>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub fulfilled_by: Option<Uuid>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub calendar_event_id: Option<Uuid>,
    pub memories: RewardMemories,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestRewardRequest {
    pub notes: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApproveRewardRequest {
    pub notes: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRewardRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddMemoriesRequest {
    pub photo_urls: Vec<String>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardInstanceWithTemplate {
    pub instance: RewardInstance,
    pub template: RewardTemplate,
}

// ============================================================================
// Bucks Ledger Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Earned,
    Spent,
    Bonus,
    Adjusted,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Earned => "earned",
            TransactionKind::Spent => "spent",
            TransactionKind::Bonus => "bonus",
            TransactionKind::Adjusted => "adjusted",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "earned" => Ok(TransactionKind::Earned),
            "spent" => Ok(TransactionKind::Spent),
            "bonus" => Ok(TransactionKind::Bonus),
            "adjusted" => Ok(TransactionKind::Adjusted),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    Chore,
    Reward,
    Manual,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSource::Chore => "chore",
            TransactionSource::Reward => "reward",
            TransactionSource::Manual => "manual",
        }
    }
}

impl FromStr for TransactionSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chore" => Ok(TransactionSource::Chore),
            "reward" => Ok(TransactionSource::Reward),
            "manual" => Ok(TransactionSource::Manual),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucksBalance {
    pub child_id: Uuid,
    pub family_id: Uuid,
    pub current_balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucksTransaction {
    pub id: Uuid,
    pub family_id: Uuid,
    pub child_id: Uuid,
    pub amount: i64,
    pub kind: TransactionKind,
    pub source: TransactionSource,
    pub source_id: Option<Uuid>,
    pub description: String,
    /// Balance after this transaction was applied.
    pub resulting_balance: i64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustBucksRequest {
    pub amount: i64,
    pub reason: Option<String>,
}

/// Earned/spent aggregates over a lookback window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucksStats {
    pub current_balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
    pub period_earned: i64,
    pub period_spent: i64,
    pub transaction_count: i64,
}

// ============================================================================
// Story Feed Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryKind {
    RewardMemory,
    ChoreMilestone,
    General,
}

impl StoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryKind::RewardMemory => "reward_memory",
            StoryKind::ChoreMilestone => "chore_milestone",
            StoryKind::General => "general",
        }
    }
}

impl FromStr for StoryKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reward_memory" => Ok(StoryKind::RewardMemory),
            "chore_milestone" => Ok(StoryKind::ChoreMilestone),
            "general" => Ok(StoryKind::General),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryEntry {
    pub id: Uuid,
    pub family_id: Uuid,
    pub kind: StoryKind,
    pub source_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub photo_urls: Vec<String>,
    pub child_id: Option<Uuid>,
    pub child_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Default Catalog Import Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Chores,
    Rewards,
}

/// Outcome of a best-effort bulk import: failures are collected, not fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: u32,
    pub skipped: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

// ============================================================================
// API Response Types
// ============================================================================

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
    fn test_event_type_from_str() {
        assert_eq!("appointment".parse(), Ok(EventType::Appointment));
        assert_eq!("PLAYDATE".parse(), Ok(EventType::Playdate));
        assert_eq!("General".parse(), Ok(EventType::General));
        assert!("invalid".parse::<EventType>().is_err());
    }

    #[test]
    fn test_event_type_round_trip() {
        let all = [
            EventType::Appointment,
            EventType::Activity,
            EventType::School,
            EventType::Birthday,
            EventType::Meeting,
            EventType::Playdate,
            EventType::Vacation,
            EventType::Reminder,
            EventType::Task,
            EventType::General,
        ];
        for event_type in all {
            assert_eq!(event_type.as_str().parse(), Ok(event_type));
        }
    }

    fn sample_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            family_id: Uuid::new_v4(),
            title: "Dentist".to_string(),
            description: "".to_string(),
            location: "".to_string(),
            event_type: EventType::Appointment,
            status: EventStatus::Confirmed,
            start_time: Utc::now(),
            end_time: Utc::now(),
            timezone: "UTC".to_string(),
            child_id: Some(Uuid::new_v4()),
            child_name: Some("Mia".to_string()),
            attending_parent_id: None,
            attendees: vec![],
            linked_documents: vec![],
            created_by: Uuid::new_v4(),
            last_modified_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_event_filters_matches() {
        let event = sample_event();

        assert!(EventFilters::default().matches(&event));
        assert!(EventFilters {
            child_id: event.child_id,
            event_type: Some(EventType::Appointment),
        }
        .matches(&event));
        assert!(!EventFilters {
            child_id: Some(Uuid::new_v4()),
            event_type: None,
        }
        .matches(&event));
        assert!(!EventFilters {
            child_id: None,
            event_type: Some(EventType::Birthday),
        }
        .matches(&event));
    }

    #[test]
    fn test_date_time_input_deserialization() {
        let iso: DateTimeInput = serde_json::from_str("\"2026-03-01T09:00:00Z\"").unwrap();
        assert_eq!(iso, DateTimeInput::Iso("2026-03-01T09:00:00Z".to_string()));

        let legacy: DateTimeInput =
            serde_json::from_str("{\"seconds\": 1700000000, \"nanoseconds\": 0}").unwrap();
        assert_eq!(
            legacy,
            DateTimeInput::LegacyTimestamp {
                seconds: 1_700_000_000,
                nanoseconds: 0
            }
        );

        let parts: DateTimeInput =
            serde_json::from_str("{\"date\": \"2026-03-01\", \"time\": \"09:00:00\"}").unwrap();
        match parts {
            DateTimeInput::Parts { date, time } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
                assert_eq!(time, NaiveTime::from_hms_opt(9, 0, 0));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_recurrence_from_str() {
        assert_eq!("daily".parse(), Ok(Recurrence::Daily));
        assert_eq!("WEEKLY".parse(), Ok(Recurrence::Weekly));
        assert_eq!("weekdays".parse(), Ok(Recurrence::Weekdays));
        assert_eq!("as_needed".parse(), Ok(Recurrence::AsNeeded));
        assert_eq!("asneeded".parse(), Ok(Recurrence::AsNeeded));
        assert!("invalid".parse::<Recurrence>().is_err());
    }

    #[test]
    fn test_chore_status_is_done() {
        assert!(!ChoreStatus::Pending.is_done());
        assert!(ChoreStatus::Completed.is_done());
        assert!(ChoreStatus::Approved.is_done());
        assert!(!ChoreStatus::Rejected.is_done());
    }

    #[test]
    fn test_reward_status_terminal() {
        assert!(!RewardStatus::Requested.is_terminal());
        assert!(!RewardStatus::Approved.is_terminal());
        assert!(RewardStatus::Rejected.is_terminal());
        assert!(RewardStatus::Fulfilled.is_terminal());
    }

    #[test]
    fn test_reward_template_stock() {
        let mut template = RewardTemplate {
            id: Uuid::new_v4(),
            family_id: Uuid::new_v4(),
            title: "Movie night".to_string(),
            description: "".to_string(),
            bucks_price: 20,
            category: RewardCategory::Activities,
            quantity: UNLIMITED_QUANTITY,
            expires_at: None,
            image_url: None,
            available_to: vec![],
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(template.is_unlimited());
        assert!(template.in_stock());

        template.quantity = 1;
        assert!(!template.is_unlimited());
        assert!(template.in_stock());

        template.quantity = 0;
        assert!(!template.in_stock());
    }

    #[test]
    fn test_reward_category_from_str() {
        assert_eq!("items".parse(), Ok(RewardCategory::Items));
        assert_eq!("special_events".parse(), Ok(RewardCategory::SpecialEvents));
        assert_eq!("SpecialEvents".parse(), Ok(RewardCategory::SpecialEvents));
        assert!("invalid".parse::<RewardCategory>().is_err());
    }

    #[test]
    fn test_transaction_kind_round_trip() {
        for kind in [
            TransactionKind::Earned,
            TransactionKind::Spent,
            TransactionKind::Bonus,
            TransactionKind::Adjusted,
        ] {
            assert_eq!(kind.as_str().parse(), Ok(kind));
        }
    }

    #[test]
    fn test_feed_message_serialization() {
        let msg = FeedClientMessage::Subscribe {
            family_id: Uuid::nil(),
            filters: EventFilters::default(),
            range_start: None,
            range_end: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"subscribe\""));

        let parsed: FeedClientMessage = serde_json::from_str("{\"type\":\"ping\"}").unwrap();
        assert!(matches!(parsed, FeedClientMessage::Ping));
    }

    #[test]
    fn test_api_success() {
        let success = ApiSuccess::new(42);
        assert_eq!(success.data, 42);
    }
}
