//! To-do tasks, as exchanged with the remote task service

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};


/// The identifier of a task.
///
/// It is assigned by the remote service and is opaque to this crate.
/// Depending on the service, it is either a JSON number or a JSON string. It is sent back in the same shape it was received.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(u64),
    Text(String),
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for TaskId {
    fn from(n: u64) -> Self {
        TaskId::Number(n)
    }
}
impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId::Text(s.to_string())
    }
}
impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId::Text(s)
    }
}



/// The progress of a task.
///
/// Any status can follow any other one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Every status, in the order a status picker lists them
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL.iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown task status {:?}", s))
    }
}



#[derive(Clone, Debug, PartialEq, Eq)]
enum DueMoment {
    /// A plain calendar day (`2024-05-01`)
    Day(NaiveDate),
    /// A wall-clock time with no offset (`2024-05-01T10:00:00`)
    Floating(NaiveDateTime),
    /// An absolute instant (`2024-05-01T10:00:00.000Z`)
    Instant(DateTime<FixedOffset>),
}

/// The due date of a task.
///
/// Only its calendar day matters. The text it was parsed from is kept, so that a task is sent back exactly as it was received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DueDate {
    raw: String,
    moment: DueMoment,
}

const FLOATING_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"];

impl DueDate {
    /// A due date that is a plain calendar day
    pub fn from_day(day: NaiveDate) -> Self {
        Self {
            raw: day.format("%Y-%m-%d").to_string(),
            moment: DueMoment::Day(day),
        }
    }

    /// The calendar day of this due date, as seen from timezone `tz`.
    ///
    /// Plain days and offset-less times are not shifted. Instants are converted to `tz` first.
    pub fn day_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        match &self.moment {
            DueMoment::Day(day) => *day,
            DueMoment::Floating(ndt) => ndt.date(),
            DueMoment::Instant(dt) => dt.with_timezone(tz).date_naive(),
        }
    }

    /// The calendar day of this due date, in the local timezone
    pub fn local_day(&self) -> NaiveDate {
        self.day_in(&chrono::Local)
    }

    /// The text this due date was built from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The date part of the text (everything before the `T` separator)
    pub fn date_part(&self) -> &str {
        self.raw.split('T').next().unwrap_or(&self.raw)
    }
}

impl FromStr for DueDate {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let moment = if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            DueMoment::Instant(dt)
        } else if let Some(ndt) = FLOATING_FORMATS.iter().find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok()) {
            DueMoment::Floating(ndt)
        } else if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            DueMoment::Day(day)
        } else {
            return Err(format!("Invalid due date {:?}", s));
        };

        Ok(Self { raw: s.to_string(), moment })
    }
}

impl From<NaiveDate> for DueDate {
    fn from(day: NaiveDate) -> Self {
        Self::from_day(day)
    }
}

impl Display for DueDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Used to support serde
impl Serialize for DueDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}
/// Used to support serde
impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D>(deserializer: D) -> Result<DueDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}



/// A to-do task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    duedate: DueDate,
    status: TaskStatus,

    /// Fields the service sent that this crate does not know about.
    /// They are needed to send back a complete task on a full replace
    #[serde(flatten)]
    extra_fields: Map<String, Value>,
}

impl Task {
    pub fn new<S: ToString>(id: TaskId, title: S, duedate: DueDate, status: TaskStatus) -> Self {
        Self {
            id,
            title: title.to_string(),
            duedate,
            status,
            extra_fields: Map::new(),
        }
    }

    /// Build the task the service has created out of `draft`
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self::new(id, draft.title, draft.due_date, draft.status)
    }

    pub fn id(&self) -> &TaskId          { &self.id      }
    pub fn title(&self) -> &str          { &self.title   }
    pub fn duedate(&self) -> &DueDate    { &self.duedate }
    pub fn status(&self) -> TaskStatus   { self.status   }
    pub fn is_completed(&self) -> bool   { self.status == TaskStatus::Completed }
    pub fn extra_fields(&self) -> &Map<String, Value> { &self.extra_fields }

    pub fn set_title<S: ToString>(&mut self, new_title: S) {
        self.title = new_title.to_string();
    }

    pub fn set_duedate(&mut self, new_duedate: DueDate) {
        self.duedate = new_duedate;
    }

    pub fn set_status(&mut self, new_status: TaskStatus) {
        self.status = new_status;
    }

    /// A copy of this task, marked as completed. Every other field is kept
    pub fn completed(&self) -> Task {
        let mut task = self.clone();
        task.status = TaskStatus::Completed;
        task
    }
}



/// What the service needs to create a task. It will assign its ID
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(rename = "dueDate")]
    pub due_date: DueDate,
    pub status: TaskStatus,
}

impl TaskDraft {
    pub fn new<S: ToString>(title: S, due_date: DueDate, status: TaskStatus) -> Self {
        Self { title: title.to_string(), due_date, status }
    }
}
