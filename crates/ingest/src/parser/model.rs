use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Wall-clock time taken from the leading `[HH:MM:SS]` token.
///
/// The fields are kept as parsed; a value such as `25:00:00` survives here
/// and is rejected by [`TimeOfDay::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32, second: u32) -> Self {
        Self { hour, minute, second }
    }

    /// Combine with the date of the containing file.
    pub fn on(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second).map(|time| date.and_time(time))
    }
}

/// A line that matched the outer grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub time: TimeOfDay,
    pub source: &'a str,
    pub message: &'a str,
}

/// Event derived from a single parsed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent<'a> {
    /// `UUID of player <name> is <uuid>`
    Authenticated { name: &'a str, uuid: &'a str },
    /// `<name> joined the game`
    Joined { name: &'a str },
    /// `<name> left the game`
    Left { name: &'a str },
    /// `Villager ...[<data>] died, message: '<msg>'`
    VillagerDied {
        had_profession: bool,
        data: &'a str,
        message: &'a str,
    },
    /// `<<name>> <message>`
    Chat { name: &'a str, message: &'a str },
    /// A message matching the death catalog; `message` is the full line text.
    PlayerDied { name: &'a str, message: &'a str },
}

impl LogEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            LogEvent::Authenticated { .. } => EventKind::Authenticated,
            LogEvent::Joined { .. } => EventKind::Joined,
            LogEvent::Left { .. } => EventKind::Left,
            LogEvent::VillagerDied { .. } => EventKind::VillagerDied,
            LogEvent::Chat { .. } => EventKind::Chat,
            LogEvent::PlayerDied { .. } => EventKind::PlayerDied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Authenticated,
    Joined,
    Left,
    VillagerDied,
    Chat,
    PlayerDied,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Authenticated => "authenticated",
            EventKind::Joined => "joined",
            EventKind::Left => "left",
            EventKind::VillagerDied => "villager_died",
            EventKind::Chat => "chat",
            EventKind::PlayerDied => "player_died",
        }
    }
}
