//! Line — outer line grammar plus per-source sub-dispatch.

use std::sync::OnceLock;

use regex::Regex;

use super::death::DeathClassifier;
use super::model::{LogEvent, ParsedLine, TimeOfDay};
use super::{AUTHENTICATOR_TAG_PATTERN, SERVER_THREAD_TAG};

fn line_re() -> &'static Regex {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    LINE_RE.get_or_init(|| {
        Regex::new(r"^\[(\d\d):(\d\d):(\d\d)\] \[(.*?)\]: (.*)$").expect("valid line regex")
    })
}

fn authenticator_re() -> &'static Regex {
    static AUTHENTICATOR_RE: OnceLock<Regex> = OnceLock::new();
    AUTHENTICATOR_RE
        .get_or_init(|| Regex::new(AUTHENTICATOR_TAG_PATTERN).expect("valid authenticator regex"))
}

fn uuid_re() -> &'static Regex {
    static UUID_RE: OnceLock<Regex> = OnceLock::new();
    UUID_RE.get_or_init(|| Regex::new(r"^UUID of player (.*?) is (.*?)$").expect("valid uuid regex"))
}

fn join_re() -> &'static Regex {
    static JOIN_RE: OnceLock<Regex> = OnceLock::new();
    JOIN_RE.get_or_init(|| Regex::new(r"^(.*) joined the game$").expect("valid join regex"))
}

fn leave_re() -> &'static Regex {
    static LEAVE_RE: OnceLock<Regex> = OnceLock::new();
    LEAVE_RE.get_or_init(|| Regex::new(r"^(.*) left the game$").expect("valid leave regex"))
}

fn villager_re() -> &'static Regex {
    static VILLAGER_RE: OnceLock<Regex> = OnceLock::new();
    VILLAGER_RE.get_or_init(|| {
        Regex::new(r"^Villager .*?\[(.*?)\] died, message: '(.*?)'$").expect("valid villager regex")
    })
}

fn chat_re() -> &'static Regex {
    static CHAT_RE: OnceLock<Regex> = OnceLock::new();
    CHAT_RE.get_or_init(|| Regex::new(r"^<(.*?)> (.*)$").expect("valid chat regex"))
}

/// Parser for vanilla server log lines.
#[derive(Debug, Clone)]
pub struct LineParser {
    deaths: DeathClassifier,
}

impl LineParser {
    pub fn new(deaths: DeathClassifier) -> Self {
        Self { deaths }
    }

    /// Match the outer `[HH:MM:SS] [<source>]: <message>` grammar.
    ///
    /// Stack trace continuations and other stray lines return `None`.
    pub fn parse_line<'a>(&self, line: &'a str) -> Option<ParsedLine<'a>> {
        let caps = line_re().captures(line)?;
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        Some(ParsedLine {
            time: TimeOfDay::new(number(1)?, number(2)?, number(3)?),
            source: caps.get(4)?.as_str(),
            message: caps.get(5)?.as_str(),
        })
    }

    /// Derive the event a parsed line carries, if any.
    pub fn event<'a>(&self, parsed: &ParsedLine<'a>) -> Option<LogEvent<'a>> {
        if parsed.source == SERVER_THREAD_TAG {
            self.server_event(parsed.message)
        } else if authenticator_re().is_match(parsed.source) {
            authenticator_event(parsed.message)
        } else {
            None
        }
    }

    /// Precedence: join, leave, villager death, chat, player death.
    fn server_event<'a>(&self, message: &'a str) -> Option<LogEvent<'a>> {
        if let Some(caps) = join_re().captures(message) {
            return Some(LogEvent::Joined { name: caps.get(1)?.as_str() });
        }

        if let Some(caps) = leave_re().captures(message) {
            return Some(LogEvent::Left { name: caps.get(1)?.as_str() });
        }

        if let Some(caps) = villager_re().captures(message) {
            let death_message = caps.get(2)?.as_str();
            return Some(LogEvent::VillagerDied {
                had_profession: !death_message.starts_with("Villager"),
                data: caps.get(1)?.as_str(),
                message: death_message,
            });
        }

        if let Some(caps) = chat_re().captures(message) {
            return Some(LogEvent::Chat {
                name: caps.get(1)?.as_str(),
                message: caps.get(2)?.as_str(),
            });
        }

        self.deaths
            .classify(message)
            .map(|name| LogEvent::PlayerDied { name, message })
    }
}

fn authenticator_event(message: &str) -> Option<LogEvent<'_>> {
    let caps = uuid_re().captures(message)?;
    Some(LogEvent::Authenticated {
        name: caps.get(1)?.as_str(),
        uuid: caps.get(2)?.as_str(),
    })
}
