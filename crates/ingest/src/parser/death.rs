//! Death — classify free-text server messages as player deaths.
//!
//! The catalog is an ordered table of regexes, each with a `player` capture
//! group naming the player who died. The first matching entry wins. New
//! phrasings are added to the table (or to a catalog file), never to the
//! parser's control flow.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Name of the capture group every catalog entry must define.
pub const PLAYER_GROUP: &str = "player";

/// Vanilla death messages, minus the leading `<player> `.
///
/// `.+` stands in for a killer, item or block name.
pub const BUILTIN_DEATH_MESSAGES: &[&str] = &[
    r"was slain by .+",
    r"was shot by .+",
    r"was pummeled by .+",
    r"was fireballed by .+",
    r"was killed by .+ using magic",
    r"was killed by even more magic",
    r"was killed by magic( whilst trying to escape .+)?",
    r"was killed by \[Intentional Game Design\]",
    r"was killed trying to hurt .+",
    r"was killed( while fighting .+)?",
    r"was pricked to death",
    r"walked into a cactus whilst trying to escape .+",
    r"was poked to death by a sweet berry bush( whilst trying to escape .+)?",
    r"drowned( whilst trying to escape .+)?",
    r"experienced kinetic energy( whilst trying to escape .+)?",
    r"blew up",
    r"was blown up by .+",
    r"hit the ground too hard( whilst trying to escape .+)?",
    r"fell from a high place",
    r"fell off a ladder",
    r"fell off some (vines|weeping vines|twisting vines|scaffolding)",
    r"fell while climbing",
    r"fell too far and was finished by .+",
    r"was doomed to fall( by .+)?",
    r"was impaled on a stalagmite( whilst fighting .+)?",
    r"was impaled by .+",
    r"was squashed by a falling (anvil|block)( whilst fighting .+)?",
    r"was squashed by .+",
    r"was skewered by a falling stalactite( whilst fighting .+)?",
    r"went up in flames",
    r"walked into fire whilst fighting .+",
    r"burned to death",
    r"was burnt to a crisp whilst fighting .+",
    r"went off with a bang( due to a firework fired from .+ by .+)?",
    r"tried to swim in lava( to escape .+)?",
    r"was struck by lightning( whilst fighting .+)?",
    r"discovered the floor was lava",
    r"walked into danger zone due to .+",
    r"froze to death",
    r"was frozen to death by .+",
    r"was stung to death( by .+)?",
    r"was obliterated by a sonically-charged shriek( whilst trying to escape .+)?",
    r"starved to death( whilst fighting .+)?",
    r"suffocated in a wall( whilst fighting .+)?",
    r"was squished too much",
    r"was roasted in dragon breath( by .+)?",
    r"fell out of the world",
    r"didn't want to live in the same world as .+",
    r"withered away( whilst fighting .+)?",
    r"left the confines of this world",
    r"died( because of .+)?",
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read death catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid death catalog file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid death pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Death pattern '{0}' has no (?P<player>...) group")]
    MissingPlayerGroup(String),

    #[error("Death catalog is empty")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    patterns: Vec<String>,
}

/// Stateless death message matcher over an ordered pattern table.
#[derive(Debug, Clone)]
pub struct DeathClassifier {
    patterns: Vec<Regex>,
}

impl DeathClassifier {
    /// Build from full regexes, each defining a `player` group.
    pub fn new<I, S>(patterns: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| compile(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if patterns.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { patterns })
    }

    /// The vanilla catalog, anchored to a leading player name.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(
            BUILTIN_DEATH_MESSAGES
                .iter()
                .map(|phrase| format!(r"^(?P<{}>\w+) {}$", PLAYER_GROUP, phrase)),
        )
    }

    /// Load a catalog file of the form `patterns = ["...", ...]`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(contents)?;
        Self::new(file.patterns)
    }

    /// Name of the player who died, or `None` if no entry matches.
    pub fn classify<'a>(&self, message: &'a str) -> Option<&'a str> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .captures(message)
                .and_then(|caps| caps.name(PLAYER_GROUP))
                .map(|player| player.as_str())
        })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile(pattern: &str) -> Result<Regex, CatalogError> {
    let regex = Regex::new(pattern).map_err(|e| CatalogError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    if !regex.capture_names().flatten().any(|name| name == PLAYER_GROUP) {
        return Err(CatalogError::MissingPlayerGroup(pattern.to_string()));
    }
    Ok(regex)
}
