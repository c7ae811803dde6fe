//! Village — nearest named village for a villager death.

use std::sync::OnceLock;

use regex::Regex;

use crate::conf::VillageConfig;

fn coordinate_re() -> &'static Regex {
    static COORDINATE_RE: OnceLock<Regex> = OnceLock::new();
    COORDINATE_RE.get_or_init(|| {
        Regex::new(r"(?:^|[\s,])(x|z)=(-?\d+(?:\.\d+)?)").expect("valid coordinate regex")
    })
}

/// Pull `x=` and `z=` block coordinates out of a villager data token.
pub fn coordinates(data: &str) -> Option<(f64, f64)> {
    let mut x = None;
    let mut z = None;
    for caps in coordinate_re().captures_iter(data) {
        let value: f64 = caps[2].parse().ok()?;
        match &caps[1] {
            "x" => x = Some(value),
            _ => z = Some(value),
        }
    }
    Some((x?, z?))
}

#[derive(Debug, Clone)]
pub struct VillageIndex {
    villages: Vec<VillageConfig>,
    radius: f64,
}

impl VillageIndex {
    pub fn new(villages: Vec<VillageConfig>, radius: f64) -> Self {
        Self { villages, radius }
    }

    pub fn is_empty(&self) -> bool {
        self.villages.is_empty()
    }

    /// Closest village within the radius.
    pub fn closest(&self, x: f64, z: f64) -> Option<&str> {
        self.villages
            .iter()
            .map(|v| (v, (v.x - x).hypot(v.z - z)))
            .filter(|(_, distance)| *distance <= self.radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(v, _)| v.name.as_str())
    }

    /// Village for a raw villager data token, if it carries coordinates.
    pub fn locate(&self, data: &str) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        let (x, z) = coordinates(data)?;
        self.closest(x, z)
    }
}
