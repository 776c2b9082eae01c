//! Bot policies.
//!
//! A policy looks at a [`WorldView`] and picks where to steer, or nothing.
//! They are plain functions so they can be composed and tested without a
//! session.

use std::fmt;
use std::str::FromStr;

use cellarena_protocol::Cell;

use crate::WorldView;

/// Scale applied to the summed escape vector so the target lands well
/// outside the visible area.
const ESCAPE_GAIN: f64 = 300.0;

/// A point in play-field coordinates to steer towards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub x: f64,
    pub y: f64,
}

impl Target {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn at(cell: &Cell) -> Self {
        Self::new(f64::from(cell.x), f64::from(cell.y))
    }
}

fn manhattan(a: &Cell, b: &Cell) -> i64 {
    (i64::from(a.x) - i64::from(b.x)).abs() + (i64::from(a.y) - i64::from(b.y)).abs()
}

fn nearest<'a>(from: &Cell, cells: &[&'a Cell]) -> Option<&'a Cell> {
    cells.iter().copied().min_by_key(|c| manhattan(from, c))
}

/// Steer at the nearest opponent, whatever its size.
pub fn closer(world: &WorldView) -> Option<Target> {
    let player = world.player()?;
    nearest(player, &world.opponents()).map(Target::at)
}

/// Steer at the nearest opponent we can eat.
pub fn greedy(world: &WorldView) -> Option<Target> {
    let player = world.player()?;
    nearest(player, &world.edible()).map(Target::at)
}

/// Steer away from every predator, weighting each by its size. With no
/// predators in sight, hold position.
pub fn escape(world: &WorldView) -> Option<Target> {
    let player = world.player()?;
    let predators = world.predators();
    if predators.is_empty() {
        return Some(Target::at(player));
    }

    let (mut dx, mut dy) = (0.0, 0.0);
    for predator in predators {
        let weight = f64::from(predator.size) / 2.0;
        dx -= weight * (f64::from(predator.x) - f64::from(player.x));
        dy -= weight * (f64::from(predator.y) - f64::from(player.y));
    }
    Some(Target::new(
        f64::from(player.x) + dx * ESCAPE_GAIN,
        f64::from(player.y) + dy * ESCAPE_GAIN,
    ))
}

/// Steer at the middle of the play field.
pub fn center(world: &WorldView) -> Option<Target> {
    world.player()?;
    let (x, y) = world.screen()?.center();
    Some(Target::new(x, y))
}

/// Escape if anything can eat us, otherwise eat, otherwise drift to the
/// center.
pub fn eat_when_no_predators(world: &WorldView) -> Option<Target> {
    world.player()?;
    if !world.predators().is_empty() {
        escape(world)
    } else if !world.edible().is_empty() {
        greedy(world)
    } else {
        center(world)
    }
}

// ---------------------------------------------------------------------------
// BotKind
// ---------------------------------------------------------------------------

/// The selectable bot policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotKind {
    Closer,
    Greedy,
    Escape,
    Center,
    EatWhenNoPredators,
}

impl BotKind {
    pub const ALL: [BotKind; 5] = [
        Self::Closer,
        Self::Greedy,
        Self::Escape,
        Self::Center,
        Self::EatWhenNoPredators,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Closer => "Closer",
            Self::Greedy => "Greedy",
            Self::Escape => "Escape",
            Self::Center => "Center",
            Self::EatWhenNoPredators => "EatWhenNoPredators",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Closer => "Go to the closest non-virus cell, no matter its size.",
            Self::Greedy => "Go to the closest cell small enough to eat.",
            Self::Escape => "Run away from cells big enough to eat us.",
            Self::Center => "Go to the center of the play field.",
            Self::EatWhenNoPredators => "Eat while nothing bigger is visible, escape otherwise.",
        }
    }

    /// Applies this policy to `world`.
    pub fn decide(self, world: &WorldView) -> Option<Target> {
        match self {
            Self::Closer => closer(world),
            Self::Greedy => greedy(world),
            Self::Escape => escape(world),
            Self::Center => center(world),
            Self::EatWhenNoPredators => eat_when_no_predators(world),
        }
    }
}

impl fmt::Display for BotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a bot name matches no [`BotKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bot type {0:?}")]
pub struct UnknownBotKind(pub String);

/// Parses a bot name, ignoring ASCII case.
impl FromStr for BotKind {
    type Err = UnknownBotKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownBotKind(s.to_string()))
    }
}
