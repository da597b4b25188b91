//! Bouncing grayscale level used as the window background

use serde::{Deserialize, Serialize};

/// Which way the level moves on the next step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Lighten,
    Darken,
}

/// Grayscale level in `0..=255` that walks back and forth one unit per step.
///
/// The direction flips as soon as a boundary is reached, so a full
/// round trip from black to white and back takes 510 steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Grayscale {
    level: u8,
    direction: Direction,
}

impl Grayscale {
    /// Number of steps in one black -> white -> black cycle
    pub const CYCLE_LEN: usize = 2 * u8::MAX as usize;

    pub fn new(level: u8, direction: Direction) -> Self {
        let mut shade = Self { level, direction };
        shade.settle_direction();
        shade
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Advance by exactly one unit and return the new level
    pub fn step(&mut self) -> u8 {
        self.level = match self.direction {
            Direction::Lighten => self.level.saturating_add(1),
            Direction::Darken => self.level.saturating_sub(1),
        };
        self.settle_direction();
        self.level
    }

    /// Point the direction away from a boundary we are sitting on
    fn settle_direction(&mut self) {
        match self.level {
            u8::MAX => self.direction = Direction::Darken,
            0 => self.direction = Direction::Lighten,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reaches_white_after_255_steps() {
        let mut shade = Grayscale::default();
        for _ in 0..255 {
            shade.step();
        }
        assert_eq!(shade.level(), 255);
        assert_eq!(shade.direction(), Direction::Darken);
    }

    #[test]
    fn test_full_cycle_returns_to_black() {
        let mut shade = Grayscale::default();
        for _ in 0..Grayscale::CYCLE_LEN {
            shade.step();
        }
        assert_eq!(shade, Grayscale::new(0, Direction::Lighten));
    }

    #[test]
    fn test_boundary_direction_is_normalised() {
        assert_eq!(Grayscale::new(255, Direction::Lighten).direction(), Direction::Darken);
        assert_eq!(Grayscale::new(0, Direction::Darken).direction(), Direction::Lighten);
        assert_eq!(Grayscale::new(7, Direction::Darken).direction(), Direction::Darken);
    }

    proptest! {
        #[test]
        fn prop_each_step_moves_by_one(
            level in any::<u8>(),
            darken in any::<bool>(),
            steps in 1usize..2000,
        ) {
            let dir = if darken { Direction::Darken } else { Direction::Lighten };
            let mut shade = Grayscale::new(level, dir);
            for _ in 0..steps {
                let before = shade.level() as i16;
                let after = shade.step() as i16;
                prop_assert_eq!((after - before).abs(), 1);
            }
        }

        #[test]
        fn prop_cycle_is_periodic(level in any::<u8>(), darken in any::<bool>()) {
            let dir = if darken { Direction::Darken } else { Direction::Lighten };
            let start = Grayscale::new(level, dir);
            let mut shade = start;
            for _ in 0..Grayscale::CYCLE_LEN {
                shade.step();
            }
            prop_assert_eq!(shade, start);
        }
    }
}
