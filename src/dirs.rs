use serde::{Deserialize, Serialize};
use std::fmt;

/// One step across the grid.
///
/// TABLE:
/// ┌──────┬──────────┬────────┬───────┐
/// │ Dir  │ (x, y, z)│ bits   │ arrow │
/// ├──────┼──────────┼────────┼───────┤
/// │  N   │ (0,-1, 0)│  0x02  │   ↑   │
/// │  S   │ (0, 1, 0)│  0x04  │   ↓   │
/// │  E   │ (1, 0, 0)│  0x08  │   →   │
/// │  W   │ (-1,0, 0)│  0x10  │   ←   │
/// │  U   │ (0, 0, 1)│  0x20  │   o   │
/// │  D   │ (0, 0,-1)│  0x40  │   x   │
/// └──────┴──────────┴────────┴───────┘
/// - top left is the origin, so north is -y (same as the canvas)
/// - "no direction" is `Option::<Dir>::None`, with bit 0x01 and arrow "."
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dir {
    N,
    S,
    E,
    W,
    U,
    D,
}

pub const NONE_BITS: u8 = 0x1;
pub const NONE_ARROW: char = '.';

impl Dir {
    /// Every direction, in the order neighbours are visited
    pub const ALL: [Dir; 6] = [Dir::N, Dir::S, Dir::E, Dir::W, Dir::U, Dir::D];

    pub fn invert(self) -> Dir {
        use Dir::*;
        match self {
            N => S,
            S => N,
            E => W,
            W => E,
            U => D,
            D => U,
        }
    }

    pub fn bits(self) -> u8 {
        use Dir::*;
        match self {
            N => 0x2,
            S => 0x4,
            E => 0x8,
            W => 0x10,
            U => 0x20,
            D => 0x40,
        }
    }

    pub fn arrow(self) -> char {
        use Dir::*;
        match self {
            N => '\u{2191}',
            S => '\u{2193}',
            E => '\u{2192}',
            W => '\u{2190}',
            U => 'o',
            D => 'x',
        }
    }

    /// Direction taken to go from `from` to `to` in exactly one step of `n`
    /// units, `None` if they aren't lined up like that
    pub fn between(from: Coord, to: Coord, n: i32) -> Option<Dir> {
        Dir::ALL.into_iter().find(|dir| from.translate(*dir, n) == to)
    }
}

pub fn arrow_of(dir: Option<Dir>) -> char {
    dir.map(Dir::arrow).unwrap_or(NONE_ARROW)
}

/// A cell position, `z` being the layer
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Coord { x, y, z }
    }

    pub fn translate(self, dir: Dir, n: i32) -> Coord {
        let Coord { x, y, z } = self;
        match dir {
            Dir::N => Coord::new(x, y - n, z),
            Dir::S => Coord::new(x, y + n, z),
            Dir::E => Coord::new(x + n, y, z),
            Dir::W => Coord::new(x - n, y, z),
            Dir::U => Coord::new(x, y, z + n),
            Dir::D => Coord::new(x, y, z - n),
        }
    }

    pub fn step(self, dir: Dir) -> Coord {
        self.translate(dir, 1)
    }
}

impl From<(i32, i32, i32)> for Coord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Coord { x, y, z }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_is_its_own_inverse() {
        for dir in Dir::ALL {
            assert_eq!(dir.invert().invert(), dir);
            assert_ne!(dir.invert(), dir);
        }
    }

    #[test]
    fn translate_then_back_returns_home() {
        let home = Coord::new(3, 4, 1);
        for dir in Dir::ALL {
            assert_eq!(home.translate(dir, 2).translate(dir.invert(), 2), home);
        }
        assert_eq!(home.step(Dir::N), Coord::new(3, 3, 1));
        assert_eq!(home.step(Dir::D), Coord::new(3, 4, 0));
    }

    #[test]
    fn between_finds_single_steps_only() {
        let a = Coord::new(0, 0, 0);
        assert_eq!(Dir::between(a, Coord::new(1, 0, 0), 1), Some(Dir::E));
        assert_eq!(Dir::between(a, Coord::new(0, -2, 0), 2), Some(Dir::N));
        assert_eq!(Dir::between(a, Coord::new(1, 1, 0), 1), None);
        assert_eq!(Dir::between(a, a, 1), None);
    }

    #[test]
    fn bits_form_a_mask() {
        let mask = Dir::ALL.iter().fold(NONE_BITS, |acc, d| acc | d.bits());
        assert_eq!(mask, 0x7f);
        assert_eq!(arrow_of(None), '.');
        assert_eq!(arrow_of(Some(Dir::U)), 'o');
    }
}
