// TABLE:
// ┌──────────────────────────────────────────────────────────────────┐
// │                  Room Actors (turn based moves)                  │
// ├────────────┬─────────────────────────────────────────────────────┤
// │ mod.rs     │ Turn context, what the actors need from the room    │
// │ regions.rs │ build regions and paths, show and hide them         │
// │ select.rs  │ let the player pick entities and tiles, move them   │
// └────────────┴─────────────────────────────────────────────────────┘
// ELI5: a typical "move a unit" script
//   pick_entity ─► generate ─► display ─► make_path ─► pick_tile ─► follow_path
//   pressing back at any point walks the chain backwards
pub mod regions;
pub mod select;

use crate::dirs::{Coord, Dir};
use crate::error::Fault;
use crate::tiles::{Path, Region};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::rc::Rc;

pub use crate::tiles::EntityLayer;
pub use regions::RegionActor;
pub use select::SelectActor;

/// Something drawn over the room
#[derive(Debug, Clone)]
pub enum Overlay {
    Region {
        region: Rc<Region>,
        colour: String,
    },
    SubRegion {
        region: Rc<Region>,
        colour: String,
        sub: String,
    },
    Path {
        path: Path,
        image: String,
    },
}

/// The value passed between the actions of a room script
#[derive(Debug, Clone)]
pub struct Turn<E> {
    pub region: Option<Rc<Region>>,
    pub regions: BTreeMap<String, Rc<Region>>,
    pub path: Option<Path>,
    /// first entity picked, `None` when an empty tile was allowed
    pub entity: Option<E>,
    pub all_entities: Vec<E>,
    pub x: i32,
    pub y: i32,
    pub old_position: Option<Coord>,
    /// overlays taken down by `un_display`, with their names
    pub removed: Vec<(String, Overlay)>,
}

impl<E> Default for Turn<E> {
    fn default() -> Self {
        Turn {
            region: None,
            regions: BTreeMap::new(),
            path: None,
            entity: None,
            all_entities: vec![],
            x: 0,
            y: 0,
            old_position: None,
            removed: vec![],
        }
    }
}

impl<E> Turn<E> {
    pub fn at(x: i32, y: i32) -> Self {
        Turn {
            x,
            y,
            ..Self::default()
        }
    }

    /// (x, y) on the first layer
    pub fn cursor(&self) -> Coord {
        Coord::new(self.x, self.y, 0)
    }

    /// `None` picks the main `region`, otherwise one of the named ones
    pub fn region_named(&self, which: Option<&str>) -> Option<Rc<Region>> {
        match which {
            None => self.region.clone(),
            Some(name) => self.regions.get(name).cloned(),
        }
    }

    pub fn store_region(&mut self, dest: Option<&str>, region: Rc<Region>) {
        match dest {
            None => self.region = Some(region),
            Some(name) => {
                self.regions.insert(name.to_string(), region);
            }
        }
    }
}

/// The overlay layer of a room
/// - names are unique, showing under a taken name replaces what was there
pub trait RegionDisplay {
    /// (cols, rows) of the room
    fn dimensions(&self) -> (usize, usize);
    fn show(&self, name: &str, overlay: Overlay);
    fn hide(&self, name: &str) -> Option<Overlay>;
}

/// Lets the player move a cursor around the room and choose a tile
#[async_trait(?Send)]
pub trait Selector {
    /// Resolves with the first confirmed tile `accept` agrees to,
    /// rejects with a `Cancel` when the player backs out
    async fn select(
        &self,
        start: Coord,
        accept: &mut dyn FnMut(Coord) -> bool,
    ) -> Result<Coord, Fault>;
}

/// Moves entities around the room
#[async_trait(?Send)]
pub trait Mover<E> {
    fn position(&self, entity: &E) -> Coord;
    fn place(&self, entity: &E, at: Coord);
    /// Resolves once the entity has walked every direction in turn
    async fn follow(&self, entity: &E, dirs: &[Dir]) -> Result<(), Fault>;
}

#[cfg(test)]
pub(crate) mod mocks {
    use super::*;
    use crate::error::Cancel;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    pub const TILE: i32 = 16;

    #[derive(Default)]
    pub struct Display {
        pub cols: usize,
        pub rows: usize,
        pub shown: RefCell<BTreeMap<String, Overlay>>,
    }

    impl Display {
        pub fn sized(cols: usize, rows: usize) -> Self {
            Display {
                cols,
                rows,
                ..Self::default()
            }
        }

        pub fn names(&self) -> Vec<String> {
            self.shown.borrow().keys().cloned().collect()
        }
    }

    impl RegionDisplay for Display {
        fn dimensions(&self) -> (usize, usize) {
            (self.cols, self.rows)
        }

        fn show(&self, name: &str, overlay: Overlay) {
            self.shown.borrow_mut().insert(name.to_string(), overlay);
        }

        fn hide(&self, name: &str) -> Option<Overlay> {
            self.shown.borrow_mut().remove(name)
        }
    }

    /// Plays back confirmed tiles, `None` is the player pressing back
    #[derive(Default)]
    pub struct Script {
        pub answers: RefCell<VecDeque<Option<Coord>>>,
    }

    impl Script {
        pub fn answering(answers: Vec<Option<Coord>>) -> Self {
            Script {
                answers: RefCell::new(answers.into()),
            }
        }
    }

    #[async_trait(?Send)]
    impl Selector for Script {
        async fn select(
            &self,
            _start: Coord,
            accept: &mut dyn FnMut(Coord) -> bool,
        ) -> Result<Coord, Fault> {
            loop {
                let answer = self.answers.borrow_mut().pop_front();
                match answer {
                    Some(Some(at)) if accept(at) => return Ok(at),
                    Some(Some(_)) => continue,
                    Some(None) => return Err(Cancel::because("back").into()),
                    None => return Err(Cancel::because("out of answers").into()),
                }
            }
        }
    }

    /// Entities are plain ids standing on tiles
    #[derive(Default)]
    pub struct Units {
        pub at: RefCell<BTreeMap<u32, Coord>>,
    }

    impl Units {
        pub fn with(units: &[(u32, Coord)]) -> Self {
            Units {
                at: RefCell::new(units.iter().copied().collect()),
            }
        }

        pub fn where_is(&self, id: u32) -> Option<Coord> {
            self.at.borrow().get(&id).copied()
        }
    }

    impl EntityLayer for Units {
        type Entity = u32;

        fn tile_size(&self) -> (i32, i32) {
            (TILE, TILE)
        }

        fn entities_exactly_here(&self, x: i32, y: i32, ignore: &[u32]) -> Vec<u32> {
            self.at
                .borrow()
                .iter()
                .filter(|(id, at)| at.x * TILE == x && at.y * TILE == y && !ignore.contains(*id))
                .map(|(id, _)| *id)
                .collect()
        }
    }

    #[async_trait(?Send)]
    impl Mover<u32> for Units {
        fn position(&self, entity: &u32) -> Coord {
            self.where_is(*entity).unwrap_or_default()
        }

        fn place(&self, entity: &u32, at: Coord) {
            self.at.borrow_mut().insert(*entity, at);
        }

        async fn follow(&self, entity: &u32, dirs: &[Dir]) -> Result<(), Fault> {
            let end = dirs
                .iter()
                .fold(self.position(entity), |at, dir| at.step(*dir));
            self.place(entity, end);
            Ok(())
        }
    }
}
