use crate::dirs::{Coord, Dir};
use crate::tiles::region::Region;
use std::fmt;

/// A walk through a [`Region`], as the cells visited and the direction used
/// to get into each of them.
///
/// Paths only borrow the region while being built or changed, so they can be
/// stored on a script value next to the region they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    start: Coord,
    end: Coord,
    steps: Vec<(Coord, Dir)>,
    clamp: bool,
    valid: bool,
}

impl Path {
    pub(crate) fn at(region: &Region, start: Coord, clamp: bool) -> Self {
        Path {
            start,
            end: start,
            steps: vec![],
            clamp,
            valid: region.has(start),
        }
    }

    /// Walks the parent arrows back from `to` to an origin
    /// - `None` if `to` was never reached
    pub(crate) fn find(region: &Region, to: Coord, clamp: bool) -> Option<Self> {
        let mut steps = vec![];
        let mut tile = region.cell(to)?;
        while let Some(parent) = tile.parent {
            steps.push((tile.at, parent.invert()));
            tile = region.cell(tile.at.step(parent))?;
        }
        steps.reverse();

        Some(Path {
            start: tile.at,
            end: to,
            steps,
            clamp,
            valid: region.has(to),
        })
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn end(&self) -> Coord {
        self.end
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the end is inside the region, only ever false for unclamped
    /// paths that wandered out
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_clamped(&self) -> bool {
        self.clamp
    }

    pub fn dirs(&self) -> Vec<Dir> {
        self.steps.iter().map(|(_, dir)| *dir).collect()
    }

    /// Every cell on the path, start included
    pub fn points(&self) -> Vec<Coord> {
        std::iter::once(self.start)
            .chain(self.steps.iter().map(|(at, _)| *at))
            .collect()
    }

    pub fn has(&self, at: Coord) -> bool {
        self.start == at || self.steps.iter().any(|(p, _)| *p == at)
    }

    /// Takes one more step from the end.
    ///
    /// Returns false (and leaves the path alone) if the step would leave the
    /// grid, or if the path is clamped and the step would leave the region.
    pub fn append(&mut self, region: &Region, dir: Dir) -> bool {
        let to = self.end.step(dir);
        if !region.in_range(to) || (self.clamp && !region.has(to)) {
            return false;
        }
        self.steps.push((to, dir));
        self.end = to;
        self.valid = region.has(to);
        true
    }

    /// Appends every direction in turn, returns how many were taken
    pub fn follow(&mut self, region: &Region, dirs: &[Dir]) -> usize {
        dirs.iter().filter(|dir| self.append(region, **dir)).count()
    }

    /// Replaces the path with the cheapest one to the same end
    pub fn optimise(&mut self, region: &Region) {
        if let Some(best) = Path::find(region, self.end, self.clamp) {
            *self = best;
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrows: String = self.steps.iter().map(|(_, dir)| dir.arrow()).collect();
        write!(f, "[Path ({}) {} ({})]", self.start, arrows, self.end)
    }
}

#[cfg(test)]
mod tests {
    use crate::dirs::{Coord, Dir};
    use crate::tiles::modifiers::uniform_modifier;
    use crate::tiles::region::{ExpandOptions, Region};

    fn at(x: i32, y: i32) -> Coord {
        Coord::new(x, y, 0)
    }

    fn expanded(cols: usize, rows: usize, origin: Coord, budget: u32) -> Region {
        let mut region = Region::new(cols, rows, 1);
        region.add_weight_modifier(uniform_modifier(1));
        region.expand(&ExpandOptions::within(origin, budget)).unwrap();
        region
    }

    #[test]
    fn path_to_origin_is_empty() {
        let region = expanded(3, 3, at(1, 1), 2);
        let path = region.path_to(at(1, 1)).unwrap();
        assert!(path.is_empty());
        assert_eq!(path.start(), at(1, 1));
        assert_eq!(path.end(), at(1, 1));
        assert_eq!(path.to_string(), "[Path (1,1,0)  (1,1,0)]");
    }

    #[test]
    fn path_steps_lead_from_origin_to_target() {
        let region = expanded(4, 4, at(0, 0), 6);
        let path = region.path_to(at(3, 2)).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.start(), at(0, 0));
        let walked = path
            .dirs()
            .into_iter()
            .fold(path.start(), |p, dir| p.step(dir));
        assert_eq!(walked, at(3, 2));
        // each step is one cheaper going backwards
        let weights: Vec<u32> = path
            .points()
            .iter()
            .map(|p| region.weight(*p).unwrap())
            .collect();
        assert_eq!(weights, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn unreached_cells_have_no_path() {
        let region = expanded(5, 1, at(0, 0), 2);
        assert!(region.path_to(at(4, 0)).is_none());
        assert!(region.path_to(at(9, 9)).is_none());
    }

    #[test]
    fn clamped_path_stays_inside() {
        let region = expanded(5, 1, at(0, 0), 1);
        let mut path = region.empty_path(true);
        assert!(path.is_valid());
        assert!(path.append(&region, Dir::E));
        assert!(!path.append(&region, Dir::E));
        assert!(!path.append(&region, Dir::N));
        assert_eq!(path.end(), at(1, 0));
        assert!(path.is_valid());
    }

    #[test]
    fn unclamped_path_wanders_but_turns_invalid() {
        let region = expanded(5, 1, at(0, 0), 1);
        let mut path = region.empty_path(false);
        assert_eq!(path.follow(&region, &[Dir::E, Dir::E, Dir::E, Dir::S]), 3);
        assert_eq!(path.end(), at(3, 0));
        assert!(!path.is_valid());
        assert!(path.has(at(2, 0)));
        assert!(!path.has(at(4, 0)));
    }

    #[test]
    fn optimise_drops_detours() {
        let region = expanded(3, 3, at(0, 0), 4);
        let mut path = region.empty_path(true);
        path.follow(&region, &[Dir::S, Dir::E, Dir::N, Dir::E]);
        assert_eq!(path.end(), at(2, 0));
        assert_eq!(path.len(), 4);
        path.optimise(&region);
        assert_eq!(path.len(), 2);
        assert_eq!(path.end(), at(2, 0));
    }
}
