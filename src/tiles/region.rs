use crate::dirs::{arrow_of, Coord, Dir};
use crate::error::RegionError;
use crate::tiles::modifiers::{Step, Validator, WeightModifier};
use crate::tiles::path::Path;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::fmt;
use std::ops::RangeInclusive;
use std::rc::Rc;

/// A named region grown from every member cell of its parent
#[derive(Clone)]
pub struct ChildRegion {
    pub name: String,
    pub ranges: Vec<RangeInclusive<u32>>,
    pub modifiers: Vec<Rc<dyn WeightModifier>>,
    pub validators: Vec<Rc<dyn Validator>>,
}

impl ChildRegion {
    pub fn new(name: impl Into<String>, budget: u32) -> Self {
        ChildRegion {
            name: name.into(),
            ranges: vec![0..=budget],
            modifiers: vec![],
            validators: vec![],
        }
    }

    pub fn with_ranges(mut self, ranges: Vec<RangeInclusive<u32>>) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn with_modifier(mut self, modifier: impl WeightModifier + 'static) -> Self {
        self.modifiers.push(Rc::new(modifier));
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Rc::new(validator));
        self
    }
}

impl fmt::Debug for ChildRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRegion")
            .field("name", &self.name)
            .field("ranges", &self.ranges)
            .field("modifiers", &self.modifiers.len())
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// What to expand from and how far.
///
/// Cells are walked through as long as their weight is at most the largest
/// range end (the budget), but only cells whose weight is inside one of the
/// `ranges` become members of the region.
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    pub origins: Vec<Coord>,
    pub ranges: Vec<RangeInclusive<u32>>,
    pub children: Vec<ChildRegion>,
}

impl ExpandOptions {
    pub fn within(origin: Coord, budget: u32) -> Self {
        Self::from_origins(vec![origin], budget)
    }

    pub fn from_origins(origins: Vec<Coord>, budget: u32) -> Self {
        ExpandOptions {
            origins,
            ranges: vec![0..=budget],
            children: vec![],
        }
    }

    pub fn with_ranges(mut self, ranges: Vec<RangeInclusive<u32>>) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn with_child(mut self, child: ChildRegion) -> Self {
        self.children.push(child);
        self
    }

    pub fn budget(&self) -> Option<u32> {
        self.ranges.iter().map(|r| *r.end()).max()
    }

    fn admits(&self, weight: u32) -> bool {
        self.ranges.iter().any(|r| r.contains(&weight))
    }
}

/// A finalized cell
#[derive(Debug, Clone)]
pub struct Tile {
    pub at: Coord,
    /// cheapest weight found from any origin
    pub weight: u32,
    /// direction to walk to reach the cell this one was reached from,
    /// `None` for origins
    pub parent: Option<Dir>,
    /// weight falls inside one of the expansion ranges
    pub member: bool,
    children: BTreeMap<String, Rc<Region>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Status {
    Fresh,
    Expanded,
    Poisoned,
}

/// The cells reachable from one or more origins within a weight budget.
///
/// TABLE:
/// ┌────────────────────── Region::expand ─────────────────────────┐
/// │                                                               │
/// │  origins ──► heap (weight, seq) ──► pop cheapest ──► finalize │
/// │                  ▲                                     │      │
/// │                  │   for each of N S E W U D:          │      │
/// │                  │   - in bounds, not finalized        │      │
/// │                  │   - every validator says yes        │      │
/// │                  └── - weight + fold(modifiers) ◄──────┘      │
/// │                        <= budget and cheaper than before      │
/// └───────────────────────────────────────────────────────────────┘
/// - equal weights pop in the order they were pushed
/// - `expand` runs once, `clear` allows another go
#[derive(Clone)]
pub struct Region {
    cols: usize,
    rows: usize,
    layers: usize,
    cells: Vec<Option<Tile>>,
    origins: Vec<Coord>,
    modifiers: Vec<Rc<dyn WeightModifier>>,
    validators: Vec<Rc<dyn Validator>>,
    sub_tiles: BTreeMap<String, BTreeSet<Coord>>,
    status: Status,
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("cols", &self.cols)
            .field("rows", &self.rows)
            .field("layers", &self.layers)
            .field("members", &self.len())
            .field("status", &self.status)
            .finish()
    }
}

impl Region {
    pub fn new(cols: usize, rows: usize, layers: usize) -> Self {
        Region {
            cols,
            rows,
            layers,
            cells: vec![None; cols * rows * layers],
            origins: vec![],
            modifiers: vec![],
            validators: vec![],
            sub_tiles: BTreeMap::new(),
            status: Status::Fresh,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn add_weight_modifier(&mut self, modifier: impl WeightModifier + 'static) {
        self.modifiers.push(Rc::new(modifier));
    }

    pub fn add_validator(&mut self, validator: impl Validator + 'static) {
        self.validators.push(Rc::new(validator));
    }

    pub fn in_range(&self, at: Coord) -> bool {
        at.x >= 0
            && at.y >= 0
            && at.z >= 0
            && (at.x as usize) < self.cols
            && (at.y as usize) < self.rows
            && (at.z as usize) < self.layers
    }

    fn index(&self, at: Coord) -> Option<usize> {
        self.in_range(at)
            .then(|| (at.z as usize * self.rows + at.y as usize) * self.cols + at.x as usize)
    }

    fn coord_of(&self, i: usize) -> Coord {
        let per_layer = self.cols * self.rows;
        Coord::new(
            (i % self.cols) as i32,
            ((i % per_layer) / self.cols) as i32,
            (i / per_layer) as i32,
        )
    }

    /// Computes every reachable cell.
    ///
    /// A modifier or validator error aborts the expansion, the region is
    /// emptied and refuses to expand again.
    pub fn expand(&mut self, options: &ExpandOptions) -> Result<(), RegionError> {
        match self.status {
            Status::Expanded => return Err(RegionError::AlreadyExpanded),
            Status::Poisoned => return Err(RegionError::Poisoned),
            Status::Fresh => {}
        }
        if self.modifiers.is_empty() {
            return Err(RegionError::NoWeightModifiers);
        }
        let budget = options.budget().ok_or(RegionError::NoRanges)?;

        match self.flood(options, budget) {
            Ok(()) => {
                self.status = Status::Expanded;
                tracing::trace!(members = self.len(), budget, "expanded region");
                Ok(())
            }
            Err(err) => {
                self.reset();
                self.status = Status::Poisoned;
                Err(err)
            }
        }
    }

    fn flood(&mut self, options: &ExpandOptions, budget: u32) -> Result<(), RegionError> {
        let n = self.cells.len();
        let mut best = vec![u32::MAX; n];
        let mut via: Vec<Option<Dir>> = vec![None; n];
        let mut admissible: Vec<Option<bool>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        let mut seq: u64 = 0;

        self.origins = options.origins.clone();
        for &origin in &options.origins {
            let Some(i) = self.index(origin) else {
                continue;
            };
            if best[i] == 0 || !self.admit(i, origin, options, &mut admissible)? {
                continue;
            }
            best[i] = 0;
            heap.push(Reverse((0u32, seq, i)));
            seq += 1;
        }

        while let Some(Reverse((weight, _, i))) = heap.pop() {
            // stale entry, a cheaper one already came through
            if self.cells[i].is_some() || weight > best[i] {
                continue;
            }

            let at = self.coord_of(i);
            let member = options.admits(weight);
            let mut children = BTreeMap::new();
            if member {
                for child in &options.children {
                    let region = self.expand_child(child, at)?;
                    let pool = self.sub_tiles.entry(child.name.clone()).or_default();
                    pool.extend(region.tiles().map(|t| t.at));
                    children.insert(child.name.clone(), Rc::new(region));
                }
            }
            self.cells[i] = Some(Tile {
                at,
                weight,
                parent: via[i],
                member,
                children,
            });

            for dir in Dir::ALL {
                let to = at.step(dir);
                let Some(j) = self.index(to) else {
                    continue;
                };
                if self.cells[j].is_some() || !self.admit(j, to, options, &mut admissible)? {
                    continue;
                }

                let step = Step { dir, from: at, to };
                let cost = self
                    .modifiers
                    .iter()
                    .try_fold(0, |w, m| m.modify(w, options, &step))?;
                let total = weight.saturating_add(cost);
                if total <= budget && total < best[j] {
                    best[j] = total;
                    via[j] = Some(dir.invert());
                    heap.push(Reverse((total, seq, j)));
                    seq += 1;
                }
            }
        }

        Ok(())
    }

    // validators only run once per cell
    fn admit(
        &self,
        i: usize,
        at: Coord,
        options: &ExpandOptions,
        memo: &mut [Option<bool>],
    ) -> Result<bool, RegionError> {
        if let Some(known) = memo[i] {
            return Ok(known);
        }
        let mut ok = true;
        for validator in &self.validators {
            if !validator.validate(at, options)? {
                ok = false;
                break;
            }
        }
        memo[i] = Some(ok);
        Ok(ok)
    }

    fn expand_child(&self, child: &ChildRegion, at: Coord) -> Result<Region, RegionError> {
        let mut region = Region::new(self.cols, self.rows, self.layers);
        region.modifiers = child.modifiers.clone();
        region.validators = child.validators.clone();
        let options = ExpandOptions {
            origins: vec![at],
            ranges: child.ranges.clone(),
            children: vec![],
        };
        region.expand(&options)?;
        Ok(region)
    }

    fn reset(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
        self.sub_tiles.clear();
        self.origins.clear();
    }

    /// Forgets the expansion (modifiers and validators stay) so the region
    /// can be expanded again
    pub fn clear(&mut self) {
        self.reset();
        self.status = Status::Fresh;
    }

    pub fn origins(&self) -> &[Coord] {
        &self.origins
    }

    /// Any finalized cell, member or just walked through
    pub(crate) fn cell(&self, at: Coord) -> Option<&Tile> {
        self.index(at).and_then(|i| self.cells[i].as_ref())
    }

    pub fn get(&self, at: Coord) -> Option<&Tile> {
        self.cell(at).filter(|t| t.member)
    }

    pub fn has(&self, at: Coord) -> bool {
        self.get(at).is_some()
    }

    pub fn weight(&self, at: Coord) -> Option<u32> {
        self.get(at).map(|t| t.weight)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.cells.iter().flatten().filter(|t| t.member)
    }

    pub fn len(&self) -> usize {
        self.tiles().count()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles().next().is_none()
    }

    pub fn sub_has(&self, name: &str, at: Coord) -> bool {
        self.sub_tiles
            .get(name)
            .is_some_and(|pool| pool.contains(&at))
    }

    pub fn sub_tiles<'a>(&'a self, name: &str) -> impl Iterator<Item = Coord> + 'a {
        self.sub_tiles.get(name).into_iter().flatten().copied()
    }

    /// The child region named `name` that was grown from the member at `at`
    pub fn get_child(&self, at: Coord, name: &str) -> Option<Rc<Region>> {
        self.get(at).and_then(|t| t.children.get(name).cloned())
    }

    pub fn path_to(&self, at: Coord) -> Option<Path> {
        Path::find(self, at, true)
    }

    /// Zero length path sitting on the first origin, to be grown by the
    /// player one step at a time
    pub fn empty_path(&self, clamp: bool) -> Path {
        let start = self.origins.first().copied().unwrap_or_default();
        Path::at(self, start, clamp)
    }

    /// Text drawing of the region, one grid per layer
    /// - each cell shows its parent arrow and weight, `#` if it was walked
    ///   through but isn't a member
    /// - with `sub`, cells in that sub-region are marked `XXX` instead
    pub fn describe(&self, sub: Option<&str>) -> String {
        let mut out = String::new();
        let span = "────";
        for z in 0..self.layers {
            out.push('\n');
            for y in 0..self.rows {
                let (left, mid, right) = if y == 0 {
                    ('┌', '┬', '┐')
                } else {
                    ('├', '┼', '┤')
                };
                out.push(left);
                out.push_str(&vec![span; self.cols].join(mid.to_string().as_str()));
                out.push(right);
                out.push('\n');

                for x in 0..self.cols {
                    let at = Coord::new(x as i32, y as i32, z as i32);
                    out.push('│');
                    match (self.cell(at), sub) {
                        (None, _) => out.push_str("    "),
                        (Some(tile), Some(name)) => {
                            out.push(arrow_of(tile.parent));
                            out.push_str(if self.sub_has(name, at) { "XXX" } else { "   " });
                        }
                        (Some(tile), None) => {
                            out.push(if tile.member { ' ' } else { '#' });
                            out.push(arrow_of(tile.parent));
                            out.push_str(&format!("{:>2}", tile.weight));
                        }
                    }
                }
                out.push_str("│\n");
            }
            out.push('└');
            out.push_str(&vec![span; self.cols].join("┴"));
            out.push_str("┘\n");
        }
        out
    }
}
