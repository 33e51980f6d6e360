use crate::dirs::{Coord, Dir};
use crate::tiles::region::ExpandOptions;
use crate::tiles::weights::{Field, Weights};
use anyhow::{anyhow, Result};
use std::rc::Rc;

/// A single move considered while expanding a region
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Step {
    pub dir: Dir,
    pub from: Coord,
    pub to: Coord,
}

/// Adjusts the weight of a step.
///
/// Modifiers are folded in the order they were added, each one getting the
/// output of the previous one (the first one starts from 0). The folded
/// result is added to the weight of the cell being left.
/// - must not depend on other modifiers having run
/// - any caching they do must give the same answer twice
pub trait WeightModifier {
    fn modify(&self, weight: u32, options: &ExpandOptions, step: &Step) -> Result<u32>;
}

impl<F> WeightModifier for F
where
    F: Fn(u32, &ExpandOptions, &Step) -> Result<u32>,
{
    fn modify(&self, weight: u32, options: &ExpandOptions, step: &Step) -> Result<u32> {
        self(weight, options, step)
    }
}

/// Hard gate on a cell, `false` means the cell can't be entered at all
pub trait Validator {
    fn validate(&self, at: Coord, options: &ExpandOptions) -> Result<bool>;
}

impl<F> Validator for F
where
    F: Fn(Coord, &ExpandOptions) -> Result<bool>,
{
    fn validate(&self, at: Coord, options: &ExpandOptions) -> Result<bool> {
        self(at, options)
    }
}

/// Anything that can say which entities stand on a pixel
/// - implemented by the entity layer of a room
pub trait EntityLayer {
    type Entity: Clone + PartialEq;

    /// (width, height) of one tile in pixels
    fn tile_size(&self) -> (i32, i32);

    fn entities_exactly_here(&self, x: i32, y: i32, ignore: &[Self::Entity]) -> Vec<Self::Entity>;

    fn entities_on_tile(&self, at: Coord, ignore: &[Self::Entity]) -> Vec<Self::Entity> {
        let (width, height) = self.tile_size();
        self.entities_exactly_here(at.x * width, at.y * height, ignore)
    }
}

// ==================== Terrain ====================
/// Charges the exit weight of the cell being left and the enter weight of
/// the cell being entered
pub struct TerrainModifier {
    weights: Rc<Weights>,
    // one translated grid (record offsets) per layer
    grids: Vec<Rc<[u32]>>,
    cols: usize,
    rows: usize,
}

pub fn terrain_modifier(
    weights: Rc<Weights>,
    grids: Vec<Rc<[u32]>>,
    cols: usize,
    rows: usize,
    layers: usize,
) -> Result<TerrainModifier> {
    if grids.len() < layers {
        return Err(anyhow!(
            "terrain modifier needs {} layer grids, got {}",
            layers,
            grids.len()
        ));
    }
    if let Some(short) = grids.iter().position(|g| g.len() < cols * rows) {
        return Err(anyhow!("layer {} is smaller than {}x{}", short, cols, rows));
    }
    Ok(TerrainModifier {
        weights,
        grids,
        cols,
        rows,
    })
}

impl TerrainModifier {
    fn record(&self, at: Coord) -> Result<usize> {
        if at.x < 0 || at.y < 0 || at.x as usize >= self.cols || at.y as usize >= self.rows {
            return Err(anyhow!("({}) is outside the terrain grid", at));
        }
        let grid = usize::try_from(at.z)
            .ok()
            .and_then(|z| self.grids.get(z))
            .ok_or_else(|| anyhow!("no terrain grid for layer {}", at.z))?;
        Ok(grid[at.y as usize * self.cols + at.x as usize] as usize)
    }

    fn weight_of(&self, at: Coord, field: Field) -> Result<u8> {
        let offset = self.record(at)?;
        self.weights
            .try_get(offset, field)
            .ok_or_else(|| anyhow!("weight record {} at ({}) is outside the weights table", offset, at))
    }
}

impl WeightModifier for TerrainModifier {
    fn modify(&self, weight: u32, _options: &ExpandOptions, step: &Step) -> Result<u32> {
        let exit = self.weight_of(step.from, Field::exit(step.dir))?;
        let enter = self.weight_of(step.to, Field::enter(step.dir))?;
        Ok(weight + u32::from(exit) + u32::from(enter))
    }
}

// ==================== Entities ====================
type EntityCost<E> = dyn Fn(u32, &E, &ExpandOptions, Dir) -> Result<u32>;
type EntityCheck<E> = dyn Fn(&E, &ExpandOptions) -> Result<bool>;

/// Folds `cost` over every entity standing on the destination cell
pub struct EntityModifier<L: EntityLayer> {
    layer: Rc<L>,
    ignore: Vec<L::Entity>,
    cost: Box<EntityCost<L::Entity>>,
}

pub fn entity_modifier<L, F>(layer: Rc<L>, ignore: Vec<L::Entity>, cost: F) -> EntityModifier<L>
where
    L: EntityLayer,
    F: Fn(u32, &L::Entity, &ExpandOptions, Dir) -> Result<u32> + 'static,
{
    EntityModifier {
        layer,
        ignore,
        cost: Box::new(cost),
    }
}

impl<L: EntityLayer> WeightModifier for EntityModifier<L> {
    fn modify(&self, weight: u32, options: &ExpandOptions, step: &Step) -> Result<u32> {
        self.layer
            .entities_on_tile(step.to, &self.ignore)
            .iter()
            .try_fold(weight, |w, entity| (self.cost)(w, entity, options, step.dir))
    }
}

/// A cell passes only if every entity standing there passes `check`
pub struct EntityValidator<L: EntityLayer> {
    layer: Rc<L>,
    ignore: Vec<L::Entity>,
    check: Box<EntityCheck<L::Entity>>,
}

pub fn entity_validator<L, F>(layer: Rc<L>, ignore: Vec<L::Entity>, check: F) -> EntityValidator<L>
where
    L: EntityLayer,
    F: Fn(&L::Entity, &ExpandOptions) -> Result<bool> + 'static,
{
    EntityValidator {
        layer,
        ignore,
        check: Box::new(check),
    }
}

impl<L: EntityLayer> Validator for EntityValidator<L> {
    fn validate(&self, at: Coord, options: &ExpandOptions) -> Result<bool> {
        for entity in self.layer.entities_on_tile(at, &self.ignore) {
            if !(self.check)(&entity, options)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// ==================== Uniform ====================
/// Every step costs `n`, for plain "how many moves" regions
#[derive(Debug, Copy, Clone)]
pub struct UniformModifier(pub u32);

pub fn uniform_modifier(n: u32) -> UniformModifier {
    UniformModifier(n)
}

impl Default for UniformModifier {
    fn default() -> Self {
        UniformModifier(1)
    }
}

impl WeightModifier for UniformModifier {
    fn modify(&self, weight: u32, _options: &ExpandOptions, _step: &Step) -> Result<u32> {
        Ok(weight + self.0)
    }
}
