// TABLE:
// ┌───────────────────────────────────────────────────────────────────┐
// │                     Tile Weight Pathfinding                       │
// ├──────────────┬────────────────────────────────────────────────────┤
// │ weights.rs   │ per tile type enter/exit weights (12 per type)     │
// │ modifiers.rs │ what a step costs, which cells can be entered      │
// │ region.rs    │ cheapest-first flood fill within a budget          │
// │ path.rs      │ walking back from a reached cell to an origin      │
// └──────────────┴────────────────────────────────────────────────────┘
// - weights ──► modifiers ──► region ──► path
pub mod modifiers;
pub mod path;
pub mod region;
pub mod weights;

pub use modifiers::{
    entity_modifier, entity_validator, terrain_modifier, uniform_modifier, EntityLayer, Step,
    Validator, WeightModifier,
};
pub use path::Path;
pub use region::{ChildRegion, ExpandOptions, Region, Tile};
pub use weights::{Field, TranslationCache, Weights};
