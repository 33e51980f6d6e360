use crate::dirs::Dir;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Number of fields stored per tile type
pub const RECORD_SIZE: usize = 12;

/// Weights at or above this are treated as "can't go this way" by consumers
/// - Weights itself never enforces it
pub const BLOCKED_WEIGHT: u8 = 100;

pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 127;

/// Offsets of each field inside a tile type's record
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    EnterW = 0,
    EnterE = 1,
    EnterN = 2,
    EnterS = 3,
    EnterU = 4,
    EnterD = 5,
    ExitW = 6,
    ExitE = 7,
    ExitN = 8,
    ExitS = 9,
    ExitU = 10,
    ExitD = 11,
}

impl Field {
    pub fn offset(self) -> usize {
        self as usize
    }

    /// Field charged on the cell being left when moving `dir`
    pub fn exit(dir: Dir) -> Field {
        match dir {
            Dir::N => Field::ExitN,
            Dir::S => Field::ExitS,
            Dir::E => Field::ExitE,
            Dir::W => Field::ExitW,
            Dir::U => Field::ExitU,
            Dir::D => Field::ExitD,
        }
    }

    /// Field charged on the cell being entered when moving `dir`
    /// - moving north means coming in through the destination's south side
    pub fn enter(dir: Dir) -> Field {
        match dir.invert() {
            Dir::N => Field::EnterN,
            Dir::S => Field::EnterS,
            Dir::E => Field::EnterE,
            Dir::W => Field::EnterW,
            Dir::U => Field::EnterU,
            Dir::D => Field::EnterD,
        }
    }
}

/// Maps tiles of a schematic sheet to traversal weights.
///
/// TABLE:
/// ┌─────────────── weights: Vec<u8> ──────────────────────────────┐
/// │ type 0                      │ type 1                      │ … │
/// │ enterW enterE … exitU exitD │ enterW enterE … exitU exitD │ … │
/// │   0      1         10   11  │   12     13        22   23  │ … │
/// └───────────────────────────────────────────────────────────────┘
/// - a tile type is a (x, y) coordinate on the `cols × rows` source sheet
/// - unset fields are 1, weights live in 1..=127
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    cols: usize,
    rows: usize,
    weights: Vec<u8>,
}

impl Weights {
    pub fn new(cols: usize, rows: usize) -> Self {
        Weights {
            cols,
            rows,
            weights: vec![MIN_WEIGHT; cols * rows * RECORD_SIZE],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get_weights(&self, i: usize) -> usize {
        i * RECORD_SIZE
    }

    pub fn get_weights_coord(&self, x: usize, y: usize) -> usize {
        (y * self.cols + x) * RECORD_SIZE
    }

    /// Reads one field of the record starting at `offset`
    pub fn get(&self, offset: usize, field: Field) -> u8 {
        self.weights[offset + field.offset()]
    }

    /// Like [`get`](Self::get), `None` when `offset` is past the last record
    pub fn try_get(&self, offset: usize, field: Field) -> Option<u8> {
        self.weights.get(offset + field.offset()).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, field: Field, weight: u8) {
        let p = self.get_weights_coord(x, y);
        self.weights[p + field.offset()] = weight.clamp(MIN_WEIGHT, MAX_WEIGHT);
    }

    pub fn is_blocked(&self, offset: usize, field: Field, blocked_weight: u8) -> bool {
        self.get(offset, field) >= blocked_weight
    }

    /// Sets every cardinal enter field to `enter` and every cardinal exit
    /// field to `exit`, up/down are left alone
    pub fn add_simple_weight(&mut self, x: usize, y: usize, enter: u8, exit: u8) {
        for field in [Field::EnterW, Field::EnterE, Field::EnterN, Field::EnterS] {
            self.set(x, y, field, enter);
        }
        for field in [Field::ExitW, Field::ExitE, Field::ExitN, Field::ExitS] {
            self.set(x, y, field, exit);
        }
    }

    /// Turns a grid of `(tile x, tile y)` pairs into one record offset per cell
    pub fn translate(&self, grid: &[u16], cols: usize, rows: usize) -> Vec<u32> {
        grid.chunks_exact(2)
            .take(cols * rows)
            .map(|pair| self.get_weights_coord(pair[0].into(), pair[1].into()) as u32)
            .collect()
    }

    /// Box drawing of which sides of each cell can be entered/left.
    ///
    /// `grid` holds record offsets as produced by [`Weights::translate`], the
    /// optional `top`/`bottom` callbacks fill the two character slots in the
    /// middle of each cell.
    pub fn describe(
        &self,
        grid: &[u32],
        cols: usize,
        rows: usize,
        blocked_weight: u8,
        top: Option<&dyn Fn(usize, usize) -> String>,
        bottom: Option<&dyn Fn(usize, usize) -> String>,
    ) -> String {
        let open = |p: usize, field: Field, arrow: char| {
            if self.is_blocked(p, field, blocked_weight) {
                ' '
            } else {
                arrow
            }
        };
        let blank: &dyn Fn(usize, usize) -> String = &|_, _| "  ".to_string();
        let top = top.unwrap_or(blank);
        let bottom = bottom.unwrap_or(blank);

        let mut out = String::new();
        for y in 0..rows {
            let mut border = String::new();
            let mut lines = [String::new(), String::new(), String::new(), String::new()];
            for x in 0..cols {
                let p = grid[y * cols + x] as usize;
                border.push_str(if x == 0 { "├────" } else { "┼────" });
                for line in lines.iter_mut() {
                    line.push('│');
                }

                lines[0].push(' ');
                lines[0].push(open(p, Field::EnterN, '↓'));
                lines[0].push(open(p, Field::ExitN, '↑'));
                lines[0].push(' ');

                lines[1].push(open(p, Field::EnterW, '→'));
                lines[1].push_str(&top(x, y));
                lines[1].push(open(p, Field::ExitE, '→'));

                lines[2].push(open(p, Field::ExitW, '←'));
                lines[2].push_str(&bottom(x, y));
                lines[2].push(open(p, Field::EnterE, '←'));

                lines[3].push(' ');
                lines[3].push(open(p, Field::ExitS, '↓'));
                lines[3].push(open(p, Field::EnterS, '↑'));
                lines[3].push(' ');
            }
            border.push('┤');
            for line in lines.iter_mut() {
                line.push('│');
            }

            out.push('\n');
            if y == 0 {
                out.push_str(&border.replace('┼', "┬").replace('┤', "┐").replace('├', "┌"));
            } else {
                out.push_str(&border);
            }
            for line in &lines {
                out.push('\n');
                out.push_str(line);
            }
            if y + 1 == rows {
                out.push('\n');
                out.push_str(&border.replace('┼', "┴").replace('┤', "┘").replace('├', "└"));
            }
        }
        out
    }
}

struct Translated {
    source: Rc<[u16]>,
    cols: usize,
    rows: usize,
    offsets: Rc<[u32]>,
}

/// Remembers the last translated grid
/// - keyed on the identity of the source grid, not its contents, so a room
///   handing over the same `Rc` again skips the work
/// - handing over a different `Rc` (or different dimensions) throws it away
#[derive(Default)]
pub struct TranslationCache {
    last: RefCell<Option<Translated>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(
        &self,
        weights: &Weights,
        source: &Rc<[u16]>,
        cols: usize,
        rows: usize,
    ) -> Rc<[u32]> {
        if let Some(hit) = self.last.borrow().as_ref() {
            if Rc::ptr_eq(&hit.source, source) && hit.cols == cols && hit.rows == rows {
                return hit.offsets.clone();
            }
        }

        let offsets: Rc<[u32]> = weights.translate(source, cols, rows).into();
        *self.last.borrow_mut() = Some(Translated {
            source: source.clone(),
            cols,
            rows,
            offsets: offsets.clone(),
        });
        offsets
    }

    pub fn invalidate(&self) {
        self.last.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_weights_default_to_one() {
        let weights = Weights::new(4, 4);
        let p = weights.get_weights_coord(2, 3);
        assert_eq!(weights.get(p, Field::EnterN), 1);
        assert_eq!(weights.get(p, Field::ExitD), 1);
    }

    #[test]
    fn simple_weight_leaves_up_and_down_alone() {
        let mut weights = Weights::new(4, 4);
        weights.add_simple_weight(1, 0, 5, 7);
        let p = weights.get_weights_coord(1, 0);
        for field in [Field::EnterW, Field::EnterE, Field::EnterN, Field::EnterS] {
            assert_eq!(weights.get(p, field), 5);
        }
        for field in [Field::ExitW, Field::ExitE, Field::ExitN, Field::ExitS] {
            assert_eq!(weights.get(p, field), 7);
        }
        assert_eq!(weights.get(p, Field::EnterU), 1);
        assert_eq!(weights.get(p, Field::ExitD), 1);
        // neighbouring record untouched
        assert_eq!(weights.get(weights.get_weights_coord(2, 0), Field::EnterW), 1);
    }

    #[test]
    fn translate_agrees_with_coord_lookup() {
        let weights = Weights::new(3, 2);
        let (cols, rows) = (2, 2);
        let grid: Vec<u16> = vec![0, 0, 2, 1, 1, 1, 2, 0];
        let offsets = weights.translate(&grid, cols, rows);
        assert_eq!(offsets.len(), 4);
        for (i, pair) in grid.chunks(2).enumerate() {
            assert_eq!(
                offsets[i] as usize,
                weights.get_weights_coord(pair[0] as usize, pair[1] as usize)
            );
        }
        assert_eq!(weights.get_weights(4), 4 * RECORD_SIZE);
    }

    #[test]
    fn weights_are_kept_in_range() {
        let mut weights = Weights::new(1, 1);
        weights.set(0, 0, Field::EnterE, 0);
        weights.set(0, 0, Field::ExitE, 200);
        assert_eq!(weights.get(0, Field::EnterE), MIN_WEIGHT);
        assert_eq!(weights.get(0, Field::ExitE), MAX_WEIGHT);
        assert!(weights.is_blocked(0, Field::ExitE, BLOCKED_WEIGHT));
        assert!(!weights.is_blocked(0, Field::EnterE, BLOCKED_WEIGHT));
    }

    #[test]
    fn enter_field_is_the_side_walked_in_through() {
        assert_eq!(Field::exit(Dir::N), Field::ExitN);
        assert_eq!(Field::enter(Dir::N), Field::EnterS);
        assert_eq!(Field::enter(Dir::E), Field::EnterW);
        assert_eq!(Field::enter(Dir::U), Field::EnterD);
    }

    #[test]
    fn cache_hits_on_same_source_only() {
        let weights = Weights::new(2, 2);
        let cache = TranslationCache::new();
        let room: Rc<[u16]> = vec![0, 0, 1, 1].into();
        let first = cache.translate(&weights, &room, 2, 1);
        let again = cache.translate(&weights, &room, 2, 1);
        assert!(Rc::ptr_eq(&first, &again));

        let copy: Rc<[u16]> = room.to_vec().into();
        let other = cache.translate(&weights, &copy, 2, 1);
        assert!(!Rc::ptr_eq(&first, &other));
        assert_eq!(&*first, &*other);
    }

    #[test]
    fn describe_draws_one_block_per_row() {
        let mut weights = Weights::new(2, 1);
        weights.add_simple_weight(1, 0, BLOCKED_WEIGHT, 1);
        let offsets = weights.translate(&[0, 0, 1, 0], 2, 1);
        let text = weights.describe(&offsets, 2, 1, BLOCKED_WEIGHT, None, None);
        assert!(text.contains('┌'));
        assert!(text.contains('┘'));
        // five lines plus the closing border
        assert_eq!(text.trim_start().lines().count(), 6);
    }
}
