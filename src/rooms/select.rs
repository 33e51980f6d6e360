use crate::dirs::Coord;
use crate::error::Fault;
use crate::rooms::{EntityLayer, Mover, Selector, Turn};
use crate::script::{Action, Runner};
use anyhow::anyhow;
use std::rc::Rc;

/// Actions where the player picks something in the room, and moving things
/// once they have
///
/// Both picks are checkpoints, cancelling a later action asks the player
/// again instead of undoing the pick.
pub struct SelectActor<L, S, M> {
    layer: Rc<L>,
    selector: Rc<S>,
    mover: Rc<M>,
}

impl<L, S, M> SelectActor<L, S, M>
where
    L: EntityLayer + 'static,
    S: Selector + 'static,
    M: Mover<L::Entity> + 'static,
{
    pub fn new(layer: Rc<L>, selector: Rc<S>, mover: Rc<M>) -> Self {
        SelectActor {
            layer,
            selector,
            mover,
        }
    }

    /// Waits for a tile where every entity passes `filter`. There must be at
    /// least one entity on it unless `allow_none` is set.
    pub fn pick_entity<F>(&self, filter: F, allow_none: bool) -> Action<Turn<L::Entity>>
    where
        F: Fn(&L::Entity) -> bool + 'static,
    {
        let layer = self.layer.clone();
        let selector = self.selector.clone();
        let filter = Rc::new(filter);

        Runner::task("Select.pickEntity", move |mut turn: Turn<L::Entity>, _| {
            let layer = layer.clone();
            let selector = selector.clone();
            let filter = filter.clone();
            async move {
                let mut accept = |at: Coord| {
                    let here = layer.entities_on_tile(at, &[]);
                    here.iter().all(|e| filter(e)) && (allow_none || !here.is_empty())
                };
                let at = selector.select(turn.cursor(), &mut accept).await?;

                let here = layer.entities_on_tile(at, &[]);
                turn.entity = here.first().cloned();
                turn.all_entities = here;
                turn.x = at.x;
                turn.y = at.y;
                Ok::<_, Fault>(turn)
            }
        })
        .inverse(Ok)
        .checkpoint()
        .into()
    }

    /// Waits for a tile inside the region (`which`, or the main one) and
    /// stores the cheapest path to it
    pub fn pick_tile(&self, which: Option<&str>) -> Action<Turn<L::Entity>> {
        let selector = self.selector.clone();
        let which = which.map(String::from);

        Runner::task("Select.pickTile", move |mut turn: Turn<L::Entity>, _| {
            let selector = selector.clone();
            let region = turn.region_named(which.as_deref());
            async move {
                let region = region.ok_or_else(|| anyhow!("No region to pick a tile from"))?;
                let mut accept = |at: Coord| region.has(at);
                let at = selector.select(turn.cursor(), &mut accept).await?;

                turn.path = region.path_to(at);
                turn.x = at.x;
                turn.y = at.y;
                Ok::<_, Fault>(turn)
            }
        })
        .inverse(Ok)
        .checkpoint()
        .into()
    }

    /// Walks the picked entity along the path, undoing puts it straight
    /// back where it started
    pub fn follow_path(&self) -> Action<Turn<L::Entity>> {
        let mover = self.mover.clone();
        let undo = self.mover.clone();

        Runner::task("Select.followPath", move |mut turn: Turn<L::Entity>, _| {
            let mover = mover.clone();
            async move {
                let entity = turn
                    .entity
                    .clone()
                    .ok_or_else(|| anyhow!("No entity to move"))?;
                let dirs = turn
                    .path
                    .as_ref()
                    .map(|path| path.dirs())
                    .ok_or_else(|| anyhow!("No path to follow"))?;

                turn.old_position = Some(mover.position(&entity));
                if !dirs.is_empty() {
                    mover.follow(&entity, &dirs).await?;
                }
                Ok::<_, Fault>(turn)
            }
        })
        .inverse(move |turn: Turn<L::Entity>| {
            if let (Some(entity), Some(old)) = (&turn.entity, turn.old_position) {
                undo.place(entity, old);
            }
            Err(Fault::cancel())
        })
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunError;
    use crate::rooms::mocks::{Display, Script, Units};
    use crate::rooms::RegionActor;
    use crate::tiles::{uniform_modifier, ExpandOptions, Region};
    use futures::executor::block_on;

    type T = Turn<u32>;

    fn at(x: i32, y: i32) -> Coord {
        Coord::new(x, y, 0)
    }

    struct Room {
        units: Rc<Units>,
        display: Rc<Display>,
        select: SelectActor<Units, Script, Units>,
        regions: RegionActor<Display>,
    }

    fn room(answers: Vec<Option<Coord>>) -> Room {
        let units = Rc::new(Units::with(&[(7, at(1, 1)), (8, at(4, 4))]));
        let display = Rc::new(Display::sized(6, 6));
        Room {
            select: SelectActor::new(
                units.clone(),
                Rc::new(Script::answering(answers)),
                units.clone(),
            ),
            regions: RegionActor::new(display.clone()),
            units,
            display,
        }
    }

    // pick a unit, show where it can go, pick a tile and go there
    fn move_script(room: &Room) -> Vec<Action<T>> {
        vec![
            room.select.pick_entity(|id: &u32| *id == 7, false),
            room.regions.generate(None, |turn: &T, region| {
                region.add_weight_modifier(uniform_modifier(1));
                Ok(ExpandOptions::within(turn.cursor(), 2))
            }),
            room.regions.display("move", "#0000ff", None, None),
            room.select.pick_tile(None),
            room.select.follow_path(),
            room.regions.un_display(&["move"]),
        ]
    }

    // points the turn at `id` and the cheapest way from it to `to`
    fn aim(units: &Rc<Units>, id: u32, to: Coord) -> Action<T> {
        let units = units.clone();
        Runner::action("aim", move |mut turn: T, _| {
            let mut region = Region::new(6, 6, 1);
            region.add_weight_modifier(uniform_modifier(1));
            region
                .expand(&ExpandOptions::within(units.position(&id), 10))
                .map_err(anyhow::Error::from)?;
            turn.entity = Some(id);
            turn.path = region.path_to(to);
            Ok(turn)
        })
        .into()
    }

    fn run(script: Vec<Action<T>>) -> Result<T, RunError> {
        block_on(Runner::new(script).start(Turn::default()))
    }

    #[test]
    fn pick_entity_skips_tiles_that_dont_qualify() {
        // empty tile, the wrong unit, then ours
        let room = room(vec![Some(at(0, 0)), Some(at(4, 4)), Some(at(1, 1))]);
        let turn = run(vec![room.select.pick_entity(|id: &u32| *id == 7, false)]).unwrap();
        assert_eq!(turn.entity, Some(7));
        assert_eq!(turn.all_entities, vec![7]);
        assert_eq!((turn.x, turn.y), (1, 1));
    }

    #[test]
    fn pick_entity_can_allow_empty_tiles() {
        let room = room(vec![Some(at(0, 0))]);
        let turn = run(vec![room.select.pick_entity(|_: &u32| false, true)]).unwrap();
        assert_eq!(turn.entity, None);
        assert!(turn.all_entities.is_empty());
        assert_eq!((turn.x, turn.y), (0, 0));
    }

    #[test]
    fn whole_move_walks_the_unit() {
        // (5, 5) is out of reach and gets ignored
        let room = room(vec![Some(at(1, 1)), Some(at(5, 5)), Some(at(3, 1))]);
        let turn = run(move_script(&room)).unwrap();

        assert_eq!(room.units.where_is(7), Some(at(3, 1)));
        assert_eq!(turn.old_position, Some(at(1, 1)));
        assert_eq!(turn.path.as_ref().map(|p| p.len()), Some(2));
        assert!(room.display.names().is_empty());
        assert_eq!(turn.removed.len(), 1);
    }

    #[test]
    fn backing_out_undoes_the_move_and_asks_again() {
        // the cancel sends us back to pick_tile, the player presses back
        // there and again at pick_entity
        let room = room(vec![Some(at(1, 1)), Some(at(3, 1)), None, None]);
        let mut script = move_script(&room);
        script.push(Runner::cancel());

        let err = run(script).unwrap_err();
        match err {
            RunError::Canceled(cancel) => assert_eq!(cancel.reason(), "back"),
            other => panic!("expected cancel, got {:?}", other),
        }
        assert_eq!(room.units.where_is(7), Some(at(1, 1)));
        assert!(room.display.names().is_empty());
    }

    #[test]
    fn picking_a_new_tile_after_a_cancel() {
        let room = room(vec![Some(at(1, 1)), Some(at(2, 1)), Some(at(1, 3))]);
        let tries = Rc::new(std::cell::RefCell::new(0));
        let seen = tries.clone();
        // the player rejects the first move
        let confirm: Action<T> = Runner::action("confirm", move |turn: T, _| {
            *seen.borrow_mut() += 1;
            if *seen.borrow() == 1 {
                Err(Fault::cancel())
            } else {
                Ok(turn)
            }
        })
        .into();
        let mut script = move_script(&room);
        script.insert(5, confirm);

        let turn = run(script).unwrap();
        assert_eq!(room.units.where_is(7), Some(at(1, 3)));
        assert_eq!(turn.old_position, Some(at(1, 1)));
        assert_eq!((turn.x, turn.y), (1, 3));
    }

    #[test]
    fn stacked_moves_each_go_back_to_their_own_start() {
        let room = room(vec![]);
        let script = || {
            vec![
                aim(&room.units, 7, at(2, 1)),
                room.select.follow_path(),
                aim(&room.units, 8, at(4, 2)),
                room.select.follow_path(),
            ]
        };
        run(script()).unwrap();
        assert_eq!(room.units.where_is(7), Some(at(2, 1)));
        assert_eq!(room.units.where_is(8), Some(at(4, 2)));

        room.units.place(&7, at(1, 1));
        room.units.place(&8, at(4, 4));
        let mut cancelled = script();
        cancelled.push(Runner::cancel());
        assert!(run(cancelled).unwrap_err().is_cancel());
        assert_eq!(room.units.where_is(7), Some(at(1, 1)));
        assert_eq!(room.units.where_is(8), Some(at(4, 4)));
    }
}
