use crate::dirs::Coord;
use crate::error::Fault;
use crate::rooms::{Overlay, RegionDisplay, Turn};
use crate::script::{Action, Runner};
use crate::tiles::{ExpandOptions, Region};
use anyhow::{anyhow, Result};
use std::rc::Rc;

/// Actions that build regions on a [`Turn`] and draw them on a display
pub struct RegionActor<D> {
    display: Rc<D>,
}

impl<D: RegionDisplay + 'static> RegionActor<D> {
    pub fn new(display: Rc<D>) -> Self {
        RegionActor { display }
    }

    /// Creates a region the size of the display, `build` adds its modifiers
    /// and says where to expand from. Stored on `dest`, or as `region`.
    pub fn generate<E, F>(&self, dest: Option<&str>, build: F) -> Action<Turn<E>>
    where
        E: Clone + 'static,
        F: Fn(&Turn<E>, &mut Region) -> Result<ExpandOptions> + 'static,
    {
        let display = self.display.clone();
        let dest = dest.map(String::from);
        Runner::action("Regions.generate", move |mut turn: Turn<E>, _| {
            let (cols, rows) = display.dimensions();
            let mut region = Region::new(cols, rows, 1);
            let options = build(&turn, &mut region)?;
            region.expand(&options).map_err(anyhow::Error::from)?;

            turn.store_region(dest.as_deref(), Rc::new(region));
            Ok(turn)
        })
        .into()
    }

    /// Shows the region (`which`, or the main one), or only its `sub` pool
    /// when given. Undoing hides it again.
    pub fn display<E: Clone + 'static>(
        &self,
        name: &str,
        colour: &str,
        which: Option<&str>,
        sub: Option<&str>,
    ) -> Action<Turn<E>> {
        let display = self.display.clone();
        let hide_from = self.display.clone();
        let name = name.to_string();
        let hidden = name.clone();
        let colour = colour.to_string();
        let which = which.map(String::from);
        let sub = sub.map(String::from);

        Runner::action("Regions.display", move |turn: Turn<E>, _| {
            let region = turn
                .region_named(which.as_deref())
                .ok_or_else(|| anyhow!("No region to display as : {}", name))?;
            let overlay = match &sub {
                Some(sub) => Overlay::SubRegion {
                    region,
                    colour: colour.clone(),
                    sub: sub.clone(),
                },
                None => Overlay::Region {
                    region,
                    colour: colour.clone(),
                },
            };
            display.show(&name, overlay);
            Ok(turn)
        })
        .inverse(move |_| {
            hide_from.hide(&hidden);
            Err(Fault::cancel())
        })
        .into()
    }

    /// Starts an empty path on the first origin of the region
    /// - `clamp` keeps the path from being grown outside the region
    pub fn make_path<E: Clone + 'static>(&self, which: Option<&str>, clamp: bool) -> Action<Turn<E>> {
        let which = which.map(String::from);
        Runner::action("Regions.makePath", move |mut turn: Turn<E>, _| {
            let region = turn
                .region_named(which.as_deref())
                .ok_or_else(|| anyhow!("No region to make a path in"))?;
            turn.path = Some(region.empty_path(clamp));
            Ok(turn)
        })
        .into()
    }

    /// Shows the turn's path, undoing hides it again
    pub fn display_path<E: Clone + 'static>(&self, name: &str, image: &str) -> Action<Turn<E>> {
        let display = self.display.clone();
        let hide_from = self.display.clone();
        let name = name.to_string();
        let hidden = name.clone();
        let image = image.to_string();

        Runner::action("Regions.displayPath", move |turn: Turn<E>, _| {
            let path = turn
                .path
                .clone()
                .ok_or_else(|| anyhow!("No path to display as : {}", name))?;
            display.show(
                &name,
                Overlay::Path {
                    path,
                    image: image.clone(),
                },
            );
            Ok(turn)
        })
        .inverse(move |_| {
            hide_from.hide(&hidden);
            Err(Fault::cancel())
        })
        .into()
    }

    /// Takes overlays down, remembering them so undoing puts them back
    /// - names that aren't showing are skipped
    pub fn un_display<E: Clone + 'static>(&self, names: &[&str]) -> Action<Turn<E>> {
        let display = self.display.clone();
        let show_on = self.display.clone();
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();

        Runner::action("Regions.unDisplay", move |mut turn: Turn<E>, _| {
            turn.removed = names
                .iter()
                .filter_map(|name| display.hide(name).map(|o| (name.clone(), o)))
                .collect();
            Ok(turn)
        })
        .inverse(move |turn: Turn<E>| {
            for (name, overlay) in &turn.removed {
                show_on.show(name, overlay.clone());
            }
            Err(Fault::cancel())
        })
        .into()
    }

    /// Replaces `to` (or `region`) with the child region `name` that grew
    /// from the tile at the turn's x and y of `from` (or `region`)
    pub fn get_sub_region<E: Clone + 'static>(
        &self,
        name: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Action<Turn<E>> {
        let name = name.to_string();
        let from = from.map(String::from);
        let to = to.map(String::from);

        Runner::action("Regions.getSubRegion", move |mut turn: Turn<E>, _| {
            let region = turn
                .region_named(from.as_deref())
                .ok_or_else(|| anyhow!("No region to take {} from", name))?;
            let at = Coord::new(turn.x, turn.y, 0);
            let child = region
                .get_child(at, &name)
                .ok_or_else(|| anyhow!("No {} sub-region at : {}", name, at))?;
            turn.store_region(to.as_deref(), child);
            Ok(turn)
        })
        .into()
    }
}
