use crate::browser;
use crate::error::Fault;
use crate::script::runner::{Action, Runner};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Display;
use std::rc::Rc;

/// Helpful actions for scripts, to be put in a [`Runner`]'s action list
pub struct Actions;

impl Actions {
    /// Cancelling never goes further back than this, use it once the player
    /// shouldn't be able to take back what came before
    pub fn block<V: Clone + 'static>() -> Action<V> {
        Runner::<V>::action("block", |v, _| Ok(v))
            .inverse(Ok)
            .checkpoint()
            .into()
    }

    /// Logs `template`, with every `%` replaced by the value
    pub fn print<V: Clone + Display + 'static>(template: impl Into<String>) -> Action<V> {
        let template = template.into();
        Runner::action("print", move |v: V, _| {
            log!("{}", fill_template(&template, &v));
            Ok(v)
        })
        .into()
    }

    /// Queues `then` when `cond` holds for the value, `otherwise` when not
    pub fn if_<V, F>(cond: F, then: Vec<Action<V>>, otherwise: Vec<Action<V>>) -> Action<V>
    where
        F: Fn(&V) -> bool + 'static,
    {
        Action::Branch {
            cond: Rc::new(cond),
            then,
            otherwise,
        }
    }

    /// Runs `body` over and over while `cond` holds, checking it against
    /// the value each pass of the body produced
    pub fn while_<V, F>(cond: F, body: Vec<Action<V>>) -> Action<V>
    where
        F: Fn(&V) -> bool + 'static,
    {
        Action::Loop {
            cond: Rc::new(cond),
            body,
        }
    }

    /// Queues `body` unconditionally
    pub fn actions<V>(body: Vec<Action<V>>) -> Action<V> {
        Action::Sequence(body)
    }

    /// Runs `body` once per element of whatever `items` returns, each pass
    /// starting with `bind` storing the element on the value. Undoing a pass
    /// puts its element back in front.
    pub fn for_each<V, T, I, B>(items: I, bind: B, body: Vec<Action<V>>) -> Action<V>
    where
        V: Clone + 'static,
        T: Clone + 'static,
        I: Fn(&V) -> Vec<T> + 'static,
        B: Fn(V, T) -> V + 'static,
    {
        let bind = Rc::new(bind);
        Runner::action("forEach", move |v: V, add| {
            let pending: Rc<RefCell<VecDeque<T>>> = Rc::new(RefCell::new(items(&v).into()));
            if pending.borrow().is_empty() {
                return Ok(v);
            }

            let taken: Rc<RefCell<Vec<T>>> = Rc::default();
            let (next, took) = (pending.clone(), taken.clone());
            let (back, undo) = (pending.clone(), taken);
            let bind = bind.clone();
            let update: Action<V> = Runner::action("forEachUpdate", move |v: V, _| {
                let item = next.borrow_mut().pop_front();
                match item {
                    Some(item) => {
                        took.borrow_mut().push(item.clone());
                        Ok(bind(v, item))
                    }
                    None => Ok(v),
                }
            })
            .inverse(move |_| {
                if let Some(item) = undo.borrow_mut().pop() {
                    back.borrow_mut().push_front(item);
                }
                Err(Fault::cancel())
            })
            .into();

            let mut pass = vec![update];
            pass.extend(body.iter().cloned());
            let remaining = pending.clone();
            add.add_repeating(pass, Rc::new(move |_: &V| !remaining.borrow().is_empty()));
            Ok(v)
        })
        .into()
    }

    /// Resolves after `ms` milliseconds (browser only)
    pub fn wait<V: Clone + 'static>(ms: i32) -> Action<V> {
        Runner::task("wait", move |v: V, _| async move {
            browser::sleep(ms).await?;
            Ok::<V, Fault>(v)
        })
        .into()
    }
}

pub fn fill_template(template: &str, value: &impl Display) -> String {
    template.replace('%', &value.to_string())
}
