use crate::config::EngineConfig;
use crate::error::{Cancel, Fault, RunError};
use async_trait::async_trait;
use futures::future::{FutureExt, LocalBoxFuture};
use std::future::Future;
use std::rc::Rc;

pub type Cond<V> = Rc<dyn Fn(&V) -> bool>;
pub type ActionFuture<V> = LocalBoxFuture<'static, Result<V, Fault>>;

/// One unit of work in a script, and how to take it back.
///
/// `forward` gets the value produced by the previous action and returns the
/// value for the next one. It may queue more actions through `add`, these run
/// straight after it, before anything that was already queued.
///
/// `inverse` is called while a script is being cancelled. It gets the value
/// its own `forward` produced, unless the newer inverse before it resolved,
/// in which case it gets that value instead. Rejecting with [`Cancel`] hands
/// the next older inverse its own output again.
#[async_trait(?Send)]
pub trait Act<V: 'static> {
    fn name(&self) -> &str {
        "unnamed"
    }

    async fn forward(&self, value: V, add: &mut Additions<V>) -> Result<V, Fault>;

    async fn inverse(&self, _value: V) -> Result<V, Fault> {
        Err(Fault::cancel())
    }

    /// Checkpoints stop a cancellation: when their inverse resolves, the
    /// script runs forward again from the checkpoint itself
    fn is_checkpoint(&self) -> bool {
        false
    }
}

/// TABLE:
/// ┌────────────┬──────────────────────────────────────────────────┐
/// │ Variant    │ When it runs                                     │
/// ├────────────┼──────────────────────────────────────────────────┤
/// │ Step       │ user code, forward + inverse                     │
/// │ Branch     │ queues `then` or `otherwise` depending on cond   │
/// │ Loop       │ queues `body` again and again while cond holds   │
/// │ Sequence   │ queues `body` once                               │
/// └────────────┴──────────────────────────────────────────────────┘
/// - the control flow variants pass the value through untouched, and
///   undoing them does nothing (their queued actions undo themselves)
pub enum Action<V> {
    Step(Rc<dyn Act<V>>),
    Branch {
        cond: Cond<V>,
        then: Vec<Action<V>>,
        otherwise: Vec<Action<V>>,
    },
    Loop {
        cond: Cond<V>,
        body: Vec<Action<V>>,
    },
    Sequence(Vec<Action<V>>),
}

impl<V> Clone for Action<V> {
    fn clone(&self) -> Self {
        match self {
            Action::Step(act) => Action::Step(act.clone()),
            Action::Branch {
                cond,
                then,
                otherwise,
            } => Action::Branch {
                cond: cond.clone(),
                then: then.clone(),
                otherwise: otherwise.clone(),
            },
            Action::Loop { cond, body } => Action::Loop {
                cond: cond.clone(),
                body: body.clone(),
            },
            Action::Sequence(body) => Action::Sequence(body.clone()),
        }
    }
}

impl<V: 'static> Action<V> {
    pub fn step(act: impl Act<V> + 'static) -> Self {
        Action::Step(Rc::new(act))
    }

    pub fn name(&self) -> &str {
        match self {
            Action::Step(act) => act.name(),
            Action::Branch { .. } => "if",
            Action::Loop { .. } => "while",
            Action::Sequence(_) => "actions",
        }
    }

    fn is_checkpoint(&self) -> bool {
        matches!(self, Action::Step(act) if act.is_checkpoint())
    }
}

// Queue entries, `Recheck` sits after every repeated block
enum Entry<V> {
    Run(Action<V>),
    Recheck { cond: Cond<V>, body: Vec<Action<V>> },
}

impl<V> Clone for Entry<V> {
    fn clone(&self) -> Self {
        match self {
            Entry::Run(action) => Entry::Run(action.clone()),
            Entry::Recheck { cond, body } => Entry::Recheck {
                cond: cond.clone(),
                body: body.clone(),
            },
        }
    }
}

fn repeated<V>(body: Vec<Action<V>>, cond: Cond<V>) -> impl Iterator<Item = Entry<V>> {
    let recheck = Entry::Recheck {
        cond,
        body: body.clone(),
    };
    body.into_iter().map(Entry::Run).chain(std::iter::once(recheck))
}

/// Actions queued by the action currently running
/// - honoured once the action resolves, calls made later are lost
/// - several calls queue their blocks in call order
pub struct Additions<V> {
    entries: Vec<Entry<V>>,
}

impl<V> Additions<V> {
    fn new() -> Self {
        Additions { entries: vec![] }
    }

    pub fn add(&mut self, actions: Vec<Action<V>>) {
        self.entries.extend(actions.into_iter().map(Entry::Run));
    }

    /// Queues `actions`, and after they have all run queues them again for
    /// as long as `repeat` holds for the value at that point
    pub fn add_repeating(&mut self, actions: Vec<Action<V>>, repeat: Cond<V>) {
        self.entries.extend(repeated(actions, repeat));
    }

    pub fn add_actions(&mut self, actions: Vec<Action<V>>, repeat: Option<Cond<V>>) {
        match repeat {
            Some(cond) => self.add_repeating(actions, cond),
            None => self.add(actions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type Forward<V> = dyn Fn(V, &mut Additions<V>) -> ActionFuture<V>;
type Inverse<V> = dyn Fn(V) -> ActionFuture<V>;

/// An [`Act`] made of closures, see [`Runner::action`] and [`Runner::task`]
pub struct FnAction<V> {
    name: String,
    forward: Box<Forward<V>>,
    inverse: Option<Box<Inverse<V>>>,
    checkpoint: bool,
}

impl<V: 'static> FnAction<V> {
    pub fn inverse<F>(mut self, f: F) -> Self
    where
        F: Fn(V) -> Result<V, Fault> + 'static,
    {
        self.inverse = Some(Box::new(move |value: V| {
            futures::future::ready(f(value)).boxed_local()
        }));
        self
    }

    pub fn inverse_task<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(V) -> Fut + 'static,
        Fut: Future<Output = Result<V, Fault>> + 'static,
    {
        self.inverse = Some(Box::new(move |value: V| f(value).boxed_local()));
        self
    }

    pub fn checkpoint(mut self) -> Self {
        self.checkpoint = true;
        self
    }
}

#[async_trait(?Send)]
impl<V: 'static> Act<V> for FnAction<V> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn forward(&self, value: V, add: &mut Additions<V>) -> Result<V, Fault> {
        (self.forward)(value, add).await
    }

    async fn inverse(&self, value: V) -> Result<V, Fault> {
        match &self.inverse {
            Some(f) => f(value).await,
            None => Err(Fault::cancel()),
        }
    }

    fn is_checkpoint(&self) -> bool {
        self.checkpoint
    }
}

impl<V: 'static> From<FnAction<V>> for Action<V> {
    fn from(action: FnAction<V>) -> Self {
        Action::step(action)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Completed,
    Canceled,
    Failed,
}

/// How a run ended, before it is turned into a `Result` for the caller
#[derive(Debug)]
pub enum Outcome<V> {
    Completed(V),
    Canceled(Cancel),
    Failed(anyhow::Error),
}

enum Unwound<V> {
    // a checkpoint took the script back, carry on forwards with this value
    Resume(V),
    Finished(Outcome<V>),
}

struct Done<V> {
    action: Action<V>,
    index: usize,
    // what forward produced, handed to inverse when nothing newer resolved
    output: V,
    // queue as it was before a checkpoint first ran
    before: Option<Vec<Entry<V>>>,
}

/// Runs a script, one action at a time.
///
/// TABLE:
/// ┌───────────────────────── Runner::start ──────────────────────────┐
/// │                                                                  │
/// │   queue: [ A ][ B ][ if ][ C ]        completed: []              │
/// │            ▲ cursor                                              │
/// │                                                                  │
/// │   A ok ──► completed: [A]                                        │
/// │   B ok ──► completed: [A, B]                                     │
/// │   if   ──► queue: [ A ][ B ][ if ][ then.. ][ C ]                │
/// │   C rejects Cancel                                               │
/// │        └─► inverse(B) ─► inverse(A) ─► Err(Canceled)             │
/// │   C rejects anything else                                        │
/// │        └─► Err(Failed), nothing undone                           │
/// └──────────────────────────────────────────────────────────────────┘
/// - never more than one forward/inverse in flight
/// - the value each action produced is kept next to it, so undoing an
///   action sees its own output and not whatever came after
pub struct Runner<V> {
    script: Vec<Action<V>>,
    queue: Vec<Entry<V>>,
    cursor: usize,
    completed: Vec<Done<V>>,
    state: RunnerState,
    trace: bool,
}

impl<V: Clone + 'static> Runner<V> {
    pub fn new(script: Vec<Action<V>>) -> Self {
        Runner {
            script,
            queue: vec![],
            cursor: 0,
            completed: vec![],
            state: RunnerState::Idle,
            trace: false,
        }
    }

    pub fn with_config(script: Vec<Action<V>>, config: &EngineConfig) -> Self {
        Runner {
            trace: config.traces_actions(),
            ..Self::new(script)
        }
    }

    /// A step with a plain forward function
    pub fn action<F>(name: impl Into<String>, forward: F) -> FnAction<V>
    where
        F: Fn(V, &mut Additions<V>) -> Result<V, Fault> + 'static,
    {
        FnAction {
            name: name.into(),
            forward: Box::new(move |value: V, add: &mut Additions<V>| {
                futures::future::ready(forward(value, add)).boxed_local()
            }),
            inverse: None,
            checkpoint: false,
        }
    }

    /// A step whose forward function returns a future
    /// - queue additions before returning the future, the future itself
    ///   can't hold on to `add`
    pub fn task<F, Fut>(name: impl Into<String>, forward: F) -> FnAction<V>
    where
        F: Fn(V, &mut Additions<V>) -> Fut + 'static,
        Fut: Future<Output = Result<V, Fault>> + 'static,
    {
        FnAction {
            name: name.into(),
            forward: Box::new(move |value: V, add: &mut Additions<V>| {
                forward(value, add).boxed_local()
            }),
            inverse: None,
            checkpoint: false,
        }
    }

    /// Always cancels, undoing whatever ran before it
    pub fn cancel() -> Action<V> {
        Self::action("cancel", |_, _| Err(Fault::cancel())).into()
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Runs the script from the top with `init`.
    ///
    /// Resolves with the last action's value, `RunError::Canceled` once a
    /// cancellation has been fully undone, or `RunError::Failed` on the
    /// first real error. A failed runner can't be started again.
    pub async fn start(&mut self, init: V) -> Result<V, RunError> {
        if self.state == RunnerState::Failed {
            return Err(RunError::Poisoned);
        }
        self.queue = self.script.iter().cloned().map(Entry::Run).collect();
        self.cursor = 0;
        self.completed.clear();
        self.state = RunnerState::Running;

        match self.run(init).await {
            Outcome::Completed(value) => {
                self.state = RunnerState::Completed;
                Ok(value)
            }
            Outcome::Canceled(cancel) => {
                self.state = RunnerState::Canceled;
                Err(RunError::Canceled(cancel))
            }
            Outcome::Failed(err) => {
                self.state = RunnerState::Failed;
                Err(RunError::Failed(err))
            }
        }
    }

    async fn run(&mut self, init: V) -> Outcome<V> {
        let mut value = init;
        loop {
            let Some(entry) = self.queue.get(self.cursor).cloned() else {
                return Outcome::Completed(value);
            };

            let action = match entry {
                Entry::Recheck { cond, body } => {
                    if cond(&value) {
                        let again: Vec<Entry<V>> = repeated(body, cond.clone()).collect();
                        self.splice(again);
                    }
                    self.cursor += 1;
                    continue;
                }
                Entry::Run(action) => action,
            };

            let before = action.is_checkpoint().then(|| self.queue.clone());
            let mut add = Additions::new();
            self.trace_action(&action, "forward");

            match forward(&action, value.clone(), &mut add).await {
                Ok(next) => {
                    value = next;
                    self.splice(add.entries);
                    self.completed.push(Done {
                        action,
                        index: self.cursor,
                        before,
                        output: value.clone(),
                    });
                    self.cursor += 1;
                }
                Err(Fault::Error(err)) => return Outcome::Failed(err),
                Err(Fault::Cancel(cancel)) => match self.unwind(cancel).await {
                    Unwound::Resume(back) => value = back,
                    Unwound::Finished(outcome) => return outcome,
                },
            }
        }
    }

    // new entries go right after the cursor
    fn splice(&mut self, entries: Vec<Entry<V>>) {
        let at = self.cursor + 1;
        self.queue.splice(at..at, entries);
    }

    async fn unwind(&mut self, cancel: Cancel) -> Unwound<V> {
        // set when the last inverse resolved instead of cancelling
        let mut resolved: Option<V> = None;
        while let Some(Done {
            action,
            index,
            before,
            output,
        }) = self.completed.pop()
        {
            self.trace_action(&action, "inverse");
            let value = resolved.take().unwrap_or(output);

            let result = match &action {
                Action::Step(act) => act.inverse(value).await,
                _ => Err(Fault::cancel()),
            };

            match result {
                Ok(back) if action.is_checkpoint() => {
                    if let Some(before) = before {
                        self.queue = before;
                    }
                    self.cursor = index;
                    return Unwound::Resume(back);
                }
                Ok(back) => resolved = Some(back),
                Err(Fault::Cancel(_)) => {}
                Err(Fault::Error(err)) => return Unwound::Finished(Outcome::Failed(err)),
            }
        }
        Unwound::Finished(Outcome::Canceled(cancel))
    }

    fn trace_action(&self, action: &Action<V>, direction: &str) {
        if self.trace {
            tracing::debug!(action = action.name(), direction, "running action");
        }
    }
}

async fn forward<V: 'static>(
    action: &Action<V>,
    value: V,
    add: &mut Additions<V>,
) -> Result<V, Fault> {
    match action {
        Action::Step(act) => act.forward(value, add).await,
        Action::Branch {
            cond,
            then,
            otherwise,
        } => {
            if cond(&value) {
                add.add(then.clone());
            } else {
                add.add(otherwise.clone());
            }
            Ok(value)
        }
        Action::Loop { cond, body } => {
            if cond(&value) {
                add.add_repeating(body.clone(), cond.clone());
            }
            Ok(value)
        }
        Action::Sequence(body) => {
            add.add(body.clone());
            Ok(value)
        }
    }
}
