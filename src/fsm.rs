use std::fmt::Debug;

use crate::error::FsmError;

/// An enumerated set of behavior states the machine can be in.
///
/// `COUNT` sizes the per-state tables; it is a constant rather than an enum
/// variant so a sentinel can never become the current state.
pub trait StateId: Copy + Eq + Debug + 'static {
    const COUNT: usize;

    /// Dense index in `0..COUNT`, in declaration order.
    fn index(self) -> usize;

    /// Every declared state, in declaration order.
    fn all() -> &'static [Self];
}

/// Read-only view of the machine handed to conditions, callbacks and behaviors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick<S> {
    pub state: S,
    /// Frames spent in `state`. Zero on the frame the state was entered.
    pub timer: u32,
}

impl<S> Tick<S> {
    /// `timer mod cycle`, for states with an internal repeat cycle.
    pub fn wrapped(&self, cycle: u32) -> u32 {
        self.timer % cycle.max(1)
    }
}

/// Reported by [`StateMachine::tick`] when a transition fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transitioned<S> {
    pub from: S,
    pub to: S,
}

/// Per-state update routine. Closures and plain `fn(&mut C, Tick<S>)` items
/// implement it directly.
pub trait StateBehavior<S, C> {
    fn update(&mut self, ctx: &mut C, tick: Tick<S>);
}

impl<S, C, F> StateBehavior<S, C> for F
where
    F: FnMut(&mut C, Tick<S>),
{
    fn update(&mut self, ctx: &mut C, tick: Tick<S>) {
        self(ctx, tick)
    }
}

type Condition<S, C> = Box<dyn Fn(&C, Tick<S>) -> bool>;
type Callback<S, C> = Box<dyn FnMut(&mut C, Tick<S>)>;
type Selector<S, C> = Box<dyn FnMut(&mut C, S) -> S>;
type EnterHook<S, C> = Box<dyn FnMut(&mut C, Transitioned<S>)>;

/// One candidate transition out of a state.
///
/// `target == None` defers the destination to the selector installed with
/// [`StateMachineBuilder::set_selector`].
pub struct Transition<S, C> {
    target: Option<S>,
    priority: bool,
    condition: Condition<S, C>,
    on_trigger: Option<Callback<S, C>>,
}

impl<S, C> Transition<S, C> {
    fn new(target: Option<S>, priority: bool, condition: Condition<S, C>) -> Self {
        Self {
            target,
            priority,
            condition,
            on_trigger: None,
        }
    }

    /// Attach a side effect that runs once, just before the state switches.
    pub fn on_trigger(&mut self, callback: impl FnMut(&mut C, Tick<S>) + 'static) -> &mut Self {
        self.on_trigger = Some(Box::new(callback));
        self
    }
}

/// A transition that applies to every declared state except `excluded`.
struct GlobalTransition<S, C> {
    transition: Transition<S, C>,
    excluded: Vec<S>,
}

#[derive(Clone, Copy)]
enum Hit {
    Global(usize),
    Local(usize),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects transitions, behaviors and the selector, then checks the wiring
/// in [`build`](Self::build). The registry is write-once: a built machine
/// cannot gain or lose transitions.
pub struct StateMachineBuilder<S: StateId, C> {
    initial: S,
    locals: Vec<Vec<Transition<S, C>>>,
    globals: Vec<GlobalTransition<S, C>>,
    behaviors: Vec<Option<Box<dyn StateBehavior<S, C>>>>,
    selector: Option<Selector<S, C>>,
    on_enter: Option<EnterHook<S, C>>,
}

impl<S: StateId, C> StateMachineBuilder<S, C> {
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            locals: (0..S::COUNT).map(|_| Vec::new()).collect(),
            globals: Vec::new(),
            behaviors: (0..S::COUNT).map(|_| None).collect(),
            selector: None,
            on_enter: None,
        }
    }

    /// Append a transition to `source`'s ordered list.
    pub fn register_transition(
        &mut self,
        source: S,
        target: Option<S>,
        priority: bool,
        condition: impl Fn(&C, Tick<S>) -> bool + 'static,
    ) -> &mut Transition<S, C> {
        let list = &mut self.locals[source.index()];
        list.push(Transition::new(target, priority, Box::new(condition)));
        let last = list.len() - 1;
        &mut list[last]
    }

    /// Register one transition on every declared state except `excluded`.
    /// Global entries are evaluated before local ones within the same tier.
    pub fn register_global_transition(
        &mut self,
        target: Option<S>,
        priority: bool,
        condition: impl Fn(&C, Tick<S>) -> bool + 'static,
        excluded: &[S],
    ) -> &mut Transition<S, C> {
        self.globals.push(GlobalTransition {
            transition: Transition::new(target, priority, Box::new(condition)),
            excluded: excluded.to_vec(),
        });
        let last = self.globals.len() - 1;
        &mut self.globals[last].transition
    }

    /// Install the update routine for `state`. Exactly one per state.
    pub fn register_behavior(
        &mut self,
        state: S,
        behavior: impl StateBehavior<S, C> + 'static,
    ) -> Result<&mut Self, FsmError> {
        let slot = &mut self.behaviors[state.index()];
        if slot.is_some() {
            return Err(FsmError::DuplicateBehavior {
                state: format!("{state:?}"),
            });
        }
        *slot = Some(Box::new(behavior));
        Ok(self)
    }

    /// Resolves `None` targets. Receives the state being left.
    pub fn set_selector(&mut self, selector: impl FnMut(&mut C, S) -> S + 'static) -> &mut Self {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Runs after every switch, before the new state's behavior.
    pub fn on_enter(&mut self, hook: impl FnMut(&mut C, Transitioned<S>) + 'static) -> &mut Self {
        self.on_enter = Some(Box::new(hook));
        self
    }

    /// Check the wiring and produce a runnable machine.
    ///
    /// Every state that can become current must have a behavior: the initial
    /// state, every explicit target, and (once a selector exists, since it may
    /// return anything) every declared state.
    pub fn build(self) -> Result<StateMachine<S, C>, FsmError> {
        let missing = |state: S| FsmError::MissingBehavior {
            state: format!("{state:?}"),
        };
        let has_behavior = |state: S| self.behaviors[state.index()].is_some();

        if !has_behavior(self.initial) {
            return Err(missing(self.initial));
        }

        for &source in S::all() {
            for t in &self.locals[source.index()] {
                match t.target {
                    Some(target) if !has_behavior(target) => return Err(missing(target)),
                    None if self.selector.is_none() => {
                        return Err(FsmError::MissingSelector {
                            source_state: format!("{source:?}"),
                        })
                    }
                    _ => {}
                }
            }
        }

        for g in &self.globals {
            match g.transition.target {
                Some(target) if !has_behavior(target) => return Err(missing(target)),
                None if self.selector.is_none() => {
                    // Report the first state the global applies to.
                    let source = S::all()
                        .iter()
                        .copied()
                        .find(|s| !g.excluded.contains(s))
                        .unwrap_or(self.initial);
                    return Err(FsmError::MissingSelector {
                        source_state: format!("{source:?}"),
                    });
                }
                _ => {}
            }
        }

        if self.selector.is_some() {
            if let Some(&state) = S::all().iter().find(|s| !has_behavior(**s)) {
                return Err(missing(state));
            }
        }

        Ok(StateMachine {
            state: self.initial,
            previous: self.initial,
            timer: 0,
            entered_this_tick: true,
            locals: self.locals,
            globals: self.globals,
            behaviors: self.behaviors,
            selector: self.selector,
            on_enter: self.on_enter,
        })
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Timer-driven finite-state machine over an enumerated `S`, driving a
/// context `C` it does not own.
///
/// Each [`tick`](Self::tick):
/// 1. advances the frame timer by one,
/// 2. evaluates transitions for the current state (priority tier first;
///    within a tier, global entries before local ones, each in registration
///    order) and fires the first whose condition holds,
/// 3. runs the behavior of the (possibly new) current state.
///
/// # Usage
/// ```ignore
/// let mut builder = StateMachineBuilder::new(Mode::Idle);
/// builder.register_transition(Mode::Idle, Some(Mode::Busy), false, |ctx: &Ctx, t| t.timer >= 30);
/// builder.register_behavior(Mode::Idle, idle)?;
/// builder.register_behavior(Mode::Busy, busy)?;
/// let mut fsm = builder.build()?;
/// // Each frame:
/// fsm.tick(&mut ctx);
/// ```
pub struct StateMachine<S: StateId, C> {
    state: S,
    previous: S,
    timer: u32,
    entered_this_tick: bool,
    locals: Vec<Vec<Transition<S, C>>>,
    globals: Vec<GlobalTransition<S, C>>,
    behaviors: Vec<Option<Box<dyn StateBehavior<S, C>>>>,
    selector: Option<Selector<S, C>>,
    on_enter: Option<EnterHook<S, C>>,
}

impl<S: StateId, C> StateMachine<S, C> {
    pub fn state(&self) -> S {
        self.state
    }

    pub fn previous(&self) -> S {
        self.previous
    }

    /// Frames elapsed in the current state. Reset to 0 on each transition.
    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn view(&self) -> Tick<S> {
        Tick {
            state: self.state,
            timer: self.timer,
        }
    }

    /// Returns `true` only during the tick in which the current state was entered.
    pub fn just_entered(&self) -> bool {
        self.entered_this_tick
    }

    /// Run one simulation frame against `ctx`.
    pub fn tick(&mut self, ctx: &mut C) -> Option<Transitioned<S>> {
        self.timer += 1;
        self.entered_this_tick = false;

        let fired = self.evaluate(ctx);

        let tick = self.view();
        if let Some(behavior) = self.behaviors[self.state.index()].as_mut() {
            behavior.update(ctx, tick);
        }
        fired
    }

    /// Overwrite state and timer from replicated data. No callbacks run.
    pub fn sync_to(&mut self, state: S, timer: u32) {
        if state != self.state {
            self.previous = self.state;
            self.state = state;
            self.entered_this_tick = true;
        }
        self.timer = timer;
    }

    fn find(&self, ctx: &C, tick: Tick<S>) -> Option<Hit> {
        let locals = &self.locals[self.state.index()];
        for priority in [true, false] {
            let global = self.globals.iter().position(|g| {
                g.transition.priority == priority
                    && !g.excluded.contains(&self.state)
                    && (g.transition.condition)(ctx, tick)
            });
            if let Some(i) = global {
                return Some(Hit::Global(i));
            }

            let local = locals
                .iter()
                .position(|t| t.priority == priority && (t.condition)(ctx, tick));
            if let Some(i) = local {
                return Some(Hit::Local(i));
            }
        }
        None
    }

    fn evaluate(&mut self, ctx: &mut C) -> Option<Transitioned<S>> {
        let tick = self.view();
        let hit = self.find(ctx, tick)?;

        let transition = match hit {
            Hit::Global(i) => &mut self.globals[i].transition,
            Hit::Local(i) => &mut self.locals[self.state.index()][i],
        };
        if let Some(callback) = transition.on_trigger.as_mut() {
            callback(ctx, tick);
        }
        let target = transition.target;

        let from = self.state;
        let to = match (target, self.selector.as_mut()) {
            (Some(target), _) => target,
            (None, Some(select)) => select(ctx, from),
            // `build` rejects selector-less `None` targets.
            (None, None) => from,
        };

        self.previous = from;
        self.state = to;
        self.timer = 0;
        self.entered_this_tick = true;

        tracing::debug!(target: "fsm", ?from, ?to, "state transition");
        let switched = Transitioned { from, to };
        if let Some(hook) = self.on_enter.as_mut() {
            hook(ctx, switched);
        }
        Some(switched)
    }
}
