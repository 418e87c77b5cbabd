use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A lazily recomputed value with manual invalidation.
///
/// The producer receives the scene state by reference and may read other
/// `Cached` handles it captured. Upstream nodes registered through
/// [`Cached::with_dependencies`] are refreshed before this node decides whether
/// it is stale: each node carries a version that is bumped on every
/// recomputation, and a node whose dependency moved to a new version since the
/// last read recomputes even if nobody called [`Cached::set_dirty`] on it.
///
/// Handles are cheap to clone and share the same node.
pub struct Cached<T, S = ()> {
    node: Rc<Node<T, S>>,
}

struct Node<T, S> {
    label: Cell<&'static str>,
    producer: Box<dyn Fn(&S) -> T>,
    value: RefCell<Option<T>>,
    dirty: Cell<bool>,
    version: Cell<u64>,
    upstream: Vec<Dependency<S>>,
}

/// A registered upstream node, together with the version this node last
/// observed from it.
pub struct Dependency<S> {
    node: Rc<dyn Upstream<S>>,
    seen: Cell<u64>,
}

trait Upstream<S> {
    /// Bring the node up to date and report its current version.
    fn refresh(&self, state: &S) -> u64;
}

impl<T, S> Cached<T, S>
where
    T: Clone + 'static,
    S: 'static,
{
    /// Create a node without upstream dependencies.
    pub fn new(producer: impl Fn(&S) -> T + 'static) -> Self {
        Self::with_dependencies(producer, std::iter::empty())
    }

    /// Create a node that is treated as dirty whenever one of `upstream` has
    /// recomputed since this node was last read.
    pub fn with_dependencies(
        producer: impl Fn(&S) -> T + 'static,
        upstream: impl IntoIterator<Item = Dependency<S>>,
    ) -> Self {
        Self {
            node: Rc::new(Node {
                label: Cell::new("cached"),
                producer: Box::new(producer),
                value: RefCell::new(None),
                dirty: Cell::new(true),
                version: Cell::new(0),
                upstream: upstream.into_iter().collect(),
            }),
        }
    }

    /// Attach a label used in trace output.
    pub fn named(self, label: &'static str) -> Self {
        self.node.label.set(label);
        self
    }

    /// Register this node as an upstream dependency of another node.
    pub fn as_dependency(&self) -> Dependency<S> {
        Dependency {
            node: self.node.clone(),
            seen: Cell::new(0),
        }
    }

    /// Return the current value, recomputing it first if this node is dirty,
    /// has never been computed, or one of its dependencies has recomputed.
    pub fn get(&self, state: &S) -> T {
        self.node.ensure(state)
    }

    /// Mark this node stale. Dependents are not notified; they notice through
    /// the version bump when this node is next refreshed.
    pub fn set_dirty(&self) {
        self.node.dirty.set(true);
    }

    /// Whether this node itself is flagged dirty. Does not inspect upstream
    /// nodes.
    pub fn is_dirty(&self) -> bool {
        self.node.dirty.get()
    }

    /// Number of times the producer has run to completion.
    pub fn version(&self) -> u64 {
        self.node.version.get()
    }

    pub fn label(&self) -> &'static str {
        self.node.label.get()
    }
}

impl<T, S> Node<T, S>
where
    T: Clone,
{
    fn ensure(&self, state: &S) -> T {
        let mut stale = self.dirty.get();
        for dep in &self.upstream {
            let current = dep.node.refresh(state);
            if current != dep.seen.get() {
                dep.seen.set(current);
                stale = true;
            }
        }

        if !stale {
            if let Some(value) = self.value.borrow().as_ref() {
                return value.clone();
            }
        }

        let fresh = (self.producer)(state);
        *self.value.borrow_mut() = Some(fresh.clone());
        self.dirty.set(false);
        self.version.set(self.version.get() + 1);
        tracing::trace!(
            label = self.label.get(),
            version = self.version.get(),
            "cached value recomputed"
        );
        fresh
    }
}

impl<T, S> Upstream<S> for Node<T, S>
where
    T: Clone,
{
    fn refresh(&self, state: &S) -> u64 {
        self.ensure(state);
        self.version.get()
    }
}

impl<T, S> Clone for Cached<T, S> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<T: fmt::Debug, S> fmt::Debug for Cached<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cached")
            .field("label", &self.node.label.get())
            .field("value", &self.node.value.borrow())
            .field("dirty", &self.node.dirty.get())
            .field("version", &self.node.version.get())
            .field("upstream", &self.node.upstream.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    #[derive(Default)]
    struct Counter {
        runs: Cell<u32>,
        base: Cell<i32>,
    }

    fn counted(state: &Counter) -> i32 {
        state.runs.set(state.runs.get() + 1);
        state.base.get()
    }

    #[test]
    fn repeated_get_runs_producer_once() {
        let state = Counter::default();
        state.base.set(5);
        let a = Cached::new(counted);

        assert_eq!(a.get(&state), 5);
        assert_eq!(a.get(&state), 5);
        assert_eq!(a.get(&state), 5);
        assert_eq!(state.runs.get(), 1);
        assert!(!a.is_dirty());
    }

    #[test]
    fn set_dirty_recomputes_exactly_once() {
        let state = Counter::default();
        let a = Cached::new(counted);
        a.get(&state);

        state.base.set(9);
        // Not dirtied yet: the stale value is still served.
        assert_eq!(a.get(&state), 0);

        a.set_dirty();
        assert!(a.is_dirty());
        assert_eq!(a.get(&state), 9);
        assert_eq!(a.get(&state), 9);
        assert_eq!(state.runs.get(), 2);
        assert_eq!(a.version(), 2);
    }

    #[test]
    fn dependent_recomputes_when_upstream_dirtied() {
        let state = Counter::default();
        state.base.set(5);
        let a = Cached::new(|s: &Counter| s.base.get());
        let a_read = a.clone();
        let b = Cached::with_dependencies(
            move |s: &Counter| a_read.get(s) * 2,
            [a.as_dependency()],
        );

        assert_eq!(b.get(&state), 10);

        state.base.set(7);
        a.set_dirty();
        assert!(!b.is_dirty());
        assert_eq!(b.get(&state), 14);
    }

    #[test]
    fn dependent_is_not_recomputed_without_upstream_change() {
        let runs = Rc::new(Cell::new(0));
        let a = Cached::new(|_: &()| 1);
        let a_read = a.clone();
        let b_runs = runs.clone();
        let b = Cached::with_dependencies(
            move |s: &()| {
                b_runs.set(b_runs.get() + 1);
                a_read.get(s) + 1
            },
            [a.as_dependency()],
        );

        b.get(&());
        b.get(&());
        b.get(&());
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn invalidation_is_transitive_through_chain() {
        let state = Counter::default();
        state.base.set(1);
        let a = Cached::new(|s: &Counter| s.base.get()).named("a");
        let a_read = a.clone();
        let b = Cached::with_dependencies(
            move |s: &Counter| a_read.get(s) + 10,
            [a.as_dependency()],
        )
        .named("b");
        let b_read = b.clone();
        let c = Cached::with_dependencies(
            move |s: &Counter| b_read.get(s) * 3,
            [b.as_dependency()],
        )
        .named("c");

        assert_eq!(c.get(&state), 33);

        state.base.set(2);
        a.set_dirty();
        assert_eq!(c.get(&state), 36);
        assert_eq!(a.version(), 2);
        assert_eq!(b.version(), 2);
        assert_eq!(c.version(), 2);
        assert_eq!(c.label(), "c");
    }

    #[test]
    fn view_matrix_chain_follows_pan() {
        struct View {
            pan: Cell<f32>,
            dist: f32,
        }
        let view = View {
            pan: Cell::new(0.0),
            dist: 2.0,
        };
        let rotation = Cached::new(|v: &View| Mat4::from_rotation_y(v.pan.get()));
        let rot = rotation.clone();
        let xform = Cached::with_dependencies(
            move |v: &View| rot.get(v) * Mat4::from_translation(Vec3::new(0.0, 0.0, v.dist)),
            [rotation.as_dependency()],
        );

        let eye = xform.get(&view).transform_point3(Vec3::ZERO);
        assert!((eye - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);

        view.pan.set(std::f32::consts::FRAC_PI_2);
        rotation.set_dirty();
        let eye = xform.get(&view).transform_point3(Vec3::ZERO);
        assert!((eye - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn clones_share_state() {
        let a = Cached::new(|_: &()| String::from("x"));
        let b = a.clone();
        a.get(&());
        assert_eq!(b.version(), 1);
        b.set_dirty();
        assert!(a.is_dirty());
    }
}
