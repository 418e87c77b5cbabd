use crate::Easing;

/// One-shot interpolation from `start` to `end` over `duration` milliseconds.
///
/// The start time is latched by the first [`Tween::tick`]. Once the elapsed
/// time reaches the duration the value snaps to exactly `end` and
/// [`TweenStep::Finished`] is reported once; later ticks report
/// [`TweenStep::Idle`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    start: f32,
    end: f32,
    duration: f64,
    easing: Easing,
    started_at: Option<f64>,
    finished: bool,
}

/// What a tween produced on one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenStep {
    Running(f32),
    /// Final frame: the exact end value.
    Finished(f32),
    /// Completed on an earlier frame.
    Idle,
}

impl Tween {
    pub fn new(start: f32, end: f32, duration_ms: f64) -> Self {
        Self {
            start,
            end,
            duration: duration_ms,
            easing: Easing::Linear,
            started_at: None,
            finished: false,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Value after `elapsed` milliseconds, independent of tick state.
    pub fn sample(&self, elapsed: f64) -> f32 {
        if elapsed >= self.duration {
            return self.end;
        }
        let progress = self.easing.sample(elapsed / self.duration) as f32;
        self.start + progress * (self.end - self.start)
    }

    /// Advance to frame time `now`.
    pub fn tick(&mut self, now: f64) -> TweenStep {
        if self.finished {
            return TweenStep::Idle;
        }
        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = (now - started_at).max(0.0);
        if elapsed >= self.duration {
            self.finished = true;
            TweenStep::Finished(self.end)
        } else {
            TweenStep::Running(self.sample(elapsed))
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// Identifies a tween started on an [`Animator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub u64);

struct Entry<K, E> {
    id: TweenId,
    target: K,
    tween: Tween,
    on_complete: Option<E>,
}

/// A set of running tweens, each writing to a property addressed by `K`.
///
/// Completion is reported as an event of type `E` returned from
/// [`Animator::tick`], fired exactly once per tween that registered one.
pub struct Animator<K, E = ()> {
    entries: Vec<Entry<K, E>>,
    next_id: u64,
}

impl<K: PartialEq, E> Animator<K, E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Start animating `target`. A tween already running on the same target
    /// keeps running; the newer one is applied after it each frame.
    pub fn start(&mut self, target: K, tween: Tween) -> TweenId {
        self.push(target, tween, None)
    }

    /// Start animating `target` and emit `on_complete` when it finishes.
    pub fn start_then(&mut self, target: K, tween: Tween, on_complete: E) -> TweenId {
        self.push(target, tween, Some(on_complete))
    }

    fn push(&mut self, target: K, tween: Tween, on_complete: Option<E>) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            target,
            tween,
            on_complete,
        });
        id
    }

    /// Advance every tween to `now`, passing each current value to `apply`.
    /// Finished tweens are removed; their completion events are returned in
    /// start order.
    pub fn tick(&mut self, now: f64, mut apply: impl FnMut(&K, f32)) -> Vec<E> {
        let mut completed = Vec::new();
        for entry in &mut self.entries {
            match entry.tween.tick(now) {
                TweenStep::Running(value) => apply(&entry.target, value),
                TweenStep::Finished(value) => {
                    apply(&entry.target, value);
                    if let Some(event) = entry.on_complete.take() {
                        completed.push(event);
                    }
                }
                TweenStep::Idle => {}
            }
        }
        let before = self.entries.len();
        self.entries.retain(|e| !e.tween.is_finished());
        if before != self.entries.len() {
            tracing::trace!(finished = before - self.entries.len(), "tweens finished");
        }
        completed
    }

    /// Drop every tween writing to `target` without completing it.
    pub fn cancel_target(&mut self, target: &K) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| &e.target != target);
        before - self.entries.len()
    }

    pub fn is_animating(&self, target: &K) -> bool {
        self.entries.iter().any(|e| &e.target == target)
    }

    pub fn contains(&self, id: TweenId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: PartialEq, E> Default for Animator<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_midpoint_and_exact_end() {
        let tween = Tween::new(0.0, 10.0, 1000.0);
        assert_eq!(tween.sample(500.0), 5.0);
        assert_eq!(tween.sample(1000.0), 10.0);
        assert_eq!(tween.sample(5000.0), 10.0);
    }

    #[test]
    fn tick_latches_start_and_finishes_once() {
        let mut tween = Tween::new(0.0, 10.0, 1000.0);
        assert_eq!(tween.tick(2000.0), TweenStep::Running(0.0));
        assert_eq!(tween.tick(2500.0), TweenStep::Running(5.0));
        assert_eq!(tween.tick(3000.0), TweenStep::Finished(10.0));
        assert_eq!(tween.tick(3016.0), TweenStep::Idle);
        assert!(tween.is_finished());
    }

    #[test]
    fn overshooting_frame_snaps_to_end() {
        let mut tween = Tween::new(-0.3, 0.1, 100.0);
        tween.tick(0.0);
        assert_eq!(tween.tick(117.0), TweenStep::Finished(0.1));
    }

    #[test]
    fn zero_duration_finishes_on_first_tick() {
        let mut tween = Tween::new(1.0, 2.0, 0.0);
        assert_eq!(tween.tick(10.0), TweenStep::Finished(2.0));
    }

    #[test]
    fn quadratic_easing_is_applied() {
        let tween = Tween::new(0.0, 10.0, 1000.0).with_easing(Easing::QuadraticIn);
        assert_eq!(tween.sample(500.0), 2.5);
    }

    #[derive(Debug, PartialEq)]
    enum Done {
        Dropped,
    }

    #[test]
    fn animator_applies_values_and_completes_exactly_once() {
        let mut animator: Animator<&str, Done> = Animator::new();
        animator.start_then("y", Tween::new(0.0, 10.0, 1000.0), Done::Dropped);

        let mut y = f32::NAN;
        assert!(animator.tick(0.0, |_, v| y = v).is_empty());
        assert_eq!(y, 0.0);

        assert!(animator.tick(500.0, |_, v| y = v).is_empty());
        assert_eq!(y, 5.0);

        let done = animator.tick(1000.0, |_, v| y = v);
        assert_eq!(done, vec![Done::Dropped]);
        assert_eq!(y, 10.0);

        assert!(animator.tick(1500.0, |_, v| y = v).is_empty());
        assert!(animator.is_empty());
    }

    #[test]
    fn animator_routes_values_by_target() {
        let mut animator: Animator<usize> = Animator::new();
        animator.start(0, Tween::new(0.0, 1.0, 100.0));
        animator.start(1, Tween::new(5.0, 3.0, 100.0));

        let mut values = [0.0_f32; 2];
        animator.tick(0.0, |&k, v| values[k] = v);
        animator.tick(50.0, |&k, v| values[k] = v);
        assert_eq!(values, [0.5, 4.0]);
    }

    #[test]
    fn cancel_drops_without_completion() {
        let mut animator: Animator<u8, &str> = Animator::new();
        let id = animator.start_then(7, Tween::new(0.0, 1.0, 100.0), "done");
        assert!(animator.contains(id));
        assert!(animator.is_animating(&7));

        assert_eq!(animator.cancel_target(&7), 1);
        assert!(animator.tick(1000.0, |_, _| {}).is_empty());
        assert!(!animator.contains(id));
    }
}
