//! Population membership mechanics: `$index` assignment
//! with slot reuse, sparse removal, and `resize`-driven grow/die. Shared
//! by every generated `*Population` so the emitter only has to call
//! through to [`Membership`] rather than re-deriving the free-list dance
//! per part ("monomorphic templated wrappers" is the strategy
//! picked here).

/// Tracks which instance slots are occupied, independent of the
/// `Vec<Instance>` storage itself. A generated `Population::add` calls
/// [`Membership::acquire`] to get the `$index` to store the new instance
/// at (reusing a freed slot before growing), and `Population::remove`
/// calls [`Membership::release`].
#[derive(Debug, Clone, Default)]
pub struct Membership {
    /// `true` at index `i` iff slot `i` holds a live instance.
    occupied: Vec<bool>,
    /// Freed slot indices available for reuse, most-recently-freed last.
    free: Vec<usize>,
    /// Index of the first instance created since the last [`Self::clear_new`].
    firstborn: usize,
}

impl Membership {
    pub fn new() -> Self {
        Membership::default()
    }

    /// Number of currently-occupied slots (`$n` as tracked by `trackN`).
    pub fn n(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }

    pub fn capacity(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.occupied.get(index).copied().unwrap_or(false)
    }

    /// Assign the next free `$index`: a reused slot if one exists,
    /// otherwise grow by one ("add assigns $index (next free,
    /// or reused from a deleted slot ...)").
    pub fn acquire(&mut self) -> usize {
        if let Some(index) = self.free.pop() {
            self.occupied[index] = true;
            index
        } else {
            let index = self.occupied.len();
            self.occupied.push(true);
            index
        }
    }

    /// Null the slot and return it to the free pool: `remove` nulls the
    /// slot and increments the free pool.
    pub fn release(&mut self, index: usize) {
        if self.is_occupied(index) {
            self.occupied[index] = false;
            self.free.push(index);
        }
    }

    /// Every index newborn since the last `clear_new` call.
    pub fn newborn_range(&self) -> std::ops::Range<usize> {
        self.firstborn..self.occupied.len()
    }

    pub fn is_newborn(&self, index: usize) -> bool {
        index >= self.firstborn
    }

    /// After this call, `is_newborn` is false on every instance that was
    /// indexed `>= the prior firstborn`: advances the newborn boundary to
    /// the current slot count.
    pub fn clear_new(&mut self) {
        self.firstborn = self.occupied.len();
    }

    /// `canResize`-style driver: compute how many `acquire`/`release`
    /// calls are needed to reach `target` occupied slots. Positive ->
    /// caller should `acquire` that many times; negative -> release that
    /// many, oldest-occupied-first ("kills surplus instances
    /// (oldest-first)").
    pub fn resize_plan(&self, target: usize) -> ResizePlan {
        let current = self.n();
        if target > current {
            ResizePlan::Grow(target - current)
        } else if target < current {
            let surplus = current - target;
            let victims: Vec<usize> = self
                .occupied
                .iter()
                .enumerate()
                .filter(|(_, &o)| o)
                .map(|(i, _)| i)
                .take(surplus)
                .collect();
            ResizePlan::Die(victims)
        } else {
            ResizePlan::Noop
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizePlan {
    Noop,
    Grow(usize),
    Die(Vec<usize>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_reuses_released_slots_before_growing() {
        let mut m = Membership::new();
        let a = m.acquire();
        let b = m.acquire();
        m.release(a);
        let c = m.acquire();
        assert_eq!(c, a);
        assert_eq!(m.capacity(), 2);
        assert_eq!(b, 1);
    }

    #[test]
    fn clear_new_marks_existing_instances_no_longer_newborn() {
        let mut m = Membership::new();
        m.acquire();
        m.acquire();
        m.clear_new();
        assert!(!m.is_newborn(0));
        assert!(!m.is_newborn(1));
        let fresh = m.acquire();
        assert!(m.is_newborn(fresh));
    }

    #[test]
    fn resize_plan_grows_when_target_exceeds_n() {
        let m = Membership::new();
        assert_eq!(m.resize_plan(3), ResizePlan::Grow(3));
    }

    #[test]
    fn resize_plan_kills_surplus_oldest_first() {
        let mut m = Membership::new();
        m.acquire();
        m.acquire();
        m.acquire();
        assert_eq!(m.resize_plan(1), ResizePlan::Die(vec![0, 1]));
    }

    #[test]
    fn n_counts_only_occupied_slots() {
        let mut m = Membership::new();
        let a = m.acquire();
        m.acquire();
        m.release(a);
        assert_eq!(m.n(), 1);
        assert_eq!(m.capacity(), 2);
    }
}
