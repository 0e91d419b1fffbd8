use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Source of node storage for a tree.
///
/// A pool only does the accounting: the nodes themselves live in the tree's
/// arena. Trees that share a pool share its budget.
pub trait NodePool: Send + Sync {
    /// Charge `count` more nodes to this pool
    fn acquire(&self, count: usize) -> Result<(), AllocError>;

    /// Return `count` nodes previously acquired
    fn release(&self, count: usize);

    /// Return the number of nodes currently charged to this pool
    fn in_use(&self) -> usize;
}

/// A pool that never refuses a request
#[derive(Debug, Default)]
pub struct Unbounded {
    in_use: AtomicUsize,
}

impl NodePool for Unbounded {
    fn acquire(&self, count: usize) -> Result<(), AllocError> {
        self.in_use
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                used.checked_add(count)
            })
            .map(|_| ())
            .map_err(|_| AllocError::CapacityOverflow)
    }

    fn release(&self, count: usize) {
        let previous = self.in_use.fetch_sub(count, Ordering::Relaxed);
        debug_assert!(previous >= count, "released more nodes than acquired");
    }

    fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }
}

/// A pool that hands out at most `limit` nodes at any time
#[derive(Debug)]
pub struct Bounded {
    limit: usize,
    in_use: AtomicUsize,
}

impl Bounded {
    pub fn new(limit: usize) -> Self {
        Bounded {
            limit,
            in_use: AtomicUsize::new(0),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl NodePool for Bounded {
    fn acquire(&self, count: usize) -> Result<(), AllocError> {
        let limit = self.limit;
        self.in_use
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                used.checked_add(count).filter(|&total| total <= limit)
            })
            .map(|_| ())
            .map_err(|in_use| AllocError::Exhausted {
                requested: count,
                in_use,
                limit,
            })
    }

    fn release(&self, count: usize) {
        let previous = self.in_use.fetch_sub(count, Ordering::Relaxed);
        debug_assert!(previous >= count, "released more nodes than acquired");
    }

    fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }
}

/// Whether an allocator follows the tree contents on assignment and swap.
///
/// The policy of the *destination* tree is the one consulted. When a flag is
/// off and the two allocators differ, the values are copied or relocated into
/// nodes taken from the destination's own allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Propagation {
    pub on_copy_assign: bool,
    pub on_move_assign: bool,
    pub on_swap: bool,
}

impl Propagation {
    /// Never propagate: every tree keeps the allocator it was built with
    pub const NEVER: Propagation = Propagation {
        on_copy_assign: false,
        on_move_assign: false,
        on_swap: false,
    };

    /// Always propagate
    pub const ALWAYS: Propagation = Propagation {
        on_copy_assign: true,
        on_move_assign: true,
        on_swap: true,
    };
}

/// Handle to a node pool plus the propagation policy of the tree owning it.
///
/// Two allocators compare equal when they share the same pool, regardless of
/// their policies. Nodes charged through one can be released through the other.
#[derive(Clone)]
pub struct Allocator {
    pool: Arc<dyn NodePool>,
    propagation: Propagation,
}

impl Allocator {
    /// A fresh unbounded pool that propagates on move assignment and swap
    pub fn new() -> Self {
        Allocator::with_pool(Arc::new(Unbounded::default()))
    }

    /// A fresh pool limited to `limit` live nodes
    pub fn bounded(limit: usize) -> Self {
        Allocator::with_pool(Arc::new(Bounded::new(limit)))
    }

    /// Wrap an existing pool, possibly shared with other allocators
    pub fn with_pool(pool: Arc<dyn NodePool>) -> Self {
        Allocator {
            pool,
            propagation: Propagation {
                on_copy_assign: false,
                on_move_assign: true,
                on_swap: true,
            },
        }
    }

    /// Replace the propagation policy
    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    /// Return the number of nodes currently charged to the underlying pool
    pub fn in_use(&self) -> usize {
        self.pool.in_use()
    }

    pub(super) fn acquire(&self, count: usize) -> Result<(), AllocError> {
        if count == 0 {
            return Ok(());
        }
        self.pool.acquire(count).map_err(|error| {
            log::debug!("node pool refused {} node(s): {}", count, error);
            error
        })
    }

    pub(super) fn release(&self, count: usize) {
        if count > 0 {
            self.pool.release(count);
        }
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Allocator::new()
    }
}

impl PartialEq for Allocator {
    fn eq(&self, other: &Self) -> bool {
        // Compare the data pointers only: vtables may be duplicated across codegen units
        Arc::as_ptr(&self.pool) as *const () == Arc::as_ptr(&other.pool) as *const ()
    }
}

impl Eq for Allocator {}

impl fmt::Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("pool", &(Arc::as_ptr(&self.pool) as *const ()))
            .field("in_use", &self.in_use())
            .field("propagation", &self.propagation)
            .finish()
    }
}

/// Failure to obtain storage for new nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The pool would go over its limit
    Exhausted {
        requested: usize,
        in_use: usize,
        limit: usize,
    },
    /// The node count does not fit in the address space
    CapacityOverflow,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::Exhausted {
                requested,
                in_use,
                limit,
            } => write!(
                f,
                "node pool exhausted: requested {} with {} of {} in use",
                requested, in_use, limit
            ),
            AllocError::CapacityOverflow => write!(f, "node capacity overflow"),
        }
    }
}

impl std::error::Error for AllocError {}
