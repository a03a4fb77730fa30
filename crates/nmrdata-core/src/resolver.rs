//! Per-axis lazy caches for derived parameters.
//!
//! Each cached field is an explicit two-state machine.  Reads of an
//! `Unresolved` field run the caller-supplied computation; a computation may
//! decline to cache its result (degraded defaults are recomputed on every
//! read so that a later header edit or override can still take effect).

use crate::enums::MAXDIM;
use std::cell::{Cell, RefCell};

/// State of one lazily derived value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheState {
    Unresolved,
    Resolved(f64),
}

/// Result of resolving a value from the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Derived from header records; cache it.
    Derived(f64),
    /// Fallback value; return it but leave the cache unresolved.
    Default(f64),
}

impl Resolution {
    pub fn value(self) -> f64 {
        match self {
            Resolution::Derived(v) | Resolution::Default(v) => v,
        }
    }
}

/// A single lazily resolved `f64`.
#[derive(Debug)]
pub struct LazyValue {
    state: Cell<CacheState>,
}

impl Default for LazyValue {
    fn default() -> Self {
        Self {
            state: Cell::new(CacheState::Unresolved),
        }
    }
}

impl LazyValue {
    pub fn state(&self) -> CacheState {
        self.state.get()
    }

    pub fn get_or_resolve(&self, resolve: impl FnOnce() -> Resolution) -> f64 {
        match self.state.get() {
            CacheState::Resolved(v) => v,
            CacheState::Unresolved => match resolve() {
                Resolution::Derived(v) => {
                    self.state.set(CacheState::Resolved(v));
                    v
                }
                Resolution::Default(v) => v,
            },
        }
    }

    /// Overwrite the cache, bypassing resolution.
    pub fn set(&self, value: f64) {
        self.state.set(CacheState::Resolved(value));
    }

    pub fn reset(&self) {
        self.state.set(CacheState::Unresolved);
    }
}

/// A lazily resolved label; empty results are never cached.
#[derive(Debug, Default)]
pub struct LazyLabel {
    value: RefCell<Option<String>>,
}

impl LazyLabel {
    pub fn get_or_resolve(&self, resolve: impl FnOnce() -> String) -> String {
        if let Some(v) = self.value.borrow().as_ref() {
            return v.clone();
        }
        let v = resolve();
        if !v.is_empty() {
            *self.value.borrow_mut() = Some(v.clone());
        }
        v
    }

    pub fn set(&self, value: impl Into<String>) {
        *self.value.borrow_mut() = Some(value.into());
    }

    pub fn reset(&self) {
        *self.value.borrow_mut() = None;
    }

    pub fn is_resolved(&self) -> bool {
        self.value.borrow().is_some()
    }
}

/// Cached derived parameters for one axis.
#[derive(Debug, Default)]
pub struct AxisCache {
    pub sf: LazyValue,
    pub sw: LazyValue,
    pub reference: LazyValue,
    pub nucleus: LazyLabel,
}

/// Caches for every axis a source may have.
///
/// Uses interior mutability, so a source holding it is not `Sync`; callers
/// sharing one source across threads must serialize access.
#[derive(Debug, Default)]
pub struct ParameterCache {
    axes: [AxisCache; MAXDIM],
}

impl ParameterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache of `dim`, or `None` past `MAXDIM`.
    pub fn axis(&self, dim: usize) -> Option<&AxisCache> {
        self.axes.get(dim)
    }

    pub fn reset_all(&self) {
        for axis in &self.axes {
            axis.sf.reset();
            axis.sw.reset();
            axis.reference.reset();
            axis.nucleus.reset();
        }
    }
}
