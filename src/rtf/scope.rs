//! Lexical scope stack: push on `{`, pop on `}`, resolve-by-walking-up in between.

use super::error::{RtfError, RtfResult};
use super::state::{Alignment, FormatState, FullState, PictureValue};
use std::collections::BTreeMap;

/// A partial map from any recognized attribute or destination flag to its
/// value. Only keys explicitly assigned in this scope are `Some`; everything
/// else inherits from the nearest enclosing scope that sets it.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub italic: Option<bool>,
    pub bold: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    pub alignment: Option<Alignment>,

    pub group_skip: Option<bool>,
    pub in_field: Option<bool>,
    pub in_fieldinst: Option<bool>,
    pub in_fieldrslt: Option<bool>,
    pub in_pict: Option<bool>,
    pub picture_attributes: Option<BTreeMap<String, PictureValue>>,
    pub in_blip_uid: Option<bool>,
    pub blip_uid: Option<i64>,
}

impl Scope {
    /// Resets the five formatting attributes (but no destination flag) to
    /// their documented defaults in this scope, per `\plain`.
    pub fn reset_formatting(&mut self) {
        self.italic = Some(false);
        self.bold = Some(false);
        self.underline = Some(false);
        self.strikethrough = Some(false);
        self.alignment = Some(Alignment::Left);
    }
}

fn resolve<T: Clone>(scopes: &[Scope], get: impl Fn(&Scope) -> Option<T>) -> Option<T> {
    scopes.iter().rev().find_map(|s| get(s))
}

/// An ordered sequence of [`Scope`] records, innermost last, plus a cached
/// resolution of the full state (a pure function of the stack, recomputed on
/// every push/pop/write for cheap repeated reads).
pub struct ScopeStack {
    scopes: Vec<Scope>,
    cache: FullState,
}

impl ScopeStack {
    /// Install the root scope with every formatting attribute at its default
    /// and `groupSkip = false`, `inField = false`, per §4.2 Initialization.
    pub fn new() -> Self {
        let mut root = Scope::default();
        root.reset_formatting();
        root.group_skip = Some(false);
        root.in_field = Some(false);

        let mut stack = Self {
            scopes: vec![root],
            cache: FullState::default(),
        };
        stack.recompute();
        stack
    }

    /// Push a fresh, empty scope for an opening `{`.
    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
        self.recompute();
    }

    /// Pop the innermost scope for a closing `}`, returning what was popped.
    ///
    /// Fails if only the root scope remains.
    pub fn pop(&mut self) -> RtfResult<Scope> {
        if self.scopes.len() <= 1 {
            return Err(RtfError::UnbalancedBrace);
        }
        let popped = self.scopes.pop().expect("checked len above");
        self.recompute();
        Ok(popped)
    }

    /// Mutate the innermost scope and recompute the cached full state.
    pub fn set(&mut self, f: impl FnOnce(&mut Scope)) {
        f(self.scopes.last_mut().expect("stack is never empty"));
        self.recompute();
    }

    /// The current fully resolved state.
    #[inline]
    pub fn full_state(&self) -> &FullState {
        &self.cache
    }

    /// True once the stack is back down to just the root scope.
    #[inline]
    pub fn at_root(&self) -> bool {
        self.scopes.len() == 1
    }

    fn recompute(&mut self) {
        let format = FormatState {
            italic: resolve(&self.scopes, |s| s.italic).unwrap_or(false),
            bold: resolve(&self.scopes, |s| s.bold).unwrap_or(false),
            underline: resolve(&self.scopes, |s| s.underline).unwrap_or(false),
            strikethrough: resolve(&self.scopes, |s| s.strikethrough).unwrap_or(false),
            alignment: resolve(&self.scopes, |s| s.alignment).unwrap_or(Alignment::Left),
        };

        self.cache = FullState {
            format,
            group_skip: resolve(&self.scopes, |s| s.group_skip).unwrap_or(false),
            in_field: resolve(&self.scopes, |s| s.in_field).unwrap_or(false),
            in_fieldinst: resolve(&self.scopes, |s| s.in_fieldinst).unwrap_or(false),
            in_fieldrslt: resolve(&self.scopes, |s| s.in_fieldrslt).unwrap_or(false),
            in_pict: resolve(&self.scopes, |s| s.in_pict).unwrap_or(false),
            picture_attributes: resolve(&self.scopes, |s| s.picture_attributes.clone())
                .unwrap_or_default(),
            in_blip_uid: resolve(&self.scopes, |s| s.in_blip_uid).unwrap_or(false),
            blip_uid: resolve(&self.scopes, |s| s.blip_uid),
        };
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
