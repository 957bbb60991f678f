//! # Names
//!
//! Every value in the IR is referred to by a [`VName`]: a human-readable base
//! plus a numeric tag that makes it globally unique within one compilation.
//! Fresh tags come from a [`NameSource`], a monotonic counter that callers
//! thread through every operation introducing a name.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

/// A variable name, unique by its `(base, tag)` pair.
///
/// The base is shared (`Rc<str>`) so cloning a name is cheap; names are cloned
/// constantly while patterns and kernel inputs are rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VName {
    base: Rc<str>,
    tag: u32,
}

impl VName {
    /// Creates a name with an explicit tag.
    ///
    /// Only use this for names that already exist in the program (tests,
    /// deserialized input). New names must come from a [`NameSource`].
    pub fn new(base: &str, tag: u32) -> Self {
        Self {
            base: Rc::from(base),
            tag,
        }
    }

    /// The human-readable part of the name
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The unique numeric part of the name
    pub const fn tag(&self) -> u32 {
        self.tag
    }
}

impl fmt::Display for VName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.tag)
    }
}

/// An ordered set of names.
///
/// Ordered rather than hashed so that anything derived from iterating a name
/// set (captured inputs, new pattern elements) comes out the same on every run.
pub type Names = BTreeSet<VName>;

/// Source of fresh names.
///
/// The counter only ever moves forward. A single source must be shared by all
/// nested calls within one pass invocation; two sources seeded with the same
/// counter will hand out clashing names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSource {
    counter: u32,
}

impl NameSource {
    /// Creates a source whose first fresh tag is `start`.
    ///
    /// `start` must be greater than every tag already used in the program.
    pub const fn new(start: u32) -> Self {
        Self { counter: start }
    }

    /// Creates a source that starts above every tag in `names`.
    pub fn above<'a>(names: impl IntoIterator<Item = &'a VName>) -> Self {
        let max = names.into_iter().map(VName::tag).max();
        Self::new(max.map_or(0, |m| m + 1))
    }

    /// Returns a fresh name with the given base
    pub fn new_name(&mut self, base: &str) -> VName {
        let tag = self.counter;
        self.counter += 1;
        VName::new(base, tag)
    }

    /// Returns a fresh name sharing the base of `name`
    pub fn new_name_from(&mut self, name: &VName) -> VName {
        let tag = self.counter;
        self.counter += 1;
        VName {
            base: name.base.clone(),
            tag,
        }
    }

    /// Returns a fresh name whose base is `name`'s base followed by `suffix`
    pub fn new_name_suffixed(&mut self, name: &VName, suffix: &str) -> VName {
        self.new_name(&format!("{}{}", name.base(), suffix))
    }

    /// The tag the next fresh name will receive
    pub const fn peek(&self) -> u32 {
        self.counter
    }
}

impl Default for NameSource {
    fn default() -> Self {
        Self::new(0)
    }
}
