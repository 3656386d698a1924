//! Label sets for record and function types.
//!
//! A [`LabelSet`] is either a finite, sorted set of interned labels or the
//! distinguished `All` set containing every label. Record types carry two of
//! these: `lower` (labels known to be present) and `upper` (labels permitted
//! to exist).

use core::fmt;

use crate::types::manager::TypeManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelSet<'c> {
    /// A finite set. The slice is sorted, deduplicated, and interned by the
    /// owning [`TypeManager`].
    Finite(&'c [&'c str]),
    /// The infinite set of all labels.
    All,
}

impl<'c> LabelSet<'c> {
    pub fn empty() -> LabelSet<'c> {
        LabelSet::Finite(&[])
    }

    pub fn is_all(&self) -> bool {
        matches!(self, LabelSet::All)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, LabelSet::Finite(labels) if labels.is_empty())
    }

    /// The labels of a finite set; `None` for `All`.
    pub fn labels(&self) -> Option<&'c [&'c str]> {
        match self {
            LabelSet::Finite(labels) => Some(labels),
            LabelSet::All => None,
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        match self {
            LabelSet::Finite(labels) => labels.binary_search(&label).is_ok(),
            LabelSet::All => true,
        }
    }

    pub fn is_subset(&self, other: &LabelSet<'c>) -> bool {
        match (self, other) {
            (_, LabelSet::All) => true,
            (LabelSet::All, LabelSet::Finite(_)) => false,
            (LabelSet::Finite(a), LabelSet::Finite(_)) => {
                a.iter().all(|label| other.contains(label))
            }
        }
    }

    /// Union; `All` absorbs.
    pub fn union(self, other: LabelSet<'c>, mgr: &TypeManager<'c>) -> LabelSet<'c> {
        match (self, other) {
            (LabelSet::All, _) | (_, LabelSet::All) => LabelSet::All,
            (LabelSet::Finite(a), LabelSet::Finite(b)) => {
                let mut merged: Vec<&'c str> = a.iter().chain(b.iter()).copied().collect();
                merged.sort_unstable();
                merged.dedup();
                LabelSet::Finite(mgr.alloc_label_slice(&merged))
            }
        }
    }

    /// Intersection; `All` is the identity.
    pub fn intersect(self, other: LabelSet<'c>, mgr: &TypeManager<'c>) -> LabelSet<'c> {
        match (self, other) {
            (LabelSet::All, set) | (set, LabelSet::All) => set,
            (LabelSet::Finite(a), LabelSet::Finite(_)) => {
                let common: Vec<&'c str> = a
                    .iter()
                    .copied()
                    .filter(|label| other.contains(label))
                    .collect();
                LabelSet::Finite(mgr.alloc_label_slice(&common))
            }
        }
    }

    /// Set difference. An infinite set minus anything finite stays infinite;
    /// anything minus `All` is empty.
    pub fn difference(self, other: LabelSet<'c>, mgr: &TypeManager<'c>) -> LabelSet<'c> {
        match (self, other) {
            (_, LabelSet::All) => LabelSet::empty(),
            (LabelSet::All, LabelSet::Finite(_)) => LabelSet::All,
            (LabelSet::Finite(a), LabelSet::Finite(_)) => {
                let rest: Vec<&'c str> = a
                    .iter()
                    .copied()
                    .filter(|label| !other.contains(label))
                    .collect();
                LabelSet::Finite(mgr.alloc_label_slice(&rest))
            }
        }
    }
}

impl fmt::Display for LabelSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelSet::Finite(labels) => write!(f, "({})", labels.join(", ")),
            LabelSet::All => write!(f, "(...)"),
        }
    }
}
