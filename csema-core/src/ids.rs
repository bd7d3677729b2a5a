//! Stable handles into the per-file declaration table and scope graph.
//!
//! Named-type references are indices into [`Decl`](crate::ast::Decl) storage
//! rather than owning pointers, so that alias chains can be cyclic graphs
//! without an `Rc`/`Weak` dance: canonical-form resolution becomes an index
//! traversal guarded by a `visiting` mark (see `TypeResolver::resolve_canonicals`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelId(pub u32);
