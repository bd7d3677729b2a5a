//! The resolved package map: the analyser's only view of sibling packages.
//!
//! Building this map (reading other files, running their own analysis,
//! caching the result) lives outside this crate. `Pkgs` only consumes the
//! result: `lookup(package, name)` and nothing else, matching the
//! registry/`lookup` shape the teacher's signature cache exposes for
//! cross-module symbol resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{FunctionSignature, QualType};

/// The kind of thing a package exports, enough for the caller to decide how
/// to use it without round-tripping through a full `Decl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExportedDeclKind {
    Type(QualType),
    Function(FunctionSignature),
    Variable(QualType),
    EnumConstant(QualType),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedDecl {
    pub package: String,
    pub name: String,
    pub kind: ExportedDeclKind,
    pub is_public: bool,
}

/// A package's exported symbol table. Only `lookup` is consumed by the
/// analyser; how a package table is built is the driver's concern.
pub trait PackageTable {
    fn lookup(&self, name: &str) -> Option<&ExportedDecl>;
}

/// A read-only, in-memory `PackageTable`, sufficient for the CLI driver and
/// for tests. A real multi-package build would back this with a persisted
/// signature cache instead of an in-memory map.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PackageMap {
    packages: HashMap<String, HashMap<String, ExportedDecl>>,
}

impl PackageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, decl: ExportedDecl) {
        self.packages
            .entry(decl.package.clone())
            .or_default()
            .insert(decl.name.clone(), decl);
    }

    pub fn package_exists(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    /// `lookup(package, name)`, the sole external interface named in the
    /// declaration-lookup contract.
    pub fn lookup(&self, package: &str, name: &str) -> Option<&ExportedDecl> {
        self.packages.get(package)?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuiltinType, Type};

    #[test]
    fn lookup_is_scoped_to_its_package() {
        let mut pkgs = PackageMap::new();
        pkgs.insert(ExportedDecl {
            package: "strings".into(),
            name: "Builder".into(),
            kind: ExportedDeclKind::Type(QualType::unqualified(Type::Builtin(BuiltinType::I32))),
            is_public: true,
        });

        assert!(pkgs.lookup("strings", "Builder").is_some());
        assert!(pkgs.lookup("io", "Builder").is_none());
        assert!(pkgs.lookup("strings", "Missing").is_none());
    }

    #[test]
    fn package_exists_checks_only_the_name() {
        let mut pkgs = PackageMap::new();
        pkgs.insert(ExportedDecl {
            package: "io".into(),
            name: "Reader".into(),
            kind: ExportedDeclKind::Type(QualType::unqualified(Type::Builtin(BuiltinType::Void))),
            is_public: true,
        });
        assert!(pkgs.package_exists("io"));
        assert!(!pkgs.package_exists("strings"));
    }
}
