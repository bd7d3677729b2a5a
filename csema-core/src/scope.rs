//! Lexical scope, package-alias bookkeeping, and name resolution.
//!
//! `Scope` is the only place that knows how to turn an identifier into a
//! declaration: innermost lexical frame first, then this file's own
//! top-level declarations, then the current package's exported set, then
//! failure. It also tracks which package aliases were referenced (for the
//! unused-package diagnostic) and which cross-package declarations were
//! touched (for [`getExternals`](crate::file_analyser::FileAnalyser::externals)).

use std::cell::Cell;
use std::collections::HashMap;

use indexmap::IndexSet;

use crate::ast::File;
use crate::ids::DeclId;
use crate::pkgs::{ExportedDecl, PackageMap};
use crate::source::Span;

struct PackageAlias {
    package: String,
    span: Span,
    used: Cell<bool>,
}

#[derive(Default)]
struct Frame {
    bindings: HashMap<String, DeclId>,
}

impl Frame {
    /// Returns the colliding declaration if `name` is already bound in this frame.
    fn insert(&mut self, name: &str, decl: DeclId) -> Result<(), DeclId> {
        if let Some(existing) = self.bindings.get(name) {
            return Err(*existing);
        }
        self.bindings.insert(name.to_string(), decl);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<DeclId> {
        self.bindings.get(name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTier {
    Local,
    FileLocal,
    PackageExported,
}

pub enum Resolved<'a> {
    Local(DeclId, LookupTier),
    Package(&'a ExportedDecl),
}

#[derive(Debug)]
pub enum RegisterUseError {
    DuplicateAlias { alias: String, first: Span },
    UnknownPackage { package: String },
}

#[derive(Debug)]
pub struct InsertError {
    pub existing: DeclId,
}

pub struct Scope {
    frames: Vec<Frame>,
    aliases: HashMap<String, PackageAlias>,
    externals: IndexSet<(String, String)>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            aliases: HashMap::new(),
            externals: IndexSet::new(),
        }
    }

    pub fn register_use(
        &mut self,
        alias: &str,
        package: &str,
        span: Span,
        pkgs: &PackageMap,
    ) -> Result<(), RegisterUseError> {
        if let Some(existing) = self.aliases.get(alias) {
            return Err(RegisterUseError::DuplicateAlias {
                alias: alias.to_string(),
                first: existing.span,
            });
        }
        if !pkgs.package_exists(package) {
            return Err(RegisterUseError::UnknownPackage {
                package: package.to_string(),
            });
        }
        self.aliases.insert(
            alias.to_string(),
            PackageAlias {
                package: package.to_string(),
                span,
                used: Cell::new(false),
            },
        );
        Ok(())
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn insert_local(&mut self, name: &str, decl: DeclId) -> Result<(), InsertError> {
        let frame = self
            .frames
            .last_mut()
            .expect("insert_local called with no active frame");
        frame
            .insert(name, decl)
            .map_err(|existing| InsertError { existing })
    }

    /// Unqualified lookup: innermost frame outward, then this file's own
    /// top-level declarations, then the current package's exports.
    pub fn lookup<'a>(
        &self,
        name: &str,
        file: &File,
        current_package: &str,
        pkgs: &'a PackageMap,
    ) -> Option<Resolved<'a>> {
        for frame in self.frames.iter().rev() {
            if let Some(decl) = frame.lookup(name) {
                return Some(Resolved::Local(decl, LookupTier::Local));
            }
        }
        if let Some(decl) = file_local_lookup(file, name) {
            return Some(Resolved::Local(decl, LookupTier::FileLocal));
        }
        if let Some(exported) = pkgs.lookup(current_package, name) {
            return Some(Resolved::Package(exported));
        }
        None
    }

    /// Qualified lookup (`alias.name`): resolves `alias` to a package and
    /// consults only that package, marking the alias used.
    pub fn lookup_qualified<'a>(
        &self,
        alias: &str,
        name: &str,
        pkgs: &'a PackageMap,
    ) -> Option<&'a ExportedDecl> {
        let entry = self.aliases.get(alias)?;
        entry.used.set(true);
        pkgs.lookup(&entry.package, name)
    }

    pub fn record_external(&mut self, package: &str, name: &str) {
        self.externals.insert((package.to_string(), name.to_string()));
    }

    pub fn externals(&self) -> impl Iterator<Item = &(String, String)> {
        self.externals.iter()
    }

    /// Aliases registered via a `use` that were never consulted through
    /// `lookup_qualified`, in declaration order.
    pub fn unused_aliases(&self) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|(_, a)| !a.used.get())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

fn file_local_lookup(file: &File, name: &str) -> Option<DeclId> {
    file.types
        .iter()
        .chain(file.vars.iter())
        .chain(file.functions.iter())
        .chain(file.array_values.iter())
        .find(|id| file.decl(**id).name() == name)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, DeclCommon, VarDecl};
    use crate::types::{BuiltinType, QualType, Type};

    fn empty_file() -> File {
        File {
            name: "t.c2".into(),
            package: "main".into(),
            decls: Vec::new(),
            uses: Vec::new(),
            types: Vec::new(),
            vars: Vec::new(),
            functions: Vec::new(),
            array_values: Vec::new(),
        }
    }

    #[test]
    fn inner_frame_shadows_outer() {
        let mut scope = Scope::new();
        scope.push_frame();
        scope.insert_local("x", DeclId(0)).unwrap();
        scope.push_frame();
        scope.insert_local("x", DeclId(1)).unwrap();

        let file = empty_file();
        let pkgs = PackageMap::new();
        match scope.lookup("x", &file, "main", &pkgs) {
            Some(Resolved::Local(id, LookupTier::Local)) => assert_eq!(id, DeclId(1)),
            _ => panic!("expected innermost binding"),
        }
    }

    #[test]
    fn file_local_is_found_after_frames_miss() {
        let mut file = empty_file();
        file.decls.push(Decl::Var(VarDecl {
            common: DeclCommon::new("count", Span::new(0, 5), false),
            ty: QualType::unqualified(Type::Builtin(BuiltinType::I32)),
            init: None,
            is_local: false,
        }));
        file.vars.push(DeclId(0));

        let scope = Scope::new();
        let pkgs = PackageMap::new();
        match scope.lookup("count", &file, "main", &pkgs) {
            Some(Resolved::Local(id, LookupTier::FileLocal)) => assert_eq!(id, DeclId(0)),
            _ => panic!("expected file-local binding"),
        }
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let mut scope = Scope::new();
        let mut pkgs = PackageMap::new();
        pkgs.insert(crate::pkgs::ExportedDecl {
            package: "io".into(),
            name: "x".into(),
            kind: crate::pkgs::ExportedDeclKind::Variable(QualType::unqualified(Type::Builtin(
                BuiltinType::I32,
            ))),
            is_public: true,
        });
        scope
            .register_use("io", "io", Span::new(0, 2), &pkgs)
            .unwrap();
        let err = scope
            .register_use("io", "io", Span::new(10, 12), &pkgs)
            .unwrap_err();
        assert!(matches!(err, RegisterUseError::DuplicateAlias { .. }));
    }

    #[test]
    fn unused_alias_is_reported_until_qualified_lookup() {
        let mut scope = Scope::new();
        let mut pkgs = PackageMap::new();
        pkgs.insert(crate::pkgs::ExportedDecl {
            package: "io".into(),
            name: "Reader".into(),
            kind: crate::pkgs::ExportedDeclKind::Type(QualType::unqualified(Type::Builtin(
                BuiltinType::Void,
            ))),
            is_public: true,
        });
        scope
            .register_use("io", "io", Span::new(0, 2), &pkgs)
            .unwrap();
        assert_eq!(scope.unused_aliases(), vec!["io"]);
        scope.lookup_qualified("io", "Reader", &pkgs);
        assert!(scope.unused_aliases().is_empty());
    }
}
