//! Resolution of import paths to package types.

use hashbrown::HashMap;

use crate::types::PolyType;

/// The type of an importable package: its local binding name and a record
/// poly type whose lower and upper bounds are exactly the exported labels.
/// Function-valued fields keep their pipe labels so pipe calls resolve.
#[derive(Debug, Clone, Copy)]
pub struct PackageType<'c> {
    pub name: &'c str,
    pub ty: &'c PolyType<'c>,
}

/// Resolves package paths. The inference engine calls [`Importer::import`]
/// at most once per distinct path.
pub trait Importer<'c> {
    fn import(&self, path: &str) -> Option<PackageType<'c>>;
}

/// An importer with no packages.
pub struct NoImports;

impl<'c> Importer<'c> for NoImports {
    fn import(&self, _path: &str) -> Option<PackageType<'c>> {
        None
    }
}

/// A fixed path → package table.
#[derive(Default)]
pub struct Packages<'c> {
    packages: HashMap<String, PackageType<'c>>,
}

impl<'c> Packages<'c> {
    pub fn new() -> Self {
        Packages {
            packages: HashMap::new(),
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, package: PackageType<'c>) {
        self.packages.insert(path.into(), package);
    }
}

impl<'c> Importer<'c> for Packages<'c> {
    fn import(&self, path: &str) -> Option<PackageType<'c>> {
        self.packages.get(path).copied()
    }
}
