pub mod alias;
pub mod env;
pub mod graph;
pub mod location;
pub mod locator;
pub mod modfile;
pub mod scanner;

pub use env::GoEnvironment;
pub use graph::{
    DefinitionHook, Field, OmitUntypedFields, TypeDefinition, TypeGraphBuilder, TypeIdentity,
};
pub use location::{guess_package_name, inspect_directory, Location, LocationKind, VENDOR_PREFIX};
pub use locator::{relates_to_package, tail, PackageLocator};
pub use modfile::{ModuleFile, Requirement, MODULE_FILE};
pub use scanner::FileScanner;
