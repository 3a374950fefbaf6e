//! Class descriptors: the introspection record stored in each class entry.
//!
//! A class entry's content is a JSON document describing the type's shape:
//! what it is, what it extends and implements, which markers it carries, and
//! which constructors it exposes. The loading context links these records
//! into [`LoadedClass`](super::LoadedClass) values, and the contract matcher
//! evaluates eligibility against them.
//!
//! ```json
//! {
//!   "kind": "class",
//!   "interfaces": ["com.thoughtworks.go.plugin.api.GoPlugin"],
//!   "annotations": ["com.thoughtworks.go.plugin.api.annotation.Extension"],
//!   "constructors": [
//!     { "parameters": [], "launch": { "program": "bin/yaml-plugin" } }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// What sort of type a descriptor defines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A concrete or abstract class.
    #[default]
    Class,
    /// An interface.
    Interface,
    /// An annotation (marker) type.
    Annotation,
}

/// Access level of a type or constructor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Accessible from any bundle.
    #[default]
    Public,
    /// Accessible only within its own package.
    Package,
}

/// How a type is nested inside another type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    /// Declared at package level.
    #[default]
    TopLevel,
    /// A static member of another type.
    StaticMember,
    /// A non-static inner type bound to an enclosing instance.
    Inner,
}

/// Entrypoint started when a constructor is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Program to run, resolved inside the unpacked bundle first.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
}

/// A constructor exposed by a class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructorDescriptor {
    /// Access level of the constructor.
    pub visibility: Visibility,
    /// Fully-qualified parameter type names.
    pub parameters: Vec<String>,
    /// Entrypoint started by this constructor, if it starts one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch: Option<LaunchSpec>,
}

impl ConstructorDescriptor {
    /// Creates a public zero-parameter constructor that launches `program`.
    #[must_use]
    pub fn launching(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            visibility: Visibility::Public,
            parameters: Vec::new(),
            launch: Some(LaunchSpec {
                program: program.into(),
                args,
            }),
        }
    }

    /// Returns `true` for a public constructor taking no parameters.
    #[must_use]
    pub fn is_public_default(&self) -> bool {
        self.visibility == Visibility::Public && self.parameters.is_empty()
    }
}

/// Shape of one class, as stored in its archive entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDescriptor {
    /// What sort of type this is.
    pub kind: TypeKind,
    /// Access level of the type.
    pub visibility: Visibility,
    /// Whether the class is abstract.
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    /// How the type is nested.
    pub nesting: Nesting,
    /// Fully-qualified superclass name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Fully-qualified names of directly implemented interfaces.
    pub interfaces: Vec<String>,
    /// Fully-qualified names of markers carried by the type.
    pub annotations: Vec<String>,
    /// Declared constructors.
    pub constructors: Vec<ConstructorDescriptor>,
}

impl ClassDescriptor {
    /// Creates a descriptor for a public interface extending `parents`.
    #[must_use]
    pub fn interface(parents: Vec<String>) -> Self {
        Self {
            kind: TypeKind::Interface,
            interfaces: parents,
            ..Self::default()
        }
    }

    /// Creates a descriptor for a public annotation type.
    #[must_use]
    pub fn annotation() -> Self {
        Self {
            kind: TypeKind::Annotation,
            ..Self::default()
        }
    }

    /// Lists every type name this descriptor links against.
    pub(crate) fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.superclass
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }
}
