//! Isolated class loading from plugin bundles.
//!
//! A [`LoadingContext`] owns the bundles registered with it and resolves
//! classes by fully-qualified name against them, in registration order,
//! before falling back to the host's built-in types (the plugin contract
//! types, anything under `java.*`, `javax.*` or the plugin API package, and
//! primitives). Nothing is shared between contexts: two contexts loading the same name from different bundles never
//! see each other's classes, so each discovery or resolution pass builds its
//! own context and passes it explicitly to whatever needs a lookup.
//!
//! Loading links eagerly. The superclass and interfaces of a class are loaded
//! before the class itself is defined, so a bundle that references a type it
//! does not ship fails at load time with [`PluginError::ClassNotFound`].

mod descriptor;

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use zip::ZipArchive;

pub use self::descriptor::{
    ClassDescriptor, ConstructorDescriptor, LaunchSpec, Nesting, TypeKind, Visibility,
};
use crate::bundle::{Bundle, collect_class_descriptors};
use crate::error::PluginError;

/// Host-provided interface every plugin class must implement.
pub const GO_PLUGIN_INTERFACE: &str = "com.thoughtworks.go.plugin.api.GoPlugin";

/// Host-provided marker every plugin class must carry.
pub const EXTENSION_ANNOTATION: &str = "com.thoughtworks.go.plugin.api.annotation.Extension";

/// Tracing target for class loading.
const LOADER_TARGET: &str = "gocd_plugins::loader";

/// Where a loaded class was defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassOrigin {
    /// A built-in host type.
    Host,
    /// A class entry inside a bundle.
    Bundle {
        /// Bundle on disk that was registered with the context.
        path: PathBuf,
        /// Dependency archive under `lib/` holding the entry, if any.
        library: Option<String>,
    },
}

/// A class resolved and linked by a [`LoadingContext`].
#[derive(Debug)]
pub struct LoadedClass {
    name: String,
    origin: ClassOrigin,
    descriptor: ClassDescriptor,
    supertypes: Vec<Arc<LoadedClass>>,
}

impl LoadedClass {
    /// Returns the fully-qualified class name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns where the class was defined.
    #[must_use]
    pub const fn origin(&self) -> &ClassOrigin {
        &self.origin
    }

    /// Returns the class descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ClassDescriptor {
        &self.descriptor
    }

    /// Returns `true` for interfaces and annotation types.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(
            self.descriptor.kind,
            TypeKind::Interface | TypeKind::Annotation
        )
    }

    /// Returns `true` if the type is publicly accessible.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.descriptor.visibility == Visibility::Public
    }

    /// Returns `true` if the class is abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.descriptor.is_abstract
    }

    /// Returns `true` for a member type that needs an enclosing instance.
    #[must_use]
    pub fn is_non_static_inner(&self) -> bool {
        self.descriptor.nesting == Nesting::Inner
    }

    /// Returns `true` if the type carries the named marker.
    #[must_use]
    pub fn has_annotation(&self, marker: &str) -> bool {
        self.descriptor.annotations.iter().any(|name| name == marker)
    }

    /// Returns `true` if the type is, extends, or implements `name`.
    #[must_use]
    pub fn is_assignable_to(&self, name: &str) -> bool {
        self.name == name
            || self
                .supertypes
                .iter()
                .any(|supertype| supertype.is_assignable_to(name))
    }

    /// Returns the public constructors.
    pub fn public_constructors(&self) -> impl Iterator<Item = &ConstructorDescriptor> {
        self.descriptor
            .constructors
            .iter()
            .filter(|constructor| constructor.visibility == Visibility::Public)
    }

    /// Returns the public zero-parameter constructor, if one exists.
    #[must_use]
    pub fn default_constructor(&self) -> Option<&ConstructorDescriptor> {
        self.descriptor
            .constructors
            .iter()
            .find(|constructor| constructor.is_public_default())
    }
}

#[derive(Debug)]
struct ClassSource {
    origin: ClassOrigin,
    descriptors: HashMap<String, Vec<u8>>,
}

/// Class-loading context scoped to a set of bundles.
///
/// # Example
///
/// ```
/// use gocd_plugins::loader::{GO_PLUGIN_INTERFACE, LoadingContext};
///
/// let mut context = LoadingContext::new();
/// let capability = context.load_class(GO_PLUGIN_INTERFACE).expect("host type");
/// assert!(capability.is_interface());
/// assert!(context.load_class("com.example.Missing").is_err());
/// ```
#[derive(Debug, Default)]
pub struct LoadingContext {
    sources: Vec<ClassSource>,
    loaded: HashMap<String, Arc<LoadedClass>>,
    linking: Vec<String>,
}

impl LoadingContext {
    /// Creates a context that only knows the host's built-in types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the bundle at `path` as a class source.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Io`] or [`PluginError::Archive`] if the bundle
    /// or one of its dependency archives cannot be read.
    pub fn add_source(&mut self, path: &Path) -> Result<(), PluginError> {
        let mut bundle = Bundle::open(path)?;
        self.add_bundle(&mut bundle)
    }

    /// Registers an already opened bundle, followed by each archive under its
    /// `lib/` prefix.
    ///
    /// # Errors
    ///
    /// See [`LoadingContext::add_source`].
    pub fn add_bundle(&mut self, bundle: &mut Bundle) -> Result<(), PluginError> {
        let path = bundle.path().to_path_buf();
        let descriptors = bundle.class_descriptors()?;
        let libraries = bundle.libraries()?;
        debug!(
            target: LOADER_TARGET,
            bundle = %path.display(),
            classes = descriptors.len(),
            libraries = libraries.len(),
            "registering class source"
        );
        self.sources.push(ClassSource {
            origin: ClassOrigin::Bundle {
                path: path.clone(),
                library: None,
            },
            descriptors,
        });

        for (entry, bytes) in libraries {
            let mut archive =
                ZipArchive::new(Cursor::new(bytes)).map_err(|err| PluginError::archive(&path, err))?;
            let descriptors =
                collect_class_descriptors(&mut archive).map_err(|err| PluginError::archive(&path, err))?;
            self.sources.push(ClassSource {
                origin: ClassOrigin::Bundle {
                    path: path.clone(),
                    library: Some(entry),
                },
                descriptors,
            });
        }
        Ok(())
    }

    /// Returns the number of registered sources, dependency archives included.
    #[cfg(test)]
    pub(crate) fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Resolves and links the class called `name`.
    ///
    /// Repeated lookups of the same name return the same class.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ClassNotFound`] if `name` or one of its
    /// supertypes matches no source and no host type, and
    /// [`PluginError::InvalidClass`] for unreadable descriptors or circular
    /// inheritance.
    pub fn load_class(&mut self, name: &str) -> Result<Arc<LoadedClass>, PluginError> {
        if let Some(class) = self.loaded.get(name) {
            return Ok(Arc::clone(class));
        }
        if self.linking.iter().any(|pending| pending == name) {
            return Err(PluginError::InvalidClass {
                name: name.to_owned(),
                message: String::from("class circularity: the type is its own supertype"),
            });
        }

        let (origin, descriptor) = self.find_definition(name)?;
        self.linking.push(name.to_owned());
        let linked = self.link(name, &descriptor);
        self.linking.pop();

        let class = Arc::new(LoadedClass {
            name: name.to_owned(),
            origin,
            descriptor,
            supertypes: linked?,
        });
        self.loaded.insert(name.to_owned(), Arc::clone(&class));
        Ok(class)
    }

    /// Resolves `name` on behalf of `dependent`, naming the dependent in the
    /// error when `name` itself is missing.
    pub(crate) fn load_dependency(
        &mut self,
        name: &str,
        dependent: &str,
    ) -> Result<Arc<LoadedClass>, PluginError> {
        self.load_class(name).map_err(|err| match err {
            PluginError::ClassNotFound {
                name: missing,
                required_by: None,
            } => PluginError::ClassNotFound {
                name: missing,
                required_by: Some(dependent.to_owned()),
            },
            other => other,
        })
    }

    fn link(
        &mut self,
        name: &str,
        descriptor: &ClassDescriptor,
    ) -> Result<Vec<Arc<LoadedClass>>, PluginError> {
        descriptor
            .supertypes()
            .map(|supertype| self.load_dependency(supertype, name))
            .collect()
    }

    fn find_definition(&self, name: &str) -> Result<(ClassOrigin, ClassDescriptor), PluginError> {
        for source in &self.sources {
            if let Some(bytes) = source.descriptors.get(name) {
                let descriptor = serde_json::from_slice(bytes).map_err(|err| {
                    PluginError::InvalidClass {
                        name: name.to_owned(),
                        message: format!("unreadable class descriptor: {err}"),
                    }
                })?;
                return Ok((source.origin.clone(), descriptor));
            }
        }

        host_type(name)
            .map(|descriptor| (ClassOrigin::Host, descriptor))
            .ok_or_else(|| PluginError::ClassNotFound {
                name: name.to_owned(),
                required_by: None,
            })
    }
}

/// Packages the host runtime supplies to every bundle.
const HOST_PACKAGES: [&str; 3] = ["java.", "javax.", "com.thoughtworks.go.plugin.api."];

const PRIMITIVE_TYPES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// Describes a host-provided type. Apart from the plugin contract types,
/// host types are opaque public classes; array types resolve through their
/// element type.
fn host_type(name: &str) -> Option<ClassDescriptor> {
    match name {
        GO_PLUGIN_INTERFACE => Some(ClassDescriptor::interface(Vec::new())),
        EXTENSION_ANNOTATION => Some(ClassDescriptor::annotation()),
        _ => {
            let element = name.trim_end_matches("[]");
            let provided = PRIMITIVE_TYPES.contains(&element)
                || HOST_PACKAGES
                    .iter()
                    .any(|package| element.starts_with(package));
            provided.then(ClassDescriptor::default)
        }
    }
}
