//! Unit tests for plugin-class eligibility.

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::loader::{ClassDescriptor, ConstructorDescriptor, Nesting, TypeKind, Visibility};
use crate::test_support::{BundleBuilder, plugin_class};

const CANDIDATE: &str = "com.example.Candidate";

#[fixture]
fn plugins_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

/// Loads `CANDIDATE` from a bundle containing `descriptor` plus `extra`.
fn check(
    dir: &TempDir,
    descriptor: &ClassDescriptor,
    extra: BundleBuilder,
) -> Result<bool, PluginError> {
    let path = extra
        .class(CANDIDATE, descriptor)
        .write_to(dir.path(), "candidate.jar")
        .expect("write bundle");
    let mut context = LoadingContext::new();
    context.add_source(&path).expect("add source");
    let class = context.load_class(CANDIDATE).expect("load candidate");
    is_plugin_class(&class, Contract::go_plugin(), &mut context)
}

fn without_marker() -> ClassDescriptor {
    ClassDescriptor {
        annotations: Vec::new(),
        ..plugin_class()
    }
}

fn without_capability() -> ClassDescriptor {
    ClassDescriptor {
        interfaces: Vec::new(),
        ..plugin_class()
    }
}

fn as_interface() -> ClassDescriptor {
    ClassDescriptor {
        kind: TypeKind::Interface,
        ..plugin_class()
    }
}

fn package_private() -> ClassDescriptor {
    ClassDescriptor {
        visibility: Visibility::Package,
        ..plugin_class()
    }
}

fn abstract_class() -> ClassDescriptor {
    ClassDescriptor {
        is_abstract: true,
        ..plugin_class()
    }
}

fn inner_class() -> ClassDescriptor {
    ClassDescriptor {
        nesting: Nesting::Inner,
        ..plugin_class()
    }
}

fn static_member() -> ClassDescriptor {
    ClassDescriptor {
        nesting: Nesting::StaticMember,
        ..plugin_class()
    }
}

fn no_default_constructor() -> ClassDescriptor {
    ClassDescriptor {
        constructors: vec![ConstructorDescriptor {
            parameters: vec!["com.example.MissingSettings".to_owned()],
            ..ConstructorDescriptor::default()
        }],
        ..plugin_class()
    }
}

fn private_default_constructor() -> ClassDescriptor {
    ClassDescriptor {
        constructors: vec![ConstructorDescriptor {
            visibility: Visibility::Package,
            ..ConstructorDescriptor::default()
        }],
        ..plugin_class()
    }
}

#[rstest]
#[case::eligible(plugin_class(), true)]
#[case::static_member(static_member(), true)]
#[case::missing_marker(without_marker(), false)]
#[case::missing_capability(without_capability(), false)]
#[case::interface(as_interface(), false)]
#[case::package_private(package_private(), false)]
#[case::abstract_class(abstract_class(), false)]
#[case::inner(inner_class(), false)]
#[case::private_default_constructor(private_default_constructor(), false)]
fn evaluates_eligibility(
    plugins_dir: TempDir,
    #[case] descriptor: ClassDescriptor,
    #[case] expected: bool,
) {
    let eligible = check(&plugins_dir, &descriptor, BundleBuilder::new()).expect("evaluate");
    assert_eq!(eligible, expected);
}

#[rstest]
fn parameterised_constructor_needs_resolvable_types(plugins_dir: TempDir) {
    let err = check(&plugins_dir, &no_default_constructor(), BundleBuilder::new())
        .expect_err("missing parameter type must fail");
    match err {
        PluginError::ClassNotFound { name, required_by } => {
            assert_eq!(name, "com.example.MissingSettings");
            assert_eq!(required_by.as_deref(), Some(CANDIDATE));
        }
        other => panic!("expected ClassNotFound, got {other}"),
    }
}

#[rstest]
fn runtime_types_in_signatures_keep_a_class_eligible(plugins_dir: TempDir) {
    let mut descriptor = plugin_class();
    descriptor.superclass = Some("java.lang.Object".to_owned());
    descriptor.constructors.push(ConstructorDescriptor {
        parameters: vec!["java.lang.String".to_owned(), "int".to_owned()],
        ..ConstructorDescriptor::default()
    });

    let eligible = check(&plugins_dir, &descriptor, BundleBuilder::new()).expect("evaluate");
    assert!(eligible);
}

#[rstest]
fn resolvable_parameterised_constructor_alone_is_not_enough(plugins_dir: TempDir) {
    let descriptor = ClassDescriptor {
        constructors: vec![ConstructorDescriptor {
            parameters: vec!["com.example.Settings".to_owned()],
            ..ConstructorDescriptor::default()
        }],
        ..plugin_class()
    };
    let extra = BundleBuilder::new().class("com.example.Settings", &ClassDescriptor::default());
    let eligible = check(&plugins_dir, &descriptor, extra).expect("evaluate");
    assert!(!eligible);
}

#[rstest]
fn non_public_constructor_parameters_are_not_resolved(plugins_dir: TempDir) {
    let descriptor = ClassDescriptor {
        constructors: vec![
            ConstructorDescriptor::default(),
            ConstructorDescriptor {
                visibility: Visibility::Package,
                parameters: vec!["com.example.Unshipped".to_owned()],
                launch: None,
            },
        ],
        ..plugin_class()
    };
    let eligible = check(&plugins_dir, &descriptor, BundleBuilder::new()).expect("evaluate");
    assert!(eligible);
}

#[rstest]
fn capability_may_be_inherited(plugins_dir: TempDir) {
    let base = ClassDescriptor {
        is_abstract: true,
        interfaces: vec![GO_PLUGIN_INTERFACE.to_owned()],
        ..ClassDescriptor::default()
    };
    let descriptor = ClassDescriptor {
        superclass: Some("com.example.AbstractPlugin".to_owned()),
        ..without_capability()
    };
    let extra = BundleBuilder::new().class("com.example.AbstractPlugin", &base);
    let eligible = check(&plugins_dir, &descriptor, extra).expect("evaluate");
    assert!(eligible);
}

#[test]
fn custom_contract_uses_its_own_names() {
    let contract = Contract::new("com.example.Capability", "com.example.Marker");
    assert_eq!(contract.capability(), "com.example.Capability");
    assert_eq!(contract.marker(), "com.example.Marker");
    assert_ne!(contract, Contract::go_plugin());
}
