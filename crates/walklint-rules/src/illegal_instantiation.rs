//! Check that forbids instantiating configured classes with `new`.
//!
//! # Rationale
//!
//! Some classes offer factory methods that should be preferred over their
//! constructors, for example `Boolean.valueOf` over `new Boolean(..)`, which
//! can reuse cached instances.
//!
//! # Detected Patterns
//!
//! - `new C(..)` where `C` is listed in `classes`
//! - `new C(..)` where `C` resolves to a listed class through the file's
//!   package, an explicit or wildcard import, or `java.lang`
//!
//! Array creation (`new C[n]`) and constructor references (`C::new`) are not
//! reported. A class declared in the same file shadows its `java.lang`
//! namesake.
//!
//! # Configuration
//!
//! - `classes`: fully qualified or simple class names (default: none)

use std::collections::HashSet;

use serde::Deserialize;
use walklint_core::{
    Check, CheckContext, CheckError, CheckResult, KindSet, NodeId, SyntaxKind, SyntaxNode,
};

/// Check name for illegal-instantiation.
pub const NAME: &str = "illegal-instantiation";

const JAVA_LANG: &str = "java.lang.";

const KINDS: KindSet = KindSet::of(&[
    SyntaxKind::Import,
    SyntaxKind::LiteralNew,
    SyntaxKind::PackageDef,
    SyntaxKind::ClassDef,
]);

/// Options for [`IllegalInstantiation`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct IllegalInstantiationOptions {
    /// Classes that must not be instantiated.
    pub classes: Vec<String>,
}

/// Reports instantiations of forbidden classes.
///
/// Instantiations are collected while walking and resolved in
/// [`end_file`](Check::end_file), once every import and class declaration
/// of the file is known.
#[derive(Debug, Clone, Default)]
pub struct IllegalInstantiation {
    classes: Vec<String>,
    package: Option<String>,
    imports: Vec<String>,
    class_names: HashSet<String>,
    instantiations: Vec<NodeId>,
}

impl IllegalInstantiation {
    /// Creates a check with no forbidden classes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a check from its options.
    #[must_use]
    pub fn from_options(options: &IllegalInstantiationOptions) -> Self {
        Self::new().classes(options.classes.iter().cloned())
    }

    /// Sets the forbidden classes.
    #[must_use]
    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    fn illegal_instantiation(&self, class_name: &str) -> Option<String> {
        if self.classes.iter().any(|c| c == class_name) {
            return Some(class_name.to_string());
        }
        self.classes
            .iter()
            .find(|illegal| {
                self.is_same_package(class_name, illegal)
                    || self.is_standard_class(class_name, illegal)
            })
            .cloned()
            .or_else(|| self.imported(class_name))
    }

    fn is_same_package(&self, class_name: &str, illegal: &str) -> bool {
        self.package.as_deref().is_some_and(|package| {
            illegal
                .strip_prefix(package)
                .and_then(|rest| rest.strip_prefix('.'))
                == Some(class_name)
        })
    }

    fn is_standard_class(&self, class_name: &str, illegal: &str) -> bool {
        illegal.strip_prefix(JAVA_LANG) == Some(class_name)
            && !self.class_names.contains(class_name)
    }

    fn imported(&self, class_name: &str) -> Option<String> {
        self.imports.iter().find_map(|import| {
            let candidate = match import.strip_suffix('*') {
                Some(package) => format!("{package}{class_name}"),
                None => import.clone(),
            };
            let simple = candidate.rsplit('.').next().unwrap_or(&candidate);
            (simple == class_name && self.classes.contains(&candidate)).then_some(candidate)
        })
    }
}

/// Joins an `IDENT` or a tree of `DOT` nodes into a dotted name.
fn dotted_name(node: SyntaxNode<'_>) -> Option<String> {
    match node.kind() {
        SyntaxKind::Ident | SyntaxKind::Star => Some(node.text().to_string()),
        SyntaxKind::Dot => {
            let parts = node
                .children()
                .map(dotted_name)
                .collect::<Option<Vec<_>>>()?;
            Some(parts.join("."))
        }
        _ => None,
    }
}

impl Check for IllegalInstantiation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Forbids instantiating the configured classes"
    }

    fn acceptable_kinds(&self) -> KindSet {
        KINDS
    }

    fn required_kinds(&self) -> KindSet {
        KINDS
    }

    fn begin_file(&mut self, _ctx: &mut CheckContext<'_>) -> CheckResult {
        self.package = None;
        self.imports.clear();
        self.class_names.clear();
        self.instantiations.clear();
        Ok(())
    }

    fn enter_node(&mut self, node: SyntaxNode<'_>, _ctx: &mut CheckContext<'_>) -> CheckResult {
        match node.kind() {
            SyntaxKind::LiteralNew => {
                let in_method_ref = node
                    .parent()
                    .is_some_and(|p| p.kind() == SyntaxKind::MethodRef);
                if !in_method_ref {
                    self.instantiations.push(node.id());
                }
            }
            SyntaxKind::PackageDef => {
                // PACKAGE_DEF: ANNOTATIONS, name, SEMI
                self.package = node
                    .last_child()
                    .and_then(SyntaxNode::prev_sibling)
                    .and_then(dotted_name);
            }
            SyntaxKind::Import => {
                if let Some(name) = node.first_child().and_then(dotted_name) {
                    self.imports.push(name);
                }
            }
            SyntaxKind::ClassDef => {
                let ident = node.first_child_of_kind(SyntaxKind::Ident).ok_or(
                    CheckError::MissingChild {
                        parent: SyntaxKind::ClassDef,
                        expected: SyntaxKind::Ident,
                    },
                )?;
                self.class_names.insert(ident.text().to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn end_file(&mut self, ctx: &mut CheckContext<'_>) -> CheckResult {
        let tree = ctx.tree();
        for id in std::mem::take(&mut self.instantiations) {
            let Some(node) = tree.node(id) else {
                continue;
            };
            let type_name = node.first_child().ok_or(CheckError::MissingChild {
                parent: SyntaxKind::LiteralNew,
                expected: SyntaxKind::Ident,
            })?;
            if type_name.next_sibling().map(SyntaxNode::kind) == Some(SyntaxKind::ArrayDeclarator)
            {
                continue;
            }
            let Some(class_name) = dotted_name(type_name) else {
                continue;
            };
            if let Some(illegal) = self.illegal_instantiation(&class_name) {
                ctx.log(node, format!("Instantiation of {illegal} should be avoided."));
            }
        }
        Ok(())
    }
}
