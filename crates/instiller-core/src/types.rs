use std::fmt;

use serde::{Deserialize, Serialize};

use crate::directive::{ClassDirective, GenerationDirective};

/// Reference to a type as it appears in a field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    /// A registered type referenced by name.
    Named(String),
    /// A registered generic type applied to arguments (ex.: `Vec<String>`).
    Generic { base: String, args: Vec<TypeExpr> },
    /// Variable-length array of the element type.
    Array(Box<TypeExpr>),
    /// Generic argument whose concrete type is erased or a wildcard.
    Unresolved,
}

impl TypeExpr {
    /// Reference to the registered type `name`.
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    /// `base` applied to `args`.
    pub fn generic(base: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic {
            base: base.into(),
            args,
        }
    }

    /// Array of `element`.
    pub fn array(element: TypeExpr) -> Self {
        TypeExpr::Array(Box::new(element))
    }

    /// Name of the registered type backing this expression.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(name) => Some(name),
            TypeExpr::Generic { base, .. } => Some(base),
            TypeExpr::Array(_) | TypeExpr::Unresolved => None,
        }
    }

    /// Generic argument at `index`, if declared.
    pub fn type_arg(&self, index: usize) -> Option<&TypeExpr> {
        match self {
            TypeExpr::Generic { args, .. } => args.get(index),
            _ => None,
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, TypeExpr::Generic { .. })
    }

    /// Same expression with its base type replaced, keeping generic arguments.
    pub fn with_base(&self, base: &str) -> TypeExpr {
        match self {
            TypeExpr::Generic { args, .. } => TypeExpr::generic(base, args.clone()),
            _ => TypeExpr::named(base),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => write!(f, "{name}"),
            TypeExpr::Generic { base, args } => {
                write!(f, "{base}<")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            TypeExpr::Array(element) => write!(f, "[{element}]"),
            TypeExpr::Unresolved => write!(f, "?"),
        }
    }
}

/// Leaf value kinds converted from generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Char,
    Integer,
    Float,
    Text,
    /// Date/time rendered with a fixed chrono format.
    Date { format: &'static str },
}

impl ScalarKind {
    /// Numeric, boolean and character leaves default to `"0"` and read
    /// alias values instead of alias references.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            ScalarKind::Bool | ScalarKind::Char | ScalarKind::Integer | ScalarKind::Float
        )
    }
}

/// Concrete collection flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    List,
    Set,
}

/// Structural category of a registered type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Scalar(ScalarKind),
    /// Concrete generic collection; element type comes from the first argument.
    Sequence(SequenceKind),
    /// Concrete generic map; key and value types come from the arguments.
    Map,
    Enum { constants: Vec<String> },
    /// Interface-like type that must be substituted by a concrete one.
    ///
    /// Tagged abstract types wrap their value as `{ "Concrete": value }`,
    /// matching serde's externally tagged enums.
    Abstract {
        implementors: Vec<String>,
        tagged: bool,
    },
    Composite(CompositeType),
    AliasStore,
}

/// Registered type with its category.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Field layout, for composite types.
    pub fn as_composite(&self) -> Option<&CompositeType> {
        match &self.kind {
            TypeKind::Composite(composite) => Some(composite),
            _ => None,
        }
    }
}

/// Field layout of a composite type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeType {
    pub fields: Vec<FieldDescriptor>,
    /// Embedded ancestor whose fields are flattened into this type.
    pub base: Option<String>,
    /// Instances only exist bound to an enclosing instance.
    pub inner: bool,
    /// Class-level directives; they override field-level declarations.
    pub class_directives: Vec<ClassDirective>,
}

impl CompositeType {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Declared field of a composite type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeExpr,
    /// Field-level directive declared next to the field.
    pub directive: Option<GenerationDirective>,
    /// Excluded from serialization, never generated.
    pub omitted: bool,
    /// Not part of the instance state.
    pub is_static: bool,
}

impl FieldDescriptor {
    /// Plain field without directive.
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            directive: None,
            omitted: false,
            is_static: false,
        }
    }
}

/// Identity of a field: declaring type plus field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub owner: String,
    pub field: String,
}

impl FieldKey {
    pub fn new(owner: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.field)
    }
}
