use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::aliases::AliasStore;
use crate::directive::{ClassDirective, GenerationDirective};
use crate::error::{Error, Result};
use crate::types::{
    CompositeType, FieldDescriptor, ScalarKind, SequenceKind, TypeDescriptor, TypeExpr, TypeKind,
};
use crate::ALIAS_STORE_TYPE;

/// Chrono format used for `DateTime<Utc>` leaves.
pub const UTC_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
/// Chrono format used for `NaiveDateTime` leaves.
pub const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
/// Chrono format used for `NaiveDate` leaves.
pub const NAIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Types the generator can synthesize.
///
/// `describe` registers the type (and everything it references) and returns
/// the expression fields use to point at it. The typed value is later built
/// through the type's `Deserialize` impl.
pub trait Fixture {
    fn describe(types: &mut TypeRegistry) -> TypeExpr;
}

/// Name-indexed catalog of type descriptors.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDescriptor>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Registry preloaded with scalars, std collections and their abstractions.
    pub fn new() -> Self {
        let mut registry = Self {
            types: BTreeMap::new(),
        };
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        let scalars = [
            ("bool", ScalarKind::Bool),
            ("char", ScalarKind::Char),
            ("i8", ScalarKind::Integer),
            ("i16", ScalarKind::Integer),
            ("i32", ScalarKind::Integer),
            ("i64", ScalarKind::Integer),
            ("isize", ScalarKind::Integer),
            ("u8", ScalarKind::Integer),
            ("u16", ScalarKind::Integer),
            ("u32", ScalarKind::Integer),
            ("u64", ScalarKind::Integer),
            ("usize", ScalarKind::Integer),
            ("f32", ScalarKind::Float),
            ("f64", ScalarKind::Float),
            ("String", ScalarKind::Text),
            (
                "DateTime",
                ScalarKind::Date {
                    format: UTC_DATETIME_FORMAT,
                },
            ),
            (
                "NaiveDateTime",
                ScalarKind::Date {
                    format: NAIVE_DATETIME_FORMAT,
                },
            ),
            (
                "NaiveDate",
                ScalarKind::Date {
                    format: NAIVE_DATE_FORMAT,
                },
            ),
        ];
        for (name, kind) in scalars {
            self.register(TypeDescriptor::new(name, TypeKind::Scalar(kind)));
        }

        for name in ["Vec", "VecDeque"] {
            self.register(TypeDescriptor::new(
                name,
                TypeKind::Sequence(SequenceKind::List),
            ));
        }
        for name in ["HashSet", "BTreeSet"] {
            self.register(TypeDescriptor::new(
                name,
                TypeKind::Sequence(SequenceKind::Set),
            ));
        }
        for name in ["HashMap", "BTreeMap"] {
            self.register(TypeDescriptor::new(name, TypeKind::Map));
        }

        let abstractions = [
            ("List", vec!["Vec", "VecDeque"]),
            ("Set", vec!["HashSet", "BTreeSet"]),
            ("Collection", vec!["List", "Set"]),
            ("Map", vec!["HashMap", "BTreeMap"]),
        ];
        for (name, implementors) in abstractions {
            self.register(TypeDescriptor::new(
                name,
                TypeKind::Abstract {
                    implementors: implementors.into_iter().map(str::to_string).collect(),
                    tagged: false,
                },
            ));
        }

        self.register(TypeDescriptor::new(ALIAS_STORE_TYPE, TypeKind::AliasStore));
    }

    /// Store a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Descriptor registered under `name`.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Descriptor backing a named or generic expression.
    pub fn resolve(&self, ty: &TypeExpr) -> Result<&TypeDescriptor> {
        let name = ty
            .base_name()
            .ok_or_else(|| Error::Unsupported(format!("'{ty}' has no registered descriptor")))?;
        self.get(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    /// Register `T` and the types it references.
    pub fn describe<T: Fixture>(&mut self) -> TypeExpr {
        T::describe(self)
    }

    /// Register a composite type; a name that is already known is left as is.
    ///
    /// The name is reserved before `build` runs so self-referencing fields
    /// resolve to it instead of recursing.
    pub fn composite<F>(&mut self, name: &str, build: F) -> TypeExpr
    where
        F: FnOnce(&mut CompositeBuilder<'_>),
    {
        if !self.contains(name) {
            self.register(TypeDescriptor::new(
                name,
                TypeKind::Composite(CompositeType::default()),
            ));
            let mut builder = CompositeBuilder {
                types: self,
                composite: CompositeType::default(),
            };
            build(&mut builder);
            let composite = builder.composite;
            self.register(TypeDescriptor::new(name, TypeKind::Composite(composite)));
        }
        TypeExpr::named(name)
    }

    /// Register an enumeration whose constants are listed in ordinal order.
    pub fn enumeration(&mut self, name: &str, constants: &[&str]) -> TypeExpr {
        if !self.contains(name) {
            self.register(TypeDescriptor::new(
                name,
                TypeKind::Enum {
                    constants: constants.iter().map(|c| c.to_string()).collect(),
                },
            ));
        }
        TypeExpr::named(name)
    }

    /// Register an abstract type implemented by the types `implementors`
    /// describes.
    pub fn abstract_type<F>(&mut self, name: &str, tagged: bool, implementors: F) -> TypeExpr
    where
        F: FnOnce(&mut TypeRegistry) -> Vec<TypeExpr>,
    {
        if !self.contains(name) {
            self.register(TypeDescriptor::new(
                name,
                TypeKind::Abstract {
                    implementors: Vec::new(),
                    tagged,
                },
            ));
            let implementors = implementors(self)
                .iter()
                .filter_map(|ty| ty.base_name().map(str::to_string))
                .collect();
            self.register(TypeDescriptor::new(
                name,
                TypeKind::Abstract {
                    implementors,
                    tagged,
                },
            ));
        }
        TypeExpr::named(name)
    }

    /// Whether a value of `candidate` may stand in for `target`.
    ///
    /// Holds for the type itself, for implementors of an abstract type
    /// (transitively) and for composites embedding `target` as an ancestor.
    pub fn is_assignable(&self, target: &str, candidate: &str) -> bool {
        let mut visited = BTreeSet::new();
        self.is_assignable_inner(target, candidate, &mut visited)
    }

    fn is_assignable_inner<'a>(
        &'a self,
        target: &'a str,
        candidate: &str,
        visited: &mut BTreeSet<&'a str>,
    ) -> bool {
        if target == candidate {
            return true;
        }
        if !visited.insert(target) {
            return false;
        }
        if let Some(TypeDescriptor {
            kind: TypeKind::Abstract { implementors, .. },
            ..
        }) = self.get(target)
            && implementors
                .iter()
                .any(|implementor| self.is_assignable_inner(implementor, candidate, visited))
        {
            return true;
        }
        self.composite_chain(candidate)
            .iter()
            .skip(1)
            .any(|(name, _)| *name == target)
    }

    /// The composite `name` followed by its ancestors, nearest first.
    pub fn composite_chain(&self, name: &str) -> Vec<(&str, &CompositeType)> {
        let mut chain: Vec<(&str, &CompositeType)> = Vec::new();
        let mut current = Some(name);
        while let Some(type_name) = current {
            if chain.iter().any(|(seen, _)| *seen == type_name) {
                break;
            }
            let Some(descriptor) = self.types.get(type_name) else {
                break;
            };
            let Some(composite) = descriptor.as_composite() else {
                break;
            };
            chain.push((descriptor.name.as_str(), composite));
            current = composite.base.as_deref();
        }
        chain
    }
}

/// Collects the fields of a composite type being described.
pub struct CompositeBuilder<'r> {
    types: &'r mut TypeRegistry,
    composite: CompositeType,
}

impl CompositeBuilder<'_> {
    /// Declare a field typed after `T`.
    pub fn field<T: Fixture>(&mut self, name: &str) -> &mut Self {
        let ty = T::describe(self.types);
        self.field_as(name, ty)
    }

    /// Declare a field with an explicit type expression.
    pub fn field_as(&mut self, name: &str, ty: TypeExpr) -> &mut Self {
        self.composite.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    /// Attach a field-level directive to the last declared field.
    pub fn with(&mut self, directive: GenerationDirective) -> &mut Self {
        if let Some(field) = self.composite.fields.last_mut() {
            field.directive = Some(directive);
        }
        self
    }

    /// Mark the last declared field as excluded from serialization.
    pub fn omitted(&mut self) -> &mut Self {
        if let Some(field) = self.composite.fields.last_mut() {
            field.omitted = true;
        }
        self
    }

    /// Mark the last declared field as static (not instance state).
    pub fn static_field(&mut self) -> &mut Self {
        if let Some(field) = self.composite.fields.last_mut() {
            field.is_static = true;
        }
        self
    }

    /// Embed `B` as the ancestor of this type.
    pub fn base<B: Fixture>(&mut self) -> &mut Self {
        let ty = B::describe(self.types);
        self.composite.base = ty.base_name().map(str::to_string);
        self
    }

    /// Mark the type as needing an enclosing instance.
    pub fn inner(&mut self) -> &mut Self {
        self.composite.inner = true;
        self
    }

    /// Attach a class-level directive to the type being described.
    pub fn class_directive(&mut self, directive: ClassDirective) -> &mut Self {
        self.composite.class_directives.push(directive);
        self
    }

    /// Registry access for describing related types (ex.: implementation
    /// candidates named by directives).
    pub fn types(&mut self) -> &mut TypeRegistry {
        self.types
    }
}

macro_rules! scalar_fixture {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl Fixture for $ty {
                fn describe(_types: &mut TypeRegistry) -> TypeExpr {
                    TypeExpr::named($name)
                }
            }
        )+
    };
}

scalar_fixture!(
    bool => "bool",
    char => "char",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    String => "String",
    DateTime<Utc> => "DateTime",
    NaiveDateTime => "NaiveDateTime",
    NaiveDate => "NaiveDate",
    AliasStore => "AliasStore",
);

macro_rules! sequence_fixture {
    ($($ty:ident => $name:literal),+ $(,)?) => {
        $(
            impl<T: Fixture> Fixture for $ty<T> {
                fn describe(types: &mut TypeRegistry) -> TypeExpr {
                    TypeExpr::generic($name, vec![T::describe(types)])
                }
            }
        )+
    };
}

sequence_fixture!(
    Vec => "Vec",
    VecDeque => "VecDeque",
    HashSet => "HashSet",
    BTreeSet => "BTreeSet",
);

impl<K: Fixture, V: Fixture> Fixture for HashMap<K, V> {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        TypeExpr::generic("HashMap", vec![K::describe(types), V::describe(types)])
    }
}

impl<K: Fixture, V: Fixture> Fixture for BTreeMap<K, V> {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        TypeExpr::generic("BTreeMap", vec![K::describe(types), V::describe(types)])
    }
}

impl<T: Fixture> Fixture for Option<T> {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        T::describe(types)
    }
}

impl<T: Fixture> Fixture for Box<T> {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        T::describe(types)
    }
}

impl<T: Fixture> Fixture for Box<[T]> {
    fn describe(types: &mut TypeRegistry) -> TypeExpr {
        TypeExpr::array(T::describe(types))
    }
}
