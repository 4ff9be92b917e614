//! Schema model (C1): a typed description of vertex kinds, fields, edges,
//! inheritance, and scalar property types (§3.1). Schema values are
//! constructed once per compiler session and are deeply immutable
//! thereafter (§3.5), so a single [`Schema`] can be shared across
//! concurrently running compilations without synchronization.

mod deserialize;
mod index;

pub use deserialize::SchemaDocument;
pub use index::IndexDescriptor;

use std::collections::HashMap;

use indexmap::IndexMap;
use query_ir::{Direction, MetaField, ScalarKind};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// `object`, `interface`, or `union` (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Object,
    Interface,
    Union,
}

/// The kind of edge a vertex field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// A direct edge declared on the owning type (or inherited verbatim
    /// from an interface it implements).
    Direct,
}

/// One field of an object/interface type (§3.1). Serializes externally
/// tagged (`{"property": {"kind": "string"}}`, `{"vertex": {...}}`,
/// `{"meta": "typename"}`) rather than internally tagged, since the
/// `Property` variant's own `kind` field would otherwise collide with an
/// internal tag key of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDescriptor {
    /// A scalar or list-of-scalar property.
    Property { kind: ScalarKind },
    /// An edge leading to another vertex type.
    Vertex {
        direction: Direction,
        edge_name: String,
        target_type: String,
    },
    /// `__typename` or `_x_count`.
    Meta(MetaField),
}

/// An object, interface, or union type definition. Object types
/// additionally declare which interfaces they implement; union types
/// instead carry an ordered list of member object types and have no
/// fields of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    /// Declared field map, in declaration order. Empty for unions.
    #[serde(default)]
    pub fields: IndexMap<String, FieldDescriptor>,
    /// Interfaces this object type implements. Empty for interfaces and
    /// unions — interfaces do not inherit from other interfaces (§3.1).
    #[serde(default)]
    pub implements: Vec<String>,
    /// Ordered member list. Empty for objects and interfaces.
    #[serde(default)]
    pub members: Vec<String>,
}

impl TypeDef {
    pub fn is_object(&self) -> bool {
        self.kind == TypeKind::Object
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_union(&self) -> bool {
        self.kind == TypeKind::Union
    }
}

fn is_reserved(name: &str) -> bool {
    name.starts_with("___")
}

/// The typed graph schema (C1). Construct via [`Schema::new`], which runs
/// every invariant check from §3.1 up front so every later stage can
/// assume a well-formed schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    types: IndexMap<String, TypeDef>,
    /// object type name -> union type name it is declared equivalent to.
    equivalent_unions: HashMap<String, String>,
    root_types: Vec<String>,
    indexes: Vec<IndexDescriptor>,
}

impl Schema {
    /// Construct and validate a schema: unique field names per type,
    /// objects only implement interfaces, unions have no duplicate or
    /// unknown members, and reserved (`___`-prefixed) names never appear
    /// as user field names.
    pub fn new(
        types: Vec<TypeDef>,
        root_types: Vec<String>,
        equivalent_unions: HashMap<String, String>,
        indexes: Vec<IndexDescriptor>,
    ) -> Result<Schema, SchemaError> {
        let mut map = IndexMap::new();
        for ty in types {
            if map.contains_key(&ty.name) {
                return Err(SchemaError::DuplicateFieldName(ty.name));
            }
            map.insert(ty.name.clone(), ty);
        }

        for ty in map.values() {
            let mut seen = std::collections::HashSet::new();
            for field_name in ty.fields.keys() {
                if is_reserved(field_name) {
                    return Err(SchemaError::ReservedName(field_name.clone()));
                }
                if !seen.insert(field_name.as_str()) {
                    return Err(SchemaError::DuplicateFieldName(ty.name.clone()));
                }
            }

            match ty.kind {
                TypeKind::Union => {
                    if ty.members.is_empty() {
                        return Err(SchemaError::EmptyUnion(ty.name.clone()));
                    }
                    let mut seen_members = std::collections::HashSet::new();
                    for member in &ty.members {
                        if !seen_members.insert(member.as_str()) {
                            return Err(SchemaError::DuplicateUnionMember(ty.name.clone()));
                        }
                        if !map.contains_key(member) {
                            return Err(SchemaError::UnknownType(member.clone()));
                        }
                    }
                }
                TypeKind::Object => {
                    for supertype in &ty.implements {
                        match map.get(supertype) {
                            None => {
                                return Err(SchemaError::UnknownSupertype(
                                    ty.name.clone(),
                                    supertype.clone(),
                                ))
                            }
                            Some(parent) if parent.kind != TypeKind::Interface => {
                                return Err(SchemaError::ObjectImplementsNonInterface {
                                    object: ty.name.clone(),
                                    supertype: supertype.clone(),
                                })
                            }
                            Some(_) => {}
                        }
                    }
                }
                TypeKind::Interface => {
                    if !ty.implements.is_empty() {
                        return Err(SchemaError::ObjectImplementsNonInterface {
                            object: ty.name.clone(),
                            supertype: ty.implements[0].clone(),
                        });
                    }
                }
            }
        }

        for root in &root_types {
            if !map.contains_key(root) {
                return Err(SchemaError::UnknownRootType(root.clone()));
            }
        }

        for (object_name, union_name) in &equivalent_unions {
            if !map.contains_key(object_name) {
                return Err(SchemaError::UnknownType(object_name.clone()));
            }
            match map.get(union_name) {
                Some(u) if u.is_union() => {}
                _ => return Err(SchemaError::UnknownType(union_name.clone())),
            }
        }

        let schema = Schema {
            types: map,
            equivalent_unions,
            root_types,
            indexes,
        };
        schema.check_no_ambiguous_inherited_fields()?;
        Ok(schema)
    }

    fn check_no_ambiguous_inherited_fields(&self) -> Result<(), SchemaError> {
        for ty in self.types.values() {
            if !ty.is_object() {
                continue;
            }
            let mut inherited: HashMap<&str, &FieldDescriptor> = HashMap::new();
            for parent_name in &ty.implements {
                let Some(parent) = self.types.get(parent_name) else {
                    continue;
                };
                for (field_name, descriptor) in &parent.fields {
                    if ty.fields.contains_key(field_name) {
                        continue;
                    }
                    match inherited.get(field_name.as_str()) {
                        None => {
                            inherited.insert(field_name, descriptor);
                        }
                        Some(existing) if !descriptors_compatible(existing, descriptor) => {
                            return Err(SchemaError::AmbiguousField {
                                owner: ty.name.clone(),
                                field: field_name.clone(),
                            });
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        Ok(())
    }

    pub fn root_types(&self) -> &[String] {
        &self.root_types
    }

    pub fn indexes(&self) -> &[IndexDescriptor] {
        &self.indexes
    }

    /// `4.1 lookup_type`
    pub fn lookup_type(&self, name: &str) -> Result<&TypeDef, SchemaError> {
        self.types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// Own fields merged with fields inherited from implemented
    /// interfaces, own declarations taking precedence. Two interfaces
    /// disagreeing on an inherited (non-overridden) field's shape is
    /// rejected at construction time by `AmbiguousField`, so by the time
    /// a `Schema` exists this merge is unambiguous.
    fn effective_fields(&self, type_name: &str) -> Result<IndexMap<String, FieldDescriptor>, SchemaError> {
        let ty = self.lookup_type(type_name)?;
        let mut fields = ty.fields.clone();
        for parent_name in &ty.implements {
            let parent = self.lookup_type(parent_name)?;
            for (field_name, descriptor) in &parent.fields {
                fields.entry(field_name.clone()).or_insert_with(|| descriptor.clone());
            }
        }
        Ok(fields)
    }

    /// `4.1 field`
    pub fn field(&self, owner_type: &str, field_name: &str) -> Result<FieldDescriptor, SchemaError> {
        let fields = self.effective_fields(owner_type)?;
        fields.get(field_name).cloned().ok_or_else(|| SchemaError::UnknownField {
            owner: owner_type.to_string(),
            field: field_name.to_string(),
        })
    }

    /// `4.1 resolve_edge` — walks the implements relation.
    pub fn resolve_edge(
        &self,
        owner_type: &str,
        direction: Direction,
        edge_name: &str,
    ) -> Result<(String, EdgeKind), SchemaError> {
        let fields = self.effective_fields(owner_type)?;
        match fields.get(edge_name) {
            Some(FieldDescriptor::Vertex {
                direction: d,
                target_type,
                ..
            }) if *d == direction => Ok((target_type.clone(), EdgeKind::Direct)),
            _ => Err(SchemaError::UnknownEdge {
                owner: owner_type.to_string(),
                direction,
                edge_name: edge_name.to_string(),
            }),
        }
    }

    /// `4.1 equivalent_union_of`
    pub fn equivalent_union_of(&self, object_type: &str) -> Option<&str> {
        self.equivalent_unions.get(object_type).map(String::as_str)
    }

    /// `4.1 list_meta_fields` — every type exposes `__typename` and
    /// `_x_count`.
    pub fn list_meta_fields(&self, owner_type: &str) -> Result<Vec<FieldDescriptor>, SchemaError> {
        self.lookup_type(owner_type)?;
        Ok(vec![
            FieldDescriptor::Meta(MetaField::Typename),
            FieldDescriptor::Meta(MetaField::Count),
        ])
    }

    /// `4.1 is_subtype` — `a == b`, `a` implements interface `b`, or `a`
    /// is a member of union `b`.
    pub fn is_subtype(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        if let Ok(ty) = self.lookup_type(a) {
            if ty.implements.iter().any(|i| i == b) {
                return true;
            }
        }
        if let Ok(union_ty) = self.lookup_type(b) {
            if union_ty.is_union() && union_ty.members.iter().any(|m| m == a) {
                return true;
            }
        }
        false
    }
}

fn descriptors_compatible(a: &FieldDescriptor, b: &FieldDescriptor) -> bool {
    match (a, b) {
        (FieldDescriptor::Property { kind: k1 }, FieldDescriptor::Property { kind: k2 }) => k1 == k2,
        (
            FieldDescriptor::Vertex {
                target_type: t1,
                direction: d1,
                ..
            },
            FieldDescriptor::Vertex {
                target_type: t2,
                direction: d2,
                ..
            },
        ) => t1 == t2 && d1 == d2,
        (FieldDescriptor::Meta(m1), FieldDescriptor::Meta(m2)) => m1 == m2,
        _ => false,
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::animal_species_schema;
    use super::*;

    #[test]
    fn lookup_and_field() {
        let schema = animal_species_schema();
        assert!(schema.lookup_type("Animal").is_ok());
        assert!(matches!(schema.lookup_type("Bogus"), Err(SchemaError::UnknownType(_))));
        assert!(matches!(
            schema.field("Animal", "name"),
            Ok(FieldDescriptor::Property { kind: ScalarKind::String })
        ));
        assert!(schema.field("Animal", "nope").is_err());
    }

    #[test]
    fn resolve_edge_walks_direction() {
        let schema = animal_species_schema();
        let (target, _) = schema
            .resolve_edge("Animal", Direction::Out, "out_Animal_ParentOf")
            .unwrap();
        assert_eq!(target, "Animal");
        assert!(schema
            .resolve_edge("Animal", Direction::In, "out_Animal_ParentOf")
            .is_err());
    }

    #[test]
    fn reserved_field_name_rejected() {
        let mut fields = IndexMap::new();
        fields.insert(
            "___bad".to_string(),
            FieldDescriptor::Property { kind: ScalarKind::String },
        );
        let types = vec![TypeDef {
            name: "Bad".to_string(),
            kind: TypeKind::Object,
            fields,
            implements: vec![],
            members: vec![],
        }];
        let result = Schema::new(types, vec![], HashMap::new(), vec![]);
        assert!(matches!(result, Err(SchemaError::ReservedName(_))));
    }

    #[test]
    fn object_cannot_implement_non_interface() {
        let types = vec![
            TypeDef {
                name: "A".to_string(),
                kind: TypeKind::Object,
                fields: IndexMap::new(),
                implements: vec![],
                members: vec![],
            },
            TypeDef {
                name: "B".to_string(),
                kind: TypeKind::Object,
                fields: IndexMap::new(),
                implements: vec!["A".to_string()],
                members: vec![],
            },
        ];
        let result = Schema::new(types, vec![], HashMap::new(), vec![]);
        assert!(matches!(result, Err(SchemaError::ObjectImplementsNonInterface { .. })));
    }

    #[test]
    fn is_subtype_covers_interfaces_and_unions() {
        let mut cat_fields = IndexMap::new();
        cat_fields.insert(
            "name".to_string(),
            FieldDescriptor::Property { kind: ScalarKind::String },
        );
        let types = vec![
            TypeDef {
                name: "Named".to_string(),
                kind: TypeKind::Interface,
                fields: cat_fields.clone(),
                implements: vec![],
                members: vec![],
            },
            TypeDef {
                name: "Cat".to_string(),
                kind: TypeKind::Object,
                fields: cat_fields,
                implements: vec!["Named".to_string()],
                members: vec![],
            },
            TypeDef {
                name: "Pet".to_string(),
                kind: TypeKind::Union,
                fields: IndexMap::new(),
                implements: vec![],
                members: vec!["Cat".to_string()],
            },
        ];
        let schema = Schema::new(types, vec![], HashMap::new(), vec![]).unwrap();
        assert!(schema.is_subtype("Cat", "Named"));
        assert!(schema.is_subtype("Cat", "Pet"));
        assert!(!schema.is_subtype("Named", "Cat"));
    }

    #[test]
    fn ambiguous_inherited_field_rejected() {
        let mut left_fields = IndexMap::new();
        left_fields.insert("age".to_string(), FieldDescriptor::Property { kind: ScalarKind::Int });
        let mut right_fields = IndexMap::new();
        right_fields.insert(
            "age".to_string(),
            FieldDescriptor::Property { kind: ScalarKind::String },
        );
        let types = vec![
            TypeDef {
                name: "HasAgeInt".to_string(),
                kind: TypeKind::Interface,
                fields: left_fields,
                implements: vec![],
                members: vec![],
            },
            TypeDef {
                name: "HasAgeString".to_string(),
                kind: TypeKind::Interface,
                fields: right_fields,
                implements: vec![],
                members: vec![],
            },
            TypeDef {
                name: "Confused".to_string(),
                kind: TypeKind::Object,
                fields: IndexMap::new(),
                implements: vec!["HasAgeInt".to_string(), "HasAgeString".to_string()],
                members: vec![],
            },
        ];
        let result = Schema::new(types, vec![], HashMap::new(), vec![]);
        assert!(matches!(result, Err(SchemaError::AmbiguousField { .. })));
    }
}
