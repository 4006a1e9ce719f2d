// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type resolver: maps a runtime type to a numeric id or a namespaced
//! `(namespace, typename)` pair, and writes/reads the wire type header
//! (spec §4.4).

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::meta::{MetaStringCache, MetaStringEncoder};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::type_id;
use std::collections::HashMap;

/// One field of a registered struct, used only to compute/verify the schema
/// hash (spec §4.5 "Struct").
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    /// The field's declared type id, when it names a built-in or another
    /// registered type; `None` triggers the canonical-type-string fallback
    /// in [`schema_hash`].
    pub type_id: Option<i32>,
    /// Canonical type string used to derive a hash when `type_id` is `None`
    /// (e.g. `"list<string>"`), per SPEC_FULL.md §9.1.
    pub canonical_type: String,
}

#[derive(Debug, Clone)]
pub struct StructDescriptor {
    pub fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    pub fn new(mut fields: Vec<FieldDescriptor>) -> Self {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        StructDescriptor { fields }
    }
}

/// Registration record for a user type (spec §3 "TypeInfo").
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub type_id: i32,
    pub namespace: Option<String>,
    pub typename: Option<String>,
    pub struct_descriptor: Option<StructDescriptor>,
    pub is_enum: bool,
}

impl TypeInfo {
    pub fn is_namespaced(&self) -> bool {
        type_id::is_namespaced(self.type_id)
    }
}

/// What the caller asks for when registering a user type (spec §4.4
/// "Registration"): exactly one of `id` or `typename` must be set.
pub struct Registration {
    pub id: Option<i32>,
    pub namespace: Option<String>,
    pub typename: Option<String>,
    pub is_struct: bool,
    pub is_enum: bool,
    pub fields: Vec<FieldDescriptor>,
}

impl Registration {
    pub fn by_id(id: i32) -> Self {
        Registration {
            id: Some(id),
            namespace: None,
            typename: None,
            is_struct: false,
            is_enum: false,
            fields: Vec::new(),
        }
    }

    pub fn by_name(namespace: impl Into<String>, typename: impl Into<String>) -> Self {
        Registration {
            id: None,
            namespace: Some(namespace.into()),
            typename: Some(typename.into()),
            is_struct: false,
            is_enum: false,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldDescriptor>) -> Self {
        self.is_struct = true;
        self.fields = fields;
        self
    }

    pub fn as_enum(mut self) -> Self {
        self.is_enum = true;
        self
    }
}

pub struct TypeResolver {
    types_by_id: HashMap<i32, TypeInfo>,
    types_by_name: HashMap<(String, String), i32>,
    next_user_id: i32,
    namespace_encoder: MetaStringEncoder,
    typename_encoder: MetaStringEncoder,
}

impl TypeResolver {
    pub fn new() -> Self {
        TypeResolver {
            types_by_id: HashMap::new(),
            types_by_name: HashMap::new(),
            next_user_id: type_id::USER_TYPE_START,
            namespace_encoder: MetaStringEncoder::new('.', '_'),
            typename_encoder: MetaStringEncoder::new('$', '_'),
        }
    }

    /// Registers a user type per spec §4.4. Exactly one of `id` / `typename`
    /// must resolve; both set or both unset is `InvalidRegistration`.
    pub fn register(&mut self, reg: Registration) -> Result<i32> {
        let has_id = reg.id.is_some();
        let has_name = reg.typename.is_some();
        if has_id == has_name {
            return Err(Error::InvalidRegistration(
                "exactly one of id or typename must be supplied".into(),
            ));
        }

        let struct_descriptor = if reg.is_struct {
            Some(StructDescriptor::new(reg.fields))
        } else {
            None
        };

        if let Some(id) = reg.id {
            if id < type_id::USER_TYPE_START {
                return Err(Error::InvalidRegistration(format!(
                    "id {id} collides with the built-in range (< {})",
                    type_id::USER_TYPE_START
                )));
            }
            if let Some(existing) = self.types_by_id.get(&id) {
                if existing.struct_descriptor.is_some() != reg.is_struct
                    || existing.is_enum != reg.is_enum
                {
                    return Err(Error::TypeAlreadyRegistered(format!(
                        "id {id} already registered with a different kind"
                    )));
                }
                return Ok(id);
            }
            self.types_by_id.insert(
                id,
                TypeInfo {
                    type_id: id,
                    namespace: None,
                    typename: None,
                    struct_descriptor,
                    is_enum: reg.is_enum,
                },
            );
            return Ok(id);
        }

        let namespace = reg.namespace.unwrap_or_default();
        let typename = reg.typename.unwrap();
        let key = (namespace.clone(), typename.clone());
        if let Some(&id) = self.types_by_name.get(&key) {
            return Ok(id);
        }
        let id = self.next_user_id;
        self.next_user_id += 1;
        let tagged_id = (id << 8)
            | if reg.is_enum {
                type_id::NAMED_ENUM as i32
            } else {
                type_id::NAMED_STRUCT as i32
            };
        self.types_by_name.insert(key, tagged_id);
        self.types_by_id.insert(
            tagged_id,
            TypeInfo {
                type_id: tagged_id,
                namespace: Some(namespace),
                typename: Some(typename),
                struct_descriptor,
                is_enum: reg.is_enum,
            },
        );
        Ok(tagged_id)
    }

    pub fn lookup(&self, id: i32) -> Option<&TypeInfo> {
        self.types_by_id.get(&id)
    }

    pub fn lookup_by_name(&self, namespace: &str, typename: &str) -> Option<&TypeInfo> {
        self.types_by_name
            .get(&(namespace.to_string(), typename.to_string()))
            .and_then(|id| self.types_by_id.get(id))
    }

    /// Writes the type header (spec §4.4): var-int id, plus two meta-strings
    /// when the low byte marks a namespaced representation. `cache` is the
    /// process-lifetime encoding cache (spec §9 Design Notes), consulted so a
    /// namespace/typename repeated across many `serialize` calls on the same
    /// [`crate::fory::Fory`] isn't re-encoded from scratch every time.
    pub fn write_typeinfo(
        &self,
        buf: &mut Buffer,
        cache: &mut MetaStringCache,
        ctx: &mut WriteContext,
        id: i32,
    ) -> Result<()> {
        buf.write_varuint32(id as u32);
        if type_id::is_namespaced(id) {
            let info = self
                .types_by_id
                .get(&id)
                .ok_or_else(|| Error::TypeUnregistered(id.to_string()))?;
            self.write_namespaced_name(buf, cache, ctx, info.namespace.as_deref(), info.typename.as_deref())?;
        }
        Ok(())
    }

    /// Writes a type header for a value this side never registered (a
    /// [`crate::value::Value::Ext`] being forwarded): `ordinal` is the raw
    /// wire id recorded when it was decoded, `namespace`/`typename` are
    /// `Some` only when `ordinal`'s low byte is `NAMED_EXT`.
    pub fn write_opaque_typeinfo(
        &self,
        buf: &mut Buffer,
        cache: &mut MetaStringCache,
        ctx: &mut WriteContext,
        ordinal: i32,
        namespace: Option<&str>,
        typename: Option<&str>,
    ) -> Result<()> {
        buf.write_varuint32(ordinal as u32);
        if type_id::is_namespaced(ordinal) {
            self.write_namespaced_name(buf, cache, ctx, namespace, typename)?;
        }
        Ok(())
    }

    fn write_namespaced_name(
        &self,
        buf: &mut Buffer,
        cache: &mut MetaStringCache,
        ctx: &mut WriteContext,
        namespace: Option<&str>,
        typename: Option<&str>,
    ) -> Result<()> {
        let ns = cache.get_or_encode(namespace.unwrap_or(""), &self.namespace_encoder)?;
        let name = cache.get_or_encode(typename.unwrap_or(""), &self.typename_encoder)?;
        ctx.write_meta_string(buf, &ns);
        ctx.write_meta_string(buf, &name);
        Ok(())
    }

    /// Reads a type header, resolving namespaced types by (namespace, name).
    /// An id tagged `EXT`/`NAMED_EXT` that isn't locally registered resolves
    /// as [`TypeHeader::Opaque`] instead of failing, since its payload is a
    /// length-prefixed blob this side can carry forward without a descriptor
    /// (spec §4.5 "Peer-language opaque objects"); any other unregistered id
    /// still fails with `TypeUnregistered`.
    pub fn read_typeinfo(&self, buf: &mut Buffer, ctx: &mut ReadContext) -> Result<TypeHeader> {
        let id = buf.read_varuint32()? as i32;
        if type_id::is_namespaced(id) {
            let ns_decoder = crate::meta::MetaStringDecoder::new('.', '_');
            let name_decoder = crate::meta::MetaStringDecoder::new('$', '_');
            let (_, namespace) = ctx.read_meta_string(buf, &ns_decoder)?;
            let (_, typename) = ctx.read_meta_string(buf, &name_decoder)?;
            return match self.lookup_by_name(&namespace, &typename) {
                Some(info) => Ok(TypeHeader::Known(info.type_id)),
                None if type_id::is_ext(id) => Ok(TypeHeader::Opaque {
                    ordinal: id,
                    namespace: Some(namespace),
                    typename: Some(typename),
                }),
                None => Err(Error::TypeUnregistered(format!("{namespace}.{typename}"))),
            };
        }
        if type_id::is_ext(id) && !self.types_by_id.contains_key(&id) {
            return Ok(TypeHeader::Opaque {
                ordinal: id,
                namespace: None,
                typename: None,
            });
        }
        Ok(TypeHeader::Known(id))
    }
}

/// What a decoded type header resolved to (§4.4 / §4.5 "Peer-language
/// opaque objects").
pub enum TypeHeader {
    Known(i32),
    Opaque {
        ordinal: i32,
        namespace: Option<String>,
        typename: Option<String>,
    },
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema hash (spec §4.5 "Struct"): `initial 17, hash = hash*31+id, folded
/// by /7 while >= i32::MAX`, over fields sorted by name.
pub fn schema_hash(descriptor: &StructDescriptor) -> i32 {
    let mut hash: i64 = 17;
    for field in &descriptor.fields {
        let id = field.type_id.unwrap_or_else(|| canonical_type_hash(&field.canonical_type));
        hash = hash * 31 + id as i64;
        while hash >= i32::MAX as i64 {
            hash /= 7;
        }
    }
    hash as i32
}

/// Derives a stable id for a field type with no registered type id, per
/// SPEC_FULL.md §9.1 ("schema hash for unregistered field types").
fn canonical_type_hash(canonical: &str) -> i32 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    canonical.hash(&mut hasher);
    ((hasher.finish() as i64) & 0x7fff_ffff) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_by_id_is_idempotent() {
        let mut r = TypeResolver::new();
        let id = r.register(Registration::by_id(100)).unwrap();
        let id2 = r.register(Registration::by_id(100)).unwrap();
        assert_eq!(id, id2);
    }

    #[test]
    fn register_requires_exactly_one_of_id_or_name() {
        let mut r = TypeResolver::new();
        let mut both = Registration::by_id(100);
        both.typename = Some("X".into());
        assert!(r.register(both).is_err());
    }

    #[test]
    fn register_by_name_assigns_namespaced_id_and_resolves_by_name() {
        let mut r = TypeResolver::new();
        let id = r.register(Registration::by_name("demo", "P")).unwrap();
        assert!(type_id::is_namespaced(id));
        assert_eq!(r.lookup_by_name("demo", "P").unwrap().type_id, id);
    }

    #[test]
    fn schema_hash_changes_with_field_set() {
        let a = StructDescriptor::new(vec![FieldDescriptor {
            name: "f1".into(),
            type_id: Some(type_id::INT32 as i32),
            canonical_type: "int32".into(),
        }]);
        let b = StructDescriptor::new(vec![
            FieldDescriptor {
                name: "f1".into(),
                type_id: Some(type_id::INT32 as i32),
                canonical_type: "int32".into(),
            },
            FieldDescriptor {
                name: "f2".into(),
                type_id: Some(type_id::STRING as i32),
                canonical_type: "string".into(),
            },
        ]);
        assert_ne!(schema_hash(&a), schema_hash(&b));
    }

    #[test]
    fn schema_hash_stays_in_i32_range() {
        let fields: Vec<FieldDescriptor> = (0..200)
            .map(|i| FieldDescriptor {
                name: format!("f{i:04}"),
                type_id: Some(type_id::INT64 as i32),
                canonical_type: "int64".into(),
            })
            .collect();
        let descriptor = StructDescriptor::new(fields);
        let h = schema_hash(&descriptor);
        assert!((h as i64) < i32::MAX as i64);
    }
}
