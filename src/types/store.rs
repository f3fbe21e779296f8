//! TypeStore: the registry of every known type.
//!
//! Lookups never fail. Pointer and array types are synthesised on demand from
//! their spelled-out names (`T *`, `T[4]`), and anything else that is unknown
//! becomes a zero-size placeholder registered under the requested key. The
//! placeholders are swapped for real entities by the resolution pass once all
//! declarations have been registered.

use std::collections::HashMap;
use std::ops::Index;
use tracing::warn;

use crate::error::Result;
use crate::types::key::TypeKey;
use crate::types::primitives::{builtin_types, CHAR_POINTER_NAME, STRING_TYPE_NAME};
use crate::types::ty::{ArrayType, PointerType, Type, TypeId};

/// Upper bound on alias/array nesting followed when computing sizes.
const MAX_TYPE_DEPTH: usize = 64;

/// Arena of type entities addressed by [`TypeKey`].
#[derive(Debug, Clone)]
pub struct TypeStore {
    entities: Vec<Type>,
    keys: HashMap<TypeKey, TypeId>,
    pointer_size: u32,
}

impl TypeStore {
    /// Create an empty store.
    pub fn new(pointer_size: u32) -> Self {
        Self {
            entities: Vec::new(),
            keys: HashMap::new(),
            pointer_size,
        }
    }

    /// Create a store seeded with the built-in primitives and `string`.
    pub fn with_builtins(pointer_size: u32) -> Self {
        let mut store = Self::new(pointer_size);
        for ty in builtin_types(pointer_size) {
            store.add(ty);
        }
        store
    }

    pub fn pointer_size(&self) -> u32 {
        self.pointer_size
    }

    /// Register a type under its key, replacing any previous registration.
    ///
    /// The type gets a fresh slot. Ids handed out earlier for the same key
    /// keep pointing at the old entity until [`crate::types::unswizzle`]
    /// rewrites the slots that reference it.
    pub fn add(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.entities.len() as u32);
        self.keys.insert(ty.key().clone(), id);
        self.entities.push(ty);
        id
    }

    /// Resolve a key to a type, synthesising composites or a placeholder.
    pub fn get(&mut self, key: &TypeKey) -> TypeId {
        if let Some(id) = self.keys.get(key) {
            return *id;
        }

        let name = key.name();
        if name == CHAR_POINTER_NAME {
            let pointee = self.get(&TypeKey::root(STRING_TYPE_NAME));
            return self.add(Type::Pointer(PointerType {
                key: key.clone(),
                pointee,
            }));
        }

        if let Some(pointee_name) = name.strip_suffix('*') {
            let pointee = self.get(&key.with_name(pointee_name.trim()));
            return self.add(Type::Pointer(PointerType {
                key: key.clone(),
                pointee,
            }));
        }

        if let Some((element_name, count)) = split_array_name(name) {
            let element = self.get(&key.with_name(element_name));
            return self.add(Type::Array(ArrayType {
                key: key.clone(),
                element,
                count,
            }));
        }

        self.add(Type::Placeholder(key.clone()))
    }

    /// Parse a key string and resolve it with [`TypeStore::get`].
    pub fn get_str(&mut self, key: &str) -> Result<TypeId> {
        let key = TypeKey::parse(key)?;
        Ok(self.get(&key))
    }

    /// Registered entity for a key, without synthesising anything.
    pub fn lookup(&self, key: &TypeKey) -> Option<TypeId> {
        self.keys.get(key).copied()
    }

    /// Registered entity for a key string such as `Foo/Bar`.
    pub fn lookup_str(&self, key: &str) -> Option<TypeId> {
        TypeKey::parse(key).ok().and_then(|key| self.lookup(&key))
    }

    pub fn by_key(&self, key: &TypeKey) -> Option<&Type> {
        self.lookup(key).map(|id| &self[id])
    }

    /// Snapshot of every registered key.
    pub fn all_keys(&self) -> Vec<TypeKey> {
        self.keys.keys().cloned().collect()
    }

    /// Iterate over registered keys and their entities.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeKey, &Type)> {
        self.keys.iter().map(move |(key, id)| (key, &self[*id]))
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_placeholder(&self, id: TypeId) -> bool {
        self[id].is_placeholder()
    }

    /// Registered keys that still denote a placeholder, sorted.
    pub fn unresolved_keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self
            .iter()
            .filter(|(_, ty)| ty.is_placeholder())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Size in bytes, or `None` for variable-size types.
    pub fn size_of(&self, id: TypeId) -> Option<u32> {
        self.size_of_at_depth(id, 0)
    }

    fn size_of_at_depth(&self, id: TypeId, depth: usize) -> Option<u32> {
        if depth > MAX_TYPE_DEPTH {
            return None;
        }

        match &self[id] {
            Type::Primitive(t) => Some(t.size),
            Type::Enum(t) => Some(t.size),
            Type::Struct(t) | Type::Union(t) => Some(t.size),
            Type::FuncPointer(_) | Type::Pointer(_) => Some(self.pointer_size),
            Type::Alias(t) => self.size_of_at_depth(t.target, depth + 1),
            Type::Array(t) => self
                .size_of_at_depth(t.element, depth + 1)
                .map(|size| size.saturating_mul(t.count)),
            Type::String(_) => None,
            Type::Placeholder(_) => Some(0),
        }
    }

    /// Swap a slot holding a placeholder for the entity now registered under
    /// the placeholder's key. Returns whether the slot changed.
    pub fn resolve_ref(&mut self, slot: &mut TypeId) -> bool {
        let key = match &self[*slot] {
            Type::Placeholder(key) => key.clone(),
            _ => return false,
        };

        let resolved = self.get(&key);
        if resolved == *slot {
            return false;
        }
        *slot = resolved;
        true
    }

    pub(crate) fn type_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.entities[id.index()]
    }

    /// Move an entity out of the arena, leaving a placeholder with its key.
    pub(crate) fn take(&mut self, id: TypeId) -> Type {
        let stand_in = Type::Placeholder(self[id].key().clone());
        std::mem::replace(&mut self.entities[id.index()], stand_in)
    }

    pub(crate) fn restore(&mut self, id: TypeId, ty: Type) {
        self.entities[id.index()] = ty;
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::with_builtins(crate::config::DEFAULT_POINTER_SIZE)
    }
}

impl Index<TypeId> for TypeStore {
    type Output = Type;

    fn index(&self, id: TypeId) -> &Type {
        &self.entities[id.index()]
    }
}

/// Split `T[N]` into the element name (bracketed segment removed) and `N`.
fn split_array_name(name: &str) -> Option<(String, u32)> {
    let open = name.find('[')?;
    let close = open + name[open..].find(']')?;
    let digits = &name[open + 1..close];
    match digits.trim().parse::<u32>() {
        Ok(count) => {
            let element = format!("{}{}", &name[..open], &name[close + 1..]);
            Some((element.trim().to_string(), count))
        }
        Err(_) => {
            warn!(name, "Array bound is not a number, treating as unknown type");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::resolve::unswizzle;
    use crate::types::ty::{Primitive, StructMember, StructType, TypeKind};

    #[test]
    fn test_placeholder_default() {
        let mut store = TypeStore::default();
        let key = TypeKey::new("/", "nonexistent");
        let id = store.get(&key);
        assert!(store.is_placeholder(id));
        assert_eq!(store[id].key(), &key);
        assert_eq!(store.size_of(id), Some(0));
        assert_eq!(store.get(&key), id);
    }

    #[test]
    fn test_add_takes_a_fresh_slot() {
        let mut store = TypeStore::default();
        let key = TypeKey::root("later");
        let ptr = store.get_str("later *").unwrap();
        let stale = store.lookup(&key).unwrap();

        let real = store.add(Type::Primitive(Primitive { key: key.clone(), size: 2 }));
        assert_ne!(real, stale);
        assert!(store.is_placeholder(stale));
        assert_eq!(store.lookup(&key), Some(real));

        assert!(unswizzle(&mut store));
        match &store[ptr] {
            Type::Pointer(p) => assert_eq!(p.pointee, real),
            other => panic!("expected pointer, got {other}"),
        }
    }

    #[test]
    fn test_pointer_synthesis() {
        let mut store = TypeStore::default();
        let id = store.get_str("int *").unwrap();
        match &store[id] {
            Type::Pointer(p) => assert_eq!(store[p.pointee].key().name(), "int"),
            other => panic!("expected pointer, got {other}"),
        }
        assert_eq!(store.size_of(id), Some(4));
        assert_eq!(store.get_str("int *").unwrap(), id);
    }

    #[test]
    fn test_char_pointer_is_string_pointer() {
        let mut store = TypeStore::default();
        let id = store.get_str("char *").unwrap();
        match &store[id] {
            Type::Pointer(p) => assert_eq!(store[p.pointee].kind(), TypeKind::String),
            other => panic!("expected pointer, got {other}"),
        }
        assert_eq!(store.lookup_str("char *"), Some(id));
    }

    #[test]
    fn test_array_synthesis() {
        let mut store = TypeStore::default();
        let id = store.get_str("dword[5]").unwrap();
        match &store[id] {
            Type::Array(a) => {
                assert_eq!(a.count, 5);
                assert_eq!(store[a.element].key().name(), "dword");
            }
            other => panic!("expected array, got {other}"),
        }
        assert_eq!(store.size_of(id), Some(20));
        assert_eq!(store.get_str("dword[5]").unwrap(), id);
    }

    #[test]
    fn test_nested_composites() {
        let mut store = TypeStore::default();
        let id = store.get_str("word[2][3]").unwrap();
        assert_eq!(store.size_of(id), Some(12));

        let ptr_array = store.get_str("byte *[4]").unwrap();
        assert_eq!(store.size_of(ptr_array), Some(16));
    }

    #[test]
    fn test_bad_array_bound_is_placeholder() {
        let mut store = TypeStore::default();
        let id = store.get_str("int[n]").unwrap();
        assert!(store.is_placeholder(id));
    }

    #[test]
    fn test_add_overwrites() {
        let mut store = TypeStore::default();
        let key = TypeKey::root("thing");
        let placeholder = store.get(&key);
        let real = store.add(Type::Primitive(Primitive {
            key: key.clone(),
            size: 3,
        }));
        assert_ne!(placeholder, real);
        assert_eq!(store.lookup(&key), Some(real));
        assert_eq!(store.size_of(real), Some(3));
    }

    #[test]
    fn test_resolve_ref() {
        let mut store = TypeStore::default();
        let key = TypeKey::new("ns", "later");
        let mut slot = store.get(&key);
        assert!(!store.resolve_ref(&mut slot));

        let real = store.add(Type::Struct(StructType {
            key: key.clone(),
            size: 8,
            members: vec![StructMember::new("x".into(), slot, 0, 8, None)],
        }));
        assert!(store.resolve_ref(&mut slot));
        assert_eq!(slot, real);
        assert!(!store.resolve_ref(&mut slot));
    }

    #[test]
    fn test_unresolved_keys() {
        let mut store = TypeStore::default();
        store.get(&TypeKey::new("b", "missing"));
        store.get(&TypeKey::new("a", "missing"));
        let keys = store.unresolved_keys();
        assert_eq!(keys, vec![TypeKey::new("a", "missing"), TypeKey::new("b", "missing")]);
    }
}
