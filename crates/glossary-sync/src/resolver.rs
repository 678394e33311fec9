//! Natural-key resolution.
//!
//! Records name each other by natural key (a term's name, a status's text, a
//! table's name within its location). The resolver maps those keys to node
//! ids through one index per kind, built from the store the first time the
//! kind is asked about and kept current by the loader afterwards.

use crate::catalog::{self, KindSpec};
use ahash::AHashMap;
use glossary_graph::{EntityKind, GraphStore, NodeId};
use std::fmt;

/// Identity of a node as records spell it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NaturalKey {
    /// Owner node for scoped kinds (a table's location).
    pub scope: Option<NodeId>,
    pub name: String,
}

impl NaturalKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scope: None,
            name: name.into(),
        }
    }

    pub fn scoped(scope: Option<NodeId>, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            Some(scope) => write!(f, "{}@{}", self.name, scope),
            None => f.write_str(&self.name),
        }
    }
}

/// The natural key of an existing node, read back from the store.
pub fn key_of<S: GraphStore + ?Sized>(store: &S, id: NodeId) -> Option<NaturalKey> {
    let node = store.node(id)?;
    let spec = catalog::spec(node.kind);
    let name = node.attr(spec.key.field())?.to_string();
    let scope = spec
        .scope_reference()
        .and_then(|reference| store.target(id, reference.relation));
    Some(NaturalKey { scope, name })
}

/// The key field's value of a node (its display name in dumps).
pub fn name_of<S: GraphStore + ?Sized>(store: &S, id: NodeId) -> Option<String> {
    let node = store.node(id)?;
    node.attr(catalog::spec(node.kind).key.field())
        .map(str::to_string)
}

#[derive(Debug, Default)]
struct KindIndex {
    exact: AHashMap<NaturalKey, NodeId>,
    by_name: AHashMap<String, Vec<NodeId>>,
}

impl KindIndex {
    fn build<S: GraphStore + ?Sized>(store: &S, spec: &KindSpec) -> Self {
        let mut index = Self::default();
        for id in store.nodes_of_kind(spec.kind) {
            if let Some(key) = key_of(store, id) {
                index.add(key, id);
            }
        }
        index
    }

    fn add(&mut self, key: NaturalKey, id: NodeId) {
        let names = self.by_name.entry(key.name.clone()).or_default();
        if !names.contains(&id) {
            names.push(id);
        }
        // First node with a key wins.
        self.exact.entry(key).or_insert(id);
    }
}

/// Lazily built natural-key indexes, one per kind.
#[derive(Debug, Default)]
pub struct KeyResolver {
    indexes: AHashMap<EntityKind, KindIndex>,
}

impl KeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn index<S: GraphStore + ?Sized>(&mut self, store: &S, kind: EntityKind) -> &KindIndex {
        self.indexes.entry(kind).or_insert_with(|| {
            tracing::trace!(%kind, "building key index");
            KindIndex::build(store, catalog::spec(kind))
        })
    }

    /// Exact lookup. `None` is an ordinary outcome, not an error.
    pub fn resolve<S: GraphStore + ?Sized>(
        &mut self,
        store: &S,
        kind: EntityKind,
        key: &NaturalKey,
    ) -> Option<NodeId> {
        self.index(store, kind).exact.get(key).copied()
    }

    /// Lookup by name alone, ignoring scope. Only an unambiguous match
    /// resolves.
    pub fn resolve_name<S: GraphStore + ?Sized>(
        &mut self,
        store: &S,
        kind: EntityKind,
        name: &str,
    ) -> Option<NodeId> {
        match self.index(store, kind).by_name.get(name).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }

    /// Record a node the caller just created. Indexes not built yet are left
    /// alone; they will see the node when they are built.
    pub fn insert(&mut self, kind: EntityKind, key: NaturalKey, id: NodeId) {
        if let Some(index) = self.indexes.get_mut(&kind) {
            index.add(key, id);
        }
    }

    pub fn invalidate(&mut self, kind: EntityKind) {
        self.indexes.remove(&kind);
    }

    pub fn invalidate_all(&mut self) {
        self.indexes.clear();
    }

    pub fn is_built(&self, kind: EntityKind) -> bool {
        self.indexes.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossary_graph::{Attrs, MemoryStore, RelationKind};

    fn named(store: &mut MemoryStore, kind: EntityKind, field: &str, name: &str) -> NodeId {
        let attrs: Attrs = [(field.to_string(), name.to_string())].into_iter().collect();
        store.create_node(kind, attrs).unwrap()
    }

    #[test]
    fn resolves_unscoped_keys() {
        let mut store = MemoryStore::new();
        let draft = named(&mut store, EntityKind::TermStatus, "status", "Draft");
        let mut resolver = KeyResolver::new();

        assert_eq!(
            resolver.resolve(&store, EntityKind::TermStatus, &NaturalKey::new("Draft")),
            Some(draft)
        );
        assert_eq!(
            resolver.resolve(&store, EntityKind::TermStatus, &NaturalKey::new("Final")),
            None
        );
        assert!(resolver.is_built(EntityKind::TermStatus));
        assert!(!resolver.is_built(EntityKind::Term));
    }

    #[test]
    fn scoped_keys_disambiguate_same_names() {
        let mut store = MemoryStore::new();
        let east = named(&mut store, EntityKind::Location, "name", "east");
        let west = named(&mut store, EntityKind::Location, "name", "west");
        let t1 = named(&mut store, EntityKind::Table, "name", "accounts");
        let t2 = named(&mut store, EntityKind::Table, "name", "accounts");
        store.add_edge(t1, RelationKind::TableLocation, east).unwrap();
        store.add_edge(t2, RelationKind::TableLocation, west).unwrap();

        let mut resolver = KeyResolver::new();
        assert_eq!(
            resolver.resolve(
                &store,
                EntityKind::Table,
                &NaturalKey::scoped(Some(west), "accounts")
            ),
            Some(t2)
        );
        assert_eq!(
            resolver.resolve_name(&store, EntityKind::Table, "accounts"),
            None
        );
    }

    #[test]
    fn insert_keeps_built_index_current() {
        let mut store = MemoryStore::new();
        let mut resolver = KeyResolver::new();
        assert_eq!(
            resolver.resolve(&store, EntityKind::Person, &NaturalKey::new("Jane")),
            None
        );

        let jane = named(&mut store, EntityKind::Person, "name", "Jane");
        resolver.insert(EntityKind::Person, NaturalKey::new("Jane"), jane);
        assert_eq!(
            resolver.resolve_name(&store, EntityKind::Person, "Jane"),
            Some(jane)
        );
    }

    #[test]
    fn invalidate_rebuilds_from_store() {
        let mut store = MemoryStore::new();
        let mut resolver = KeyResolver::new();
        resolver.resolve(&store, EntityKind::Category, &NaturalKey::new("Risk"));

        let risk = named(&mut store, EntityKind::Category, "name", "Risk");
        assert_eq!(
            resolver.resolve(&store, EntityKind::Category, &NaturalKey::new("Risk")),
            None
        );
        resolver.invalidate(EntityKind::Category);
        assert_eq!(
            resolver.resolve(&store, EntityKind::Category, &NaturalKey::new("Risk")),
            Some(risk)
        );
    }
}
