use indexmap::IndexMap;
use seedbed_common::err::BootstrapError;
use seedbed_common::schema::Table;
use seedbed_common::types::FixtureRow;

/// Produces the default rows for one entity. Must be cheap and pure; the
/// seeder decides per row whether anything is actually inserted.
pub type FixtureFn = fn() -> Vec<FixtureRow>;

/// One logical table: its schema and, optionally, its default rows.
#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    table: Table,
    fixtures: Option<FixtureFn>,
}

impl EntityDescriptor {
    pub fn new(table: Table) -> EntityDescriptor {
        EntityDescriptor {
            table,
            fixtures: None,
        }
    }

    pub fn with_fixtures(mut self, fixtures: FixtureFn) -> EntityDescriptor {
        self.fixtures = Some(fixtures);
        self
    }

    pub fn name(&self) -> &str {
        &self.table.name
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn fixtures(&self) -> Option<Vec<FixtureRow>> {
        self.fixtures.map(|f| f())
    }
}

/// Name-keyed descriptors in registration order. Built once at process
/// start and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entities: IndexMap<String, EntityDescriptor>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register(&mut self, descriptor: EntityDescriptor) -> Result<(), BootstrapError> {
        let name = descriptor.name().to_owned();
        if self.entities.contains_key(&name) {
            return Err(BootstrapError::DuplicateEntity { table: name });
        }
        self.entities.insert(name, descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
