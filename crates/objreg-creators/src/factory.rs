use std::fmt;
use std::sync::Arc;

use objreg_store::{ObjectRecord, ObjectRegistry};
use objreg_types::{Recipe, TypeDescriptor};

use crate::error::CreateError;

/// What a factory sees besides the recipe.
pub struct CreateContext<'a> {
    /// Name the produced object should be stored under.
    pub name: &'a str,
    /// Type the factory was selected for.
    pub type_desc: &'a TypeDescriptor,
    /// The live registry, for resolving dependencies by name.
    pub objects: &'a ObjectRegistry,
}

impl<'a> CreateContext<'a> {
    pub fn new(name: &'a str, type_desc: &'a TypeDescriptor, objects: &'a ObjectRegistry) -> Self {
        Self {
            name,
            type_desc,
            objects,
        }
    }

    /// Resolve a dependency by name.
    pub fn dependency(&self, name: &str) -> Result<Arc<ObjectRecord>, CreateError> {
        self.objects
            .get_record(name)
            .ok_or_else(|| CreateError::MissingDependency(name.to_string()))
    }
}

/// Turns a recipe back into one or more records.
///
/// Factories do not insert anything; they return records and the caller
/// decides what to do with them. Any `Fn(&Recipe, &CreateContext)` closure
/// with the right return type is a factory.
pub trait ObjectFactory: Send + Sync {
    fn create(
        &self,
        recipe: &Recipe,
        ctx: &CreateContext<'_>,
    ) -> Result<Vec<Arc<ObjectRecord>>, CreateError>;
}

impl<F> ObjectFactory for F
where
    F: Fn(&Recipe, &CreateContext<'_>) -> Result<Vec<Arc<ObjectRecord>>, CreateError>
        + Send
        + Sync,
{
    fn create(
        &self,
        recipe: &Recipe,
        ctx: &CreateContext<'_>,
    ) -> Result<Vec<Arc<ObjectRecord>>, CreateError> {
        self(recipe, ctx)
    }
}

/// One row of the creator table.
#[derive(Clone)]
pub struct CreatorEntry {
    pub type_desc: TypeDescriptor,
    pub factory: Arc<dyn ObjectFactory>,
}

impl CreatorEntry {
    pub fn new(type_desc: TypeDescriptor, factory: impl ObjectFactory + 'static) -> Self {
        Self {
            type_desc,
            factory: Arc::new(factory),
        }
    }

    /// Run the factory for `name` against `objects`.
    pub fn create(
        &self,
        name: &str,
        recipe: &Recipe,
        objects: &ObjectRegistry,
    ) -> Result<Vec<Arc<ObjectRecord>>, CreateError> {
        let ctx = CreateContext::new(name, &self.type_desc, objects);
        self.factory.create(recipe, &ctx)
    }
}

impl fmt::Debug for CreatorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatorEntry")
            .field("type_desc", &self.type_desc)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use objreg_store::StoredValue;
    use serde_json::json;

    use super::*;

    struct Number(f64);
    impl StoredValue for Number {}

    fn number_type() -> TypeDescriptor {
        TypeDescriptor::derived("number").unwrap()
    }

    fn number_factory(
        recipe: &Recipe,
        ctx: &CreateContext<'_>,
    ) -> Result<Vec<Arc<ObjectRecord>>, CreateError> {
        let v: f64 = recipe.decode("value")?;
        let rec = ObjectRecord::new(
            ctx.name,
            ctx.type_desc.clone(),
            Arc::new(Number(v)),
            recipe.clone(),
            Vec::new(),
        )?;
        Ok(vec![rec])
    }

    #[test]
    fn closure_factory_builds_record() {
        let entry = CreatorEntry::new(number_type(), number_factory);
        let objects = ObjectRegistry::new();
        let recipe = Recipe::new().with_block("value", json!(4.0));

        let records = entry.create("four", &recipe, &objects).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "four");
        assert_eq!(records[0].value_as::<Number>().unwrap().0, 4.0);
        // Factories do not insert.
        assert!(objects.is_empty());
    }

    #[test]
    fn factory_error_propagates() {
        let entry = CreatorEntry::new(number_type(), number_factory);
        let err = entry
            .create("x", &Recipe::new(), &ObjectRegistry::new())
            .unwrap_err();
        assert!(matches!(err, CreateError::InvalidRecipe(_)));
        assert_eq!(err.to_string(), "invalid recipe: recipe has no block named \"value\"");
    }

    #[test]
    fn context_resolves_dependencies() {
        let objects = ObjectRegistry::new();
        objects.add(ObjectRecord::standalone("base", number_type(), Arc::new(Number(1.0))).unwrap());
        let ty = number_type();
        let ctx = CreateContext::new("derived", &ty, &objects);

        assert_eq!(ctx.dependency("base").unwrap().name(), "base");
        assert!(matches!(
            ctx.dependency("absent"),
            Err(CreateError::MissingDependency(n)) if n == "absent"
        ));
    }
}
