//! Built-in object kinds.
//!
//! | kind     | recipe blocks        | value                         |
//! |----------|----------------------|-------------------------------|
//! | `scalar` | `value: number`      | [`Scalar`]                    |
//! | `vector` | `values: [number]`   | [`Vector`]                    |
//! | `sum`    | `inputs: [name]`     | [`Computed`] over the sum     |
//! | `buffer` | `size: integer`      | [`Buffer`] (releasable)       |

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use objreg_creators::{CreateContext, CreateError, CreatorTableBuilder, CreatorInitializer};
use objreg_store::{
    downcast_value, ObjectRecord, Releasable, ResultContainer, StoredValue,
};
use objreg_types::{Recipe, TypeDescriptor};
use tracing::debug;

use crate::error::SdkResult;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scalar(pub f64);

impl StoredValue for Scalar {}

#[derive(Clone, Debug, PartialEq)]
pub struct Vector(pub Vec<f64>);

impl StoredValue for Vector {}

/// A derived value together with the names it was computed from.
pub struct Computed {
    value: Arc<dyn StoredValue>,
    inputs: Vec<String>,
}

impl Computed {
    pub fn new(value: Arc<dyn StoredValue>, inputs: Vec<String>) -> Self {
        Self { value, inputs }
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }
}

impl ResultContainer for Computed {
    fn inner(&self) -> Arc<dyn StoredValue> {
        Arc::clone(&self.value)
    }
}

impl StoredValue for Computed {
    fn as_result(&self) -> Option<&dyn ResultContainer> {
        Some(self)
    }
}

/// Largest `size` a `buffer` recipe may ask for (64 MiB).
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// A fixed-size byte buffer that counts its releases.
pub struct Buffer {
    data: Vec<u8>,
    releases: Arc<AtomicUsize>,
}

impl Buffer {
    /// Allocate `size` zeroed bytes. Sizes above [`MAX_BUFFER_SIZE`] and
    /// failed allocations are errors, not panics.
    pub fn new(size: usize, releases: Arc<AtomicUsize>) -> Result<Self, CreateError> {
        if size > MAX_BUFFER_SIZE {
            return Err(CreateError::Failed(format!(
                "buffer size {size} exceeds the maximum of {MAX_BUFFER_SIZE}"
            )));
        }
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|e| CreateError::Failed(format!("cannot allocate {size} bytes: {e}")))?;
        data.resize(size, 0);
        Ok(Self { data, releases })
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl Releasable for Buffer {
    fn release(&self) {
        debug!(size = self.data.len(), "releasing buffer");
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl StoredValue for Buffer {
    fn as_releasable(&self) -> Option<&dyn Releasable> {
        Some(self)
    }
}

/// Descriptors of the built-in kinds.
#[derive(Clone, Debug)]
pub struct BuiltinTypes {
    pub scalar: TypeDescriptor,
    pub vector: TypeDescriptor,
    pub sum: TypeDescriptor,
    pub buffer: TypeDescriptor,
}

impl BuiltinTypes {
    pub fn new() -> SdkResult<Self> {
        let builtin = |name: &str| {
            TypeDescriptor::derived(name).map(|t| t.with_category(["builtin"]))
        };
        Ok(Self {
            scalar: builtin("scalar")?,
            vector: builtin("vector")?,
            sum: builtin("sum")?,
            buffer: builtin("buffer")?,
        })
    }
}

/// Creator initializer registering every built-in kind.
///
/// `releases` is shared with every [`Buffer`] it creates.
pub struct BuiltinKinds {
    types: BuiltinTypes,
    releases: Arc<AtomicUsize>,
}

impl BuiltinKinds {
    pub fn new(types: BuiltinTypes, releases: Arc<AtomicUsize>) -> Self {
        Self { types, releases }
    }
}

impl CreatorInitializer for BuiltinKinds {
    fn register(&self, table: &mut CreatorTableBuilder) {
        table.register(self.types.scalar.clone(), create_scalar);
        table.register(self.types.vector.clone(), create_vector);
        table.register(self.types.sum.clone(), create_sum);

        let releases = Arc::clone(&self.releases);
        table.register(
            self.types.buffer.clone(),
            move |recipe: &Recipe, ctx: &CreateContext<'_>| -> Created {
                let size: usize = recipe.decode("size")?;
                let value = Arc::new(Buffer::new(size, Arc::clone(&releases))?);
                single(ctx, value, recipe, Vec::new())
            },
        );
    }
}

type Created = Result<Vec<Arc<ObjectRecord>>, CreateError>;

fn single(
    ctx: &CreateContext<'_>,
    value: Arc<dyn StoredValue>,
    recipe: &Recipe,
    deps: Vec<Arc<ObjectRecord>>,
) -> Created {
    let record = ObjectRecord::new(ctx.name, ctx.type_desc.clone(), value, recipe.clone(), deps)?;
    Ok(vec![record])
}

fn create_scalar(recipe: &Recipe, ctx: &CreateContext<'_>) -> Created {
    let value: f64 = recipe.decode("value")?;
    single(ctx, Arc::new(Scalar(value)), recipe, Vec::new())
}

fn create_vector(recipe: &Recipe, ctx: &CreateContext<'_>) -> Created {
    let values: Vec<f64> = recipe.decode("values")?;
    single(ctx, Arc::new(Vector(values)), recipe, Vec::new())
}

enum Operand {
    Scalar(f64),
    Vector(Vec<f64>),
}

fn operand(record: &ObjectRecord) -> Result<Operand, CreateError> {
    if let Some(s) = downcast_value::<Scalar>(record.value()) {
        return Ok(Operand::Scalar(s.0));
    }
    if let Some(v) = downcast_value::<Vector>(record.value()) {
        return Ok(Operand::Vector(v.0.clone()));
    }
    Err(CreateError::Failed(format!(
        "input {:?} is not a scalar or vector",
        record.name()
    )))
}

/// Element-wise sum. Scalars are added to every element when vectors are
/// present; all vectors must share a length.
fn create_sum(recipe: &Recipe, ctx: &CreateContext<'_>) -> Created {
    let inputs: Vec<String> = recipe.decode("inputs")?;
    if inputs.is_empty() {
        return Err(CreateError::Failed("sum needs at least one input".into()));
    }

    let deps = inputs
        .iter()
        .map(|name| ctx.dependency(name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut scalar_total = 0.0;
    let mut vector_total: Option<Vec<f64>> = None;
    for dep in &deps {
        match operand(dep)? {
            Operand::Scalar(s) => scalar_total += s,
            Operand::Vector(v) => {
                if let Some(acc) = vector_total.as_mut() {
                    if acc.len() != v.len() {
                        return Err(CreateError::Failed(format!(
                            "input {:?} has length {}, expected {}",
                            dep.name(),
                            v.len(),
                            acc.len()
                        )));
                    }
                    for (a, x) in acc.iter_mut().zip(&v) {
                        *a += x;
                    }
                } else {
                    vector_total = Some(v);
                }
            }
        }
    }

    let value: Arc<dyn StoredValue> = match vector_total {
        None => Arc::new(Scalar(scalar_total)),
        Some(mut acc) => {
            for a in &mut acc {
                *a += scalar_total;
            }
            Arc::new(Vector(acc))
        }
    };
    single(ctx, Arc::new(Computed::new(value, inputs)), recipe, deps)
}
