//! Native functions callable from programs through `Call`.
//!
//! Functions are registered on a [`FunctionTable`] owned by one
//! [`ExpressionVm`](crate::ExpressionVm). There is no global registry: each
//! engine instance only knows the functions registered on it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use lanes_simd::Vec4f;
use tracing::debug;

/// Opaque caller context forwarded to functions and validators.
///
/// The VM never looks inside it. Functions downcast with
/// [`Any::downcast_ref`] to the type they expect. Pass `&()` when there is
/// none.
pub type GlobalData = dyn Any + Send + Sync;

/// Function body.
///
/// `inputs` holds one register run per argument and `output` is the run to
/// fill. All runs have one register per group of four instances. The
/// implementation must write every register of `output`.
pub type ExpressionFn = Arc<dyn Fn(&[&[Vec4f]], &mut [Vec4f], &GlobalData) + Send + Sync>;

/// Checks that the global data has the shape a function needs.
///
/// Runs once per `execute` call for every function the program declares.
pub type ValidateGlobalDataFn = Arc<dyn Fn(&GlobalData) -> Result<(), String> + Send + Sync>;

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    /// True if a call with `count` arguments is allowed.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(expected) => expected == count,
            Arity::Variadic => true,
        }
    }
}

/// A registered function.
#[derive(Clone)]
pub struct FunctionEntry {
    name: String,
    arity: Arity,
    func: ExpressionFn,
    validate: Option<ValidateGlobalDataFn>,
}

impl FunctionEntry {
    /// Creates an entry without a global data validator.
    pub fn new<F>(name: impl Into<String>, arity: Arity, func: F) -> Self
    where
        F: Fn(&[&[Vec4f]], &mut [Vec4f], &GlobalData) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
            validate: None,
        }
    }

    /// Attaches a global data validator.
    pub fn with_validator<V>(mut self, validate: V) -> Self
    where
        V: Fn(&GlobalData) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// Name programs call the function by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument count the function accepts.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// True if a global data validator is attached.
    pub fn has_validator(&self) -> bool {
        self.validate.is_some()
    }

    /// Runs the validator, if any.
    pub fn validate(&self, global_data: &GlobalData) -> Result<(), String> {
        match &self.validate {
            Some(validate) => validate(global_data),
            None => Ok(()),
        }
    }

    /// Invokes the function body.
    pub fn call(&self, inputs: &[&[Vec4f]], output: &mut [Vec4f], global_data: &GlobalData) {
        (self.func)(inputs, output, global_data)
    }
}

impl fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionEntry")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("has_validator", &self.validate.is_some())
            .finish()
    }
}

/// Name-keyed set of native functions.
///
/// Registration order is preserved; re-registering a name replaces the
/// previous entry in place.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: IndexMap<String, FunctionEntry>,
}

impl FunctionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, returning the entry it replaced.
    pub fn register(&mut self, entry: FunctionEntry) -> Option<FunctionEntry> {
        let previous = self.entries.insert(entry.name.clone(), entry);
        if let Some(previous) = &previous {
            debug!(function = %previous.name, "replaced registered function");
        }
        previous
    }

    /// Registers `func` under `name` without a validator.
    pub fn register_function<F>(&mut self, name: impl Into<String>, arity: Arity, func: F)
    where
        F: Fn(&[&[Vec4f]], &mut [Vec4f], &GlobalData) + Send + Sync + 'static,
    {
        self.register(FunctionEntry::new(name, arity, func));
    }

    /// Registers `func` under `name` with a global data validator.
    pub fn register_function_with_validator<F, V>(
        &mut self,
        name: impl Into<String>,
        arity: Arity,
        func: F,
        validate: V,
    ) where
        F: Fn(&[&[Vec4f]], &mut [Vec4f], &GlobalData) + Send + Sync + 'static,
        V: Fn(&GlobalData) -> Result<(), String> + Send + Sync + 'static,
    {
        self.register(FunctionEntry::new(name, arity, func).with_validator(validate));
    }

    /// Removes `name`, keeping the order of the remaining entries.
    pub fn unregister(&mut self, name: &str) -> Option<FunctionEntry> {
        self.entries.shift_remove(name)
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&FunctionEntry> {
        self.entries.get(name)
    }

    /// Position of `name` in registration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    /// Entry at `index` in registration order.
    pub fn get_index(&self, index: usize) -> Option<&FunctionEntry> {
        self.entries.get_index(index).map(|(_, entry)| entry)
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no function is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
