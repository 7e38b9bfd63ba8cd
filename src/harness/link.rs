//! Link state: the registry of instantiated modules and their environments.
//!
//! The driver folds a script over a [`LinkState`]: module directives
//! install instances, `register` directives install aliases, and actions
//! resolve exported functions and globals through it. The state is generic
//! over the engine's function handle `F`, global handle `G`, and
//! environment `V`, so it carries no engine dependency of its own.

use crate::harness::error::ScriptError;
use std::collections::HashMap;

/// Identifier of a runtime environment inside [`Envs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(usize);

/// Append-only collection of runtime environments.
///
/// Environments are never removed; ids handed out by [`Envs::push`] stay
/// valid for the lifetime of the run.
#[derive(Debug, Default)]
pub struct Envs<T> {
    items: Vec<T>,
}

impl<T> Envs<T> {
    pub fn new() -> Self {
        Envs { items: Vec::new() }
    }

    pub fn push(&mut self, env: T) -> EnvId {
        self.items.push(env);
        EnvId(self.items.len() - 1)
    }

    pub fn get(&self, id: EnvId) -> &T {
        &self.items[id.0]
    }

    pub fn get_mut(&mut self, id: EnvId) -> &mut T {
        &mut self.items[id.0]
    }

    pub fn contains(&self, id: EnvId) -> bool {
        id.0 < self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The exported surface of an instantiated module.
#[derive(Debug, Clone)]
pub struct Exports<F, G> {
    pub functions: HashMap<String, F>,
    pub globals: HashMap<String, G>,
}

impl<F, G> Exports<F, G> {
    pub fn new() -> Self {
        Exports {
            functions: HashMap::new(),
            globals: HashMap::new(),
        }
    }
}

impl<F, G> Default for Exports<F, G> {
    fn default() -> Self {
        Exports::new()
    }
}

/// An instantiated module: its exports and the environment it runs in.
#[derive(Debug, Clone)]
pub struct Instance<F, G> {
    pub exports: Exports<F, G>,
    pub env: EnvId,
}

/// Registry of instantiated modules, the most recent instantiation, and
/// the runtime environments they live in.
#[derive(Debug)]
pub struct LinkState<F, G, V> {
    by_id: HashMap<String, Instance<F, G>>,
    last: Option<Instance<F, G>>,
    envs: Envs<V>,
}

/// Saved name registry for rolling back a failed-as-expected link attempt.
/// Environments are not part of the snapshot; they grow monotonically.
pub(crate) struct RegistrySnapshot<F, G> {
    by_id: HashMap<String, Instance<F, G>>,
    last: Option<Instance<F, G>>,
}

impl<F: Clone, G: Clone, V> LinkState<F, G, V> {
    pub fn new() -> Self {
        LinkState {
            by_id: HashMap::new(),
            last: None,
            envs: Envs::new(),
        }
    }

    /// Record a freshly linked instance: it becomes the `last` module and,
    /// when `id` is given, is installed in the registry under that id.
    pub fn install(&mut self, id: Option<String>, instance: Instance<F, G>) {
        if let Some(id) = id {
            self.by_id.insert(id, instance.clone());
        }
        self.last = Some(instance);
    }

    /// Install an instance under `id` without making it the most recent
    /// instantiation. Host modules are installed this way, so `last`
    /// only ever tracks module directives.
    pub fn insert(&mut self, id: String, instance: Instance<F, G>) {
        self.by_id.insert(id, instance);
    }

    /// Install an alias for an existing instance under `name`.
    ///
    /// With `id` the source is the registry entry of that id, otherwise
    /// the most recent instantiation. No environment is created; an
    /// existing entry under `name` is overwritten.
    pub fn alias(&mut self, name: &str, id: Option<&str>) -> Result<(), ScriptError> {
        let instance = match id {
            Some(id) => self
                .by_id
                .get(id)
                .ok_or_else(|| ScriptError::UnboundModule(id.to_string()))?,
            None => self.last.as_ref().ok_or(ScriptError::UnboundLastModule)?,
        }
        .clone();
        self.by_id.insert(name.to_string(), instance);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Instance<F, G>> {
        self.by_id.get(id)
    }

    pub fn last(&self) -> Option<&Instance<F, G>> {
        self.last.as_ref()
    }

    /// Ids of all registered modules, in no particular order.
    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn push_env(&mut self, env: V) -> EnvId {
        self.envs.push(env)
    }

    pub fn envs(&self) -> &Envs<V> {
        &self.envs
    }

    pub fn envs_mut(&mut self) -> &mut Envs<V> {
        &mut self.envs
    }

    /// Look up an exported function of the identified (or last) module.
    pub fn resolve_func(&self, module: Option<&str>, name: &str) -> Result<(F, EnvId), ScriptError> {
        let instance = self.resolve_instance(module)?;
        let func = instance
            .exports
            .functions
            .get(name)
            .ok_or_else(|| ScriptError::UnboundName(name.to_string()))?;
        Ok((func.clone(), instance.env))
    }

    /// Look up an exported global of the identified (or last) module.
    pub fn resolve_global(&self, module: Option<&str>, name: &str) -> Result<G, ScriptError> {
        let instance = self.resolve_instance(module)?;
        instance
            .exports
            .globals
            .get(name)
            .cloned()
            .ok_or_else(|| ScriptError::UnboundName(name.to_string()))
    }

    fn resolve_instance(&self, module: Option<&str>) -> Result<&Instance<F, G>, ScriptError> {
        match module {
            Some(id) => self
                .by_id
                .get(id)
                .ok_or_else(|| ScriptError::UnboundModule(id.to_string())),
            None => self.last.as_ref().ok_or(ScriptError::UnboundLastModule),
        }
    }

    pub(crate) fn snapshot(&self) -> RegistrySnapshot<F, G> {
        RegistrySnapshot {
            by_id: self.by_id.clone(),
            last: self.last.clone(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: RegistrySnapshot<F, G>) {
        self.by_id = snapshot.by_id;
        self.last = snapshot.last;
    }
}

impl<F: Clone, G: Clone, V> Default for LinkState<F, G, V> {
    fn default() -> Self {
        LinkState::new()
    }
}
