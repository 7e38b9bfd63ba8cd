//! Capability contracts consumed by the harness.
//!
//! The harness does not parse WebAssembly text or binaries, validate,
//! link, or interpret anything itself; it drives an [`Engine`] through
//! those stages and arbitrates the outcomes. The trait bundles the
//! parser, compiler, validator, linker, interpreter, and spectest-fixture
//! capabilities behind associated types, so the harness stays fully
//! abstract over the engine's module and handle representations.

use crate::harness::error::ScriptError;
use crate::harness::link::{EnvId, Envs, LinkState};
use crate::harness::value::Value;
use crate::script::Script;
use std::time::Duration;

/// The [`LinkState`] an engine's handles and environments live in.
pub type EngineState<E> =
    LinkState<<E as Engine>::Func, <E as Engine>::Global, <E as Engine>::Env>;

/// Compilation knobs pinned by the driver.
///
/// The driver leaves everything at its default except `optimize`, which
/// it forwards from its own parameter.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Skip safety checks during lowering.
    pub permissive: bool,
    /// Insert runtime assertion checks.
    pub assertions: bool,
    /// Escalate runtime assertion failures to hard errors.
    pub strict_assertions: bool,
    /// Run the optimizer.
    pub optimize: bool,
    /// Override the module's declared name.
    pub name: Option<String>,
}

/// A WebAssembly runtime the harness can drive.
///
/// Contract obligations, beyond each method's own description:
///
/// - The `*_until_link` compilers install the compiled module's exports
///   into the link state (under its declared id when it has one) and make
///   it the most recent instantiation. On error the name registry must be
///   left untouched; environments may have grown.
/// - [`Engine::register_module`] installs an alias for an existing entry
///   and must not create environments. [`LinkState::alias`] implements
///   the standard policy.
/// - [`Engine::exec_func_external`] receives the value stack in the
///   interpreter's push order (the harness reverses the script's argument
///   list first) and returns results in push order.
pub trait Engine: Sized {
    /// Parsed text-module form; inline modules in a script carry this.
    type TextModule: Clone;
    /// Decoded binary-module form, prior to compilation.
    type Binary;
    /// Compiled module, ready to interpret.
    type Module;
    /// A bundle of runtime resources shared by one or more modules.
    type Env;
    /// Handle to an exported function.
    type Func: Clone;
    /// Handle to an exported global.
    type Global: Clone;
    /// A host-provided module installed without compilation.
    type Host;

    // ---- parser ----------------------------------------------------------

    /// Parse a full script from source text.
    fn parse_text_script(&self, source: &str) -> Result<Script<Self::TextModule>, ScriptError>;

    /// Parse a single module from source text.
    fn parse_text_module(&self, source: &str) -> Result<Self::TextModule, ScriptError>;

    /// Parse a module from source text that may omit the outer module form.
    fn parse_inline_module(&self, source: &str) -> Result<Self::TextModule, ScriptError>;

    /// Decode a binary module.
    fn parse_binary_module(&self, bytes: &[u8]) -> Result<Self::Binary, ScriptError>;

    /// Stamp a decoded binary module with an id for later reference.
    fn stamp_module_id(&self, module: &mut Self::Binary, id: Option<&str>);

    // ---- compiler --------------------------------------------------------

    /// Compile a text module through linking; the instance is installed
    /// into `ls` and becomes the most recent instantiation.
    fn compile_text_until_link(
        &self,
        ls: &mut EngineState<Self>,
        module: &Self::TextModule,
        opts: &CompileOptions,
    ) -> Result<Self::Module, ScriptError>;

    /// Compile a decoded binary module through linking; the instance is
    /// installed into `ls` and becomes the most recent instantiation.
    fn compile_binary_until_link(
        &self,
        ls: &mut EngineState<Self>,
        module: Self::Binary,
        opts: &CompileOptions,
    ) -> Result<Self::Module, ScriptError>;

    /// Lower a text module to its binary encoding without linking.
    fn compile_text_to_binary(
        &self,
        module: &Self::TextModule,
        opts: &CompileOptions,
    ) -> Result<Vec<u8>, ScriptError>;

    // ---- validator -------------------------------------------------------

    /// Validate a decoded binary module.
    fn validate_binary(&self, module: &Self::Binary) -> Result<(), ScriptError>;

    // ---- linker ----------------------------------------------------------

    /// Link a validated binary module into the state, registered under
    /// `name` when given, otherwise under its stamped id.
    fn link_module(
        &self,
        ls: &mut EngineState<Self>,
        name: Option<&str>,
        module: &Self::Binary,
    ) -> Result<(), ScriptError>;

    /// Register an existing instance under `name` for imports.
    fn register_module(
        &self,
        ls: &mut EngineState<Self>,
        name: &str,
        id: Option<&str>,
    ) -> Result<(), ScriptError>;

    /// Install a host module's exports under `name`, without compilation.
    fn extern_module(&self, ls: &mut EngineState<Self>, name: &str, host: Self::Host);

    // ---- interpreter -----------------------------------------------------

    /// Run a compiled module's start behaviour. The harness passes `None`
    /// for both the wall-clock timeout and the instruction budget.
    fn interpret_module(
        &self,
        envs: &mut Envs<Self::Env>,
        module: &Self::Module,
        timeout: Option<Duration>,
        budget: Option<u64>,
    ) -> Result<(), ScriptError>;

    /// Invoke a function handle from outside the interpreter, with the
    /// value stack already in push order.
    fn exec_func_external(
        &self,
        stack: Vec<Value>,
        env: EnvId,
        envs: &mut Envs<Self::Env>,
        func: &Self::Func,
    ) -> Result<Vec<Value>, ScriptError>;

    /// Read the current value of a global handle. Handles only exist for
    /// linked instances, so the read is infallible.
    fn global_value(&self, envs: &Envs<Self::Env>, global: &Self::Global) -> Value;

    // ---- spectest fixtures -----------------------------------------------

    /// The standard spectest fixture module. Must carry the module id
    /// `"spectest"`; the driver registers it under that name before the
    /// first user directive.
    fn spectest_module(&self) -> Self::TextModule;

    /// The host side of the spectest fixture, installed by the driver
    /// under the name `"spectest_extern"`.
    fn spectest_extern(&self) -> Self::Host;
}
