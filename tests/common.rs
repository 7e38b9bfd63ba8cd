//! Common test fixtures shared between integration tests.
//!
//! [`ToyEngine`] is an in-memory [`Engine`] over a miniature module form:
//! a module is a bag of named host functions and globals, plus optional
//! failure markers that make specific pipeline stages fail with a chosen
//! message. Parsing is simulated through lookup registries populated by
//! the test, so each test controls exactly which sources and binaries
//! decode to what.

use specdrive::engine::{CompileOptions, Engine, EngineState};
use specdrive::harness::{EnvId, Envs, Exports, Instance, ScriptError, Value};
use specdrive::script::{Directive, Script};
use std::collections::HashMap;
use std::time::Duration;

/// The 8-byte header every well-formed toy binary starts with.
pub const BINARY_HEADER: &[u8; 8] = b"\0asm\x01\0\0\0";

/// Function body used by toy modules: arguments in declaration order,
/// results in declaration order.
pub type ToyFn = fn(&[Value]) -> Result<Vec<Value>, ScriptError>;

/// A miniature module: named exports plus scripted failure markers.
#[derive(Debug, Clone)]
pub struct ToyModule {
    pub id: Option<String>,
    pub funcs: Vec<(String, ToyFn)>,
    pub globals: Vec<(String, Value)>,
    /// Imports that must resolve against the link state, as
    /// `(module name, export name)` pairs.
    pub imports: Vec<(String, String)>,
    /// Validation failure raised before linking.
    pub invalid: Option<String>,
    /// Failure raised when lowering to binary form.
    pub malformed: Option<String>,
    /// Trap raised when the instantiated module runs its start function.
    pub start_trap: Option<String>,
}

impl ToyModule {
    pub fn new() -> Self {
        ToyModule {
            id: None,
            funcs: Vec::new(),
            globals: Vec::new(),
            imports: Vec::new(),
            invalid: None,
            malformed: None,
            start_trap: None,
        }
    }

    pub fn named(id: &str) -> Self {
        let mut module = ToyModule::new();
        module.id = Some(id.to_string());
        module
    }

    pub fn func(mut self, name: &str, body: ToyFn) -> Self {
        self.funcs.push((name.to_string(), body));
        self
    }

    pub fn global(mut self, name: &str, value: Value) -> Self {
        self.globals.push((name.to_string(), value));
        self
    }

    pub fn import(mut self, module: &str, name: &str) -> Self {
        self.imports.push((module.to_string(), name.to_string()));
        self
    }

    pub fn invalid(mut self, message: &str) -> Self {
        self.invalid = Some(message.to_string());
        self
    }

    pub fn malformed(mut self, message: &str) -> Self {
        self.malformed = Some(message.to_string());
        self
    }

    pub fn trap_on_start(mut self, message: &str) -> Self {
        self.start_trap = Some(message.to_string());
        self
    }
}

impl Default for ToyModule {
    fn default() -> Self {
        ToyModule::new()
    }
}

/// A decoded toy binary.
#[derive(Debug)]
pub struct ToyBinary {
    pub module: ToyModule,
}

/// A compiled toy module, ready to "interpret".
#[derive(Debug)]
pub struct ToyCompiled {
    start_trap: Option<String>,
}

/// Runtime environment: the backing store for a module's globals.
#[derive(Debug)]
pub struct ToyEnv {
    pub globals: Vec<Value>,
}

/// Handle to an exported global: environment plus slot index.
#[derive(Debug, Clone)]
pub struct ToyGlobal {
    env: EnvId,
    index: usize,
}

/// In-memory engine driven by lookup registries.
pub struct ToyEngine {
    scripts: HashMap<String, Vec<Directive<ToyModule>>>,
    text_modules: HashMap<String, ToyModule>,
    binaries: HashMap<Vec<u8>, ToyModule>,
}

impl ToyEngine {
    pub fn new() -> Self {
        ToyEngine {
            scripts: HashMap::new(),
            text_modules: HashMap::new(),
            binaries: HashMap::new(),
        }
    }

    /// Register what `source` parses to as a full script.
    pub fn with_script(mut self, source: &str, directives: Vec<Directive<ToyModule>>) -> Self {
        self.scripts.insert(source.to_string(), directives);
        self
    }

    /// Register what `source` parses to as a single module.
    pub fn with_text_module(mut self, source: &str, module: ToyModule) -> Self {
        self.text_modules.insert(source.to_string(), module);
        self
    }

    /// Register what `bytes` (header included) decode to.
    pub fn with_binary(mut self, bytes: &[u8], module: ToyModule) -> Self {
        self.binaries.insert(bytes.to_vec(), module);
        self
    }

    /// Validate, resolve imports, and install a module instance.
    fn instantiate(
        &self,
        ls: &mut EngineState<Self>,
        module: &ToyModule,
        id_override: Option<&str>,
    ) -> Result<ToyCompiled, ScriptError> {
        if let Some(message) = &module.invalid {
            return Err(ScriptError::Msg(message.clone()));
        }
        for (dep, name) in &module.imports {
            let exporter = ls
                .get(dep)
                .ok_or_else(|| ScriptError::Msg(format!("unknown import: {dep}.{name}")))?;
            if !exporter.exports.functions.contains_key(name)
                && !exporter.exports.globals.contains_key(name)
            {
                return Err(ScriptError::Msg(format!("unknown import: {dep}.{name}")));
            }
        }

        let env = ls.push_env(ToyEnv {
            globals: module.globals.iter().map(|(_, value)| value.clone()).collect(),
        });
        let mut exports = Exports::new();
        for (name, body) in &module.funcs {
            exports.functions.insert(name.clone(), *body);
        }
        for (index, (name, _)) in module.globals.iter().enumerate() {
            exports.globals.insert(name.clone(), ToyGlobal { env, index });
        }
        let id = id_override
            .map(str::to_string)
            .or_else(|| module.id.clone());
        ls.install(id, Instance { exports, env });

        Ok(ToyCompiled {
            start_trap: module.start_trap.clone(),
        })
    }
}

impl Default for ToyEngine {
    fn default() -> Self {
        ToyEngine::new()
    }
}

impl Engine for ToyEngine {
    type TextModule = ToyModule;
    type Binary = ToyBinary;
    type Module = ToyCompiled;
    type Env = ToyEnv;
    type Func = ToyFn;
    type Global = ToyGlobal;
    type Host = ToyModule;

    fn parse_text_script(&self, source: &str) -> Result<Script<ToyModule>, ScriptError> {
        self.scripts
            .get(source)
            .cloned()
            .map(Script::new)
            .ok_or_else(|| ScriptError::ParseFail("unexpected token".to_string()))
    }

    fn parse_text_module(&self, source: &str) -> Result<ToyModule, ScriptError> {
        self.text_modules
            .get(source)
            .cloned()
            .ok_or_else(|| ScriptError::ParseFail("unexpected token".to_string()))
    }

    fn parse_inline_module(&self, source: &str) -> Result<ToyModule, ScriptError> {
        self.parse_text_module(source)
    }

    fn parse_binary_module(&self, bytes: &[u8]) -> Result<ToyBinary, ScriptError> {
        if bytes.len() < BINARY_HEADER.len() {
            return Err(ScriptError::ParseFail(
                "unexpected end of section or function".to_string(),
            ));
        }
        if &bytes[..BINARY_HEADER.len()] != BINARY_HEADER {
            return Err(ScriptError::ParseFail("magic header not detected".to_string()));
        }
        let module = self.binaries.get(bytes).cloned().unwrap_or_default();
        Ok(ToyBinary { module })
    }

    fn stamp_module_id(&self, module: &mut ToyBinary, id: Option<&str>) {
        if let Some(id) = id {
            module.module.id = Some(id.to_string());
        }
    }

    fn compile_text_until_link(
        &self,
        ls: &mut EngineState<Self>,
        module: &ToyModule,
        _opts: &CompileOptions,
    ) -> Result<ToyCompiled, ScriptError> {
        self.instantiate(ls, module, None)
    }

    fn compile_binary_until_link(
        &self,
        ls: &mut EngineState<Self>,
        module: ToyBinary,
        _opts: &CompileOptions,
    ) -> Result<ToyCompiled, ScriptError> {
        self.instantiate(ls, &module.module, None)
    }

    fn compile_text_to_binary(
        &self,
        module: &ToyModule,
        _opts: &CompileOptions,
    ) -> Result<Vec<u8>, ScriptError> {
        match &module.malformed {
            Some(message) => Err(ScriptError::ParseFail(message.clone())),
            None => Ok(BINARY_HEADER.to_vec()),
        }
    }

    fn validate_binary(&self, module: &ToyBinary) -> Result<(), ScriptError> {
        match &module.module.invalid {
            Some(message) => Err(ScriptError::Msg(message.clone())),
            None => Ok(()),
        }
    }

    fn link_module(
        &self,
        ls: &mut EngineState<Self>,
        name: Option<&str>,
        module: &ToyBinary,
    ) -> Result<(), ScriptError> {
        self.instantiate(ls, &module.module, name).map(|_| ())
    }

    fn register_module(
        &self,
        ls: &mut EngineState<Self>,
        name: &str,
        id: Option<&str>,
    ) -> Result<(), ScriptError> {
        ls.alias(name, id)
    }

    fn extern_module(&self, ls: &mut EngineState<Self>, name: &str, host: ToyModule) {
        let env = ls.push_env(ToyEnv {
            globals: host.globals.iter().map(|(_, value)| value.clone()).collect(),
        });
        let mut exports = Exports::new();
        for (fn_name, body) in &host.funcs {
            exports.functions.insert(fn_name.clone(), *body);
        }
        for (index, (global_name, _)) in host.globals.iter().enumerate() {
            exports.globals.insert(global_name.clone(), ToyGlobal { env, index });
        }
        ls.insert(name.to_string(), Instance { exports, env });
    }

    fn interpret_module(
        &self,
        _envs: &mut Envs<ToyEnv>,
        module: &ToyCompiled,
        _timeout: Option<Duration>,
        _budget: Option<u64>,
    ) -> Result<(), ScriptError> {
        match &module.start_trap {
            Some(message) => Err(ScriptError::Msg(message.clone())),
            None => Ok(()),
        }
    }

    fn exec_func_external(
        &self,
        mut stack: Vec<Value>,
        _env: EnvId,
        _envs: &mut Envs<ToyEnv>,
        func: &ToyFn,
    ) -> Result<Vec<Value>, ScriptError> {
        stack.reverse();
        let mut results = func(&stack)?;
        results.reverse();
        Ok(results)
    }

    fn global_value(&self, envs: &Envs<ToyEnv>, global: &ToyGlobal) -> Value {
        envs.get(global.env).globals[global.index].clone()
    }

    /// The standard spectest fixture: no-op print functions and globals
    /// initialised to 666.
    fn spectest_module(&self) -> ToyModule {
        ToyModule::named("spectest")
            .func("print", |_| Ok(vec![]))
            .func("print_i32", |_| Ok(vec![]))
            .func("print_i64", |_| Ok(vec![]))
            .func("print_f32", |_| Ok(vec![]))
            .func("print_f64", |_| Ok(vec![]))
            .func("print_i32_f32", |_| Ok(vec![]))
            .func("print_f64_f64", |_| Ok(vec![]))
            .global("global_i32", Value::I32(666))
            .global("global_i64", Value::I64(666))
            .global("global_f32", Value::F32(666.6))
            .global("global_f64", Value::F64(666.6))
    }

    fn spectest_extern(&self) -> ToyModule {
        ToyModule::named("spectest_extern").global("extern", specdrive::harness::host_extern(0))
    }
}
