//! Action executor: translate script actions into engine calls.

use crate::engine::{Engine, EngineState};
use crate::harness::error::ScriptError;
use crate::harness::value::{host_extern, RefValue, Value};
use crate::script::{Action, Const, HeapType};

/// Convert a script constant to a runtime value.
///
/// Total over [`Const`]; extern constants are minted with the host brand.
pub fn value_of_const(constant: &Const) -> Value {
    match constant {
        Const::I32(n) => Value::I32(*n),
        Const::I64(n) => Value::I64(*n),
        Const::F32(f) => Value::F32(*f),
        Const::F64(f) => Value::F64(*f),
        Const::V128(v) => Value::V128(*v),
        Const::NullRef(HeapType::Func) => Value::Ref(RefValue::Func(None)),
        Const::NullRef(HeapType::Extern) => Value::Ref(RefValue::Extern(None)),
        Const::Extern(n) => host_extern(*n),
    }
}

/// Execute an action against the link state.
///
/// `Invoke` converts the arguments, resolves the function through the
/// registry, reverses the argument list into interpreter push order, and
/// calls the engine's external invocation entry point. `Get` resolves the
/// global and returns its current value as a one-element stack. Results
/// come back in push order.
pub fn perform<E: Engine>(
    engine: &E,
    ls: &mut EngineState<E>,
    action: &Action,
) -> Result<Vec<Value>, ScriptError> {
    match action {
        Action::Invoke { module, name, args } => {
            let mut stack: Vec<Value> = args.iter().map(value_of_const).collect();
            let (func, env) = ls.resolve_func(module.as_deref(), name)?;
            stack.reverse();
            engine.exec_func_external(stack, env, ls.envs_mut(), &func)
        }
        Action::Get { module, name } => {
            let global = ls.resolve_global(module.as_deref(), name)?;
            Ok(vec![engine.global_value(ls.envs(), &global)])
        }
    }
}
