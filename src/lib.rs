//! A script-driven conformance harness for WebAssembly runtimes.
//!
//! specdrive executes conformance scripts -- ordered sequences of module
//! definitions, registrations, actions, and assertions in the spec-test
//! style -- against any runtime that implements the [`engine::Engine`]
//! capability contract. It compiles and links each module into the live
//! runtime, executes invocations, and checks that the observable behaviour
//! (return values, traps, link failures, parse and validation errors)
//! matches the expectations embedded in the script.
//!
//! # Modules
//!
//! - [`script`] -- The script data model: directives, actions, constants,
//!   and expected results, generic over the engine's text-module form.
//! - [`engine`] -- The consumed capability contracts: parser, compiler,
//!   validator, linker, interpreter, and the spectest fixtures, bundled
//!   behind one trait with associated types.
//! - [`harness`] -- The core: value model, result oracle, error
//!   classifier, link state and name resolver, action executor, and the
//!   script driver ([`harness::run`] / [`harness::exec`]).
//!
//! # Pipeline
//!
//! The driver folds directives left-to-right over a link state, routing
//! each through parse, compile-until-link, and interpret stages. An
//! assertion directive expects a specific success or failure shape at a
//! specific stage: failures there are consumed by the error classifier,
//! while anywhere else the first error terminates the run. The harness
//! itself never parses, validates, or interprets WebAssembly; those
//! capabilities live entirely behind the engine seam.

pub mod engine;
pub mod harness;
pub mod script;
