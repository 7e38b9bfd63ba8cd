//! Script driver: folds directives over the link state.
//!
//! Directives are fully ordered and each completes before the next
//! begins. Module directives run the compile/link/interpret pipeline and
//! keep their instance; assertion directives run the same pipeline (or an
//! action) but consume the expected failure through the error classifier
//! and roll the name registry back, so that only deliberately defined
//! modules accumulate. Any error not consumed by an assertion terminates
//! the run.

use crate::engine::{CompileOptions, Engine, EngineState};
use crate::harness::action::perform;
use crate::harness::error::{check_error_result, ScriptError};
use crate::harness::oracle::match_results;
use crate::script::{Assertion, Directive, Script};
use tracing::{debug, error, info};

/// Run a script to completion and return the final link state.
///
/// Before the first user directive the standard fixtures are installed:
/// the `spectest_extern` host module under that name, and the spectest
/// module, compiled and registered under `"spectest"`.
///
/// With `no_exhaustion` set, exhaustion assertions are skipped entirely.
/// `optimize` is forwarded to every compile call.
pub fn run<E: Engine>(
    engine: &E,
    script: Script<E::TextModule>,
    no_exhaustion: bool,
    optimize: bool,
) -> Result<EngineState<E>, ScriptError> {
    let mut driver = Driver {
        engine,
        ls: EngineState::<E>::new(),
        opts: CompileOptions {
            optimize,
            ..CompileOptions::default()
        },
        no_exhaustion,
        curr_module: 0,
        registered: false,
        stats: Stats::default(),
    };

    driver
        .engine
        .extern_module(&mut driver.ls, "spectest_extern", driver.engine.spectest_extern());
    driver.step(Directive::Module(driver.engine.spectest_module()))?;
    driver.step(Directive::Register {
        name: "spectest".to_string(),
        id: Some("spectest".to_string()),
    })?;

    for directive in script.directives {
        driver.step(directive)?;
    }

    info!(
        modules = driver.stats.modules,
        registers = driver.stats.registers,
        actions = driver.stats.actions,
        asserts = driver.stats.asserts,
        skipped = driver.stats.skipped,
        registered_imports = driver.registered,
        "script complete"
    );
    Ok(driver.ls)
}

/// Run a script to completion, discarding the final link state.
pub fn exec<E: Engine>(
    engine: &E,
    script: Script<E::TextModule>,
    no_exhaustion: bool,
    optimize: bool,
) -> Result<(), ScriptError> {
    run(engine, script, no_exhaustion, optimize).map(|_| ())
}

/// Per-kind directive tally, reported when the script completes.
#[derive(Debug, Default)]
struct Stats {
    modules: usize,
    registers: usize,
    actions: usize,
    asserts: usize,
    skipped: usize,
}

struct Driver<'e, E: Engine> {
    engine: &'e E,
    ls: EngineState<E>,
    opts: CompileOptions,
    no_exhaustion: bool,
    /// Module directives attempted so far. Diagnostic only.
    curr_module: usize,
    /// Whether any register directive has run. Diagnostic only.
    registered: bool,
    stats: Stats,
}

impl<'e, E: Engine> Driver<'e, E> {
    fn step(&mut self, directive: Directive<E::TextModule>) -> Result<(), ScriptError> {
        debug!(kind = directive.kind(), module = self.curr_module, "directive");
        match directive {
            Directive::Module(module) => {
                self.curr_module += 1;
                let compiled = self.engine.compile_text_until_link(&mut self.ls, &module, &self.opts)?;
                self.engine.interpret_module(self.ls.envs_mut(), &compiled, None, None)?;
                self.stats.modules += 1;
            }

            Directive::QuotedModule(source) => {
                self.curr_module += 1;
                let module = self.engine.parse_inline_module(&source)?;
                let compiled = self.engine.compile_text_until_link(&mut self.ls, &module, &self.opts)?;
                self.engine.interpret_module(self.ls.envs_mut(), &compiled, None, None)?;
                self.stats.modules += 1;
            }

            Directive::BinaryModule { id, bytes } => {
                self.curr_module += 1;
                let mut binary = self.engine.parse_binary_module(&bytes)?;
                self.engine.stamp_module_id(&mut binary, id.as_deref());
                let compiled = self.engine.compile_binary_until_link(&mut self.ls, binary, &self.opts)?;
                self.engine.interpret_module(self.ls.envs_mut(), &compiled, None, None)?;
                self.stats.modules += 1;
            }

            Directive::Register { name, id } => {
                self.engine.register_module(&mut self.ls, &name, id.as_deref())?;
                self.registered = true;
                self.stats.registers += 1;
            }

            Directive::Action(action) => {
                perform(self.engine, &mut self.ls, &action)?;
                self.stats.actions += 1;
            }

            Directive::Assert(assertion) => self.assert(assertion)?,
        }
        Ok(())
    }

    fn assert(&mut self, assertion: Assertion<E::TextModule>) -> Result<(), ScriptError> {
        match assertion {
            Assertion::Return { action, expected } => {
                let mut produced = perform(self.engine, &mut self.ls, &action)?;
                produced.reverse();
                if !match_results(&expected, &produced) {
                    error!(?expected, ?produced, "assert_return mismatch");
                    return Err(ScriptError::BadResult);
                }
            }

            Assertion::Trap { action, message } => {
                let staged = perform(self.engine, &mut self.ls, &action);
                check_error_result(&message, staged)?;
            }

            Assertion::Exhaustion { action, message } => {
                if self.no_exhaustion {
                    info!("skipping exhaustion assertion");
                    self.stats.skipped += 1;
                    return Ok(());
                }
                let staged = perform(self.engine, &mut self.ls, &action);
                check_error_result(&message, staged)?;
            }

            Assertion::TrapModule { module, message } => {
                let snapshot = self.ls.snapshot();
                let staged = match self.engine.compile_text_until_link(&mut self.ls, &module, &self.opts) {
                    Ok(compiled) => self.engine.interpret_module(self.ls.envs_mut(), &compiled, None, None),
                    Err(e) => Err(e),
                };
                self.ls.restore(snapshot);
                check_error_result(&message, staged)?;
            }

            Assertion::Malformed { module, message } => {
                let snapshot = self.ls.snapshot();
                let staged = self
                    .engine
                    .compile_text_until_link(&mut self.ls, &module, &self.opts)
                    .map(|_| ());
                self.ls.restore(snapshot);
                check_error_result(&message, staged)?;
                // Malformed text never survives script parsing, so this arm
                // is only reachable from a hand-built script.
                unreachable!("assert_malformed reached with an already-parsed text module");
            }

            Assertion::MalformedBinary { bytes, message } => {
                let staged = self.engine.parse_binary_module(&bytes).map(|_| ());
                check_error_result(&message, staged)?;
            }

            Assertion::MalformedQuote { source, message } => {
                let staged = match self.engine.parse_text_script(&source) {
                    Err(e) => Err(e),
                    Ok(script) => {
                        let mut directives = script.directives;
                        if directives.len() != 1 {
                            return Err(ScriptError::Msg(format!(
                                "quoted source expanded to {} directives, expected a single module",
                                directives.len()
                            )));
                        }
                        match directives.remove(0) {
                            Directive::Module(module) => {
                                self.engine.compile_text_to_binary(&module, &self.opts).map(|_| ())
                            }
                            other => {
                                return Err(ScriptError::Msg(format!(
                                    "quoted source expanded to a {} directive, expected a module",
                                    other.kind()
                                )));
                            }
                        }
                    }
                };
                check_error_result(&message, staged)?;
            }

            Assertion::Invalid { module, message } => {
                let snapshot = self.ls.snapshot();
                let staged = self
                    .engine
                    .compile_text_until_link(&mut self.ls, &module, &self.opts)
                    .map(|_| ());
                self.ls.restore(snapshot);
                check_error_result(&message, staged)?;
            }

            Assertion::InvalidBinary { bytes, message } => {
                let staged = match self.engine.parse_binary_module(&bytes) {
                    Err(e) => Err(e),
                    Ok(binary) => match self.engine.validate_binary(&binary) {
                        Err(e) => Err(e),
                        Ok(()) => {
                            let snapshot = self.ls.snapshot();
                            let linked = self.engine.link_module(&mut self.ls, None, &binary);
                            self.ls.restore(snapshot);
                            linked
                        }
                    },
                };
                check_error_result(&message, staged)?;
            }

            Assertion::InvalidQuote { source, message } => {
                let staged = self.engine.parse_text_module(&source).map(|_| ());
                check_error_result(&message, staged)?;
            }

            Assertion::Unlinkable { module, message } => {
                let snapshot = self.ls.snapshot();
                let staged = self
                    .engine
                    .compile_text_until_link(&mut self.ls, &module, &self.opts)
                    .map(|_| ());
                self.ls.restore(snapshot);
                check_error_result(&message, staged)?;
            }
        }
        self.stats.asserts += 1;
        Ok(())
    }
}
