//! The conformance harness core.
//!
//! Leaf-first: [`value`] defines the runtime value model, [`oracle`]
//! decides whether produced values satisfy expectations, [`error`] carries
//! the error taxonomy and the expected-failure classifier, [`link`] holds
//! the module registry and name resolver, [`action`] translates script
//! actions into engine calls, and [`driver`] folds whole scripts over the
//! link state.

pub mod action;
pub mod driver;
pub mod error;
pub mod link;
pub mod oracle;
pub mod value;

pub use action::{perform, value_of_const};
pub use driver::{exec, run};
pub use error::{check_error, check_error_result, ScriptError};
pub use link::{EnvId, Envs, Exports, Instance, LinkState};
pub use oracle::{match_one, match_results};
pub use value::{host_brand, host_extern, Brand, ExternPayload, FuncAddr, RefValue, Value};
