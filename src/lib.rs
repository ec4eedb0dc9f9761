//! # Sift
//!
//! Compiles human-typed filter queries such as
//! `artist="Dio" and (year>=1983 or "holy")` into a [`Predicate`] tree over a
//! [`Registry`] of typed filters, and writes selected filter values back out
//! as equivalent query text.
//!
//! ```
//! use sift::{Comparison, Filter, Predicate, Registry, Value, compile};
//!
//! let registry = Registry::builder()
//!     .register(Filter::text("artist"))?
//!     .register(Filter::integer("year"))?
//!     .build();
//!
//! let predicate = compile(&registry, "artist=dio and year>=1983")?;
//! assert_eq!(
//!     predicate,
//!     Predicate::And(vec![
//!         Predicate::leaf("artist", Comparison::IExact, Value::from("dio")),
//!         Predicate::leaf("year", Comparison::Gte, Value::Int(1983)),
//!     ])
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The grammar itself lives in [`sift_syntax`]; this crate resolves filter
//! names, operator semantics and precedence on top of it.

mod compile;
mod error;
mod filter;
pub mod parse;
mod precedence;
mod predicate;
mod registry;
mod serialize;
mod value;

pub use compile::{CompileOptions, Compiler};
pub use error::{QueryError, RegistryError, ValueError};
pub use filter::{
    Filter, Operators, ParseFn, PredicateFn, ResolvedOperator, default_value_to_predicate,
};
pub use predicate::{Comparison, Lookup, Operand, Predicate};
pub use registry::{Registry, RegistryBuilder};
pub use serialize::{BoundValue, BoundValues, serialize};
pub use sift_syntax::{Operator, ParseError, ParseOptions};
pub use value::Value;

/// Compiles `text` against `registry` with default options.
pub fn compile(registry: &Registry, text: &str) -> Result<Predicate, QueryError> {
    Compiler::new(registry).compile(text)
}
