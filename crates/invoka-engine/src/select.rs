//! Backend selection
//!
//! A pure function of the descriptor's shape, the caller's preference and
//! the engine configuration. It never looks at load order or shared state,
//! so two threads selecting for the same descriptor always agree.

use std::fmt;

use invoka_sdk::{GenerationError, MemberDescriptor};

use crate::config::EngineConfig;
use crate::table::ARITY_CAP;

/// Caller's backend preference when building a Callable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Preference {
    /// Let the engine decide
    #[default]
    Recommended,
    /// Fixed-arity table (variadic handle entry beyond the table)
    FixedArity,
    /// Generated adapter
    Generated,
    /// Generic reflective call
    Reflective,
}

/// The backend a Callable dispatches through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Fixed-arity table entry
    FixedArity {
        /// Parameter count of the entry
        arity: usize,
        /// Whether the entry takes a receiver
        instance: bool,
    },
    /// Resolved handle's variadic entry point
    HandleVariadic,
    /// Generated adapter
    Generated,
    /// Generic reflective call
    Reflective,
    /// The shared no-op callable
    Empty,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::FixedArity { arity, instance: true } => write!(f, "fixed-arity(instance, {})", arity),
            Backend::FixedArity { arity, instance: false } => write!(f, "fixed-arity(static, {})", arity),
            Backend::HandleVariadic => f.write_str("handle-variadic"),
            Backend::Generated => f.write_str("generated"),
            Backend::Reflective => f.write_str("reflective"),
            Backend::Empty => f.write_str("empty"),
        }
    }
}

/// Choose the backend for `descriptor`.
///
/// `Recommended`, with `n` the slot count (parameters plus receiver):
/// - `n` within the fixed-arity limit: the table
/// - static members and constructors beyond it: reflective
/// - instance members beyond it: a generated adapter, or reflective when
///   synthesis is disallowed
///
/// An explicit `Generated` preference fails when synthesis is disallowed.
pub fn select_backend(
    descriptor: &MemberDescriptor,
    preference: Preference,
    config: &EngineConfig,
) -> Result<Backend, GenerationError> {
    let limit = config.fixed_arity_limit.min(ARITY_CAP);
    let within_table = descriptor.slot_count() <= limit;
    let fixed = || Backend::FixedArity {
        arity: descriptor.arity(),
        instance: descriptor.dispatch_kind().takes_receiver(),
    };

    match preference {
        Preference::Recommended if within_table => Ok(fixed()),
        Preference::Recommended if descriptor.is_static() || !config.allow_synthesis => {
            Ok(Backend::Reflective)
        }
        Preference::Recommended => Ok(Backend::Generated),
        Preference::FixedArity if within_table => Ok(fixed()),
        Preference::FixedArity => Ok(Backend::HandleVariadic),
        Preference::Generated if config.allow_synthesis => Ok(Backend::Generated),
        Preference::Generated => Err(GenerationError::Forbidden {
            member: descriptor.to_string(),
        }),
        Preference::Reflective => Ok(Backend::Reflective),
    }
}
