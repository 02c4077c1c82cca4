//! Fixed-arity dispatch table
//!
//! One entry per `(parameter count, static/instance)` pair. Each entry
//! destructures its argument slice into exactly `n` references and forwards
//! them to the handle's fixed-arity entry point; nothing is copied and no
//! arity branching is repeated per call.
//!
//! The table covers every member whose call uses at most [`ARITY_CAP`]
//! slots, counting the receiver of instance members as a slot.

use invoka_sdk::{ArityMismatch, InvocationError, MemberDescriptor, Value};

use crate::callable::Invoker;
use crate::handle::ResolvedHandle;
use crate::select::Backend;

/// Number of call slots the table specializes
pub const ARITY_CAP: usize = 16;

/// Table entry signature
pub(crate) type FixedCall = fn(&ResolvedHandle, Option<&Value>, &[Value]) -> Result<Value, InvocationError>;

/// A specialized implementation for one arity
#[derive(Clone, Copy)]
pub(crate) struct FixedEntry {
    arity: usize,
    instance: bool,
    call: FixedCall,
}

impl FixedEntry {
    /// Parameter count this entry extracts
    pub(crate) fn arity(&self) -> usize {
        self.arity
    }

    /// Check if this entry takes a receiver
    pub(crate) fn is_instance(&self) -> bool {
        self.instance
    }
}

impl std::fmt::Debug for FixedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedEntry")
            .field("arity", &self.arity)
            .field("instance", &self.instance)
            .finish()
    }
}

#[cold]
fn arity_mismatch(expected: usize, found: usize) -> InvocationError {
    ArityMismatch { expected, found }.into()
}

macro_rules! static_entry {
    ($n:literal; $($a:ident),*) => {
        FixedEntry {
            arity: $n,
            instance: false,
            call: |handle, receiver, args| {
                let [$($a),*] = args else {
                    return Err(arity_mismatch($n, args.len()));
                };
                if receiver.is_some_and(|r| !r.is_null()) {
                    return Err(InvocationError::UnexpectedReceiver(handle.descriptor().to_string()));
                }
                handle.invoke_fixed_static([$($a),*])
            },
        }
    };
}

macro_rules! instance_entry {
    ($n:literal; $($a:ident),*) => {
        FixedEntry {
            arity: $n,
            instance: true,
            call: |handle, receiver, args| {
                let [$($a),*] = args else {
                    return Err(arity_mismatch($n, args.len()));
                };
                let Some(receiver) = receiver else {
                    return Err(InvocationError::MissingReceiver(handle.descriptor().to_string()));
                };
                handle.invoke_fixed_instance(receiver, [$($a),*])
            },
        }
    };
}

/// Entries for static members and constructors, indexed by parameter count
static STATIC_TABLE: [FixedEntry; ARITY_CAP + 1] = [
    static_entry!(0;),
    static_entry!(1; a0),
    static_entry!(2; a0, a1),
    static_entry!(3; a0, a1, a2),
    static_entry!(4; a0, a1, a2, a3),
    static_entry!(5; a0, a1, a2, a3, a4),
    static_entry!(6; a0, a1, a2, a3, a4, a5),
    static_entry!(7; a0, a1, a2, a3, a4, a5, a6),
    static_entry!(8; a0, a1, a2, a3, a4, a5, a6, a7),
    static_entry!(9; a0, a1, a2, a3, a4, a5, a6, a7, a8),
    static_entry!(10; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9),
    static_entry!(11; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10),
    static_entry!(12; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11),
    static_entry!(13; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11, a12),
    static_entry!(14; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11, a12, a13),
    static_entry!(15; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11, a12, a13, a14),
    static_entry!(16; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11, a12, a13, a14, a15),
];

/// Entries for instance members, indexed by parameter count (the receiver takes a slot)
static INSTANCE_TABLE: [FixedEntry; ARITY_CAP] = [
    instance_entry!(0;),
    instance_entry!(1; a0),
    instance_entry!(2; a0, a1),
    instance_entry!(3; a0, a1, a2),
    instance_entry!(4; a0, a1, a2, a3),
    instance_entry!(5; a0, a1, a2, a3, a4),
    instance_entry!(6; a0, a1, a2, a3, a4, a5),
    instance_entry!(7; a0, a1, a2, a3, a4, a5, a6),
    instance_entry!(8; a0, a1, a2, a3, a4, a5, a6, a7),
    instance_entry!(9; a0, a1, a2, a3, a4, a5, a6, a7, a8),
    instance_entry!(10; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9),
    instance_entry!(11; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10),
    instance_entry!(12; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11),
    instance_entry!(13; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11, a12),
    instance_entry!(14; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11, a12, a13),
    instance_entry!(15; a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11, a12, a13, a14),
];

/// Table entry for `descriptor`, if its slot count is within `limit`.
///
/// `limit` is clamped to [`ARITY_CAP`].
pub(crate) fn entry_for(descriptor: &MemberDescriptor, limit: usize) -> Option<&'static FixedEntry> {
    if descriptor.slot_count() > limit.min(ARITY_CAP) {
        return None;
    }
    if descriptor.dispatch_kind().takes_receiver() {
        INSTANCE_TABLE.get(descriptor.arity())
    } else {
        STATIC_TABLE.get(descriptor.arity())
    }
}

/// Callable backend bound to one table entry
#[derive(Debug)]
pub(crate) struct FixedInvoker {
    handle: ResolvedHandle,
    entry: &'static FixedEntry,
}

impl FixedInvoker {
    pub(crate) fn new(handle: ResolvedHandle, entry: &'static FixedEntry) -> Self {
        Self { handle, entry }
    }
}

impl Invoker for FixedInvoker {
    #[inline]
    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvocationError> {
        (self.entry.call)(&self.handle, receiver, args)
    }

    fn backend(&self) -> Backend {
        Backend::FixedArity {
            arity: self.entry.arity(),
            instance: self.entry.is_instance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoka_sdk::Type;

    #[test]
    fn test_tables_are_indexed_by_arity() {
        for (n, entry) in STATIC_TABLE.iter().enumerate() {
            assert_eq!(entry.arity(), n);
            assert!(!entry.is_instance());
        }
        for (n, entry) in INSTANCE_TABLE.iter().enumerate() {
            assert_eq!(entry.arity(), n);
            assert!(entry.is_instance());
        }
    }

    #[test]
    fn test_entry_for_respects_slot_count() {
        let params = |n| vec![Type::Int; n];

        let s16 = MemberDescriptor::static_method("M", "f", params(16), Type::Int);
        assert_eq!(entry_for(&s16, ARITY_CAP).map(FixedEntry::arity), Some(16));

        let i15 = MemberDescriptor::method("M", "f", params(15), Type::Int);
        let entry = entry_for(&i15, ARITY_CAP).unwrap();
        assert_eq!((entry.arity(), entry.is_instance()), (15, true));

        let i16 = MemberDescriptor::method("M", "f", params(16), Type::Int);
        assert!(entry_for(&i16, ARITY_CAP).is_none());

        let s17 = MemberDescriptor::static_method("M", "f", params(17), Type::Int);
        assert!(entry_for(&s17, ARITY_CAP).is_none());
    }

    #[test]
    fn test_entry_for_clamps_limit() {
        let s4 = MemberDescriptor::static_method("M", "f", vec![Type::Int; 4], Type::Int);
        assert!(entry_for(&s4, 3).is_none());
        assert!(entry_for(&s4, 4).is_some());
        assert!(entry_for(&s4, 1000).is_some());
    }
}
