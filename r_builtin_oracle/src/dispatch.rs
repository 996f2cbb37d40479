//! Explicit S3 method table.
//!
//! R keeps `.__S3MethodsTable__.` as ambient process-wide state; the
//! oracle models it as an explicit table passed through the evaluator.
//! Lookup consults the class vector in order, which is why class vector
//! order is significant to the comparator. The `assign(...); f(); rm(...)`
//! fixture pattern becomes a scoped registration around a guarded block.

use std::collections::HashMap;

use crate::condition::EvalError;
use crate::eval::{CallArgs, EvalContext};
use crate::value::RValue;

/// An S3 method body.
pub type MethodFn = fn(&mut EvalContext, &CallArgs) -> Result<RValue, EvalError>;

/// Mapping from `(generic, class)` to a method.
#[derive(Debug, Default)]
pub struct DispatchTable {
    methods: HashMap<(String, String), MethodFn>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a method; returns the method it displaced, if any.
    pub fn register(
        &mut self,
        generic: impl Into<String>,
        class: impl Into<String>,
        method: MethodFn,
    ) -> Option<MethodFn> {
        self.methods
            .insert((generic.into(), class.into()), method)
    }

    pub fn remove(&mut self, generic: &str, class: &str) -> Option<MethodFn> {
        self.methods
            .remove(&(generic.to_string(), class.to_string()))
    }

    /// Resolve a generic against a dispatch chain: the first class in the
    /// vector with a registered method wins.
    pub fn lookup(&self, generic: &str, classes: &[String]) -> Option<MethodFn> {
        classes
            .iter()
            .find_map(|class| {
                self.methods
                    .get(&(generic.to_string(), class.clone()))
            })
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Run `body` with a method installed, restoring the previous state
    /// afterwards (including a displaced method).
    pub fn with_method<R>(
        &mut self,
        generic: &str,
        class: &str,
        method: MethodFn,
        body: impl FnOnce(&mut DispatchTable) -> R,
    ) -> R {
        let previous = self.register(generic, class, method);
        let out = body(self);
        match previous {
            Some(prev) => {
                self.register(generic, class, prev);
            }
            None => {
                self.remove(generic, class);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(_: &mut EvalContext, _: &CallArgs) -> Result<RValue, EvalError> {
        Ok(RValue::string("stub"))
    }

    fn other(_: &mut EvalContext, _: &CallArgs) -> Result<RValue, EvalError> {
        Ok(RValue::string("other"))
    }

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup_walks_class_vector_in_order() {
        let mut table = DispatchTable::new();
        table.register("print", "b", stub);
        table.register("print", "a", other);
        let found = table.lookup("print", &classes(&["a", "b"])).unwrap();
        assert_eq!(found as usize, other as usize);
        let found = table.lookup("print", &classes(&["c", "b"])).unwrap();
        assert_eq!(found as usize, stub as usize);
        assert!(table.lookup("print", &classes(&["c"])).is_none());
        assert!(table.lookup("format", &classes(&["a"])).is_none());
    }

    #[test]
    fn test_with_method_restores_previous() {
        let mut table = DispatchTable::new();
        table.register("print", "a", stub);
        table.with_method("print", "a", other, |t| {
            let found = t.lookup("print", &classes(&["a"])).unwrap();
            assert_eq!(found as usize, other as usize);
        });
        let found = table.lookup("print", &classes(&["a"])).unwrap();
        assert_eq!(found as usize, stub as usize);
    }

    #[test]
    fn test_with_method_removes_fresh_registration() {
        let mut table = DispatchTable::new();
        table.with_method("print", "a", stub, |t| {
            assert!(t.lookup("print", &classes(&["a"])).is_some());
        });
        assert!(table.is_empty());
    }
}
