//! Immutable record of a single instrumented factory invocation
//!
//! Every event the instrumentation hook delivers becomes one `FactoryCall`
//! owned by the report for that factory. Identity deliberately excludes the
//! measured duration: two calls from the same call site with the same
//! strategy are the same call, however long they took.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Invocation mode of a factory call.
///
/// Only `Build` and `Create` carry analytical meaning (in-memory vs
/// persistence-backed construction); the remaining variants exist because
/// factory libraries emit them and their timings must still aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    /// In-memory construction, no persistent storage touched
    Build,
    /// Persistence-backed construction (hits the database)
    Create,
    /// Stubbed in-memory construction
    BuildStubbed,
    /// Attribute-hash generation only
    AttributesFor,
}

impl Strategy {
    /// Parse the strategy tag carried by a raw instrumentation event
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "build" => Some(Strategy::Build),
            "create" => Some(Strategy::Create),
            "build_stubbed" => Some(Strategy::BuildStubbed),
            "attributes_for" => Some(Strategy::AttributesFor),
            _ => None,
        }
    }

    pub fn is_build(self) -> bool {
        self == Strategy::Build
    }

    pub fn is_create(self) -> bool {
        self == Strategy::Create
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Strategy::Build => "build",
            Strategy::Create => "create",
            Strategy::BuildStubbed => "build_stubbed",
            Strategy::AttributesFor => "attributes_for",
        };
        f.write_str(tag)
    }
}

/// One instrumented factory invocation
///
/// The call stack is stored in hook order (most recent caller first) as
/// opaque `file:line` frame identifiers already filtered to the inspected
/// project's own tree.
#[derive(Debug, Clone)]
pub struct FactoryCall {
    /// Name of the factory that was invoked
    pub factory: String,
    /// Frame identifiers active at the moment of the call, newest first
    pub call_stack: Vec<String>,
    /// Invocation mode
    pub strategy: Strategy,
    /// Measured wall-clock duration in seconds, always > 0
    pub duration: f64,
}

impl FactoryCall {
    pub fn new(
        factory: impl Into<String>,
        strategy: Strategy,
        duration: f64,
        call_stack: Vec<String>,
    ) -> Self {
        Self {
            factory: factory.into(),
            call_stack,
            strategy,
            duration,
        }
    }

    /// Short identity string, e.g. `user#create`
    pub fn description(&self) -> String {
        format!("{}#{}", self.factory, self.strategy)
    }

    /// Call chain rendered oldest caller first, e.g. `a.rs:3 -> b.rs:9`
    pub fn printable_stack(&self) -> String {
        let mut frames: Vec<&str> = self.call_stack.iter().map(String::as_str).collect();
        frames.reverse();
        frames.join(" -> ")
    }

    /// True iff `other` was observed inside this call's execution window.
    ///
    /// Containment test: every frame of `other`'s recorded stack must be
    /// present in this record's stack. A record whose own stack has a single
    /// frame is never a caller: one frame carries no ancestor context to
    /// distinguish it from an unrelated call site.
    pub fn is_caller_of(&self, other: &FactoryCall) -> bool {
        if self.call_stack.len() <= 1 {
            return false;
        }
        let own: HashSet<&str> = self.call_stack.iter().map(String::as_str).collect();
        other
            .call_stack
            .iter()
            .all(|frame| own.contains(frame.as_str()))
    }
}

// Duration is measurement, not identity.
impl PartialEq for FactoryCall {
    fn eq(&self, other: &Self) -> bool {
        self.factory == other.factory
            && self.call_stack == other.call_stack
            && self.strategy == other.strategy
    }
}

impl Eq for FactoryCall {}

impl Hash for FactoryCall {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.factory.hash(state);
        self.call_stack.hash(state);
        self.strategy.hash(state);
    }
}

impl fmt::Display for FactoryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} called by {}", self.description(), self.printable_stack())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(frames: &[&str]) -> Vec<String> {
        frames.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_strategy_from_tag() {
        assert_eq!(Strategy::from_tag("build"), Some(Strategy::Build));
        assert_eq!(Strategy::from_tag("create"), Some(Strategy::Create));
        assert_eq!(
            Strategy::from_tag("build_stubbed"),
            Some(Strategy::BuildStubbed)
        );
        assert_eq!(
            Strategy::from_tag("attributes_for"),
            Some(Strategy::AttributesFor)
        );
        assert_eq!(Strategy::from_tag("bulk_insert"), None);
        assert_eq!(Strategy::from_tag(""), None);
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::Build.to_string(), "build");
        assert_eq!(Strategy::Create.to_string(), "create");
        assert_eq!(Strategy::BuildStubbed.to_string(), "build_stubbed");
        assert_eq!(Strategy::AttributesFor.to_string(), "attributes_for");
    }

    #[test]
    fn test_strategy_predicates() {
        assert!(Strategy::Build.is_build());
        assert!(!Strategy::Build.is_create());
        assert!(Strategy::Create.is_create());
        assert!(!Strategy::BuildStubbed.is_build());
        assert!(!Strategy::AttributesFor.is_create());
    }

    #[test]
    fn test_description() {
        let call = FactoryCall::new("user", Strategy::Create, 0.5, stack(&["a.rs:1"]));
        assert_eq!(call.description(), "user#create");
    }

    #[test]
    fn test_printable_stack_is_oldest_first() {
        let call = FactoryCall::new(
            "user",
            Strategy::Build,
            0.1,
            stack(&["inner.rs:9", "mid.rs:5", "outer.rs:1"]),
        );
        assert_eq!(call.printable_stack(), "outer.rs:1 -> mid.rs:5 -> inner.rs:9");
    }

    #[test]
    fn test_equality_ignores_duration() {
        let a = FactoryCall::new("user", Strategy::Build, 1.0, stack(&["a.rs:1", "b.rs:2"]));
        let b = FactoryCall::new("user", Strategy::Build, 99.0, stack(&["a.rs:1", "b.rs:2"]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_covers_factory_stack_strategy() {
        let base = FactoryCall::new("user", Strategy::Build, 1.0, stack(&["a.rs:1"]));

        let other_factory = FactoryCall::new("post", Strategy::Build, 1.0, stack(&["a.rs:1"]));
        assert_ne!(base, other_factory);

        let other_strategy = FactoryCall::new("user", Strategy::Create, 1.0, stack(&["a.rs:1"]));
        assert_ne!(base, other_strategy);

        let other_stack = FactoryCall::new("user", Strategy::Build, 1.0, stack(&["b.rs:2"]));
        assert_ne!(base, other_stack);
    }

    #[test]
    fn test_hash_ignores_duration() {
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        seen.insert(FactoryCall::new(
            "user",
            Strategy::Build,
            1.0,
            stack(&["a.rs:1"]),
        ));
        assert!(seen.contains(&FactoryCall::new(
            "user",
            Strategy::Build,
            2.0,
            stack(&["a.rs:1"]),
        )));
    }

    #[test]
    fn test_is_caller_of_subset_stack() {
        let caller = FactoryCall::new(
            "post",
            Strategy::Build,
            0.2,
            stack(&["a.rs:1", "b.rs:2", "c.rs:3"]),
        );
        let called = FactoryCall::new("user", Strategy::Create, 0.1, stack(&["b.rs:2", "c.rs:3"]));
        assert!(caller.is_caller_of(&called));
    }

    #[test]
    fn test_is_caller_of_rejects_non_subset() {
        let caller = FactoryCall::new(
            "post",
            Strategy::Build,
            0.2,
            stack(&["a.rs:1", "b.rs:2", "c.rs:3"]),
        );
        let unrelated = FactoryCall::new("user", Strategy::Create, 0.1, stack(&["b.rs:2", "d.rs:4"]));
        assert!(!caller.is_caller_of(&unrelated));
    }

    #[test]
    fn test_single_frame_stack_is_never_a_caller() {
        let narrow = FactoryCall::new("post", Strategy::Build, 0.2, stack(&["a.rs:1"]));
        let called = FactoryCall::new("user", Strategy::Create, 0.1, stack(&["a.rs:1"]));
        assert!(!narrow.is_caller_of(&called));
    }

    #[test]
    fn test_is_caller_of_is_order_insensitive() {
        let caller = FactoryCall::new(
            "post",
            Strategy::Build,
            0.2,
            stack(&["c.rs:3", "b.rs:2", "a.rs:1"]),
        );
        let called = FactoryCall::new("user", Strategy::Create, 0.1, stack(&["a.rs:1", "c.rs:3"]));
        assert!(caller.is_caller_of(&called));
    }

    #[test]
    fn test_display_includes_description_and_chain() {
        let call = FactoryCall::new(
            "user",
            Strategy::Create,
            0.5,
            stack(&["b.rs:2", "a.rs:1"]),
        );
        let rendered = call.to_string();
        assert!(rendered.contains("user#create"));
        assert!(rendered.contains("a.rs:1 -> b.rs:2"));
    }
}
