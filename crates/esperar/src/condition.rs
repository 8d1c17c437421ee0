//! Named, polarity-aware predicates over a waitable target.
//!
//! A [`Condition`] is a small tagged structure (base description, polarity
//! flag, predicate closure) rather than a type hierarchy, so negation is a
//! data transform: [`Condition::not`] flips the polarity and the rendered
//! description, and the wait loop stays completely unchanged.
//!
//! Conditions are stateless and side-effect-free beyond reading target
//! state. They either succeed silently or fail with a diagnostic carrying
//! the expected criterion and the actually observed value.

use std::sync::Arc;

use crate::result::{EsperarError, EsperarResult};
use crate::wait::WaitTask;

/// A named predicate over a target of type `T` (an element or a collection)
pub struct Condition<T: ?Sized> {
    description: String,
    negated: bool,
    predicate: Arc<dyn Fn(&T) -> EsperarResult<()> + Send + Sync>,
}

impl<T: ?Sized> Condition<T> {
    /// Create a condition from a description and a predicate.
    ///
    /// The predicate reports "criterion not met" with a
    /// [`ConditionMismatch`](EsperarError::ConditionMismatch) whose message
    /// names both expected and observed state; resolution failures bubble
    /// through unchanged.
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&T) -> EsperarResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            negated: false,
            predicate: Arc::new(predicate),
        }
    }

    /// The logical negation of this condition.
    ///
    /// Pass/fail semantics are inverted: transient predicate failures
    /// (not found, stale, mismatch, not interactable) count as "criterion
    /// not met" and therefore satisfy the negation, while fatal failures
    /// still propagate. Double negation restores the original.
    #[must_use]
    pub fn not(&self) -> Self {
        Self {
            description: self.description.clone(),
            negated: !self.negated,
            predicate: Arc::clone(&self.predicate),
        }
    }

    /// Rendered description, including polarity
    #[must_use]
    pub fn description(&self) -> String {
        if self.negated {
            format!("not {}", self.description)
        } else {
            self.description.clone()
        }
    }

    /// Apply the condition to a target right now.
    pub fn apply(&self, target: &T) -> EsperarResult<()> {
        let outcome = (self.predicate)(target);
        if !self.negated {
            return outcome;
        }
        match outcome {
            Ok(()) => Err(EsperarError::mismatch(
                self.description(),
                "condition unexpectedly met",
            )),
            Err(err) if err.kind().is_transient() => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl<T: ?Sized> WaitTask<T> for Condition<T> {
    type Output = ();

    fn description(&self) -> String {
        self.description()
    }

    fn apply(&self, target: &T) -> EsperarResult<()> {
        self.apply(target)
    }
}

impl<T: ?Sized> Clone for Condition<T> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            negated: self.negated,
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Condition<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("description", &self.description)
            .field("negated", &self.negated)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> std::fmt::Display for Condition<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{DriverError, ErrorKind};

    fn met() -> Condition<u32> {
        Condition::new("be positive", |n: &u32| {
            if *n > 0 {
                Ok(())
            } else {
                Err(EsperarError::mismatch("positive number", format!("{n}")))
            }
        })
    }

    mod polarity_tests {
        use super::*;

        #[test]
        fn test_positive_condition_passes_on_match() {
            assert!(met().apply(&5).is_ok());
        }

        #[test]
        fn test_positive_condition_fails_with_diagnostic() {
            let err = met().apply(&0).unwrap_err();
            assert_eq!(err.to_string(), "expected positive number, actual: 0");
        }

        #[test]
        fn test_negated_condition_inverts_outcomes() {
            let negated = met().not();
            assert!(negated.apply(&0).is_ok());
            assert!(negated.apply(&5).is_err());
        }

        #[test]
        fn test_double_negation_restores_original() {
            let back = met().not().not();
            assert!(back.apply(&5).is_ok());
            assert!(back.apply(&0).is_err());
            assert_eq!(back.description(), "be positive");
        }

        #[test]
        fn test_negated_description() {
            assert_eq!(met().not().description(), "not be positive");
        }

        #[test]
        fn test_mutual_exclusivity_at_fixed_state() {
            let condition = met();
            let negation = condition.not();
            for state in [0_u32, 1, 42] {
                let direct = condition.apply(&state).is_ok();
                let inverse = negation.apply(&state).is_ok();
                assert_ne!(direct, inverse, "exactly one must hold for {state}");
            }
        }
    }

    mod error_classification_tests {
        use super::*;

        #[test]
        fn test_negation_swallows_transient_resolution_failures() {
            let absent: Condition<u32> = Condition::new("be present", |_: &u32| {
                Err(EsperarError::driver(
                    "element(css:a)",
                    DriverError::not_found("element not found by css:a"),
                ))
            });
            assert!(absent.not().apply(&0).is_ok());
        }

        #[test]
        fn test_negation_propagates_fatal_failures() {
            let broken: Condition<u32> = Condition::new("be present", |_: &u32| {
                Err(EsperarError::driver(
                    "element(css:a)",
                    DriverError::transport("connection lost"),
                ))
            });
            let err = broken.not().apply(&0).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Transport);
        }

        #[test]
        fn test_negation_failure_is_a_mismatch() {
            let err = met().not().apply(&5).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConditionMismatch);
            assert!(err.to_string().contains("not be positive"));
        }
    }
}
