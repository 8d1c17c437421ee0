//! Commands: named operations that mutate browser state.
//!
//! A [`Command`] runs *inside* the wait loop: its effect re-resolves the
//! target through the locator on every attempt, so a node that is missing,
//! hidden, stale, or not yet interactable simply fails the attempt
//! transiently and is retried on the next poll tick. This is the uniform
//! implicit pre-wait for actions.

use std::sync::Arc;

use crate::element::Element;
use crate::result::EsperarResult;
use crate::wait::WaitTask;

/// A named mutating operation over a target of type `T`
pub struct Command<T: ?Sized> {
    description: String,
    effect: Arc<dyn Fn(&T) -> EsperarResult<()> + Send + Sync>,
}

impl<T: ?Sized> Command<T> {
    /// Create a command from a description and an effect
    pub fn new(
        description: impl Into<String>,
        effect: impl Fn(&T) -> EsperarResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            effect: Arc::new(effect),
        }
    }

    /// Description used in diagnostics
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Execute the effect against the target right now
    pub fn execute(&self, target: &T) -> EsperarResult<()> {
        (self.effect)(target)
    }
}

impl<T: ?Sized> WaitTask<T> for Command<T> {
    type Output = ();

    fn description(&self) -> String {
        self.description.clone()
    }

    fn apply(&self, target: &T) -> EsperarResult<()> {
        self.execute(target)
    }
}

impl<T: ?Sized> Clone for Command<T> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            effect: Arc::clone(&self.effect),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ELEMENT COMMAND CATALOG
// =============================================================================

/// Click the element once it is present and displayed
#[must_use]
pub fn click() -> Command<Element> {
    Command::new("click", |element: &Element| {
        let node = element.locate_visible()?;
        element
            .driver()?
            .click(&node)
            .map_err(|e| element.wrap_driver_error(e))
    })
}

/// Append keystrokes to the element's current value
#[must_use]
pub fn type_text(text: impl Into<String>) -> Command<Element> {
    let text = text.into();
    Command::new(format!("type '{text}'"), move |element: &Element| {
        let node = element.locate_visible()?;
        element
            .driver()?
            .type_text(&node, &text)
            .map_err(|e| element.wrap_driver_error(e))
    })
}

/// Clear the element, then type `text`
#[must_use]
pub fn set_value(text: impl Into<String>) -> Command<Element> {
    let text = text.into();
    Command::new(format!("set value '{text}'"), move |element: &Element| {
        let node = element.locate_visible()?;
        element
            .driver()?
            .set_value(&node, &text)
            .map_err(|e| element.wrap_driver_error(e))
    })
}

/// Clear the element's value
#[must_use]
pub fn clear() -> Command<Element> {
    Command::new("clear", |element: &Element| {
        let node = element.locate_visible()?;
        element
            .driver()?
            .clear(&node)
            .map_err(|e| element.wrap_driver_error(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_descriptions() {
        assert_eq!(click().description(), "click");
        assert_eq!(clear().description(), "clear");
        assert_eq!(type_text("abc").description(), "type 'abc'");
        assert_eq!(set_value("abc").description(), "set value 'abc'");
    }

    #[test]
    fn test_custom_command_executes_effect() {
        let command: Command<u32> = Command::new("check", |n: &u32| {
            if *n == 7 {
                Ok(())
            } else {
                Err(crate::result::EsperarError::mismatch("7", format!("{n}")))
            }
        });
        assert!(command.execute(&7).is_ok());
        assert!(command.execute(&8).is_err());
    }

    #[test]
    fn test_clone_shares_effect() {
        let command = click();
        let cloned = command.clone();
        assert_eq!(cloned.description(), "click");
    }
}
