//! The built-in condition catalog, grouped into readable namespaces.
//!
//! Call sites read as sentences: `element.should(be::visible())`,
//! `element.should(have::exact_text("Done"))`,
//! `items.should(have::size(3))`. Every condition fails with a diagnostic
//! naming both the expected criterion and the actually observed state.
//!
//! Text comparisons honor the scope's [`TextMatchPolicy`]: `have::text`
//! checks containment, `have::exact_text` checks equality, and
//! `have::text_matching` applies a regular expression to the raw text.
//!
//! [`TextMatchPolicy`]: crate::config::TextMatchPolicy

use crate::condition::Condition;
use crate::result::EsperarError;

/// State conditions: presence, visibility, emptiness
pub mod be {
    use super::*;
    use crate::collection::Collection;
    use crate::element::Element;
    use crate::query;
    use crate::result::ErrorKind;

    /// The element resolves to a node (existence, regardless of rendering)
    #[must_use]
    pub fn present() -> Condition<Element> {
        Condition::new("be present", |element: &Element| {
            element.locate().map(|_| ())
        })
    }

    /// The element resolves to a node that reports itself as displayed
    #[must_use]
    pub fn visible() -> Condition<Element> {
        Condition::new("be visible", |element: &Element| {
            if query::is_displayed().execute(element)? {
                Ok(())
            } else {
                Err(EsperarError::mismatch(
                    "visible element",
                    "element is present but not displayed",
                ))
            }
        })
    }

    /// The element is absent, or present but not displayed
    #[must_use]
    pub fn hidden() -> Condition<Element> {
        Condition::new("be hidden", |element: &Element| {
            match query::is_displayed().execute(element) {
                Ok(false) => Ok(()),
                Ok(true) => Err(EsperarError::mismatch(
                    "hidden element",
                    "element is displayed",
                )),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err),
            }
        })
    }

    /// The element has no value (inputs) or no visible text (anything else)
    #[must_use]
    pub fn blank() -> Condition<Element> {
        Condition::new("be blank", |element: &Element| {
            let observed = match query::value().execute(element)? {
                Some(value) => value,
                None => query::text().execute(element)?,
            };
            if observed.is_empty() {
                Ok(())
            } else {
                Err(EsperarError::mismatch(
                    "blank element",
                    format!("text '{observed}'"),
                ))
            }
        })
    }

    /// The collection resolves to zero nodes
    #[must_use]
    pub fn empty() -> Condition<Collection> {
        Condition::new("be empty", |collection: &Collection| {
            let size = query::size().execute(collection)?;
            if size == 0 {
                Ok(())
            } else {
                Err(EsperarError::mismatch("size 0", format!("size {size}")))
            }
        })
    }
}

/// Content conditions: text, attributes, sizes
pub mod have {
    use super::*;
    use crate::collection::Collection;
    use crate::element::Element;
    use crate::query;
    use regex::Regex;

    /// The element's text contains `expected` (per the text-match policy)
    #[must_use]
    pub fn text(expected: impl Into<String>) -> Condition<Element> {
        let expected = expected.into();
        Condition::new(format!("have text '{expected}'"), move |element: &Element| {
            let actual = query::text().execute(element)?;
            let policy = element.config().text_match();
            if policy.canonical(&actual).contains(&policy.canonical(&expected)) {
                Ok(())
            } else {
                Err(EsperarError::mismatch(
                    format!("text containing '{expected}'"),
                    format!("text '{actual}'"),
                ))
            }
        })
    }

    /// The element's text equals `expected` (per the text-match policy)
    #[must_use]
    pub fn exact_text(expected: impl Into<String>) -> Condition<Element> {
        let expected = expected.into();
        Condition::new(
            format!("have exact text '{expected}'"),
            move |element: &Element| {
                let actual = query::text().execute(element)?;
                let policy = element.config().text_match();
                if policy.canonical(&actual) == policy.canonical(&expected) {
                    Ok(())
                } else {
                    Err(EsperarError::mismatch(
                        format!("exact text '{expected}'"),
                        format!("text '{actual}'"),
                    ))
                }
            },
        )
    }

    /// The element's raw text matches the regular expression `pattern`.
    ///
    /// An invalid pattern is a programmer error, raised as a configuration
    /// failure and never retried.
    #[must_use]
    pub fn text_matching(pattern: impl Into<String>) -> Condition<Element> {
        let pattern = pattern.into();
        let compiled = Regex::new(&pattern);
        Condition::new(
            format!("have text matching '{pattern}'"),
            move |element: &Element| {
                let regex = compiled.as_ref().map_err(|e| {
                    EsperarError::config(format!("invalid text pattern '{pattern}': {e}"))
                })?;
                let actual = query::text().execute(element)?;
                if regex.is_match(&actual) {
                    Ok(())
                } else {
                    Err(EsperarError::mismatch(
                        format!("text matching '{pattern}'"),
                        format!("text '{actual}'"),
                    ))
                }
            },
        )
    }

    /// The element has attribute `name` with exactly the value `expected`
    #[must_use]
    pub fn attribute(
        name: impl Into<String>,
        expected: impl Into<String>,
    ) -> Condition<Element> {
        let name = name.into();
        let expected = expected.into();
        Condition::new(
            format!("have attribute '{name}' = '{expected}'"),
            move |element: &Element| match query::attribute(name.clone()).execute(element)? {
                Some(actual) if actual == expected => Ok(()),
                Some(actual) => Err(EsperarError::mismatch(
                    format!("attribute '{name}' = '{expected}'"),
                    format!("attribute '{name}' = '{actual}'"),
                )),
                None => Err(EsperarError::mismatch(
                    format!("attribute '{name}' = '{expected}'"),
                    format!("no attribute '{name}'"),
                )),
            },
        )
    }

    /// The element's `value` attribute equals `expected`
    #[must_use]
    pub fn value(expected: impl Into<String>) -> Condition<Element> {
        let expected = expected.into();
        Condition::new(format!("have value '{expected}'"), move |element: &Element| {
            match query::value().execute(element)? {
                Some(actual) if actual == expected => Ok(()),
                Some(actual) => Err(EsperarError::mismatch(
                    format!("value '{expected}'"),
                    format!("value '{actual}'"),
                )),
                None => Err(EsperarError::mismatch(
                    format!("value '{expected}'"),
                    "no value",
                )),
            }
        })
    }

    /// The collection resolves to exactly `expected` nodes
    #[must_use]
    pub fn size(expected: usize) -> Condition<Collection> {
        Condition::new(format!("have size {expected}"), move |collection: &Collection| {
            let actual = query::size().execute(collection)?;
            if actual == expected {
                Ok(())
            } else {
                Err(EsperarError::mismatch(
                    format!("size {expected}"),
                    format!("size {actual}"),
                ))
            }
        })
    }

    /// The collection resolves to strictly more than `floor` nodes
    #[must_use]
    pub fn size_greater_than(floor: usize) -> Condition<Collection> {
        Condition::new(
            format!("have size greater than {floor}"),
            move |collection: &Collection| {
                let actual = query::size().execute(collection)?;
                if actual > floor {
                    Ok(())
                } else {
                    Err(EsperarError::mismatch(
                        format!("size greater than {floor}"),
                        format!("size {actual}"),
                    ))
                }
            },
        )
    }

    /// The collection's texts equal `expected`, element by element, in
    /// document order (per the text-match policy)
    #[must_use]
    pub fn exact_texts<I, S>(expected: I) -> Condition<Collection>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let expected: Vec<String> = expected.into_iter().map(Into::into).collect();
        let rendered = expected
            .iter()
            .map(|t| format!("'{t}'"))
            .collect::<Vec<_>>()
            .join(", ");
        Condition::new(
            format!("have exact texts [{rendered}]"),
            move |collection: &Collection| {
                let actual = query::texts().execute(collection)?;
                let policy = collection.config().text_match();
                let matches = actual.len() == expected.len()
                    && actual
                        .iter()
                        .zip(&expected)
                        .all(|(a, e)| policy.canonical(a) == policy.canonical(e));
                if matches {
                    Ok(())
                } else {
                    Err(EsperarError::mismatch(
                        format!("texts {expected:?}"),
                        format!("texts {actual:?}"),
                    ))
                }
            },
        )
    }
}
