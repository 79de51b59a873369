//! Output value constraints

use crate::error::{Error, Result};
use crate::metadata::PropertyMetadata;
use std::borrow::Cow;

/// Apply a property's output constraints to a scalar value.
///
/// With `maxLength` set, the value is cut to at most that many characters.
pub fn sanitize<'a>(value: Cow<'a, str>, property: &PropertyMetadata) -> Result<Cow<'a, str>> {
    let max_length = match property.max_length() {
        Some(max_length) => max_length,
        None => return Ok(value),
    };
    if max_length <= 0 {
        return Err(Error::InvalidSanitizerConfig {
            property: property.field_name().to_string(),
            max_length,
        });
    }
    Ok(truncate(value, usize::try_from(max_length).unwrap_or(usize::MAX)))
}

fn truncate(value: Cow<'_, str>, max_chars: usize) -> Cow<'_, str> {
    let end = value.char_indices().nth(max_chars).map(|(i, _)| i);
    let end = match end {
        Some(end) => end,
        None => return value,
    };
    match value {
        Cow::Borrowed(s) => Cow::Borrowed(&s[..end]),
        Cow::Owned(mut s) => {
            s.truncate(end);
            Cow::Owned(s)
        }
    }
}
