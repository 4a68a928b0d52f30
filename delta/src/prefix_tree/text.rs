use crate::delta_error;
use crate::error::{DeltaResult, ErrorKind};

/// The whole character following the first `prefix_len` bytes of `name`.
///
/// Never splits an encoded character, so supplementary-plane characters come back as one unit.
pub(crate) fn next_character(name: &str, prefix_len: usize) -> DeltaResult<&str> {
    let rest = name.get(prefix_len..).ok_or_else(|| {
        delta_error!(
            ErrorKind::InvalidData,
            "The prefix does not end on a character boundary of the name",
            format!("name '{name}', prefix length {prefix_len}")
        )
    })?;

    let Some(character) = rest.chars().next() else {
        return Err(delta_error!(
            ErrorKind::InvalidData,
            "The name has no character after the prefix",
            format!("name '{name}', prefix length {prefix_len}")
        ));
    };

    Ok(&rest[..character.len_utf8()])
}
