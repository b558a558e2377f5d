//! Literal `{name}` substitution for instruction templates.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z][a-z0-9_]*)\}").expect("valid placeholder regex"));

/// Template variables keyed by placeholder name.
pub type Variables = BTreeMap<&'static str, String>;

/// Replace every `{name}` whose name is in `vars`.
///
/// Unknown placeholders stay verbatim, and substituted values are never
/// rescanned.
pub fn substitute(template: &str, vars: &Variables) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
