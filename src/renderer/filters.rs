use log::warn;
use minijinja::Environment;
use regex::Regex;

use super::functions;

// Re-export all the case conversion and string manipulation functions
pub use cruet::{
    case::{
        camel::to_camel_case, kebab::to_kebab_case, pascal::to_pascal_case,
        screaming_snake::to_screaming_snake_case, snake::to_snake_case,
        table::to_table_case, train::to_train_case,
    },
    string::{pluralize::to_plural, singularize::to_singular},
    suffix::foreign_key::to_foreign_key,
};

/// Custom regex filter for template processing.
///
/// Tests if a string matches a given regular expression pattern. An invalid
/// pattern is logged and never matches.
pub fn regex_filter(val: &str, re: &str) -> bool {
    match Regex::new(re) {
        Ok(re) => re.is_match(val),
        Err(err) => {
            warn!("Invalid regex '{re}': {err}");
            false
        }
    }
}

/// Registers every filter on `env`.
///
/// The data conversion helpers and `required` work both as functions and as
/// filters, so `{{ to_yaml(x) }}` and `{{ x | to_yaml }}` are equivalent.
pub fn register(env: &mut Environment<'_>) {
    env.add_filter("camel_case", to_camel_case);
    env.add_filter("kebab_case", to_kebab_case);
    env.add_filter("pascal_case", to_pascal_case);
    env.add_filter("screaming_snake_case", to_screaming_snake_case);
    env.add_filter("snake_case", to_snake_case);
    env.add_filter("table_case", to_table_case);
    env.add_filter("train_case", to_train_case);
    env.add_filter("plural", to_plural);
    env.add_filter("singular", to_singular);
    env.add_filter("foreign_key", to_foreign_key);
    env.add_filter("regex", regex_filter);

    env.add_filter("to_yaml", functions::to_yaml);
    env.add_filter("from_yaml", functions::from_yaml);
    env.add_filter("to_toml", functions::to_toml);
    env.add_filter("from_toml", functions::from_toml);
    env.add_filter("to_json", functions::to_json);
    env.add_filter("from_json", functions::from_json);
    env.add_filter("required", functions::required);
}
