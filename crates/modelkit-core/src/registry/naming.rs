//! Conversion from programming names to wire names.

use heck::ToSnakeCase;

/// Convert a programming name to its snake_case wire form.
///
/// Acronyms stay together: `HTTPServer` becomes `http_server`, `PMonth`
/// becomes `p_month`, `ID` becomes `id`.
pub fn snake_case(name: &str) -> String {
    name.to_snake_case()
}
