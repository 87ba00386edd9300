//! Handlebars setup shared by template validation and rendering.

use handlebars::{Handlebars, handlebars_helper};

handlebars_helper!(to_json: |value: Json| value.to_string());

/// Builds the engine used for target body templates.
///
/// Output is not HTML-escaped. The `json` helper embeds any value as
/// serialized JSON: `{"result": {{json payload}} }`.
#[must_use]
pub fn engine() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(handlebars::no_escape);
    hbs.register_helper("json", Box::new(to_json));
    hbs
}

/// Checks template syntax without rendering it.
///
/// # Errors
///
/// Returns the parser's message when the template does not compile.
pub fn validate(template: &str) -> Result<(), String> {
    handlebars::Template::compile(template)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
