//! Prompt construction for the product autocomplete flow.
//!
//! Glue layer: the dispatcher treats the prompt as an opaque string. The
//! contract with the model — JSON-only output, headline-style name without
//! brand or model, hyphenated specs capped at 300 characters, Spanish — lives
//! entirely in this template.

/// Build the generation prompt for a brand/model pair. A missing brand is
/// presented as "Unknown" so the model still attempts a best guess.
pub fn build_prompt(brand: Option<&str>, model: &str) -> String {
    let brand = match brand {
        Some(b) if !b.trim().is_empty() => b.trim(),
        _ => "Unknown",
    };

    format!(
        r#"Act as a product data expert.
I will provide a product Brand and Model.
You must return a JSON object with:
1. "name": The full commercial name of the product in Headline Style format, but it can't include the brand name and the model.
2. "specs": "A concise list (up to 300 characters) of technical specifications. Format each item on a new line, preceded by a hyphen and one space and ended by a period."

If unknown, provide best guess based on model naming or return generic fields.
Everything has to be in Spanish. Just return JSON.

Brand: {brand}
Model: {model}
"#
    )
}
