//! Confirmation-template placeholder substitution.
//!
//! Templates come from the model's confirmed tool arguments and carry a small
//! closed set of tokens (`%amount%`, `%name%`, `%transaction_details%`).
//! Substitution is literal, one occurrence per token. Tokens with no value
//! stay verbatim: the template is trusted text, not attacker input, and a
//! leftover marker beats a silently mangled message.

use std::collections::HashMap;

pub fn format(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        let token = format!("%{}%", key);
        if let Some(pos) = out.find(&token) {
            out.replace_range(pos..pos + token.len(), value);
        }
    }
    out
}

/// Human-readable settlement block for `%transaction_details%`, prefixed
/// with a line break so it sits under the confirmation sentence.
pub fn transaction_details(explorer_tx_url: &str, tx_hash: &str) -> String {
    format!("\n{}{}", explorer_tx_url, tx_hash)
}

/// Render a token amount without float noise: integers bare, fractions
/// trimmed of trailing zeros.
pub fn format_amount(amount: f64) -> String {
    if amount.fract().abs() < 1e-9 {
        format!("{}", amount as i64)
    } else {
        let fixed = format!("{:.6}", amount);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
