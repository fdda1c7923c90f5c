//! Death message templates.
//!
//! Templates are minijinja source strings taken from the `deathMessage`
//! document key. They are compiled once at catalog load so that a syntax
//! error is reported to the operator immediately rather than on the first
//! respawn.
//!
//! Three parameters are available:
//!
//! - `moneyLoss` -- currency removed
//! - `xpLoss` -- experience removed
//! - `potionEffects` -- comma-joined names of the applied effects
//!
//! A parameter whose penalty was not applied is left undefined, so
//! templates can supply their own fallback with the `default` filter.

use std::collections::BTreeMap;

use minijinja::Environment;
use penance_types::PenaltyResult;

use crate::error::ConfigError;

/// Template parameter carrying the currency lost.
pub const MONEY_LOSS: &str = "moneyLoss";

/// Template parameter carrying the experience lost.
pub const XP_LOSS: &str = "xpLoss";

/// Template parameter carrying the applied status effect names.
pub const POTION_EFFECTS: &str = "potionEffects";

/// Name under which the template is registered.
const TEMPLATE_NAME: &str = "death_message";

/// Parameters handed to a message renderer.
///
/// Every known parameter is present as a key; `None` means the
/// corresponding penalty was not applied.
pub type MessageParams = BTreeMap<&'static str, Option<String>>;

/// A compiled death message template.
///
/// Two templates are equal when their sources are.
#[derive(Clone)]
pub struct MessageTemplate {
    env: Environment<'static>,
    source: String,
}

impl MessageTemplate {
    /// Compile a template, rejecting syntax errors.
    pub fn compile(source: impl Into<String>) -> Result<Self, ConfigError> {
        let source = source.into();
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source.clone())
            .map_err(|e| ConfigError::InvalidTemplate {
                reason: e.to_string(),
            })?;
        Ok(Self { env, source })
    }

    /// The template source as written in the document.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template, leaving `None` parameters undefined.
    ///
    /// # Errors
    ///
    /// Returns the template engine's error if rendering fails (e.g. a
    /// filter is applied to an undefined value without a default).
    pub fn render(&self, params: &MessageParams) -> Result<String, minijinja::Error> {
        let defined: BTreeMap<&str, &str> = params
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
            .collect();
        self.env.get_template(TEMPLATE_NAME)?.render(defined)
    }
}

impl PartialEq for MessageTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for MessageTemplate {}

impl core::fmt::Debug for MessageTemplate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageTemplate")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Build the template parameters describing a penalty result.
pub fn params_for(result: &PenaltyResult) -> MessageParams {
    let mut params = MessageParams::new();
    params.insert(
        MONEY_LOSS,
        result.money_lost.map(|lost| lost.normalize().to_string()),
    );
    params.insert(XP_LOSS, result.experience_lost.map(|lost| lost.to_string()));
    params.insert(
        POTION_EFFECTS,
        if result.applied_effects.is_empty() {
            None
        } else {
            Some(result.applied_effects.join(", "))
        },
    );
    params
}
