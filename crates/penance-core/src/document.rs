//! The persisted penalty document and its YAML form.
//!
//! The document is the single durable artifact of the engine. It holds the
//! operator-editable penalty settings and, in `recentlyDiedPlayers`, the
//! durable copy of the pending-death registry. Every field has a default, so
//! an empty file yields a working configuration.
//!
//! ```yaml
//! xpReduction: "50%"
//! moneyReduction: "0%"
//! potionEffects:
//!   - id: slowness
//!     duration: 180
//!     amplifier: 1
//!     showParticles: false
//! sendDeathMessage: true
//! deathMessage: "[Penance] You lost {{ moneyLoss | default(\"[Not provided]\") }}$ ..."
//! deathTypes:
//!   pvp: true
//! recentlyDiedPlayers: []
//! ```

use penance_types::{ParticipantId, StatusEffectSpec};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StoreError;

/// Document key holding the pending-death registry.
pub const PENDING_KEY: &str = "recentlyDiedPlayers";

/// Default death message, rendered with minijinja.
///
/// Each parameter falls back to a placeholder when the corresponding
/// penalty was not applied.
pub const DEFAULT_DEATH_MESSAGE: &str = "[Penance] You lost \
{{ moneyLoss | default(\"[Not provided]\") }}$, \
{{ xpLoss | default(\"[Not provided]\") }} XP's and got the potion effect(s) \
{{ potionEffects | default(\"[Not provided]\") }}";

/// Top-level persisted penalty document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyDocument {
    /// Experience reduction, relative (`"50%"`) or fixed (`"100"`).
    #[serde(default = "default_xp_reduction", deserialize_with = "reduction_string")]
    pub xp_reduction: String,

    /// Currency reduction, relative (`"10%"`) or fixed (`"25"`).
    #[serde(default = "default_money_reduction", deserialize_with = "reduction_string")]
    pub money_reduction: String,

    /// Status effects applied on respawn, in order.
    #[serde(default)]
    pub potion_effects: Vec<StatusEffectSpec>,

    /// Whether the participant is told what the death cost them.
    #[serde(default = "default_true")]
    pub send_death_message: bool,

    /// Template of the message sent to the participant.
    #[serde(default = "default_death_message")]
    pub death_message: String,

    /// Death causes for which no action is taken.
    #[serde(default)]
    pub death_types: DeathTypes,

    /// Participants who died and have not respawned yet. Managed by the
    /// engine; operators should not edit it.
    #[serde(default)]
    pub recently_died_players: Vec<ParticipantId>,
}

impl PenaltyDocument {
    /// Parse a document from YAML. An empty string yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Yaml`] if the string is not valid YAML or does
    /// not match the schema.
    pub fn parse(yaml: &str) -> Result<Self, StoreError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Serialize the document to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, StoreError> {
        Ok(serde_yml::to_string(self)?)
    }
}

impl Default for PenaltyDocument {
    fn default() -> Self {
        Self {
            xp_reduction: default_xp_reduction(),
            money_reduction: default_money_reduction(),
            potion_effects: Vec::new(),
            send_death_message: true,
            death_message: default_death_message(),
            death_types: DeathTypes::default(),
            recently_died_players: Vec::new(),
        }
    }
}

/// Ways to die for which the engine takes no action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathTypes {
    /// Exempt deaths caused by another participant.
    #[serde(default = "default_true")]
    pub pvp: bool,
}

impl Default for DeathTypes {
    fn default() -> Self {
        Self { pvp: true }
    }
}

/// Accept a reduction written either as a string or as a bare YAML integer.
///
/// Operators routinely write `moneyReduction: 10`; the integer is kept in
/// its textual form and validated like any other reduction string.
fn reduction_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Whole(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Whole(value) => value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_xp_reduction() -> String {
    "50%".to_owned()
}

fn default_money_reduction() -> String {
    "0%".to_owned()
}

fn default_death_message() -> String {
    DEFAULT_DEATH_MESSAGE.to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let doc = PenaltyDocument::parse("").ok();
        assert_eq!(doc, Some(PenaltyDocument::default()));
    }

    #[test]
    fn default_values() {
        let doc = PenaltyDocument::default();
        assert_eq!(doc.xp_reduction, "50%");
        assert_eq!(doc.money_reduction, "0%");
        assert!(doc.potion_effects.is_empty());
        assert!(doc.send_death_message);
        assert!(doc.death_types.pvp);
        assert!(doc.recently_died_players.is_empty());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
xpReduction: "25"
moneyReduction: "10%"
potionEffects:
  - id: slowness
    duration: 60
    amplifier: 2
    showParticles: true
  - id: minecraft:hunger
sendDeathMessage: false
deathMessage: "You died."
deathTypes:
  pvp: false
recentlyDiedPlayers:
  - 6f1c3a3e-9c5e-4a47-8d0f-1b2a3c4d5e6f
"#;
        let doc = PenaltyDocument::parse(yaml);
        assert!(doc.is_ok(), "full document should parse: {doc:?}");
        let doc = doc.ok().unwrap_or_default();

        assert_eq!(doc.xp_reduction, "25");
        assert_eq!(doc.money_reduction, "10%");
        assert_eq!(doc.potion_effects.len(), 2);
        assert_eq!(
            doc.potion_effects.first().map(|e| e.duration_seconds),
            Some(60)
        );
        assert_eq!(
            doc.potion_effects.get(1).map(|e| e.duration_seconds),
            Some(180)
        );
        assert!(!doc.send_death_message);
        assert_eq!(doc.death_message, "You died.");
        assert!(!doc.death_types.pvp);
        assert_eq!(
            doc.recently_died_players.first().map(ToString::to_string),
            Some("6f1c3a3e-9c5e-4a47-8d0f-1b2a3c4d5e6f".to_owned())
        );
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let doc = PenaltyDocument::parse("moneyReduction: \"5\"\n")
            .ok()
            .unwrap_or_default();
        assert_eq!(doc.money_reduction, "5");
        assert_eq!(doc.xp_reduction, "50%");
        assert_eq!(doc.death_message, DEFAULT_DEATH_MESSAGE);
    }

    #[test]
    fn yaml_uses_camel_case_keys() {
        let yaml = PenaltyDocument::default().to_yaml().unwrap_or_default();
        assert!(yaml.contains("xpReduction"));
        assert!(yaml.contains("sendDeathMessage"));
        assert!(yaml.contains(PENDING_KEY));
    }

    #[test]
    fn bare_integer_reductions_are_accepted() {
        let doc = PenaltyDocument::parse("moneyReduction: 10\nxpReduction: -3\n")
            .ok()
            .unwrap_or_default();
        assert_eq!(doc.money_reduction, "10");
        // Kept verbatim; the catalog rejects it.
        assert_eq!(doc.xp_reduction, "-3");
    }

    #[test]
    fn wrong_types_are_rejected() {
        let result = PenaltyDocument::parse("sendDeathMessage: [1, 2]\n");
        assert!(matches!(result, Err(StoreError::Yaml { .. })));
    }
}
