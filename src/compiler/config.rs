//! Register allocator configuration

use std::env;

use serde::{Deserialize, Serialize};

use super::CompileError;

/// Register budget of the reference target (MIPS $t0-$t9, $s0-$s7, $a1-$a3, $v1)
pub const DEFAULT_REGISTERS: usize = 22;

/// How the spill phase picks its victim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpillPolicy {
    /// First remaining node in graph order
    #[default]
    FirstFound,
    /// Lowest (weighted use count / degree), loop-depth weighted
    LowestCost,
}

impl SpillPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first_found" | "first" => Some(SpillPolicy::FirstFound),
            "lowest_cost" | "cost" => Some(SpillPolicy::LowestCost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocConfig {
    /// Number of colors (K)
    pub registers: usize,
    pub spill_policy: SpillPolicy,
    /// Make the receiver interfere with every node of its procedure,
    /// not only with instance fields
    pub pin_receiver: bool,
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self {
            registers: DEFAULT_REGISTERS,
            spill_policy: SpillPolicy::default(),
            pin_receiver: false,
        }
    }
}

impl AllocConfig {
    pub fn new(registers: usize) -> Self {
        Self {
            registers,
            ..Self::default()
        }
    }

    pub fn with_spill_policy(mut self, policy: SpillPolicy) -> Self {
        self.spill_policy = policy;
        self
    }

    pub fn with_pinned_receiver(mut self, pin: bool) -> Self {
        self.pin_receiver = pin;
        self
    }

    /// Defaults overridden by `MJC_REGISTERS` and `MJC_SPILL_POLICY`
    pub fn from_env() -> Result<Self, CompileError> {
        let mut config = Self::default();

        if let Ok(value) = env::var("MJC_REGISTERS") {
            config.registers = value.trim().parse().map_err(|_| {
                CompileError::InvalidConfig(format!("MJC_REGISTERS is not a number: {value}"))
            })?;
        }

        if let Ok(value) = env::var("MJC_SPILL_POLICY") {
            config.spill_policy = SpillPolicy::parse(&value).ok_or_else(|| {
                CompileError::InvalidConfig(format!("unknown MJC_SPILL_POLICY: {value}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.registers == 0 {
            return Err(CompileError::InvalidConfig(
                "register budget must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: AllocConfig = serde_json::from_str(r#"{"registers": 8}"#).unwrap();
        assert_eq!(config.registers, 8);
        assert_eq!(config.spill_policy, SpillPolicy::FirstFound);
        assert!(!config.pin_receiver);

        let config: AllocConfig =
            serde_json::from_str(r#"{"spill_policy": "lowest_cost", "pin_receiver": true}"#)
                .unwrap();
        assert_eq!(config.registers, DEFAULT_REGISTERS);
        assert_eq!(config.spill_policy, SpillPolicy::LowestCost);
        assert!(config.pin_receiver);
    }

    #[test]
    fn test_spill_policy_names() {
        assert_eq!(SpillPolicy::parse("first_found"), Some(SpillPolicy::FirstFound));
        assert_eq!(SpillPolicy::parse(" Lowest_Cost "), Some(SpillPolicy::LowestCost));
        assert_eq!(SpillPolicy::parse("cost"), Some(SpillPolicy::LowestCost));
        assert_eq!(SpillPolicy::parse("random"), None);
    }

    #[test]
    fn test_validate() {
        assert!(AllocConfig::default().validate().is_ok());
        assert!(AllocConfig::new(1).validate().is_ok());
        assert!(matches!(
            AllocConfig::new(0).validate(),
            Err(CompileError::InvalidConfig(_))
        ));
    }
}
