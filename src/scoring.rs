use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use std::fmt;

/// Points added when the contract source is publicly verified.
pub const VERIFIED_BONUS: u32 = 5;

/// Upper bound of the security score.
pub const MAX_SCORE: u8 = 100;

/// Function-name keywords that hint at a vesting contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VestingFunction {
    #[serde(rename = "vestedAmount")]
    VestedAmount,
    #[serde(rename = "releasable")]
    Releasable,
    #[serde(rename = "release")]
    Release,
    #[serde(rename = "released")]
    Released,
    #[serde(rename = "cliff")]
    Cliff,
    #[serde(rename = "duration")]
    Duration,
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "beneficiary")]
    Beneficiary,
    #[serde(rename = "owner")]
    Owner,
    #[serde(rename = "token")]
    Token,
}

/// Every known keyword, in reporting order. The position of a keyword in this table is its index
/// in [`VestingFlags`].
pub const VESTING_FUNCTIONS: [VestingFunction; 10] = [
    VestingFunction::VestedAmount,
    VestingFunction::Releasable,
    VestingFunction::Release,
    VestingFunction::Released,
    VestingFunction::Cliff,
    VestingFunction::Duration,
    VestingFunction::Start,
    VestingFunction::Beneficiary,
    VestingFunction::Owner,
    VestingFunction::Token,
];

/// Weight class of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionTier {
    Critical,
    Important,
    Auxiliary,
}

impl FunctionTier {
    pub fn points(&self) -> u32 {
        match self {
            FunctionTier::Critical => 20,
            FunctionTier::Important => 10,
            FunctionTier::Auxiliary => 5,
        }
    }
}

impl VestingFunction {
    /// The keyword as it appears in Solidity sources.
    pub fn name(&self) -> &'static str {
        match self {
            VestingFunction::VestedAmount => "vestedAmount",
            VestingFunction::Releasable => "releasable",
            VestingFunction::Release => "release",
            VestingFunction::Released => "released",
            VestingFunction::Cliff => "cliff",
            VestingFunction::Duration => "duration",
            VestingFunction::Start => "start",
            VestingFunction::Beneficiary => "beneficiary",
            VestingFunction::Owner => "owner",
            VestingFunction::Token => "token",
        }
    }

    pub fn tier(&self) -> FunctionTier {
        match self {
            VestingFunction::VestedAmount | VestingFunction::Releasable | VestingFunction::Release => {
                FunctionTier::Critical
            }
            VestingFunction::Released |
            VestingFunction::Cliff |
            VestingFunction::Duration |
            VestingFunction::Start => FunctionTier::Important,
            VestingFunction::Beneficiary | VestingFunction::Owner | VestingFunction::Token => {
                FunctionTier::Auxiliary
            }
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for VestingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Presence flag for every known keyword. All ten keywords are always present, defaulting to
/// `false`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VestingFlags([bool; VESTING_FUNCTIONS.len()]);

impl VestingFlags {
    pub fn get(&self, function: VestingFunction) -> bool {
        self.0[function.index()]
    }

    pub fn set(&mut self, function: VestingFunction, present: bool) {
        self.0[function.index()] = present;
    }

    /// Iterates over `(keyword, present)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (VestingFunction, bool)> + '_ {
        VESTING_FUNCTIONS.iter().map(|function| (*function, self.get(*function)))
    }

    /// Names of the keywords that were found, in table order.
    pub fn found(&self) -> Vec<String> {
        self.iter().filter(|(_, present)| *present).map(|(f, _)| f.name().to_string()).collect()
    }
}

impl Serialize for VestingFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(VESTING_FUNCTIONS.len()))?;
        for (function, present) in self.iter() {
            map.serialize_entry(function.name(), &present)?;
        }
        map.end()
    }
}

/// Flags every keyword that appears, case-insensitively, as a substring of any of the given
/// function names. For example `getReleasableAmount` flags `releasable`.
///
/// An occurrence that is the start of a longer keyword only counts for the longer one, so
/// `released` flags `released` but not `release`, while `releaseTokens` flags `release`.
pub fn check_vesting_functions<S: AsRef<str>>(function_names: &[S]) -> VestingFlags {
    let keywords: Vec<(VestingFunction, String)> =
        VESTING_FUNCTIONS.iter().map(|f| (*f, f.name().to_lowercase())).collect();

    let mut flags = VestingFlags::default();
    for name in function_names {
        let name = name.as_ref().to_lowercase();
        for (function, keyword) in &keywords {
            let counted = name.match_indices(keyword.as_str()).any(|(at, _)| {
                !keywords.iter().any(|(_, longer)| {
                    longer.len() > keyword.len() &&
                        longer.starts_with(keyword.as_str()) &&
                        name[at..].starts_with(longer.as_str())
                })
            });
            if counted {
                flags.set(*function, true);
            }
        }
    }
    flags
}

/// Sums the tier points of every present keyword, adds the verification bonus and caps the result
/// at [`MAX_SCORE`].
pub fn calculate_security_score(flags: &VestingFlags, verified: bool) -> u8 {
    let functions: u32 =
        flags.iter().filter(|(_, present)| *present).map(|(f, _)| f.tier().points()).sum();
    let bonus = if verified { VERIFIED_BONUS } else { 0 };
    (functions + bonus).min(MAX_SCORE as u32) as u8
}

/// Coarse risk classification derived from the security score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    /// The analysis itself failed.
    Error,
}

impl RiskLevel {
    /// All tiers, in reporting order.
    pub const ALL: [RiskLevel; 4] =
        [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Error];

    /// LOW from 80, MEDIUM from 40, HIGH below that. Never returns `Error`.
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => RiskLevel::Low,
            40..=79 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_from_bits(bits: u16) -> VestingFlags {
        let mut flags = VestingFlags::default();
        for (i, function) in VESTING_FUNCTIONS.iter().enumerate() {
            flags.set(*function, bits & (1 << i) != 0);
        }
        flags
    }

    #[test]
    fn example_contract_scores_medium() {
        let flags = check_vesting_functions(&["vestedAmount", "released", "cliff", "beneficiary"]);
        let score = calculate_security_score(&flags, true);
        assert_eq!(score, 50);
        assert_eq!(RiskLevel::from_score(score), RiskLevel::Medium);
    }

    #[test]
    fn empty_inventory_scores_zero() {
        let flags = check_vesting_functions::<&str>(&[]);
        assert_eq!(flags, VestingFlags::default());
        assert!(flags.found().is_empty());
        assert_eq!(calculate_security_score(&flags, false), 0);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::High);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let flags = check_vesting_functions(&["getReleasableAmount", "OWNER", "tokenAddress"]);
        assert!(flags.get(VestingFunction::Releasable));
        assert!(flags.get(VestingFunction::Owner));
        assert!(flags.get(VestingFunction::Token));
        assert!(!flags.get(VestingFunction::Release));
        assert_eq!(flags.found(), vec!["releasable", "owner", "token"]);
    }

    #[test]
    fn longer_keyword_wins_at_the_same_position() {
        let flags = check_vesting_functions(&["released"]);
        assert!(flags.get(VestingFunction::Released));
        assert!(!flags.get(VestingFunction::Release));

        let flags = check_vesting_functions(&["releaseTokens", "totalReleased"]);
        assert!(flags.get(VestingFunction::Release));
        assert!(flags.get(VestingFunction::Released));
    }

    #[test]
    fn every_keyword_is_always_serialized() {
        let json = serde_json::to_value(check_vesting_functions(&["cliff"])).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), 10);
        assert_eq!(map["cliff"], true);
        assert_eq!(map["vestedAmount"], false);
    }

    #[test]
    fn full_inventory_is_capped_at_100() {
        let names: Vec<&str> = VESTING_FUNCTIONS.iter().map(|f| f.name()).collect();
        let flags = check_vesting_functions(&names);
        assert_eq!(calculate_security_score(&flags, true), 100);
        assert_eq!(calculate_security_score(&flags, false), 100);
    }

    #[test]
    fn score_is_bounded_and_monotonic() {
        for bits in 0..(1u16 << VESTING_FUNCTIONS.len()) {
            let flags = flags_from_bits(bits);
            let unverified = calculate_security_score(&flags, false);
            let verified = calculate_security_score(&flags, true);
            assert!(verified <= MAX_SCORE);
            assert!(verified >= unverified);

            for i in 0..VESTING_FUNCTIONS.len() {
                let raised = flags_from_bits(bits | (1 << i));
                assert!(calculate_security_score(&raised, false) >= unverified);
                assert!(calculate_security_score(&raised, true) >= verified);
            }
        }
    }

    #[test]
    fn risk_level_steps() {
        for score in 0..=100u8 {
            let expected = match score {
                0..=39 => RiskLevel::High,
                40..=79 => RiskLevel::Medium,
                _ => RiskLevel::Low,
            };
            assert_eq!(RiskLevel::from_score(score), expected, "score {score}");
        }
    }

    #[test]
    fn risk_level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::Error).unwrap(), "\"ERROR\"");
        assert_eq!(RiskLevel::Medium.to_string(), "MEDIUM");
    }
}
