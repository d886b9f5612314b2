use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::GenMatchError;

/// Generator bookkeeping flags, numbered by their bit in the NanoAOD `statusFlags` bitmask.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenFlag {
    IsPrompt = 0,
    IsDecayedLeptonHadron = 1,
    IsTauDecayProduct = 2,
    IsPromptTauDecayProduct = 3,
    IsDirectTauDecayProduct = 4,
    IsDirectPromptTauDecayProduct = 5,
    IsDirectHadronDecayProduct = 6,
    IsHardProcess = 7,
    /// The particle descends from the primary hard-scattering process.
    FromHardProcess = 8,
    IsHardProcessTauDecayProduct = 9,
    IsDirectHardProcessTauDecayProduct = 10,
    FromHardProcessBeforeFSR = 11,
    IsFirstCopy = 12,
    /// The final copy of a particle before it decays or is stored.
    IsLastCopy = 13,
    IsLastCopyBeforeFSR = 14,
}

/// The pair of flags every heavy-resonance candidate must carry.
pub const GEN_FLAGS: [GenFlag; 2] = [GenFlag::FromHardProcess, GenFlag::IsLastCopy];

impl GenFlag {
    /// Every flag, in bit order.
    pub const ALL: [GenFlag; 15] = [
        GenFlag::IsPrompt,
        GenFlag::IsDecayedLeptonHadron,
        GenFlag::IsTauDecayProduct,
        GenFlag::IsPromptTauDecayProduct,
        GenFlag::IsDirectTauDecayProduct,
        GenFlag::IsDirectPromptTauDecayProduct,
        GenFlag::IsDirectHadronDecayProduct,
        GenFlag::IsHardProcess,
        GenFlag::FromHardProcess,
        GenFlag::IsHardProcessTauDecayProduct,
        GenFlag::IsDirectHardProcessTauDecayProduct,
        GenFlag::FromHardProcessBeforeFSR,
        GenFlag::IsFirstCopy,
        GenFlag::IsLastCopy,
        GenFlag::IsLastCopyBeforeFSR,
    ];

    pub fn bit(&self) -> u16 {
        1 << (*self as u16)
    }

    fn name(&self) -> &'static str {
        match self {
            GenFlag::IsPrompt => "isPrompt",
            GenFlag::IsDecayedLeptonHadron => "isDecayedLeptonHadron",
            GenFlag::IsTauDecayProduct => "isTauDecayProduct",
            GenFlag::IsPromptTauDecayProduct => "isPromptTauDecayProduct",
            GenFlag::IsDirectTauDecayProduct => "isDirectTauDecayProduct",
            GenFlag::IsDirectPromptTauDecayProduct => "isDirectPromptTauDecayProduct",
            GenFlag::IsDirectHadronDecayProduct => "isDirectHadronDecayProduct",
            GenFlag::IsHardProcess => "isHardProcess",
            GenFlag::FromHardProcess => "fromHardProcess",
            GenFlag::IsHardProcessTauDecayProduct => "isHardProcessTauDecayProduct",
            GenFlag::IsDirectHardProcessTauDecayProduct => "isDirectHardProcessTauDecayProduct",
            GenFlag::FromHardProcessBeforeFSR => "fromHardProcessBeforeFSR",
            GenFlag::IsFirstCopy => "isFirstCopy",
            GenFlag::IsLastCopy => "isLastCopy",
            GenFlag::IsLastCopyBeforeFSR => "isLastCopyBeforeFSR",
        }
    }
}

impl Display for GenFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GenFlag {
    type Err = GenMatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GenFlag::ALL
            .iter()
            .find(|flag| flag.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| GenMatchError::ParseError {
                name: s.to_string(),
                object: "GenFlag".to_string(),
            })
    }
}

/// The set of [`GenFlag`]s carried by one particle, stored as the NanoAOD bitmask.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFlags(u16);

impl StatusFlags {
    /// Wrap a raw `statusFlags` bitmask. Bits above the last known flag are dropped.
    pub fn from_bits(bits: i32) -> Self {
        Self((bits & 0x7fff) as u16)
    }

    pub fn from_flags<T: AsRef<[GenFlag]>>(flags: T) -> Self {
        Self(flags.as_ref().iter().fold(0, |bits, flag| bits | flag.bit()))
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn with(self, flag: GenFlag) -> Self {
        Self(self.0 | flag.bit())
    }

    pub fn contains(&self, flag: GenFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// `true` only if every one of `flags` is set.
    pub fn contains_all<T: AsRef<[GenFlag]>>(&self, flags: T) -> bool {
        flags.as_ref().iter().all(|flag| self.contains(*flag))
    }

    pub fn iter(&self) -> impl Iterator<Item = GenFlag> + '_ {
        GenFlag::ALL.into_iter().filter(|flag| self.contains(*flag))
    }
}

impl Display for StatusFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.iter().map(|flag| flag.to_string()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
