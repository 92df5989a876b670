//! Neuron capabilities and the set algebra the ownership handoff runs on.

use crate::cdk::{
    candid::Principal,
    spec::sns::governance::{NeuronPermission, NeuronPermissionList},
};
use derive_more::Display;
use std::fmt;

///
/// Capability
/// One SNS neuron permission; discriminants are the wire codes.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(i32)]
pub enum Capability {
    ConfigureDissolveState = 1,
    ManagePrincipals = 2,
    SubmitProposal = 3,
    Vote = 4,
    Disburse = 5,
    Split = 6,
    MergeMaturity = 7,
    DisburseMaturity = 8,
    StakeMaturity = 9,
    ManageVotingPermission = 10,
}

impl Capability {
    pub const ALL: [Self; 10] = [
        Self::ConfigureDissolveState,
        Self::ManagePrincipals,
        Self::SubmitProposal,
        Self::Vote,
        Self::Disburse,
        Self::Split,
        Self::MergeMaturity,
        Self::DisburseMaturity,
        Self::StakeMaturity,
        Self::ManageVotingPermission,
    ];

    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

///
/// CapabilitySet
///

#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub const EMPTY: Self = Self(0);
    pub const FULL: Self = {
        let mut bits = 0;
        let mut i = 0;
        while i < Capability::ALL.len() {
            bits |= Capability::ALL[i].bit();
            i += 1;
        }
        Self(bits)
    };

    #[must_use]
    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub const fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    #[must_use]
    pub const fn with(mut self, cap: Capability) -> Self {
        self.insert(cap);
        self
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Capabilities in `self` that are not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[must_use]
    pub const fn is_superset(self, other: Self) -> bool {
        other.0 & !self.0 == 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_full(self) -> bool {
        self.is_superset(Self::FULL)
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    /// Decode wire codes, ignoring any this build does not know.
    #[must_use]
    pub fn from_codes(codes: &[i32]) -> Self {
        codes
            .iter()
            .filter_map(|code| Capability::from_code(*code))
            .collect()
    }

    #[must_use]
    pub fn to_codes(self) -> Vec<i32> {
        self.iter().map(Capability::code).collect()
    }

    #[must_use]
    pub fn to_permission_list(self) -> NeuronPermissionList {
        NeuronPermissionList {
            permissions: self.to_codes(),
        }
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl From<&NeuronPermissionList> for CapabilitySet {
    fn from(list: &NeuronPermissionList) -> Self {
        Self::from_codes(&list.permissions)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_full() {
            return f.write_str("{all}");
        }

        let names: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

///
/// Grant
/// One principal and everything it may do on a neuron.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Grant {
    pub principal: Principal,
    pub capabilities: CapabilitySet,
}

/// Fold wire permission entries into one grant per principal.
///
/// Entries without a principal are dropped and repeated principals are merged,
/// first-seen order preserved.
#[must_use]
pub fn grants_from_permissions(permissions: &[NeuronPermission]) -> Vec<Grant> {
    let mut grants: Vec<Grant> = Vec::new();

    for perm in permissions {
        let Some(principal) = perm.principal else {
            continue;
        };
        let caps = CapabilitySet::from_codes(&perm.permission_type);

        match grants.iter_mut().find(|g| g.principal == principal) {
            Some(existing) => existing.capabilities = existing.capabilities.union(caps),
            None => grants.push(Grant {
                principal,
                capabilities: caps,
            }),
        }
    }

    grants
}

///
/// TESTS
///
