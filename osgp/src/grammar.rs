use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use expression_trees::NodeKind;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::error::{Error, Result};

/// Bitmask over [`NodeKind`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolSet(u16);

impl SymbolSet {
    pub const EMPTY: SymbolSet = SymbolSet(0);

    pub const ARITHMETIC: SymbolSet = SymbolSet(
        NodeKind::Constant.bit()
            | NodeKind::Variable.bit()
            | NodeKind::Add.bit()
            | NodeKind::Sub.bit()
            | NodeKind::Mul.bit()
            | NodeKind::Div.bit(),
    );

    pub const TERMINALS: SymbolSet = SymbolSet(NodeKind::Constant.bit() | NodeKind::Variable.bit());

    pub const FULL: SymbolSet = SymbolSet((1u16 << NodeKind::COUNT) - 1);

    pub const fn from_kind(kind: NodeKind) -> Self {
        SymbolSet(kind.bit())
    }

    #[inline]
    pub const fn contains(self, kind: NodeKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: NodeKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: NodeKind) {
        self.0 &= !kind.bit();
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub fn iter(self) -> impl Iterator<Item = NodeKind> {
        NodeKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }

    /// Parse a comma separated symbol list, e.g. `"add,sub,exp"` or `"+,*"`.
    pub fn parse(list: &str) -> Result<Self> {
        let mut set = SymbolSet::EMPTY;
        for tok in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let kind: NodeKind = tok
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("unknown symbol {tok:?}")))?;
            set.insert(kind);
        }
        Ok(set)
    }
}

impl BitOr for SymbolSet {
    type Output = SymbolSet;
    fn bitor(self, rhs: Self) -> Self {
        SymbolSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for SymbolSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SymbolSet {
    type Output = SymbolSet;
    fn bitand(self, rhs: Self) -> Self {
        SymbolSet(self.0 & rhs.0)
    }
}

impl Not for SymbolSet {
    type Output = SymbolSet;
    fn not(self) -> Self {
        SymbolSet(!self.0 & SymbolSet::FULL.0)
    }
}

impl FromIterator<NodeKind> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = NodeKind>>(iter: I) -> Self {
        let mut s = SymbolSet::EMPTY;
        for k in iter {
            s.insert(k);
        }
        s
    }
}

impl fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(NodeKind::name).collect();
        f.write_str(&names.join(","))
    }
}

/// Enabled symbols and their relative generation weights.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grammar {
    enabled: SymbolSet,
    weights: [f64; NodeKind::COUNT],
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new(SymbolSet::ARITHMETIC)
    }
}

impl Grammar {
    pub fn new(enabled: SymbolSet) -> Self {
        Self {
            enabled,
            weights: [1.0; NodeKind::COUNT],
        }
    }

    #[inline]
    pub fn config(&self) -> SymbolSet {
        self.enabled
    }

    pub fn set_config(&mut self, enabled: SymbolSet) {
        self.enabled = enabled;
    }

    pub fn enable(&mut self, kinds: SymbolSet) {
        self.enabled |= kinds;
    }

    pub fn disable(&mut self, kinds: SymbolSet) {
        self.enabled = self.enabled & !kinds;
    }

    #[inline]
    pub fn is_enabled(&self, kind: NodeKind) -> bool {
        self.enabled.contains(kind)
    }

    pub fn weight(&self, kind: NodeKind) -> f64 {
        self.weights[kind.index()]
    }

    pub fn set_weight(&mut self, kind: NodeKind, weight: f64) {
        self.weights[kind.index()] = weight;
    }

    /// Enabled kinds with a positive weight, paired with that weight.
    pub fn allowed_symbols(&self) -> Vec<(NodeKind, f64)> {
        self.enabled
            .iter()
            .map(|k| (k, self.weight(k)))
            .filter(|&(_, w)| w > 0.0 && w.is_finite())
            .collect()
    }

    pub fn has_terminals(&self) -> bool {
        self.allowed_symbols().iter().any(|(k, _)| k.is_leaf())
    }

    pub fn has_functions(&self) -> bool {
        self.allowed_symbols().iter().any(|(k, _)| !k.is_leaf())
    }

    /// Weighted draw among allowed kinds whose arity lies in `min_arity..=max_arity`.
    pub fn sample_symbol<R: Rng + ?Sized>(&self, rng: &mut R, min_arity: u8, max_arity: u8) -> Option<NodeKind> {
        self.sample_where(rng, |k| (min_arity..=max_arity).contains(&k.arity()))
    }

    /// Weighted draw among allowed kinds accepted by `keep`.
    pub fn sample_where<R: Rng + ?Sized>(&self, rng: &mut R, keep: impl Fn(NodeKind) -> bool) -> Option<NodeKind> {
        let candidates: Vec<(NodeKind, f64)> = self.allowed_symbols().into_iter().filter(|&(k, _)| keep(k)).collect();
        sample_weighted(rng, &candidates)
    }
}

pub(crate) fn sample_weighted<T: Copy, R: Rng + ?Sized>(rng: &mut R, choices: &[(T, f64)]) -> Option<T> {
    if choices.is_empty() {
        return None;
    }
    let dist = WeightedIndex::new(choices.iter().map(|(_, w)| *w)).ok()?;
    Some(choices[dist.sample(rng)].0)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn arithmetic_default() {
        let g = Grammar::default();
        assert!(g.is_enabled(NodeKind::Div));
        assert!(!g.is_enabled(NodeKind::Exp));
        assert_eq!(g.allowed_symbols().len(), 6);
        assert!(g.has_terminals() && g.has_functions());
    }

    #[test]
    fn parse_and_display_round_trip_names() {
        let s = SymbolSet::parse("add, exp,*").unwrap();
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![NodeKind::Add, NodeKind::Mul, NodeKind::Exp]);
        assert_eq!(s.to_string(), "add,mul,exp");
        assert!(SymbolSet::parse("add,pow").is_err());
    }

    #[test]
    fn complement_stays_within_full() {
        let s = !SymbolSet::ARITHMETIC;
        assert!(s.contains(NodeKind::Cbrt));
        assert!(!s.contains(NodeKind::Add));
        assert_eq!((s | SymbolSet::ARITHMETIC), SymbolSet::FULL);
    }

    #[test]
    fn sampling_respects_arity_and_zero_weight() {
        let mut g = Grammar::new(SymbolSet::FULL);
        g.set_weight(NodeKind::Sin, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let k = g.sample_symbol(&mut rng, 1, 1).unwrap();
            assert_eq!(k.arity(), 1);
            assert_ne!(k, NodeKind::Sin);
        }
        let terminals_only = Grammar::new(SymbolSet::TERMINALS);
        assert!(terminals_only.sample_symbol(&mut rng, 1, 2).is_none());
    }
}
