//! Signal strategy capability trait and registry.
//!
//! A strategy declares the target asset and anchor assets it needs, and maps
//! the fetched series to one signal per target slot. Strategies are selected
//! by registry name; parameters live in typed structs with named defaults,
//! passed at construction.

use super::candle::{AssetSpec, Candle};
use super::error::SignalbenchError;
use super::signal::SignalPoint;
use super::strategies::anchor_momentum::AnchorMomentum;
use super::strategies::ema_pullback::EmaPullback;
use super::strategies::zscore_reversion::ZscoreReversion;

/// The assets a strategy evaluates over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyMetadata {
    pub target: AssetSpec,
    pub anchors: Vec<AssetSpec>,
}

/// An anchor's candle series, resampled onto the target grid.
#[derive(Debug, Clone)]
pub struct AnchorSeries {
    pub spec: AssetSpec,
    pub candles: Vec<Candle>,
}

impl AnchorSeries {
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<Option<f64>> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

/// Find an anchor series by symbol.
pub fn anchor_by_symbol<'a>(
    anchors: &'a [AnchorSeries],
    symbol: &str,
) -> Result<&'a AnchorSeries, SignalbenchError> {
    anchors
        .iter()
        .find(|a| a.spec.symbol == symbol)
        .ok_or_else(|| SignalbenchError::NoData {
            symbol: symbol.to_string(),
            timeframe: "anchor".to_string(),
        })
}

pub trait SignalStrategy: Send + Sync + std::fmt::Debug {
    /// Registry name, kebab-case.
    fn name(&self) -> &'static str;

    fn metadata(&self) -> StrategyMetadata;

    /// Produce one signal per target candle, in the same order. Anchor
    /// series arrive already resampled onto the target grid.
    fn generate_signals(
        &self,
        target: &[Candle],
        anchors: &[AnchorSeries],
    ) -> Result<Vec<SignalPoint>, SignalbenchError>;
}

/// All registered strategies, default-parameterized.
pub fn registry() -> Vec<Box<dyn SignalStrategy>> {
    vec![
        Box::new(AnchorMomentum::default()),
        Box::new(ZscoreReversion::default()),
        Box::new(EmaPullback::default()),
    ]
}

/// Look a strategy up by registry name.
pub fn lookup(name: &str) -> Result<Box<dyn SignalStrategy>, SignalbenchError> {
    registry()
        .into_iter()
        .find(|s| s.name() == name)
        .ok_or_else(|| SignalbenchError::UnknownStrategy {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::Timeframe;

    #[test]
    fn registry_names_are_unique() {
        let names: Vec<&str> = registry().iter().map(|s| s.name()).collect();
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
    }

    #[test]
    fn lookup_finds_registered_strategy() {
        let strategy = lookup("anchor-momentum").unwrap();
        assert_eq!(strategy.name(), "anchor-momentum");
    }

    #[test]
    fn lookup_unknown_name_fails() {
        let err = lookup("nope").unwrap_err();
        assert!(matches!(
            err,
            SignalbenchError::UnknownStrategy { name } if name == "nope"
        ));
    }

    #[test]
    fn every_strategy_declares_anchors() {
        for strategy in registry() {
            let meta = strategy.metadata();
            assert!(!meta.anchors.is_empty(), "{} has no anchors", strategy.name());
            assert_eq!(meta.target.timeframe, Timeframe::H1);
        }
    }

    #[test]
    fn anchor_by_symbol_matches() {
        let anchors = vec![AnchorSeries {
            spec: AssetSpec::new("BTC", Timeframe::H1),
            candles: vec![],
        }];
        assert!(anchor_by_symbol(&anchors, "BTC").is_ok());
        assert!(anchor_by_symbol(&anchors, "ETH").is_err());
    }
}
