use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LdfError;
use crate::ldf::buy_the_dip::BuyTheDipGeometricDistribution;
use crate::ldf::carpeted_double_geometric::CarpetedDoubleGeometricDistribution;
use crate::ldf::carpeted_geometric::CarpetedGeometricDistribution;
use crate::ldf::double_geometric::DoubleGeometricDistribution;
use crate::ldf::geometric::GeometricDistribution;
use crate::ldf::uniform::UniformDistribution;
use crate::ldf::LiquidityDensityFunction;

/// Supported liquidity shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LdfKind {
    Uniform,
    Geometric,
    DoubleGeometric,
    CarpetedGeometric,
    CarpetedDoubleGeometric,
    BuyTheDipGeometric,
}

impl LdfKind {
    pub const ALL: [LdfKind; 6] = [
        LdfKind::Uniform,
        LdfKind::Geometric,
        LdfKind::DoubleGeometric,
        LdfKind::CarpetedGeometric,
        LdfKind::CarpetedDoubleGeometric,
        LdfKind::BuyTheDipGeometric,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LdfKind::Uniform => "uniform",
            LdfKind::Geometric => "geometric",
            LdfKind::DoubleGeometric => "double_geometric",
            LdfKind::CarpetedGeometric => "carpeted_geometric",
            LdfKind::CarpetedDoubleGeometric => "carpeted_double_geometric",
            LdfKind::BuyTheDipGeometric => "buy_the_dip_geometric",
        }
    }
}

impl fmt::Display for LdfKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LdfKind {
    type Err = LdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LdfKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LdfError::UnknownShape(s.to_string()))
    }
}

/// Shape lookup table, built once at startup.
pub struct LdfRegistry {
    shapes: HashMap<LdfKind, Box<dyn LiquidityDensityFunction>>,
}

impl LdfRegistry {
    pub fn new() -> Self {
        let mut shapes: HashMap<LdfKind, Box<dyn LiquidityDensityFunction>> = HashMap::new();
        shapes.insert(LdfKind::Uniform, Box::new(UniformDistribution));
        shapes.insert(LdfKind::Geometric, Box::new(GeometricDistribution));
        shapes.insert(LdfKind::DoubleGeometric, Box::new(DoubleGeometricDistribution));
        shapes.insert(LdfKind::CarpetedGeometric, Box::new(CarpetedGeometricDistribution));
        shapes.insert(LdfKind::CarpetedDoubleGeometric, Box::new(CarpetedDoubleGeometricDistribution));
        shapes.insert(LdfKind::BuyTheDipGeometric, Box::new(BuyTheDipGeometricDistribution));
        log::debug!("registered {} liquidity shapes", shapes.len());
        LdfRegistry { shapes }
    }

    pub fn get(&self, kind: LdfKind) -> Option<&dyn LiquidityDensityFunction> {
        self.shapes.get(&kind).map(|shape| shape.as_ref())
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> Vec<LdfKind> {
        LdfKind::ALL.iter().copied().filter(|kind| self.shapes.contains_key(kind)).collect()
    }
}

impl Default for LdfRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_is_registered() {
        let registry = LdfRegistry::new();
        assert_eq!(registry.kinds(), LdfKind::ALL.to_vec());
        for kind in LdfKind::ALL {
            assert_eq!(registry.get(kind).map(|shape| shape.kind()), Some(kind));
        }
    }

    #[test]
    fn test_names_round_trip() {
        for kind in LdfKind::ALL {
            assert_eq!(kind.to_string().parse::<LdfKind>().unwrap(), kind);
            assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{}\"", kind));
        }
        assert_eq!(
            "triangle".parse::<LdfKind>(),
            Err(LdfError::UnknownShape("triangle".to_string()))
        );
    }
}
