//! Where RGO revenue gets its prices. No market clears yet.

use std::collections::BTreeMap;

use crate::simulation::{FixedPoint, GoodDefinition};

pub trait PriceSource {
    fn price(&self, good: &GoodDefinition) -> FixedPoint;
}

/// Every good sells at its base price.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasePricing;

impl PriceSource for BasePricing {
    fn price(&self, good: &GoodDefinition) -> FixedPoint {
        good.base_price
    }
}

/// Configured fixed prices for some goods, base price for the rest.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    overrides: BTreeMap<String, FixedPoint>,
}

impl PriceTable {
    pub fn new(overrides: BTreeMap<String, FixedPoint>) -> Self {
        Self { overrides }
    }
}

impl PriceSource for PriceTable {
    fn price(&self, good: &GoodDefinition) -> FixedPoint {
        self.overrides
            .get(&good.identifier)
            .copied()
            .unwrap_or(good.base_price)
    }
}
