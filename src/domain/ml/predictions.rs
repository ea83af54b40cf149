//! Prediction queries, results and their interpretation tiers.

use crate::domain::numeric::round_to;
use crate::domain::tiers::{Tier, TierTable};
use crate::domain::weather::WeatherConditions;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    VeryHigh,
    High,
    Normal,
    Low,
    VeryLow,
}

const DEMAND_LEVEL_TIERS: &[Tier<DemandLevel>] = &[
    Tier {
        predicate: |d| d >= 1.5,
        value: DemandLevel::VeryHigh,
    },
    Tier {
        predicate: |d| d >= 1.2,
        value: DemandLevel::High,
    },
    Tier {
        predicate: |d| d >= 0.8,
        value: DemandLevel::Normal,
    },
    Tier {
        predicate: |d| d >= 0.5,
        value: DemandLevel::Low,
    },
];

pub const DEMAND_LEVELS: TierTable<DemandLevel> =
    TierTable::new(DEMAND_LEVEL_TIERS, DemandLevel::VeryLow);

impl DemandLevel {
    pub fn from_demand(demand: f64) -> Self {
        DEMAND_LEVELS.evaluate(demand)
    }
}

impl fmt::Display for DemandLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DemandLevel::VeryHigh => "very high",
            DemandLevel::High => "high",
            DemandLevel::Normal => "normal",
            DemandLevel::Low => "low",
            DemandLevel::VeryLow => "very low",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

const RISK_LEVEL_TIERS: &[Tier<RiskLevel>] = &[
    Tier {
        predicate: |p| p >= 0.3,
        value: RiskLevel::High,
    },
    Tier {
        predicate: |p| p >= 0.15,
        value: RiskLevel::Moderate,
    },
];

pub const RISK_LEVELS: TierTable<RiskLevel> = TierTable::new(RISK_LEVEL_TIERS, RiskLevel::Low);

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        RISK_LEVELS.evaluate(probability)
    }

    /// Mitigations offered for this risk level, most important first.
    pub fn mitigations(&self) -> Vec<Mitigation> {
        match self {
            RiskLevel::High => vec![
                Mitigation::FlexibleRefundPolicy,
                Mitigation::ProactiveWeatherCommunication,
                Mitigation::FreeRescheduling,
            ],
            RiskLevel::Moderate => vec![
                Mitigation::ConfirmationReminder,
                Mitigation::ConditionUpdates,
            ],
            RiskLevel::Low => vec![Mitigation::StandardPolicy],
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::High => "high",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Low => "low",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mitigation {
    FlexibleRefundPolicy,
    ProactiveWeatherCommunication,
    FreeRescheduling,
    ConfirmationReminder,
    ConditionUpdates,
    StandardPolicy,
}

impl Mitigation {
    pub fn message(&self) -> &'static str {
        match self {
            Mitigation::FlexibleRefundPolicy => "Offer a flexible refund policy",
            Mitigation::ProactiveWeatherCommunication => {
                "Communicate weather conditions proactively"
            }
            Mitigation::FreeRescheduling => "Offer free rescheduling",
            Mitigation::ConfirmationReminder => "Send a confirmation reminder 24h before",
            Mitigation::ConditionUpdates => "Share real-time surf condition updates",
            Mitigation::StandardPolicy => "Standard policy is sufficient",
        }
    }
}

/// Price band of an optimized price relative to its base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRecommendation {
    RaisePrice,
    LowerPrice,
    StandardPrice,
    ProgressiveIncrease,
    PromotionalOffer,
}

const PRICE_BAND_TIERS: &[Tier<PriceRecommendation, (f64, f64)>] = &[
    Tier {
        predicate: |(base, optimized)| optimized > base * 1.2,
        value: PriceRecommendation::RaisePrice,
    },
    Tier {
        predicate: |(base, optimized)| optimized < base * 0.8,
        value: PriceRecommendation::LowerPrice,
    },
];

/// Evaluated on `(base_price, optimized_price)`.
pub const PRICE_BANDS: TierTable<PriceRecommendation, (f64, f64)> =
    TierTable::new(PRICE_BAND_TIERS, PriceRecommendation::StandardPrice);

const DEMAND_TREND_TIERS: &[Tier<Option<PriceRecommendation>>] = &[
    Tier {
        predicate: |d| d > 1.3,
        value: Some(PriceRecommendation::ProgressiveIncrease),
    },
    Tier {
        predicate: |d| d < 0.7,
        value: Some(PriceRecommendation::PromotionalOffer),
    },
];

/// Evaluated on the predicted demand.
pub const DEMAND_TRENDS: TierTable<Option<PriceRecommendation>> =
    TierTable::new(DEMAND_TREND_TIERS, None);

impl PriceRecommendation {
    /// The band recommendation first, then an optional demand-trend hint.
    pub fn for_prices(
        base_price: f64,
        optimized_price: f64,
        predicted_demand: f64,
    ) -> Vec<PriceRecommendation> {
        let mut recommendations = vec![PRICE_BANDS.evaluate((base_price, optimized_price))];
        if let Some(trend) = DEMAND_TRENDS.evaluate(predicted_demand) {
            recommendations.push(trend);
        }
        recommendations
    }

    pub fn message(&self) -> &'static str {
        match self {
            PriceRecommendation::RaisePrice => "Higher price recommended: strong demand expected",
            PriceRecommendation::LowerPrice => "Reduced price recommended: weak demand expected",
            PriceRecommendation::StandardPrice => "Standard price recommended: normal demand",
            PriceRecommendation::ProgressiveIncrease => "Consider a progressive price increase",
            PriceRecommendation::PromotionalOffer => {
                "Promotional offers recommended to stimulate demand"
            }
        }
    }
}

/// A future booking to score.
///
/// `predicted_demand` and `price_multiplier` feed the cancellation model; when
/// absent, the neutral value 1.0 is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingQuery {
    pub booking_date: NaiveDate,
    #[serde(default)]
    pub weather: WeatherConditions,
    #[serde(default)]
    pub predicted_demand: Option<f64>,
    #[serde(default)]
    pub price_multiplier: Option<f64>,
    #[serde(default)]
    pub spot_name: Option<String>,
    #[serde(default)]
    pub surf_level: Option<String>,
}

impl BookingQuery {
    pub fn new(booking_date: NaiveDate, weather: WeatherConditions) -> Self {
        Self {
            booking_date,
            weather,
            predicted_demand: None,
            price_multiplier: None,
            spot_name: None,
            surf_level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPrediction {
    pub date: NaiveDate,
    pub spot_name: Option<String>,
    pub predicted_demand: f64,
    pub demand_level: DemandLevel,
    pub weather: WeatherConditions,
}

impl DemandPrediction {
    /// Builds a prediction from a raw model output. Negative output counts as
    /// zero demand; the level is read before rounding to two decimals.
    pub fn from_model_output(
        date: NaiveDate,
        spot_name: Option<String>,
        raw: f64,
        weather: WeatherConditions,
    ) -> Self {
        let demand = raw.max(0.0);
        Self {
            date,
            spot_name,
            predicted_demand: round_to(demand, 2),
            demand_level: DemandLevel::from_demand(demand),
            weather,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOptimization {
    pub date: NaiveDate,
    pub base_price: f64,
    pub optimized_price: f64,
    pub price_multiplier: f64,
    pub predicted_demand: f64,
    pub recommendations: Vec<PriceRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRisk {
    pub cancellation_probability: f64,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<Mitigation>,
}

impl CancellationRisk {
    /// Clamps a raw model output to [0, 1]; the risk tier is read before
    /// rounding to three decimals.
    pub fn from_model_output(raw: f64) -> Self {
        let probability = raw.clamp(0.0, 1.0);
        let risk_level = RiskLevel::from_probability(probability);
        Self {
            cancellation_probability: round_to(probability, 3),
            risk_level,
            recommendations: risk_level.mitigations(),
        }
    }
}
