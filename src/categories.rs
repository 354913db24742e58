//! Ordered label buckets for budgets, ROI, ratings, eras, runtimes, social
//! engagement, release seasons and the investment funnel.
//!
//! Every bucket type is a closed enum whose declaration order is its rank.
//! Classifiers are total: any input, including a missing one, maps to exactly
//! one variant. Labels double as the serialized CSV values.
use crate::error::ReportError;
use serde::{Deserialize, Serialize};

pub trait Bucket: Copy + PartialEq + Sized + 'static {
    /// Human-readable name of the dimension, used in error messages.
    const DIMENSION: &'static str;
    /// All variants in rank order.
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn rank(&self) -> u8 {
        Self::ALL.iter().position(|b| b == self).unwrap_or(0) as u8
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.label() == label)
    }
}

macro_rules! define_bucket {
    (
        $(#[$meta:meta])*
        $name:ident, $dimension:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Bucket for $name {
            const DIMENSION: &'static str = $dimension;
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ReportError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as Bucket>::from_label(s).ok_or_else(|| ReportError::InvalidSelection {
                    dimension: $dimension,
                    value: s.to_string(),
                })
            }
        }
    };
}

define_bucket! {
    BudgetTier, "budget category" {
        Unknown => "Unknown",
        Micro => "Micro (<$5M)",
        Low => "Low ($5M-$15M)",
        Medium => "Medium ($15M-$40M)",
        High => "High ($40M-$100M)",
        Blockbuster => "Blockbuster (>$100M)",
    }
}

define_bucket! {
    RoiTier, "ROI category" {
        Unknown => "Unknown",
        MajorFlop => "Major Flop (<-50%)",
        Flop => "Flop (-50% to 0%)",
        Moderate => "Moderate (0%-100%)",
        Successful => "Successful (100%-300%)",
        Hit => "Hit (300%-1000%)",
        Blockbuster => "Blockbuster (>1000%)",
    }
}

define_bucket! {
    RatingTier, "rating category" {
        Unknown => "Unknown",
        Poor => "Poor (<5)",
        BelowAverage => "Below Average (5-6)",
        Average => "Average (6-7)",
        Good => "Good (7-8)",
        Excellent => "Excellent (8+)",
    }
}

define_bucket! {
    Era, "era" {
        Unknown => "Unknown",
        Classic => "Classic (<1970)",
        PreDigital => "Pre-Digital (1970-1989)",
        Nineties => "90s Era (1990-1999)",
        TwoThousands => "2000s (2000-2009)",
        Modern => "Modern (2010+)",
    }
}

define_bucket! {
    RuntimeTier, "runtime category" {
        Unknown => "Unknown",
        Short => "Short (<90 min)",
        Standard => "Standard (90-120 min)",
        Long => "Long (120-150 min)",
        Epic => "Epic (>150 min)",
    }
}

define_bucket! {
    SocialTier, "social category" {
        None => "None",
        Low => "Low (<1K)",
        Medium => "Medium (1K-10K)",
        High => "High (10K-50K)",
        Viral => "Viral (>50K)",
    }
}

define_bucket! {
    Season, "season" {
        Unknown => "Unknown",
        Winter => "Winter",
        Spring => "Spring",
        Summer => "Summer",
        Fall => "Fall",
    }
}

define_bucket! {
    /// How far a movie progressed from investment to returns, judged by the
    /// revenue-to-budget ratio.
    FunnelStage, "funnel stage" {
        NoInvestmentData => "0_No_Investment_Data",
        InvestedNoRevenue => "1_Invested_No_Revenue",
        MajorLoss => "2_Major_Loss",
        PartialRecovery => "3_Partial_Recovery",
        BreakEven => "4_Break_Even",
        ModerateProfit => "5_Moderate_Profit",
        StrongProfit => "6_Strong_Profit",
        ExceptionalRoi => "7_Exceptional_ROI",
    }
}

impl BudgetTier {
    pub fn classify(budget: Option<f64>) -> Self {
        match budget {
            Some(b) if b > 0.0 => {
                if b < 5_000_000.0 {
                    BudgetTier::Micro
                } else if b < 15_000_000.0 {
                    BudgetTier::Low
                } else if b < 40_000_000.0 {
                    BudgetTier::Medium
                } else if b < 100_000_000.0 {
                    BudgetTier::High
                } else {
                    BudgetTier::Blockbuster
                }
            }
            _ => BudgetTier::Unknown,
        }
    }
}

impl RoiTier {
    pub fn classify(roi: Option<f64>) -> Self {
        let Some(roi) = roi else {
            return RoiTier::Unknown;
        };
        if roi < -50.0 {
            RoiTier::MajorFlop
        } else if roi < 0.0 {
            RoiTier::Flop
        } else if roi < 100.0 {
            RoiTier::Moderate
        } else if roi < 300.0 {
            RoiTier::Successful
        } else if roi < 1000.0 {
            RoiTier::Hit
        } else {
            RoiTier::Blockbuster
        }
    }
}

impl RatingTier {
    pub fn classify(rating: Option<f64>) -> Self {
        let Some(r) = rating else {
            return RatingTier::Unknown;
        };
        if r < 5.0 {
            RatingTier::Poor
        } else if r < 6.0 {
            RatingTier::BelowAverage
        } else if r < 7.0 {
            RatingTier::Average
        } else if r < 8.0 {
            RatingTier::Good
        } else {
            RatingTier::Excellent
        }
    }
}

impl Era {
    pub fn classify(year: Option<i32>) -> Self {
        match year {
            None => Era::Unknown,
            Some(y) if y < 1970 => Era::Classic,
            Some(y) if y < 1990 => Era::PreDigital,
            Some(y) if y < 2000 => Era::Nineties,
            Some(y) if y < 2010 => Era::TwoThousands,
            Some(_) => Era::Modern,
        }
    }
}

impl RuntimeTier {
    pub fn classify(minutes: Option<f64>) -> Self {
        let Some(m) = minutes else {
            return RuntimeTier::Unknown;
        };
        if m < 90.0 {
            RuntimeTier::Short
        } else if m < 120.0 {
            RuntimeTier::Standard
        } else if m < 150.0 {
            RuntimeTier::Long
        } else {
            RuntimeTier::Epic
        }
    }
}

impl SocialTier {
    pub fn classify(engagement: i64) -> Self {
        if engagement <= 0 {
            SocialTier::None
        } else if engagement < 1_000 {
            SocialTier::Low
        } else if engagement < 10_000 {
            SocialTier::Medium
        } else if engagement < 50_000 {
            SocialTier::High
        } else {
            SocialTier::Viral
        }
    }
}

impl Season {
    pub fn classify(month: Option<u32>) -> Self {
        match month {
            Some(12 | 1 | 2) => Season::Winter,
            Some(3..=5) => Season::Spring,
            Some(6..=8) => Season::Summer,
            Some(9..=11) => Season::Fall,
            _ => Season::Unknown,
        }
    }
}

impl FunnelStage {
    /// Revenue thresholds, as multiples of the budget, separating
    /// `MajorLoss` through `ExceptionalRoi`.
    pub const RATIO_THRESHOLDS: [f64; 5] = [0.5, 1.0, 1.5, 2.0, 3.0];

    pub fn classify(budget: Option<f64>, revenue: Option<f64>) -> Self {
        let budget = match budget {
            Some(b) if b > 0.0 => b,
            _ => return FunnelStage::NoInvestmentData,
        };
        let revenue = match revenue {
            Some(r) if r > 0.0 => r,
            _ => return FunnelStage::InvestedNoRevenue,
        };
        const PROFITABLE_STAGES: [FunnelStage; 5] = [
            FunnelStage::MajorLoss,
            FunnelStage::PartialRecovery,
            FunnelStage::BreakEven,
            FunnelStage::ModerateProfit,
            FunnelStage::StrongProfit,
        ];
        Self::RATIO_THRESHOLDS
            .iter()
            .zip(PROFITABLE_STAGES)
            .find(|(k, _)| revenue < budget * **k)
            .map(|(_, stage)| stage)
            .unwrap_or(FunnelStage::ExceptionalRoi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_monotonic<B: Bucket + std::fmt::Debug>(labels: impl Iterator<Item = B>) {
        let ranks: Vec<u8> = labels.map(|b| b.rank()).collect();
        assert!(
            ranks.windows(2).all(|w| w[0] <= w[1]),
            "ranks not monotonic: {:?}",
            ranks
        );
    }

    #[test]
    fn budget_boundaries_are_left_inclusive() {
        assert_eq!(BudgetTier::classify(None), BudgetTier::Unknown);
        assert_eq!(BudgetTier::classify(Some(0.0)), BudgetTier::Unknown);
        assert_eq!(BudgetTier::classify(Some(-5.0)), BudgetTier::Unknown);
        assert_eq!(BudgetTier::classify(Some(4_999_999.0)), BudgetTier::Micro);
        assert_eq!(BudgetTier::classify(Some(5_000_000.0)), BudgetTier::Low);
        assert_eq!(BudgetTier::classify(Some(10_000_000.0)), BudgetTier::Low);
        assert_eq!(BudgetTier::classify(Some(15_000_000.0)), BudgetTier::Medium);
        assert_eq!(BudgetTier::classify(Some(40_000_000.0)), BudgetTier::High);
        assert_eq!(
            BudgetTier::classify(Some(100_000_000.0)),
            BudgetTier::Blockbuster
        );
    }

    #[test]
    fn roi_boundaries() {
        assert_eq!(RoiTier::classify(Some(-50.01)), RoiTier::MajorFlop);
        assert_eq!(RoiTier::classify(Some(-50.0)), RoiTier::Flop);
        assert_eq!(RoiTier::classify(Some(0.0)), RoiTier::Moderate);
        assert_eq!(RoiTier::classify(Some(300.0)), RoiTier::Hit);
        assert_eq!(RoiTier::classify(Some(1000.0)), RoiTier::Blockbuster);
        assert_eq!(RoiTier::classify(None), RoiTier::Unknown);
    }

    #[test]
    fn era_and_runtime_boundaries() {
        assert_eq!(Era::classify(Some(1969)), Era::Classic);
        assert_eq!(Era::classify(Some(1970)), Era::PreDigital);
        assert_eq!(Era::classify(Some(2010)), Era::Modern);
        assert_eq!(Era::classify(None), Era::Unknown);
        assert_eq!(RuntimeTier::classify(Some(89.9)), RuntimeTier::Short);
        assert_eq!(RuntimeTier::classify(Some(150.0)), RuntimeTier::Epic);
    }

    #[test]
    fn funnel_stage_follows_ratio_thresholds() {
        let b = Some(10_000_000.0);
        assert_eq!(
            FunnelStage::classify(None, Some(1.0)),
            FunnelStage::NoInvestmentData
        );
        assert_eq!(
            FunnelStage::classify(Some(0.0), Some(1.0)),
            FunnelStage::NoInvestmentData
        );
        assert_eq!(FunnelStage::classify(b, None), FunnelStage::InvestedNoRevenue);
        assert_eq!(
            FunnelStage::classify(b, Some(0.0)),
            FunnelStage::InvestedNoRevenue
        );
        assert_eq!(
            FunnelStage::classify(b, Some(4_999_999.0)),
            FunnelStage::MajorLoss
        );
        assert_eq!(
            FunnelStage::classify(b, Some(5_000_000.0)),
            FunnelStage::PartialRecovery
        );
        assert_eq!(
            FunnelStage::classify(b, Some(10_000_000.0)),
            FunnelStage::BreakEven
        );
        assert_eq!(
            FunnelStage::classify(b, Some(15_000_000.0)),
            FunnelStage::ModerateProfit
        );
        assert_eq!(
            FunnelStage::classify(b, Some(20_000_000.0)),
            FunnelStage::StrongProfit
        );
        assert_eq!(
            FunnelStage::classify(b, Some(40_000_000.0)),
            FunnelStage::ExceptionalRoi
        );
    }

    #[test]
    fn funnel_ranks_match_label_prefix() {
        for stage in FunnelStage::ALL {
            let prefix: u8 = stage.label()[..1].parse().unwrap();
            assert_eq!(stage.rank(), prefix);
        }
    }

    #[test]
    fn classifiers_are_monotonic() {
        let amounts: Vec<f64> = (-20..400).map(|i| i as f64 * 500_000.0).collect();
        assert_monotonic(amounts.iter().map(|b| BudgetTier::classify(Some(*b))));
        assert_monotonic(
            (-200..3000)
                .map(|i| i as f64)
                .map(|r| RoiTier::classify(Some(r))),
        );
        assert_monotonic((0..100).map(|i| RatingTier::classify(Some(i as f64 / 10.0))));
        assert_monotonic((1900..2030).map(|y| Era::classify(Some(y))));
        assert_monotonic((30..240).map(|m| RuntimeTier::classify(Some(m as f64))));
        assert_monotonic((0..100_000).step_by(250).map(SocialTier::classify));
        assert_monotonic(
            (0..80).map(|i| FunnelStage::classify(Some(1_000.0), Some(i as f64 * 50.0))),
        );
    }

    #[test]
    fn labels_round_trip_through_from_str() {
        for tier in BudgetTier::ALL {
            assert_eq!(tier.label().parse::<BudgetTier>().unwrap(), *tier);
        }
        assert_eq!("Modern (2010+)".parse::<Era>().unwrap(), Era::Modern);
        assert!("Future".parse::<Era>().is_err());
    }

    #[test]
    fn seasons_cover_every_month() {
        assert_eq!(Season::classify(Some(12)), Season::Winter);
        assert_eq!(Season::classify(Some(4)), Season::Spring);
        assert_eq!(Season::classify(Some(7)), Season::Summer);
        assert_eq!(Season::classify(Some(10)), Season::Fall);
        assert_eq!(Season::classify(None), Season::Unknown);
    }
}
