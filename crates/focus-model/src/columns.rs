//! FOCUS target column names.
//!
//! The converter only produces columns defined by the FOCUS standard.
//! Rule documents reference them by their exact (PascalCase) name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! focus_columns {
    ($($variant:ident),+ $(,)?) => {
        /// A column of the FOCUS output schema.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub enum FocusColumn {
            $($variant),+
        }

        impl FocusColumn {
            /// Every FOCUS column, in alphabetical order.
            pub const ALL: &'static [FocusColumn] = &[$(FocusColumn::$variant),+];

            /// Column name as it appears in the output dataset.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(FocusColumn::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

focus_columns!(
    AvailabilityZone,
    BilledCost,
    BilledCurrency,
    BillingAccountId,
    BillingAccountName,
    BillingPeriodEnd,
    BillingPeriodStart,
    ChargeCategory,
    ChargeDescription,
    ChargeFrequency,
    ChargePeriodEnd,
    ChargePeriodStart,
    ChargeSubcategory,
    CommitmentDiscountCategory,
    CommitmentDiscountId,
    CommitmentDiscountName,
    CommitmentDiscountType,
    EffectiveCost,
    InvoiceIssuerName,
    ListCost,
    ListUnitPrice,
    PricingCategory,
    PricingQuantity,
    PricingUnit,
    ProviderName,
    PublisherName,
    Region,
    ResourceId,
    ResourceName,
    ResourceType,
    ServiceCategory,
    ServiceName,
    SkuId,
    SkuPriceId,
    SubAccountId,
    SubAccountName,
    Tags,
    UsageQuantity,
    UsageUnit,
);

impl fmt::Display for FocusColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name is not part of the FOCUS schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFocusColumn(pub String);

impl fmt::Display for UnknownFocusColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a FOCUS column", self.0)
    }
}

impl std::error::Error for UnknownFocusColumn {}

impl FromStr for FocusColumn {
    type Err = UnknownFocusColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|column| column.as_str() == trimmed)
            .ok_or_else(|| UnknownFocusColumn(trimmed.to_string()))
    }
}
