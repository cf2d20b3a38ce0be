use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Revenue summed over one month of the filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyRevenue {
    /// Month label as it appears in the dataset (e.g. "Jan" or "1")
    pub month: String,
    /// Revenue summed over that month
    pub revenue: Decimal,
}

/// Revenue summed over one product of the filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductRevenue {
    pub product: String,
    pub revenue: Decimal,
}

/// Revenue summed over one region of the filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegionRevenue {
    pub region: String,
    pub revenue: Decimal,
}

/// Aggregates computed from a filtered dataset.
///
/// Computed on demand, never persisted. For an empty filtered set all KPIs
/// are zero and all series are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricsResult {
    /// Sum of revenue over the filtered rows
    pub total_revenue: Decimal,
    /// Count of distinct order ids among the filtered rows
    pub total_orders: u64,
    /// Sum of quantity over the filtered rows
    pub units_sold: Decimal,
    /// total_revenue / total_orders, or 0 when there are no orders
    pub average_order_value: Decimal,
    /// Revenue per month, in calendar order
    pub monthly_series: Vec<MonthlyRevenue>,
    /// Up to ten products by descending revenue, ties in first-appearance order
    pub top_products: Vec<ProductRevenue>,
    /// Revenue per region, in first-appearance order
    pub regional_breakdown: Vec<RegionRevenue>,
}

impl MetricsResult {
    /// The result for an empty filtered set.
    pub fn empty() -> Self {
        Self {
            total_revenue: Decimal::ZERO,
            total_orders: 0,
            units_sold: Decimal::ZERO,
            average_order_value: Decimal::ZERO,
            monthly_series: Vec::new(),
            top_products: Vec::new(),
            regional_breakdown: Vec::new(),
        }
    }
}

/// One raw dataset row, as handed to the rendering layer for the
/// tabular preview. Display formatting is the renderer's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesRow {
    pub order_id: String,
    pub year: i32,
    pub month: String,
    pub region: String,
    pub product: String,
    pub quantity: Decimal,
    pub revenue: Decimal,
}
