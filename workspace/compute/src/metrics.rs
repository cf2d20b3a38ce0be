//! The metrics engine: filter rows, then aggregate them into KPIs and the
//! three grouped series handed to the rendering layer.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use common::{
    ALL_REGIONS, FilterCriteria, FilterOptions, MetricsResult, MonthlyRevenue, ProductRevenue,
    RegionRevenue, SalesRow,
};
use model::{Dataset, SalesRecord, month_ordinal};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

/// Maximum rows handed to the rendering layer for the tabular preview.
pub const PREVIEW_ROWS: usize = 20;

/// Maximum entries in the top-products series.
const TOP_PRODUCTS: usize = 10;

/// Unknown month labels sort after December.
const UNKNOWN_MONTH: u32 = 13;

/// Rows passing the filter, in dataset order.
pub fn filter_records<'a>(
    records: &'a [SalesRecord],
    filter: &FilterCriteria,
) -> Vec<&'a SalesRecord> {
    records
        .iter()
        .filter(|r| r.year == filter.year && filter.region.matches(&r.region))
        .collect()
}

/// Compute the KPI scalars and grouped series for one filter.
///
/// An empty filtered set is not an error: every KPI is zero and every
/// series is empty.
#[instrument(skip(records))]
pub fn compute_metrics(records: &[SalesRecord], filter: &FilterCriteria) -> MetricsResult {
    let rows = filter_records(records, filter);
    if rows.is_empty() {
        debug!(year = filter.year, "no rows match the filter");
        return MetricsResult::empty();
    }

    let total_revenue: Decimal = rows.iter().map(|r| r.revenue).sum();
    let units_sold: Decimal = rows.iter().map(|r| r.quantity).sum();

    // Repeated order ids belong to the same order, so orders are counted
    // distinct, not per row.
    let distinct_orders: HashSet<&str> = rows.iter().map(|r| r.order_id.as_str()).collect();
    let total_orders = distinct_orders.len() as u64;

    let average_order_value = if total_orders > 0 {
        total_revenue / Decimal::from(total_orders)
    } else {
        Decimal::ZERO
    };

    // Calendar order for the monthly series. The grouping preserves
    // first-appearance order, and the sort is stable, so labels sharing a
    // calendar position (or unknown ones) stay in encounter order.
    let mut monthly = revenue_by(&rows, |r| r.month.as_str());
    monthly.sort_by_key(|(month, _)| month_ordinal(month).unwrap_or(UNKNOWN_MONTH));

    let mut products = revenue_by(&rows, |r| r.product.as_str());
    products.sort_by(|a, b| b.1.cmp(&a.1));
    products.truncate(TOP_PRODUCTS);

    let regional = revenue_by(&rows, |r| r.region.as_str());

    debug!(
        rows = rows.len(),
        orders = total_orders,
        "computed metrics"
    );

    MetricsResult {
        total_revenue,
        total_orders,
        units_sold,
        average_order_value,
        monthly_series: monthly
            .into_iter()
            .map(|(month, revenue)| MonthlyRevenue {
                month: month.to_string(),
                revenue,
            })
            .collect(),
        top_products: products
            .into_iter()
            .map(|(product, revenue)| ProductRevenue {
                product: product.to_string(),
                revenue,
            })
            .collect(),
        regional_breakdown: regional
            .into_iter()
            .map(|(region, revenue)| RegionRevenue {
                region: region.to_string(),
                revenue,
            })
            .collect(),
    }
}

/// The filter values a dataset supports: distinct years ascending, and
/// distinct regions ascending behind the "All" sentinel.
pub fn filter_options(dataset: &Dataset) -> FilterOptions {
    let distinct = dataset.distinct_regions();
    let mut regions = Vec::with_capacity(distinct.len() + 1);
    regions.push(ALL_REGIONS.to_string());
    regions.extend(distinct);

    FilterOptions {
        years: dataset.distinct_years(),
        regions,
    }
}

/// First `limit` filtered rows, as transport rows for the tabular preview.
pub fn preview(records: &[SalesRecord], filter: &FilterCriteria, limit: usize) -> Vec<SalesRow> {
    filter_records(records, filter)
        .into_iter()
        .take(limit)
        .map(|record| SalesRow {
            order_id: record.order_id.clone(),
            year: record.year,
            month: record.month.clone(),
            region: record.region.clone(),
            product: record.product.clone(),
            quantity: record.quantity,
            revenue: record.revenue,
        })
        .collect()
}

/// Sum revenue per key, preserving first-appearance order of the keys.
fn revenue_by<'a, K, F>(rows: &[&'a SalesRecord], key: F) -> Vec<(K, Decimal)>
where
    K: Clone + Eq + Hash,
    F: Fn(&'a SalesRecord) -> K,
{
    let mut grouped: Vec<(K, Decimal)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();

    for &row in rows {
        let k = key(row);
        match index.get(&k) {
            Some(&at) => grouped[at].1 += row.revenue,
            None => {
                index.insert(k.clone(), grouped.len());
                grouped.push((k, row.revenue));
            }
        }
    }

    grouped
}
