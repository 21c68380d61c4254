use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::domain::ids::{CategoryId, ProductId, StoreId};
use crate::domain::target::EvaluationTarget;
use crate::domain::voucher::Voucher;

/// In-memory applicability index over a voucher set. Scope links are indexed
/// by product, category, and store so candidate lookup never scans vouchers
/// whose scope cannot match; unscoped vouchers are candidates for every
/// target. Liveness (active flag + date window) is checked per lookup since
/// it depends on the evaluation date.
#[derive(Default)]
pub struct VoucherCatalog {
    vouchers: Vec<Voucher>,
    by_product: HashMap<ProductId, Vec<usize>>,
    by_category: HashMap<CategoryId, Vec<usize>>,
    by_store: HashMap<StoreId, Vec<usize>>,
    unscoped: Vec<usize>,
}

impl VoucherCatalog {
    pub fn new(vouchers: Vec<Voucher>) -> Self {
        let mut catalog = Self { vouchers, ..Self::default() };

        for (index, voucher) in catalog.vouchers.iter().enumerate() {
            if voucher.scope.is_unscoped() {
                catalog.unscoped.push(index);
                continue;
            }
            for product in &voucher.scope.products {
                catalog.by_product.entry(*product).or_default().push(index);
            }
            for category in &voucher.scope.categories {
                catalog.by_category.entry(*category).or_default().push(index);
            }
            for store in &voucher.scope.stores {
                catalog.by_store.entry(*store).or_default().push(index);
            }
        }

        catalog
    }

    pub fn len(&self) -> usize {
        self.vouchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vouchers.is_empty()
    }

    /// Live vouchers whose scope matches the target. A voucher linked to the
    /// target on several axes is returned once.
    pub fn candidates(&self, target: &EvaluationTarget, as_of: NaiveDate) -> Vec<&Voucher> {
        let mut indexes = BTreeSet::new();
        indexes.extend(self.unscoped.iter().copied());
        if let Some(matched) = self.by_product.get(&target.product_id) {
            indexes.extend(matched.iter().copied());
        }
        if let Some(matched) = self.by_category.get(&target.category_id) {
            indexes.extend(matched.iter().copied());
        }
        if let Some(matched) = self.by_store.get(&target.store_id) {
            indexes.extend(matched.iter().copied());
        }

        indexes
            .into_iter()
            .map(|index| &self.vouchers[index])
            .filter(|voucher| voucher.is_live(as_of))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use crate::domain::ids::{CategoryId, ProductId, StoreId, VoucherId};
    use crate::domain::target::EvaluationTarget;
    use crate::domain::voucher::{DiscountMode, Voucher, VoucherKind, VoucherScope};

    use super::VoucherCatalog;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn voucher(id: i64, scope: VoucherScope) -> Voucher {
        Voucher {
            id: VoucherId(id),
            code: format!("V-{id}"),
            kind: VoucherKind::Platform,
            seller_store: None,
            mode: DiscountMode::Percent,
            value: Decimal::new(10, 0),
            min_order_amount: Decimal::ZERO,
            max_discount: None,
            starts_on: date(2026, 1, 1),
            ends_on: date(2026, 12, 31),
            usage_limit: None,
            per_user_limit: 1,
            is_active: true,
            is_auto: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            scope,
        }
    }

    fn target() -> EvaluationTarget {
        EvaluationTarget {
            product_id: ProductId(101),
            category_id: CategoryId(10),
            store_id: StoreId(7),
            price: Decimal::new(500_000, 0),
        }
    }

    #[test]
    fn multi_axis_links_return_the_voucher_once() {
        let scope = VoucherScope {
            products: vec![ProductId(101)],
            categories: vec![CategoryId(10)],
            stores: vec![StoreId(7)],
        };
        let catalog = VoucherCatalog::new(vec![voucher(1, scope)]);

        let candidates = catalog.candidates(&target(), date(2026, 6, 15));

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, VoucherId(1));
    }

    #[test]
    fn unrelated_scopes_are_never_visited() {
        let catalog = VoucherCatalog::new(vec![
            voucher(1, VoucherScope { products: vec![ProductId(999)], ..VoucherScope::default() }),
            voucher(2, VoucherScope { stores: vec![StoreId(7)], ..VoucherScope::default() }),
        ]);

        let candidates = catalog.candidates(&target(), date(2026, 6, 15));

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, VoucherId(2));
    }

    #[test]
    fn unscoped_vouchers_are_candidates_for_every_target() {
        let catalog = VoucherCatalog::new(vec![voucher(1, VoucherScope::default())]);

        assert_eq!(catalog.candidates(&target(), date(2026, 6, 15)).len(), 1);
    }

    #[test]
    fn catalog_candidates_feed_the_evaluator() {
        let mut category_scoped = voucher(
            1,
            VoucherScope { categories: vec![CategoryId(10)], ..VoucherScope::default() },
        );
        category_scoped.value = Decimal::new(25, 0);
        let catalog = VoucherCatalog::new(vec![category_scoped, voucher(2, VoucherScope::default())]);

        let target = target();
        let candidates: Vec<Voucher> =
            catalog.candidates(&target, date(2026, 6, 15)).into_iter().cloned().collect();
        let quote = crate::evaluator::evaluate_target(&target, date(2026, 6, 15), &candidates)
            .expect("evaluate");

        assert_eq!(quote.percentage, Decimal::new(25, 0));
        assert_eq!(quote.winner, Some(VoucherId(1)));
    }

    #[test]
    fn expired_vouchers_are_filtered_at_lookup() {
        let mut expired = voucher(1, VoucherScope::default());
        expired.starts_on = date(2024, 1, 1);
        expired.ends_on = date(2024, 12, 31);
        let catalog = VoucherCatalog::new(vec![expired]);

        assert!(catalog.candidates(&target(), date(2026, 6, 15)).is_empty());
    }
}
