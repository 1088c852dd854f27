//! Cross-product expansion of field values into catalog line items.

use tracing::warn;

use crate::database::models::{FieldValues, PriceItem};

/// Separator between field values in a generated item name
pub const NAME_SEPARATOR: &str = ", ";

/// Cartesian product of the value lists, depth-first in field order.
///
/// No fields, or any field without values, yields nothing.
pub fn expand(fields: &[&FieldValues]) -> Vec<Vec<String>> {
    if fields.is_empty() {
        warn!("Combination requested without any fields");
        return vec![];
    }
    if let Some(empty) = fields.iter().find(|f| f.values.is_empty()) {
        warn!("Field {:?} has no values, no combinations generated", empty.field);
        return vec![];
    }
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(fields.len());
    walk(fields, &mut current, &mut out);
    out
}

fn walk(fields: &[&FieldValues], current: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    let Some((head, rest)) = fields.split_first() else {
        out.push(current.clone());
        return;
    };
    for value in &head.values {
        current.push(value.clone());
        walk(rest, current, out);
        current.pop();
    }
}

/// Join the chosen values, skipping empty components.
pub fn item_name(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

/// Arrange field values by the category's field order. Fields the order does
/// not mention keep their relative position after the known ones.
pub fn ordered<'a>(field_order: &[String], field_values: &'a [FieldValues]) -> Vec<&'a FieldValues> {
    let position = |fv: &FieldValues| {
        field_order
            .iter()
            .position(|f| f.eq_ignore_ascii_case(&fv.field))
            .unwrap_or(usize::MAX)
    };
    let mut fields: Vec<&FieldValues> = field_values.iter().collect();
    fields.sort_by_key(|fv| position(fv));
    fields
}

/// One unpriced item per combination, carrying the category's tax metadata.
pub fn generate_items(
    field_order: &[String],
    field_values: &[FieldValues],
    tax_rate: f64,
    tax_code: &str,
) -> Vec<PriceItem> {
    expand(&ordered(field_order, field_values))
        .iter()
        .map(|combo| PriceItem {
            name: item_name(combo),
            tax_rate,
            tax_code: tax_code.to_string(),
            purchase_price: 0.0,
        })
        .filter(|item| !item.name.is_empty())
        .collect()
}

/// Priced items whose names are produced by the requested field values, in
/// generated order.
pub fn match_items(priced: &[PriceItem], field_order: &[String], requested: &[FieldValues]) -> Vec<PriceItem> {
    expand(&ordered(field_order, requested))
        .iter()
        .map(|combo| item_name(combo))
        .filter_map(|name| {
            priced
                .iter()
                .find(|item| item.name.to_lowercase() == name.to_lowercase())
                .cloned()
        })
        .collect()
}

/// Carry purchase prices over to regenerated items with the same name.
pub fn preserve_prices(regenerated: Vec<PriceItem>, previous: &[PriceItem]) -> Vec<PriceItem> {
    regenerated
        .into_iter()
        .map(|mut item| {
            if let Some(old) = previous.iter().find(|p| p.name.eq_ignore_ascii_case(&item.name)) {
                item.purchase_price = old.purchase_price;
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(field: &str, values: &[&str]) -> FieldValues {
        FieldValues {
            field: field.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn names(items: &[PriceItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn color_by_size_yields_four_items_in_order() {
        let fields = vec![fv("Color", &["Red", "Blue"]), fv("Size", &["S", "M"])];
        let items = generate_items(&[], &fields, 18.0, "9403");
        assert_eq!(names(&items), vec!["Red, S", "Red, M", "Blue, S", "Blue, M"]);
        assert!(items.iter().all(|i| i.tax_rate == 18.0 && i.tax_code == "9403"));
    }

    #[test]
    fn zero_values_or_fields_yield_nothing() {
        assert!(generate_items(&[], &[fv("Color", &["Red"]), fv("Size", &[])], 0.0, "").is_empty());
        assert!(generate_items(&[], &[], 0.0, "").is_empty());
    }

    #[test]
    fn follows_category_field_order() {
        let fields = vec![fv("size", &["S"]), fv("color", &["Red", "Blue"])];
        let order = vec!["Color".to_string(), "Size".to_string()];
        let items = generate_items(&order, &fields, 0.0, "");
        assert_eq!(names(&items), vec!["Red, S", "Blue, S"]);
    }

    #[test]
    fn empty_components_are_skipped() {
        assert_eq!(item_name(&["Red".into(), "".into(), " M ".into()]), "Red, M");
    }

    #[test]
    fn matching_returns_the_intersection() {
        let priced = generate_items(&[], &[fv("Color", &["Red", "Blue"]), fv("Size", &["S", "M"])], 5.0, "X");
        let requested = vec![fv("Color", &["blue", "Green"]), fv("Size", &["M"])];
        let matched = match_items(&priced, &[], &requested);
        assert_eq!(names(&matched), vec!["Blue, M"]);
    }

    #[test]
    fn regenerated_items_keep_prices() {
        let mut old = generate_items(&[], &[fv("Color", &["Red"])], 0.0, "");
        old[0].purchase_price = 120.0;
        let new = generate_items(&[], &[fv("Color", &["Red", "Blue"])], 0.0, "");
        let merged = preserve_prices(new, &old);
        assert_eq!(merged[0].purchase_price, 120.0);
        assert_eq!(merged[1].purchase_price, 0.0);
    }
}
