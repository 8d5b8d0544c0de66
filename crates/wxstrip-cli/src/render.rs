//! Console rendering of a fetch snapshot: one block per site, text
//! bulletins first, then imagery grouped by category.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use wxstrip_core::{
    ImageCategory, ImageRecord, SessionSnapshot, SiteResult, ALPHA_PRODUCTS, IMAGE_PRODUCTS,
};

pub(crate) fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = format!(
        "Weather briefing fetched {}\n",
        snapshot.timestamp.format("%Y-%m-%d %H:%MZ")
    );
    for result in snapshot.site_results.values() {
        out.push('\n');
        render_site(&mut out, result);
    }
    out
}

fn render_site(out: &mut String, result: &SiteResult) {
    let summary = result.request_summary();
    let region = result
        .region()
        .map(|r| format!(" [{} {}]", r.code(), r.display_name()))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "=== {}{region} ({}/{} requests ok) ===",
        result.site(),
        summary.succeeded(),
        summary.total()
    );

    for (product, entry) in result.text_records() {
        let _ = writeln!(out, "--- {} ---", alpha_label(product));
        let _ = writeln!(out, "{}", entry.display_text().trim_end());
    }

    let mut groups: BTreeMap<Option<ImageCategory>, Vec<(&String, &ImageRecord)>> =
        BTreeMap::new();
    for (product, record) in result.image_records() {
        groups
            .entry(ImageCategory::of(product))
            .or_default()
            .push((product, record));
    }
    for (category, records) in groups {
        let _ = writeln!(
            out,
            "[{}]",
            category.map_or("Other Imagery", ImageCategory::label)
        );
        for (product, record) in records {
            render_images(out, product, record);
        }
    }
}

fn render_images(out: &mut String, product: &str, record: &ImageRecord) {
    if let Some(error) = &record.error {
        let _ = writeln!(out, "  {product}: Error: {error}");
        return;
    }
    let _ = writeln!(out, "  {product}: {} image(s)", record.images.len());
    for image in &record.images {
        let period = if image.period.is_empty() { "-" } else { image.period.as_str() };
        let _ = writeln!(out, "    {period:<20} {}", image.proxy_url);
    }
}

fn alpha_label(product: &str) -> &str {
    ALPHA_PRODUCTS
        .iter()
        .find(|p| p.value == product)
        .map_or(product, |p| p.label)
}

pub(crate) fn render_catalog() -> String {
    let mut out = String::from("Text products:\n");
    for product in ALPHA_PRODUCTS {
        let marker = if product.essential { "*" } else { " " };
        let _ = writeln!(out, " {marker} {:<14} {}", product.value, product.label);
    }
    out.push_str("\nImage products:\n");
    for product in IMAGE_PRODUCTS {
        let marker = if product.essential { "*" } else { " " };
        let _ = writeln!(
            out,
            " {marker} {:<22} {} ({})",
            product.value,
            product.label,
            product.category.label()
        );
    }
    out
}
