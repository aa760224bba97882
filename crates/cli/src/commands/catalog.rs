//! Catalog browsing commands.

use shopfront_client::{CatalogClient, ClientError};
use shopfront_core::{Product, format_price};
use tracing::info;

/// One listing line: `#1  Tee  $20.00  [featured, new]`.
pub fn product_line(product: &Product) -> String {
    let mut tags = Vec::new();
    let tag = product.product_type.to_string();
    if !tag.is_empty() {
        tags.push(tag);
    }
    if product.is_new() {
        tags.push("new".to_string());
    }

    let mut line = format!(
        "#{:<4} {:<32} {:>10}",
        product.id.to_string(),
        product.title,
        format_price(product.price)
    );
    if !tags.is_empty() {
        line.push_str(&format!("  [{}]", tags.join(", ")));
    }
    line
}

/// List products, optionally narrowed to a category or merchandising tag.
pub async fn products(
    catalog: &CatalogClient,
    category: Option<&str>,
    featured: bool,
    trending: bool,
) -> Result<(), ClientError> {
    info!("Loading...");
    let products = if featured {
        catalog.featured().await?
    } else if trending {
        catalog.trending().await?
    } else {
        catalog.filtered(category).await?
    };

    // Tag filters compose with the category filter.
    let products: Vec<Product> = match category {
        Some(title) if featured || trending => products
            .into_iter()
            .filter(|p| p.in_category(title))
            .collect(),
        _ => products,
    };

    if products.is_empty() {
        info!("No products found.");
        return Ok(());
    }
    for product in &products {
        info!("{}", product_line(product));
    }
    info!("{} product(s)", products.len());
    Ok(())
}

/// List category titles.
pub async fn categories(catalog: &CatalogClient) -> Result<(), ClientError> {
    info!("Loading...");
    let categories = catalog.categories().await?;
    if categories.is_empty() {
        info!("No categories found.");
    }
    for title in categories {
        info!("{title}");
    }
    Ok(())
}

/// Show one product in detail.
pub async fn product(catalog: &CatalogClient, id: &str) -> Result<(), ClientError> {
    info!("Loading...");
    let product = catalog.get_product(id).await?;

    info!("{}", product_line(&product));
    if !product.desc.is_empty() {
        info!("");
        info!("{}", product.desc);
    }
    if !product.categories.is_empty() {
        let titles: Vec<&str> = product.categories.iter().map(|c| c.title.as_str()).collect();
        info!("");
        info!("Categories: {}", titles.join(", "));
    }
    for image in product.img.iter().chain(&product.img2) {
        info!("Image: {}", catalog.image_url(Some(image)));
    }
    Ok(())
}
