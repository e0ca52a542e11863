use super::repository::ProductStore;
use contracts::domain::a001_product::{Product, SyncedFields, ValidationError};
use contracts::usecases::u501_sync_from_winestro::ItemOutcome;
use thiserror::Error;

/// Сколько суффиксов `-2`, `-3`, … перебирать до отката на артикул
const MAX_SLUG_ATTEMPTS: usize = 50;

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("content store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Результат upsert: что произошло и итоговый документ
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub action: ItemOutcome,
    pub product: Product,
}

/// Создать или обновить товар по номеру артикула Winestro.
///
/// Найденный документ получает только синхронизируемые поля,
/// новый создаётся с уникальным slug.
pub async fn upsert_from_erp(
    store: &dyn ProductStore,
    external_id: &str,
    fields: &SyncedFields,
) -> Result<UpsertOutcome, UpsertError> {
    let external_id = external_id.trim();
    fields.validate(external_id)?;

    if let Some(mut product) = store.find_by_external_id(external_id).await? {
        if !product.apply_sync(fields)? {
            tracing::debug!("Product {} unchanged, skipping write", external_id);
            return Ok(UpsertOutcome {
                action: ItemOutcome::Unchanged,
                product,
            });
        }
        store.update(&product).await?;
        tracing::debug!(
            "Updated product {} ({}) v{}",
            external_id,
            product.slug(),
            product.base.metadata.version
        );
        return Ok(UpsertOutcome {
            action: ItemOutcome::Updated,
            product,
        });
    }

    let title = fields.title.as_deref().unwrap_or_default();
    let slug = generate_unique_slug(store, title, external_id).await?;
    let product = Product::new_from_sync(external_id, slug, fields)?;
    store.insert(&product).await?;
    tracing::debug!("Created product {} ({})", external_id, product.slug());

    Ok(UpsertOutcome {
        action: ItemOutcome::Created,
        product,
    })
}

/// Обновить остаток существующего товара. `None` — артикула нет в каталоге
pub async fn update_stock(
    store: &dyn ProductStore,
    external_id: &str,
    stock: i64,
) -> Result<Option<UpsertOutcome>, UpsertError> {
    let Some(mut product) = store.find_by_external_id(external_id.trim()).await? else {
        return Ok(None);
    };
    if product.base.metadata.is_deleted {
        return Ok(None);
    }
    if !product.apply_stock(stock) {
        return Ok(Some(UpsertOutcome {
            action: ItemOutcome::Unchanged,
            product,
        }));
    }
    store.update(&product).await?;
    Ok(Some(UpsertOutcome {
        action: ItemOutcome::Updated,
        product,
    }))
}

/// Пометить товар удалённым (событие product.deleted).
/// `None` — такого артикула в каталоге нет.
pub async fn mark_deleted(
    store: &dyn ProductStore,
    external_id: &str,
) -> anyhow::Result<Option<Product>> {
    let Some(mut product) = store.find_by_external_id(external_id.trim()).await? else {
        return Ok(None);
    };
    if !product.base.metadata.is_deleted {
        product.archive();
        store.update(&product).await?;
    }
    Ok(Some(product))
}

/// Slug из названия: нижний регистр, умлауты транслитерируются,
/// всё кроме `[a-z0-9]` схлопывается в одиночные дефисы
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.trim().chars().flat_map(char::to_lowercase) {
        let replacement: Option<&str> = match ch {
            'ä' => Some("ae"),
            'ö' => Some("oe"),
            'ü' => Some("ue"),
            'ß' => Some("ss"),
            'é' | 'è' | 'ê' => Some("e"),
            'á' | 'à' | 'â' => Some("a"),
            _ => None,
        };
        let piece = match replacement {
            Some(r) => r.to_string(),
            None if ch.is_ascii_alphanumeric() => ch.to_string(),
            None => {
                pending_dash = !slug.is_empty();
                continue;
            }
        };
        if pending_dash {
            slug.push('-');
            pending_dash = false;
        }
        slug.push_str(&piece);
    }
    slug
}

/// Уникальный slug: `riesling-2022`, затем `riesling-2022-2`, …
pub async fn generate_unique_slug(
    store: &dyn ProductStore,
    title: &str,
    external_id: &str,
) -> anyhow::Result<String> {
    let mut base = slugify(title);
    if base.is_empty() {
        base = format!("artikel-{}", slugify(external_id));
    }

    if !store.slug_exists(&base).await? {
        return Ok(base);
    }
    for n in 2..=MAX_SLUG_ATTEMPTS {
        let candidate = format!("{}-{}", base, n);
        if !store.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
    }

    let fallback = format!("{}-{}", base, slugify(external_id));
    if store.slug_exists(&fallback).await? {
        anyhow::bail!("could not find a free slug for '{}'", title);
    }
    Ok(fallback)
}
