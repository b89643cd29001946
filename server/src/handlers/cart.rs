//! Cart handlers: pricing, merging and owner-scoped line changes.

use basket_engine::{AddLineRequest, LineId, LineKey, LinesResponse, RemoteCartLine, Timestamp};

use crate::db::CartRepository;
use crate::error::{AppError, Result};

/// List an owner's lines.
pub async fn handle_list(repo: &dyn CartRepository, owner: &str) -> Result<LinesResponse> {
    let lines = repo.list_lines(owner).await?;
    Ok(LinesResponse { lines })
}

/// Price the requested configuration from the catalog and add it to the cart.
pub async fn handle_add(
    repo: &dyn CartRepository,
    owner: &str,
    request: AddLineRequest,
    now: Timestamp,
) -> Result<RemoteCartLine> {
    if request.quantity == 0 {
        return Err(AppError::BadRequest("Quantity must be at least 1".into()));
    }

    let product = repo
        .find_product(&request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", request.product_id)))?;
    let quote = product.quote(request.color_id, request.storage_id)?;

    let key = LineKey::new(request.product_id, request.color_id, request.storage_id);
    let line = repo
        .add_line(owner, &key, request.quantity, &quote, now)
        .await?;

    tracing::info!(
        owner,
        line_id = line.id,
        product_id = %key.product_id,
        quantity = line.line.quantity(),
        "Added cart line"
    );

    Ok(line)
}

/// Set the quantity of one of the owner's lines.
pub async fn handle_update(
    repo: &dyn CartRepository,
    owner: &str,
    id: LineId,
    quantity: u32,
) -> Result<()> {
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1; delete the line instead".into(),
        ));
    }

    if !repo.update_quantity(owner, id, quantity).await? {
        return Err(AppError::NotFound(format!("Cart line {id}")));
    }

    tracing::debug!(owner, line_id = id, quantity, "Updated cart line");
    Ok(())
}

/// Delete one of the owner's lines.
pub async fn handle_remove(repo: &dyn CartRepository, owner: &str, id: LineId) -> Result<()> {
    if !repo.remove_line(owner, id).await? {
        return Err(AppError::NotFound(format!("Cart line {id}")));
    }

    tracing::info!(owner, line_id = id, "Removed cart line");
    Ok(())
}

/// Delete every line of the owner.
pub async fn handle_clear(repo: &dyn CartRepository, owner: &str) -> Result<()> {
    let removed = repo.clear(owner).await?;
    tracing::info!(owner, removed, "Cleared cart");
    Ok(())
}
