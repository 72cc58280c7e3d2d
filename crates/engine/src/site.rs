use tracing::info;

use sitedeck_core::{SiteContext, ids::SiteId, plan::Plan};
use sitedeck_storage::{SiteRecord, SiteSelectionStore, Storage};

use crate::error::EngineError;

pub fn create_site(
    storage: &mut impl Storage,
    name: &str,
    plan: Plan,
) -> Result<SiteContext, EngineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::Validation("site name must not be empty".into()));
    }
    let site = SiteRecord {
        site_id: SiteId::new(),
        name: name.to_string(),
        plan,
    };
    storage.insert_site(&site)?;
    info!(site_id = %site.site_id, plan = plan.as_str(), "created site");
    Ok(SiteContext::new(site.site_id, plan))
}

/// Record `site_id` as the operator's current site.
pub fn select_site<S: Storage + SiteSelectionStore>(
    storage: &mut S,
    site_id: SiteId,
) -> Result<SiteContext, EngineError> {
    let site = storage
        .get_site(site_id)?
        .ok_or_else(|| EngineError::NotFound(format!("site {site_id}")))?;
    storage.persist_selection(site_id)?;
    Ok(SiteContext::new(site.site_id, site.plan))
}

/// The previously selected site, if it still exists.
pub fn current_site<S: Storage + SiteSelectionStore>(
    storage: &S,
) -> Result<Option<SiteContext>, EngineError> {
    let Some(site_id) = storage.load_selection()? else {
        return Ok(None);
    };
    Ok(storage
        .get_site(site_id)?
        .map(|site| SiteContext::new(site.site_id, site.plan)))
}
