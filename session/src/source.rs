use lineage_core::{AssetRecord, RawSnapshot, RelationshipRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};

/// One page of the asset listing. Pages are numbered from 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPage {
    pub items: Vec<AssetRecord>,
    pub page: u32,
    pub page_count: Option<u32>,
    pub has_next: bool,
}

impl AssetPage {
    /// True when this page ends the listing: no `has_next`, the reported
    /// page count is reached, or the page came back empty.
    pub fn is_last(&self, requested: u32) -> bool {
        !self.has_next
            || self.page_count.is_some_and(|count| requested >= count)
            || self.items.is_empty()
    }
}

/// Paginated asset collaborator.
pub trait AssetSource {
    fn fetch_page(&mut self, page: u32, page_size: u32) -> Result<AssetPage>;
}

/// Relationship collaborator. Returns the full, unpaginated list.
pub trait RelationshipSource {
    fn fetch_relationships(&mut self, focal: Option<&str>) -> Result<Vec<RelationshipRecord>>;
}

/// Page through `source` until the listing is exhausted.
///
/// Layout levels and grouping need the complete asset set, so a partial
/// listing is an error rather than a truncated result.
pub fn collect_assets<S>(source: &mut S, config: &SessionConfig) -> Result<Vec<AssetRecord>>
where
    S: AssetSource + ?Sized,
{
    let mut assets = Vec::new();
    let mut page = 1u32;

    loop {
        if page > config.max_asset_pages {
            return Err(SessionError::PageLimitExceeded {
                limit: config.max_asset_pages,
            });
        }

        let batch = source.fetch_page(page, config.page_size)?;
        let last = batch.is_last(page);
        debug!(page, items = batch.items.len(), last, "fetched asset page");
        assets.extend(batch.items);

        if last {
            break;
        }
        page += 1;
    }

    Ok(assets)
}

/// Fetch a complete raw snapshot from both collaborators.
pub fn load_snapshot<A, R>(
    assets: &mut A,
    relationships: &mut R,
    focal: Option<&str>,
    config: &SessionConfig,
) -> Result<RawSnapshot>
where
    A: AssetSource + ?Sized,
    R: RelationshipSource + ?Sized,
{
    let assets = collect_assets(assets, config)?;
    let relationships = relationships.fetch_relationships(focal)?;
    Ok(RawSnapshot::new(assets, relationships))
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;

    /// Serves fixed pages, signalling continuation through `has_next`.
    pub struct PagedAssets {
        pub pages: Vec<Vec<AssetRecord>>,
        pub report_page_count: bool,
        pub requested: Vec<u32>,
    }

    impl PagedAssets {
        pub fn new(pages: Vec<Vec<AssetRecord>>) -> Self {
            Self {
                pages,
                report_page_count: false,
                requested: Vec::new(),
            }
        }

        pub fn single(ids: &[&str]) -> Self {
            Self::new(vec![ids.iter().map(|id| AssetRecord::new(*id)).collect()])
        }
    }

    impl AssetSource for PagedAssets {
        fn fetch_page(&mut self, page: u32, _page_size: u32) -> Result<AssetPage> {
            self.requested.push(page);
            let idx = page as usize - 1;
            let total = self.pages.len() as u32;
            Ok(AssetPage {
                items: self.pages.get(idx).cloned().unwrap_or_default(),
                page,
                page_count: self.report_page_count.then_some(total),
                has_next: !self.report_page_count && idx + 1 < self.pages.len(),
            })
        }
    }

    /// Always claims there is another page.
    pub struct EndlessAssets;

    impl AssetSource for EndlessAssets {
        fn fetch_page(&mut self, page: u32, _page_size: u32) -> Result<AssetPage> {
            Ok(AssetPage {
                items: vec![AssetRecord::new(format!("asset_{}", page))],
                page,
                page_count: None,
                has_next: true,
            })
        }
    }

    pub struct StaticRelationships(pub Vec<RelationshipRecord>);

    impl RelationshipSource for StaticRelationships {
        fn fetch_relationships(&mut self, _focal: Option<&str>) -> Result<Vec<RelationshipRecord>> {
            Ok(self.0.clone())
        }
    }

    pub struct Unreachable;

    impl RelationshipSource for Unreachable {
        fn fetch_relationships(&mut self, _focal: Option<&str>) -> Result<Vec<RelationshipRecord>> {
            Err(SessionError::fetch("connection refused"))
        }
    }
}
