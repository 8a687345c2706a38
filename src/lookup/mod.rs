//! Provider lookups.
//!
//! [`lookup_release`] drives one provider through
//! `Constructing → Fetching(region) → Paginating* → Converting → Done`.
//! [`combined`] runs several providers concurrently and [`merge`] turns
//! their results into one release.

pub mod combined;
pub mod context;
pub mod merge;
pub mod permalink;
pub mod request;
pub mod state;

pub use combined::{CombinedRequest, LookupEngine, ProviderReleaseMap, ProviderSelection};
pub use context::LookupContext;
pub use request::LookupRequest;
pub use state::{LookupState, PageCursor, PaginationStop};

use crate::error::{LookupError, Result};
use crate::model::{LookupMethod, ProviderInfo, Release};
use crate::providers::ReleaseProvider;
use crate::scheduler::QueryScheduler;

/// Look up one release with one provider.
pub async fn lookup_release<P: ReleaseProvider>(
    provider: &P,
    scheduler: &QueryScheduler,
    request: &LookupRequest,
) -> Result<Release> {
    let mut ctx = LookupContext::new(provider.name(), scheduler, request);
    let result = drive(provider, &mut ctx).await;
    match result {
        Ok(release) => {
            ctx.transition(LookupState::Done);
            tracing::info!(
                provider = provider.name(),
                title = %release.title,
                tracks = release.track_count(),
                "Lookup complete"
            );
            Ok(release)
        }
        Err(e) => {
            ctx.transition(LookupState::Failed);
            Err(e)
        }
    }
}

async fn drive<P: ReleaseProvider>(provider: &P, ctx: &mut LookupContext<'_>) -> Result<Release> {
    let request = ctx.request();
    let (method, value) = request.validate()?;
    if method == LookupMethod::Gtin && !provider.features().gtin_lookup {
        return Err(provider.unsupported("GTIN lookup"));
    }
    let value = value.to_string();
    let is_template = request.is_template;

    let raw = provider.fetch_raw(method, &value, ctx).await?;
    let id = provider.raw_id(&raw);

    ctx.transition(LookupState::Converting);
    let mut release = provider.convert(raw, ctx)?;
    if release.media.is_empty() {
        return Err(LookupError::provider(provider.name(), "Conversion produced no media"));
    }

    let region = ctx.region().map(String::from);
    release.info.providers.push(ProviderInfo {
        name: provider.name().to_string(),
        internal_name: provider.internal_name().to_string(),
        lookup_method: method,
        lookup_value: value,
        url: provider.release_url(&id, region.as_deref()),
        region,
        id,
        cache_time: ctx.cache_time(),
        is_template,
    });
    let mut messages = ctx.take_messages();
    messages.append(&mut release.info.messages);
    release.info.messages = messages;

    Ok(release)
}
