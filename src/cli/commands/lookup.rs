//! Combined release lookup and permalink replay.

use clap::Args;
use tokio::runtime::Runtime;
use url::Url;

use crate::config::Config;
use crate::lookup::merge::merge_releases;
use crate::lookup::permalink::Permalink;
use crate::lookup::{CombinedRequest, LookupEngine, ProviderReleaseMap, ProviderSelection};
use crate::model::{MessageSeverity, Release};
use crate::reconcile::language::WhatlangDetector;

/// Arguments of the `lookup` command
#[derive(Args, Debug, Default)]
pub struct LookupArgs {
    /// Barcode (GTIN) queried with every configured provider
    #[arg(short, long)]
    pub gtin: Option<String>,

    /// Look up a provider by ID, as PROVIDER=ID (repeatable)
    #[arg(long = "id", value_name = "PROVIDER=ID")]
    pub ids: Vec<String>,

    /// Use a provider release only to fill gaps, as PROVIDER=ID (repeatable)
    #[arg(long = "template", value_name = "PROVIDER=ID")]
    pub templates: Vec<String>,

    /// Provider release URL (repeatable)
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Regions to try, in order (overrides the configured regions)
    #[arg(short, long = "region", value_name = "CC")]
    pub regions: Vec<String>,

    /// Replay snapshots no newer than this unix timestamp
    #[arg(long)]
    pub ts: Option<i64>,

    /// Print the merged release as JSON
    #[arg(long)]
    pub json: bool,
}

/// Look up a release and print the merged result
pub fn cmd_lookup(
    rt: &Runtime,
    engine: &LookupEngine,
    config: &Config,
    args: &LookupArgs,
) -> anyhow::Result<()> {
    let request = build_request(engine, config, args)?;
    rt.block_on(run_and_print(engine, config, &request, args.json))
}

/// Replay the lookup a permalink describes
pub fn cmd_permalink(
    rt: &Runtime,
    engine: &LookupEngine,
    config: &Config,
    url: &str,
    json: bool,
) -> anyhow::Result<()> {
    let url = Url::parse(url)?;
    let permalink = Permalink::parse(&url, &engine.provider_names())?;
    if permalink.providers.is_empty() {
        anyhow::bail!("Permalink does not select any provider");
    }
    let request = permalink.into_request(&config.lookup.regions);
    rt.block_on(run_and_print(engine, config, &request, json))
}

fn build_request(
    engine: &LookupEngine,
    config: &Config,
    args: &LookupArgs,
) -> anyhow::Result<CombinedRequest> {
    let mut regions = if args.regions.is_empty() {
        config.lookup.regions.clone()
    } else {
        args.regions.clone()
    };
    let mut providers: Vec<ProviderSelection> = Vec::new();

    for pair in &args.ids {
        let (name, id) = split_provider_id(pair)?;
        providers.push(ProviderSelection::by_id(name, id));
    }
    for pair in &args.templates {
        let (name, id) = split_provider_id(pair)?;
        let mut selection = ProviderSelection::by_id(name, id);
        selection.is_template = true;
        providers.push(selection);
    }
    for raw in &args.urls {
        let url = Url::parse(raw)?;
        let (selection, region) = engine
            .selection_for_url(&url)
            .ok_or_else(|| anyhow::anyhow!("No provider recognizes {}", url))?;
        if let Some(region) = region {
            if !regions.iter().any(|r| r.eq_ignore_ascii_case(&region)) {
                regions.push(region);
            }
        }
        // Keep the full URL so the lookup puts its region first
        providers.push(ProviderSelection::by_id(selection.internal_name, url.as_str()));
    }

    if args.gtin.is_some() {
        for name in &config.lookup.providers {
            if !providers.iter().any(|p| p.internal_name.eq_ignore_ascii_case(name)) {
                providers.push(ProviderSelection::by_gtin(name.as_str()));
            }
        }
    }

    if providers.is_empty() {
        anyhow::bail!("Nothing to look up: pass --gtin, --id, --template or --url");
    }

    Ok(CombinedRequest {
        gtin: args.gtin.clone(),
        providers,
        regions,
        snapshot_max_timestamp: args.ts,
    })
}

fn split_provider_id(pair: &str) -> anyhow::Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((name, id)) if !name.is_empty() && !id.is_empty() => Ok((name, id)),
        _ => anyhow::bail!("Expected PROVIDER=ID, got '{}'", pair),
    }
}

async fn run_and_print(
    engine: &LookupEngine,
    config: &Config,
    request: &CombinedRequest,
    json: bool,
) -> anyhow::Result<()> {
    let results = engine.lookup(request).await;
    print_provider_errors(&results);

    let release = merge_releases(&results, &WhatlangDetector)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&release)?);
    } else {
        print_release(&release);
    }

    let base = Url::parse(&config.lookup.permalink_base)?;
    let permalink = Permalink::from_infos(&release.info.providers).to_url(&base);
    eprintln!();
    eprintln!("Permalink: {}", permalink);
    Ok(())
}

fn print_provider_errors(results: &ProviderReleaseMap) {
    for (provider, error) in results.errors() {
        eprintln!("✗ {}: {}", provider, error);
    }
}

fn print_release(release: &Release) {
    println!("{} by {}", release.title, release.credit_string());
    println!();
    if let Some(gtin) = &release.gtin {
        println!("  GTIN:      {}", gtin);
    }
    if let Some(date) = &release.release_date {
        println!("  Released:  {}", date);
    }
    if !release.types.is_empty() {
        let types: Vec<String> = release.types.iter().map(ToString::to_string).collect();
        println!("  Types:     {}", types.join(", "));
    }
    for label in &release.labels {
        println!("  Label:     {}", label.name);
    }
    if let Some(copyright) = &release.copyright {
        println!("  Copyright: {}", copyright);
    }
    if let Some(language) = &release.language {
        println!("  Language:  {}", language.code);
    }
    if let Some(script) = &release.script {
        println!("  Script:    {}", script.code);
    }

    for medium in &release.media {
        println!();
        match &medium.format {
            Some(format) => println!("  Medium {} ({})", medium.number, format),
            None => println!("  Medium {}", medium.number),
        }
        for track in &medium.tracks {
            let length = track.length.map(format_length).unwrap_or_default();
            println!("    {:>3}. {}  {}", track.number, track.title, length);
        }
    }

    if !release.external_links.is_empty() {
        println!();
        for link in &release.external_links {
            println!("  {}", link.url);
        }
    }

    let messages: Vec<_> = release
        .info
        .messages
        .iter()
        .filter(|m| m.severity >= MessageSeverity::Warning)
        .collect();
    if !messages.is_empty() {
        println!();
        for message in messages {
            let source = message.provider.as_deref().unwrap_or("harmonizer");
            println!("  ⚠ [{}] {}", source, message.text);
        }
    }
}

fn format_length(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemorySnapshotStore;
    use crate::scheduler::transport::mocks::MockTransport;
    use std::sync::Arc;

    fn engine() -> LookupEngine {
        LookupEngine::new(
            &Config::default(),
            Arc::new(MockTransport::new()),
            Arc::new(MemorySnapshotStore::default()),
        )
    }

    #[test]
    fn test_gtin_selects_configured_providers() {
        let args = LookupArgs {
            gtin: Some("602445790135".to_string()),
            ids: vec!["tidal=100".to_string()],
            ..Default::default()
        };
        let request = build_request(&engine(), &Config::default(), &args).unwrap();

        assert_eq!(
            request.providers,
            vec![
                ProviderSelection::by_id("tidal", "100"),
                ProviderSelection::by_gtin("itunes"),
            ]
        );
        assert_eq!(request.regions, vec!["GB", "US", "DE", "JP"]);
    }

    #[test]
    fn test_url_adds_provider_and_region() {
        let args = LookupArgs {
            urls: vec!["https://music.apple.com/fr/album/example/5".to_string()],
            regions: vec!["GB".to_string()],
            ..Default::default()
        };
        let request = build_request(&engine(), &Config::default(), &args).unwrap();

        assert_eq!(request.providers.len(), 1);
        assert_eq!(request.providers[0].internal_name, "itunes");
        assert_eq!(request.regions, vec!["GB", "FR"]);
    }

    #[test]
    fn test_template_selection() {
        let args = LookupArgs {
            templates: vec!["itunes=5".to_string()],
            ..Default::default()
        };
        let request = build_request(&engine(), &Config::default(), &args).unwrap();
        assert!(request.providers[0].is_template);
    }

    #[test]
    fn test_rejects_empty_request_and_bad_pairs() {
        assert!(build_request(&engine(), &Config::default(), &LookupArgs::default()).is_err());
        assert!(split_provider_id("itunes").is_err());
        assert!(split_provider_id("=5").is_err());
        assert_eq!(split_provider_id("tidal=1=2").unwrap(), ("tidal", "1=2"));
    }

    #[test]
    fn test_format_length() {
        assert_eq!(format_length(61_500), "1:01");
        assert_eq!(format_length(5_000), "0:05");
    }
}
