//! Country lookup against the REST Countries API, used by the signup flow.

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://restcountries.com";

// Keep the payload lean: only ask for what we map.
const FIELDS: &str = "name,capital,population,flags,cca2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub capital: Option<String>,
    pub population: Option<u64>,
    pub flag_png: Option<String>,
    pub flag_svg: Option<String>,
    /// ISO 3166-1 alpha-2.
    pub cca2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawName {
    #[serde(default)]
    common: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawFlags {
    png: Option<String>,
    svg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCountry {
    #[serde(default)]
    name: RawName,
    #[serde(default)]
    capital: Vec<String>,
    population: Option<u64>,
    #[serde(default)]
    flags: RawFlags,
    cca2: Option<String>,
}

/// Maps the raw API shape into [`Country`]: first capital only, entries
/// without a name dropped, sorted by name.
fn normalize(raw: Vec<RawCountry>) -> Vec<Country> {
    let mut countries: Vec<Country> = raw
        .into_iter()
        .filter(|c| !c.name.common.is_empty())
        .map(|c| Country {
            name: c.name.common,
            capital: c.capital.into_iter().next(),
            population: c.population,
            flag_png: c.flags.png,
            flag_svg: c.flags.svg,
            cca2: c.cca2,
        })
        .collect();
    countries.sort_by(|a, b| a.name.cmp(&b.name));
    countries
}

/// Fetches every country with the selected fields. One-shot GET; any
/// non-success status is an error for the caller to surface.
pub async fn fetch_countries(
    client: &reqwest::Client,
    base_url: &str,
) -> anyhow::Result<Vec<Country>> {
    let url = format!("{}/v3.1/all?fields={}", base_url.trim_end_matches('/'), FIELDS);
    let response = client
        .get(&url)
        .send()
        .await
        .context("fetch countries")?
        .error_for_status()
        .context("countries endpoint returned an error status")?;
    let raw: Vec<RawCountry> = response.json().await.context("decode countries payload")?;
    Ok(normalize(raw))
}
