use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use crate::infra::InMemorySessionStore;
use scheme_mitra::ai::AzureOpenAiClient;
use scheme_mitra::config::AppConfig;
use scheme_mitra::error::AppError;
use scheme_mitra::schemes::{
    filter_schemes, match_score, CatalogHandle, EligibilityExplainer, SchemeFilter, SchemeRecord,
    UserProfile,
};
use scheme_mitra::session::{SessionId, SessionStore};

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    /// Free-text search across name, description, ministry, and beneficiary
    #[arg(long)]
    pub(crate) query: Option<String>,
    /// Exact ministry filter
    #[arg(long)]
    pub(crate) ministry: Option<String>,
    /// Exact beneficiary filter
    #[arg(long)]
    pub(crate) beneficiary: Option<String>,
    /// Exact category filter
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Override the configured scheme dataset path
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// Age used in the composed profile
    #[arg(long, default_value_t = 30)]
    pub(crate) age: u8,
    /// Profile category (Farmers, Women, Youth, MSME, Education, Senior Citizens)
    #[arg(long)]
    pub(crate) category: String,
    /// Optional skills/profession free text
    #[arg(long)]
    pub(crate) skills: Option<String>,
    /// Free-text search applied before scoring
    #[arg(long)]
    pub(crate) query: Option<String>,
    /// Override the configured scheme dataset path
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Age used in the demo profile
    #[arg(long, default_value_t = 32)]
    pub(crate) age: u8,
    /// Category used in the demo profile
    #[arg(long, default_value = "Farmers")]
    pub(crate) category: String,
    /// Skills used in the demo profile
    #[arg(long, default_value = "dairy farming")]
    pub(crate) skills: String,
    /// Free-text search applied before scoring
    #[arg(long, default_value = "farmer")]
    pub(crate) query: String,
    /// Override the configured scheme dataset path
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

fn resolve_catalog(dataset: Option<PathBuf>) -> Result<(CatalogHandle, PathBuf), AppError> {
    let config = AppConfig::load()?;
    let path = dataset.unwrap_or(config.dataset.path);
    Ok((CatalogHandle::load(&path), path))
}

fn print_catalog_header(handle: &CatalogHandle, path: &PathBuf) {
    println!("Dataset: {} ({} schemes)", path.display(), handle.catalog().len());
    if let Some(notice) = handle.notice() {
        println!("Notice: {notice}");
    }
}

pub(crate) fn run_schemes_list(args: ListArgs) -> Result<(), AppError> {
    let ListArgs {
        query,
        ministry,
        beneficiary,
        category,
        dataset,
    } = args;

    let (handle, path) = resolve_catalog(dataset)?;
    let filter = SchemeFilter::from_selections(query, ministry, beneficiary, category);
    let matches = filter_schemes(handle.catalog().schemes(), &filter);

    println!("Scheme listing");
    print_catalog_header(&handle, &path);

    if matches.is_empty() {
        println!("\nNo schemes match the given filters.");
        return Ok(());
    }

    println!("\nMatches ({} of {})", matches.len(), handle.catalog().len());
    for scheme in matches {
        println!(
            "- {} | {} | {} | {}",
            scheme.name, scheme.ministry, scheme.beneficiary, scheme.category
        );
    }

    Ok(())
}

pub(crate) fn run_schemes_match(args: MatchArgs) -> Result<(), AppError> {
    let MatchArgs {
        age,
        category,
        skills,
        query,
        dataset,
    } = args;

    let profile = UserProfile {
        age,
        category,
        skills,
    };
    let profile_text = profile.composed();

    let (handle, path) = resolve_catalog(dataset)?;
    let filter = SchemeFilter::from_selections(query, None, None, None);
    let matches = filter_schemes(handle.catalog().schemes(), &filter);

    println!("Scheme matching");
    print_catalog_header(&handle, &path);
    println!("Profile: {profile_text}");

    if matches.is_empty() {
        println!("\nNo schemes match the given filters.");
        return Ok(());
    }

    println!("\nMatches ({} of {})", matches.len(), handle.catalog().len());
    for scheme in matches {
        println!(
            "- {} | {} | match {}%",
            scheme.name,
            scheme.ministry,
            match_score(scheme, &profile_text)
        );
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        age,
        category,
        skills,
        query,
        dataset,
    } = args;

    let config = AppConfig::load()?;
    let path = dataset.unwrap_or_else(|| config.dataset.path.clone());
    let handle = CatalogHandle::load(&path);

    let profile = UserProfile {
        age,
        category,
        skills: Some(skills),
    };
    let profile_text = profile.composed();

    println!("Scheme discovery demo");
    print_catalog_header(&handle, &path);
    println!("Profile: {profile_text}");

    let filter = SchemeFilter::from_selections(Some(query.clone()), None, None, None);
    let matches = filter_schemes(handle.catalog().schemes(), &filter);

    if matches.is_empty() {
        println!("\nNo schemes match '{query}'; nothing to explain.");
        return Ok(());
    }

    println!("\nMatches for '{query}' ({} of {})", matches.len(), handle.catalog().len());
    // First scheme wins ties, preserving catalog order.
    let mut top: (&SchemeRecord, u8) = (matches[0], match_score(matches[0], &profile_text));
    for &scheme in &matches {
        let score = match_score(scheme, &profile_text);
        println!("- {} | {} | match {score}%", scheme.name, scheme.ministry);
        if score > top.1 {
            top = (scheme, score);
        }
    }

    let (top_scheme, _) = top;

    println!("\nEligibility explanation for '{}'", top_scheme.name);
    let generator = AzureOpenAiClient::new(config.openai.clone())?;
    if !generator.is_configured() {
        println!("(Azure OpenAI credentials missing; showing the degraded path)");
    }
    let explainer = EligibilityExplainer::new(Arc::new(generator));
    let explanation = explainer.explain(top_scheme, &profile_text).await;
    println!("Status: {}", explanation.text.status_label());
    println!("Match score: {}%", explanation.match_score);
    println!("{}", explanation.text.as_str());

    println!("\nSession walkthrough");
    let sessions = InMemorySessionStore::default();
    let session_id = SessionId("demo-session".to_string());
    let mut state = sessions.load(&session_id)?;
    state.remember_profile(profile_text.clone());
    state.record_search(&query);
    let bookmarked = state.toggle_bookmark(&top_scheme.id);
    let expanded = state.toggle_expanded(&top_scheme.id);
    sessions.save(&session_id, state)?;

    let state = sessions.load(&session_id)?;
    println!(
        "- bookmarked '{}': {} ({} total)",
        top_scheme.id,
        bookmarked,
        state.bookmarks.len()
    );
    println!("- expanded '{}': {}", top_scheme.id, expanded);
    println!(
        "- last profile: {}",
        state.last_profile.as_deref().unwrap_or("none")
    );
    println!("- searches recorded: {}", state.search_history.len());

    Ok(())
}
