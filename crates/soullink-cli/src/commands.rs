//! Document commands: create, sanitize, inspect

use anyhow::{Context, Result};
use serde_json::Value;
use soullink_model::{first_pending, GameTemplate, ModelError, Ruleset, TrackerDocument, TEAM_CAPACITY};
use soullink_sanitizer::{coerce, coerce_with_report, CoerceReport};
use std::fmt::Write;
use std::path::Path;
use tracing::warn;

/// Template used when none is given
pub const DEFAULT_GAME: &str = "platinum";

/// Ruleset used when none is given
pub const DEFAULT_RULESET: &str = "standard";

/// `Player 1`, `Player 2`, ...
#[must_use]
pub fn default_players(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Player {i}")).collect()
}

/// Fresh document from built-in catalogues
///
/// # Errors
/// Unknown template or ruleset id, or an invalid player count.
pub fn new_document(
    game: &str,
    players: Vec<String>,
    ruleset: &str,
    started_at_ms: i64,
) -> Result<TrackerDocument> {
    let template =
        GameTemplate::find(game).ok_or_else(|| ModelError::UnknownTemplate(game.to_string()))?;
    let ruleset =
        Ruleset::find(ruleset).ok_or_else(|| ModelError::UnknownRuleset(ruleset.to_string()))?;
    Ok(TrackerDocument::create(&template, players, &ruleset, started_at_ms)?)
}

/// Listing of built-in templates and rulesets
#[must_use]
pub fn templates_text() -> String {
    let mut out = String::from("Game templates:\n");
    for template in GameTemplate::builtin() {
        let _ = writeln!(
            out,
            "  {:<20} {} ({} level caps, {} rivals)",
            template.id,
            template.name,
            template.level_caps.len(),
            template.rival_caps.len()
        );
    }
    out.push_str("Rulesets:\n");
    for ruleset in Ruleset::builtin() {
        let _ = writeln!(out, "  {:<20} {} ({} rules)", ruleset.id, ruleset.name, ruleset.rules.len());
    }
    out
}

/// Read a JSON file; unparsable content is treated as `null`
///
/// # Errors
/// The file cannot be read.
pub fn read_json(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "not valid JSON, treating as null");
        Value::Null
    }))
}

/// Fallback document for sanitizing: the given file repaired against the
/// default document, or the default document itself
///
/// # Errors
/// The file cannot be read.
pub fn load_fallback(path: Option<&Path>) -> Result<TrackerDocument> {
    let default = new_document(DEFAULT_GAME, default_players(2), DEFAULT_RULESET, 0)?;
    match path {
        Some(path) => Ok(coerce(&read_json(path)?, &default)),
        None => Ok(default),
    }
}

/// Read and repair a document file
///
/// # Errors
/// The file cannot be read.
pub fn sanitize_file(path: &Path, fallback: &TrackerDocument) -> Result<(TrackerDocument, CoerceReport)> {
    let raw = read_json(path)?;
    Ok(coerce_with_report(&raw, fallback))
}

/// Write a document as pretty JSON to `path`, or stdout when absent
///
/// # Errors
/// Serialization or the write fails.
pub fn write_document(doc: &TrackerDocument, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(doc)?;
    match path {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn milestone_line(label: &str, level: &str, done: usize, total: usize) -> String {
    format!("{label} ({level})  [{done}/{total} done]")
}

/// Progress summary of the sanitized document plus raw-document diagnostics
#[must_use]
pub fn inspect_text(raw: &Value, fallback: &TrackerDocument) -> String {
    let (doc, report) = coerce_with_report(raw, fallback);
    let mut out = String::new();

    let _ = writeln!(out, "Players: {}", doc.players.join(", "));
    let _ = writeln!(out, "Runs: {}  Best: {}", doc.stats.runs, doc.stats.best);

    let done = doc.level_caps.iter().filter(|m| m.done).count();
    let level = match first_pending(&doc.level_caps) {
        Some(i) => {
            let cap = &doc.level_caps[i];
            milestone_line(&cap.label, &cap.level, done, doc.level_caps.len())
        }
        None => format!("all done [{done}/{done}]"),
    };
    let _ = writeln!(out, "Level cap: {level}");

    let done = doc.rival_caps.iter().filter(|m| m.done).count();
    let rival = match first_pending(&doc.rival_caps) {
        Some(i) if doc.flags.rival_censor_enabled && !doc.rival_caps[i].revealed => {
            format!("hidden  [{done}/{} done]", doc.rival_caps.len())
        }
        Some(i) => {
            let cap = &doc.rival_caps[i];
            milestone_line(&cap.label, &cap.level, done, doc.rival_caps.len())
        }
        None => format!("all done [{done}/{done}]"),
    };
    let _ = writeln!(out, "Rival: {rival}");

    let deaths: Vec<String> = doc
        .players
        .iter()
        .zip(doc.stats.deaths.iter().zip(&doc.stats.sum_deaths))
        .map(|(name, (deaths, total))| format!("{name} {deaths} (total {total})"))
        .collect();
    let _ = writeln!(out, "Deaths: {}", deaths.join(", "));

    let holes = doc.team.len() - doc.filled_team().count();
    let _ = writeln!(
        out,
        "Team: {}/{TEAM_CAPACITY} ({holes} holes)  Box: {}  Graveyard: {}",
        doc.team.len(),
        doc.boxed.len(),
        doc.graveyard.len()
    );
    if doc.flags.legendary_tracker_enabled {
        let _ = writeln!(out, "Legendary encounters: {}", doc.stats.legendary_encounters);
    }

    let _ = writeln!(out, "Repairs: {}", report.repair_count());
    for repair in &report.repairs {
        let _ = writeln!(out, "  - {repair}");
    }

    match serde_json::from_value::<TrackerDocument>(raw.clone()) {
        Ok(parsed) => {
            let violations = parsed.validate();
            if violations.is_empty() {
                out.push_str("Raw document: valid\n");
            } else {
                let _ = writeln!(out, "Raw document: {} invariant violations", violations.len());
                for violation in violations {
                    let _ = writeln!(out, "  - {violation:?}");
                }
            }
        }
        Err(err) => {
            let _ = writeln!(out, "Raw document: not a tracker document ({err})");
        }
    }
    out
}
