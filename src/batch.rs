use crate::card::{CardRecord, CardRenderer};
use crate::compose::RenderContext;
use crate::layout_dump::write_layout_dump;
use rayon::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    /// Worker threads; `1` renders in order on the calling thread.
    pub jobs: usize,
    pub dump_layout: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("cards"),
            jobs: 1,
            dump_layout: false,
        }
    }
}

/// A batch entry: a parsed record, or the reason it could not be parsed.
pub type BatchEntry = Result<CardRecord, EntryError>;

#[derive(Debug, Clone)]
pub struct EntryError {
    pub label: String,
    pub message: String,
}

#[derive(Debug)]
pub enum CardOutcome {
    Exported { name: String, path: PathBuf },
    Failed { name: String, error: String },
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<CardOutcome>,
}

impl BatchReport {
    pub fn exported(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            CardOutcome::Exported { name, path } => Some((name.as_str(), path.as_path())),
            CardOutcome::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            CardOutcome::Failed { name, error } => Some((name.as_str(), error.as_str())),
            CardOutcome::Exported { .. } => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }
}

/// Splits a JSON array of cards into entries, so one malformed card does not
/// sink the rest.
pub fn parse_records(json: &str) -> anyhow::Result<Vec<BatchEntry>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let entries = values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            let label = value
                .get("name")
                .and_then(|name| name.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("card #{}", idx + 1));
            serde_json::from_value::<CardRecord>(value).map_err(|err| EntryError {
                label,
                message: err.to_string(),
            })
        })
        .collect();
    Ok(entries)
}

/// Renders every entry. Failures are recorded per card and never stop the
/// batch; outcomes keep input order.
///
/// A record whose slug was already claimed by an earlier record fails
/// instead of overwriting that card's file.
pub fn render_batch(entries: &[BatchEntry], ctx: RenderContext<'_>, options: &BatchOptions) -> BatchReport {
    let claims = slug_claims(entries);
    let jobs = options.jobs.max(1);
    let outcomes: Vec<CardOutcome> = if jobs == 1 {
        entries
            .iter()
            .zip(&claims)
            .map(|(entry, claim)| process_entry(entry, *claim, ctx, options))
            .collect()
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| {
                entries
                    .par_iter()
                    .zip(claims.par_iter())
                    .map(|(entry, claim)| process_entry(entry, *claim, ctx, options))
                    .collect()
            }),
            Err(err) => {
                tracing::warn!(error = %err, "thread pool unavailable, rendering sequentially");
                entries
                    .iter()
                    .zip(&claims)
                    .map(|(entry, claim)| process_entry(entry, *claim, ctx, options))
                    .collect()
            }
        }
    };
    BatchReport { outcomes }
}

/// For each entry, the name of the earlier record that already owns its slug.
fn slug_claims(entries: &[BatchEntry]) -> Vec<Option<&str>> {
    let mut owners: HashMap<String, &str> = HashMap::new();
    entries
        .iter()
        .map(|entry| {
            let record = entry.as_ref().ok()?;
            match owners.entry(record.slug()) {
                Entry::Occupied(owner) => Some(*owner.get()),
                Entry::Vacant(slot) => {
                    slot.insert(record.name.as_str());
                    None
                }
            }
        })
        .collect()
}

fn process_entry(
    entry: &BatchEntry,
    claimed_by: Option<&str>,
    ctx: RenderContext<'_>,
    options: &BatchOptions,
) -> CardOutcome {
    let record = match entry {
        Ok(record) => record,
        Err(err) => {
            tracing::error!(card = %err.label, error = %err.message, "invalid card record");
            return CardOutcome::Failed {
                name: err.label.clone(),
                error: err.message.clone(),
            };
        }
    };

    if let Some(owner) = claimed_by {
        let error = format!("output `{}.png` is already taken by card `{owner}`", record.slug());
        tracing::error!(card = %record.name, error = %error, "duplicate card slug");
        return CardOutcome::Failed {
            name: record.name.clone(),
            error,
        };
    }

    match export_card(record, ctx, options) {
        Ok(path) => CardOutcome::Exported {
            name: record.name.clone(),
            path,
        },
        Err(err) => {
            tracing::error!(card = %record.name, error = %err, "card failed");
            CardOutcome::Failed {
                name: record.name.clone(),
                error: format!("{err:#}"),
            }
        }
    }
}

fn export_card(record: &CardRecord, ctx: RenderContext<'_>, options: &BatchOptions) -> anyhow::Result<PathBuf> {
    let renderer = CardRenderer::new(record.clone(), ctx);
    let rendered = renderer.render()?;
    let path = renderer.save(&rendered, &options.output_dir)?;
    if options.dump_layout {
        let dump_path = path.with_extension("layout.json");
        write_layout_dump(&dump_path, record, &rendered)?;
    }
    Ok(path)
}
