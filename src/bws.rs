use log::{debug, info, warn};

use bws_design::builder::{PoolBuilder, PoolOutcome};
use bws_design::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::{GenerateArgs, ScoreArgs};
use crate::bws::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_items;

#[derive(Debug, Snafu)]
pub enum BwsError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing to {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} is too short: it needs a best item, a worst item and a tuple"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("No item sources: pass --input or list itemSources in the configuration"))]
    NoSources {},
    #[snafu(display("No items found in the item sources"))]
    NoItems {},
    #[snafu(display(
        "Only {items} distinct items found, at least {required} items are required"
    ))]
    TooFewItems { items: usize, required: usize },
    #[snafu(display("Design error: {source}"))]
    Design { source: DesignErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type BwsResult<T> = Result<T, BwsError>;

fn stats_to_json(stats: &DesignStats) -> JSValue {
    json!({
        "numTuples": stats.num_tuples,
        "numItems": stats.num_items,
        "pairDeviation": stats.pair_deviation,
        "minItemFrequency": stats.min_item_frequency,
        "maxItemFrequency": stats.max_item_frequency,
        "meanItemFrequency": stats.mean_item_frequency,
        "fullCoverage": stats.full_coverage,
    })
}

fn batches_to_json(plan: &BatchPlan<Tuple>) -> Vec<JSValue> {
    plan.batches
        .iter()
        .map(|(idx, tuples)| json!({"batch": idx, "tuples": tuples}))
        .collect()
}

fn build_summary_js(
    config: &StudyConfig,
    design: &Design,
    stats: &DesignStats,
    plan: &BatchPlan<Tuple>,
) -> JSValue {
    let d = &config.design;
    json!({
        "config": {
            "projectName": config.output_settings.project_name,
            "itemSources": config.item_sources,
            "tupleSize": design.tuple_size,
            "numTuples": design.tuples.len(),
            "iterations": d.iterations.unwrap_or(DesignRules::DEFAULT_RULES.num_iter),
            "trialsRun": design.trials_run,
            "bestTrial": design.trial,
            "seed": d.seed,
            "batchSize": plan.batch_size,
            "minimum": plan.minimum,
        },
        "stats": stats_to_json(stats),
        "fingerprint": design.fingerprint(),
        "tuples": design.tuples,
        "batches": batches_to_json(plan),
    })
}

/// A readable listing of the batches, one line per tuple.
pub fn format_report(plan: &BatchPlan<Tuple>) -> String {
    let mut lines: Vec<String> = Vec::new();
    for (idx, tuples) in plan.batches.iter() {
        lines.push(format!("Batch {}", idx));
        for (tidx, tuple) in tuples.iter().enumerate() {
            lines.push(format!("\tTuple {}:\t{}", tidx + 1, tuple.join(", ")));
        }
    }
    lines.join("\n")
}

/// A readable listing of the annotations, grouped by tuple in order of first appearance.
pub fn format_annotation_report(annotations: &[Annotation]) -> String {
    let mut groups: Vec<(&Tuple, Vec<&Annotation>)> = Vec::new();
    let mut index: HashMap<Tuple, usize> = HashMap::new();
    for a in annotations.iter() {
        let mut key = a.tuple.clone();
        key.sort();
        match index.get(&key) {
            Some(&idx) => groups[idx].1.push(a),
            None => {
                index.insert(key, groups.len());
                groups.push((&a.tuple, vec![a]));
            }
        }
    }
    let mut lines: Vec<String> = Vec::new();
    for (tidx, (tuple, annos)) in groups.iter().enumerate() {
        lines.push(format!("Tuple {}:\t{}", tidx + 1, tuple.join(", ")));
        for (aidx, a) in annos.iter().enumerate() {
            lines.push(format!("\tAnnotation {}:", aidx + 1));
            lines.push(format!("\t\tbest - {}", a.best));
            lines.push(format!("\t\tworst - {}", a.worst));
        }
    }
    lines.join("\n")
}

fn read_pool(sources: &[String], tuple_size: Option<usize>) -> BwsResult<ItemPool> {
    if sources.is_empty() {
        return NoSourcesSnafu {}.fail();
    }
    let mut builder = PoolBuilder::new();
    if let Some(k) = tuple_size {
        builder = builder.tuple_size(k);
    }
    for path in sources.iter() {
        let added = io_items::read_item_file(&mut builder, path)?;
        info!(
            "read_pool: {} new items from {}",
            added,
            io_common::simplify_file_name(path)
        );
    }
    match builder.build() {
        PoolOutcome::Ready(pool) => Ok(pool),
        PoolOutcome::NoItems => NoItemsSnafu {}.fail(),
        PoolOutcome::TooFewItems { pool, required } => TooFewItemsSnafu {
            items: pool.len(),
            required,
        }
        .fail(),
    }
}

pub fn run_generate(args: &GenerateArgs) -> BwsResult<()> {
    let config = match &args.config {
        Some(path) => {
            let c = read_config(path)?;
            let root = Path::new(path).parent().context(MissingParentDirSnafu {})?;
            let sources = c
                .item_sources
                .iter()
                .map(|s| io_common::resolve_path(root, s))
                .collect();
            let o = &c.output_settings;
            let output_settings = OutputSettings {
                project_name: o.project_name.clone(),
                summary_path: o.summary_path.as_ref().map(|p| io_common::resolve_path(root, p)),
                report_path: o.report_path.as_ref().map(|p| io_common::resolve_path(root, p)),
            };
            StudyConfig {
                item_sources: sources,
                output_settings,
                ..c
            }
        }
        None => StudyConfig::default(),
    }
    .merge_args(args);
    info!("run_generate: config: {:?}", config);

    let rules = config.design_rules();
    let pool = read_pool(&config.item_sources, rules.tuple_size)?;
    info!("run_generate: {} distinct items", pool.len());

    let design = generate_design(&pool, &rules).context(DesignSnafu {})?;
    let stats = design.stats(&pool);
    info!(
        "run_generate: {} tuples, pair deviation {}, item frequencies {}..{}",
        stats.num_tuples, stats.pair_deviation, stats.min_item_frequency, stats.max_item_frequency
    );
    if !stats.full_coverage {
        warn!("run_generate: some items do not appear in any tuple");
    }

    let plan = split_batches(design.tuples.clone(), &config.batch_rules()).context(DesignSnafu {})?;
    info!("run_generate: {} batches", plan.len());

    let summary = build_summary_js(&config, &design, &stats, &plan);
    let pretty_js = serde_json::to_string_pretty(&summary).context(WritingJsonSnafu {})?;
    let o = &config.output_settings;
    io_common::write_output(o.summary_target(), &pretty_js)?;
    if let Some(p) = o.report_path.as_deref() {
        io_common::write_output(p, &format_report(&plan))?;
    }
    Ok(())
}

pub fn run_score(args: &ScoreArgs) -> BwsResult<()> {
    let mut annotations: Vec<Annotation> = Vec::new();
    for path in args.input.iter() {
        let mut file_data = io_csv::read_annotations(path)?;
        info!(
            "run_score: {} annotations from {}",
            file_data.len(),
            io_common::simplify_file_name(path)
        );
        annotations.append(&mut file_data);
    }
    if annotations.is_empty() {
        warn!("run_score: no annotations found");
    }

    let scores = score_annotations(&annotations);
    debug!("run_score: {} scored items", scores.len());
    let text = format_scores(&scores);
    io_common::write_output(args.out.as_deref().unwrap_or(io_common::STDOUT), &text)?;
    if let Some(p) = args.report.as_deref() {
        io_common::write_output(p, &format_annotation_report(&annotations))?;
    }

    // The reference scores, if provided for comparison
    if let Some(ref_path) = &args.reference {
        let reference =
            fs::read_to_string(ref_path).context(OpeningFileSnafu { path: ref_path })?;
        let reference = reference.trim_end();
        if reference != text {
            warn!("Found differences with the reference scores");
            print_diff(reference, text.as_str(), "\n");
            whatever!("Difference detected between calculated scores and reference scores")
        }
    }
    Ok(())
}
